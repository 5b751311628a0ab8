use std::{mem, sync::Arc, thread::JoinHandle};

use jeriya_shared::{
    log::{error, info, trace, warn},
    parking_lot::Mutex,
};

use crate::{
    queue::{Job, SharedQueues},
    worker, AsyncAsset, AsyncLoaderConfig, Result, WorkerState,
};

/// Lifecycle of the worker thread as seen by the [`AsyncLoader`]
enum Lifecycle {
    /// The worker has never been started.
    Idle,
    /// A worker thread was spawned. It might have exited already after reaching a stop request.
    Running(JoinHandle<()>),
    /// The worker was joined by [`AsyncLoader::shutdown`].
    Stopped,
}

/// Loads [`AsyncAsset`]s on a background thread and finalizes them on the thread that calls
/// [`AsyncLoader::drain_and_finalize`].
///
/// Assets are loaded and finalized in the order in which they were submitted. Exactly one
/// worker thread calls [`AsyncAsset::load`] and no lock is held while it does so.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use jeriya_content::{AsyncAsset, AsyncLoader, AsyncLoaderConfig, FileAsset, LoadState};
///
/// let path = std::env::temp_dir().join("jeriya_greeting.txt");
/// std::fs::write(&path, "Hello World!").unwrap();
///
/// let loader = AsyncLoader::new(AsyncLoaderConfig::default()).unwrap();
/// let greeting = Arc::new(FileAsset::<String>::new(
///     &path,
///     Box::new(|data: &[u8]| Ok(String::from_utf8_lossy(data).into_owned())),
/// ));
/// loader.submit(greeting.clone());
/// loader.start().unwrap();
///
/// // Usually called once per frame
/// while !loader.drain_and_finalize() {
///     std::thread::yield_now();
/// }
/// loader.shutdown();
///
/// assert_eq!(greeting.status().state(), LoadState::Finalized);
/// assert_eq!(greeting.value().unwrap().as_str(), "Hello World!");
/// ```
pub struct AsyncLoader {
    config: AsyncLoaderConfig,
    queues: Arc<SharedQueues>,
    lifecycle: Mutex<Lifecycle>,
}

impl AsyncLoader {
    /// Creates a new `AsyncLoader`. The worker thread is not spawned before [`AsyncLoader::start`] is called.
    ///
    /// Fails when the `config` is invalid.
    pub fn new(config: AsyncLoaderConfig) -> Result<Self> {
        config.validate()?;
        info!("Creating AsyncLoader with {config:?}");
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: AsyncLoaderConfig) -> Self {
        Self {
            config,
            queues: Arc::new(SharedQueues::new()),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    pub fn config(&self) -> &AsyncLoaderConfig {
        &self.config
    }

    /// Queues the `asset` for loading and wakes up the worker thread.
    ///
    /// Assets that are submitted while the worker is stopped are loaded after the next call to
    /// [`AsyncLoader::start`]. The caller keeps its own handle to the asset to inspect it after
    /// it was finalized. Submitting an asset that is still queued is a programming error.
    pub fn submit(&self, asset: Arc<dyn AsyncAsset>) {
        debug_assert!(!self.queues.is_queued(&asset), "{} was submitted while it is still queued", asset.key());
        asset.status().reset();
        trace!("Submitting {}", asset.key());
        self.queues.push_job(Job::Load(asset));
    }

    /// Spawns the worker thread.
    ///
    /// When the previous worker is going to stop or has stopped because of a stop request, it is
    /// joined before the new one is spawned. This waits until the jobs in front of the stop request
    /// are loaded. Calling `start` while the worker is running and no stop is pending is a
    /// programming error.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();

        if let Lifecycle::Running(_) = &*lifecycle {
            if !matches!(self.queues.worker_state(), WorkerState::Draining | WorkerState::Stopped) {
                debug_assert!(false, "AsyncLoader::start called while the worker thread is running");
                error!(
                    "AsyncLoader::start called while the thread '{}' is running. The call is ignored.",
                    self.config.thread_name
                );
                return Ok(());
            }
            if let Lifecycle::Running(handle) = mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
                join_worker(&self.config.thread_name, handle);
            }
        }

        info!("Starting the worker thread '{}'", self.config.thread_name);
        self.queues.lock().worker_state = WorkerState::Idle;
        match worker::spawn(&self.config, self.queues.clone()) {
            Ok(handle) => {
                *lifecycle = Lifecycle::Running(handle);
                Ok(())
            }
            Err(err) => {
                self.queues.lock().worker_state = WorkerState::Stopped;
                error!("Failed to start the worker thread '{}': {err}", self.config.thread_name);
                Err(err)
            }
        }
    }

    /// Requests the worker thread to exit after loading every asset that is currently queued.
    ///
    /// Doesn't block. Assets submitted after this call stay queued until [`AsyncLoader::start`] is called again.
    pub fn request_stop_when_drained(&self) {
        if self.queues.push_stop() {
            info!("Requested the worker thread '{}' to stop when drained", self.config.thread_name);
        } else {
            trace!("Stop request for '{}' is already the last job", self.config.thread_name);
        }
    }

    /// Stops the worker thread after it loaded the queued assets and waits until it has exited.
    ///
    /// Does nothing when the worker was never started or was already shut down.
    pub fn shutdown(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(handle) => {
                if self.queues.push_stop_for_running_worker() {
                    info!("Requested the worker thread '{}' to stop for shutdown", self.config.thread_name);
                }
                join_worker(&self.config.thread_name, handle);
            }
            previous => {
                trace!("AsyncLoader::shutdown called without a running worker thread");
                *lifecycle = previous;
            }
        }
    }

    /// Finalizes all loaded assets on the calling thread. Meant to be called once per frame by
    /// the thread that owns the graphics context.
    ///
    /// Failing assets don't stop the loop. The caller has to check [`AsyncAsset::is_valid`] for
    /// every asset. Returns `true` when no asset was waiting to be loaded or finalized at the time
    /// of the check. This is a hint only because other threads can submit new assets at any time.
    pub fn drain_and_finalize(&self) -> bool {
        // The lock is released before finalize runs so that the worker can continue.
        while let Some(asset) = self.queues.pop_done() {
            trace!("Finalizing {}", asset.key());
            let finalize_valid = match asset.finalize() {
                Ok(()) => true,
                Err(err) => {
                    warn!("Failed to finalize asset {}: {err}", asset.key());
                    false
                }
            };
            asset.status().set_finalized(finalize_valid);
        }
        self.queues.is_drained()
    }

    /// Returns `true` when a worker thread exists and hasn't reached a stop request yet.
    pub fn is_running(&self) -> bool {
        matches!(&*self.lifecycle.lock(), Lifecycle::Running(_)) && self.queues.worker_state() != WorkerState::Stopped
    }

    pub fn worker_state(&self) -> WorkerState {
        self.queues.worker_state()
    }

    /// Number of assets waiting to be loaded including the one that is currently loaded.
    pub fn pending_len(&self) -> usize {
        self.queues.pending_len()
    }

    /// Number of loaded assets waiting to be finalized.
    pub fn completed_len(&self) -> usize {
        self.queues.completed_len()
    }
}

impl Default for AsyncLoader {
    fn default() -> Self {
        Self::with_valid_config(AsyncLoaderConfig::default())
    }
}

impl Drop for AsyncLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_worker(thread_name: &str, handle: JoinHandle<()>) {
    info!("Waiting for the worker thread '{thread_name}' to finish");
    if handle.join().is_err() {
        error!("The worker thread '{thread_name}' panicked");
    }
}
