use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use jeriya_shared::{
    log::{error, info, trace, warn},
    tracy_client::{span, Client},
};

use crate::{
    queue::{same_asset, Job, SharedQueues},
    AsyncAsset, AsyncLoaderConfig, Error, Result,
};

/// State of the worker thread of an [`AsyncLoader`](crate::AsyncLoader)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// The worker waits for jobs.
    Idle,
    /// The worker is loading an asset.
    Running,
    /// The worker is alive and a stop was requested. It will exit after loading the jobs in front of the stop request.
    Draining,
    /// There is no worker thread or it has exited.
    Stopped,
}

/// Spawns the worker thread that loads the jobs from `queues` until it reaches a [`Job::Stop`].
pub(crate) fn spawn(config: &AsyncLoaderConfig, queues: Arc<SharedQueues>) -> Result<JoinHandle<()>> {
    let thread_name = config.thread_name.clone();
    let mut builder = thread::Builder::new().name(thread_name.clone());
    if let Some(stack_size) = config.stack_size {
        builder = builder.stack_size(stack_size);
    }
    builder
        .spawn(move || run(&thread_name, &queues))
        .map_err(|err| Error::FailedToStartWorker(err.to_string()))
}

fn run(thread_name: &str, queues: &SharedQueues) {
    let client = Client::start();
    client.set_thread_name(thread_name);

    info!("Starting AsyncLoader thread '{thread_name}'");
    loop {
        // The asset stays at the front of the JobQueue while it's loaded so that
        // callers that inspect the queue see it as pending.
        let asset = {
            let mut guard = queues.lock();
            loop {
                match guard.jobs.front().cloned() {
                    Some(Job::Load(asset)) => {
                        guard.worker_state = WorkerState::Running;
                        break asset;
                    }
                    Some(Job::Stop) => {
                        guard.jobs.pop_front_if_any();
                        guard.worker_state = WorkerState::Stopped;
                        drop(guard);
                        info!("AsyncLoader thread '{thread_name}' reached the stop request and will stop now");
                        return;
                    }
                    None => {
                        guard.worker_state = WorkerState::Idle;
                        trace!("Waiting for job on AsyncLoader thread '{thread_name}'");
                        queues.wait_for_job(&mut guard);
                    }
                }
            }
        };

        info!("Async load: {}", asset.key());
        load(&asset);

        let mut guard = queues.lock();
        let head = guard.jobs.pop_front_if_any();
        debug_assert!(
            matches!(&head, Some(Job::Load(head)) if same_asset(head, &asset)),
            "the front of the JobQueue changed while {} was loaded",
            asset.key()
        );
        trace!("Moving {} to the DoneQueue", asset.key());
        guard.done.push(asset);
    }
}

/// Runs [`AsyncAsset::load`] and records the result. Neither errors nor panics leave this function.
fn load(asset: &Arc<dyn AsyncAsset>) {
    let _span = span!("AsyncLoader::load");
    let load_valid = match panic::catch_unwind(AssertUnwindSafe(|| asset.load())) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            warn!("Failed to load asset {}: {err}", asset.key());
            false
        }
        Err(_) => {
            error!("Loading asset {} panicked", asset.key());
            false
        }
    };
    asset.status().set_loaded(load_valid);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jeriya_test::{setup_logger, wait_until};

    use crate::{test_utils::TestAsset, LoadState};

    use super::*;

    fn config(thread_name: &str) -> AsyncLoaderConfig {
        AsyncLoaderConfig {
            thread_name: thread_name.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn stops_at_stop_job_and_removes_it() {
        setup_logger();
        let queues = Arc::new(SharedQueues::new());
        let asset = Arc::new(TestAsset::new("a"));
        queues.push_job(Job::Load(asset.clone()));
        queues.push_job(Job::Stop);

        let handle = spawn(&config("stops_at_stop_job"), queues.clone()).unwrap();
        handle.join().unwrap();

        let queues = queues.lock();
        assert!(queues.jobs.front().is_none());
        assert_eq!(queues.done.len(), 1);
        assert_eq!(queues.worker_state, WorkerState::Stopped);
        assert_eq!(asset.status().state(), LoadState::Loaded);
    }

    #[test]
    fn jobs_behind_stop_stay_queued() {
        setup_logger();
        let queues = Arc::new(SharedQueues::new());
        let a = Arc::new(TestAsset::new("a"));
        let b = Arc::new(TestAsset::new("b"));
        queues.push_job(Job::Load(a.clone()));
        queues.push_job(Job::Stop);
        queues.push_job(Job::Load(b.clone()));

        spawn(&config("jobs_behind_stop"), queues.clone()).unwrap().join().unwrap();

        assert_eq!(a.load_count(), 1);
        assert_eq!(b.load_count(), 0);
        assert_eq!(queues.pending_len(), 1);
        assert_eq!(queues.completed_len(), 1);
    }

    #[test]
    fn survives_failing_and_panicking_loads() {
        setup_logger();
        let queues = Arc::new(SharedQueues::new());
        let failing = Arc::new(TestAsset::new("failing").failing_load());
        let panicking = Arc::new(TestAsset::new("panicking").panicking_load());
        let fine = Arc::new(TestAsset::new("fine"));
        queues.push_job(Job::Load(failing.clone()));
        queues.push_job(Job::Load(panicking.clone()));
        queues.push_job(Job::Load(fine.clone()));
        queues.push_job(Job::Stop);

        spawn(&config("survives_failures"), queues.clone()).unwrap().join().unwrap();

        assert!(!failing.status().is_load_valid());
        assert!(!panicking.status().is_load_valid());
        assert!(fine.status().is_load_valid());
        assert_eq!(fine.load_count(), 1);
        assert_eq!(queues.completed_len(), 3);
    }

    #[test]
    fn idle_worker_wakes_up_for_new_jobs() {
        setup_logger();
        let queues = Arc::new(SharedQueues::new());
        let handle = spawn(&config("idle_worker_wakes_up"), queues.clone()).unwrap();
        wait_until(Duration::from_secs(5), || queues.worker_state() == WorkerState::Idle);

        let asset = Arc::new(TestAsset::new("a"));
        queues.push_job(Job::Load(asset.clone()));
        wait_until(Duration::from_secs(5), || queues.completed_len() == 1);

        queues.push_job(Job::Stop);
        handle.join().unwrap();
        assert_eq!(queues.worker_state(), WorkerState::Stopped);
    }

    #[test]
    fn spawn_uses_configured_stack_size() {
        setup_logger();
        let queues = Arc::new(SharedQueues::new());
        queues.push_job(Job::Stop);
        let config = AsyncLoaderConfig {
            thread_name: "small_stack".to_owned(),
            stack_size: Some(256 * 1024),
        };
        spawn(&config, queues).unwrap().join().unwrap();
    }
}
