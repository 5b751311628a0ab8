use std::{collections::VecDeque, fmt, sync::Arc};

use jeriya_shared::parking_lot::{Condvar, Mutex, MutexGuard};

use crate::{AsyncAsset, WorkerState};

/// Item in the [`JobQueue`]
#[derive(Clone)]
pub(crate) enum Job {
    Load(Arc<dyn AsyncAsset>),
    /// Makes the worker thread exit once every job in front of it was loaded.
    Stop,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Load(asset) => f.debug_tuple("Load").field(asset.key()).finish(),
            Job::Stop => f.write_str("Stop"),
        }
    }
}

/// Compares the addresses of the assets and ignores the vtables.
pub(crate) fn same_asset(a: &Arc<dyn AsyncAsset>, b: &Arc<dyn AsyncAsset>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Jobs in submission order. The job that is currently loaded stays at the front until it's done.
#[derive(Debug, Default)]
pub(crate) struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn push(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    pub fn front(&self) -> Option<&Job> {
        self.jobs.front()
    }

    pub fn pop_front_if_any(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    pub fn ends_with_stop(&self) -> bool {
        matches!(self.jobs.back(), Some(Job::Stop))
    }

    pub fn has_stop(&self) -> bool {
        self.jobs.iter().any(|job| matches!(job, Job::Stop))
    }

    /// Number of [`Job::Load`]s including the one that is currently loaded.
    pub fn pending_loads(&self) -> usize {
        self.jobs.iter().filter(|job| matches!(job, Job::Load(_))).count()
    }

    pub fn contains(&self, asset: &Arc<dyn AsyncAsset>) -> bool {
        self.jobs.iter().any(|job| match job {
            Job::Load(queued) => same_asset(queued, asset),
            Job::Stop => false,
        })
    }
}

/// Loaded assets waiting to be finalized, in the order in which they were loaded.
#[derive(Default)]
pub(crate) struct DoneQueue {
    assets: VecDeque<Arc<dyn AsyncAsset>>,
}

impl DoneQueue {
    pub fn push(&mut self, asset: Arc<dyn AsyncAsset>) {
        self.assets.push_back(asset);
    }

    pub fn pop_front_if_any(&mut self) -> Option<Arc<dyn AsyncAsset>> {
        self.assets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn contains(&self, asset: &Arc<dyn AsyncAsset>) -> bool {
        self.assets.iter().any(|done| same_asset(done, asset))
    }
}

/// State that is shared between the worker thread and the callers of the loader.
pub(crate) struct Queues {
    pub jobs: JobQueue,
    pub done: DoneQueue,
    /// Written by the worker thread. [`WorkerState::Draining`] is never stored.
    pub worker_state: WorkerState,
}

/// [`JobQueue`] and [`DoneQueue`] behind a single mutex so that moving an asset from one to
/// the other is atomic. The condition variable is signalled once for every pushed job.
pub(crate) struct SharedQueues {
    queues: Mutex<Queues>,
    job_available: Condvar,
}

impl SharedQueues {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(Queues {
                jobs: JobQueue::default(),
                done: DoneQueue::default(),
                worker_state: WorkerState::Stopped,
            }),
            job_available: Condvar::new(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock()
    }

    /// Blocks until a job was pushed. Spurious wakeups are possible.
    pub fn wait_for_job(&self, guard: &mut MutexGuard<'_, Queues>) {
        self.job_available.wait(guard);
    }

    pub fn push_job(&self, job: Job) {
        self.queues.lock().jobs.push(job);
        self.job_available.notify_one();
    }

    /// Pushes a [`Job::Stop`] unless the last job already is one. Returns whether it was pushed.
    pub fn push_stop(&self) -> bool {
        let mut queues = self.queues.lock();
        if queues.jobs.ends_with_stop() {
            return false;
        }
        queues.jobs.push(Job::Stop);
        drop(queues);
        self.job_available.notify_one();
        true
    }

    /// Pushes a [`Job::Stop`] only when the worker is alive and not already going to stop.
    pub fn push_stop_for_running_worker(&self) -> bool {
        let mut queues = self.queues.lock();
        if queues.worker_state == WorkerState::Stopped || queues.jobs.has_stop() {
            return false;
        }
        queues.jobs.push(Job::Stop);
        drop(queues);
        self.job_available.notify_one();
        true
    }

    pub fn pop_done(&self) -> Option<Arc<dyn AsyncAsset>> {
        self.queues.lock().done.pop_front_if_any()
    }

    pub fn is_queued(&self, asset: &Arc<dyn AsyncAsset>) -> bool {
        let queues = self.queues.lock();
        queues.jobs.contains(asset) || queues.done.contains(asset)
    }

    /// Returns `true` when no asset waits to be loaded or finalized. Stop markers don't count.
    pub fn is_drained(&self) -> bool {
        let queues = self.queues.lock();
        queues.jobs.pending_loads() == 0 && queues.done.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.queues.lock().jobs.pending_loads()
    }

    pub fn completed_len(&self) -> usize {
        self.queues.lock().done.len()
    }

    pub fn worker_state(&self) -> WorkerState {
        let queues = self.queues.lock();
        match queues.worker_state {
            WorkerState::Idle | WorkerState::Running if queues.jobs.has_stop() => WorkerState::Draining,
            state => state,
        }
    }
}
