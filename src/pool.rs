use std::{
    collections::VecDeque,
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::config::PoolConfig;
use tokio::{
    runtime::Handle,
    sync::{futures::Notified, Notify},
};

pub(crate) type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Identifies a job while it sits in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct JobId(u64);

#[derive(Default)]
struct State {
    queue: VecDeque<(JobId, Job)>,
    next_id: u64,
    /// workers alive, busy or idle
    live: usize,
    /// workers parked waiting for a job
    idle: usize,
    /// jobs currently executing
    running: usize,
}

struct Shared {
    state: Mutex<State>,
    notify: Notify,
    workers: usize,
    keep_alive: Duration,
    runtime: Handle,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // jobs never run under the lock, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pops the next job, or registers `notified` and parks the worker as idle.
    fn take_or_park(&self, notified: Pin<&mut Notified<'_>>) -> Option<(JobId, Job)> {
        let mut state = self.lock();
        if let Some(job) = state.queue.pop_front() {
            state.running += 1;
            return Some(job);
        }
        notified.enable();
        state.idle += 1;
        None
    }

    /// Unparks a worker. Returns `false` if the worker should retire.
    fn unpark(&self, woken: bool) -> bool {
        let mut state = self.lock();
        state.idle -= 1;
        if !woken && state.queue.is_empty() {
            state.live -= 1;
            log::debug!("request worker retired ({} live)", state.live);
            return false;
        }
        true
    }

    fn job_done(&self) {
        self.lock().running -= 1;
    }
}

/// Fixed-capacity pool of workers fed by a FIFO queue.
///
/// Workers are tokio tasks spawned lazily, up to the configured capacity,
/// and retired after sitting idle for the keep-alive period. At most
/// `workers` jobs execute at any instant; the rest wait in submission order.
#[derive(Clone)]
pub(crate) struct WorkerPool {
    shared: Arc<Shared>,
}

impl WorkerPool {
    pub(crate) fn new(config: &PoolConfig, runtime: Handle) -> Self {
        let shared = Shared {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            workers: config.workers.max(1),
            keep_alive: config.keep_alive,
            runtime,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Queues `job` and makes sure a worker will pick it up.
    pub(crate) fn submit(&self, job: Job) -> JobId {
        let mut state = self.shared.lock();
        let id = JobId(state.next_id);
        state.next_id += 1;
        state.queue.push_back((id, job));

        if state.queue.len() > state.idle && state.live < self.shared.workers {
            state.live += 1;
            log::debug!("spawning request worker ({} live)", state.live);
            drop(state);
            self.shared.runtime.spawn(work(self.shared.clone()));
        } else if state.idle > 0 {
            drop(state);
            self.shared.notify.notify_one();
        }
        id
    }

    /// Removes a job that no worker has picked up yet.
    ///
    /// Returns `false` if the job already left the queue.
    pub(crate) fn remove(&self, id: JobId) -> bool {
        let mut state = self.shared.lock();
        match state.queue.iter().position(|(queued, _)| *queued == id) {
            Some(index) => {
                state.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Jobs waiting for a worker.
    pub(crate) fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Jobs currently executing.
    pub(crate) fn active(&self) -> usize {
        self.shared.lock().running
    }

    /// Workers currently alive.
    pub(crate) fn workers(&self) -> usize {
        self.shared.lock().live
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.shared.runtime
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("WorkerPool")
            .field("capacity", &self.shared.workers)
            .field("live", &state.live)
            .field("running", &state.running)
            .field("queued", &state.queue.len())
            .finish()
    }
}

async fn work(shared: Arc<Shared>) {
    loop {
        let notified = shared.notify.notified();
        tokio::pin!(notified);

        if let Some((id, job)) = shared.take_or_park(notified.as_mut()) {
            // a panicking job takes down its own tokio task, not the worker
            if let Err(e) = shared.runtime.spawn(job).await {
                log::warn!("job {:?} did not complete: {}", id, e);
            }
            shared.job_done();
            continue;
        }

        let woken = tokio::time::timeout(shared.keep_alive, notified.as_mut())
            .await
            .is_ok();
        if !shared.unpark(woken) {
            return;
        }
    }
}
