use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use crate::{
    callback::{deliver, Callback, Response},
    client::Inner,
    error::Error,
    http::HttpRequest,
    pool::JobId,
    request::{Method, RequestHandle},
    result::Result,
    site::{route, Engine, Site},
};

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The unit of work bound to one request.
///
/// State moves `PENDING -> RUNNING -> FINISHED` or `PENDING -> FINISHED`
/// and never back. Whoever makes the transition out of `PENDING` owns the
/// delivery: the worker when it starts the task, [`stop`](Task::stop)
/// when it wins the race and cancels a queued task.
pub(crate) struct Task {
    id: u64,
    site: Site,
    method: Method,
    engine: Option<Arc<dyn Engine>>,
    state: AtomicU8,
    stop_requested: AtomicBool,
    callback: Mutex<Option<Box<dyn Callback>>>,
    transport: Mutex<Option<HttpRequest>>,
    job: Mutex<Option<JobId>>,
    request: RequestHandle,
    inner: Arc<Inner>,
}

impl Task {
    pub(crate) fn new(
        inner: Arc<Inner>,
        site: Site,
        method: Method,
        callback: Box<dyn Callback>,
        engine: Option<Arc<dyn Engine>>,
        request: RequestHandle,
    ) -> Self {
        let transport = engine.as_ref().map(|engine| engine.request());
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            site,
            method,
            engine,
            state: AtomicU8::new(PENDING),
            stop_requested: AtomicBool::new(false),
            callback: Mutex::new(Some(callback)),
            transport: Mutex::new(transport),
            job: Mutex::new(None),
            request,
            inner,
        }
    }

    pub(crate) fn set_job(&self, job: JobId) {
        *lock(&self.job) = Some(job);
    }

    /// Entry point for the worker that dequeued this task.
    pub(crate) async fn run(self: Arc<Self>) {
        if self
            .state
            .compare_exchange(PENDING, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("task {} was stopped before it started", self.id);
            return;
        }

        log::debug!("task {} running {} on {}", self.id, self.method.kind(), self.site);
        let result = self.execute().await;
        self.finish(result);
    }

    async fn execute(&self) -> Result<Response> {
        let (Some(engine), Some(request)) = (self.engine.clone(), self.transport()) else {
            return Err(Error::UnsupportedSite(self.site));
        };
        let http = self.inner.http.clone();
        let method = self.method.clone();

        let routed = self
            .inner
            .pool
            .runtime()
            .spawn(async move { route(engine.as_ref(), &http, &request, &method).await });

        match routed.await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("engine for {} failed in task {}: {}", self.site, self.id, e);
                Err(Error::Engine(e.to_string()))
            }
        }
    }

    /// Posts the outcome, then clears the task's references once it is delivered.
    fn finish(self: &Arc<Self>, result: Result<Response>) {
        self.state.store(FINISHED, Ordering::SeqCst);

        let callback = lock(&self.callback).take();
        let task = Arc::clone(self);
        self.inner.deliverer.post(Box::new(move || {
            if let Some(callback) = callback {
                deliver(callback, result);
            }
            task.release();
        }));
    }

    fn release(&self) {
        lock(&self.transport).take();
        self.request.detach();
    }

    /// Stops the task.
    ///
    /// A queued task is pulled from the pool and reports cancellation right
    /// here. A running task has its transport aborted and reports through
    /// the worker once the engine returns. Only the first call does anything.
    pub(crate) fn stop(self: &Arc<Self>) {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            return;
        }

        match self
            .state
            .compare_exchange(PENDING, FINISHED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                log::debug!("task {} cancelled while queued", self.id);
                if let Some(job) = *lock(&self.job) {
                    self.inner.pool.remove(job);
                }

                let callback = lock(&self.callback).take();
                if let Some(callback) = callback {
                    callback.on_cancelled();
                }
                self.release();
            }
            Err(RUNNING) => {
                log::debug!("task {} aborting in-flight request", self.id);
                if let Some(transport) = self.transport() {
                    transport.abort();
                }
                self.watch();
            }
            Err(_) => {}
        }
    }

    /// Reports the task as stuck if it is still running after the stop grace period.
    fn watch(self: &Arc<Self>) {
        let task = Arc::downgrade(self);
        let grace = self.inner.stop_grace;
        let inner = self.inner.clone();

        self.inner.pool.runtime().spawn(async move {
            tokio::time::sleep(grace).await;
            let Some(task) = task.upgrade() else {
                return;
            };
            if task.state.load(Ordering::SeqCst) == RUNNING {
                inner.stuck.fetch_add(1, Ordering::SeqCst);
                log::warn!(
                    "task {} ({} on {}) still running {:?} after abort",
                    task.id,
                    task.method.kind(),
                    task.site,
                    grace
                );
            }
        });
    }

    fn transport(&self) -> Option<HttpRequest> {
        lock(&self.transport).clone()
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.state.load(Ordering::SeqCst) == FINISHED
    }
}
