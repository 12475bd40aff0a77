use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    config::Config,
    delivery::Deliverer,
    error::Error,
    http::HttpClient,
    pool::WorkerPool,
    request::{NmbRequest, RequestHandle},
    result::Result,
    site::Registry,
    task::Task,
};
use tokio::runtime::{Builder, Handle, Runtime};

/// State shared between the client and its tasks.
pub(crate) struct Inner {
    pub(crate) pool: WorkerPool,
    pub(crate) http: HttpClient,
    pub(crate) deliverer: Deliverer,
    pub(crate) stop_grace: Duration,
    pub(crate) stuck: AtomicUsize,
}

/// Dispatches requests to site engines on a bounded worker pool.
///
/// Every request handed to [`execute`](Client::execute) gets exactly one
/// terminal callback.
#[derive(Debug)]
pub struct Client {
    pub(crate) inner: Arc<Inner>,
    registry: Registry,
    config: Config,
    runtime: Option<WorkerRuntime>,
}

impl Client {
    /// Starts building a client whose worker-side callbacks go through `deliverer`.
    ///
    /// Pass the [`Deliverer`] of a [`DeliveryQueue`](crate::DeliveryQueue)
    /// to receive callbacks on the caller's own task, or
    /// [`Deliverer::inline`] to receive them on the worker.
    pub fn builder(deliverer: Deliverer) -> ClientBuilder {
        ClientBuilder {
            config: Config::default(),
            registry: Registry::new(),
            deliverer,
            runtime: None,
        }
    }

    /// Builds a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientFormation`] if the worker runtime can't be
    /// started, or a transport error if the HTTP client can't be built.
    pub fn new(registry: Registry, deliverer: Deliverer) -> Result<Self> {
        Self::builder(deliverer).registry(registry).build()
    }

    /// Submits `request`.
    ///
    /// A request that is already cancelled reports
    /// [`on_cancelled`](crate::Callback::on_cancelled) before this returns
    /// and never reaches the pool. Otherwise the request is queued and the
    /// returned handle can cancel it later.
    pub fn execute(&self, request: NmbRequest) -> RequestHandle {
        let handle = request.handle();
        let NmbRequest {
            site,
            method,
            callback,
            ..
        } = request;

        if handle.is_cancelled() {
            log::debug!("{} request on {} cancelled before dispatch", method.kind(), site);
            callback.on_cancelled();
            return handle;
        }

        let engine = self.registry.get(site);
        let task = Arc::new(Task::new(
            self.inner.clone(),
            site,
            method,
            callback,
            engine,
            handle.clone(),
        ));
        let job = self.inner.pool.submit(Box::pin(task.clone().run()));
        task.set_job(job);
        handle.attach(&task);

        handle
    }

    /// The engines this client routes to.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Requests waiting for a worker.
    pub fn queued(&self) -> usize {
        self.inner.pool.queued()
    }

    /// Requests currently executing.
    pub fn active(&self) -> usize {
        self.inner.pool.active()
    }

    /// Workers currently alive.
    pub fn workers(&self) -> usize {
        self.inner.pool.workers()
    }

    /// Tasks that were still running `stop_grace` after being stopped.
    pub fn stuck_tasks(&self) -> usize {
        self.inner.stuck.load(Ordering::SeqCst)
    }

    /// Returns `true` if the workers run on a runtime owned by this client.
    pub fn owns_runtime(&self) -> bool {
        self.runtime.is_some()
    }
}

/// Multi-thread runtime hosting the workers of one client.
///
/// Shut down without blocking on drop, so a client can be dropped from
/// inside another runtime.
struct WorkerRuntime(Option<Runtime>);

impl WorkerRuntime {
    fn start(workers: usize) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers.max(1))
            .thread_name("nmb-worker")
            .enable_all()
            .build()
            .map_err(|e| {
                log::error!("failed to start worker runtime: {}", e);
                Error::ClientFormation
            })?;
        Ok(Self(Some(runtime)))
    }

    fn handle(&self) -> Option<Handle> {
        self.0.as_ref().map(|runtime| runtime.handle().clone())
    }
}

impl Drop for WorkerRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for WorkerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WorkerRuntime")
    }
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("pool", &self.pool)
            .field("deliverer", &self.deliverer)
            .field("stuck", &self.stuck)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Client`], created by [`Client::builder`].
#[derive(Debug)]
pub struct ClientBuilder {
    config: Config,
    registry: Registry,
    deliverer: Deliverer,
    runtime: Option<Handle>,
}

impl ClientBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the engines requests are routed to.
    #[must_use]
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Runs the workers on `runtime` instead of a runtime owned by the client.
    ///
    /// The caller is then responsible for keeping engine work off its own
    /// threads, e.g. by passing a separate multi-thread runtime.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the client.
    ///
    /// Without [`runtime`](Self::runtime), the client starts its own
    /// multi-thread runtime with one `nmb-worker` thread per worker, so
    /// engines never share a thread with the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientFormation`] if the worker runtime can't be
    /// started, or a transport error if the HTTP client can't be built.
    pub fn build(self) -> Result<Client> {
        let http = HttpClient::new(&self.config.http)?;
        let (handle, owned) = match self.runtime {
            Some(handle) => (handle, None),
            None => {
                let owned = WorkerRuntime::start(self.config.pool.workers)?;
                let handle = owned.handle().ok_or(Error::ClientFormation)?;
                (handle, Some(owned))
            }
        };
        let pool = WorkerPool::new(&self.config.pool, handle);

        let inner = Inner {
            pool,
            http,
            deliverer: self.deliverer,
            stop_grace: self.config.stop_grace,
            stuck: AtomicUsize::new(0),
        };

        Ok(Client {
            inner: Arc::new(inner),
            registry: self.registry,
            config: self.config,
            runtime: owned,
        })
    }
}
