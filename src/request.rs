use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
};

use crate::{callback::Callback, site::Site, task::Task};

/// An operation together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// One page of a forum's thread list.
    PostList {
        /// Forum identifier.
        forum: String,
        /// Page number, starting at 1.
        page: u32,
    },
    /// One page of a thread.
    Post {
        /// Thread identifier.
        id: String,
        /// Page number, starting at 1.
        page: u32,
    },
    /// A single post referenced from another post's body.
    Reference {
        /// Post identifier.
        id: String,
    },
    /// A keyword search.
    Search {
        /// Search terms.
        keyword: String,
        /// Page number, starting at 1.
        page: u32,
    },
}

impl Method {
    /// The operation without its arguments.
    pub fn kind(&self) -> MethodKind {
        match self {
            Method::PostList { .. } => MethodKind::PostList,
            Method::Post { .. } => MethodKind::Post,
            Method::Reference { .. } => MethodKind::Reference,
            Method::Search { .. } => MethodKind::Search,
        }
    }
}

/// The kinds of operation an engine can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// See [`Method::PostList`].
    PostList,
    /// See [`Method::Post`].
    Post,
    /// See [`Method::Reference`].
    Reference,
    /// See [`Method::Search`].
    Search,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodKind::PostList => "post list",
            MethodKind::Post => "post",
            MethodKind::Reference => "reference",
            MethodKind::Search => "search",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct RequestState {
    cancelled: AtomicBool,
    task: Mutex<Option<Weak<Task>>>,
}

/// A request waiting to be handed to [`Client::execute`].
///
/// ```rust
/// use nmb_client::{Method, NmbRequest, Outcome, Site};
///
/// let request = NmbRequest::new(
///     Site::Ac,
///     Method::Search { keyword: "rust".into(), page: 1 },
///     |outcome: Outcome| println!("{outcome:?}"),
/// );
/// let handle = request.handle();
/// assert!(!handle.is_cancelled());
/// ```
///
/// [`Client::execute`]: crate::Client::execute
pub struct NmbRequest {
    pub(crate) site: Site,
    pub(crate) method: Method,
    pub(crate) callback: Box<dyn Callback>,
    state: Arc<RequestState>,
}

impl NmbRequest {
    /// Builds a request for `method` on `site`, reporting to `callback`.
    pub fn new(site: Site, method: Method, callback: impl Callback + 'static) -> Self {
        Self::with_boxed(site, method, Box::new(callback))
    }

    /// Like [`new`](Self::new) for an already boxed callback.
    pub fn with_boxed(site: Site, method: Method, callback: Box<dyn Callback>) -> Self {
        Self {
            site,
            method,
            callback,
            state: Arc::default(),
        }
    }

    /// The site the request targets.
    pub fn site(&self) -> Site {
        self.site
    }

    /// The operation and its arguments.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// A handle sharing this request's cancellation state.
    pub fn handle(&self) -> RequestHandle {
        RequestHandle {
            state: self.state.clone(),
        }
    }
}

impl fmt::Debug for NmbRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NmbRequest")
            .field("site", &self.site)
            .field("method", &self.method)
            .field("cancelled", &self.state.cancelled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Caller-side view of a request: cancel it, or check whether it was cancelled.
#[derive(Clone)]
pub struct RequestHandle {
    state: Arc<RequestState>,
}

impl RequestHandle {
    /// Cancels the request.
    ///
    /// Before [`Client::execute`] this makes `execute` report cancellation
    /// without doing any work. Afterwards it stops the running task. Calling
    /// it again does nothing.
    ///
    /// [`Client::execute`]: crate::Client::execute
    pub fn cancel(&self) {
        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.task() {
            task.stop();
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `true` while a task is associated with the request.
    pub fn is_running(&self) -> bool {
        self.task().is_some()
    }

    fn task(&self) -> Option<Arc<Task>> {
        self.state
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn attach(&self, task: &Arc<Task>) {
        *self.state.task.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::downgrade(task));
        // a cancel may have landed between the dispatcher's check and the attach
        if self.is_cancelled() {
            task.stop();
        }
    }

    pub(crate) fn detach(&self) {
        self.state
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("cancelled", &self.is_cancelled())
            .field("running", &self.is_running())
            .finish()
    }
}
