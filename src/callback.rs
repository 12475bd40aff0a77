use crate::{
    error::Error,
    models::{Post, Reference, SearchItem},
};

/// Successful result of a routed operation.
#[derive(Debug, Clone)]
pub enum Response {
    /// Result of [`Method::PostList`](crate::request::Method::PostList).
    PostList(Vec<Post>),
    /// Result of [`Method::Post`](crate::request::Method::Post).
    Post(Post),
    /// Result of [`Method::Reference`](crate::request::Method::Reference).
    Reference(Reference),
    /// Result of [`Method::Search`](crate::request::Method::Search).
    Search(Vec<SearchItem>),
}

/// The terminal outcome of a request, as seen by closure callbacks.
#[derive(Debug)]
pub enum Outcome {
    /// The operation produced a response.
    Success(Response),
    /// The operation failed.
    Failure(Error),
    /// The request was cancelled before or while running.
    Cancelled,
}

/// Receiver of a request's terminal outcome.
///
/// Exactly one of these methods is called, exactly once, for every
/// request handed to [`Client::execute`]. Each consumes the callback.
///
/// Any `FnOnce(Outcome) + Send` closure is a `Callback`.
///
/// [`Client::execute`]: crate::Client::execute
pub trait Callback: Send {
    /// Called with the operation's response.
    fn on_success(self: Box<Self>, result: Response);

    /// Called with the error that ended the operation.
    fn on_failure(self: Box<Self>, error: Error);

    /// Called when the request was cancelled.
    fn on_cancelled(self: Box<Self>);
}

impl<F> Callback for F
where
    F: FnOnce(Outcome) + Send,
{
    fn on_success(self: Box<Self>, result: Response) {
        (*self)(Outcome::Success(result));
    }

    fn on_failure(self: Box<Self>, error: Error) {
        (*self)(Outcome::Failure(error));
    }

    fn on_cancelled(self: Box<Self>) {
        (*self)(Outcome::Cancelled);
    }
}

/// Hands `result` to the matching callback method.
///
/// Cancellation-kind errors become [`Callback::on_cancelled`].
pub(crate) fn deliver(callback: Box<dyn Callback>, result: crate::result::Result<Response>) {
    match result {
        Ok(response) => callback.on_success(response),
        Err(e) if e.is_cancelled() => callback.on_cancelled(),
        Err(e) => callback.on_failure(e),
    }
}
