use crate::{request::MethodKind, site::Site};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors delivered to [`Callback::on_failure`] or returned while building a client.
///
/// [`Callback::on_failure`]: crate::callback::Callback::on_failure
#[derive(Debug, Error)]
pub enum Error {
    /// No engine is registered for the site.
    #[error("can't detect site {0}")]
    UnsupportedSite(Site),

    /// The site's engine does not offer the operation.
    #[error("site {site} does not support {method}")]
    UnsupportedOperation {
        /// Site the request was routed to.
        site: Site,
        /// Operation that was requested.
        method: MethodKind,
    },

    /// Network or decoding failure reported by reqwest.
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),

    /// The server answered with a status the engine can't handle.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),

    /// The transport handle was aborted while the operation was in flight.
    #[error("request was cancelled")]
    Cancelled,

    /// The engine failed without producing an error of its own (e.g. it panicked).
    #[error("engine failure: {0}")]
    Engine(String),

    /// The runtime hosting the worker pool could not be started.
    #[error("could not start up the client")]
    ClientFormation,
}

impl Error {
    /// Returns `true` if the error means the operation observed an abort.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
