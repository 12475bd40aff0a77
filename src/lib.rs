#![deny(clippy::all, clippy::pedantic)]
#![deny(missing_docs)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]
//! # nmb-client
//!
//! nmb-client dispatches requests to several interchangeable forum APIs
//! ("sites"), each served by its own [`Engine`], and reports every request's
//! outcome exactly once.
//!
//! Requests:
//! - run on a bounded [worker pool](config::PoolConfig), in submission order.
//! - can be cancelled at any time through their [`RequestHandle`].
//! - report through a [`Callback`] on the caller's [`DeliveryQueue`], or
//!   inline on the worker.
//!
//! ## Example: Searching a site and waiting for the result.
//!
//! ```rust,no_run
//! # type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
//! use nmb_client::{Client, DeliveryQueue, JsonEngine, Method, NmbRequest, Outcome, Registry, Site};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let engine = JsonEngine::new(Site::Ac, "https://forum.example")
//!         .with_search("/api/search?q={keyword}&page={page}");
//!     let (mut queue, deliverer) = DeliveryQueue::new();
//!     let client = Client::new(Registry::new().with(engine), deliverer)?;
//!
//!     let request = NmbRequest::new(
//!         Site::Ac,
//!         Method::Search { keyword: "rust".into(), page: 1 },
//!         |outcome: Outcome| println!("search finished: {outcome:?}"),
//!     );
//!     let handle = client.execute(request);
//!     assert!(!handle.is_cancelled());
//!
//!     // the callback runs here, on this task
//!     queue.dispatch_next().await;
//!     Ok(())
//! }
//! ```

/// Callback trait and the values it receives.
pub mod callback;

/// [`Client`], the request dispatcher.
pub mod client;

/// Configuration for the pool, the transport and stop handling.
pub mod config;

pub mod delivery;

/// Contains [`Error`]s that can be reported by the library.
///
/// [`Error`]: crate::error::Error
pub mod error;

/// Transport: the shared HTTP client and the per-task abortable handle.
pub mod http;

pub mod json_engine;

/// Objects produced by engines.
pub mod models;

/// Requests and the handles used to cancel them.
pub mod request;

/// Sites, the [`Engine`] capability, and the registry routing between them.
pub mod site;

pub(crate) mod pool;

pub(crate) mod result;

pub(crate) mod task;

pub use callback::{Callback, Outcome, Response};
pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use delivery::{Deliverer, DeliveryQueue};
pub use error::Error;
pub use http::{HttpClient, HttpRequest};
pub use json_engine::JsonEngine;
pub use request::{Method, MethodKind, NmbRequest, RequestHandle};
pub use result::Result;
pub use site::{Engine, Registry, Site};
