//! Shared helpers for dispatcher integration tests.

#![allow(dead_code)]

use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use log::LevelFilter;
use nmb_client::{
    models::SearchItem, Engine, Error, HttpClient, HttpRequest, Method, NmbRequest, Outcome,
    Result, Site,
};
use simple_logger::SimpleLogger;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Routes the crate's log output to stderr. Safe to call from every test.
pub fn init_logging() {
    // only the first test in the binary gets to install the logger
    let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
}

/// Engine that records what it was asked to do.
///
/// Searches sleep for `delay` (or until aborted) and echo the keyword.
/// The keywords `"fail"` and `"panic"` make the search fail or panic;
/// `"block"` holds the worker thread for `delay` without yielding.
pub struct Spy {
    site: Site,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    opened: AtomicUsize,
    transports: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Spy {
    pub fn new(site: Site, delay: Duration) -> Arc<Self> {
        init_logging();
        Arc::new(Self {
            site,
            delay,
            calls: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
            transports: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    /// Keywords the engine was invoked with, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Transport handles the engine created.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn transports(&self) -> Vec<HttpRequest> {
        self.transports.lock().unwrap().clone()
    }

    /// Abort calls received across every transport handed out.
    pub fn aborts(&self) -> usize {
        self.transports
            .lock()
            .unwrap()
            .iter()
            .map(HttpRequest::abort_calls)
            .sum()
    }

    /// Highest number of searches observed running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Engine for Spy {
    fn site(&self) -> Site {
        self.site
    }

    fn request(&self) -> HttpRequest {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let request = HttpRequest::new();
        self.transports.lock().unwrap().push(request.clone());
        request
    }

    async fn search(
        &self,
        _http: &HttpClient,
        request: &HttpRequest,
        keyword: &str,
        _page: u32,
    ) -> Result<Vec<SearchItem>> {
        self.calls.lock().unwrap().push(keyword.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = match keyword {
            "fail" => Err(Error::Engine("spy failure".into())),
            "panic" => panic!("spy panic"),
            k if k.starts_with("block") => {
                std::thread::sleep(self.delay);
                Ok(vec![SearchItem::new("1", keyword)])
            }
            _ => {
                tokio::select! {
                    () = tokio::time::sleep(self.delay) => Ok(vec![SearchItem::new("1", keyword)]),
                    () = request.aborted() => Err(Error::Cancelled),
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn search(keyword: &str) -> Method {
    Method::Search {
        keyword: keyword.into(),
        page: 1,
    }
}

/// Collects `(tag, outcome)` pairs from many requests.
pub struct Outcomes {
    tx: UnboundedSender<(String, Outcome)>,
    rx: UnboundedReceiver<(String, Outcome)>,
}

impl Outcomes {
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Self { tx, rx }
    }

    /// Builds a request whose outcome is recorded under `keyword`.
    pub fn request(&self, site: Site, keyword: &str) -> NmbRequest {
        let tx = self.tx.clone();
        let tag = keyword.to_string();
        NmbRequest::new(site, search(keyword), move |outcome: Outcome| {
            let _ = tx.send((tag, outcome));
        })
    }

    /// Waits for the next outcome.
    pub async fn next(&mut self) -> (String, Outcome) {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a callback")
            .expect("outcome channel closed")
    }

    /// Returns an outcome that is already available, if any.
    pub fn try_next(&mut self) -> Option<(String, Outcome)> {
        self.rx.try_recv().ok()
    }
}

/// Polls `condition` until it holds, failing after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition never became true"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

pub async fn with_timeout<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
