use crate::{config::HttpConfig, error::Error, result::Result};
use reqwest::{header::USER_AGENT, Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio_util::sync::CancellationToken;

/// Abortable handle for the network work of one task.
///
/// Clones share the same abort signal. Aborting is idempotent and may
/// happen from any thread; the in-flight or next transport call made
/// with this handle fails with [`Error::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    token: CancellationToken,
    aborts: Arc<AtomicUsize>,
}

impl HttpRequest {
    /// Creates a handle that has not been aborted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the in-flight operation to stop.
    pub fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.token.cancel();
    }

    /// How many times [`abort`](Self::abort) was called on this handle or its clones.
    pub fn abort_calls(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    /// Returns `true` once [`abort`](Self::abort) has been called.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the handle is aborted.
    pub async fn aborted(&self) {
        self.token.cancelled().await;
    }

    /// Fails with [`Error::Cancelled`] if the handle has been aborted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] after an abort.
    pub fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Shared HTTP transport handed to engines.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: ReqwestClient,
    user_agent: String,
}

impl HttpClient {
    /// Builds the transport from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if reqwest can't build its client (e.g. TLS backend failure).
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http = ReqwestClient::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Sends a GET to `url` and decodes the JSON body, racing against `request`'s abort.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `request` is aborted before the body is
    /// decoded, [`Error::UnexpectedStatus`] for anything but `200 OK`, or the
    /// underlying reqwest error.
    pub async fn fetch_json<T>(&self, request: &HttpRequest, url: &str) -> Result<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        request.check()?;

        let fetch = async {
            log::info!("request for {} dispatched", url);
            let response = self
                .http
                .get(url)
                .header(USER_AGENT, &self.user_agent)
                .send()
                .await?;

            log::info!("response status: {}", response.status());

            match response.status() {
                StatusCode::OK => response.json::<T>().await.map_err(Into::into),
                code => Err(Error::UnexpectedStatus(code)),
            }
        };

        tokio::select! {
            biased;
            () = request.aborted() => {
                log::debug!("request for {} aborted", url);
                Err(Error::Cancelled)
            }
            result = fetch => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_is_idempotent_and_shared_by_clones() {
        let request = HttpRequest::new();
        let clone = request.clone();
        assert!(request.check().is_ok());

        clone.abort();
        clone.abort();

        assert!(request.is_aborted());
        assert_eq!(request.abort_calls(), 2);
        assert!(matches!(request.check(), Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn aborted_request_fails_before_sending() {
        let http = HttpClient::new(&HttpConfig::default()).unwrap();
        let request = HttpRequest::new();
        request.abort();

        // unroutable: reaching the network would not return Cancelled
        let result: Result<serde_json::Value> =
            http.fetch_json(&request, "http://127.0.0.1:9/never").await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
