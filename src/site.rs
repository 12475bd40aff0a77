use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    callback::Response,
    error::Error::UnsupportedOperation,
    http::{HttpClient, HttpRequest},
    models::{Post, Reference, SearchItem},
    request::{Method, MethodKind},
    result::Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The closed set of forum sites a request can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    /// The A-Island board.
    Ac,
    /// The Kukuku board.
    Kukuku,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Ac => f.write_str("ac"),
            Site::Kukuku => f.write_str("kukuku"),
        }
    }
}

/// Site-specific capability that builds requests and parses responses.
///
/// Every operation defaults to [`Error::UnsupportedOperation`], so an engine
/// only implements what its site offers. Operations must honor
/// [`HttpRequest::aborted`] and fail with [`Error::Cancelled`] once the
/// handle is aborted.
///
/// [`Error::UnsupportedOperation`]: crate::error::Error::UnsupportedOperation
/// [`Error::Cancelled`]: crate::error::Error::Cancelled
#[async_trait]
pub trait Engine: Send + Sync {
    /// The site this engine talks to.
    fn site(&self) -> Site;

    /// Creates the transport handle owned by one task.
    fn request(&self) -> HttpRequest {
        HttpRequest::new()
    }

    /// Fetches one page of a forum's thread list.
    async fn post_list(
        &self,
        _http: &HttpClient,
        _request: &HttpRequest,
        _forum: &str,
        _page: u32,
    ) -> Result<Vec<Post>> {
        Err(UnsupportedOperation {
            site: self.site(),
            method: MethodKind::PostList,
        })
    }

    /// Fetches one page of a thread.
    async fn post(
        &self,
        _http: &HttpClient,
        _request: &HttpRequest,
        _id: &str,
        _page: u32,
    ) -> Result<Post> {
        Err(UnsupportedOperation {
            site: self.site(),
            method: MethodKind::Post,
        })
    }

    /// Fetches a single post referenced from another post's body.
    async fn reference(
        &self,
        _http: &HttpClient,
        _request: &HttpRequest,
        _id: &str,
    ) -> Result<Reference> {
        Err(UnsupportedOperation {
            site: self.site(),
            method: MethodKind::Reference,
        })
    }

    /// Searches the site for a keyword.
    async fn search(
        &self,
        _http: &HttpClient,
        _request: &HttpRequest,
        _keyword: &str,
        _page: u32,
    ) -> Result<Vec<SearchItem>> {
        Err(UnsupportedOperation {
            site: self.site(),
            method: MethodKind::Search,
        })
    }
}

/// Runs `method` against `engine` and wraps the outcome in a [`Response`].
pub(crate) async fn route(
    engine: &dyn Engine,
    http: &HttpClient,
    request: &HttpRequest,
    method: &Method,
) -> Result<Response> {
    match method {
        Method::PostList { forum, page } => engine
            .post_list(http, request, forum, *page)
            .await
            .map(Response::PostList),
        Method::Post { id, page } => engine
            .post(http, request, id, *page)
            .await
            .map(Response::Post),
        Method::Reference { id } => engine
            .reference(http, request, id)
            .await
            .map(Response::Reference),
        Method::Search { keyword, page } => engine
            .search(http, request, keyword, *page)
            .await
            .map(Response::Search),
    }
}

/// Lookup table from [`Site`] to the engine that serves it.
#[derive(Clone, Default)]
pub struct Registry {
    engines: HashMap<Site, Arc<dyn Engine>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `engine` under the site it reports, replacing any previous one.
    #[must_use]
    pub fn with(mut self, engine: impl Engine + 'static) -> Self {
        self.register(Arc::new(engine));
        self
    }

    /// Registers a shared engine under the site it reports.
    pub fn register(&mut self, engine: Arc<dyn Engine>) {
        let site = engine.site();
        if self.engines.insert(site, engine).is_some() {
            log::debug!("replaced engine for {}", site);
        }
    }

    /// Returns the engine for `site`, if one is registered.
    pub fn get(&self, site: Site) -> Option<Arc<dyn Engine>> {
        self.engines.get(&site).cloned()
    }

    /// Returns `true` if an engine serves `site`.
    pub fn supports(&self, site: Site) -> bool {
        self.engines.contains_key(&site)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.engines.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct SearchOnly;

    #[async_trait]
    impl Engine for SearchOnly {
        fn site(&self) -> Site {
            Site::Kukuku
        }

        async fn search(
            &self,
            _http: &HttpClient,
            _request: &HttpRequest,
            keyword: &str,
            page: u32,
        ) -> Result<Vec<SearchItem>> {
            Ok(vec![SearchItem::new(page.to_string(), keyword)])
        }
    }

    #[test]
    fn registry_routes_by_site() {
        let registry = Registry::new().with(SearchOnly);
        assert!(registry.supports(Site::Kukuku));
        assert!(!registry.supports(Site::Ac));
        assert!(registry.get(Site::Ac).is_none());
        assert_eq!(registry.get(Site::Kukuku).map(|e| e.site()), Some(Site::Kukuku));
    }

    #[tokio::test]
    async fn missing_capability_is_unsupported_operation() {
        let http = HttpClient::new(&crate::config::HttpConfig::default()).unwrap();
        let request = HttpRequest::new();
        let method = Method::Reference { id: "1".into() };

        let err = route(&SearchOnly, &http, &request, &method).await.unwrap_err();
        match err {
            Error::UnsupportedOperation { site, method } => {
                assert_eq!(site, Site::Kukuku);
                assert_eq!(method, MethodKind::Reference);
            }
            other => panic!("expected UnsupportedOperation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn implemented_capability_is_wrapped() {
        let http = HttpClient::new(&crate::config::HttpConfig::default()).unwrap();
        let request = HttpRequest::new();
        let method = Method::Search {
            keyword: "rust".into(),
            page: 2,
        };

        match route(&SearchOnly, &http, &request, &method).await.unwrap() {
            Response::Search(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].id(), "2");
                assert_eq!(items[0].context(), "rust");
            }
            other => panic!("expected search response, got {other:?}"),
        }
    }
}
