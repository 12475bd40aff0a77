//! A site-agnostic engine for JSON forum APIs.
//!
//! [`JsonEngine`] knows nothing about any particular site: the caller
//! supplies the host and one URL template per operation. Templates may use
//! `{forum}`, `{id}`, `{page}` and `{keyword}`; values are percent-encoded.
//!
//! ```rust
//! use nmb_client::{JsonEngine, Site};
//!
//! let engine = JsonEngine::new(Site::Ac, "https://forum.example")
//!     .with_post_list("/api/showf?id={forum}&page={page}")
//!     .with_post("/api/thread?id={id}&page={page}");
//! assert_eq!(
//!     engine.url("/api/showf?id={forum}&page={page}", &[("forum", "4"), ("page", "2")]),
//!     "https://forum.example/api/showf?id=4&page=2",
//! );
//! ```

use crate::{
    error::Error::UnsupportedOperation,
    http::{HttpClient, HttpRequest},
    models::{Post, Reference, SearchItem},
    request::MethodKind,
    result::Result,
    site::{Engine, Site},
};
use async_trait::async_trait;

/// Engine that fills URL templates and decodes JSON responses.
#[derive(Debug, Clone)]
pub struct JsonEngine {
    site: Site,
    host: String,
    post_list: Option<String>,
    post: Option<String>,
    reference: Option<String>,
    search: Option<String>,
}

impl JsonEngine {
    /// Creates an engine for `site` rooted at `host`, with no operations yet.
    pub fn new(site: Site, host: impl Into<String>) -> Self {
        let host: String = host.into();
        Self {
            site,
            host: host.trim_end_matches('/').to_string(),
            post_list: None,
            post: None,
            reference: None,
            search: None,
        }
    }

    /// Enables post list fetches (`{forum}`, `{page}`).
    #[must_use]
    pub fn with_post_list(mut self, template: impl Into<String>) -> Self {
        self.post_list = Some(template.into());
        self
    }

    /// Enables thread fetches (`{id}`, `{page}`).
    #[must_use]
    pub fn with_post(mut self, template: impl Into<String>) -> Self {
        self.post = Some(template.into());
        self
    }

    /// Enables reference fetches (`{id}`).
    #[must_use]
    pub fn with_reference(mut self, template: impl Into<String>) -> Self {
        self.reference = Some(template.into());
        self
    }

    /// Enables searches (`{keyword}`, `{page}`).
    #[must_use]
    pub fn with_search(mut self, template: impl Into<String>) -> Self {
        self.search = Some(template.into());
        self
    }

    /// Expands `template` against the host, percent-encoding each value.
    pub fn url(&self, template: &str, params: &[(&str, &str)]) -> String {
        let mut path = template.to_string();
        for (key, value) in params {
            path = path.replace(&format!("{{{key}}}"), &urlencoding::encode(value));
        }
        if path.starts_with('/') {
            format!("{}{}", self.host, path)
        } else {
            format!("{}/{}", self.host, path)
        }
    }

    fn template(&self, method: MethodKind) -> Result<&str> {
        let template = match method {
            MethodKind::PostList => &self.post_list,
            MethodKind::Post => &self.post,
            MethodKind::Reference => &self.reference,
            MethodKind::Search => &self.search,
        };
        template.as_deref().ok_or(UnsupportedOperation {
            site: self.site,
            method,
        })
    }
}

#[async_trait]
impl Engine for JsonEngine {
    fn site(&self) -> Site {
        self.site
    }

    async fn post_list(
        &self,
        http: &HttpClient,
        request: &HttpRequest,
        forum: &str,
        page: u32,
    ) -> Result<Vec<Post>> {
        let page = page.to_string();
        let url = self.url(
            self.template(MethodKind::PostList)?,
            &[("forum", forum), ("page", page.as_str())],
        );
        http.fetch_json(request, &url).await
    }

    async fn post(
        &self,
        http: &HttpClient,
        request: &HttpRequest,
        id: &str,
        page: u32,
    ) -> Result<Post> {
        let page = page.to_string();
        let url = self.url(
            self.template(MethodKind::Post)?,
            &[("id", id), ("page", page.as_str())],
        );
        http.fetch_json(request, &url).await
    }

    async fn reference(
        &self,
        http: &HttpClient,
        request: &HttpRequest,
        id: &str,
    ) -> Result<Reference> {
        let url = self.url(self.template(MethodKind::Reference)?, &[("id", id)]);
        http.fetch_json(request, &url).await
    }

    async fn search(
        &self,
        http: &HttpClient,
        request: &HttpRequest,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<SearchItem>> {
        let page = page.to_string();
        let url = self.url(
            self.template(MethodKind::Search)?,
            &[("keyword", keyword), ("page", page.as_str())],
        );
        http.fetch_json(request, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_values_and_joins_host() {
        let engine = JsonEngine::new(Site::Kukuku, "http://h.test/");
        assert_eq!(
            engine.url("search?q={keyword}&p={page}", &[("keyword", "a b&c"), ("page", "1")]),
            "http://h.test/search?q=a%20b%26c&p=1"
        );
        assert_eq!(engine.url("/r/{id}", &[("id", "9")]), "http://h.test/r/9");
    }

    #[test]
    fn missing_template_is_unsupported() {
        let engine = JsonEngine::new(Site::Ac, "http://h.test").with_post("/t/{id}");
        assert!(engine.template(MethodKind::Post).is_ok());
        assert!(matches!(
            engine.template(MethodKind::Search),
            Err(UnsupportedOperation {
                site: Site::Ac,
                method: MethodKind::Search
            })
        ));
    }
}
