//! Map short-link expansion
//!
//! Short links carry no coordinates; following their redirects yields the
//! long-form map URL the coordinate parser understands. Expansions are
//! cached for the life of the process.

use crate::error::{RoutingError, RoutingResult};
use async_trait::async_trait;
use lastmile_core::cache::MemoCache;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Hosts whose links must be expanded before parsing
const SHORT_LINK_HOSTS: &[&str] = &["maps.app.goo.gl", "goo.gl"];

/// Maximum redirects followed for one link
const MAX_REDIRECTS: usize = 10;

/// True if `url` points at a known short-link host.
pub fn is_short_link(url: &str) -> bool {
    let Some((_, rest)) = url.split_once("://") else {
        return false;
    };
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    SHORT_LINK_HOSTS.contains(&host.as_str())
}

/// Resolves a URL to the final URL of its redirect chain.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Follow redirects from `url` and return where they end.
    async fn resolve(&self, url: &str) -> RoutingResult<String>;
}

#[async_trait]
impl<R: LinkResolver + ?Sized> LinkResolver for Box<R> {
    async fn resolve(&self, url: &str) -> RoutingResult<String> {
        (**self).resolve(url).await
    }
}

/// Redirect-following resolver over HTTP.
#[derive(Clone)]
pub struct HttpLinkResolver {
    inner: Client,
}

impl HttpLinkResolver {
    /// Create a resolver with a per-request timeout
    pub fn new(timeout: Duration) -> RoutingResult<Self> {
        let inner = Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(RoutingError::Request)?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl LinkResolver for HttpLinkResolver {
    async fn resolve(&self, url: &str) -> RoutingResult<String> {
        let response = self.inner.get(url).send().await?;
        Ok(response.url().to_string())
    }
}

/// Short-link expander with an insert-only cache.
pub struct ShortLinkExpander<R = HttpLinkResolver> {
    resolver: R,
    cache: MemoCache<String, String>,
}

impl ShortLinkExpander<HttpLinkResolver> {
    /// Expander over HTTP
    pub fn http(timeout: Duration) -> RoutingResult<Self> {
        Ok(Self::new(HttpLinkResolver::new(timeout)?))
    }
}

impl<R: LinkResolver> ShortLinkExpander<R> {
    /// Expander over any resolver
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            cache: MemoCache::new(),
        }
    }

    /// Expand a short link, using the cache when possible.
    ///
    /// Concurrent expansions of the same link may both hit the network; the
    /// later insert simply overwrites an identical value.
    pub async fn expand(&self, url: &str) -> RoutingResult<String> {
        if let Some(hit) = self.cache.get(url) {
            debug!(url = %url, "Short link cache hit");
            return Ok(hit);
        }

        let expanded = self.resolver.resolve(url).await?;
        debug!(url = %url, expanded = %expanded, "Short link expanded");
        self.cache.insert(url.to_string(), expanded.clone());
        Ok(expanded)
    }

    /// Number of cached expansions
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
