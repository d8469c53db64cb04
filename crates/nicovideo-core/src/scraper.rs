//! Token scraping over the authenticated session
//!
//! Fetches pages through the session's transport and pulls hidden values
//! out of them. The last fetched page is kept so that reading several
//! values from one page costs a single request.

use std::fmt;

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::parser::{HtmlTokenExtractor, TokenExtractor, TokenKind, first_capture};
use crate::session::Session;

/// Page cache holding at most one `(url, body)` entry
///
/// Storing a page for a different URL evicts the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCache {
    entry: Option<(String, String)>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached body for `url`, if it is the last page stored
    ///
    /// An empty body never counts as a hit.
    pub fn get(&self, url: &str) -> Option<&str> {
        match &self.entry {
            Some((cached_url, body)) if cached_url == url && !body.is_empty() => Some(body),
            _ => None,
        }
    }

    /// Store `body` as the page for `url`, evicting any other page
    pub fn put(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.entry = Some((url.into(), body.into()));
    }

    /// Forget the cached page
    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// URL of the cached page
    pub fn url(&self) -> Option<&str> {
        self.entry.as_ref().map(|(url, _)| url.as_str())
    }
}

/// Scrapes hidden values from pages fetched with the session's cookies
pub struct TokenScraper {
    session: Session,
    extractor: Box<dyn TokenExtractor>,
    cache: PageCache,
}

impl fmt::Debug for TokenScraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenScraper")
            .field("session", &self.session)
            .field("cache", &self.cache.url())
            .finish_non_exhaustive()
    }
}

impl TokenScraper {
    /// Create a scraper using the default extraction patterns
    pub fn new(session: Session) -> Result<Self> {
        Ok(Self::with_extractor(
            session,
            Box::new(HtmlTokenExtractor::new()?),
        ))
    }

    /// Create a scraper with a custom extraction strategy
    pub fn with_extractor(session: Session, extractor: Box<dyn TokenExtractor>) -> Self {
        Self {
            session,
            extractor,
            cache: PageCache::new(),
        }
    }

    /// Fetch a page, reusing the body if it was the last page fetched
    ///
    /// Invalid UTF-8 in the body is dropped rather than treated as an error.
    pub async fn fetch_html(&mut self, url: &str) -> Result<&str> {
        self.load(url).await?;
        Ok(self.cache.get(url).unwrap_or_default())
    }

    async fn load(&mut self, url: &str) -> Result<()> {
        if self.cache.get(url).is_some() {
            debug!(url, "page cache hit");
            return Ok(());
        }

        debug!(url, "page cache miss");
        let body = self.session.transport().get(url).await?;
        self.cache.put(url, body);
        Ok(())
    }

    /// First capture group of `pattern` in the page at `url`
    ///
    /// `Ok(None)` means the page did not match; callers decide how to report
    /// that.
    pub async fn scrape(&mut self, url: &str, pattern: &Regex) -> Result<Option<String>> {
        let html = self.fetch_html(url).await?;
        Ok(first_capture(pattern, html))
    }

    /// Hidden value of `kind` in the page at `url`
    ///
    /// # Arguments
    /// * `url` - Page to read, fetched only if it is not the cached one
    /// * `kind` - Which hidden value to look for
    ///
    /// # Returns
    /// The value, or `None` if the page does not carry it
    ///
    /// # Errors
    /// - `HttpError` if the page could not be fetched
    pub async fn extract(&mut self, url: &str, kind: TokenKind) -> Result<Option<String>> {
        self.load(url).await?;
        let html = self.cache.get(url).unwrap_or_default();
        let value = self.extractor.extract(kind, html);
        if value.is_none() {
            debug!(url, kind = kind.name(), "value not found in page");
        }
        Ok(value)
    }

    /// Item id from a video's add-to-mylist page
    pub async fn item_id(&mut self, video_id: &str) -> Result<Option<String>> {
        let url = self.session.endpoints().mylist_add_page(video_id);
        self.extract(&url, TokenKind::ItemId).await
    }

    /// Mylist API token from the page at `url`
    pub async fn token(&mut self, url: &str) -> Result<Option<String>> {
        self.extract(url, TokenKind::ApiToken).await
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
