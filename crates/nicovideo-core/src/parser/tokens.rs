//! Hidden value extraction from mylist pages
//!
//! The site exposes no API for the values a mylist mutation needs, so they
//! are scraped from HTML. Extraction sits behind [`TokenExtractor`] so the
//! patterns can change without touching the callers.

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{NicovideoError, Result};

/// Kind of hidden value embedded in a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Hidden `item_id` form field of the per-video add page
    ItemId,
    /// Inline `NicoAPI.token = "..."` script assignment
    ApiToken,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::ItemId => "item_id",
            TokenKind::ApiToken => "api token",
        }
    }
}

/// Strategy extracting hidden values from a page body
pub trait TokenExtractor: Send + Sync {
    /// Returns the value, or `None` if the page does not carry it
    fn extract(&self, kind: TokenKind, html: &str) -> Option<String>;
}

/// Default extractor: form field by CSS selector, script token by regex
#[derive(Debug)]
pub struct HtmlTokenExtractor {
    item_id: Selector,
    api_token: Regex,
}

impl HtmlTokenExtractor {
    pub fn new() -> Result<Self> {
        let item_id = Selector::parse(r#"input[type="hidden"][name="item_id"]"#)
            .map_err(|e| NicovideoError::ParseError(format!("Invalid selector: {:?}", e)))?;
        let api_token = Regex::new(r#"NicoAPI\.token\s*=\s*"([^"]+)""#)
            .map_err(|e| NicovideoError::ParseError(format!("Invalid pattern: {}", e)))?;

        Ok(Self { item_id, api_token })
    }

    fn extract_item_id(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.item_id)
            .filter_map(|input| input.value().attr("value"))
            .map(str::trim)
            .find(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    }
}

impl TokenExtractor for HtmlTokenExtractor {
    fn extract(&self, kind: TokenKind, html: &str) -> Option<String> {
        match kind {
            TokenKind::ItemId => self.extract_item_id(html),
            TokenKind::ApiToken => first_capture(&self.api_token, html),
        }
    }
}

/// First capture group of the first match of `pattern`
pub fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
