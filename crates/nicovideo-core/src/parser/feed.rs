//! Atom feed parser for tag search and new arrival feeds

use serde::Deserialize;

use crate::error::{NicovideoError, Result};
use crate::url::last_path_segment;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href", default)]
    href: Option<String>,
}

/// Parses an Atom feed into the video ids of its entries
///
/// Ids are the last path segment of each entry's first link, in document
/// order. Entries without a usable link are skipped.
///
/// # Errors
/// Returns `ParseError` if the document is not a well-formed feed
pub fn parse_feed_ids(xml: &str) -> Result<Vec<String>> {
    let feed: Feed = quick_xml::de::from_str(xml)
        .map_err(|e| NicovideoError::ParseError(format!("feed: {}", e)))?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| entry.links.into_iter().next()?.href)
        .filter_map(|href| last_path_segment(&href))
        .collect())
}
