//! Nicovideo Client Core Library
//!
//! Provides an async API for managing mylists and collecting video metadata
//! from nicovideo.jp.
//!
//! # Overview
//!
//! This crate provides:
//! - A cookie-holding [`Session`] with login, logout and fixed-interval retries
//! - [`Mylist`] handles to add, remove and list the videos of a mylist
//! - Metadata fetchers for the thumbnail info and rich video APIs
//! - The [`Nicovideo`] catalog: an ordered, keyed collection of video records
//! - Atom feed listings for new arrivals and tag searches
//!
//! # Example
//!
//! ```no_run
//! use nicovideo_core::{DetailLevel, Nicovideo, Result, TagSearch};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut nico = Nicovideo::new(DetailLevel::Thumbnail)?;
//!     nico.login("user@example.com", "password").await?;
//!
//!     // Collect metadata for the first videos tagged "VOCALOID"
//!     let ids = nico.tag_search(&TagSearch::all(["VOCALOID"])).await?;
//!     nico.extend(ids.into_iter().take(5)).await?;
//!
//!     // Put them in a mylist
//!     let mylist = nico.mylist("12345678")?;
//!     for id in ["sm9", "sm1097445"] {
//!         if !mylist.contains(id).await? {
//!             mylist.add(id).await?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Retries
//!
//! Every request is retried at a fixed interval: five seconds between
//! attempts for session requests, three for the public metadata APIs.
//! See [`RetryPolicy`] and [`ClientConfig::from_env`].

mod catalog;
mod client;
mod error;
mod metadata;
mod mylist;
pub mod parser;
mod scraper;
mod session;
#[cfg(test)]
mod test_support;
mod types;
pub mod url;

// Re-export catalog types
pub use catalog::{Nicovideo, VideoRef};

// Re-export client types
pub use client::{
    ClientConfig, HttpTransport, PUBLIC_RETRY_WAIT, RETRY_COUNT, RetryPolicy, SESSION_RETRY_WAIT,
    Sleeper, TokioSleeper,
};

// Re-export error types
pub use error::{NicovideoError, Result};

// Re-export metadata sources
pub use metadata::{FeedSource, NicoMetadata, ThumbInfoFetcher, VideoArrayFetcher, VideoFetcher};

// Re-export mylist API
pub use mylist::Mylist;
pub use parser::{HtmlTokenExtractor, ItemType, MylistItem, TokenExtractor, TokenKind};

// Re-export scraping helpers
pub use scraper::{PageCache, TokenScraper};

pub use session::Session;

// Re-export data types
pub use types::{DetailLevel, Tag, VideoRecord};

// Re-export URL types for convenience
pub use url::{Endpoints, TagSearch, TagSort};
