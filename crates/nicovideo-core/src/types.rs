//! Core data types for video metadata
//!
//! Contains the record produced by the metadata fetchers and stored in the
//! [`crate::Nicovideo`] catalog.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Which metadata API the catalog uses to resolve a bare video id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailLevel {
    /// Public thumbnail info API
    #[default]
    Thumbnail,
    /// Richer i.nicovideo.jp video API
    Rich,
}

/// A tag attached to a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Locked tags cannot be edited by viewers
    pub locked: bool,
}

/// Metadata of one video
///
/// Built through a fixed field mapping from either metadata API. Fields the
/// rich API does not provide are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Public video identifier (e.g., "sm9")
    pub video_id: String,

    pub title: String,

    pub description: String,

    pub thumbnail_url: String,

    /// First publication time, in the site's local offset
    pub first_retrieve: Option<DateTime<FixedOffset>>,

    /// Duration in seconds
    pub length_secs: u32,

    pub view_counter: u64,

    pub comment_num: u64,

    pub mylist_counter: u64,

    pub tags: Vec<Tag>,

    /// Container format (e.g., "flv", "mp4")
    pub movie_type: Option<String>,

    /// File size of the high-quality encode in bytes
    pub size_high: Option<u64>,

    /// File size of the economy encode in bytes
    pub size_low: Option<u64>,

    /// Most recent comments, concatenated
    pub last_res_body: Option<String>,

    pub watch_url: Option<String>,

    pub thumb_type: Option<String>,

    pub embeddable: Option<bool>,

    pub no_live_play: Option<bool>,

    pub user_id: Option<String>,
}

impl VideoRecord {
    /// Empty record for `video_id`, every counter zero
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: String::new(),
            description: String::new(),
            thumbnail_url: String::new(),
            first_retrieve: None,
            length_secs: 0,
            view_counter: 0,
            comment_num: 0,
            mylist_counter: 0,
            tags: Vec::new(),
            movie_type: None,
            size_high: None,
            size_low: None,
            last_res_body: None,
            watch_url: None,
            thumb_type: None,
            embeddable: None,
            no_live_play: None,
            user_id: None,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}
