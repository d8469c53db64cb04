//! Public metadata sources: video info APIs and Atom feeds
//!
//! These requests need no login and use the public retry policy.

use async_trait::async_trait;
use tracing::debug;

use crate::client::{ClientConfig, HttpTransport};
use crate::error::{NicovideoError, Result};
use crate::parser::{parse_feed_ids, parse_thumb_info, parse_video_array};
use crate::types::{DetailLevel, VideoRecord};
use crate::url::Endpoints;

/// Resolves a video id into its metadata record
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    async fn fetch_video(&self, video_id: &str) -> Result<VideoRecord>;
}

/// Resolves a feed URL into the video ids it lists
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<String>>;
}

/// Client for the public metadata APIs
#[derive(Debug, Clone)]
pub struct NicoMetadata {
    transport: HttpTransport,
    endpoints: Endpoints,
}

impl NicoMetadata {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config, config.public_retry.clone())?,
            endpoints: config.endpoints.clone(),
        })
    }

    /// Metadata from the thumbnail info API
    ///
    /// # Errors
    /// - `InvalidId` if `video_id` is empty
    /// - `Deleted` if the video is gone or private
    /// - `HttpError` if every attempt failed
    pub async fn thumb_info(&self, video_id: &str) -> Result<VideoRecord> {
        validate_id(video_id)?;
        let xml = self
            .transport
            .get(&self.endpoints.thumb_info_url(video_id))
            .await?;
        parse_thumb_info(&xml, video_id)
    }

    /// Metadata from the rich video API
    pub async fn video_array(&self, video_id: &str) -> Result<VideoRecord> {
        validate_id(video_id)?;
        let xml = self
            .transport
            .get(&self.endpoints.video_array_url(video_id))
            .await?;
        parse_video_array(&xml, video_id)
    }

    /// Fetcher bound to one of the two APIs
    pub fn fetcher(&self, detail: DetailLevel) -> Box<dyn VideoFetcher> {
        match detail {
            DetailLevel::Thumbnail => Box::new(ThumbInfoFetcher(self.clone())),
            DetailLevel::Rich => Box::new(VideoArrayFetcher(self.clone())),
        }
    }
}

fn validate_id(video_id: &str) -> Result<()> {
    if video_id.trim().is_empty() {
        return Err(NicovideoError::InvalidId(
            "Video ID cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl FeedSource for NicoMetadata {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<String>> {
        let xml = self.transport.get(url).await?;
        let ids = parse_feed_ids(&xml)?;
        debug!(url, count = ids.len(), "parsed feed");
        Ok(ids)
    }
}

/// [`VideoFetcher`] using the thumbnail info API
#[derive(Debug, Clone)]
pub struct ThumbInfoFetcher(pub NicoMetadata);

#[async_trait]
impl VideoFetcher for ThumbInfoFetcher {
    async fn fetch_video(&self, video_id: &str) -> Result<VideoRecord> {
        self.0.thumb_info(video_id).await
    }
}

/// [`VideoFetcher`] using the rich video API
#[derive(Debug, Clone)]
pub struct VideoArrayFetcher(pub NicoMetadata);

#[async_trait]
impl VideoFetcher for VideoArrayFetcher {
    async fn fetch_video(&self, video_id: &str) -> Result<VideoRecord> {
        self.0.video_array(video_id).await
    }
}
