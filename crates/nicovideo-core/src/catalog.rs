//! Ordered collection of video metadata
//!
//! [`Nicovideo`] is the main entry point: it owns a [`Session`], keeps video
//! records keyed by id in insertion order, hands out [`Mylist`] handles
//! bound to its session, and lists ids from the site's Atom feeds.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::debug;

use crate::client::ClientConfig;
use crate::error::{NicovideoError, Result};
use crate::metadata::{FeedSource, NicoMetadata, VideoFetcher};
use crate::mylist::Mylist;
use crate::session::Session;
use crate::types::{DetailLevel, VideoRecord};
use crate::url::TagSearch;

/// Either a bare video id to resolve or an already resolved record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoRef {
    Id(String),
    Record(VideoRecord),
}

impl From<&str> for VideoRef {
    fn from(id: &str) -> Self {
        VideoRef::Id(id.to_string())
    }
}

impl From<String> for VideoRef {
    fn from(id: String) -> Self {
        VideoRef::Id(id)
    }
}

impl From<VideoRecord> for VideoRef {
    fn from(record: VideoRecord) -> Self {
        VideoRef::Record(record)
    }
}

/// Ordered, keyed collection of video records
///
/// Keys are unique. Appending an id that is already present replaces the
/// record but keeps its position.
///
/// # Example
///
/// ```no_run
/// use nicovideo_core::{DetailLevel, Nicovideo, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let mut nico = Nicovideo::new(DetailLevel::Thumbnail)?;
///     nico.append("sm9").await?;
///
///     for video in nico.iter() {
///         println!("{}: {}", video.video_id, video.title);
///     }
///     Ok(())
/// }
/// ```
pub struct Nicovideo {
    session: Session,
    fetcher: Box<dyn VideoFetcher>,
    feeds: Box<dyn FeedSource>,
    order: VecDeque<String>,
    videos: HashMap<String, VideoRecord>,
    mylists: HashMap<String, Mylist>,
}

impl fmt::Debug for Nicovideo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nicovideo")
            .field("session", &self.session)
            .field("videos", &self.order)
            .field("mylists", &self.mylists.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Nicovideo {
    /// Create a catalog with default configuration
    ///
    /// `detail` picks the metadata API used to resolve bare ids, once.
    pub fn new(detail: DetailLevel) -> Result<Self> {
        Self::with_config(ClientConfig::default(), detail)
    }

    /// Create a catalog with custom configuration
    pub fn with_config(config: ClientConfig, detail: DetailLevel) -> Result<Self> {
        let metadata = NicoMetadata::new(&config)?;
        let fetcher = metadata.fetcher(detail);
        let session = Session::with_config(config)?;
        Ok(Self::from_parts(session, fetcher, Box::new(metadata)))
    }

    /// Create a catalog from an existing session and metadata sources
    pub fn from_parts(
        session: Session,
        fetcher: Box<dyn VideoFetcher>,
        feeds: Box<dyn FeedSource>,
    ) -> Self {
        Self {
            session,
            fetcher,
            feeds,
            order: VecDeque::new(),
            videos: HashMap::new(),
            mylists: HashMap::new(),
        }
    }

    /// Session shared with every mylist handed out by this catalog
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in through the catalog's session
    pub async fn login(&self, mail: &str, password: &str) -> Result<()> {
        self.session.login(mail, password).await
    }

    /// Log out through the catalog's session
    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await
    }

    /// Append a video, resolving a bare id through the metadata fetcher
    ///
    /// A record is stored as is, without any request.
    ///
    /// # Arguments
    /// * `video` - A video id (`"sm9"`) or a resolved [`VideoRecord`]
    ///
    /// # Errors
    /// - `InvalidId` if the id is empty
    /// - `Deleted` if the video is gone or private
    /// - `HttpError` if every attempt failed
    pub async fn append(&mut self, video: impl Into<VideoRef>) -> Result<()> {
        let record = match video.into() {
            VideoRef::Record(record) => record,
            VideoRef::Id(id) => {
                debug!(video_id = %id, "resolving video metadata");
                self.fetcher.fetch_video(&id).await?
            }
        };
        self.insert(record);
        Ok(())
    }

    /// Append several videos in order, one after the other
    ///
    /// Stops at the first failure; videos appended before it stay.
    pub async fn extend<I, V>(&mut self, videos: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<VideoRef>,
    {
        for video in videos {
            self.append(video).await?;
        }
        Ok(())
    }

    /// Store a resolved record
    pub fn insert(&mut self, record: VideoRecord) {
        let id = record.video_id.clone();
        if self.videos.insert(id.clone(), record).is_none() {
            self.order.push_back(id);
        }
    }

    /// Remove and return the most recently appended record
    pub fn pop_last(&mut self) -> Option<VideoRecord> {
        let id = self.order.pop_back()?;
        self.videos.remove(&id)
    }

    /// Remove and return the earliest appended record
    pub fn pop_first(&mut self) -> Option<VideoRecord> {
        let id = self.order.pop_front()?;
        self.videos.remove(&id)
    }

    /// Remove a record by id
    ///
    /// # Errors
    /// Returns `NotFound` if the id is not in the catalog
    pub fn remove(&mut self, video_id: &str) -> Result<VideoRecord> {
        let record = self
            .videos
            .remove(video_id)
            .ok_or_else(|| NicovideoError::NotFound(video_id.to_string()))?;
        self.order.retain(|id| id != video_id);
        Ok(record)
    }

    /// Remove every record
    pub fn clear(&mut self) {
        self.order.clear();
        self.videos.clear();
    }

    /// Whether a record for `video_id` is stored
    pub fn contains(&self, video_id: &str) -> bool {
        self.videos.contains_key(video_id)
    }

    pub fn get(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.get(video_id)
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in insertion order; use `.rev()` for the reverse
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &VideoRecord> + '_ {
        self.order.iter().filter_map(|id| self.videos.get(id))
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Copy every record of `other` into this catalog, in `other`'s order
    ///
    /// Ids present in both take `other`'s record and keep their position
    /// here. No request is made.
    ///
    /// # Arguments
    /// * `other` - Catalog whose records are copied; left unchanged
    pub fn merge(&mut self, other: &Nicovideo) {
        for record in other.iter() {
            self.insert(record.clone());
        }
    }

    /// Mylist handle for `group_id`, sharing this catalog's session
    ///
    /// Handles are kept per group, so repeated calls return the same one.
    ///
    /// # Errors
    /// Returns `NotLoggedIn` if the session is logged out
    pub fn mylist(&mut self, group_id: &str) -> Result<&mut Mylist> {
        self.session.require_login()?;

        match self.mylists.entry(group_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mylist = Mylist::new(group_id, self.session.clone())?;
                Ok(entry.insert(mylist))
            }
        }
    }

    /// Ids from the new arrivals feed
    pub async fn new_arrivals(&self, page: u32) -> Result<Vec<String>> {
        let url = self.session.endpoints().new_arrival_url(page);
        self.feeds.fetch_feed(&url).await
    }

    /// Ids from a tag search feed
    ///
    /// A search without any keyword returns an empty list without a request.
    pub async fn tag_search(&self, search: &TagSearch) -> Result<Vec<String>> {
        match self.session.endpoints().tag_search_url(search) {
            Some(url) => self.feeds.fetch_feed(&url).await,
            None => Ok(Vec::new()),
        }
    }
}

impl<'a> IntoIterator for &'a Nicovideo {
    type Item = &'a VideoRecord;
    type IntoIter = Box<dyn DoubleEndedIterator<Item = &'a VideoRecord> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{logged_in_session, mock_config};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};
    use wiremock::MockServer;

    /// Fetcher that records the ids it was asked for
    #[derive(Default)]
    struct CountingFetcher {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl VideoFetcher for CountingFetcher {
        async fn fetch_video(&self, video_id: &str) -> Result<VideoRecord> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(video_id.to_string());
            }
            if video_id.starts_with("deleted") {
                return Err(NicovideoError::Deleted(video_id.to_string()));
            }
            let mut record = VideoRecord::new(video_id);
            record.title = format!("title of {}", video_id);
            Ok(record)
        }
    }

    #[derive(Default)]
    struct RecordingFeeds {
        urls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl FeedSource for RecordingFeeds {
        async fn fetch_feed(&self, url: &str) -> Result<Vec<String>> {
            if let Ok(mut urls) = self.urls.lock() {
                urls.push(url.to_string());
            }
            Ok(vec!["sm1".to_string(), "sm2".to_string()])
        }
    }

    struct Harness {
        catalog: Nicovideo,
        calls: Arc<Mutex<Vec<String>>>,
        urls: Arc<Mutex<Vec<String>>>,
    }

    fn harness(session: Session) -> Harness {
        let fetcher = CountingFetcher::default();
        let feeds = RecordingFeeds::default();
        let calls = fetcher.calls.clone();
        let urls = feeds.urls.clone();
        Harness {
            catalog: Nicovideo::from_parts(session, Box::new(fetcher), Box::new(feeds)),
            calls,
            urls,
        }
    }

    fn offline_harness() -> Harness {
        harness(Session::new().unwrap())
    }

    fn ids(catalog: &Nicovideo) -> Vec<String> {
        catalog.ids().map(str::to_string).collect()
    }

    #[test]
    fn test_catalog_creation() {
        let catalog = Nicovideo::new(DetailLevel::Rich);
        assert!(catalog.is_ok());
        assert!(catalog.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_id_fetches_once() {
        let mut h = offline_harness();

        h.catalog.append("sm9").await.unwrap();

        assert_eq!(h.calls.lock().unwrap().as_slice(), ["sm9".to_string()]);
        assert!(h.catalog.contains("sm9"));
        assert_eq!(h.catalog.get("sm9").unwrap().title, "title of sm9");
    }

    #[tokio::test]
    async fn test_append_record_does_not_fetch() {
        let mut h = offline_harness();

        h.catalog.append(VideoRecord::new("sm5")).await.unwrap();

        assert!(h.calls.lock().unwrap().is_empty());
        assert_eq!(h.catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_append_existing_keeps_position() {
        let mut h = offline_harness();
        h.catalog.extend(["sm1", "sm2", "sm3"]).await.unwrap();

        let mut replacement = VideoRecord::new("sm1");
        replacement.title = "replaced".to_string();
        h.catalog.append(replacement).await.unwrap();

        assert_eq!(ids(&h.catalog), ["sm1", "sm2", "sm3"]);
        assert_eq!(h.catalog.get("sm1").unwrap().title, "replaced");
    }

    #[tokio::test]
    async fn test_extend_stops_at_failure_keeping_earlier_items() {
        let mut h = offline_harness();

        let result = h.catalog.extend(["sm1", "deleted-2", "sm3"]).await;

        assert!(matches!(result, Err(NicovideoError::Deleted(_))));
        assert_eq!(ids(&h.catalog), ["sm1"]);
        assert_eq!(h.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pop_order() {
        let mut h = offline_harness();
        h.catalog.extend(["sm1", "sm2", "sm3"]).await.unwrap();

        assert_eq!(h.catalog.pop_last().unwrap().video_id, "sm3");
        assert_eq!(h.catalog.pop_first().unwrap().video_id, "sm1");
        assert_eq!(ids(&h.catalog), ["sm2"]);

        h.catalog.clear();
        assert!(h.catalog.pop_last().is_none());
        assert!(h.catalog.pop_first().is_none());
    }

    #[tokio::test]
    async fn test_iteration_both_directions() {
        let mut h = offline_harness();
        h.catalog.extend(["sm1", "sm2", "sm3"]).await.unwrap();

        let forward: Vec<&str> = h.catalog.iter().map(|v| v.video_id.as_str()).collect();
        let backward: Vec<&str> = h.catalog.iter().rev().map(|v| v.video_id.as_str()).collect();
        let via_ref: Vec<&str> = (&h.catalog).into_iter().map(|v| v.video_id.as_str()).collect();

        assert_eq!(forward, ["sm1", "sm2", "sm3"]);
        assert_eq!(backward, ["sm3", "sm2", "sm1"]);
        assert_eq!(via_ref, forward);
    }

    #[tokio::test]
    async fn test_merge_keeps_order_and_overwrites() {
        let mut first = offline_harness();
        let mut second = offline_harness();
        first.catalog.extend(["sm1", "sm2"]).await.unwrap();

        let mut newer = VideoRecord::new("sm2");
        newer.title = "newer".to_string();
        second.catalog.insert(newer);
        second.catalog.insert(VideoRecord::new("sm3"));

        first.catalog.merge(&second.catalog);

        assert_eq!(ids(&first.catalog), ["sm1", "sm2", "sm3"]);
        assert_eq!(first.catalog.get("sm2").unwrap().title, "newer");
        assert_eq!(ids(&second.catalog), ["sm2", "sm3"]);
        assert!(second.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_absent_fails() {
        let mut h = offline_harness();
        assert!(matches!(
            h.catalog.remove("sm404"),
            Err(NicovideoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mylist_requires_login() {
        let server = MockServer::start().await;
        let mut h = harness(Session::with_config(mock_config(&server)).unwrap());

        assert!(matches!(
            h.catalog.mylist("100"),
            Err(NicovideoError::NotLoggedIn)
        ));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_mylist_shares_catalog_session() {
        let server = MockServer::start().await;
        let session = logged_in_session(&server).await;
        let mut h = harness(session.clone());

        let mylist = h.catalog.mylist("100").unwrap();
        assert_eq!(mylist.group_id(), "100");
        assert!(mylist.session().shares_state_with(&session));
    }

    #[tokio::test]
    async fn test_new_arrivals_and_tag_search_urls() {
        let h = offline_harness();

        let arrivals = h.catalog.new_arrivals(2).await.unwrap();
        let tagged = h.catalog.tag_search(&TagSearch::all(["game"])).await.unwrap();
        let empty = h.catalog.tag_search(&TagSearch::default()).await.unwrap();

        assert_eq!(arrivals, ["sm1", "sm2"]);
        assert_eq!(tagged.len(), 2);
        assert!(empty.is_empty());

        let urls = h.urls.lock().unwrap().clone();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with("newarrival?page=2&rss=atom"));
        assert!(urls[1].contains("/tag/game?page=1&sort=f"));
    }

    proptest! {
        #[test]
        fn prop_append_remove_matches_model(ops in proptest::collection::vec((any::<bool>(), 0u8..8), 0..64)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let mut h = offline_harness();
            let mut model: Vec<String> = Vec::new();

            for (is_append, n) in ops {
                let id = format!("sm{}", n);
                if is_append {
                    let appended = runtime.block_on(h.catalog.append(VideoRecord::new(id.clone())));
                    prop_assert!(appended.is_ok());
                    if !model.contains(&id) {
                        model.push(id);
                    }
                } else {
                    let removed = h.catalog.remove(&id);
                    match model.iter().position(|m| m == &id) {
                        Some(pos) => {
                            prop_assert!(removed.is_ok());
                            model.remove(pos);
                        }
                        None => prop_assert!(removed.is_err()),
                    }
                }
            }

            prop_assert_eq!(ids(&h.catalog), model.clone());
            prop_assert_eq!(h.catalog.len(), model.len());
            prop_assert!(h.calls.lock().unwrap().is_empty());
            for id in &model {
                prop_assert!(h.catalog.contains(id));
            }
        }
    }
}
