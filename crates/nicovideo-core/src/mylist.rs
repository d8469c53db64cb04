//! Mylist CRUD over the site's undocumented mylist API
//!
//! Mutations need hidden tokens scraped from HTML pages; reads go through a
//! snapshot of the whole list that is dropped after every successful
//! mutation and fetched again on the next read.

use tracing::{debug, info, instrument};

use crate::error::{NicovideoError, Result};
use crate::parser::{ItemType, MylistItem, check_response, parse_item_list};
use crate::scraper::TokenScraper;
use crate::session::Session;

/// One mylist group of the logged-in user
///
/// `group_id` is the last path segment of `https://www.nicovideo.jp/mylist/<group_id>`.
#[derive(Debug)]
pub struct Mylist {
    group_id: String,
    session: Session,
    scraper: TokenScraper,
    cached: Option<Vec<MylistItem>>,
}

impl Mylist {
    /// Create a handle on a mylist group, sharing `session`
    ///
    /// # Errors
    /// Returns error if the token extraction patterns fail to compile
    pub fn new(group_id: impl Into<String>, session: Session) -> Result<Self> {
        let scraper = TokenScraper::new(session)?;
        Ok(Self::with_scraper(group_id, scraper))
    }

    /// Create a handle using a preconfigured scraper and its session
    pub fn with_scraper(group_id: impl Into<String>, scraper: TokenScraper) -> Self {
        Self {
            group_id: group_id.into(),
            session: scraper.session().clone(),
            scraper,
            cached: None,
        }
    }

    /// Group id this handle targets
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Session shared with the scraper
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Add a video to the mylist
    ///
    /// # Arguments
    /// * `video_id` - Public video identifier, e.g. `sm9`
    ///
    /// # Errors
    /// - `NotLoggedIn` - no request is made
    /// - `TokenNotFound` - the add page lacks the item id or API token
    /// - `AlreadyExists` - the video is already in the list
    /// - `MylistFull` - the list reached its capacity
    /// - `UnexpectedResponse` - any other API answer
    #[instrument(skip(self), fields(group_id = %self.group_id))]
    pub async fn add(&mut self, video_id: &str) -> Result<()> {
        self.session.require_login()?;

        let item_id = self
            .scraper
            .item_id(video_id)
            .await?
            .ok_or_else(|| NicovideoError::TokenNotFound(format!("item_id for {}", video_id)))?;
        let add_page = self.session.endpoints().mylist_add_page(video_id);
        let token = self
            .scraper
            .token(&add_page)
            .await?
            .ok_or_else(|| NicovideoError::TokenNotFound(format!("api token for {}", video_id)))?;

        let form = [
            ("group_id", self.group_id.clone()),
            ("item_type", ItemType::Video.code().to_string()),
            ("item_id", item_id),
            ("description", String::new()),
            ("token", token),
        ];
        let api = self.session.endpoints().mylist_add_api();
        let body = self.session.transport().post_form(&api, &form).await?;
        check_response(&body, video_id)?;

        self.invalidate();
        info!(video_id, "added to mylist");
        Ok(())
    }

    /// Remove a video from the mylist
    ///
    /// # Errors
    /// - `NotLoggedIn` - no request is made
    /// - `NotFound` - the video is not in the list
    #[instrument(skip(self), fields(group_id = %self.group_id))]
    pub async fn remove(&mut self, video_id: &str) -> Result<()> {
        self.session.require_login()?;

        let target = self
            .get(video_id)
            .await?
            .ok_or_else(|| NicovideoError::NotFound(video_id.to_string()))?;

        self.remove_items(&[target], video_id).await?;
        info!(video_id, "removed from mylist");
        Ok(())
    }

    /// Remove a video if present; absent videos are not an error
    pub async fn discard(&mut self, video_id: &str) -> Result<()> {
        match self.remove(video_id).await {
            Err(NicovideoError::NotFound(_)) => {
                debug!(video_id, "discard: not in mylist");
                Ok(())
            }
            other => other,
        }
    }

    /// Remove every entry with one batched request
    #[instrument(skip(self), fields(group_id = %self.group_id))]
    pub async fn clear(&mut self) -> Result<()> {
        self.session.require_login()?;

        let targets = self.items().await?.to_vec();
        let group_id = self.group_id.clone();
        self.remove_items(&targets, &group_id).await?;
        info!(count = targets.len(), "cleared mylist");
        Ok(())
    }

    async fn remove_items(&mut self, targets: &[MylistItem], subject: &str) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }

        let overview = self.session.endpoints().mylist_page();
        let token = self
            .scraper
            .token(&overview)
            .await?
            .ok_or_else(|| NicovideoError::TokenNotFound("api token on mylist page".to_string()))?;

        let body = delete_body(&self.group_id, &token, targets);
        let api = self.session.endpoints().mylist_delete_api();
        let response = self.session.transport().post_encoded(&api, &body).await?;
        check_response(&response, subject)?;

        self.invalidate();
        Ok(())
    }

    /// Current entries, fetching the list if no snapshot is held
    pub async fn items(&mut self) -> Result<&[MylistItem]> {
        if self.cached.is_none() {
            let items = self.fetch_items().await?;
            self.cached = Some(items);
        }

        Ok(self.cached.as_deref().unwrap_or_default())
    }

    async fn fetch_items(&self) -> Result<Vec<MylistItem>> {
        debug!(group_id = %self.group_id, "fetching mylist");
        let api = self.session.endpoints().mylist_list_api();
        let form = [("group_id", self.group_id.clone())];
        let body = self.session.transport().post_form(&api, &form).await?;
        parse_item_list(&body, &self.group_id)
    }

    /// Video ids in list order
    pub async fn video_ids(&mut self) -> Result<Vec<String>> {
        Ok(self
            .items()
            .await?
            .iter()
            .map(|item| item.video_id.clone())
            .collect())
    }

    /// Video ids in reverse list order
    pub async fn reversed(&mut self) -> Result<Vec<String>> {
        let mut ids = self.video_ids().await?;
        ids.reverse();
        Ok(ids)
    }

    /// Number of entries in the list
    ///
    /// # Errors
    /// - `UnexpectedResponse` if the list API answer is not a list
    /// - `HttpError` if every attempt failed
    pub async fn len(&mut self) -> Result<usize> {
        Ok(self.items().await?.len())
    }

    /// Whether the list has no entries
    pub async fn is_empty(&mut self) -> Result<bool> {
        Ok(self.items().await?.is_empty())
    }

    /// Whether `video_id` is in the list
    ///
    /// Reads the snapshot. Right after a successful `add`, `remove` or
    /// `clear` there is no snapshot, so the first read costs one list fetch;
    /// the add page is not scraped again.
    ///
    /// # Arguments
    /// * `video_id` - Public video identifier, e.g. `sm9`
    pub async fn contains(&mut self, video_id: &str) -> Result<bool> {
        Ok(self.get(video_id).await?.is_some())
    }

    /// Entry for `video_id`, scanning the snapshot
    pub async fn get(&mut self, video_id: &str) -> Result<Option<MylistItem>> {
        Ok(self
            .items()
            .await?
            .iter()
            .find(|item| item.video_id == video_id)
            .cloned())
    }

    /// Drop the list snapshot so the next read fetches it again
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Whether a list snapshot is currently held
    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }
}

/// Body of a delete call: one `id_list[<type>][]` parameter per target
///
/// Built by hand so the brackets stay literal; a form serializer would
/// percent-encode them.
fn delete_body(group_id: &str, token: &str, targets: &[MylistItem]) -> String {
    let mut params = vec![
        format!("group_id={}", urlencoding::encode(group_id)),
        format!("token={}", urlencoding::encode(token)),
    ];
    params.extend(targets.iter().map(|target| {
        format!(
            "id_list[{}][]={}",
            target.item_type.code(),
            urlencoding::encode(&target.item_id)
        )
    }));
    params.join("&")
}
