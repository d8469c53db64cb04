//! URL helpers for nicovideo.jp
//!
//! Every remote location the client talks to is derived from an
//! [`Endpoints`] value, so the whole client can be pointed at a mock server.

const LOGIN_BASE: &str = "https://secure.nicovideo.jp/secure/";
const MAIN_URL: &str = "https://www.nicovideo.jp/";
const THUMB_URL: &str = "https://ext.nicovideo.jp/api/getthumbinfo/";
const VIDEO_ARRAY_URL: &str = "https://i.nicovideo.jp/v3/video.array?v=";

/// Base URLs of the remote services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Login form target
    pub login: String,
    /// Logout page
    pub logout: String,
    /// Main site root, with trailing slash
    pub main: String,
    /// Thumbnail info API prefix; the video id is appended
    pub thumb_info: String,
    /// Rich video info API prefix; the video id is appended
    pub video_array: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: format!("{}login?site=niconico", LOGIN_BASE),
            logout: format!("{}logout", LOGIN_BASE),
            main: MAIN_URL.to_string(),
            thumb_info: THUMB_URL.to_string(),
            video_array: VIDEO_ARRAY_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Rewrites every endpoint onto a single origin
    ///
    /// Paths are kept the same as on the real site.
    ///
    /// # Example
    /// ```
    /// use nicovideo_core::Endpoints;
    /// let endpoints = Endpoints::with_base("http://127.0.0.1:8080/");
    /// assert_eq!(endpoints.logout, "http://127.0.0.1:8080/secure/logout");
    /// assert_eq!(endpoints.mylist_page(), "http://127.0.0.1:8080/my/mylist");
    /// ```
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            login: format!("{}/secure/login?site=niconico", base),
            logout: format!("{}/secure/logout", base),
            main: format!("{}/", base),
            thumb_info: format!("{}/api/getthumbinfo/", base),
            video_array: format!("{}/v3/video.array?v=", base),
        }
    }

    /// Mylist overview page, which carries an API token
    pub fn mylist_page(&self) -> String {
        format!("{}my/mylist", self.main)
    }

    /// Per-video "add to mylist" page, carrying the item id and an API token
    ///
    /// # Example
    /// ```
    /// use nicovideo_core::Endpoints;
    /// let url = Endpoints::default().mylist_add_page("sm9");
    /// assert_eq!(url, "https://www.nicovideo.jp/mylist_add/video/sm9");
    /// ```
    pub fn mylist_add_page(&self, video_id: &str) -> String {
        format!("{}mylist_add/video/{}", self.main, video_id)
    }

    pub fn mylist_add_api(&self) -> String {
        format!("{}api/mylist/add", self.main)
    }

    pub fn mylist_delete_api(&self) -> String {
        format!("{}api/mylist/delete", self.main)
    }

    pub fn mylist_list_api(&self) -> String {
        format!("{}api/mylist/list", self.main)
    }

    /// Thumbnail info API URL for a video
    pub fn thumb_info_url(&self, video_id: &str) -> String {
        format!("{}{}", self.thumb_info, video_id)
    }

    /// Rich video info API URL for a video
    pub fn video_array_url(&self, video_id: &str) -> String {
        format!("{}{}", self.video_array, video_id)
    }

    /// Atom feed of newly arrived videos
    ///
    /// # Example
    /// ```
    /// use nicovideo_core::Endpoints;
    /// let url = Endpoints::default().new_arrival_url(2);
    /// assert_eq!(url, "https://www.nicovideo.jp/newarrival?page=2&rss=atom");
    /// ```
    pub fn new_arrival_url(&self, page: u32) -> String {
        format!("{}newarrival?page={}&rss=atom", self.main, page)
    }

    /// Atom feed of a tag search
    ///
    /// Returns `None` when the search has no keywords at all.
    pub fn tag_search_url(&self, search: &TagSearch) -> Option<String> {
        let mut keywords = Vec::new();

        if !search.and_keys.is_empty() {
            keywords.push(encode_keys(&search.and_keys, "%20"));
        }
        if !search.or_keys.is_empty() {
            keywords.push(encode_keys(&search.or_keys, "+or+"));
        }
        if keywords.is_empty() {
            return None;
        }

        Some(format!(
            "{}tag/{}?page={}&sort={}&order={}&rss=atom",
            self.main,
            keywords.join("%20"),
            search.page,
            search.sort.as_param(),
            if search.reverse { "a" } else { "" },
        ))
    }
}

fn encode_keys(keys: &[String], separator: &str) -> String {
    keys.iter()
        .map(|k| urlencoding::encode(k).into_owned())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Sort order of a tag search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagSort {
    /// Posting time
    #[default]
    Post,
    /// Play count
    Play,
    /// Time of the latest comment
    CommentTime,
    /// Comment count
    CommentNum,
    /// Mylist count
    Mylist,
    /// Video length
    Time,
}

impl TagSort {
    /// Query parameter value understood by the site
    pub fn as_param(&self) -> &'static str {
        match self {
            TagSort::Post => "f",
            TagSort::Play => "v",
            TagSort::CommentTime => "",
            TagSort::CommentNum => "r",
            TagSort::Mylist => "m",
            TagSort::Time => "l",
        }
    }
}

/// Parameters of a tag search feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSearch {
    /// Every tag must match
    pub and_keys: Vec<String>,
    /// Any tag may match
    pub or_keys: Vec<String>,
    pub page: u32,
    pub sort: TagSort,
    /// Ascending instead of descending order
    pub reverse: bool,
}

impl Default for TagSearch {
    fn default() -> Self {
        Self {
            and_keys: Vec::new(),
            or_keys: Vec::new(),
            page: 1,
            sort: TagSort::default(),
            reverse: false,
        }
    }
}

impl TagSearch {
    /// Search for videos carrying all of the given tags
    pub fn all<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            and_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Search for videos carrying any of the given tags
    pub fn any<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            or_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Extracts the last path segment of a link, e.g. a video id from a watch URL
///
/// # Example
/// ```
/// use nicovideo_core::url::last_path_segment;
/// let id = last_path_segment("https://www.nicovideo.jp/watch/sm9");
/// assert_eq!(id, Some("sm9".to_string()));
/// ```
pub fn last_path_segment(link: &str) -> Option<String> {
    let (_, segment) = link.rsplit_once('/')?;
    if segment.is_empty() {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.login,
            "https://secure.nicovideo.jp/secure/login?site=niconico"
        );
        assert_eq!(endpoints.logout, "https://secure.nicovideo.jp/secure/logout");
        assert_eq!(
            endpoints.thumb_info_url("sm9"),
            "https://ext.nicovideo.jp/api/getthumbinfo/sm9"
        );
        assert_eq!(
            endpoints.video_array_url("sm9"),
            "https://i.nicovideo.jp/v3/video.array?v=sm9"
        );
    }

    #[test]
    fn test_mylist_api_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.mylist_page(), "https://www.nicovideo.jp/my/mylist");
        assert_eq!(
            endpoints.mylist_add_api(),
            "https://www.nicovideo.jp/api/mylist/add"
        );
        assert_eq!(
            endpoints.mylist_delete_api(),
            "https://www.nicovideo.jp/api/mylist/delete"
        );
        assert_eq!(
            endpoints.mylist_list_api(),
            "https://www.nicovideo.jp/api/mylist/list"
        );
    }

    #[test]
    fn test_with_base_strips_trailing_slash() {
        let endpoints = Endpoints::with_base("http://localhost:1234");
        assert_eq!(endpoints.main, "http://localhost:1234/");
        assert_eq!(
            endpoints.mylist_add_page("sm1"),
            "http://localhost:1234/mylist_add/video/sm1"
        );
    }

    #[test]
    fn test_tag_search_url_and_keys() {
        let search = TagSearch::all(["VOCALOID", "初音ミク"]);
        let url = Endpoints::default().tag_search_url(&search).unwrap();
        assert_eq!(
            url,
            "https://www.nicovideo.jp/tag/VOCALOID%20%E5%88%9D%E9%9F%B3%E3%83%9F%E3%82%AF?page=1&sort=f&order=&rss=atom"
        );
    }

    #[test]
    fn test_tag_search_url_or_keys_reversed() {
        let search = TagSearch {
            or_keys: vec!["a".to_string(), "b".to_string()],
            page: 3,
            sort: TagSort::Mylist,
            reverse: true,
            ..TagSearch::default()
        };
        let url = Endpoints::default().tag_search_url(&search).unwrap();
        assert_eq!(
            url,
            "https://www.nicovideo.jp/tag/a+or+b?page=3&sort=m&order=a&rss=atom"
        );
    }

    #[test]
    fn test_tag_search_url_and_or_combined() {
        let search = TagSearch {
            and_keys: vec!["x".to_string()],
            or_keys: vec!["y".to_string(), "z".to_string()],
            ..TagSearch::default()
        };
        let url = Endpoints::default().tag_search_url(&search).unwrap();
        assert!(url.contains("/tag/x%20y+or+z?"));
    }

    #[test]
    fn test_tag_search_url_empty() {
        assert_eq!(Endpoints::default().tag_search_url(&TagSearch::default()), None);
    }

    #[test]
    fn test_tag_sort_params() {
        assert_eq!(TagSort::Post.as_param(), "f");
        assert_eq!(TagSort::Play.as_param(), "v");
        assert_eq!(TagSort::CommentTime.as_param(), "");
        assert_eq!(TagSort::CommentNum.as_param(), "r");
        assert_eq!(TagSort::Time.as_param(), "l");
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(
            last_path_segment("http://www.nicovideo.jp/watch/so123"),
            Some("so123".to_string())
        );
        assert_eq!(last_path_segment("http://www.nicovideo.jp/watch/"), None);
        assert_eq!(last_path_segment("no-slash"), None);
    }
}
