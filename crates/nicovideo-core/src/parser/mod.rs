//! Response parsers for nicovideo.jp
//!
//! Contains modules for each kind of page or API response.

pub mod feed;
pub mod mylist;
pub mod thumbinfo;
pub mod tokens;

pub use feed::parse_feed_ids;
pub use mylist::{ItemType, MylistItem, check_response, parse_item_list};
pub use thumbinfo::{parse_thumb_info, parse_video_array};
pub use tokens::{HtmlTokenExtractor, TokenExtractor, TokenKind, first_capture};

/// Decodes the HTML entities the site double-escapes in titles
pub(crate) fn decode_html_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
