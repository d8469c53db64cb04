//! Mylist API response parsing
//!
//! All mylist endpoints answer JSON with a top-level `status`. Every call
//! site goes through [`check_response`], which is the only place where
//! remote error codes are mapped to [`NicovideoError`] variants.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{NicovideoError, Result};

/// Type of a mylist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemType {
    Video,
    /// Any other entry kind, kept by its numeric code
    Other(u32),
}

impl ItemType {
    /// Numeric code used by the API
    pub fn code(&self) -> u32 {
        match self {
            ItemType::Video => 0,
            ItemType::Other(code) => *code,
        }
    }
}

impl From<u32> for ItemType {
    fn from(code: u32) -> Self {
        match code {
            0 => ItemType::Video,
            other => ItemType::Other(other),
        }
    }
}

impl<'de> Deserialize<'de> for ItemType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = string_or_number(deserializer)?;
        raw.parse::<u32>()
            .map(ItemType::from)
            .map_err(|_| serde::de::Error::custom(format!("invalid item_type: {}", raw)))
    }
}

/// One entry of a mylist
///
/// Only ever built from a list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MylistItem {
    pub item_type: ItemType,
    /// Identifier the remote system assigned to this entry
    pub item_id: String,
    /// Public video identifier, e.g. `sm9`
    pub video_id: String,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    item_type: ItemType,
    #[serde(deserialize_with = "string_or_number")]
    item_id: String,
    item_data: RawItemData,
}

#[derive(Debug, Deserialize)]
struct RawItemData {
    video_id: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    mylistitem: Vec<RawItem>,
}

impl From<RawItem> for MylistItem {
    fn from(raw: RawItem) -> Self {
        Self {
            item_type: raw.item_type,
            item_id: raw.item_id,
            video_id: raw.item_data.video_id,
            title: raw.item_data.title,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

/// Classifies a mylist API response
///
/// `subject` names the video the call was about and ends up in the
/// `AlreadyExists` / `MylistFull` errors.
///
/// # Errors
/// - `AlreadyExists` - `status` is `fail` with code `EXIST`
/// - `MylistFull` - `status` is `fail` with code `MAXERROR`
/// - `UnexpectedResponse` - anything else that is not `status: ok`,
///   carrying the raw body
pub fn check_response(body: &str, subject: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| NicovideoError::UnexpectedResponse(body.to_string()))?;

    match value.get("status").and_then(Value::as_str) {
        Some("ok") => Ok(value),
        Some("fail") => match value.pointer("/error/code").and_then(Value::as_str) {
            Some("EXIST") => Err(NicovideoError::AlreadyExists(subject.to_string())),
            Some("MAXERROR") => Err(NicovideoError::MylistFull(subject.to_string())),
            _ => Err(NicovideoError::UnexpectedResponse(body.to_string())),
        },
        _ => Err(NicovideoError::UnexpectedResponse(body.to_string())),
    }
}

/// Parses the entries of a list response, in remote order
///
/// The list endpoint answers `{"mylistitem": [...]}`, usually without a
/// `status` field. A `status` other than `ok` is classified like any other
/// mylist call.
///
/// # Errors
/// - `UnexpectedResponse` - the body is not JSON or has no `mylistitem`
/// - `ParseError` - an entry is malformed
pub fn parse_item_list(body: &str, group_id: &str) -> Result<Vec<MylistItem>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| NicovideoError::UnexpectedResponse(body.to_string()))?;

    if value.get("status").is_some_and(|status| status != "ok") {
        check_response(body, group_id)?;
    }
    if value.get("mylistitem").is_none() {
        return Err(NicovideoError::UnexpectedResponse(body.to_string()));
    }

    let response: ListResponse = serde_json::from_value(value)
        .map_err(|e| NicovideoError::ParseError(format!("mylist items: {}", e)))?;

    Ok(response.mylistitem.into_iter().map(MylistItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_response_ok() {
        assert!(check_response(r#"{"status":"ok"}"#, "sm9").is_ok());
    }

    #[test]
    fn test_check_response_exist() {
        let body = r#"{"status":"fail","error":{"code":"EXIST","description":"already"}}"#;
        match check_response(body, "sm9") {
            Err(NicovideoError::AlreadyExists(id)) => assert_eq!(id, "sm9"),
            other => panic!("Expected AlreadyExists, got {:?}", other),
        }
    }

    #[test]
    fn test_check_response_maxerror() {
        let body = r#"{"status":"fail","error":{"code":"MAXERROR"}}"#;
        assert!(matches!(
            check_response(body, "sm9"),
            Err(NicovideoError::MylistFull(_))
        ));
    }

    #[test]
    fn test_check_response_unknown_code_keeps_raw_body() {
        let body = r#"{"status":"fail","error":{"code":"INVALIDTOKEN"}}"#;
        match check_response(body, "sm9") {
            Err(NicovideoError::UnexpectedResponse(raw)) => assert_eq!(raw, body),
            other => panic!("Expected UnexpectedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_check_response_unknown_status() {
        let body = r#"{"status":"maintenance"}"#;
        assert!(matches!(
            check_response(body, "sm9"),
            Err(NicovideoError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_check_response_not_json() {
        assert!(matches!(
            check_response("<html>login</html>", "sm9"),
            Err(NicovideoError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_parse_item_list_string_ids() {
        let body = r#"{"status":"ok","mylistitem":[
            {"item_type":"0","item_id":"1173108780","item_data":{"video_id":"sm9","title":"Video 9"}},
            {"item_type":0,"item_id":1234,"item_data":{"video_id":"so5"}}
        ]}"#;

        let items = parse_item_list(body, "100").unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_type, ItemType::Video);
        assert_eq!(items[0].item_id, "1173108780");
        assert_eq!(items[0].video_id, "sm9");
        assert_eq!(items[0].title.as_deref(), Some("Video 9"));
        assert_eq!(items[1].item_id, "1234");
        assert_eq!(items[1].title, None);
    }

    #[test]
    fn test_parse_item_list_other_item_type() {
        let body = r#"{"status":"ok","mylistitem":[
            {"item_type":"5","item_id":"77","item_data":{"video_id":"mg1"}}
        ]}"#;
        let items = parse_item_list(body, "100").unwrap();
        assert_eq!(items[0].item_type, ItemType::Other(5));
        assert_eq!(items[0].item_type.code(), 5);
    }

    #[test]
    fn test_parse_item_list_without_status() {
        let body = r#"{"mylistitem":[{"item_type":"0","item_id":"1","item_data":{"video_id":"sm1"}}]}"#;

        let items = parse_item_list(body, "100").unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, "1");
        assert_eq!(items[0].video_id, "sm1");
    }

    #[test]
    fn test_parse_item_list_fail_status_is_classified() {
        let body = r#"{"status":"fail","error":{"code":"NOAUTH"}}"#;
        match parse_item_list(body, "100") {
            Err(NicovideoError::UnexpectedResponse(raw)) => assert_eq!(raw, body),
            other => panic!("Expected UnexpectedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_item_list_missing_entries() {
        assert!(matches!(
            parse_item_list(r#"{"status":"ok"}"#, "100"),
            Err(NicovideoError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            parse_item_list("<html>login</html>", "100"),
            Err(NicovideoError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_parse_item_list_empty() {
        let items = parse_item_list(r#"{"status":"ok","mylistitem":[]}"#, "100").unwrap();
        assert!(items.is_empty());
    }
}
