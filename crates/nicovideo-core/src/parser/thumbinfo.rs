//! Video metadata parsers
//!
//! Maps the XML of the thumbnail info API (`getthumbinfo`) and of the rich
//! i.nicovideo.jp API (`video.array`) onto [`VideoRecord`] field by field.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::error::{NicovideoError, Result};
use crate::parser::decode_html_entities;
use crate::types::{Tag, VideoRecord};

#[derive(Debug, Deserialize)]
struct ThumbResponse {
    #[serde(rename = "@status", default)]
    status: String,
    thumb: Option<Thumb>,
    error: Option<ThumbError>,
}

#[derive(Debug, Deserialize)]
struct ThumbError {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumb {
    video_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    first_retrieve: Option<String>,
    #[serde(default)]
    length: Option<String>,
    #[serde(default)]
    movie_type: Option<String>,
    #[serde(default)]
    size_high: Option<String>,
    #[serde(default)]
    size_low: Option<String>,
    #[serde(default)]
    view_counter: Option<String>,
    #[serde(default)]
    comment_num: Option<String>,
    #[serde(default)]
    mylist_counter: Option<String>,
    #[serde(default)]
    last_res_body: Option<String>,
    #[serde(default)]
    watch_url: Option<String>,
    #[serde(default)]
    thumb_type: Option<String>,
    #[serde(default)]
    embeddable: Option<String>,
    #[serde(default)]
    no_live_play: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(rename = "tags", default)]
    tag_groups: Vec<ThumbTags>,
}

#[derive(Debug, Deserialize)]
struct ThumbTags {
    #[serde(rename = "@domain", default)]
    domain: Option<String>,
    #[serde(rename = "tag", default)]
    tags: Vec<ThumbTag>,
}

#[derive(Debug, Deserialize)]
struct ThumbTag {
    #[serde(rename = "@lock", default)]
    lock: Option<String>,
    #[serde(rename = "$text", default)]
    name: String,
}

/// Parses a thumbnail info API response
///
/// Only tags of the `jp` domain are kept.
///
/// # Errors
/// - `Deleted` if the API reports a failure (deleted or private video)
/// - `ParseError` if the XML or one of its fields is malformed
pub fn parse_thumb_info(xml: &str, video_id: &str) -> Result<VideoRecord> {
    let response: ThumbResponse = quick_xml::de::from_str(xml)
        .map_err(|e| NicovideoError::ParseError(format!("thumbinfo: {}", e)))?;

    if response.status != "ok" {
        let description = response
            .error
            .and_then(|e| e.description)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(NicovideoError::Deleted(format!("{} {}", video_id, description)));
    }

    let thumb = response
        .thumb
        .ok_or_else(|| NicovideoError::ParseError("thumbinfo: missing thumb".to_string()))?;

    let tags = thumb
        .tag_groups
        .into_iter()
        .filter(|group| group.domain.as_deref() == Some("jp"))
        .flat_map(|group| group.tags)
        .filter(|tag| !tag.name.trim().is_empty())
        .map(|tag| Tag {
            name: tag.name,
            locked: tag.lock.is_some_and(|l| !l.is_empty() && l != "0"),
        })
        .collect();

    Ok(VideoRecord {
        video_id: thumb.video_id,
        title: decode_html_entities(&thumb.title),
        description: thumb.description.unwrap_or_default(),
        thumbnail_url: thumb.thumbnail_url.unwrap_or_default(),
        first_retrieve: parse_timestamp(thumb.first_retrieve.as_deref())?,
        length_secs: parse_length(thumb.length.as_deref())?,
        view_counter: parse_count(thumb.view_counter.as_deref(), "view_counter")?,
        comment_num: parse_count(thumb.comment_num.as_deref(), "comment_num")?,
        mylist_counter: parse_count(thumb.mylist_counter.as_deref(), "mylist_counter")?,
        tags,
        movie_type: non_empty(thumb.movie_type),
        size_high: parse_optional_count(thumb.size_high.as_deref(), "size_high")?,
        size_low: parse_optional_count(thumb.size_low.as_deref(), "size_low")?,
        last_res_body: non_empty(thumb.last_res_body),
        watch_url: non_empty(thumb.watch_url),
        thumb_type: non_empty(thumb.thumb_type),
        embeddable: thumb.embeddable.as_deref().map(|v| v.trim() == "1"),
        no_live_play: thumb.no_live_play.as_deref().map(|v| v.trim() == "1"),
        user_id: non_empty(thumb.user_id),
    })
}

#[derive(Debug, Deserialize)]
struct VideoArrayResponse {
    #[serde(default)]
    count: Option<String>,
    video_info: Option<VideoInfo>,
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    video: ArrayVideo,
    #[serde(default)]
    thread: Option<ArrayThread>,
    #[serde(default)]
    tags: Option<ArrayTags>,
}

#[derive(Debug, Deserialize)]
struct ArrayVideo {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    first_retrieve: Option<String>,
    #[serde(default)]
    length_in_seconds: Option<String>,
    #[serde(default)]
    view_counter: Option<String>,
    #[serde(default)]
    mylist_counter: Option<String>,
    #[serde(default)]
    movie_type: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArrayThread {
    #[serde(default)]
    num_res: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArrayTags {
    #[serde(rename = "tag_info", default)]
    entries: Vec<ArrayTagInfo>,
}

#[derive(Debug, Deserialize)]
struct ArrayTagInfo {
    #[serde(default)]
    tag: String,
}

/// Parses a rich video API (`video.array`) response
///
/// # Errors
/// - `Deleted` if the API returns no video
/// - `ParseError` if the XML or one of its fields is malformed
pub fn parse_video_array(xml: &str, video_id: &str) -> Result<VideoRecord> {
    let response: VideoArrayResponse = quick_xml::de::from_str(xml)
        .map_err(|e| NicovideoError::ParseError(format!("video.array: {}", e)))?;

    let count = parse_count(response.count.as_deref(), "count")?;
    let info = match response.video_info {
        Some(info) if count > 0 => info,
        _ => {
            return Err(NicovideoError::Deleted(format!(
                "{} failed to get video info",
                video_id
            )));
        }
    };

    let video = info.video;
    let comment_num = match info.thread.and_then(|t| t.num_res) {
        Some(n) => parse_count(Some(&n), "num_res")?,
        None => 0,
    };
    let tags = info
        .tags
        .map(|t| t.entries)
        .unwrap_or_default()
        .into_iter()
        .filter(|entry| !entry.tag.trim().is_empty())
        .map(|entry| Tag {
            name: entry.tag,
            locked: false,
        })
        .collect();

    let length = parse_count(video.length_in_seconds.as_deref(), "length_in_seconds")?;

    Ok(VideoRecord {
        title: decode_html_entities(&video.title),
        description: video.description.unwrap_or_default(),
        thumbnail_url: video.thumbnail_url.unwrap_or_default(),
        first_retrieve: parse_timestamp(video.first_retrieve.as_deref())?,
        length_secs: u32::try_from(length)
            .map_err(|_| NicovideoError::ParseError(format!("length out of range: {}", length)))?,
        view_counter: parse_count(video.view_counter.as_deref(), "view_counter")?,
        comment_num,
        mylist_counter: parse_count(video.mylist_counter.as_deref(), "mylist_counter")?,
        tags,
        movie_type: non_empty(video.movie_type),
        user_id: non_empty(video.user_id),
        ..VideoRecord::new(video.id)
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(value: Option<&str>) -> Result<Option<DateTime<FixedOffset>>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(Some)
            .map_err(|e| NicovideoError::ParseError(format!("first_retrieve {}: {}", text, e))),
    }
}

fn parse_count(value: Option<&str>, field: &str) -> Result<u64> {
    Ok(parse_optional_count(value, field)?.unwrap_or(0))
}

fn parse_optional_count(value: Option<&str>, field: &str) -> Result<Option<u64>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<u64>()
            .map(Some)
            .map_err(|_| NicovideoError::ParseError(format!("{}: {}", field, text))),
    }
}

/// Converts "M:SS" (or "H:MM:SS") to seconds
fn parse_length(value: Option<&str>) -> Result<u32> {
    let Some(text) = value.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(0);
    };

    text.split(':').try_fold(0u32, |acc, part| {
        part.parse::<u32>()
            .ok()
            .and_then(|n| acc.checked_mul(60)?.checked_add(n))
            .ok_or_else(|| NicovideoError::ParseError(format!("length: {}", text)))
    })
}
