//! Prints metadata for the first videos of a tag search
//!
//! Usage: cargo run --example tag_feed -- <tag>...

use nicovideo_core::{ClientConfig, DetailLevel, Nicovideo, TagSearch, TagSort};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let tags: Vec<String> = std::env::args().skip(1).collect();
    let mut search = TagSearch::all(tags);
    search.sort = TagSort::Play;

    let mut nico = Nicovideo::with_config(ClientConfig::from_env(), DetailLevel::Rich)?;
    let ids = nico.tag_search(&search).await?;
    println!("Found {} videos", ids.len());

    nico.extend(ids.into_iter().take(5)).await?;

    for video in nico.iter() {
        let tags: Vec<&str> = video.tags.iter().map(|t| t.name.as_str()).collect();
        println!(
            "{} {:>8} views  {}  [{}]",
            video.video_id,
            video.view_counter,
            video.title,
            tags.join(", ")
        );
    }

    Ok(())
}
