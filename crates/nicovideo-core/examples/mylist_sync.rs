//! Adds the given videos to a mylist and prints its contents
//!
//! Usage: NICO_MAIL=... NICO_PASSWORD=... cargo run --example mylist_sync -- <group_id> <video_id>...

use nicovideo_core::{ClientConfig, DetailLevel, Nicovideo};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let group_id = args.next().ok_or("missing mylist group id")?;
    let video_ids: Vec<String> = args.collect();

    let mail = std::env::var("NICO_MAIL")?;
    let password = std::env::var("NICO_PASSWORD")?;

    let mut nico = Nicovideo::with_config(ClientConfig::from_env(), DetailLevel::Thumbnail)?;
    nico.login(&mail, &password).await?;

    let mylist = nico.mylist(&group_id)?;
    for id in &video_ids {
        if mylist.contains(id).await? {
            println!("{} already in mylist {}", id, group_id);
            continue;
        }
        mylist.add(id).await?;
        println!("added {}", id);
    }

    println!("\n=== mylist {} ===", group_id);
    for item in mylist.items().await? {
        println!("{} {}", item.video_id, item.title.as_deref().unwrap_or(""));
    }

    nico.logout().await?;
    Ok(())
}
