use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use crate::models::SocialPost;

/// Load-once snapshot of the social-media CSV export. Populated lazily on
/// first access and never invalidated; a restart picks up a fresh file. A
/// missing or unreadable file degrades to an empty snapshot so the social
/// correlation simply produces no signals.
pub struct SocialCache {
    path: PathBuf,
    posts: OnceLock<Vec<SocialPost>>,
}

impl SocialCache {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            posts: OnceLock::new(),
        }
    }

    pub fn posts(&self) -> &[SocialPost] {
        self.posts.get_or_init(|| match load_posts(&self.path) {
            Ok(posts) => {
                info!(count = posts.len(), "loaded social media snapshot");
                posts
            }
            Err(err) => {
                warn!(
                    error = %err,
                    path = %self.path.display(),
                    "social media snapshot unavailable, correlation disabled"
                );
                Vec::new()
            }
        })
    }
}

#[derive(serde::Deserialize)]
struct CsvRow {
    id: i64,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Social_Media")]
    social_media: String,
    #[serde(rename = "Comment")]
    comment: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Category")]
    category: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("unrecognized timestamp {raw:?}"))?;
    Ok(naive.and_utc())
}

fn load_posts(path: &Path) -> Result<Vec<SocialPost>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut posts = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        posts.push(SocialPost {
            id: row.id,
            username: row.username,
            platform: row.social_media,
            comment: row.comment,
            location: row.location,
            timestamp: parse_timestamp(&row.timestamp)?,
            category: row.category,
        });
    }

    Ok(posts)
}
