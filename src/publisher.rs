use crate::logok;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Metadata sent along with the finished video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub video_id: String,
    pub url: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, video: &Path, metadata: &VideoMetadata) -> Result<Published>;
}

/// Copies the video into an output folder instead of uploading it.
pub struct LocalPublisher {
    pub output_dir: PathBuf,
}

impl LocalPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl Publisher for LocalPublisher {
    async fn publish(&self, video: &Path, metadata: &VideoMetadata) -> Result<Published> {
        fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", self.output_dir.display()))?;

        let stem = slugify(&metadata.title);
        let mut dest = self.output_dir.join(format!("{stem}.mp4"));
        let mut n = 1;
        while fs::metadata(&dest).await.is_ok() {
            n += 1;
            dest = self.output_dir.join(format!("{stem}-{n}.mp4"));
        }

        fs::copy(video, &dest)
            .await
            .with_context(|| format!("Failed to copy {} -> {}", video.display(), dest.display()))?;
        let absolute = std::path::absolute(&dest).unwrap_or_else(|_| dest.clone());
        logok(format!("Wrote output: {}", dest.display()));

        Ok(Published {
            video_id: dest
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(stem),
            url: format!("file://{}", absolute.display()),
        })
    }
}

/// Lowercase ASCII slug for file names; falls back to `video`.
pub fn slugify(title: &str) -> String {
    let mut out = String::new();
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed.to_string()
    }
}
