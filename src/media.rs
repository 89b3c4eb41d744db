use crate::error::{PipelineError, Result};
use crate::script::Script;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One downloaded asset for a scene. Field names on the wire match the
/// collector output (`type`, `path`, `scene`, `duration`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(rename = "path")]
    pub source_path: PathBuf,
    #[serde(rename = "scene")]
    pub scene_index: usize,
    pub duration: f64,
}

impl MediaItem {
    pub fn image(path: impl Into<PathBuf>, scene_index: usize, duration: f64) -> Self {
        Self {
            kind: MediaKind::Image,
            source_path: path.into(),
            scene_index,
            duration,
        }
    }

    pub fn video(path: impl Into<PathBuf>, scene_index: usize, duration: f64) -> Self {
        Self {
            kind: MediaKind::Video,
            source_path: path.into(),
            scene_index,
            duration,
        }
    }
}

/// Collects at most one asset per scene into `media_dir`. Scenes whose lookup
/// fails are simply missing from the result.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn collect(
        &self,
        script: &Script,
        niche: &str,
        media_dir: &Path,
    ) -> anyhow::Result<Vec<MediaItem>>;
}

/// Checks the collected list against the scene count before assembly.
pub fn validate_media(media: &[MediaItem], scene_count: usize) -> Result<()> {
    if media.is_empty() {
        return Err(PipelineError::NoMediaCollected);
    }
    for item in media {
        if item.scene_index >= scene_count {
            return Err(PipelineError::InvalidMedia {
                scene: item.scene_index,
                reason: format!("scene index out of range (have {scene_count} scenes)"),
            });
        }
        if item.kind == MediaKind::Image && (!item.duration.is_finite() || item.duration <= 0.0) {
            return Err(PipelineError::InvalidMedia {
                scene: item.scene_index,
                reason: format!("image duration {} is not positive", item.duration),
            });
        }
    }
    Ok(())
}

pub async fn load_media_list(path: &Path) -> anyhow::Result<Vec<MediaItem>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read media list: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse media list: {}", path.display()))
}
