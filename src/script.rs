use crate::error::{PipelineError, Result};
use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One narrated segment. `duration` is author-assigned and drives all timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub narration: String,
    #[serde(default)]
    pub visual_description: String,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub script: String,
    pub scenes: Vec<Scene>,
}

impl Script {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let body = strip_code_fence(text);
        serde_json::from_str(body).context("Failed to parse script JSON")
    }

    /// Narration fed to the voice source: scene narrations joined by single spaces.
    pub fn full_narration(&self) -> String {
        self.scenes
            .iter()
            .map(|scene| scene.narration.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|scene| scene.duration).sum()
    }
}

/// Rejects an empty scene list or any duration that is not a positive finite number.
pub fn validate_scenes(scenes: &[Scene]) -> Result<()> {
    if scenes.is_empty() {
        return Err(PipelineError::InvalidScenes("scene list is empty".to_string()));
    }
    for (idx, scene) in scenes.iter().enumerate() {
        if !scene.duration.is_finite() || scene.duration <= 0.0 {
            return Err(PipelineError::InvalidScenes(format!(
                "scene {} has non-positive duration {}",
                idx, scene.duration
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    #[default]
    Short,
    Long,
}

impl VideoType {
    pub fn content_length(self) -> &'static str {
        match self {
            VideoType::Short => "approximately 60 seconds",
            VideoType::Long => "5-6 minutes",
        }
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoType::Short => f.write_str("short"),
            VideoType::Long => f.write_str("long"),
        }
    }
}

impl FromStr for VideoType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(VideoType::Short),
            "long" => Ok(VideoType::Long),
            other => anyhow::bail!("unknown video type: {other} (expected short or long)"),
        }
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, Default)]
pub struct VideoRequest {
    pub niche: String,
    pub video_type: VideoType,
    pub keywords: Option<String>,
    pub additional_instructions: Option<String>,
    pub channel_id: Option<String>,
}

impl VideoRequest {
    /// Comma-separated keywords, trimmed, empties dropped.
    pub fn tags(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
pub trait ScriptSource: Send + Sync {
    async fn generate(&self, request: &VideoRequest) -> anyhow::Result<Script>;
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match fence_regex() {
        Ok(re) => re
            .captures(trimmed)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
            .unwrap_or(trimmed),
        Err(_) => trimmed,
    }
}

fn fence_regex() -> anyhow::Result<&'static Regex> {
    static FENCE_RE: OnceCell<Regex> = OnceCell::new();
    FENCE_RE.get_or_try_init(|| {
        Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").context("failed to compile fence regex")
    })
}
