use crate::config::Config;
use crate::publisher::{Published, Publisher, VideoMetadata};
use crate::{logi, logok};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::LOCATION;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tokio::fs;

const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

/// YouTube Data API v3 resumable upload with an injected OAuth access token.
pub struct YoutubePublisher {
    client: Client,
    access_token: String,
    category_id: String,
    privacy: String,
}

impl YoutubePublisher {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            access_token: cfg.youtube_access_token.clone(),
            category_id: cfg.youtube_category_id.clone(),
            privacy: cfg.youtube_privacy.clone(),
        }
    }

    fn video_resource(&self, metadata: &VideoMetadata) -> serde_json::Value {
        json!({
            "snippet": {
                "title": metadata.title,
                "description": metadata.description,
                "tags": metadata.tags,
                "categoryId": self.category_id,
            },
            "status": {
                "privacyStatus": self.privacy,
            },
        })
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={}", video_id)
}

#[async_trait]
impl Publisher for YoutubePublisher {
    async fn publish(&self, video: &Path, metadata: &VideoMetadata) -> Result<Published> {
        let bytes = fs::read(video)
            .await
            .with_context(|| format!("Failed to read {}", video.display()))?;

        if let Some(channel) = &metadata.channel_id {
            logi(format!("Uploading to YouTube channel {}", channel));
        }
        logi(format!(
            "Starting YouTube upload: \"{}\" ({} bytes)",
            metadata.title,
            bytes.len()
        ));

        let initiate = self
            .client
            .post(UPLOAD_URL)
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", bytes.len().to_string())
            .json(&self.video_resource(metadata))
            .send()
            .await
            .context("YouTube upload initiation failed")?;

        let status = initiate.status();
        if !status.is_success() {
            let body = initiate.text().await.unwrap_or_default();
            anyhow::bail!("YouTube upload initiation HTTP {}: {}", status.as_u16(), body);
        }
        let session_uri = initiate
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .context("no Location header in YouTube upload-initiation response")?;

        let upload = self
            .client
            .put(&session_uri)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .timeout(std::time::Duration::from_secs(3600))
            .send()
            .await
            .context("YouTube video upload failed")?;

        let status = upload.status();
        let raw = upload.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("YouTube upload HTTP {}: {}", status.as_u16(), raw);
        }
        let resource: VideoResource =
            serde_json::from_str(&raw).context("YouTube upload response parse failed")?;

        logok(format!("Video uploaded successfully: {}", resource.id));
        Ok(Published {
            url: watch_url(&resource.id),
            video_id: resource.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_carries_snippet_and_privacy() {
        let cfg = Config {
            youtube_access_token: "t".to_string(),
            ..Config::default()
        };
        let publisher = YoutubePublisher::new(Client::new(), &cfg);
        let resource = publisher.video_resource(&VideoMetadata {
            title: "Bees".to_string(),
            description: "All about bees #bees".to_string(),
            tags: vec!["bees".to_string(), "honey".to_string()],
            channel_id: None,
        });
        assert_eq!(resource["snippet"]["title"], "Bees");
        assert_eq!(resource["snippet"]["tags"][1], "honey");
        assert_eq!(resource["snippet"]["categoryId"], "22");
        assert_eq!(resource["status"]["privacyStatus"], "private");
    }

    #[test]
    fn watch_urls() {
        assert_eq!(watch_url("abc123"), "https://youtube.com/watch?v=abc123");
    }
}
