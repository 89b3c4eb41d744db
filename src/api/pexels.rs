use crate::config::Config;
use crate::media::{MediaItem, MediaSource};
use crate::script::Script;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::JoinSet;

const PHOTO_SEARCH_URL: &str = "https://api.pexels.com/v1/search";
const VIDEO_SEARCH_URL: &str = "https://api.pexels.com/videos/search";
const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct PhotoSearch {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSrc,
}

#[derive(Debug, Deserialize)]
struct PhotoSrc {
    large: String,
}

#[derive(Debug, Deserialize)]
struct VideoSearch {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    #[serde(default)]
    width: Option<u32>,
    link: String,
}

/// Stock media lookup: one photo per scene, falling back to the smallest
/// rendition of the first matching video.
#[derive(Clone)]
pub struct PexelsMediaSource {
    client: Client,
    api_key: String,
}

impl PexelsMediaSource {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            api_key: cfg.pexels_api_key.clone(),
        }
    }

    async fn collect_scene(
        &self,
        index: usize,
        query: String,
        duration: f64,
        media_dir: PathBuf,
    ) -> Result<Option<MediaItem>> {
        let photos: PhotoSearch = self.search(PHOTO_SEARCH_URL, &query).await?;
        if let Some(photo) = photos.photos.first() {
            let path = media_dir.join(format!("scene_{index}_image.jpg"));
            self.download(&photo.src.large, &path).await?;
            return Ok(Some(MediaItem::image(path, index, duration)));
        }

        let videos: VideoSearch = self.search(VIDEO_SEARCH_URL, &query).await?;
        let Some(file) = videos
            .videos
            .first()
            .and_then(|video| smallest_rendition(&video.video_files))
        else {
            return Ok(None);
        };
        let path = media_dir.join(format!("scene_{index}_video.mp4"));
        self.download(&file.link, &path).await?;
        Ok(Some(MediaItem::video(path, index, duration)))
    }

    async fn search<T: for<'de> Deserialize<'de>>(&self, url: &str, query: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .header("Authorization", &self.api_key)
            .query(&[("query", query), ("per_page", "1")])
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Pexels search failed: {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Pexels search HTTP {} for {}", status.as_u16(), url);
        }
        resp.json::<T>()
            .await
            .context("Pexels search response parse failed")
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let resp = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(120))
            .send()
            .await
            .with_context(|| format!("Media download failed: {url}"))?;
        if !resp.status().is_success() {
            anyhow::bail!("Media download HTTP {} for {}", resp.status().as_u16(), url);
        }
        let bytes = resp.bytes().await.context("Media download read failed")?;
        fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        Ok(())
    }
}

#[async_trait]
impl MediaSource for PexelsMediaSource {
    async fn collect(
        &self,
        script: &Script,
        niche: &str,
        media_dir: &Path,
    ) -> Result<Vec<MediaItem>> {
        fs::create_dir_all(media_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", media_dir.display()))?;

        logi(format!("Collecting media for {} scenes...", script.scenes.len()));
        let mut tasks = JoinSet::new();
        for (index, scene) in script.scenes.iter().enumerate() {
            let source = self.clone();
            let query = search_query(niche, &scene.visual_description);
            let duration = scene.duration;
            let dir = media_dir.to_path_buf();
            tasks.spawn(async move {
                let result = source.collect_scene(index, query, duration, dir).await;
                (index, result)
            });
        }

        let mut items = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.context("media task panicked")?;
            match result {
                Ok(Some(item)) => items.push(item),
                Ok(None) => logw(format!("No media found for scene {}", index)),
                Err(err) => logw(format!("Error collecting media for scene {}: {:#}", index, err)),
            }
        }

        items.sort_by_key(|item| item.scene_index);
        logok(format!("Collected {} media files", items.len()));
        Ok(items)
    }
}

/// `"{niche} {visual}"` cut to 100 characters.
pub fn search_query(niche: &str, visual_description: &str) -> String {
    format!("{} {}", niche, visual_description)
        .chars()
        .take(MAX_QUERY_CHARS)
        .collect()
}

fn smallest_rendition(files: &[VideoFile]) -> Option<&VideoFile> {
    files.iter().min_by_key(|file| file.width.unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_query_is_truncated() {
        assert_eq!(search_query("bees", "macro shot"), "bees macro shot");
        let long = "x".repeat(150);
        assert_eq!(search_query("bees", &long).chars().count(), 100);
    }

    #[test]
    fn picks_narrowest_video_file() {
        let json = r#"{"videos":[{"video_files":[
            {"width":1920,"link":"hd"},{"width":640,"link":"sd"},{"link":"unknown"}]}]}"#;
        let search: VideoSearch = serde_json::from_str(json).unwrap();
        let file = smallest_rendition(&search.videos[0].video_files).unwrap();
        assert_eq!(file.link, "sd");
    }

    #[test]
    fn empty_photo_search_parses() {
        let search: PhotoSearch = serde_json::from_str(r#"{"page":1}"#).unwrap();
        assert!(search.photos.is_empty());
    }
}
