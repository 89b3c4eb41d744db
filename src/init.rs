use crate::config::Config;
use crate::{ffmpeg, logi, logw};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// Creates the work root and the local output folder if they are missing.
pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in [&cfg.work_root, &cfg.output_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

/// Warns (without failing) when the configured transcoder cannot be run.
pub async fn check_ffmpeg(cfg: &Config) -> bool {
    let ok = ffmpeg::check_ffmpeg(&cfg.ffmpeg_path).await;
    if !ok {
        logw(format!(
            "FFmpeg not found at `{}`. Please install FFmpeg or set ffmpeg_path.",
            cfg.ffmpeg_path
        ));
    }
    ok
}
