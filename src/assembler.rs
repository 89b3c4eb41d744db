use crate::config::{Config, EncodingSettings};
use crate::error::{PipelineError, Result};
use crate::ffmpeg::TranscodePlan;
use crate::manifest::build_manifest;
use crate::media::{MediaItem, validate_media};
use crate::script::{Scene, validate_scenes};
use crate::srt::{build_cues, render_srt};
use crate::workdir::allocate_dir;
use crate::{logi, logok};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const MANIFEST_FILE: &str = "concat.txt";
pub const SUBTITLE_FILE: &str = "subtitles.srt";
pub const OUTPUT_FILE: &str = "final_video.mp4";

/// Files produced by one assembly run, all inside `work_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyArtifacts {
    pub work_dir: PathBuf,
    pub concat_manifest_path: PathBuf,
    pub subtitle_file_path: PathBuf,
    pub output_video_path: PathBuf,
}

impl AssemblyArtifacts {
    fn in_dir(work_dir: PathBuf) -> Self {
        Self {
            concat_manifest_path: work_dir.join(MANIFEST_FILE),
            subtitle_file_path: work_dir.join(SUBTITLE_FILE),
            output_video_path: work_dir.join(OUTPUT_FILE),
            work_dir,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assembler {
    pub work_root: PathBuf,
    pub ffmpeg: String,
    pub subtitle_max_chars: usize,
    pub encoding: EncodingSettings,
}

impl Assembler {
    pub fn new(work_root: impl Into<PathBuf>, ffmpeg: impl Into<String>) -> Self {
        Self {
            work_root: work_root.into(),
            ffmpeg: ffmpeg.into(),
            subtitle_max_chars: crate::srt::DEFAULT_MAX_CHARS,
            encoding: EncodingSettings::default(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            work_root: cfg.work_root.clone(),
            ffmpeg: cfg.ffmpeg_path.clone(),
            subtitle_max_chars: cfg.subtitle_max_chars,
            encoding: cfg.encoding.clone(),
        }
    }

    /// Writes the manifest, then the subtitles, then runs the transcoder, in
    /// that order, inside a freshly allocated directory.
    ///
    /// Artifacts are left on disk whether or not the run succeeds.
    pub async fn assemble(
        &self,
        scenes: &[Scene],
        media: &[MediaItem],
        audio: &Path,
    ) -> Result<AssemblyArtifacts> {
        validate_scenes(scenes)?;
        validate_media(media, scenes.len())?;

        let media = resolve_media_paths(media)?;

        let work_dir = allocate_dir(&self.work_root, "output").map_err(|source| {
            PipelineError::WorkDirFailure {
                path: self.work_root.clone(),
                source,
            }
        })?;
        let artifacts = AssemblyArtifacts::in_dir(work_dir);
        logi(format!(
            "Assembling {} media items over {} scenes in {}",
            media.len(),
            scenes.len(),
            artifacts.work_dir.display()
        ));

        write_artifact(&artifacts.concat_manifest_path, build_manifest(&media)).await?;

        let cues = build_cues(scenes, self.subtitle_max_chars);
        write_artifact(&artifacts.subtitle_file_path, render_srt(&cues)).await?;
        logok(format!(
            "Wrote {} subtitle cues: {}",
            cues.len(),
            artifacts.subtitle_file_path.display()
        ));

        let plan = TranscodePlan::new(
            &self.ffmpeg,
            &artifacts.concat_manifest_path,
            audio,
            &artifacts.subtitle_file_path,
            &artifacts.output_video_path,
            &self.encoding,
        );
        logi(format!("Transcoding -> {}", artifacts.output_video_path.display()));
        plan.run().await?;
        logok(format!("Assembled video: {}", artifacts.output_video_path.display()));

        Ok(artifacts)
    }
}

/// The concat demuxer resolves relative entries against the manifest's own
/// directory, so every source path is pinned to the current directory first.
fn resolve_media_paths(media: &[MediaItem]) -> Result<Vec<MediaItem>> {
    media
        .iter()
        .map(|item| {
            let source_path = std::path::absolute(&item.source_path).map_err(|err| {
                PipelineError::InvalidMedia {
                    scene: item.scene_index,
                    reason: format!("cannot resolve {}: {}", item.source_path.display(), err),
                }
            })?;
            Ok(MediaItem {
                source_path,
                ..item.clone()
            })
        })
        .collect()
}

async fn write_artifact(path: &Path, contents: String) -> Result<()> {
    fs::write(path, contents)
        .await
        .map_err(|source| PipelineError::ManifestWriteFailure {
            path: path.to_path_buf(),
            source,
        })
}
