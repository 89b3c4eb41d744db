#![cfg(unix)]

use anyhow::Result;
use async_trait::async_trait;
use niche_shorts::assembler::Assembler;
use niche_shorts::error::{PipelineError, Stage};
use niche_shorts::generator::Pipeline;
use niche_shorts::media::{MediaItem, MediaSource};
use niche_shorts::publisher::{Published, Publisher, VideoMetadata};
use niche_shorts::script::{Scene, Script, ScriptSource, VideoRequest};
use niche_shorts::voice::VoiceSource;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

struct FixedScript(Script);

#[async_trait]
impl ScriptSource for FixedScript {
    async fn generate(&self, _request: &VideoRequest) -> Result<Script> {
        Ok(self.0.clone())
    }
}

/// Returns images for the listed scenes only.
struct SparseMedia(Vec<usize>);

#[async_trait]
impl MediaSource for SparseMedia {
    async fn collect(&self, script: &Script, _niche: &str, media_dir: &Path) -> Result<Vec<MediaItem>> {
        Ok(self
            .0
            .iter()
            .map(|&i| {
                MediaItem::image(
                    media_dir.join(format!("scene_{i}_image.jpg")),
                    i,
                    script.scenes[i].duration,
                )
            })
            .collect())
    }
}

struct FileVoice {
    fail: bool,
}

#[async_trait]
impl VoiceSource for FileVoice {
    async fn synthesize(&self, narration: &str, audio_dir: &Path) -> Result<PathBuf> {
        if self.fail {
            anyhow::bail!("quota exceeded");
        }
        tokio::fs::create_dir_all(audio_dir).await?;
        let path = audio_dir.join("voiceover.mp3");
        tokio::fs::write(&path, narration).await?;
        Ok(path)
    }
}

#[derive(Clone, Default)]
struct RecordingPublisher {
    calls: Arc<Mutex<Vec<(PathBuf, VideoMetadata)>>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, video: &Path, metadata: &VideoMetadata) -> Result<Published> {
        self.calls
            .lock()
            .unwrap()
            .push((video.to_path_buf(), metadata.clone()));
        Ok(Published {
            video_id: "vid123".to_string(),
            url: "https://youtube.com/watch?v=vid123".to_string(),
        })
    }
}

fn script(durations: &[f64]) -> Script {
    Script {
        title: "Bees Explained".to_string(),
        description: "All about bees #bees".to_string(),
        script: String::new(),
        scenes: durations
            .iter()
            .enumerate()
            .map(|(i, &duration)| Scene {
                narration: format!("scene number {i} talks about bees"),
                visual_description: "bees".to_string(),
                duration,
            })
            .collect(),
    }
}

fn pipeline(
    work_root: &Path,
    script: Script,
    media: Vec<usize>,
    voice_fails: bool,
    transcoder: &str,
    publisher: RecordingPublisher,
) -> Pipeline {
    Pipeline {
        script_source: Box::new(FixedScript(script)),
        media_source: Box::new(SparseMedia(media)),
        voice_source: Box::new(FileVoice { fail: voice_fails }),
        publisher: Box::new(publisher),
        assembler: Assembler::new(work_root, transcoder),
        work_root: work_root.to_path_buf(),
        ffprobe: "false".to_string(),
        duration_tolerance: 0.25,
        cleanup_on_success: false,
    }
}

fn request() -> VideoRequest {
    VideoRequest {
        niche: "bees".to_string(),
        keywords: Some("bees, honey".to_string()),
        channel_id: Some("UC123".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn full_run_publishes_assembled_video() {
    let root = tempfile::tempdir().unwrap();
    let publisher = RecordingPublisher::default();
    let p = pipeline(
        root.path(),
        script(&[2.0, 3.0, 4.0]),
        vec![0, 2],
        false,
        "true",
        publisher.clone(),
    );

    let outcome = p.run(&request()).await.unwrap();
    assert_eq!(outcome.title, "Bees Explained");
    assert_eq!(outcome.published.video_id, "vid123");

    let manifest = std::fs::read_to_string(&outcome.artifacts.concat_manifest_path).unwrap();
    assert_eq!(manifest.matches("file '").count(), 2);
    assert!(manifest.contains("scene_0_image.jpg"));
    assert!(manifest.contains("scene_2_image.jpg"));
    assert!(!manifest.contains("scene_1_image.jpg"));

    let srt = std::fs::read_to_string(&outcome.artifacts.subtitle_file_path).unwrap();
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,000\n"));
    assert!(srt.contains("00:00:02,000 --> 00:00:05,000"));
    assert!(srt.contains("00:00:05,000 --> 00:00:09,000"));

    let calls = publisher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, outcome.artifacts.output_video_path);
    assert_eq!(calls[0].1.tags, vec!["bees", "honey"]);
    assert_eq!(calls[0].1.channel_id.as_deref(), Some("UC123"));
}

#[tokio::test]
async fn invalid_scenes_fail_in_script_stage() {
    let root = tempfile::tempdir().unwrap();
    let p = pipeline(
        root.path(),
        script(&[2.0, 0.0]),
        vec![0],
        false,
        "true",
        RecordingPublisher::default(),
    );
    let failure = p.run(&request()).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Script);
    assert!(matches!(failure.error, PipelineError::InvalidScenes(_)));
}

#[tokio::test]
async fn no_media_fails_in_media_stage() {
    let root = tempfile::tempdir().unwrap();
    let p = pipeline(
        root.path(),
        script(&[2.0]),
        Vec::new(),
        false,
        "true",
        RecordingPublisher::default(),
    );
    let failure = p.run(&request()).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Media);
    assert!(matches!(failure.error, PipelineError::NoMediaCollected));
}

#[tokio::test]
async fn voice_failure_is_reported_as_voice_stage() {
    let root = tempfile::tempdir().unwrap();
    let p = pipeline(
        root.path(),
        script(&[2.0]),
        vec![0],
        true,
        "true",
        RecordingPublisher::default(),
    );
    let failure = p.run(&request()).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Voice);
    assert!(failure.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn transcode_failure_stops_before_publish() {
    let root = tempfile::tempdir().unwrap();
    let publisher = RecordingPublisher::default();
    let p = pipeline(
        root.path(),
        script(&[2.0]),
        vec![0],
        false,
        "false",
        publisher.clone(),
    );
    let failure = p.run(&request()).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Assembly);
    assert!(matches!(
        failure.error,
        PipelineError::TranscodeFailed { code: 1, .. }
    ));
    assert!(publisher.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cleanup_on_success_removes_run_directories() {
    let root = tempfile::tempdir().unwrap();
    let mut p = pipeline(
        root.path(),
        script(&[1.0]),
        vec![0],
        false,
        "true",
        RecordingPublisher::default(),
    );
    p.cleanup_on_success = true;

    let outcome = p.run(&request()).await.unwrap();
    assert!(!outcome.run_dir.exists());
    assert!(!outcome.artifacts.work_dir.exists());
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unusable_work_root_is_reported_before_any_stage_runs() {
    let root = tempfile::tempdir().unwrap();
    let blocker = root.path().join("temp");
    std::fs::write(&blocker, b"not a dir").unwrap();
    let publisher = RecordingPublisher::default();
    let p = pipeline(&blocker, script(&[1.0]), vec![0], false, "true", publisher.clone());

    let failure = p.run(&request()).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Script);
    assert!(matches!(
        failure.error,
        PipelineError::WorkDirFailure { ref path, .. } if *path == blocker
    ));
    assert!(failure.to_string().contains("work directory"));
    assert!(publisher.calls.lock().unwrap().is_empty());
}
