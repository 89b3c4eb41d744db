use crate::api::elevenlabs::ElevenLabsVoiceSource;
use crate::api::openai::OpenAiScriptSource;
use crate::api::pexels::PexelsMediaSource;
use crate::api::youtube::YoutubePublisher;
use crate::assembler::{Assembler, AssemblyArtifacts};
use crate::config::{Config, MediaBackend, PublishBackend, ScriptBackend, VoiceBackend};
use crate::error::{PipelineError, Stage, StageFailure};
use crate::ffmpeg;
use crate::media::MediaSource;
use crate::publisher::{LocalPublisher, Published, Publisher, VideoMetadata};
use crate::script::{ScriptSource, VideoRequest, validate_scenes};
use crate::template::TemplateScriptSource;
use crate::voice::{CommandVoiceSource, VoiceSource};
use crate::workdir::allocate_dir;
use crate::{logi, logok, logw};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub title: String,
    pub run_dir: PathBuf,
    pub artifacts: AssemblyArtifacts,
    pub published: Published,
}

/// script → media → voice → assembly → publish, strictly in order.
pub struct Pipeline {
    pub script_source: Box<dyn ScriptSource>,
    pub media_source: Box<dyn MediaSource>,
    pub voice_source: Box<dyn VoiceSource>,
    pub publisher: Box<dyn Publisher>,
    pub assembler: Assembler,
    pub work_root: PathBuf,
    pub ffprobe: String,
    pub duration_tolerance: f64,
    pub cleanup_on_success: bool,
}

impl Pipeline {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        let script_source: Box<dyn ScriptSource> = match cfg.script_source {
            ScriptBackend::Openai => Box::new(OpenAiScriptSource::new(client.clone(), cfg)),
            ScriptBackend::Template => Box::new(TemplateScriptSource::new()),
        };
        let media_source: Box<dyn MediaSource> = match cfg.media_source {
            MediaBackend::Pexels => Box::new(PexelsMediaSource::new(client.clone(), cfg)),
        };
        let voice_source: Box<dyn VoiceSource> = match cfg.voice_source {
            VoiceBackend::Elevenlabs => Box::new(ElevenLabsVoiceSource::new(client.clone(), cfg)),
            VoiceBackend::Command => Box::new(CommandVoiceSource::new(cfg.tts_command.clone())),
        };
        let publisher: Box<dyn Publisher> = match cfg.publisher {
            PublishBackend::Youtube => Box::new(YoutubePublisher::new(client, cfg)),
            PublishBackend::Local => Box::new(LocalPublisher::new(cfg.output_dir.clone())),
        };

        Ok(Self {
            script_source,
            media_source,
            voice_source,
            publisher,
            assembler: Assembler::from_config(cfg),
            work_root: cfg.work_root.clone(),
            ffprobe: cfg.ffprobe_path.clone(),
            duration_tolerance: cfg.duration_tolerance,
            cleanup_on_success: cfg.cleanup_on_success,
        })
    }

    pub async fn run(&self, request: &VideoRequest) -> Result<PipelineOutcome, StageFailure> {
        logi(format!(
            "=== Creating {} video about \"{}\" ===",
            request.video_type, request.niche
        ));

        let run_dir = allocate_dir(&self.work_root, "run").map_err(|source| {
            StageFailure::new(
                Stage::Script,
                PipelineError::WorkDirFailure {
                    path: self.work_root.clone(),
                    source,
                },
            )
        })?;
        logi(format!("Run directory: {}", run_dir.display()));

        logi("Generating script...");
        let script = self
            .script_source
            .generate(request)
            .await
            .map_err(|e| StageFailure::new(Stage::Script, PipelineError::ScriptSourceFailure(e)))?;
        validate_scenes(&script.scenes).map_err(|e| StageFailure::new(Stage::Script, e))?;
        logok(format!(
            "Script \"{}\": {} scenes, {:.1}s declared",
            script.title,
            script.scenes.len(),
            script.total_duration()
        ));

        logi("Collecting media...");
        let media = self
            .media_source
            .collect(&script, &request.niche, &run_dir.join("media"))
            .await
            .map_err(|e| StageFailure::new(Stage::Media, PipelineError::MediaSourceFailure(e)))?;
        if media.is_empty() {
            return Err(StageFailure::new(Stage::Media, PipelineError::NoMediaCollected));
        }
        if media.len() < script.scenes.len() {
            logw(format!(
                "Media found for {} of {} scenes; missing scenes are skipped",
                media.len(),
                script.scenes.len()
            ));
        }

        logi("Generating voiceover...");
        let audio = self
            .voice_source
            .synthesize(&script.full_narration(), &run_dir.join("audio"))
            .await
            .map_err(|e| StageFailure::new(Stage::Voice, PipelineError::VoiceSourceFailure(e)))?;
        logok(format!("Voiceover: {}", audio.display()));
        self.check_audio_duration(&audio, script.total_duration()).await;

        logi("Assembling video...");
        let artifacts = self
            .assembler
            .assemble(&script.scenes, &media, &audio)
            .await
            .map_err(|e| StageFailure::new(Stage::Assembly, e))?;

        logi("Publishing...");
        let metadata = VideoMetadata {
            title: script.title.clone(),
            description: script.description.clone(),
            tags: request.tags(),
            channel_id: request.channel_id.clone(),
        };
        let published = self
            .publisher
            .publish(&artifacts.output_video_path, &metadata)
            .await
            .map_err(|e| StageFailure::new(Stage::Publish, PipelineError::PublishFailure(e)))?;
        logok(format!("Published: {}", published.url));

        if self.cleanup_on_success {
            self.remove_dirs(&[run_dir.as_path(), artifacts.work_dir.as_path()])
                .await;
        }

        Ok(PipelineOutcome {
            title: script.title,
            run_dir,
            artifacts,
            published,
        })
    }

    /// Warns when the voiceover length strays from the declared scene total.
    /// Timings are never rescaled; scene durations stay authoritative.
    async fn check_audio_duration(&self, audio: &Path, declared: f64) {
        let actual = match ffmpeg::ffprobe_duration_seconds(&self.ffprobe, audio).await {
            Ok(v) => v,
            Err(err) => {
                logw(format!("Could not measure voiceover duration: {:#}", err));
                return;
            }
        };
        if exceeds_tolerance(actual, declared, self.duration_tolerance) {
            logw(format!(
                "Voiceover is {:.2}s but scenes declare {:.2}s; subtitles follow the scene durations",
                actual, declared
            ));
        } else {
            logi(format!("Voiceover duration {:.2}s (declared {:.2}s)", actual, declared));
        }
    }

    async fn remove_dirs(&self, dirs: &[&Path]) {
        for dir in dirs {
            if let Err(err) = tokio::fs::remove_dir_all(dir).await {
                logw(format!("Failed to remove {}: {}", dir.display(), err));
            }
        }
    }
}

fn exceeds_tolerance(actual: f64, declared: f64, tolerance: f64) -> bool {
    (actual - declared).abs() > declared * tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_relative_to_declared_total() {
        assert!(!exceeds_tolerance(60.0, 60.0, 0.25));
        assert!(!exceeds_tolerance(74.0, 60.0, 0.25));
        assert!(exceeds_tolerance(76.0, 60.0, 0.25));
        assert!(exceeds_tolerance(40.0, 60.0, 0.25));
        assert!(exceeds_tolerance(60.5, 60.0, 0.0));
    }

    #[test]
    fn builds_offline_pipeline_from_config() {
        let cfg = Config::from_json(
            r#"{"script_source":"template","pexels_api_key":"p","voice_source":"command",
                "publisher":"local","ffmpeg_path":"/opt/ffmpeg"}"#,
        )
        .unwrap();
        let pipeline = Pipeline::from_config(&cfg).unwrap();
        assert_eq!(pipeline.assembler.ffmpeg, "/opt/ffmpeg");
        assert_eq!(pipeline.work_root, PathBuf::from("temp"));
    }
}
