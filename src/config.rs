use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptBackend {
    #[default]
    Openai,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    #[default]
    Pexels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceBackend {
    #[default]
    Elevenlabs,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishBackend {
    #[default]
    Youtube,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSettings {
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_crf")]
    pub crf: u8,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            crf: default_crf(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_work_root")]
    pub work_root: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_subtitle_max_chars")]
    pub subtitle_max_chars: usize,

    #[serde(default)]
    pub script_source: ScriptBackend,
    #[serde(default)]
    pub media_source: MediaBackend,
    #[serde(default)]
    pub voice_source: VoiceBackend,
    #[serde(default)]
    pub publisher: PublishBackend,

    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default)]
    pub pexels_api_key: String,

    #[serde(default)]
    pub elevenlabs_api_key: String,
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,
    #[serde(default = "default_half")]
    pub eleven_stability: f32,
    #[serde(default = "default_half")]
    pub eleven_similarity_boost: f32,

    #[serde(default = "default_tts_command")]
    pub tts_command: Vec<String>,

    #[serde(default)]
    pub youtube_access_token: String,
    #[serde(default = "default_category_id")]
    pub youtube_category_id: String,
    #[serde(default = "default_privacy")]
    pub youtube_privacy: String,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
    #[serde(default)]
    pub encoding: EncodingSettings,

    #[serde(default = "default_duration_tolerance")]
    pub duration_tolerance: f64,
    #[serde(default)]
    pub cleanup_on_success: bool,
}

fn default_work_root() -> PathBuf {
    PathBuf::from("temp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_subtitle_max_chars() -> usize {
    crate::srt::DEFAULT_MAX_CHARS
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_voice_id() -> String {
    "r21m7BAbXjtux814CeJE".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_half() -> f32 {
    0.5
}

fn default_tts_command() -> Vec<String> {
    vec!["python".to_string(), "generate_speech.py".to_string()]
}

fn default_category_id() -> String {
    "22".to_string()
}

fn default_privacy() -> String {
    "private".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u8 {
    22
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_duration_tolerance() -> f64 {
    0.25
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_root: default_work_root(),
            output_dir: default_output_dir(),
            subtitle_max_chars: default_subtitle_max_chars(),
            script_source: ScriptBackend::default(),
            media_source: MediaBackend::default(),
            voice_source: VoiceBackend::default(),
            publisher: PublishBackend::default(),
            openai_api_key: String::new(),
            openai_model: default_openai_model(),
            pexels_api_key: String::new(),
            elevenlabs_api_key: String::new(),
            eleven_voice_id: default_voice_id(),
            eleven_model_id: default_model_id(),
            eleven_stability: default_half(),
            eleven_similarity_boost: default_half(),
            tts_command: default_tts_command(),
            youtube_access_token: String::new(),
            youtube_category_id: default_category_id(),
            youtube_privacy: default_privacy(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            encoding: EncodingSettings::default(),
            duration_tolerance: default_duration_tolerance(),
            cleanup_on_success: false,
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse config JSON")
    }

    /// Checks that every selected backend has the credentials it needs.
    pub fn validate(&self) -> Result<()> {
        if self.script_source == ScriptBackend::Openai && self.openai_api_key.is_empty() {
            anyhow::bail!("config.json: openai_api_key missing (script_source = openai)");
        }
        if self.media_source == MediaBackend::Pexels && self.pexels_api_key.is_empty() {
            anyhow::bail!("config.json: pexels_api_key missing (media_source = pexels)");
        }
        if self.voice_source == VoiceBackend::Elevenlabs && self.elevenlabs_api_key.is_empty() {
            anyhow::bail!("config.json: elevenlabs_api_key missing (voice_source = elevenlabs)");
        }
        if self.voice_source == VoiceBackend::Command && self.tts_command.is_empty() {
            anyhow::bail!("config.json: tts_command is empty (voice_source = command)");
        }
        if self.publisher == PublishBackend::Youtube && self.youtube_access_token.is_empty() {
            anyhow::bail!("config.json: youtube_access_token missing (publisher = youtube)");
        }
        if self.subtitle_max_chars == 0 {
            anyhow::bail!("config.json: subtitle_max_chars must be positive");
        }
        if !self.duration_tolerance.is_finite() || self.duration_tolerance < 0.0 {
            anyhow::bail!("config.json: duration_tolerance must be a non-negative number");
        }
        Ok(())
    }
}
