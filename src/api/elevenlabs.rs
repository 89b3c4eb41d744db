use crate::config::Config;
use crate::logi;
use crate::voice::{VOICEOVER_FILE, VoiceSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;

const ELEVENLABS_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";

pub struct ElevenLabsVoiceSource {
    client: Client,
    api_key: String,
    voice_id: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsVoiceSource {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            api_key: cfg.elevenlabs_api_key.clone(),
            voice_id: cfg.eleven_voice_id.clone(),
            model_id: cfg.eleven_model_id.clone(),
            stability: cfg.eleven_stability,
            similarity_boost: cfg.eleven_similarity_boost,
        }
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": self.stability,
                "similarity_boost": self.similarity_boost,
            },
        })
    }
}

#[async_trait]
impl VoiceSource for ElevenLabsVoiceSource {
    async fn synthesize(&self, narration: &str, audio_dir: &Path) -> Result<PathBuf> {
        let url = format!("{}/{}", ELEVENLABS_BASE, self.voice_id);
        logi(format!(
            "Requesting ElevenLabs voiceover ({} chars, voice {})",
            narration.chars().count(),
            self.voice_id
        ));

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.api_key)
            .json(&self.request_body(narration))
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .context("ElevenLabs request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet = body.chars().take(400).collect::<String>();
            anyhow::bail!("ElevenLabs TTS failed HTTP {}: {}", status.as_u16(), snippet);
        }

        let bytes = resp.bytes().await.context("ElevenLabs response read failed")?;
        if bytes.is_empty() {
            anyhow::bail!("ElevenLabs returned an empty audio body");
        }

        fs::create_dir_all(audio_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", audio_dir.display()))?;
        let out_mp3_path = audio_dir.join(VOICEOVER_FILE);
        fs::write(&out_mp3_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", out_mp3_path.display()))?;

        Ok(out_mp3_path)
    }
}
