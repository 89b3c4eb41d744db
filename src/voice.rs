use crate::logi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

pub const VOICEOVER_FILE: &str = "voiceover.mp3";

/// Synthesizes one audio track for the full narration into `audio_dir`.
#[async_trait]
pub trait VoiceSource: Send + Sync {
    async fn synthesize(&self, narration: &str, audio_dir: &Path) -> Result<PathBuf>;
}

/// Offline text-to-speech through an external program.
///
/// The narration is written to `script.txt`, then the configured argv is run
/// with the text file and the target audio path appended.
pub struct CommandVoiceSource {
    pub command: Vec<String>,
}

impl CommandVoiceSource {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl VoiceSource for CommandVoiceSource {
    async fn synthesize(&self, narration: &str, audio_dir: &Path) -> Result<PathBuf> {
        let (program, prefix) = self
            .command
            .split_first()
            .context("tts_command is empty")?;

        fs::create_dir_all(audio_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", audio_dir.display()))?;
        let script_path = audio_dir.join("script.txt");
        let audio_path = audio_dir.join(VOICEOVER_FILE);
        fs::write(&script_path, narration)
            .await
            .with_context(|| format!("Failed to write {}", script_path.display()))?;

        logi(format!("Running TTS command: {}", self.command.join(" ")));
        let output = Command::new(program)
            .args(prefix)
            .arg(&script_path)
            .arg(&audio_path)
            .output()
            .await
            .with_context(|| format!("Failed to launch TTS command `{program}`"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "TTS command exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        if fs::metadata(&audio_path).await.is_err() {
            anyhow::bail!("TTS command produced no audio at {}", audio_path.display());
        }
        Ok(audio_path)
    }
}
