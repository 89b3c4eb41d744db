use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Script,
    Media,
    Voice,
    Assembly,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Script => "script",
            Stage::Media => "media",
            Stage::Voice => "voice",
            Stage::Assembly => "assembly",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid scenes: {0}")]
    InvalidScenes(String),

    #[error("invalid media item for scene {scene}: {reason}")]
    InvalidMedia { scene: usize, reason: String },

    #[error("no media collected for any scene")]
    NoMediaCollected,

    #[error("script source failed: {0:#}")]
    ScriptSourceFailure(anyhow::Error),

    #[error("media source failed: {0:#}")]
    MediaSourceFailure(anyhow::Error),

    #[error("voice source failed: {0:#}")]
    VoiceSourceFailure(anyhow::Error),

    #[error("failed to launch transcoder `{program}`: {source}")]
    TranscoderUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transcode failed with exit code {code}{}", stderr_tail(.stderr))]
    TranscodeFailed { code: i32, stderr: String },

    #[error("failed to create work directory under {}: {source}", path.display())]
    WorkDirFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    ManifestWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("publish failed: {0:#}")]
    PublishFailure(anyhow::Error),
}

/// The single failure a pipeline run reports, tagged with its stage.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: PipelineError) -> Self {
        Self { stage, error }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

const STDERR_TAIL_CHARS: usize = 400;

/// Last few hundred chars of the transcoder's stderr, prefixed for display.
fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let count = trimmed.chars().count();
    let tail: String = trimmed
        .chars()
        .skip(count.saturating_sub(STDERR_TAIL_CHARS))
        .collect();
    format!(": {tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failure_names_the_stage() {
        let failure = StageFailure::new(
            Stage::Assembly,
            PipelineError::TranscodeFailed {
                code: 1,
                stderr: "boom".to_string(),
            },
        );
        assert_eq!(
            failure.to_string(),
            "assembly stage failed: transcode failed with exit code 1: boom"
        );
    }

    #[test]
    fn transcode_failure_without_stderr_shows_only_the_code() {
        let err = PipelineError::TranscodeFailed {
            code: -1,
            stderr: "  \n".to_string(),
        };
        assert_eq!(err.to_string(), "transcode failed with exit code -1");
    }

    #[test]
    fn long_transcoder_stderr_keeps_its_tail() {
        let stderr = format!("{}concat.txt: No such file or directory\n", "x".repeat(1000));
        let message = PipelineError::TranscodeFailed { code: 1, stderr }.to_string();
        assert!(message.ends_with("concat.txt: No such file or directory"));
        let shown = message.trim_start_matches("transcode failed with exit code 1: ");
        assert_eq!(shown.chars().count(), STDERR_TAIL_CHARS);
    }

    #[test]
    fn work_dir_failure_names_the_root() {
        let err = PipelineError::WorkDirFailure {
            path: PathBuf::from("/ro/temp"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("failed to create work directory under /ro/temp: "));
    }

    #[test]
    fn source_failures_render_context_chain() {
        let err = anyhow::anyhow!("HTTP 401").context("ElevenLabs request failed");
        let failure = PipelineError::VoiceSourceFailure(err);
        assert_eq!(
            failure.to_string(),
            "voice source failed: ElevenLabs request failed: HTTP 401"
        );
    }
}
