use crate::config::EncodingSettings;
use crate::error::{PipelineError, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// A single transcoder invocation: concat the manifest as video, take the
/// voiceover as the only audio stream, burn in subtitles, stop at the shorter
/// stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodePlan {
    pub program: String,
    pub args: Vec<String>,
    pub output: PathBuf,
}

impl TranscodePlan {
    pub fn new(
        program: &str,
        manifest: &Path,
        audio: &Path,
        subtitles: &Path,
        output: &Path,
        encoding: &EncodingSettings,
    ) -> Self {
        let args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            manifest.display().to_string(),
            "-i".to_string(),
            audio.display().to_string(),
            "-map".to_string(),
            "0:v".to_string(),
            "-map".to_string(),
            "1:a".to_string(),
            "-vf".to_string(),
            subtitles_filter(subtitles),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-preset".to_string(),
            encoding.preset.clone(),
            "-crf".to_string(),
            encoding.crf.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            encoding.audio_bitrate.clone(),
            "-shortest".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.display().to_string(),
        ];

        Self {
            program: program.to_string(),
            args,
            output: output.to_path_buf(),
        }
    }

    /// Runs the plan to completion. Non-zero exit becomes `TranscodeFailed`
    /// carrying the exit code and captured stderr.
    pub async fn run(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|source| PipelineError::TranscoderUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PipelineError::TranscodeFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// `subtitles=` filter argument with the characters the filter graph parser
/// treats specially escaped.
fn subtitles_filter(path: &Path) -> String {
    let raw = path.display().to_string().replace('\\', "/");
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, ':' | '\'' | ',' | '[' | ']' | ';') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("subtitles={}", escaped)
}

/// Container duration of `path` in seconds, as reported by `ffprobe`.
pub async fn ffprobe_duration_seconds(ffprobe: &str, path: &Path) -> anyhow::Result<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .with_context(|| format!("Failed to run `{ffprobe}`"))?;

    if !output.status.success() {
        anyhow::bail!(
            "`{}` exited with {} for {}: {}",
            ffprobe,
            output.status,
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = stdout.trim();
    let duration: f64 = text
        .parse()
        .with_context(|| format!("Unparseable duration {text:?} for {}", path.display()))?;
    if !duration.is_finite() || duration <= 0.0 {
        anyhow::bail!("Non-positive duration {duration} for {}", path.display());
    }
    Ok(duration)
}

pub async fn check_ffmpeg(program: &str) -> bool {
    match Command::new(program).arg("-version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(program: &str) -> TranscodePlan {
        TranscodePlan::new(
            program,
            Path::new("/w/concat.txt"),
            Path::new("/a/voiceover.mp3"),
            Path::new("/w/subtitles.srt"),
            Path::new("/w/final_video.mp4"),
            &EncodingSettings::default(),
        )
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
        args.windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].as_str())
            .collect()
    }

    #[test]
    fn plan_wires_inputs_and_output() {
        let p = plan("ffmpeg");
        assert_eq!(p.program, "ffmpeg");
        assert_eq!(
            value_after(&p.args, "-i"),
            vec!["/w/concat.txt", "/a/voiceover.mp3"]
        );
        assert_eq!(value_after(&p.args, "-f"), vec!["concat"]);
        assert_eq!(value_after(&p.args, "-map"), vec!["0:v", "1:a"]);
        assert_eq!(value_after(&p.args, "-vf"), vec!["subtitles=/w/subtitles.srt"]);
        assert!(p.args.iter().any(|a| a == "-shortest"));
        assert_eq!(p.args.last().map(String::as_str), Some("/w/final_video.mp4"));
        assert_eq!(p.output, PathBuf::from("/w/final_video.mp4"));
    }

    #[test]
    fn plan_uses_encoding_settings() {
        let p = plan("ffmpeg");
        assert_eq!(value_after(&p.args, "-preset"), vec!["veryfast"]);
        assert_eq!(value_after(&p.args, "-crf"), vec!["22"]);
        assert_eq!(value_after(&p.args, "-b:a"), vec!["192k"]);
    }

    #[test]
    fn subtitle_path_is_escaped_for_filter_graph() {
        assert_eq!(
            subtitles_filter(Path::new("C:\\tmp\\it's,here.srt")),
            "subtitles=C\\:/tmp/it\\'s\\,here.srt"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_transcode_failed() {
        let err = plan("false").run().await.unwrap_err();
        assert!(matches!(err, PipelineError::TranscodeFailed { code: 1, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_is_success() {
        assert!(plan("true").run().await.is_ok());
    }

    #[cfg(unix)]
    fn fake_ffprobe(dir: &Path, stdout: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("ffprobe");
        std::fs::write(&script, format!("#!/bin/sh\necho '{stdout}'\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn ffprobe_output_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let ffprobe = fake_ffprobe(dir.path(), "61.48");
        let secs = ffprobe_duration_seconds(&ffprobe, Path::new("v.mp3")).await.unwrap();
        assert_eq!(secs, 61.48);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unparseable_ffprobe_output_keeps_cause() {
        let dir = tempfile::tempdir().unwrap();
        let ffprobe = fake_ffprobe(dir.path(), "N/A");
        let err = ffprobe_duration_seconds(&ffprobe, Path::new("v.mp3")).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("\"N/A\""), "{message}");
        assert!(message.contains("invalid float literal"), "{message}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_ffprobe_duration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ffprobe = fake_ffprobe(dir.path(), "0.000000");
        let err = ffprobe_duration_seconds(&ffprobe, Path::new("v.mp3")).await.unwrap_err();
        assert!(err.to_string().starts_with("Non-positive duration 0"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_ffprobe_is_an_error() {
        assert!(ffprobe_duration_seconds("false", Path::new("v.mp3")).await.is_err());
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let err = plan("definitely-not-a-transcoder-xyz").run().await.unwrap_err();
        assert!(matches!(err, PipelineError::TranscoderUnavailable { .. }));
    }
}
