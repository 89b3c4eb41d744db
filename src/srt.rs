//! SubRip subtitle generation.
//!
//! Cue timing is derived purely from the declared scene durations: a cursor
//! walks the scenes in order, and each scene's window is divided evenly among
//! the chunks of its narration.

use crate::script::Scene;

/// Default character limit per cue.
pub const DEFAULT_MAX_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// 1-based, contiguous across the whole track.
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleCue {
    pub fn start_timecode(&self) -> String {
        format_timecode(self.start)
    }

    pub fn end_timecode(&self) -> String {
        format_timecode(self.end)
    }
}

/// Formats seconds as `HH:MM:SS,mmm`, truncating toward zero.
///
/// Hours are padded to two digits and only grow wider past 99 hours.
///
/// # Panics
///
/// Panics on negative or non-finite input.
pub fn format_timecode(seconds: f64) -> String {
    assert!(
        seconds.is_finite() && seconds >= 0.0,
        "timecode seconds must be finite and non-negative, got {seconds}"
    );

    let total_ms = (seconds * 1000.0) as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Greedily packs whitespace-separated words into chunks of at most
/// `max_chars` characters. A word longer than the limit stands alone.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Lays out one cue per chunk. Each entry is a scene's duration and its chunks.
///
/// A scene without chunks emits nothing but still advances the cursor.
pub fn schedule_cues(scenes: &[(f64, Vec<String>)]) -> Vec<SubtitleCue> {
    let mut cues = Vec::new();
    let mut cursor = 0.0_f64;

    for (duration, chunks) in scenes {
        let k = chunks.len();
        if k > 0 {
            let slot = duration / k as f64;
            for (j, chunk) in chunks.iter().enumerate() {
                cues.push(SubtitleCue {
                    index: cues.len() + 1,
                    start: cursor + slot * j as f64,
                    end: cursor + slot * (j + 1) as f64,
                    text: chunk.clone(),
                });
            }
        }
        cursor += duration;
    }

    cues
}

/// Chunks every scene's narration and schedules the resulting cues.
pub fn build_cues(scenes: &[Scene], max_chars: usize) -> Vec<SubtitleCue> {
    let chunked: Vec<(f64, Vec<String>)> = scenes
        .iter()
        .map(|scene| (scene.duration, chunk_text(&scene.narration, max_chars)))
        .collect();
    schedule_cues(&chunked)
}

pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            cue.start_timecode(),
            cue.end_timecode(),
            cue.text
        ));
    }
    out
}
