use crate::media::{MediaItem, MediaKind};

/// Builds an ffmpeg concat-demuxer list.
///
/// Entries are ordered by scene index; scenes with no media are skipped.
/// Only images carry a `duration` directive, videos play at their own length.
pub fn build_manifest(media: &[MediaItem]) -> String {
    let mut ordered: Vec<&MediaItem> = media.iter().collect();
    ordered.sort_by_key(|item| item.scene_index);

    let mut out = String::new();
    for item in ordered {
        out.push_str(&format!(
            "file '{}'\n",
            escape_concat_path(&item.source_path.display().to_string())
        ));
        if item.kind == MediaKind::Image {
            out.push_str(&format!("duration {}\n", item.duration));
        }
    }
    out
}

fn escape_concat_path(path: &str) -> String {
    path.replace('\'', r"'\''")
}
