use crate::scarletbook::{ScarletBook, Track};
use lazy_static::lazy_static;
use regex::Regex;

const MAX_NAME_LEN: usize = 120;

/// Replaces characters that are invalid on common filesystems with `_`.
pub fn sanitize(name: &str) -> String {
    lazy_static! {
        static ref INVALID: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap();
    }
    let replaced = INVALID.replace_all(name.trim(), "_");
    let truncated: String = replaced.chars().take(MAX_NAME_LEN).collect();
    // Windows drops trailing dots and spaces
    truncated.trim_end_matches(['.', ' ']).to_string()
}

/// `NN - Title.ext`, with `Track NN` when the track has no title of its own.
pub fn track_file_name(track: &Track<'_>, extension: &str) -> String {
    let title = track
        .title(true)
        .map(sanitize)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Track {:02}", track.number()));
    format!("{:02} - {}.{}", track.number(), title, extension)
}

/// File name used when a whole area goes into one file.
pub fn album_file_name(book: &ScarletBook, extension: &str) -> String {
    let album = book
        .album_title()
        .map(sanitize)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Album".to_string());
    format!("{album}.{extension}")
}
