use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// NFC-normalizes a filesystem path, preserving case. Filepath identity is
/// case-sensitive by invariant: callers must never compare paths with a
/// case-insensitive fold, only via this canonical NFC form.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.to_string_lossy().nfc().collect::<String>().into()
}

/// Trims incidental whitespace and applies NFC normalization to a display
/// string (track/album/genre title, artist name, playlist title). Case is
/// preserved — titles are user-facing text, not comparison keys.
pub fn normalize_title(name: &str) -> String {
    name.trim().nfc().collect()
}
