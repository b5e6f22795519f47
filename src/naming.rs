//! Output file naming.

use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Extension of every file this tool writes
pub const SAVE_EXT: &str = "avi";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Builds `{save_dir}/{stem}-{timestamp}.{ext}` for `video_path`.
///
/// `stem` is the file name up to its last `.`; a name without an extension
/// is used whole. No I/O is performed, so two calls within the same second
/// for the same input give the same path.
pub fn save_path(video_path: &Path, save_dir: &Path, ext: &str, now: NaiveDateTime) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let timestamp = now.format(TIMESTAMP_FORMAT);
    save_dir.join(format!("{stem}-{timestamp}.{ext}"))
}

/// [`save_path`] stamped with the local wall clock.
pub fn save_path_now(video_path: &Path, save_dir: &Path, ext: &str) -> PathBuf {
    save_path(video_path, save_dir, ext, Local::now().naive_local())
}
