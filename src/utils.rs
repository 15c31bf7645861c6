//! Utility functions for destination path construction

use crate::types::WorkItem;
use std::path::{Path, PathBuf};

/// Suffix of the scratch file a download streams into before it is complete
const PART_SUFFIX: &str = "part";

/// Destination file for a clip: `{dir}/{game_id}_{play_id}.{ext}`
///
/// Both identifiers are percent-encoded, and `_` inside an identifier is encoded
/// as `%5F`, so the separator is unambiguous and distinct items never share a
/// path. Identifiers containing `/` or `..` cannot leave `dir`.
///
/// # Examples
///
/// ```
/// use savant_dl::utils::clip_path;
/// use savant_dl::WorkItem;
/// use std::path::Path;
///
/// let item = WorkItem::new("745123", "9e1b3c2a-0000-4f1e-a9c1-1b2c3d4e5f60");
/// let path = clip_path(Path::new("/clips"), &item, "mp4");
/// assert_eq!(
///     path,
///     Path::new("/clips/745123_9e1b3c2a-0000-4f1e-a9c1-1b2c3d4e5f60.mp4")
/// );
/// ```
#[must_use]
pub fn clip_path(dir: &Path, item: &WorkItem, extension: &str) -> PathBuf {
    dir.join(format!(
        "{}_{}.{}",
        encode_component(&item.game_id),
        encode_component(&item.play_id),
        extension
    ))
}

/// Scratch path next to `destination` used while bytes are still arriving
#[must_use]
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PART_SUFFIX);
    destination.with_file_name(name)
}

fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw).replace('_', "%5F")
}
