use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::ffmpeg;

/// Extension of the embedded cover image.
pub const COVER_EXTENSION: &str = "jpg";

/// Centered square crop with side `min(width, height)`.
const SQUARE_CROP: &str = "crop='min(iw,ih)':'min(iw,ih)'";

/// Convert a thumbnail to JPEG if needed, then crop it to a centered square.
///
/// Returns the path of the square JPEG, which sits next to the thumbnail.
pub async fn normalize_cover(ffmpeg: &Path, thumbnail: &Path) -> Result<PathBuf> {
    info!(path = %thumbnail.display(), "preparing cover");

    let jpg = thumbnail.with_extension(COVER_EXTENSION);

    let is_jpg = thumbnail
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext == COVER_EXTENSION);

    if !is_jpg {
        debug!(from = %thumbnail.display(), to = %jpg.display(), "converting thumbnail");
        ffmpeg::run(
            ffmpeg,
            [
                OsStr::new("-y"),
                OsStr::new("-i"),
                thumbnail.as_os_str(),
                OsStr::new("-frames:v"),
                OsStr::new("1"),
                jpg.as_os_str(),
            ],
        )
        .await?;
    }

    // ffmpeg must not read and write the same file, so crop into a sibling first.
    let cropped = jpg.with_extension(format!("square.{COVER_EXTENSION}"));
    ffmpeg::run(
        ffmpeg,
        [
            OsStr::new("-y"),
            OsStr::new("-i"),
            jpg.as_os_str(),
            OsStr::new("-vf"),
            OsStr::new(SQUARE_CROP),
            OsStr::new("-frames:v"),
            OsStr::new("1"),
            cropped.as_os_str(),
        ],
    )
    .await?;
    tokio::fs::rename(&cropped, &jpg).await?;

    Ok(jpg)
}
