use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{truncate_stderr, Error, Result};
use crate::job::Job;
use crate::types::{VideoFilepaths, VideoInfo, AUDIO_EXTENSION};

/// Thumbnail extensions yt-dlp may write, in no particular preference.
const THUMBNAIL_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    description: Option<String>,
}

impl From<YtDlpInfo> for VideoInfo {
    fn from(info: YtDlpInfo) -> Self {
        VideoInfo {
            title: info.title.unwrap_or_default(),
            uploader: info.uploader.or(info.channel).unwrap_or_default(),
            description: info.description.unwrap_or_default(),
        }
    }
}

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https://.
pub(crate) fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::InvalidUrl(trimmed.to_string()))
    }
}

/// Download best audio as mp3 plus thumbnail and info sidecar into the job directory.
///
/// # Security
/// - URL is validated to start with http:// or https://
/// - Arguments are passed to yt-dlp via `.arg()` (no shell expansion)
/// - `--no-exec` prevents yt-dlp from running post-processing commands
pub async fn download_video(yt_dlp: &Path, job: &Job) -> Result<VideoFilepaths> {
    validate_url(&job.url)?;

    info!(url = %job.url, id = %job.id, "downloading audio");

    // Check yt-dlp is installed
    let check = tokio::process::Command::new(yt_dlp)
        .arg("--version")
        .output()
        .await;

    if check.is_err() {
        return Err(Error::YtDlpNotFound);
    }

    let output_template = job
        .dir
        .join(format!("{}.%(ext)s", job.id))
        .to_str()
        .ok_or_else(|| Error::Download("job directory path contains invalid UTF-8".into()))?
        .to_string();

    let output = tokio::process::Command::new(yt_dlp)
        .args([
            "-f",
            "bestaudio[ext=m4a]/bestaudio",
            "--extract-audio",
            "--audio-format",
            AUDIO_EXTENSION,
            "--write-thumbnail",
            "--write-info-json",
            "--no-playlist",
            "--no-exec",
            "-o",
            &output_template,
        ])
        .arg(job.url.trim())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Download(format!(
            "yt-dlp failed: {}",
            truncate_stderr(&output.stderr)
        )));
    }

    let audio_path = require_file(job.file(AUDIO_EXTENSION))?;
    let info_path = require_file(job.file("info.json"))?;
    let thumbnail_path = find_thumbnail(&job.dir)?;

    debug!(
        audio = %audio_path.display(),
        thumbnail = %thumbnail_path.display(),
        "download complete"
    );

    Ok(VideoFilepaths {
        audio_path,
        thumbnail_path,
        info_path,
        job_dir: job.dir.clone(),
    })
}

/// Parse the title, channel and description out of yt-dlp's info sidecar.
pub async fn read_video_info(info_path: &Path) -> Result<VideoInfo> {
    let bytes = tokio::fs::read(info_path).await?;
    let info: YtDlpInfo = serde_json::from_slice(&bytes)?;
    Ok(info.into())
}

fn require_file(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissingFile { path })
    }
}

/// First image file in `dir` (sorted by name) with a known thumbnail extension.
fn find_thumbnail(dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_thumbnail(p))
        .collect();

    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::ThumbnailNotFound {
            dir: dir.to_path_buf(),
        })
}

fn is_thumbnail(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            THUMBNAIL_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "yt_librarian_test_{name}_{}",
            uuid::Uuid::new_v4().simple()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_validate_url_https() {
        assert!(validate_url("https://youtube.com/watch?v=abc").is_ok());
    }

    #[test]
    fn test_validate_url_http_with_whitespace() {
        assert!(validate_url("  http://example.com/watch?v=abc\n").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_no_scheme() {
        assert!(validate_url("youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_validate_url_rejects_file_scheme() {
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_url_rejects_empty() {
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_validate_url_rejects_command() {
        assert!(validate_url("$(whoami)").is_err());
    }

    #[test]
    fn test_find_thumbnail_picks_image() {
        let dir = temp_dir("thumb_pick");
        fs::write(dir.join("abc.mp3"), b"audio").unwrap();
        fs::write(dir.join("abc.info.json"), b"{}").unwrap();
        fs::write(dir.join("abc.webp"), b"image").unwrap();

        let thumb = find_thumbnail(&dir).unwrap();
        assert_eq!(thumb, dir.join("abc.webp"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_find_thumbnail_case_insensitive() {
        let dir = temp_dir("thumb_case");
        fs::write(dir.join("abc.JPG"), b"image").unwrap();

        assert_eq!(find_thumbnail(&dir).unwrap(), dir.join("abc.JPG"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_find_thumbnail_missing_fails() {
        let dir = temp_dir("thumb_missing");
        fs::write(dir.join("abc.mp3"), b"audio").unwrap();
        fs::write(dir.join("abc.info.json"), b"{}").unwrap();

        let result = find_thumbnail(&dir);
        assert!(matches!(result, Err(Error::ThumbnailNotFound { .. })));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_require_file() {
        let dir = temp_dir("require");
        let present = dir.join("a.mp3");
        fs::write(&present, b"audio").unwrap();

        assert_eq!(require_file(present.clone()).unwrap(), present);
        assert!(matches!(
            require_file(dir.join("b.mp3")),
            Err(Error::MissingFile { .. })
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_read_video_info() {
        let dir = temp_dir("info");
        let path = dir.join("abc.info.json");
        fs::write(
            &path,
            r#"{"id": "abc", "title": "Artist - Song (Official Video)",
                "uploader": "ArtistVEVO", "channel": "Artist",
                "description": "Stream: https://example.com/stream", "duration": 215}"#,
        )
        .unwrap();

        let info = read_video_info(&path).await.unwrap();
        assert_eq!(info.title, "Artist - Song (Official Video)");
        assert_eq!(info.uploader, "ArtistVEVO");
        assert_eq!(info.description, "Stream: https://example.com/stream");

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_read_video_info_falls_back_to_channel() {
        let dir = temp_dir("info_channel");
        let path = dir.join("abc.info.json");
        fs::write(&path, r#"{"title": "Song", "channel": "Chan", "description": null}"#).unwrap();

        let info = read_video_info(&path).await.unwrap();
        assert_eq!(info.uploader, "Chan");
        assert_eq!(info.description, "");

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_download_rejects_invalid_url_before_spawning() {
        let root = temp_dir("dl_invalid");
        let job = Job::create("not-a-url", &root).await.unwrap();

        // A nonexistent binary would yield YtDlpNotFound if it were spawned.
        let result = download_video(Path::new("/nonexistent/yt-dlp"), &job).await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));

        fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_download_missing_binary() {
        let root = temp_dir("dl_missing_bin");
        let job = Job::create("https://example.com/watch?v=x", &root)
            .await
            .unwrap();

        let result = download_video(Path::new("/nonexistent/yt-dlp"), &job).await;
        assert!(matches!(result, Err(Error::YtDlpNotFound)));

        fs::remove_dir_all(&root).ok();
    }
}
