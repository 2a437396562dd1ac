use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Separator used when several artists share one tag or filename.
pub const ARTIST_SEPARATOR: &str = ", ";

/// Extension of the final tagged file.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Files produced by the downloader for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFilepaths {
    pub audio_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub info_path: PathBuf,
    pub job_dir: PathBuf,
}

/// The subset of the downloader's JSON sidecar the interpreter needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: String,
    pub uploader: String,
    pub description: String,
}

/// Structured song tags inferred for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    /// Main artist first.
    pub artists: Vec<String>,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Producers and other contributors, `Name (Role), ...`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<String>,
}

impl Metadata {
    /// All artists joined for display and tagging.
    pub fn artist_line(&self) -> String {
        self.artists.join(ARTIST_SEPARATOR)
    }

    /// `"<artists> - <title>.mp3"`, safe to use as a single path component.
    pub fn output_filename(&self) -> String {
        sanitize_filename(&format!(
            "{} - {}.{AUDIO_EXTENSION}",
            self.artist_line(),
            self.title
        ))
    }

    /// Pretty JSON used to echo the record while a job runs.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} [{}]", self.artist_line(), self.title, self.album)?;
        if let Some(year) = self.year {
            write!(f, " ({year})")?;
        }
        Ok(())
    }
}

/// Replace characters that would break the output path.
pub fn sanitize_filename(name: &str) -> String {
    name.replace('/', "|").replace('"', "'")
}
