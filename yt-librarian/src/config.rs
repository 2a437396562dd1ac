use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Default completion endpoint base.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Environment variable holding the completion API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable overriding the completion endpoint base.
pub const API_BASE_VAR: &str = "OPENAI_BASE_URL";
/// Environment variable overriding the completion model.
pub const MODEL_VAR: &str = "YT_LIBRARIAN_MODEL";

/// How the `genre` field is constrained in the function schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreMode {
    /// The model must pick from [`GENRES`](crate::interpret::GENRES).
    #[default]
    Enumerated,
    /// Any genre string is accepted.
    Freeform,
}

impl fmt::Display for GenreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenreMode::Enumerated => write!(f, "enumerated"),
            GenreMode::Freeform => write!(f, "freeform"),
        }
    }
}

/// Builder for download-and-tag options.
#[derive(Debug, Clone)]
pub struct LibrarianOptions {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub genre_mode: GenreMode,
    /// Directory the final tagged files are written to.
    pub output_dir: PathBuf,
    /// Directory the per-job working directories are created in.
    pub work_dir: PathBuf,
    /// Maximum number of jobs in flight during a batch.
    pub concurrency: usize,
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
    /// Draw per-job progress spinners on stderr.
    pub progress: bool,
}

impl Default for LibrarianOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            genre_mode: GenreMode::default(),
            output_dir: PathBuf::from("."),
            work_dir: PathBuf::from("."),
            concurrency: 4,
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            progress: true,
        }
    }
}

impl LibrarianOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `OPENAI_API_KEY`, `OPENAI_BASE_URL` and
    /// `YT_LIBRARIAN_MODEL` from the process environment.
    pub fn from_env() -> Self {
        Self::default().apply_env(|name| std::env::var(name).ok())
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_VAR) {
            self.api_key = Some(key);
        }
        if let Some(base) = non_empty(API_BASE_VAR) {
            self.api_base = base;
        }
        if let Some(model) = non_empty(MODEL_VAR) {
            self.model = model;
        }
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn genre_mode(mut self, mode: GenreMode) -> Self {
        self.genre_mode = mode;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Set the batch worker pool size. Must be at least 1.
    pub fn concurrency(mut self, jobs: usize) -> Result<Self> {
        if jobs == 0 {
            return Err(Error::InvalidOption(
                "concurrency must be at least 1".into(),
            ));
        }
        self.concurrency = jobs;
        Ok(self)
    }

    pub fn yt_dlp(mut self, path: impl Into<PathBuf>) -> Self {
        self.yt_dlp = path.into();
        self
    }

    pub fn ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = path.into();
        self
    }

    pub fn progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// The explicit key if set, otherwise `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_VAR).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingApiKey)
    }

    /// Full URL of the chat completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// Per-user config file: `<config_dir>/yt-librarian/.env`.
pub fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("yt-librarian").join(".env"))
}

/// Load dotenv files into the process environment.
///
/// Variables that are already set are never overridden. An explicit path
/// must exist; otherwise `./.env` and then the per-user file are loaded
/// when present. Returns the files that were loaded.
pub fn load_env_files(explicit: Option<&Path>) -> Result<Vec<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::MissingFile {
                path: path.to_path_buf(),
            });
        }
        load_env_file(path)?;
        return Ok(vec![path.to_path_buf()]);
    }

    let candidates = std::iter::once(PathBuf::from(".env")).chain(user_env_file());

    let mut loaded = Vec::new();
    for path in candidates {
        if path.is_file() {
            load_env_file(&path)?;
            loaded.push(path);
        }
    }
    Ok(loaded)
}

fn load_env_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path).map_err(|e| {
        Error::InvalidOption(format!("failed to load {}: {e}", path.display()))
    })?;
    debug!(path = %path.display(), "loaded environment file");
    Ok(())
}
