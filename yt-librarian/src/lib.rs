//! Download songs from video URLs with inferred tags and square cover art.
//!
//! **yt-librarian** runs a short pipeline per URL: download best audio as mp3
//! plus thumbnail and info sidecar (via yt-dlp), infer title/artists/album/year/genre
//! from the video text with a forced function call against a chat completion API,
//! crop the thumbnail to a square JPEG and embed everything as ID3 tags (via ffmpeg).
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> yt_librarian::Result<()> {
//! // Needs OPENAI_API_KEY in the environment
//! let path = yt_librarian::download_and_tag("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub(crate) mod cover;
pub(crate) mod download;
pub mod error;
pub(crate) mod ffmpeg;
pub mod interpret;
pub mod job;
pub mod pipeline;
pub mod tag;
pub mod types;

pub use config::{load_env_files, GenreMode, LibrarianOptions};
pub use error::{Error, Result};
pub use pipeline::{parse_url_list, read_url_file, BatchOutcome, Librarian, Stage};
pub use types::{Metadata, VideoFilepaths, VideoInfo};

use std::path::PathBuf;

/// Download and tag one URL with options from the environment.
pub async fn download_and_tag(url: &str) -> Result<PathBuf> {
    download_and_tag_with_options(url, &LibrarianOptions::from_env()).await
}

/// Download and tag one URL with custom options.
pub async fn download_and_tag_with_options(
    url: &str,
    options: &LibrarianOptions,
) -> Result<PathBuf> {
    Librarian::new(options.clone())?.download_and_tag(url).await
}

/// Download and tag many URLs through a bounded worker pool.
pub async fn download_batch_with_options(
    urls: &[String],
    options: &LibrarianOptions,
) -> Result<Vec<BatchOutcome>> {
    Ok(Librarian::new(options.clone())?.download_batch(urls).await)
}
