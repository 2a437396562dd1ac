use std::path::PathBuf;

/// All errors that can occur in yt-librarian.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid URL (must start with http:// or https://): {0}")]
    InvalidUrl(String),

    #[error("yt-dlp not found — install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("download error: {0}")]
    Download(String),

    #[error("no thumbnail (png, jpg, jpeg or webp) found in {dir}")]
    ThumbnailNotFound { dir: PathBuf },

    #[error("expected file not found: {path}")]
    MissingFile { path: PathBuf },

    #[error("ffmpeg not found — install with: apt install ffmpeg")]
    FfmpegNotFound,

    #[error("ffmpeg error: {0}")]
    Ffmpeg(String),

    #[error("no API key — set OPENAI_API_KEY or add it to a .env file")]
    MissingApiKey,

    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not parse metadata: response contained no function call")]
    NoFunctionCall,

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Keep process stderr readable in error messages.
pub(crate) fn truncate_stderr(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .trim()
        .chars()
        .take(1000)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_url() {
        let e = Error::InvalidUrl("ftp://example.com".into());
        let msg = e.to_string();
        assert!(msg.contains("ftp://example.com"));
        assert!(msg.contains("http://"));
    }

    #[test]
    fn test_error_display_thumbnail_not_found() {
        let e = Error::ThumbnailNotFound {
            dir: PathBuf::from("/tmp/job123"),
        };
        assert!(e.to_string().contains("/tmp/job123"));
    }

    #[test]
    fn test_error_display_api() {
        let e = Error::Api {
            status: 401,
            message: "invalid api key".into(),
        };
        assert_eq!(e.to_string(), "completion API returned 401: invalid api key");
    }

    #[test]
    fn test_error_display_no_function_call() {
        let e = Error::NoFunctionCall;
        assert!(e.to_string().contains("no function call"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<String>("invalid json").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Json(_)));
    }

    #[test]
    fn test_truncate_stderr_limits_length() {
        let long = vec![b'x'; 5000];
        assert_eq!(truncate_stderr(&long).len(), 1000);
        assert_eq!(truncate_stderr(b"  boom\n"), "boom");
    }
}
