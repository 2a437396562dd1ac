use std::ffi::OsStr;
use std::path::Path;

use tracing::debug;

use crate::error::{truncate_stderr, Error, Result};

/// Run ffmpeg quietly with `args`, failing on a non-zero exit.
pub(crate) async fn run<I, S>(ffmpeg: &Path, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = tokio::process::Command::new(ffmpeg);
    command
        .args(["-nostdin", "-hide_banner", "-loglevel", "error"])
        .args(args);

    debug!(command = ?command.as_std(), "running ffmpeg");

    let output = command.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FfmpegNotFound
        } else {
            Error::Ffmpeg(format!("failed to run ffmpeg: {e}"))
        }
    })?;

    if !output.status.success() {
        return Err(Error::Ffmpeg(format!(
            "ffmpeg failed ({}): {}",
            output.status,
            truncate_stderr(&output.stderr)
        )));
    }

    Ok(())
}
