use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::ffmpeg;
use crate::types::Metadata;

/// Build the ffmpeg arguments that stream-copy `audio`, attach `cover` as the
/// front cover and write the song tags into `output`.
///
/// Arguments are passed as argv without a shell, so tag values need no quoting.
pub fn tag_args(
    audio: &Path,
    cover: &Path,
    metadata: &Metadata,
    source_url: &str,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        audio.into(),
        "-i".into(),
        cover.into(),
    ];

    args.extend(
        [
            "-map",
            "0:a",
            "-map",
            "1:0",
            "-c",
            "copy",
            "-id3v2_version",
            "3",
            "-metadata:s:v",
            "title=Album cover",
            "-metadata:s:v",
            "comment=Cover (front)",
            "-disposition:v:0",
            "attached_pic",
        ]
        .map(OsString::from),
    );

    let mut tag = |key: &str, value: &str| {
        args.push("-metadata".into());
        args.push(format!("{key}={value}").into());
    };

    tag("title", &metadata.title);
    tag("artist", &metadata.artist_line());
    tag("album", &metadata.album);
    if let Some(year) = metadata.year {
        tag("date", &year.to_string());
    }
    if let Some(genre) = &metadata.genre {
        tag("genre", genre);
    }
    if let Some(contributors) = &metadata.contributors {
        tag("comment", contributors);
    }
    tag("source_url", source_url.trim());

    args.push(output.into());
    args
}

/// Write the tagged file into `output_dir` and return its path.
pub async fn embed_tags(
    ffmpeg: &Path,
    audio: &Path,
    cover: &Path,
    metadata: &Metadata,
    source_url: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;
    let output = output_dir.join(metadata.output_filename());

    info!(output = %output.display(), "writing tags");

    ffmpeg::run(ffmpeg, tag_args(audio, cover, metadata, source_url, &output)).await?;

    if !output.is_file() {
        return Err(Error::MissingFile { path: output });
    }
    Ok(output)
}
