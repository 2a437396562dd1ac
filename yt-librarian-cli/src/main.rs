use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use yt_librarian::{GenreMode, Librarian, LibrarianOptions};

#[derive(Parser)]
#[command(
    name = "yt-librarian",
    version,
    about = "Download YouTube songs with automatic mp3 metadata and cover photos."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Video URL to download (same as `download <URL>`).
    url: Option<String>,

    /// Directory for the tagged mp3 files.
    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Directory for temporary per-job folders.
    #[arg(long, global = true, default_value = ".")]
    work_dir: PathBuf,

    /// Maximum number of downloads running at once.
    #[arg(short, long, global = true, default_value = "4")]
    jobs: usize,

    /// Completion model (default: $YT_LIBRARIAN_MODEL or gpt-3.5-turbo).
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Completion API base URL (default: $OPENAI_BASE_URL or OpenAI).
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Let the model choose any genre instead of the fixed list.
    #[arg(long, global = true)]
    free_genre: bool,

    /// Load environment variables from this file instead of ./.env.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Path to the yt-dlp executable.
    #[arg(long, global = true, default_value = "yt-dlp")]
    yt_dlp: PathBuf,

    /// Path to the ffmpeg executable.
    #[arg(long, global = true, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Disable progress spinners.
    #[arg(long, global = true)]
    no_progress: bool,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Downloads the video at the specified YouTube video URL.
    Download {
        url: String,
    },
    /// Downloads all videos from links listed in a text file.
    MultiDownload {
        /// File of URLs separated by whitespace, commas or semicolons.
        file: PathBuf,
    },
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level for the library.
fn log_filter(rust_log: Option<&str>, verbose: u8) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    EnvFilter::new(format!("yt_librarian={level}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Environment files first so a RUST_LOG set there reaches the filter.
    let env_files = yt_librarian::load_env_files(cli.env_file.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            std::env::var("RUST_LOG").ok().as_deref(),
            cli.verbose,
        ))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = env_files {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let command = match (cli.command, cli.url) {
        (Some(command), _) => command,
        (None, Some(url)) => Command::Download { url },
        (None, None) => {
            eprintln!("Error: no URL given");
            eprintln!("Usage: yt-librarian <URL> or yt-librarian multi-download <FILE>");
            std::process::exit(2);
        }
    };

    let mut opts = match LibrarianOptions::from_env().concurrency(cli.jobs) {
        Ok(o) => o
            .output_dir(cli.output_dir)
            .work_dir(cli.work_dir)
            .yt_dlp(cli.yt_dlp)
            .ffmpeg(cli.ffmpeg)
            .progress(!cli.no_progress),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(model) = cli.model {
        opts = opts.model(model);
    }
    if let Some(base) = cli.api_base {
        opts = opts.api_base(base);
    }
    if cli.free_genre {
        opts = opts.genre_mode(GenreMode::Freeform);
    }

    let librarian = match Librarian::new(opts) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match command {
        Command::Download { url } => match librarian.download_and_tag(&url).await {
            Ok(path) => eprintln!("Written to {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        Command::MultiDownload { file } => {
            let urls = match yt_librarian::read_url_file(&file).await {
                Ok(urls) => urls,
                Err(e) => {
                    eprintln!("Error reading {}: {e}", file.display());
                    std::process::exit(1);
                }
            };
            if urls.is_empty() {
                eprintln!("No URLs found in {}", file.display());
                return;
            }

            let outcomes = librarian.download_batch(&urls).await;

            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(path) => eprintln!("{} -> {}", outcome.url, path.display()),
                    Err(e) => {
                        failed += 1;
                        eprintln!("Error: {}: {e}", outcome.url);
                    }
                }
            }
            eprintln!(
                "{} succeeded, {} failed",
                outcomes.len() - failed,
                failed
            );
            if failed > 0 {
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_keeps_rust_log() {
        assert_eq!(
            log_filter(Some("yt_librarian=debug"), 0).to_string(),
            "yt_librarian=debug"
        );
    }

    #[test]
    fn test_log_filter_defaults_from_verbosity() {
        assert_eq!(log_filter(None, 0).to_string(), "yt_librarian=warn");
        assert_eq!(log_filter(None, 1).to_string(), "yt_librarian=info");
        assert_eq!(log_filter(Some(" "), 2).to_string(), "yt_librarian=debug");
    }

    #[test]
    fn test_bare_url_parses_without_subcommand() {
        let cli = Cli::try_parse_from(["yt-librarian", "-v", "https://example.com/watch?v=a"])
            .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.url.as_deref(), Some("https://example.com/watch?v=a"));
        assert_eq!(cli.verbose, 1);
    }
}
