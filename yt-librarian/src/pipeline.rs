use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::LibrarianOptions;
use crate::cover::normalize_cover;
use crate::download::{download_video, read_video_info, validate_url};
use crate::error::Result;
use crate::interpret::MetadataClient;
use crate::job::{remove_job_dir, Job};
use crate::tag::embed_tags;
use crate::types::{Metadata, VideoFilepaths};

/// The five steps every job walks through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Interpret,
    Cover,
    Tag,
    Cleanup,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Download,
        Stage::Interpret,
        Stage::Cover,
        Stage::Tag,
        Stage::Cleanup,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Download => "Download video as mp3",
            Stage::Interpret => "Parse metadata",
            Stage::Cover => "Prepare thumbnail",
            Stage::Tag => "Add metatags to MP3",
            Stage::Cleanup => "Clean temporary files",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Each stage consumes the previous record and returns a richer one.

struct Fetched {
    paths: VideoFilepaths,
}

struct Interpreted {
    paths: VideoFilepaths,
    metadata: Metadata,
}

struct CoverReady {
    paths: VideoFilepaths,
    metadata: Metadata,
    cover: PathBuf,
}

struct Tagged {
    output: PathBuf,
    job_dir: PathBuf,
}

/// Result of one job in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub url: String,
    pub result: Result<PathBuf>,
}

/// Runs download-and-tag jobs with one shared completion client.
pub struct Librarian {
    options: LibrarianOptions,
    client: MetadataClient,
    progress: MultiProgress,
}

impl Librarian {
    /// Fails fast with [`Error::MissingApiKey`](crate::Error::MissingApiKey)
    /// before any job touches the filesystem.
    pub fn new(options: LibrarianOptions) -> Result<Self> {
        let client = MetadataClient::new(&options)?;
        Ok(Self {
            options,
            client,
            progress: MultiProgress::new(),
        })
    }

    /// Download one URL and write `"<artist> - <title>.mp3"` into the output directory.
    ///
    /// The job directory is removed after tagging succeeds. A failed job
    /// leaves it behind for inspection.
    pub async fn download_and_tag(&self, url: &str) -> Result<PathBuf> {
        let url = url.trim();
        let bar = self.job_bar(url);

        if let Err(e) = validate_url(url) {
            bar.abandon_with_message(format!("failed: {e}"));
            return Err(e);
        }

        let job = match Job::create(url, &self.options.work_dir).await {
            Ok(job) => job,
            Err(e) => {
                bar.abandon_with_message(format!("failed: {e}"));
                return Err(e);
            }
        };

        match self.run_stages(&job, &bar).await {
            Ok(output) => {
                info!(%url, output = %output.display(), "job complete");
                bar.finish_with_message(format!("done: {}", display_name(&output)));
                Ok(output)
            }
            Err(e) => {
                warn!(
                    %url,
                    job_dir = %job.dir.display(),
                    error = %e,
                    "job failed, keeping job directory"
                );
                bar.abandon_with_message(format!("failed: {e}"));
                Err(e)
            }
        }
    }

    /// Run every URL through a worker pool of `concurrency` jobs.
    ///
    /// A failing job never stops its siblings. Outcomes come back in input order.
    pub async fn download_batch(&self, urls: &[String]) -> Vec<BatchOutcome> {
        info!(jobs = urls.len(), concurrency = self.options.concurrency, "starting batch");

        let mut outcomes: Vec<(usize, BatchOutcome)> = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| async move {
                let result = self.download_and_tag(url).await;
                (
                    index,
                    BatchOutcome {
                        url: url.clone(),
                        result,
                    },
                )
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    async fn run_stages(&self, job: &Job, bar: &ProgressBar) -> Result<PathBuf> {
        bar.set_message(Stage::Download.label());
        let fetched = self.fetch(job).await?;

        bar.set_message(Stage::Interpret.label());
        let interpreted = self.interpret(fetched, bar).await?;

        bar.set_message(Stage::Cover.label());
        let ready = self.prepare_cover(interpreted).await?;

        bar.set_message(Stage::Tag.label());
        let tagged = self.tag(ready, &job.url).await?;

        bar.set_message(Stage::Cleanup.label());
        if let Err(e) = remove_job_dir(&tagged.job_dir).await {
            warn!(path = %tagged.job_dir.display(), error = %e, "failed to clean up job dir");
        }

        Ok(tagged.output)
    }

    async fn fetch(&self, job: &Job) -> Result<Fetched> {
        let paths = download_video(&self.options.yt_dlp, job).await?;
        Ok(Fetched { paths })
    }

    async fn interpret(&self, fetched: Fetched, bar: &ProgressBar) -> Result<Interpreted> {
        let info = read_video_info(&fetched.paths.info_path).await?;
        let metadata = self.client.interpret(&info).await?;

        info!(%metadata, "parsed metadata");
        echo(bar, &metadata.to_json_pretty()?);

        Ok(Interpreted {
            paths: fetched.paths,
            metadata,
        })
    }

    async fn prepare_cover(&self, interpreted: Interpreted) -> Result<CoverReady> {
        let cover = normalize_cover(&self.options.ffmpeg, &interpreted.paths.thumbnail_path).await?;
        Ok(CoverReady {
            paths: interpreted.paths,
            metadata: interpreted.metadata,
            cover,
        })
    }

    async fn tag(&self, ready: CoverReady, url: &str) -> Result<Tagged> {
        let output = embed_tags(
            &self.options.ffmpeg,
            &ready.paths.audio_path,
            &ready.cover,
            &ready.metadata,
            url,
            &self.options.output_dir,
        )
        .await?;
        Ok(Tagged {
            output,
            job_dir: ready.paths.job_dir,
        })
    }

    fn job_bar(&self, url: &str) -> ProgressBar {
        if !self.options.progress {
            return ProgressBar::hidden();
        }

        let bar = self.progress.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed}] {prefix:.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(url.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

/// Split a URL list on whitespace, commas and semicolons.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Read and split a URL list file.
pub async fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_url_list(&text))
}

/// Print above the job's spinner, or straight to stderr when spinners are hidden.
fn echo(bar: &ProgressBar, text: &str) {
    if bar.is_hidden() {
        eprintln!("{text}");
    } else {
        bar.println(text);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}
