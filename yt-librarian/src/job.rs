use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// One end-to-end run of the pipeline for a single URL.
///
/// The identifier is a fresh UUID v4 and doubles as the working directory
/// name and the filename stem of everything the downloader writes.
#[derive(Debug, Clone)]
pub struct Job {
    pub url: String,
    pub id: String,
    pub dir: PathBuf,
}

impl Job {
    /// Allocate an identifier and create `work_dir/<id>`.
    ///
    /// The job directory is created non-recursively so an identifier
    /// collision fails rather than sharing a directory.
    pub async fn create(url: &str, work_dir: &Path) -> Result<Self> {
        let id = Uuid::new_v4().simple().to_string();

        tokio::fs::create_dir_all(work_dir).await?;
        let dir = std::path::absolute(work_dir.join(&id))?;
        tokio::fs::create_dir(&dir).await?;

        debug!(%id, dir = %dir.display(), "created job directory");

        Ok(Self {
            url: url.to_string(),
            id,
            dir,
        })
    }

    /// Path of a file inside the job directory named `<id>.<extension>`.
    pub fn file(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{extension}", self.id))
    }

}

/// Remove a job directory. A directory that is already gone is fine.
pub async fn remove_job_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "yt_librarian_test_{name}_{}",
            Uuid::new_v4().simple()
        ))
    }

    #[tokio::test]
    async fn test_create_makes_directory() {
        let root = work_root("job_create");
        let job = Job::create("https://example.com/v", &root).await.unwrap();

        assert!(job.dir.is_dir());
        assert!(job.dir.is_absolute());
        assert_eq!(job.dir.file_name().unwrap().to_str().unwrap(), job.id);
        assert_eq!(job.url, "https://example.com/v");

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_ids_are_filename_safe() {
        let root = work_root("job_safe");
        let job = Job::create("https://example.com/v", &root).await.unwrap();

        assert_eq!(job.id.len(), 32);
        assert!(job.id.chars().all(|c| c.is_ascii_hexdigit()));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_same_url_gets_fresh_directories() {
        let root = work_root("job_fresh");
        let a = Job::create("https://example.com/same", &root).await.unwrap();
        let b = Job::create("https://example.com/same", &root).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.dir, b.dir);
        assert!(a.dir.is_dir() && b.dir.is_dir());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_file_naming() {
        let root = work_root("job_file");
        let job = Job::create("https://example.com/v", &root).await.unwrap();

        assert_eq!(job.file("mp3"), job.dir.join(format!("{}.mp3", job.id)));
        assert_eq!(
            job.file("info.json"),
            job.dir.join(format!("{}.info.json", job.id))
        );

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_remove_dir_is_idempotent() {
        let root = work_root("job_remove");
        let job = Job::create("https://example.com/v", &root).await.unwrap();
        std::fs::write(job.file("mp3"), b"audio").unwrap();

        remove_job_dir(&job.dir).await.unwrap();
        assert!(!job.dir.exists());
        remove_job_dir(&job.dir).await.unwrap();

        std::fs::remove_dir_all(&root).ok();
    }
}
