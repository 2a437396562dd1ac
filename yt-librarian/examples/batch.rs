//! Download every URL in a text file, two at a time, into ./library.
//!
//! Usage: cargo run --example batch -- urls.txt

use yt_librarian::{GenreMode, LibrarianOptions};

#[tokio::main]
async fn main() -> yt_librarian::Result<()> {
    let file = std::env::args()
        .nth(1)
        .expect("usage: batch <url-file>");

    yt_librarian::load_env_files(None)?;

    let opts = LibrarianOptions::from_env()
        .output_dir("library")
        .genre_mode(GenreMode::Freeform)
        .concurrency(2)?;

    let urls = yt_librarian::read_url_file(file.as_ref()).await?;
    let outcomes = yt_librarian::download_batch_with_options(&urls, &opts).await?;

    for outcome in outcomes {
        match outcome.result {
            Ok(path) => println!("ok    {} -> {}", outcome.url, path.display()),
            Err(e) => println!("error {}: {e}", outcome.url),
        }
    }

    Ok(())
}
