//! Download one song and print where the tagged mp3 landed.
//!
//! Usage: cargo run --example basic -- https://www.youtube.com/watch?v=...

#[tokio::main]
async fn main() -> yt_librarian::Result<()> {
    let url = std::env::args()
        .nth(1)
        .expect("usage: basic <video-url>");

    yt_librarian::load_env_files(None)?;
    let path = yt_librarian::download_and_tag(&url).await?;

    println!("{}", path.display());

    Ok(())
}
