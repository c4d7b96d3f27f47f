pub mod doctor;
pub mod entries;
pub mod export;
pub mod insights;
pub mod note;
pub mod reset;
pub mod write;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use memoir::config::{expand_tilde, MemoirConfig};
use memoir::db;

/// Open the configured journal database.
pub(crate) fn open_db(config: &MemoirConfig) -> Result<Connection> {
    let db_path = config.resolved_db_path();
    db::open_database(&db_path)
        .with_context(|| format!("failed to open journal at {}", db_path.display()))
}

/// Download the ONNX models and tokenizers each local provider needs.
pub async fn model_download(config: &MemoirConfig) -> Result<()> {
    let mut wanted = vec![(
        "embedding",
        config.embedding.repo.as_str(),
        config.embedding.cache_dir.as_str(),
    )];
    if config.classifier.provider == "local" {
        wanted.push((
            "sentiment",
            config.classifier.repo.as_str(),
            config.classifier.cache_dir.as_str(),
        ));
    }

    for (label, repo, cache_dir) in wanted {
        println!("{label} model: {repo}");
        download_repo(repo, &expand_tilde(cache_dir)).await?;
    }

    println!("Model download complete. Ready for use.");
    Ok(())
}

async fn download_repo(repo: &str, cache_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

    let files = [
        ("model.onnx", format!("https://huggingface.co/{repo}/resolve/main/onnx/model.onnx")),
        ("tokenizer.json", format!("https://huggingface.co/{repo}/resolve/main/tokenizer.json")),
    ];

    for (name, url) in files {
        let dest = cache_dir.join(name);
        if dest.exists() {
            println!("  {name} already exists at {}", dest.display());
            continue;
        }
        println!("  Downloading {name}...");
        download_file(&url, &dest).await?;
        println!("  {name} saved to {}", dest.display());
    }
    Ok(())
}

/// Download a file from a URL with progress bar. Uses atomic write (tmp + rename).
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download of {url} failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    let bytes = response.bytes().await.context("error reading response")?;
    pb.inc(bytes.len() as u64);
    file.write_all(&bytes)
        .await
        .context("error writing to file")?;

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
