//! Upload and download commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::info;

use shortfs_chain::{ChainConfig, Download, ShortLinkService, validate_file_name};

/// Uploads the file at `path` and returns the header URL.
pub async fn upload(
    service: &dyn ShortLinkService,
    chain: ChainConfig,
    path: &Path,
    password: &str,
) -> anyhow::Result<String> {
    let name = file_name_of(path)?;
    let payload =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let url = shortfs_chain::upload(service, chain, name, &payload, password).await?;
    Ok(url)
}

/// Downloads the chain at `url` into `output_dir` and returns the written path.
///
/// Nothing is written unless the whole chain was read and decoded.
pub async fn download(
    service: &dyn ShortLinkService,
    chain: ChainConfig,
    url: &str,
    password: &str,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let download = shortfs_chain::download(service, chain, url, password).await?;
    write_output(output_dir, &download)
}

/// Returns the bare file name used as the header's name.
fn file_name_of(path: &Path) -> anyhow::Result<&str> {
    let Some(name) = path.file_name() else {
        bail!("{} has no file name", path.display());
    };
    let name = name
        .to_str()
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    validate_file_name(name)?;
    Ok(name)
}

fn write_output(output_dir: &Path, download: &Download) -> anyhow::Result<PathBuf> {
    // Already checked when the header was parsed; the join must stay inside
    // `output_dir` whatever the caller handed in.
    validate_file_name(&download.file_name)?;

    let path = output_dir.join(&download.file_name);
    std::fs::write(&path, &download.data)
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), bytes = download.data.len(), "file written");
    Ok(path)
}
