use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use super::services::ext_from_mime;

/// An uploaded file written to local disk, waiting to be pushed to the media host.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub content_type: String,
}

impl StagedFile {
    /// Remove the local copy; a file that is already gone is fine.
    pub async fn discard(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to remove staged file")
            }
        }
    }
}

pub async fn stage_bytes(
    dir: &Path,
    file_name: Option<&str>,
    content_type: &str,
    body: Bytes,
) -> anyhow::Result<StagedFile> {
    let ext = ext_from_mime(content_type)
        .map(str::to_string)
        .or_else(|| ext_from_file_name(file_name?))
        .unwrap_or_else(|| "bin".into());
    let path = dir.join(format!("{}.{}", Uuid::new_v4(), ext));

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create upload dir {}", dir.display()))?;
    tokio::fs::write(&path, &body)
        .await
        .with_context(|| format!("write staged file {}", path.display()))?;

    tracing::debug!(path = %path.display(), bytes = body.len(), "file staged");
    Ok(StagedFile {
        path,
        content_type: content_type.to_string(),
    })
}

fn ext_from_file_name(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}
