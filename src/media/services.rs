use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use super::staging::StagedFile;
use crate::state::AppState;

/// Result of a successful upload to the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub key: String,
    pub url: String,
}

/// Push a staged file to the media host under `folder/`.
///
/// Returns `None` when there is no file or the upload fails; callers decide
/// whether that is fatal. The staged copy is removed either way.
pub async fn upload_staged(
    st: &AppState,
    file: Option<&StagedFile>,
    folder: &str,
) -> Option<UploadedMedia> {
    let file = file?;
    let res = push(st, file, folder).await;
    file.discard().await;

    match res {
        Ok(media) => {
            info!(key = %media.key, "media uploaded");
            Some(media)
        }
        Err(e) => {
            warn!(error = %e, path = %file.path.display(), "media upload failed");
            None
        }
    }
}

async fn push(st: &AppState, file: &StagedFile, folder: &str) -> anyhow::Result<UploadedMedia> {
    let body = tokio::fs::read(&file.path)
        .await
        .with_context(|| format!("read staged file {}", file.path.display()))?;

    let ext = file
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let key = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);

    st.storage
        .put_object(&key, Bytes::from(body), &file.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let url = st.storage.public_url(&key);
    Ok(UploadedMedia { key, url })
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
