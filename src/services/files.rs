//! File attachment endpoints. Uploads are multipart; downloads are binary
//! GETs that require the bearer header and land in a scratch file so the
//! bytes never sit in memory longer than needed and never leak on disk.

use crate::api::{decode, ApiClient, ApiError};
use crate::util::scratch::ScratchFile;
use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: i64,
    pub post_id: i64,
    pub storage_url: String,
    pub original_filename: String,
    pub file_size: u64,
    pub content_type: String,
    pub created_at: String,
}

/// Attachments of a post.
pub async fn list(client: &ApiClient, post_id: i64) -> Result<Vec<FileResponse>, ApiError> {
    decode(client.get(&format!("/posts/{post_id}/files")).await?)
}

/// Uploads one attachment. The part carries the caller's content type; the
/// request itself is multipart and never typed as JSON.
///
/// # Errors
/// `ApiError::Serialization` when the part cannot be built.
pub async fn upload(
    client: &ApiClient,
    post_id: i64,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<FileResponse, ApiError> {
    let part = Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(content_type)
        .map_err(|err| ApiError::Serialization(format!("Failed to build upload part: {err}")))?;
    let form = Form::new()
        .text("postId", post_id.to_string())
        .part("file", part);

    decode(client.post_multipart("/files", form).await?)
}

/// A downloaded attachment landed in a scratch file, plus the name the
/// server advertised for it.
#[derive(Debug)]
pub struct Download {
    pub scratch: ScratchFile,
    pub file_name: String,
}

/// Downloads a file into `scratch_dir`. The returned handle revokes the
/// bytes on drop or after the bounded delay; call
/// [`ScratchFile::keep`] to hand the file over permanently.
///
/// # Errors
/// Pipeline errors for the HTTP leg, I/O errors for materialization.
pub async fn download(client: &ApiClient, file_id: i64, scratch_dir: &Path) -> Result<Download> {
    let response = client.download(&format!("/files/{file_id}/download")).await?;
    let file_name = response
        .file_name
        .unwrap_or_else(|| format!("file-{file_id}"));
    let scratch = ScratchFile::materialize(scratch_dir, &file_name, &response.bytes)?;
    Ok(Download { scratch, file_name })
}
