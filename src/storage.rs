//! Profile photo storage — a local object store: put bytes, get back a
//! public URL path. Files live under the media directory and are served
//! by the HTTP layer at `/media/`.

use std::path::Path;

use thiserror::Error;

pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Public URL prefix the router mounts the media directory under.
pub const MEDIA_URL_PREFIX: &str = "/media";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Only JPG, PNG or WebP images are allowed")]
    UnsupportedType,

    #[error("Image exceeds the {} MB limit", MAX_PHOTO_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("Cannot write media file: {0}")]
    Io(#[from] std::io::Error),
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Validate an upload before accepting it. Returns the file extension to
/// store under.
pub fn validate_photo(content_type: &str, size: usize) -> Result<&'static str, StorageError> {
    let ext = extension_for(content_type).ok_or(StorageError::UnsupportedType)?;
    if size > MAX_PHOTO_BYTES {
        return Err(StorageError::TooLarge);
    }
    Ok(ext)
}

/// Store a profile photo and return its public URL path
/// (`/media/users/{uid}/avatar.{ext}`). Re-uploading replaces the
/// previous photo for the same extension.
pub fn store_profile_photo(
    media_dir: &Path,
    uid: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<String, StorageError> {
    let ext = validate_photo(content_type, bytes.len())?;

    let user_dir = media_dir.join("users").join(uid);
    std::fs::create_dir_all(&user_dir)?;

    let path = user_dir.join(format!("avatar.{ext}"));
    std::fs::write(&path, bytes)?;

    tracing::debug!(uid, ?path, "Profile photo stored");
    Ok(format!("{MEDIA_URL_PREFIX}/users/{uid}/avatar.{ext}"))
}
