//! Local storage for uploaded avatars and cover images.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use tubehub_config::MediaConfig;
use tubehub_database::new_id;

const DEFAULT_PUBLIC_PATH: &str = "/static";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("only image uploads are accepted, got {0}")]
    UnsupportedType(String),
    #[error("file exceeds the upload limit of {limit} bytes")]
    TooLarge { limit: usize },
    #[error("{0} file is empty")]
    Empty(String),
    #[error("media storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_path: String,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            public_path: normalise_public_path(&config.public_path),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub async fn ensure_root(&self) -> Result<(), MediaError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn validate(&self, upload: &Upload) -> Result<(), MediaError> {
        if !upload.content_type.starts_with("image/") {
            return Err(MediaError::UnsupportedType(upload.content_type.clone()));
        }
        if upload.data.is_empty() {
            return Err(MediaError::Empty(upload.field.clone()));
        }
        if upload.data.len() > self.max_upload_bytes {
            return Err(MediaError::TooLarge {
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Write `upload` under a fresh name and return the URL it is served from.
    pub async fn store(&self, upload: &Upload) -> Result<String, MediaError> {
        self.validate(upload)?;
        self.ensure_root().await?;

        let file_name = format!("{}.{}", new_id(), extension_for(upload));
        fs::write(self.root.join(&file_name), &upload.data).await?;

        debug!(field = %upload.field, file = %file_name, bytes = upload.data.len(), "stored upload");
        Ok(format!("{}/{}", self.public_path, file_name))
    }

    /// Delete the file behind a URL returned by [`MediaStore::store`].
    ///
    /// URLs this store did not produce are left alone, and failures are only logged.
    pub async fn remove(&self, url: &str) {
        let Some(file_name) = self.local_file_name(url) else {
            debug!(%url, "not a local media url, skipping removal");
            return;
        };

        match fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => debug!(%url, "removed media file"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => warn!(%url, %error, "failed to remove media file"),
        }
    }

    fn local_file_name<'a>(&self, url: &'a str) -> Option<&'a str> {
        let name = url
            .strip_prefix(self.public_path.as_str())?
            .strip_prefix('/')?;

        let plain = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\']);
        plain.then_some(name)
    }
}

fn normalise_public_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_PUBLIC_PATH.to_string();
    }
    format!("/{trimmed}")
}

fn extension_for(upload: &Upload) -> String {
    let known = match upload.content_type.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    };
    if let Some(extension) = known {
        return extension.to_string();
    }

    upload
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|extension| extension.to_str())
        .filter(|extension| {
            extension.len() <= 5 && extension.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}
