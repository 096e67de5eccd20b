//! Profile photo storage implementation using Apache OpenDAL.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Filename standing for "no custom photo". Never deleted.
pub const DEFAULT_PHOTO: &str = "defaultProfile.png";

/// Placeholder image served as [`DEFAULT_PHOTO`].
const DEFAULT_PHOTO_PNG: &[u8] = include_bytes!("../../assets/defaultProfile.png");

/// URL path segment under which the photo directory is served.
pub const PUBLIC_PATH: &str = "/profile";

/// Attempts at drawing an unused filename before giving up.
const MAX_NAME_ATTEMPTS: usize = 5;

/// A photo received from a client.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Filename as sent by the client (informational only).
    pub original_name: String,
    /// Content type (MIME type).
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl PhotoUpload {
    /// Size of the upload in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A photo file that could not be removed.
///
/// Cleanup is best-effort: this is reported to callers and logged, but never
/// fails the account operation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCleanupWarning {
    /// Filename that was meant to be deleted.
    pub filename: String,
    /// Why it was not deleted.
    pub reason: String,
}

impl fmt::Display for FileCleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not delete {}: {}", self.filename, self.reason)
    }
}

/// Storage service for profile photos.
pub struct PhotoStore {
    operator: Operator,
    config: StorageConfig,
}

impl fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoStore")
            .field("provider", &self.config.provider.name())
            .finish_non_exhaustive()
    }
}

impl PhotoStore {
    /// Create a new photo store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                let builder = services::Fs::default().root(root);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()),
        }
    }

    /// Validate an upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, too large, or of a disallowed type.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }

        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Persist an uploaded photo and return its generated filename.
    ///
    /// Existing files are never overwritten: a fresh name is drawn when the
    /// generated one is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the backend write fails.
    pub async fn store(&self, upload: &PhotoUpload) -> Result<String, StorageError> {
        self.validate_upload(&upload.content_type, upload.size())?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let filename = generate_filename(&upload.content_type);
            if !self.write_new(&filename, upload.data.clone()).await? {
                debug!(filename = %filename, "Generated photo filename already taken");
                continue;
            }

            info!(
                filename = %filename,
                original_name = %upload.original_name,
                size = upload.size(),
                "Stored profile photo"
            );
            return Ok(filename);
        }

        Err(StorageError::Operation(
            "could not allocate a unique photo filename".to_string(),
        ))
    }

    /// Write `data` under `filename` unless the name is taken.
    ///
    /// Returns `false` when a file already exists. Backends with conditional
    /// writes decide this atomically; others fall back to a stat first.
    async fn write_new(&self, filename: &str, data: Bytes) -> Result<bool, StorageError> {
        if self
            .operator
            .info()
            .full_capability()
            .write_with_if_not_exists
        {
            return match self
                .operator
                .write_with(filename, data)
                .if_not_exists(true)
                .await
            {
                Ok(_) => Ok(true),
                Err(e) if e.kind() == ErrorKind::ConditionNotMatch => Ok(false),
                Err(e) => Err(e.into()),
            };
        }

        if self.exists(filename).await {
            return Ok(false);
        }
        self.operator.write(filename, data).await?;
        Ok(true)
    }

    /// Install the default photo unless one is already present.
    ///
    /// Returns `true` when the file was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn ensure_default_photo(&self) -> Result<bool, StorageError> {
        let written = self
            .write_new(DEFAULT_PHOTO, Bytes::from_static(DEFAULT_PHOTO_PNG))
            .await?;
        if written {
            info!(filename = DEFAULT_PHOTO, "Installed default profile photo");
        }
        Ok(written)
    }

    /// Delete a photo, best-effort.
    ///
    /// The default photo and empty filenames are skipped. Any failure,
    /// including an already missing file, is logged and returned as a warning.
    pub async fn delete(&self, filename: &str) -> Option<FileCleanupWarning> {
        if filename.is_empty() || Self::is_default(filename) {
            debug!(filename = %filename, "Skipping deletion of default photo");
            return None;
        }

        if !is_plain_filename(filename) {
            return Some(cleanup_warning(filename, "refusing to delete a path"));
        }

        match self.operator.stat(filename).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Some(cleanup_warning(filename, "file not found"));
            }
            Err(e) => return Some(cleanup_warning(filename, &e.to_string())),
        }

        match self.operator.delete(filename).await {
            Ok(()) => {
                info!(filename = %filename, "Deleted profile photo");
                None
            }
            Err(e) => Some(cleanup_warning(filename, &e.to_string())),
        }
    }

    /// Check if a photo exists in storage.
    pub async fn exists(&self, filename: &str) -> bool {
        self.operator.stat(filename).await.is_ok()
    }

    /// Returns true for the sentinel default photo.
    #[must_use]
    pub fn is_default(filename: &str) -> bool {
        filename == DEFAULT_PHOTO
    }

    /// Absolute URL of a photo for a request origin such as `http://host:5000`.
    #[must_use]
    pub fn resolve_url(origin: &str, filename: &str) -> String {
        format!("{}{PUBLIC_PATH}/{filename}", origin.trim_end_matches('/'))
    }

    /// Absolute URL of the default photo.
    #[must_use]
    pub fn default_url(origin: &str) -> String {
        Self::resolve_url(origin, DEFAULT_PHOTO)
    }

    /// Directory backing the store, if it is on the local filesystem.
    #[must_use]
    pub fn local_root(&self) -> Option<&Path> {
        match &self.config.provider {
            StorageProvider::LocalFs { root } => Some(root.as_path()),
            StorageProvider::Memory => None,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) async fn list_filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .operator
            .list("/")
            .await
            .expect("should list photos")
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.name().to_string())
            .collect();
        names.sort();
        names
    }
}

fn cleanup_warning(filename: &str, reason: &str) -> FileCleanupWarning {
    let warning = FileCleanupWarning {
        filename: filename.to_string(),
        reason: reason.to_string(),
    };
    warn!(filename = %filename, reason = %reason, "Profile photo cleanup failed");
    warning
}

/// Generate a filename for a new photo from its MIME type.
fn generate_filename(content_type: &str) -> String {
    let extension = match content_type {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    };
    format!("{}.{extension}", Uuid::new_v4().simple())
}

/// Only single path segments made of safe characters are addressable.
fn is_plain_filename(filename: &str) -> bool {
    filename != ".."
        && filename != "."
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}
