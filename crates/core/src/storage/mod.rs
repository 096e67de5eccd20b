//! Profile photo storage using Apache OpenDAL.
//!
//! Photos live flat in one directory and are addressed by a server generated
//! filename. The HTTP layer serves that directory under [`PUBLIC_PATH`].
//!
//! ```text
//! upload ──► PhotoStore::store ──► "<uuid>.png" ──► resolve_url(origin, name)
//!                                                   = "{origin}/profile/<uuid>.png"
//! replace/delete ──► PhotoStore::delete ──► Option<FileCleanupWarning>
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{DEFAULT_PHOTO, FileCleanupWarning, PUBLIC_PATH, PhotoStore, PhotoUpload};
