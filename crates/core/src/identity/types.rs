//! Identity domain types.

use serde::Serialize;
use uuid::Uuid;

use super::role::RoleKind;
use crate::storage::{FileCleanupWarning, PhotoUpload};

/// Canonical account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Account identifier, shared with the role detail record.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address (unique).
    pub email: String,
    /// Argon2 PHC hash.
    pub password_hash: String,
    /// Role tag selecting the detail store.
    pub role: RoleKind,
    /// Photo filename.
    pub photo: String,
    /// Absolute photo URL.
    pub photo_url: String,
}

/// Account fields safe to list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// Account identifier.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role tag.
    pub role: RoleKind,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            uuid: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

/// Role-specific extension record, structurally identical across roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDetail {
    /// Same identifier as the owning account.
    pub uuid: Uuid,
    /// Display name (copy of the account's).
    pub name: String,
    /// Email (copy of the account's).
    pub email: String,
    /// Phone number.
    pub nohp: String,
    /// Postal address.
    pub alamat: String,
    /// Photo filename.
    pub foto: String,
    /// Absolute photo URL.
    pub url: String,
    /// Copy of the account's password hash; never serialized.
    #[serde(skip)]
    pub password_hash: String,
}

impl RoleDetail {
    /// Builds the detail record mirroring an account.
    #[must_use]
    pub fn for_account(account: &Account, phone: String, address: String) -> Self {
        Self {
            uuid: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            nohp: phone,
            alamat: address,
            foto: account.photo.clone(),
            url: account.photo_url.clone(),
            password_hash: account.password_hash.clone(),
        }
    }
}

/// An account together with its role detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    /// Listing fields of the account.
    pub account: AccountSummary,
    /// Detail record, or `None` if the store holds no row for the account.
    pub detail: Option<RoleDetail>,
}

/// Input for registering an account.
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Must equal `password`.
    pub confirm_password: String,
    /// Raw role tag.
    pub role: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Uploaded photo.
    pub photo: Option<PhotoUpload>,
}

/// Input for updating an account. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateInput {
    /// New display name.
    pub name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New plaintext password; blank keeps the stored hash.
    pub password: Option<String>,
    /// Must equal `password` when a password is supplied.
    pub confirm_password: Option<String>,
    /// Raw role tag (required).
    pub role: String,
    /// New phone number.
    pub phone: Option<String>,
    /// New postal address.
    pub address: Option<String>,
    /// Replacement photo.
    pub photo: Option<PhotoUpload>,
}

/// Result of a successful update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The account as stored after the update.
    pub account: Account,
    /// Photo files that could not be cleaned up.
    pub warnings: Vec<FileCleanupWarning>,
}

/// Result of a successful delete.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Photo files that could not be cleaned up.
    pub warnings: Vec<FileCleanupWarning>,
}
