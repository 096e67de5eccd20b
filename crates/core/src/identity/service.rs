//! Identity service implementation.

use std::future::Future;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::error::IdentityError;
use super::role::RoleKind;
use super::types::{
    Account, AccountProfile, AccountSummary, DeleteOutcome, RegisterInput, RoleDetail,
    UpdateInput, UpdateOutcome,
};
use crate::auth::{hash_password, is_blank};
use crate::storage::{DEFAULT_PHOTO, PhotoStore, PhotoUpload};

/// Repository trait for account persistence.
///
/// This trait is implemented by the db crate. Every write method covers the
/// account row and its role detail row in one transaction.
pub trait IdentityRepository: Send + Sync {
    /// Find an account by identifier.
    fn find_account(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Account>, IdentityError>> + Send;

    /// Find an account by email.
    fn find_account_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Account>, IdentityError>> + Send;

    /// List every account.
    fn list_accounts(&self) -> impl Future<Output = Result<Vec<AccountSummary>, IdentityError>> + Send;

    /// Find the detail row for an identifier in one role store.
    fn find_detail(
        &self,
        role: RoleKind,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<RoleDetail>, IdentityError>> + Send;

    /// List every detail row in one role store.
    fn list_details(
        &self,
        role: RoleKind,
    ) -> impl Future<Output = Result<Vec<RoleDetail>, IdentityError>> + Send;

    /// Insert an account and its detail row in the store of `account.role`.
    fn create_account(
        &self,
        account: &Account,
        detail: &RoleDetail,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Update an account and its detail row.
    ///
    /// When `previous_role` differs from `account.role` the detail row moves
    /// to the new store. A missing detail row is created.
    fn update_account(
        &self,
        previous_role: RoleKind,
        account: &Account,
        detail: &RoleDetail,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Delete an account and its detail row, returning the deleted detail.
    fn delete_account(
        &self,
        account: &Account,
    ) -> impl Future<Output = Result<Option<RoleDetail>, IdentityError>> + Send;
}

/// Identity service keeping accounts, role details, and photos consistent.
pub struct IdentityService<R: IdentityRepository> {
    repo: Arc<R>,
    photos: Arc<PhotoStore>,
}

impl<R: IdentityRepository> IdentityService<R> {
    /// Create a new identity service.
    #[must_use]
    pub fn new(repo: Arc<R>, photos: Arc<PhotoStore>) -> Self {
        Self { repo, photos }
    }

    /// Register an account and its role detail.
    ///
    /// `origin` is the scheme and host of the request, used for photo URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Password and confirmation differ, a required field is blank, or the
    ///   email is taken (`Validation`)
    /// - The role tag is not recognized (`UnknownRole`)
    /// - The photo is rejected or cannot be stored (`Photo`)
    /// - The database write fails (`Repository`)
    pub async fn register(
        &self,
        input: RegisterInput,
        origin: &str,
    ) -> Result<Account, IdentityError> {
        if input.password != input.confirm_password {
            return Err(IdentityError::validation(
                "password and confirm password do not match",
            ));
        }
        if is_blank(Some(&input.password)) {
            return Err(IdentityError::validation("password is required"));
        }
        let name = required(&input.name, "name")?;
        let email = required(&input.email, "email")?;
        let role: RoleKind = input.role.parse()?;
        self.validate_photo(input.photo.as_ref())?;
        self.ensure_email_free(&email, None).await?;

        let password_hash = hash_password(&input.password)?;

        let (photo, photo_url) = match &input.photo {
            Some(upload) => {
                let filename = self.photos.store(upload).await?;
                let url = PhotoStore::resolve_url(origin, &filename);
                (filename, url)
            }
            None => (DEFAULT_PHOTO.to_string(), PhotoStore::default_url(origin)),
        };

        let account = Account {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            photo,
            photo_url,
        };
        let detail = RoleDetail::for_account(
            &account,
            input.phone.unwrap_or_default(),
            input.address.unwrap_or_default(),
        );

        if let Err(e) = self.repo.create_account(&account, &detail).await {
            if input.photo.is_some() {
                let _ = self.photos.delete(&account.photo).await;
            }
            return Err(e);
        }

        info!(uuid = %account.id, role = %account.role, "Account registered");
        Ok(account)
    }

    /// Update an account and its role detail.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No account has this identifier (`NotFound`)
    /// - A new password differs from its confirmation, a supplied field is
    ///   blank, or the new email belongs to another account (`Validation`)
    /// - The role tag is not recognized (`UnknownRole`)
    /// - The photo is rejected or cannot be stored (`Photo`)
    /// - The database write fails (`Repository`)
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateInput,
        origin: &str,
    ) -> Result<UpdateOutcome, IdentityError> {
        let current = self
            .repo
            .find_account(id)
            .await?
            .ok_or(IdentityError::NotFound(id))?;

        let new_password = input
            .password
            .as_deref()
            .filter(|p| !is_blank(Some(p)));
        if let Some(password) = new_password
            && input.confirm_password.as_deref() != Some(password)
        {
            return Err(IdentityError::validation(
                "password and confirm password do not match",
            ));
        }

        let role: RoleKind = input.role.parse()?;
        let name = match &input.name {
            Some(name) => required(name, "name")?,
            None => current.name.clone(),
        };
        let email = match &input.email {
            Some(email) => required(email, "email")?,
            None => current.email.clone(),
        };
        if email != current.email {
            self.ensure_email_free(&email, Some(id)).await?;
        }
        self.validate_photo(input.photo.as_ref())?;

        let current_detail = self.repo.find_detail(current.role, id).await?;

        let password_hash = match new_password {
            Some(password) => hash_password(password)?,
            None => current.password_hash.clone(),
        };

        let new_photo = match &input.photo {
            Some(upload) => Some(self.photos.store(upload).await?),
            None => None,
        };
        let (photo, photo_url) = match &new_photo {
            Some(filename) => (filename.clone(), PhotoStore::resolve_url(origin, filename)),
            None => (current.photo.clone(), current.photo_url.clone()),
        };

        let account = Account {
            id,
            name,
            email,
            password_hash,
            role,
            photo,
            photo_url,
        };
        let (phone, address) = match (&current_detail, input.phone, input.address) {
            (Some(detail), phone, address) => (
                phone.unwrap_or_else(|| detail.nohp.clone()),
                address.unwrap_or_else(|| detail.alamat.clone()),
            ),
            (None, phone, address) => (phone.unwrap_or_default(), address.unwrap_or_default()),
        };
        let detail = RoleDetail::for_account(&account, phone, address);

        if let Err(e) = self.repo.update_account(current.role, &account, &detail).await {
            if let Some(filename) = &new_photo {
                let _ = self.photos.delete(filename).await;
            }
            return Err(e);
        }

        let mut warnings = Vec::new();
        if new_photo.is_some() {
            warnings.extend(self.photos.delete(&current.photo).await);
            if let Some(previous) = &current_detail
                && previous.foto != current.photo
            {
                warnings.extend(self.photos.delete(&previous.foto).await);
            }
        }

        info!(
            uuid = %id,
            role = %account.role,
            previous_role = %current.role,
            password_changed = new_password.is_some(),
            photo_replaced = new_photo.is_some(),
            "Account updated"
        );
        Ok(UpdateOutcome { account, warnings })
    }

    /// Delete an account, its role detail, and its photo.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this identifier, or `Repository`
    /// if the database delete fails. Photo cleanup never fails the call.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome, IdentityError> {
        let account = self
            .repo
            .find_account(id)
            .await?
            .ok_or(IdentityError::NotFound(id))?;

        let detail = self.repo.delete_account(&account).await?;

        let mut warnings = Vec::new();
        if let Some(detail) = detail {
            warnings.extend(self.photos.delete(&detail.foto).await);
        }

        info!(uuid = %id, role = %account.role, "Account deleted");
        Ok(DeleteOutcome { warnings })
    }

    /// List every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<AccountSummary>, IdentityError> {
        self.repo.list_accounts().await
    }

    /// Get an account with its role detail.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this identifier.
    pub async fn get(&self, id: Uuid) -> Result<AccountProfile, IdentityError> {
        let account = self
            .repo
            .find_account(id)
            .await?
            .ok_or(IdentityError::NotFound(id))?;

        let detail = self.repo.find_detail(account.role, id).await?;

        Ok(AccountProfile {
            account: AccountSummary::from(&account),
            detail,
        })
    }

    /// List every detail record of one role.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRole` for an unrecognized tag.
    pub async fn list_details(&self, role: &str) -> Result<Vec<RoleDetail>, IdentityError> {
        let role: RoleKind = role.parse()?;
        self.repo.list_details(role).await
    }

    /// Get one detail record of one role.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRole` for an unrecognized tag and `NotFound` if the
    /// store has no row for the identifier.
    pub async fn get_detail(&self, role: &str, id: Uuid) -> Result<RoleDetail, IdentityError> {
        let role: RoleKind = role.parse()?;
        self.repo
            .find_detail(role, id)
            .await?
            .ok_or(IdentityError::NotFound(id))
    }

    fn validate_photo(&self, photo: Option<&PhotoUpload>) -> Result<(), IdentityError> {
        if let Some(upload) = photo {
            self.photos
                .validate_upload(&upload.content_type, upload.size())?;
        }
        Ok(())
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        owner: Option<Uuid>,
    ) -> Result<(), IdentityError> {
        match self.repo.find_account_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => Err(IdentityError::validation(
                format!("email '{email}' is already registered"),
            )),
            _ => Ok(()),
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, IdentityError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(IdentityError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}
