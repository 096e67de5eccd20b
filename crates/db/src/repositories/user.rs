//! User repository for database operations.
//!
//! Implements the identity repository over the `users` table and the role
//! detail tables. Every write runs inside one transaction.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use super::role_detail;
use crate::entities::{sea_orm_active_enums::UserRole, users};
use agrichain_core::identity::{
    Account, AccountSummary, IdentityError, IdentityRepository, RoleDetail, RoleKind,
};

/// Unique constraint on `users.email`.
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// User repository implementation.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl IdentityRepository for UserRepository {
    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, IdentityError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repository_error)?;

        Ok(model.map(to_domain))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(repository_error)?;

        Ok(model.map(to_domain))
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>, IdentityError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(repository_error)?;

        Ok(models
            .into_iter()
            .map(|model| AccountSummary::from(&to_domain(model)))
            .collect())
    }

    async fn find_detail(
        &self,
        role: RoleKind,
        id: Uuid,
    ) -> Result<Option<RoleDetail>, IdentityError> {
        role_detail::find(&self.db, role, id)
            .await
            .map_err(repository_error)
    }

    async fn list_details(&self, role: RoleKind) -> Result<Vec<RoleDetail>, IdentityError> {
        role_detail::list(&self.db, role)
            .await
            .map_err(repository_error)
    }

    async fn create_account(
        &self,
        account: &Account,
        detail: &RoleDetail,
    ) -> Result<(), IdentityError> {
        let txn = self.db.begin().await.map_err(repository_error)?;

        users::Entity::insert(to_active_model(account))
            .exec_without_returning(&txn)
            .await
            .map_err(|e| write_error(e, &account.email))?;
        role_detail::insert(&txn, account.role, detail)
            .await
            .map_err(repository_error)?;

        txn.commit().await.map_err(repository_error)?;
        Ok(())
    }

    async fn update_account(
        &self,
        previous_role: RoleKind,
        account: &Account,
        detail: &RoleDetail,
    ) -> Result<(), IdentityError> {
        let txn = self.db.begin().await.map_err(repository_error)?;

        to_active_model(account)
            .update(&txn)
            .await
            .map_err(|e| write_error(e, &account.email))?;

        if previous_role != account.role {
            let moved = role_detail::delete(&txn, previous_role, account.id)
                .await
                .map_err(repository_error)?;
            debug!(
                uuid = %account.id,
                from = %previous_role,
                to = %account.role,
                moved,
                "Moving role detail"
            );
        }
        role_detail::upsert(&txn, account.role, detail)
            .await
            .map_err(repository_error)?;

        txn.commit().await.map_err(repository_error)?;
        Ok(())
    }

    async fn delete_account(&self, account: &Account) -> Result<Option<RoleDetail>, IdentityError> {
        let txn = self.db.begin().await.map_err(repository_error)?;

        let detail = role_detail::find(&txn, account.role, account.id)
            .await
            .map_err(repository_error)?;
        role_detail::delete(&txn, account.role, account.id)
            .await
            .map_err(repository_error)?;
        users::Entity::delete_by_id(account.id)
            .exec(&txn)
            .await
            .map_err(repository_error)?;

        txn.commit().await.map_err(repository_error)?;
        Ok(detail)
    }
}

fn repository_error(e: DbErr) -> IdentityError {
    IdentityError::repository(e.to_string())
}

/// Error for a write to `users`; losing a race on the email key is a
/// validation failure like the service's own check.
fn write_error(e: DbErr, email: &str) -> IdentityError {
    match e.sql_err() {
        Some(err) => constraint_error(err, email).unwrap_or_else(|| repository_error(e)),
        None => repository_error(e),
    }
}

fn constraint_error(err: SqlErr, email: &str) -> Option<IdentityError> {
    match err {
        SqlErr::UniqueConstraintViolation(msg) if msg.contains(EMAIL_CONSTRAINT) => Some(
            IdentityError::validation(format!("email '{email}' is already registered")),
        ),
        _ => None,
    }
}

/// Convert a database row to the domain account.
fn to_domain(model: users::Model) -> Account {
    Account {
        id: model.uuid,
        name: model.name,
        email: model.email,
        password_hash: model.password,
        role: from_db_role(model.role),
        photo: model.foto,
        photo_url: model.url,
    }
}

/// Active model for inserts and updates; `created_at` keeps its stored value.
fn to_active_model(account: &Account) -> users::ActiveModel {
    users::ActiveModel {
        uuid: Set(account.id),
        name: Set(account.name.clone()),
        email: Set(account.email.clone()),
        password: Set(account.password_hash.clone()),
        role: Set(to_db_role(account.role)),
        foto: Set(account.photo.clone()),
        url: Set(account.photo_url.clone()),
        created_at: NotSet,
        updated_at: Set(Utc::now().into()),
    }
}

/// Convert domain role to database enum.
fn to_db_role(role: RoleKind) -> UserRole {
    match role {
        RoleKind::Farmer => UserRole::Petani,
        RoleKind::Logistics => UserRole::Logistik,
        RoleKind::Factory => UserRole::Pabrik,
        RoleKind::Company => UserRole::Perusahaan,
    }
}

/// Convert database role enum to domain role.
fn from_db_role(role: UserRole) -> RoleKind {
    match role {
        UserRole::Petani => RoleKind::Farmer,
        UserRole::Logistik => RoleKind::Logistics,
        UserRole::Pabrik => RoleKind::Factory,
        UserRole::Perusahaan => RoleKind::Company,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveEnum, ActiveValue};

    fn budi() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Budi".to_string(),
            email: "budi@x.com".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            role: RoleKind::Farmer,
            photo: "defaultProfile.png".to_string(),
            photo_url: "http://localhost:5000/profile/defaultProfile.png".to_string(),
        }
    }

    #[test]
    fn test_role_mapping_is_bijective() {
        for role in RoleKind::ALL {
            assert_eq!(from_db_role(to_db_role(role)), role);
        }
    }

    #[test]
    fn test_db_role_values_match_wire_tags() {
        for role in RoleKind::ALL {
            assert_eq!(to_db_role(role).to_value(), role.as_str());
        }
    }

    #[test]
    fn test_active_model_leaves_created_at_unset() {
        let model = to_active_model(&budi());

        assert!(model.created_at.is_not_set());
        assert!(matches!(model.role, ActiveValue::Set(UserRole::Petani)));
    }

    #[test]
    fn test_email_key_violation_is_validation_error() {
        let err = constraint_error(
            SqlErr::UniqueConstraintViolation(
                r#"duplicate key value violates unique constraint "users_email_key""#.to_string(),
            ),
            "budi@x.com",
        );

        match err {
            Some(IdentityError::Validation(msg)) => {
                assert_eq!(msg, "email 'budi@x.com' is already registered");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_constraint_violations_stay_repository_errors() {
        let err = constraint_error(
            SqlErr::UniqueConstraintViolation(
                r#"duplicate key value violates unique constraint "users_pkey""#.to_string(),
            ),
            "budi@x.com",
        );
        assert!(err.is_none());

        let err = write_error(DbErr::Custom("connection reset".to_string()), "budi@x.com");
        assert!(matches!(err, IdentityError::Repository(_)));
    }

    #[test]
    fn test_to_domain() {
        let account = budi();
        let row = users::Model {
            uuid: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            password: account.password_hash.clone(),
            role: UserRole::Petani,
            foto: account.photo.clone(),
            url: account.photo_url.clone(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };

        assert_eq!(to_domain(row), account);
    }
}
