//! Role detail tables.
//!
//! The four detail tables share one column layout. [`DetailTable`] maps each
//! entity to the domain [`RoleDetail`], and the functions below pick the
//! table for a [`RoleKind`] so callers never touch a table by name.

use chrono::Utc;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use crate::entities::{logistik_users, pabrik_users, perusahaan_users, petani_users};
use agrichain_core::identity::{RoleDetail, RoleKind};

/// An entity backing one role detail store.
pub trait DetailTable: EntityTrait {
    /// The shared account identifier column.
    fn uuid_column() -> Self::Column;

    /// The column listings are ordered by.
    fn created_at_column() -> Self::Column;

    /// Convert a row to the domain record.
    fn into_detail(model: Self::Model) -> RoleDetail;

    /// Build an active model carrying every domain field.
    ///
    /// `created_at` is left unset so inserts take the column default and
    /// updates keep the stored value.
    fn active_model(detail: &RoleDetail, now: DateTimeWithTimeZone) -> Self::ActiveModel;
}

macro_rules! detail_table {
    ($table:ident) => {
        impl DetailTable for $table::Entity {
            fn uuid_column() -> Self::Column {
                $table::Column::Uuid
            }

            fn created_at_column() -> Self::Column {
                $table::Column::CreatedAt
            }

            fn into_detail(model: $table::Model) -> RoleDetail {
                RoleDetail {
                    uuid: model.uuid,
                    name: model.name,
                    email: model.email,
                    nohp: model.nohp,
                    alamat: model.alamat,
                    foto: model.foto,
                    url: model.url,
                    password_hash: model.password,
                }
            }

            fn active_model(detail: &RoleDetail, now: DateTimeWithTimeZone) -> $table::ActiveModel {
                $table::ActiveModel {
                    uuid: Set(detail.uuid),
                    name: Set(detail.name.clone()),
                    email: Set(detail.email.clone()),
                    password: Set(detail.password_hash.clone()),
                    nohp: Set(detail.nohp.clone()),
                    alamat: Set(detail.alamat.clone()),
                    foto: Set(detail.foto.clone()),
                    url: Set(detail.url.clone()),
                    created_at: NotSet,
                    updated_at: Set(now),
                }
            }
        }
    };
}

detail_table!(petani_users);
detail_table!(logistik_users);
detail_table!(pabrik_users);
detail_table!(perusahaan_users);

/// Dispatch a generic table operation to the entity of a role.
macro_rules! for_role {
    ($role:expr, $op:ident($($arg:expr),*)) => {
        match $role {
            RoleKind::Farmer => $op::<petani_users::Entity, _>($($arg),*).await,
            RoleKind::Logistics => $op::<logistik_users::Entity, _>($($arg),*).await,
            RoleKind::Factory => $op::<pabrik_users::Entity, _>($($arg),*).await,
            RoleKind::Company => $op::<perusahaan_users::Entity, _>($($arg),*).await,
        }
    };
}

/// Find the detail row of `id` in the store of `role`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn find<C: ConnectionTrait>(
    conn: &C,
    role: RoleKind,
    id: Uuid,
) -> Result<Option<RoleDetail>, DbErr> {
    for_role!(role, find_in(conn, id))
}

/// List every row in the store of `role`, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list<C: ConnectionTrait>(conn: &C, role: RoleKind) -> Result<Vec<RoleDetail>, DbErr> {
    for_role!(role, list_in(conn))
}

/// Insert a detail row into the store of `role`.
///
/// # Errors
///
/// Returns an error if the insert fails, including when a row already exists.
pub async fn insert<C: ConnectionTrait>(
    conn: &C,
    role: RoleKind,
    detail: &RoleDetail,
) -> Result<(), DbErr> {
    for_role!(role, insert_in(conn, detail))
}

/// Update the detail row in the store of `role`, inserting it if missing.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub async fn upsert<C: ConnectionTrait>(
    conn: &C,
    role: RoleKind,
    detail: &RoleDetail,
) -> Result<(), DbErr> {
    for_role!(role, upsert_in(conn, detail))
}

/// Delete the detail row of `id` from the store of `role`.
///
/// Returns whether a row was deleted.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub async fn delete<C: ConnectionTrait>(conn: &C, role: RoleKind, id: Uuid) -> Result<bool, DbErr> {
    for_role!(role, delete_in(conn, id))
}

async fn find_in<E: DetailTable, C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<RoleDetail>, DbErr> {
    let model = E::find()
        .filter(E::uuid_column().eq(id))
        .one(conn)
        .await?;

    Ok(model.map(E::into_detail))
}

async fn list_in<E: DetailTable, C: ConnectionTrait>(conn: &C) -> Result<Vec<RoleDetail>, DbErr> {
    let models = E::find()
        .order_by_asc(E::created_at_column())
        .all(conn)
        .await?;

    Ok(models.into_iter().map(E::into_detail).collect())
}

async fn insert_in<E: DetailTable, C: ConnectionTrait>(
    conn: &C,
    detail: &RoleDetail,
) -> Result<(), DbErr>
where
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let model = E::active_model(detail, Utc::now().into());
    E::insert(model).exec_without_returning(conn).await?;
    Ok(())
}

async fn upsert_in<E: DetailTable, C: ConnectionTrait>(
    conn: &C,
    detail: &RoleDetail,
) -> Result<(), DbErr>
where
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let result = E::update_many()
        .set(E::active_model(detail, Utc::now().into()))
        .filter(E::uuid_column().eq(detail.uuid))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        insert_in::<E, C>(conn, detail).await?;
    }
    Ok(())
}

async fn delete_in<E: DetailTable, C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
    let result = E::delete_many()
        .filter(E::uuid_column().eq(id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}
