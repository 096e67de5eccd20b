//! `SeaORM` Entity for users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub foto: String,
    pub url: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::petani_users::Entity")]
    PetaniUsers,
    #[sea_orm(has_one = "super::logistik_users::Entity")]
    LogistikUsers,
    #[sea_orm(has_one = "super::pabrik_users::Entity")]
    PabrikUsers,
    #[sea_orm(has_one = "super::perusahaan_users::Entity")]
    PerusahaanUsers,
}

impl Related<super::petani_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PetaniUsers.def()
    }
}

impl Related<super::logistik_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LogistikUsers.def()
    }
}

impl Related<super::pabrik_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PabrikUsers.def()
    }
}

impl Related<super::perusahaan_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PerusahaanUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
