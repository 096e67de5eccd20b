//! `SeaORM` active enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role column of the `users` table, guarded by the `user_role` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UserRole {
    #[sea_orm(string_value = "petani")]
    Petani,
    #[sea_orm(string_value = "logistik")]
    Logistik,
    #[sea_orm(string_value = "pabrik")]
    Pabrik,
    #[sea_orm(string_value = "perusahaan")]
    Perusahaan,
}
