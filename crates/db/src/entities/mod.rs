//! `SeaORM` entities.

pub mod logistik_users;
pub mod pabrik_users;
pub mod perusahaan_users;
pub mod petani_users;
pub mod sea_orm_active_enums;
pub mod users;
