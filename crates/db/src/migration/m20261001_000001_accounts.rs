//! Accounts migration.
//!
//! Creates the `users` table and the four role detail tables that share its
//! primary key.

use sea_orm_migration::prelude::*;

/// Role detail tables, one per role tag.
const DETAIL_TABLES: [&str; 4] = [
    "petani_users",
    "logistik_users",
    "pabrik_users",
    "perusahaan_users",
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(USERS_SQL).await?;

        for table in DETAIL_TABLES {
            db.execute_unprepared(&detail_table_sql(table)).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for table in DETAIL_TABLES {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS {table} CASCADE;"))
                .await?;
        }
        db.execute_unprepared("DROP TABLE IF EXISTS users CASCADE;")
            .await?;
        Ok(())
    }
}

const USERS_SQL: &str = r"
-- Canonical account table shared by every role
CREATE TABLE users (
    uuid UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    password TEXT NOT NULL,
    role VARCHAR(16) NOT NULL,
    foto TEXT NOT NULL DEFAULT 'defaultProfile.png',
    url TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT users_email_key UNIQUE (email),
    CONSTRAINT user_role CHECK (role IN ('petani', 'logistik', 'pabrik', 'perusahaan'))
);

-- Listing order
CREATE INDEX idx_users_created ON users(created_at);
";

/// Detail tables are structurally identical and keyed by the account UUID.
fn detail_table_sql(table: &str) -> String {
    format!(
        r"
CREATE TABLE {table} (
    uuid UUID PRIMARY KEY REFERENCES users(uuid) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    password TEXT NOT NULL,
    nohp TEXT NOT NULL DEFAULT '',
    alamat TEXT NOT NULL DEFAULT '',
    foto TEXT NOT NULL DEFAULT 'defaultProfile.png',
    url TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"
    )
}
