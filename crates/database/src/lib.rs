//! TubeHub Database Crate
//!
//! Connection management, migrations, entities and repositories for the
//! TubeHub backend. SQLite is the only supported backend.

use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use tubehub_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use entities::{AccountUpdate, ChannelProfile, NewUser, User, WatchedVideo};
pub use migrations::{run_migrations, MIGRATOR};
pub use repos::{ChannelRepository, UserRepository};
pub use types::{DatabaseError, DatabaseResult};

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Fresh cuid for public user ids, refresh token ids and stored file names.
pub fn new_id() -> String {
    CUID.create_id()
}

/// Open the database and apply pending migrations.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("{e:#}")))?;

    Ok(pool)
}
