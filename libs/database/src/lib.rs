//! PostgreSQL plumbing shared by every domain crate.
//!
//! # Features
//!
//! - `postgres` (default): sea-orm connector, migrations runner, health check
//!   and the generic [`BaseRepository`]
//! - `config`: `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! ```ignore
//! use database::postgres;
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config(PostgresConfig::from_env()?).await?;
//! postgres::run_migrations::<Migrator>(&db, "sensei_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub mod repository;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};

#[cfg(feature = "postgres")]
pub use repository::{
    BaseRepository, foreign_key_violation, is_foreign_key_violation, is_unique_violation,
};
