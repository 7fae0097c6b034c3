//! Blog schema crate.
//!
//! Row models for roles, users, categories and posts, the [`Database`]
//! access layer over SQLite, and the migration tree under `migrations/`
//! (one `<name>/migration.sql` per migration, applied in name order).

pub mod database;
pub mod errors;
pub mod migrations;
pub mod models;

pub use database::Database;
pub use errors::DbError;
pub use migrations::Migration;
