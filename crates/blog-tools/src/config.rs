//! Command-line and environment configuration for the tooling binaries.

use std::path::PathBuf;

use blog::migrations::MIGRATIONS_DIR;
use clap::Parser;

use crate::deploy::ApplyTarget;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db";
pub const DEFAULT_WRANGLER_BIN: &str = "wrangler";

/// Seed an empty blog database with fixture roles, users, categories and posts
#[derive(Parser, Debug, Clone)]
#[command(name = "seed", version, about, long_about = None)]
pub struct SeedArgs {
    /// SQLite database URL (created if missing)
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Apply pending local migrations before seeding
    #[arg(long)]
    pub migrate: bool,

    /// Migration tree used with --migrate
    #[arg(long, env = "MIGRATIONS_DIR", default_value = MIGRATIONS_DIR)]
    pub migrations_dir: PathBuf,

    /// Delete all blog data before seeding
    #[arg(long)]
    pub reset: bool,

    /// Maximum pool connections
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,
}

/// Apply the migration tree to a D1 database through wrangler
#[derive(Parser, Debug, Clone)]
#[command(name = "migrate-d1", version, about, long_about = None)]
pub struct DeployArgs {
    /// Name of the target D1 database
    #[arg(long, env = "DB_NAME")]
    pub db_name: String,

    /// Migration tree (one `<name>/migration.sql` per migration)
    #[arg(long, env = "MIGRATIONS_DIR", default_value = MIGRATIONS_DIR)]
    pub migrations_dir: PathBuf,

    /// wrangler executable
    #[arg(long, env = "WRANGLER_BIN", default_value = DEFAULT_WRANGLER_BIN)]
    pub wrangler_bin: String,

    /// Apply to the hosted database or wrangler's local one
    #[arg(long, value_enum, default_value_t = ApplyTarget::Remote)]
    pub target: ApplyTarget,
}
