//! Tooling for the blog database.
//!
//! Two independent utilities:
//!
//! - [`db::Seeder`] fills an empty database with the fixed fixtures in
//!   [`fixtures`] and reports every post with its author and categories.
//! - [`deploy::Deployer`] stages the migration tree and applies it to a
//!   hosted D1 database through `wrangler`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use blog_tools::prelude::*;
//!
//! let db = Database::connect("sqlite://blog.db", 5).await?;
//! let report = Seeder::new(db).run().await?;
//!
//! let deployer = Deployer::new(Wrangler::new(ProcessRunner, "wrangler"), MIGRATIONS_DIR, "blog-prod");
//! let outcome = deployer.run().await?;
//! ```

pub mod config;
pub mod db;
pub mod deploy;
pub mod fixtures;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{DeployArgs, SeedArgs};
    pub use crate::db::{SeedError, SeedReport, Seeder};
    pub use crate::deploy::{
        ApplyTarget, CommandRunner, DeployError, DeployOutcome, Deployer, ProcessRunner, Wrangler,
    };
    pub use blog::Database;
    pub use blog::migrations::MIGRATIONS_DIR;
}
