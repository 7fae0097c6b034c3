//! Deploying the migration tree to a hosted D1 database.
//!
//! The [`Deployer`] stages every migration as a flat `<name>.sql` file in a
//! fresh temporary directory, looks the target database up by name, writes a
//! `wrangler.toml` pointing at it and hands the directory to
//! `wrangler d1 migrations apply`.

mod staging;
mod wrangler;

use std::path::{Path, PathBuf};

use blog::{DbError, migrations};
use thiserror::Error;
use tracing::{info, warn};

pub use staging::{
    D1_BINDING, WRANGLER_CONFIG, find_database, render_wrangler_config, stage_migrations,
    write_wrangler_config,
};
pub use wrangler::{ApplyTarget, CommandOutput, CommandRunner, D1Database, ProcessRunner, Wrangler};

/// Prefix of the staging directory created under the system temp dir.
pub const STAGING_PREFIX: &str = "d1-migrations";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Migrations(#[from] DbError),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed ({}): {output}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },
    #[error("Unexpected output from d1 list: {0}")]
    InvalidListing(#[source] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl DeployError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }
}

/// What a deployment did.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    /// Staged file names, in apply order.
    pub staged: Vec<String>,
    /// The matched remote database, if the listing had one.
    pub database: Option<D1Database>,
    /// Wrangler's report from the apply step.
    pub output: String,
}

pub struct Deployer<R> {
    wrangler: Wrangler<R>,
    migrations_dir: PathBuf,
    db_name: String,
    target: ApplyTarget,
}

impl<R: CommandRunner> Deployer<R> {
    pub fn new(
        wrangler: Wrangler<R>,
        migrations_dir: impl Into<PathBuf>,
        db_name: impl Into<String>,
    ) -> Self {
        Self {
            wrangler,
            migrations_dir: migrations_dir.into(),
            db_name: db_name.into(),
            target: ApplyTarget::default(),
        }
    }

    pub fn with_target(mut self, target: ApplyTarget) -> Self {
        self.target = target;
        self
    }

    pub fn wrangler(&self) -> &Wrangler<R> {
        &self.wrangler
    }

    /// Stages, configures and applies the migrations.
    ///
    /// The staging directory is removed when this returns, on success and on
    /// error alike.
    pub async fn run(&self) -> Result<DeployOutcome, DeployError> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .map_err(|e| DeployError::io(std::env::temp_dir(), e))?;
        let staging_path = staging.path().to_path_buf();
        info!("Staging migrations in {}", staging_path.display());

        let staged = self.stage(&staging_path)?;

        let databases = self.wrangler.list_databases().await?;
        let database = find_database(&databases, &self.db_name).cloned();
        match &database {
            Some(db) => {
                info!("Found D1 database {} ({})", db.name, db.uuid);
                write_wrangler_config(&staging_path, db)?;
            }
            None => warn!(
                "No D1 database named {:?} among {} listed; {} not written",
                self.db_name,
                databases.len(),
                WRANGLER_CONFIG
            ),
        }

        let output = self
            .wrangler
            .apply_migrations(&self.db_name, &staging_path.join(WRANGLER_CONFIG), self.target)
            .await?;

        staging
            .close()
            .map_err(|e| DeployError::io(&staging_path, e))?;

        Ok(DeployOutcome {
            staged,
            database,
            output,
        })
    }

    fn stage(&self, dest: &Path) -> Result<Vec<String>, DeployError> {
        let migrations = migrations::collect(&self.migrations_dir)?;
        stage_migrations(&migrations, dest)?;
        info!("Staged {} migrations", migrations.len());

        Ok(migrations.iter().map(|m| m.file_name()).collect())
    }
}
