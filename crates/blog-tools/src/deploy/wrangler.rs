//! Thin client over the `wrangler` CLI.
//!
//! Commands go through a [`CommandRunner`] so the deploy flow can be driven
//! by a fake in tests; [`ProcessRunner`] is the real implementation.

use std::path::Path;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use uuid::Uuid;

use super::DeployError;

/// One entry of `wrangler d1 list --json`.
///
/// Only `name` and `uuid` are relied on. A `created_at` that is not RFC 3339
/// reads as `None` rather than failing the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct D1Database {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<OffsetDateTime>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| OffsetDateTime::parse(&value, &Rfc3339).ok()))
}

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// The text wrangler reports: stderr when it has any, stdout otherwise.
    pub fn text(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, DeployError>;
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, DeployError> {
        debug!("Running {program} {}", args.join(" "));

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| DeployError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Where `wrangler d1 migrations apply` runs.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplyTarget {
    /// The hosted database
    #[default]
    Remote,
    /// Wrangler's local development database
    Local,
}

impl ApplyTarget {
    pub fn flag(&self) -> &'static str {
        match self {
            ApplyTarget::Remote => "--remote",
            ApplyTarget::Local => "--local",
        }
    }
}

pub struct Wrangler<R> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> Wrangler<R> {
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs `wrangler <args>`, turning a non-zero exit into an error.
    async fn invoke(&self, args: Vec<String>) -> Result<CommandOutput, DeployError> {
        let output = self.runner.run(&self.program, &args).await?;

        if !output.success {
            return Err(DeployError::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                code: output.code,
                output: output.text().trim().to_string(),
            });
        }

        Ok(output)
    }

    /// Lists the account's D1 databases.
    pub async fn list_databases(&self) -> Result<Vec<D1Database>, DeployError> {
        let output = self
            .invoke(vec!["d1".into(), "list".into(), "--json".into()])
            .await?;

        serde_json::from_str(&output.stdout).map_err(DeployError::InvalidListing)
    }

    /// Applies the migrations configured in `config` to `db_name` and
    /// returns wrangler's report.
    pub async fn apply_migrations(
        &self,
        db_name: &str,
        config: &Path,
        target: ApplyTarget,
    ) -> Result<String, DeployError> {
        let output = self
            .invoke(vec![
                "d1".into(),
                "migrations".into(),
                "apply".into(),
                db_name.to_string(),
                target.flag().to_string(),
                "-c".into(),
                config.display().to_string(),
            ])
            .await?;

        Ok(output.text().to_string())
    }
}
