//! Reading the on-disk migration tree.
//!
//! Each migration lives in its own directory, `<name>/migration.sql`, and
//! migrations are ordered by directory name. Anything in the tree that is not
//! a directory (lock files, READMEs) is ignored.

use std::path::Path;

use tracing::debug;

use crate::errors::DbError;

/// Migration tree shipped with this crate.
pub const MIGRATIONS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations");

/// File holding the SQL inside each migration directory.
pub const MIGRATION_FILE: &str = "migration.sql";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Directory name, e.g. `20240110083000_init`.
    pub name: String,
    pub sql: String,
}

impl Migration {
    /// Flat file name used when the tree is staged for deployment.
    pub fn file_name(&self) -> String {
        format!("{}.sql", self.name)
    }
}

/// Loads every migration under `dir`, sorted lexicographically by name.
pub fn collect(dir: &Path) -> Result<Vec<Migration>, DbError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DbError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DbError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| DbError::io(entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| DbError::InvalidMigrationName(entry.path()))?;
        names.push(name);
    }
    names.sort();

    names
        .into_iter()
        .map(|name| {
            let path = dir.join(&name).join(MIGRATION_FILE);
            let sql = read_migration_file(&path)?;
            debug!("Loaded migration {name}");
            Ok(Migration { name, sql })
        })
        .collect()
}

fn read_migration_file(path: &Path) -> Result<String, DbError> {
    match std::fs::read_to_string(path) {
        Ok(sql) => Ok(sql),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let dir = path.parent().unwrap_or(path).to_path_buf();
            Err(DbError::MissingMigrationFile(dir))
        }
        Err(e) => Err(DbError::io(path, e)),
    }
}
