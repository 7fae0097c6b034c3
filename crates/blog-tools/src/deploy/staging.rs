//! Flattening the migration tree into a wrangler-ready directory.

use std::path::{Path, PathBuf};

use blog::Migration;
use uuid::Uuid;

use super::DeployError;
use super::wrangler::D1Database;

/// Name of the generated wrangler configuration file.
pub const WRANGLER_CONFIG: &str = "wrangler.toml";

/// Binding name the generated configuration declares.
pub const D1_BINDING: &str = "DB";

/// Writes each migration into `dest` as `<name>.sql`, in the given order.
pub fn stage_migrations(migrations: &[Migration], dest: &Path) -> Result<Vec<PathBuf>, DeployError> {
    migrations
        .iter()
        .map(|migration| {
            let path = dest.join(migration.file_name());
            std::fs::write(&path, &migration.sql).map_err(|e| DeployError::io(&path, e))?;
            Ok(path)
        })
        .collect()
}

pub fn find_database<'a>(databases: &'a [D1Database], name: &str) -> Option<&'a D1Database> {
    databases.iter().find(|db| db.name == name)
}

fn toml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Renders a `wrangler.toml` binding `db_name` with migrations read from its own directory.
pub fn render_wrangler_config(db_name: &str, database_id: &Uuid) -> String {
    format!(
        "[[d1_databases]]\n\
         binding = {binding}\n\
         database_name = {name}\n\
         database_id = {id}\n\
         migrations_dir = \"./\"\n",
        binding = toml_string(D1_BINDING),
        name = toml_string(db_name),
        id = toml_string(&database_id.to_string()),
    )
}

/// Writes the configuration for `database` into `dir`.
pub fn write_wrangler_config(dir: &Path, database: &D1Database) -> Result<PathBuf, DeployError> {
    let path = dir.join(WRANGLER_CONFIG);
    let contents = render_wrangler_config(&database.name, &database.uuid);
    std::fs::write(&path, contents).map_err(|e| DeployError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn database(name: &str) -> D1Database {
        D1Database {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            version: None,
            created_at: None,
        }
    }

    #[test]
    fn test_stage_migrations_flattens_names() {
        let dest = TempDir::new().unwrap();
        let migrations = vec![
            Migration {
                name: "20240110083000_init".to_string(),
                sql: "CREATE TABLE a (id INTEGER);".to_string(),
            },
            Migration {
                name: "20240218120500_more".to_string(),
                sql: "CREATE TABLE b (id INTEGER);".to_string(),
            },
        ];

        let staged = stage_migrations(&migrations, dest.path()).unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0], dest.path().join("20240110083000_init.sql"));
        assert_eq!(
            std::fs::read_to_string(&staged[1]).unwrap(),
            "CREATE TABLE b (id INTEGER);"
        );
    }

    #[test]
    fn test_find_database_matches_exact_name() {
        let databases = vec![database("blog"), database("blog-prod")];
        assert_eq!(find_database(&databases, "blog-prod").unwrap().name, "blog-prod");
        assert!(find_database(&databases, "blog-pro").is_none());
        assert!(find_database(&[], "blog").is_none());
    }

    #[test]
    fn test_render_wrangler_config() {
        let id = Uuid::parse_str("3f6e1c1a-9d1e-4c63-9a55-0c7f2b8a4d10").unwrap();
        let config = render_wrangler_config("blog-prod", &id);

        assert_eq!(
            config,
            "[[d1_databases]]\n\
             binding = \"DB\"\n\
             database_name = \"blog-prod\"\n\
             database_id = \"3f6e1c1a-9d1e-4c63-9a55-0c7f2b8a4d10\"\n\
             migrations_dir = \"./\"\n"
        );
    }

    #[test]
    fn test_toml_string_escapes_quotes() {
        assert_eq!(toml_string(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn test_write_wrangler_config() {
        let dir = TempDir::new().unwrap();
        let db = database("blog");

        let path = write_wrangler_config(dir.path(), &db).unwrap();
        assert_eq!(path, dir.path().join(WRANGLER_CONFIG));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains(&format!("database_id = \"{}\"", db.uuid)));
    }
}
