//! Runtime configuration: where the catalog database lives.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable overriding the database location.
pub const DB_PATH_VAR: &str = "ARCADIA_DB";

/// Resolves the catalog database path.
///
/// `ARCADIA_DB` wins when set and non-blank. Otherwise the path is
/// `{data_dir}/arcadia/arcadia.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn database_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(DB_PATH_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("arcadia").join("arcadia.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn default_path_lands_in_the_data_directory() {
        unsafe {
            env::remove_var(DB_PATH_VAR);
        }

        let path = database_path().unwrap();
        assert!(path.to_string_lossy().contains("arcadia"));
        assert!(path.to_string_lossy().ends_with("arcadia.db"));
    }

    #[test]
    #[serial]
    fn env_override_wins() {
        unsafe {
            env::set_var(DB_PATH_VAR, "/tmp/elsewhere/catalog.db");
        }

        let path = database_path().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/elsewhere/catalog.db"));

        unsafe {
            env::remove_var(DB_PATH_VAR);
        }
    }

    #[test]
    #[serial]
    fn blank_override_falls_back_to_default() {
        unsafe {
            env::set_var(DB_PATH_VAR, "  ");
        }

        let path = database_path().unwrap();
        assert!(path.to_string_lossy().ends_with("arcadia.db"));

        unsafe {
            env::remove_var(DB_PATH_VAR);
        }
    }

    #[test]
    fn ensure_database_directory_creates_parents() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("arcadia.db");

        ensure_database_directory(&db_path).unwrap();
        assert!(db_path.parent().unwrap().exists());
    }
}
