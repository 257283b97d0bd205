use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Root directory for everything the server writes locally (database, logs).
///
/// Debug builds use `dev_assets/` at the workspace root so development data
/// never mixes with an installed instance.
pub fn asset_dir() -> PathBuf {
    if cfg!(debug_assertions) {
        return PathBuf::from(PROJECT_ROOT).join("../../dev_assets");
    }

    match ProjectDirs::from("com", "portfolio", "portfolio-cms") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        // No home directory (e.g. a bare container user): stay next to the binary.
        None => PathBuf::from("portfolio-data"),
    }
    // ✔ macOS → ~/Library/Application Support/com.portfolio.portfolio-cms
    // ✔ Linux → ~/.local/share/portfolio-cms   (respects XDG_DATA_HOME)
    // ✔ Windows → %APPDATA%\portfolio\portfolio-cms
}

/// Get the database file path.
///
/// Respects the `PORTFOLIO_DATABASE_PATH` environment variable for custom locations.
/// Supports tilde expansion (e.g., `~/portfolio/db.sqlite`).
///
/// Default: `{asset_dir}/db.sqlite`
pub fn database_path() -> PathBuf {
    if let Ok(path) = std::env::var("PORTFOLIO_DATABASE_PATH") {
        return crate::path::expand_tilde(&path);
    }
    asset_dir().join("db.sqlite")
}

/// Default directory for rotating log files: `{asset_dir}/logs`.
pub fn log_dir() -> PathBuf {
    asset_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_database_path_default() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::remove_var("PORTFOLIO_DATABASE_PATH") };
        let path = database_path();
        assert!(path.ends_with("db.sqlite"));
    }

    #[test]
    #[serial]
    fn test_database_path_env_override() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("PORTFOLIO_DATABASE_PATH", "/custom/path/test.db") };
        let path = database_path();
        unsafe { env::remove_var("PORTFOLIO_DATABASE_PATH") };
        assert_eq!(path, PathBuf::from("/custom/path/test.db"));
    }

    #[test]
    fn test_log_dir_is_under_asset_dir() {
        assert!(log_dir().starts_with(asset_dir()));
        assert!(log_dir().ends_with("logs"));
    }
}
