use std::path::PathBuf;

use directories::BaseDirs;

/// Expand a leading `~` to the current user's home directory.
///
/// Paths without a leading tilde, or when no home directory can be
/// determined, are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());

    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') || rest.starts_with('\\') => {
            home.join(&rest[1..])
        }
        _ => PathBuf::from(path),
    }
}
