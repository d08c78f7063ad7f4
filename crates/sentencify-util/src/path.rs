//! Path utilities.

use std::path::{Path, PathBuf};

/// Get the sentencify configuration directory.
///
/// This follows XDG conventions on Linux/macOS:
/// - `$XDG_CONFIG_HOME/sentencify` if set
/// - `~/.config/sentencify` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sentencify"))
}

/// Get the sentencify data directory.
///
/// - `$XDG_DATA_HOME/sentencify` if set
/// - `~/.local/share/sentencify` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("sentencify"))
}

/// Default location of the version history store.
pub fn history_dir() -> Option<PathBuf> {
    data_dir().map(|p| p.join("history"))
}

/// Resolve a possibly relative path against a base directory.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_dir_is_under_data_dir() {
        if let (Some(data), Some(history)) = (data_dir(), history_dir()) {
            assert!(history.starts_with(&data));
            assert!(history.ends_with("history"));
        }
    }

    #[test]
    fn test_resolve_relative() {
        let base = tempfile::tempdir().unwrap();
        let resolved = resolve(base.path(), Path::new("store"));
        assert_eq!(resolved, base.path().join("store"));
    }

    #[test]
    fn test_resolve_absolute_is_untouched() {
        let base = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let resolved = resolve(base.path(), other.path());
        assert_eq!(resolved, other.path());
    }
}
