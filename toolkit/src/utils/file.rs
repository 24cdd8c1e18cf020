//! File utility functions

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::constants::STDIN_PATH;

/// Expand `~` and make relative paths absolute against the working directory
///
/// ```text
/// expand_path("~/.predsql/predsql.json") // -> /home/user/.predsql/predsql.json
/// expand_path("filters/active.json")     // -> /current/dir/filters/active.json
/// expand_path("/etc/predsql.json")       // -> /etc/predsql.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Read a document from a file path, or from stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        return Ok(buf);
    }

    let resolved = expand_path(&path.to_string_lossy());
    std::fs::read_to_string(&resolved)
        .with_context(|| format!("Failed to read {}", resolved.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_path_relative() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("filters/a.json"), cwd.join("filters/a.json"));
        assert_eq!(expand_path("  a.json  "), cwd.join("a.json"));
    }

    #[test]
    fn test_expand_path_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/.predsql"), home.join(".predsql"));
        }
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predicate.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(read_input(&path).unwrap(), "{}");
    }

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
