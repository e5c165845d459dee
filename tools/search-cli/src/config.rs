//! Config file discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use edge_core::SearchConfig;

/// File names searched for, in order, from the working directory upwards.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["turbo-search.toml", ".turbo-search.toml", "turbo-search.json"];

/// Default base URL written by `config init`.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Find the nearest config file in `start` or its parents.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load config from `explicit`, or the nearest discovered file, or defaults.
/// Environment overrides are applied last.
pub fn load_config(explicit: Option<&str>, cwd: &Path) -> Result<(SearchConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(PathBuf::from(path)),
        None => find_config_file(cwd),
    };

    let config = match &path {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SearchConfig::default(),
    };

    Ok((config.with_env_overrides(), path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("turbo-search-cli-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_find_config_walks_up() {
        let root = scratch_dir("walk");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.join(".turbo-search.toml"),
            edge_core::generate_default_config(DEFAULT_BASE_URL),
        )
        .unwrap();

        assert_eq!(find_config_file(&nested), Some(root.join(".turbo-search.toml")));

        let (config, path) = load_config(None, &nested).unwrap();
        assert_eq!(path, Some(root.join(".turbo-search.toml")));
        assert_eq!(config.pagination.default_page_size, 12);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let root = scratch_dir("missing");
        let missing = root.join("nope.toml");
        assert!(load_config(missing.to_str(), &root).is_err());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
