//! Config-file discovery and value resolution.
//!
//! The config file is optional. Search order: current directory, the
//! per-user config directory, the per-user `etc` directory, the system-wide
//! directory. An explicitly named file that does not exist is an error; an
//! absent default file is not.

use crate::constants;
use crate::models::settings::ConfigFile;
use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A parsed config file plus where it came from (for relative lookups).
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub file: ConfigFile,
    pub path: Option<PathBuf>,
}

/// Load the config: the explicit `--config` path, or the first
/// `credops.yaml` found in the standard locations, or empty defaults.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("config file {} not found", path.display());
            }
            Some(path.to_path_buf())
        }
        None => search_config_file(),
    };

    let Some(path) = path else {
        return Ok(LoadedConfig::default());
    };
    debug!(path = %path.display(), "using config file");
    let content = fs::read_to_string(&path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let file: ConfigFile = serde_yaml::from_str(&content)
        .with_context(|| format!("parse config file {}", path.display()))?;
    Ok(LoadedConfig {
        file,
        path: Some(path),
    })
}

/// First value wins: flag, then config file, then environment.
pub fn pick(flag: Option<String>, config: Option<&str>, env_key: &str) -> Option<String> {
    flag.filter(|v| !v.is_empty())
        .or_else(|| config.map(str::to_string).filter(|v| !v.is_empty()))
        .or_else(|| env::var(env_key).ok().filter(|v| !v.is_empty()))
}

fn search_config_file() -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(home) = env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(constants::USER_CONFIG_DIR));
        dirs.push(home.join("etc"));
    }
    dirs.push(PathBuf::from(constants::SYSTEM_CONFIG_DIR));
    dirs.into_iter()
        .map(|d| d.join(constants::CONFIG_FILENAME))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_missing_is_error() {
        let err = load(Some(Path::new("/nonexistent/credops.yaml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credops.yaml");
        fs::write(&path, "ldap:\n  host: dir.example.com\n  port: 1389\n").unwrap();
        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.file.ldap.host.as_deref(), Some("dir.example.com"));
        assert_eq!(loaded.file.ldap.port, Some(1389));
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_explicit_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credops.yaml");
        fs::write(&path, "ldap: [not a mapping\n").unwrap();
        let err = load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("parse config file"));
    }

    #[test]
    fn test_pick_flag_wins() {
        let picked = pick(
            Some("flag".into()),
            Some("config"),
            "CREDOPS_TEST_PICK_UNSET",
        );
        assert_eq!(picked.as_deref(), Some("flag"));
    }

    #[test]
    fn test_pick_config_over_env() {
        env::set_var("CREDOPS_TEST_PICK_A", "env");
        let picked = pick(None, Some("config"), "CREDOPS_TEST_PICK_A");
        assert_eq!(picked.as_deref(), Some("config"));
        env::remove_var("CREDOPS_TEST_PICK_A");
    }

    #[test]
    fn test_pick_env_fallback() {
        env::set_var("CREDOPS_TEST_PICK_B", "env");
        let picked = pick(None, None, "CREDOPS_TEST_PICK_B");
        assert_eq!(picked.as_deref(), Some("env"));
        env::remove_var("CREDOPS_TEST_PICK_B");
    }

    #[test]
    fn test_pick_empty_values_skipped() {
        let picked = pick(Some(String::new()), Some(""), "CREDOPS_TEST_PICK_UNSET");
        assert_eq!(picked, None);
    }
}
