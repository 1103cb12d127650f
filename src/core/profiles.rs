//! Password-profile resolution.
//!
//! A single effective profile set comes from either a named entry of the
//! merged catalog (builtin + optional external YAML file) or an ad-hoc
//! six-token descriptor. The external catalog strictly overrides the builtin
//! on name collision and is unioned otherwise.

use crate::constants;
use crate::models::profile::{PasswordProfile, ProfileCatalog, ProfileSet};
use crate::models::settings::ConfigFile;
use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the caller asked for, straight from the flags.
#[derive(Debug, Default)]
pub struct ProfileRequest<'a> {
    /// Named profile set (`--profile-set`).
    pub set_name: Option<&'a str>,
    /// Ad-hoc descriptor (`--profile`), e.g. `"16 1 1 1 1 1"`.
    pub descriptor: Option<&'a str>,
    /// Charset override (`--special-chars`).
    pub special_chars: Option<&'a str>,
    /// External catalog filename (`--profiles-file`).
    pub profiles_file: Option<&'a str>,
}

/// Resolve one effective profile set per the request.
pub fn resolve(
    req: &ProfileRequest,
    config: &ConfigFile,
    config_path: Option<&Path>,
) -> Result<ProfileSet> {
    let named = req.set_name.unwrap_or("");
    let descriptor = req.descriptor.unwrap_or("");
    if !named.is_empty() && !descriptor.is_empty() {
        bail!("profile-set and profile are mutually exclusive");
    }

    let mut set = if !descriptor.is_empty() {
        debug!(descriptor, "resolve ad-hoc profile");
        ProfileSet {
            profile: parse_descriptor(descriptor)?,
            special_chars: String::new(),
        }
    } else {
        let name = if named.is_empty() {
            debug!("assume default profile set {}", constants::DEFAULT_PROFILE_SET);
            constants::DEFAULT_PROFILE_SET
        } else {
            named
        };
        let catalog = load_merged_catalog(req.profiles_file, config, config_path)?;
        match catalog.get(name) {
            Some(set) => set.clone(),
            None => bail!("profile set '{}' not found", name),
        }
    };

    if let Some(chars) = req.special_chars {
        if !chars.is_empty() {
            set.special_chars = chars.to_string();
        }
    }
    Ok(set)
}

/// Serialize the merged catalog for `--list-profiles`, marking the default.
pub fn list_profiles(
    profiles_file: Option<&str>,
    config: &ConfigFile,
    config_path: Option<&Path>,
) -> Result<String> {
    let catalog = load_merged_catalog(profiles_file, config, config_path)?;
    let body = serde_yaml::to_string(&catalog).context("serialize profile catalog")?;
    Ok(format!(
        "# default profile set: {}\n{}",
        constants::DEFAULT_PROFILE_SET,
        body
    ))
}

/// Parse a six-token descriptor: `length upper lower digits specials first(0|1)`.
pub fn parse_descriptor(descriptor: &str) -> Result<PasswordProfile> {
    const SHAPE: &str = "'length upper lower digits specials first_is_char(0|1)'";
    let tokens: Vec<&str> = descriptor.split_whitespace().collect();
    if tokens.len() != 6 {
        bail!(
            "invalid profile '{}': expected six numbers as {}",
            descriptor,
            SHAPE
        );
    }
    let mut nums = [0usize; 5];
    for (i, tok) in tokens[..5].iter().enumerate() {
        nums[i] = tok.parse().map_err(|_| {
            anyhow::anyhow!("invalid profile '{}': '{}' is not a number, expected {}", descriptor, tok, SHAPE)
        })?;
    }
    let first_is_char = match tokens[5] {
        "0" => false,
        "1" => true,
        other => bail!(
            "invalid profile '{}': first_is_char flag '{}' must be 0 or 1",
            descriptor,
            other
        ),
    };
    Ok(PasswordProfile {
        length: nums[0],
        upper: nums[1],
        lower: nums[2],
        digits: nums[3],
        specials: nums[4],
        first_is_char,
    })
}

/// Merge an external catalog over the builtin one: external wins on name
/// collision, names unique to either side are kept.
pub fn merge_catalogs(builtin: ProfileCatalog, external: ProfileCatalog) -> ProfileCatalog {
    let mut merged = builtin;
    for (name, set) in external {
        merged.insert(name, set);
    }
    merged
}

/// Builtin catalog. Failure means the compiled-in YAML is corrupt.
pub fn builtin_catalog() -> Result<ProfileCatalog> {
    serde_yaml::from_str(constants::BUILTIN_PROFILE_SETS)
        .context("parse builtin profile catalog")
}

fn load_merged_catalog(
    profiles_file: Option<&str>,
    config: &ConfigFile,
    config_path: Option<&Path>,
) -> Result<ProfileCatalog> {
    let builtin = builtin_catalog()?;
    let filename = profiles_file
        .map(str::to_string)
        .or_else(|| config.password_profiles.clone())
        .unwrap_or_else(|| constants::PROFILES_FILENAME.to_string());

    let candidates = search_dirs(config_path);
    let Some(path) = find_in_dirs(&filename, &candidates) else {
        debug!(file = %filename, "no external profile catalog found");
        return Ok(builtin);
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("read password profiles from {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(builtin);
    }
    debug!(path = %path.display(), "loading external profile catalog");
    let external: ProfileCatalog = serde_yaml::from_str(&content)
        .with_context(|| format!("parse password profiles from {}", path.display()))?;
    Ok(merge_catalogs(builtin, external))
}

/// Candidate directories for the external catalog, in search order.
fn search_dirs(config_path: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = config_path.and_then(Path::parent) {
        dirs.push(dir.to_path_buf());
    }
    dirs.push(PathBuf::from("."));
    if let Some(home) = env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(constants::USER_CONFIG_DIR));
        dirs.push(home.join("etc"));
    }
    dirs.push(PathBuf::from(constants::SYSTEM_CONFIG_DIR));
    dirs
}

fn find_in_dirs(filename: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|d| d.join(filename))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn request(descriptor: Option<&'static str>, set: Option<&'static str>) -> ProfileRequest<'static> {
        ProfileRequest {
            set_name: set,
            descriptor,
            ..ProfileRequest::default()
        }
    }

    #[test]
    fn test_parse_descriptor_valid() {
        let p = parse_descriptor("10 1 1 1 0 1").unwrap();
        assert_eq!(
            p,
            PasswordProfile {
                length: 10,
                upper: 1,
                lower: 1,
                digits: 1,
                specials: 0,
                first_is_char: true,
            }
        );
    }

    #[test]
    fn test_parse_descriptor_too_few_tokens() {
        let err = parse_descriptor("10 1 1").unwrap_err();
        assert!(err.to_string().contains("expected six numbers"));
    }

    #[test]
    fn test_parse_descriptor_non_integer() {
        let err = parse_descriptor("10 x 1 1 0 1").unwrap_err();
        assert!(err.to_string().contains("'x' is not a number"));
    }

    #[test]
    fn test_parse_descriptor_bad_flag() {
        let err = parse_descriptor("10 1 1 1 0 2").unwrap_err();
        assert!(err.to_string().contains("must be 0 or 1"));
    }

    #[test]
    fn test_builtin_catalog_has_named_sets() {
        let catalog = builtin_catalog().unwrap();
        assert!(catalog.contains_key("default"));
        assert!(catalog.contains_key("easy"));
        assert!(catalog.contains_key("strong"));
        let default = &catalog["default"];
        assert_eq!(default.profile.length, 16);
        assert!(default.profile.first_is_char);
        let easy = &catalog["easy"];
        assert_eq!(easy.profile.length, 8);
        assert_eq!(easy.profile.specials, 0);
        assert!(easy.special_chars.is_empty());
    }

    #[test]
    fn test_merge_external_overrides_and_unions() {
        let builtin = builtin_catalog().unwrap();
        let mut external = ProfileCatalog::new();
        let easy_override = ProfileSet {
            profile: PasswordProfile {
                length: 12,
                ..PasswordProfile::default()
            },
            special_chars: String::new(),
        };
        let custom = ProfileSet {
            profile: PasswordProfile {
                length: 20,
                ..PasswordProfile::default()
            },
            special_chars: "#".into(),
        };
        external.insert("easy".into(), easy_override.clone());
        external.insert("custom".into(), custom.clone());

        let merged = merge_catalogs(builtin.clone(), external);
        assert_eq!(merged["easy"], easy_override);
        assert_eq!(merged["custom"], custom);
        assert_eq!(merged["default"], builtin["default"]);
        assert_eq!(merged["strong"], builtin["strong"]);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_resolve_mutually_exclusive() {
        let req = request(Some("8 1 1 1 0 0"), Some("easy"));
        let err = resolve(&req, &ConfigFile::default(), None).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_resolve_defaults_to_default_set() {
        let set = resolve(&request(None, None), &ConfigFile::default(), None).unwrap();
        assert_eq!(set.profile.length, 16);
        assert!(!set.special_chars.is_empty());
    }

    #[test]
    fn test_resolve_adhoc_uses_empty_charset() {
        let set = resolve(
            &request(Some("10 1 1 1 0 1"), None),
            &ConfigFile::default(),
            None,
        )
        .unwrap();
        assert_eq!(set.profile.length, 10);
        assert!(set.special_chars.is_empty());
    }

    #[test]
    fn test_resolve_charset_override() {
        let req = ProfileRequest {
            set_name: Some("strong"),
            special_chars: Some("#!"),
            ..ProfileRequest::default()
        };
        let set = resolve(&req, &ConfigFile::default(), None).unwrap();
        assert_eq!(set.special_chars, "#!");
    }

    #[test]
    fn test_resolve_unknown_set() {
        let err = resolve(&request(None, Some("nosuch")), &ConfigFile::default(), None).unwrap_err();
        assert!(err.to_string().contains("profile set 'nosuch' not found"));
    }

    #[test]
    fn test_resolve_named_set_missing_from_external_file() {
        // an external file without "easy" leaves the builtin entry intact
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiles.yaml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "custom:\n  profile:\n    length: 20").unwrap();

        let req = ProfileRequest {
            set_name: Some("easy"),
            profiles_file: path.to_str(),
            ..ProfileRequest::default()
        };
        let set = resolve(&req, &ConfigFile::default(), Some(dir.path().join("x").as_path()))
            .unwrap();
        assert_eq!(set.profile.length, 8);
    }

    #[test]
    fn test_external_file_found_via_config_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("profiles.yaml"),
            "easy:\n  profile:\n    length: 33\n",
        )
        .unwrap();
        let config_path = dir.path().join("credops.yaml");

        let req = ProfileRequest {
            set_name: Some("easy"),
            profiles_file: Some("profiles.yaml"),
            ..ProfileRequest::default()
        };
        let set = resolve(&req, &ConfigFile::default(), Some(&config_path)).unwrap();
        assert_eq!(set.profile.length, 33);
    }

    #[test]
    fn test_list_profiles_marks_default() {
        let out = list_profiles(None, &ConfigFile::default(), None).unwrap();
        assert!(out.starts_with("# default profile set: default\n"));
        assert!(out.contains("strong:"));
    }
}
