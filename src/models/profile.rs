//! Password profile and profile-set models.
//!
//! A profile describes the shape of a generated password; a profile set pairs
//! it with an optional special-character override. Catalogs map set names to
//! profile sets and are merged from a compiled-in default and an optional
//! external YAML file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape of a generated password. Immutable once resolved for an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PasswordProfile {
    pub length: usize,
    #[serde(default)]
    pub upper: usize,
    #[serde(default)]
    pub lower: usize,
    #[serde(default)]
    pub digits: usize,
    #[serde(default)]
    pub specials: usize,
    #[serde(default)]
    pub first_is_char: bool,
}

/// A named catalog entry: profile plus allowed special characters.
/// An empty `special_chars` means "use the system default charset".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileSet {
    pub profile: PasswordProfile,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub special_chars: String,
}

/// Name → profile set. `BTreeMap` keeps the list output stable.
pub type ProfileCatalog = BTreeMap<String, ProfileSet>;
