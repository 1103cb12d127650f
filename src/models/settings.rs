//! Config-file model and per-invocation settings.
//!
//! The config file is optional YAML; every field can also come from a flag or
//! an environment variable. `LdapSettings` and `VaultSettings` are built once
//! per invocation and passed by reference afterwards — nothing here is
//! mutated after construction.

use crate::constants;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub ldap: LdapSection,
    #[serde(default)]
    pub vault: VaultSection,
    /// Filename of an external password-profile catalog.
    #[serde(default)]
    pub password_profiles: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LdapSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub binddn: Option<String>,
    #[serde(default)]
    pub bindpassword: Option<String>,
    #[serde(default)]
    pub groupbase: Option<String>,
    #[serde(default)]
    pub tls: Option<bool>,
    #[serde(default)]
    pub insecure: Option<bool>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultSection {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub mount: Option<String>,
}

/// Resolved directory connection settings for one invocation.
#[derive(Debug, Clone)]
pub struct LdapSettings {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub insecure: bool,
    pub timeout_secs: u64,
    pub base_dn: String,
    pub bind_dn: String,
    pub bind_password: String,
    pub group_base: String,
}

impl LdapSettings {
    /// ldap:// or ldaps:// URL for this server.
    pub fn url(&self) -> String {
        let scheme = if self.tls { "ldaps" } else { "ldap" };
        let port = if self.port != 0 {
            self.port
        } else if self.tls {
            636
        } else {
            389
        };
        format!("{}://{}:{}", scheme, self.host, port)
    }
}

/// Resolved secret-store settings for one invocation.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub addr: String,
    pub token: String,
    pub mount: String,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            addr: String::new(),
            token: String::new(),
            mount: constants::DEFAULT_KV_MOUNT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ldap_url_plain() {
        let s = LdapSettings {
            host: "ldap.example.com".into(),
            port: 0,
            tls: false,
            insecure: false,
            timeout_secs: 20,
            base_dn: String::new(),
            bind_dn: String::new(),
            bind_password: String::new(),
            group_base: String::new(),
        };
        assert_eq!(s.url(), "ldap://ldap.example.com:389");
    }

    #[test]
    fn test_ldap_url_tls_default_port() {
        let s = LdapSettings {
            host: "ldap.example.com".into(),
            port: 0,
            tls: true,
            insecure: true,
            timeout_secs: 20,
            base_dn: String::new(),
            bind_dn: String::new(),
            bind_password: String::new(),
            group_base: String::new(),
        };
        assert_eq!(s.url(), "ldaps://ldap.example.com:636");
    }

    #[test]
    fn test_ldap_url_explicit_port() {
        let s = LdapSettings {
            host: "localhost".into(),
            port: 1636,
            tls: true,
            insecure: false,
            timeout_secs: 20,
            base_dn: String::new(),
            bind_dn: String::new(),
            bind_password: String::new(),
            group_base: String::new(),
        };
        assert_eq!(s.url(), "ldaps://localhost:1636");
    }

    #[test]
    fn test_config_file_parses_partial_yaml() {
        let cfg: ConfigFile = serde_yaml::from_str("ldap:\n  host: dir.example.com\n").unwrap();
        assert_eq!(cfg.ldap.host.as_deref(), Some("dir.example.com"));
        assert!(cfg.vault.addr.is_none());
        assert!(cfg.password_profiles.is_none());
    }
}
