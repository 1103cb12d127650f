//! ldap3 adapter for the `Directory` port.
//!
//! Thin translation layer only: connection/bind, subtree and base searches,
//! attribute modification, and the password-modify extended operation. The
//! core never sees ldap3 types.

use crate::core::directory::{DirEntry, Directory, ModifyOp};
use crate::models::settings::LdapSettings;
use anyhow::{bail, Context, Result};
use ldap3::exop::{PasswordModify, PasswordModifyResp};
use ldap3::result::{ExopResult, LdapResult, SearchResult};
use ldap3::{LdapConn, LdapConnSettings, LdapError, Mod, Scope, SearchEntry};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// LDAP resultCode noSuchObject, returned for a base search on a missing DN.
const RC_NO_SUCH_OBJECT: u32 = 32;

pub struct LdapDirectory {
    ldap: LdapConn,
}

impl LdapDirectory {
    /// Connect and simple-bind. The timeout applies to the connection, not
    /// to individual operations.
    pub fn connect(settings: &LdapSettings, bind_dn: &str, password: &str) -> Result<Self> {
        let url = settings.url();
        debug!(url = %url, insecure = settings.insecure, "connect to directory");
        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(settings.timeout_secs))
            .set_no_tls_verify(settings.insecure);
        let mut ldap = LdapConn::with_settings(conn_settings, &url)
            .with_context(|| format!("connect to {}", url))?;
        ldap.simple_bind(bind_dn, password)
            .and_then(LdapResult::success)
            .with_context(|| format!("bind to {} as {}", url, bind_dn))?;
        Ok(Self { ldap })
    }
}

impl Directory for LdapDirectory {
    fn search(&mut self, base_dn: &str, filter: &str, attrs: &[&str]) -> Result<Vec<DirEntry>> {
        let attrs: Vec<String> = attrs.iter().map(|a| a.to_string()).collect();
        let (entries, _res) = self
            .ldap
            .search(base_dn, Scope::Subtree, filter, attrs)
            .and_then(SearchResult::success)
            .with_context(|| format!("search under {}", base_dn))?;
        Ok(entries
            .into_iter()
            .map(|e| to_dir_entry(SearchEntry::construct(e)))
            .collect())
    }

    fn retrieve_entry(
        &mut self,
        dn: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Option<DirEntry>> {
        let filter = if filter.is_empty() {
            "(objectClass=*)"
        } else {
            filter
        };
        let attrs: Vec<String> = attrs.iter().map(|a| a.to_string()).collect();
        let result = self
            .ldap
            .search(dn, Scope::Base, filter, attrs)
            .with_context(|| format!("read entry {}", dn))?;
        match result.success() {
            Ok((entries, _res)) => Ok(entries
                .into_iter()
                .next()
                .map(|e| to_dir_entry(SearchEntry::construct(e)))),
            Err(LdapError::LdapResult { result }) if result.rc == RC_NO_SUCH_OBJECT => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read entry {}", dn)),
        }
    }

    fn modify_attribute(
        &mut self,
        dn: &str,
        op: ModifyOp,
        attr: &str,
        values: &[String],
    ) -> Result<()> {
        let values: HashSet<String> = values.iter().cloned().collect();
        let change = match op {
            ModifyOp::Add => Mod::Add(attr.to_string(), values),
            ModifyOp::Replace => Mod::Replace(attr.to_string(), values),
            ModifyOp::Delete => Mod::Delete(attr.to_string(), values),
        };
        self.ldap
            .modify(dn, vec![change])
            .and_then(LdapResult::success)
            .with_context(|| format!("modify attribute {} on {}", attr, dn))?;
        Ok(())
    }

    fn set_password(
        &mut self,
        user_dn: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<String> {
        let exop = PasswordModify {
            user_id: non_empty(user_dn),
            old_pass: non_empty(old_password),
            new_pass: non_empty(new_password),
        };
        let ExopResult(exop, res) = self
            .ldap
            .extended(exop)
            .context("password modify operation")?;
        if res.rc != 0 {
            bail!("password modify rejected: {} (rc={})", res.text, res.rc);
        }
        // servers that generate the password return it in the response value
        if exop.val.is_some() {
            let resp: PasswordModifyResp = exop.parse();
            Ok(resp.gen_pass)
        } else {
            Ok(String::new())
        }
    }

    fn close(&mut self) {
        let _ = self.ldap.unbind();
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn to_dir_entry(entry: SearchEntry) -> DirEntry {
    DirEntry {
        dn: entry.dn,
        attrs: entry.attrs.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("cn=x"), Some("cn=x"));
    }

    #[test]
    fn test_to_dir_entry_converts_attrs() {
        let entry = SearchEntry {
            dn: "cn=a,dc=x".into(),
            attrs: [("cn".to_string(), vec!["a".to_string()])].into_iter().collect(),
            bin_attrs: Default::default(),
        };
        let dir_entry = to_dir_entry(entry);
        assert_eq!(dir_entry.dn, "cn=a,dc=x");
        assert_eq!(dir_entry.attr_value("cn"), "a");
    }
}
