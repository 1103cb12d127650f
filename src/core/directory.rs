//! Directory access port.
//!
//! The core never touches the LDAP protocol directly; it speaks this trait,
//! satisfied by the ldap3 adapter in `util::ldap` and by fakes in tests.

use anyhow::Result;
use std::collections::BTreeMap;

/// One directory entry: its DN and the requested attributes.
#[derive(Debug, Clone, Default)]
pub struct DirEntry {
    pub dn: String,
    pub attrs: BTreeMap<String, Vec<String>>,
}

impl DirEntry {
    /// First value of an attribute, or empty string.
    pub fn attr_value(&self, name: &str) -> &str {
        self.attrs
            .get(name)
            .and_then(|v| v.first())
            .map_or("", String::as_str)
    }

    /// Whether the attribute is present with at least one value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Whether the entry carries the given object class (case-insensitive,
    /// as directory servers treat objectClass values).
    pub fn has_object_class(&self, class: &str) -> bool {
        self.attrs
            .get("objectClass")
            .into_iter()
            .flatten()
            .any(|v| v.eq_ignore_ascii_case(class))
    }
}

/// Attribute modification verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOp {
    Add,
    Replace,
    Delete,
}

/// A bound directory connection.
pub trait Directory {
    /// Subtree search from `base_dn`, returning matching entries with the
    /// requested attributes.
    fn search(&mut self, base_dn: &str, filter: &str, attrs: &[&str]) -> Result<Vec<DirEntry>>;

    /// Read a single entry by DN. `filter` may be empty (match anything).
    /// Returns `None` when the entry does not exist.
    fn retrieve_entry(
        &mut self,
        dn: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Option<DirEntry>>;

    /// Apply one attribute modification to an entry.
    fn modify_attribute(
        &mut self,
        dn: &str,
        op: ModifyOp,
        attr: &str,
        values: &[String],
    ) -> Result<()>;

    /// Password-modify operation. An empty `user_dn` targets the bound user
    /// (self-service convention). Returns the server-generated password when
    /// the server chose its own value, empty string otherwise.
    fn set_password(&mut self, user_dn: &str, old_password: &str, new_password: &str)
        -> Result<String>;

    /// Close the connection. Errors on unbind are ignored.
    fn close(&mut self);
}
