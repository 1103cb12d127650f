//! Target disambiguation: one human-supplied identifier, exactly one DN.

use crate::core::directory::Directory;
use crate::util::prompt::Prompt;
use anyhow::{bail, Context, Result};
use tracing::debug;

/// Resolve a user identifier to a DN by cn/uid search under `base_dn`.
pub fn resolve_user(
    conn: &mut dyn Directory,
    base_dn: &str,
    term: &str,
    prompt: &mut dyn Prompt,
) -> Result<String> {
    let filter = format!("(|(cn={})(uid={}))", term, term);
    resolve_dn(conn, base_dn, &filter, term, prompt)
}

/// Resolve a group identifier to a DN by cn search under `base_dn`.
pub fn resolve_group(
    conn: &mut dyn Directory,
    base_dn: &str,
    term: &str,
    prompt: &mut dyn Prompt,
) -> Result<String> {
    let filter = format!(
        "(&(|(objectclass=groupOfNames)(objectclass=groupOfUniqueNames))(cn={}))",
        term
    );
    resolve_dn(conn, base_dn, &filter, term, prompt)
}

/// Search and narrow to exactly one DN. Zero matches is an error, a single
/// match is returned directly, multiple matches go through the interactive
/// single-select prompt. No caching: every call searches again.
pub fn resolve_dn(
    conn: &mut dyn Directory,
    base_dn: &str,
    filter: &str,
    term: &str,
    prompt: &mut dyn Prompt,
) -> Result<String> {
    if base_dn.is_empty() {
        bail!("no search base given, use --base or config ldap.base");
    }
    debug!(filter, base_dn, "search for target");
    let entries = conn
        .search(base_dn, filter, &["dn"])
        .with_context(|| format!("search for '{}' under {}", term, base_dn))?;

    match entries.len() {
        0 => bail!("no entry found for '{}' under {}", term, base_dn),
        1 => Ok(entries[0].dn.clone()),
        n => {
            debug!(count = n, "search returned multiple entries");
            let dns: Vec<String> = entries.iter().map(|e| e.dn.clone()).collect();
            let chosen = prompt.select("Select one of the following entries", &dns)?;
            Ok(dns[chosen].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::directory::DirEntry;
    use crate::util::prompt::testing::CannedPrompt;
    use anyhow::Result;
    use std::collections::BTreeMap;

    struct FakeDirectory {
        results: Vec<DirEntry>,
        last_filter: Option<String>,
    }

    impl FakeDirectory {
        fn with_dns(dns: &[&str]) -> Self {
            Self {
                results: dns
                    .iter()
                    .map(|dn| DirEntry {
                        dn: dn.to_string(),
                        attrs: BTreeMap::new(),
                    })
                    .collect(),
                last_filter: None,
            }
        }
    }

    impl Directory for FakeDirectory {
        fn search(&mut self, _base: &str, filter: &str, _attrs: &[&str]) -> Result<Vec<DirEntry>> {
            self.last_filter = Some(filter.to_string());
            Ok(self.results.clone())
        }

        fn retrieve_entry(
            &mut self,
            _dn: &str,
            _filter: &str,
            _attrs: &[&str],
        ) -> Result<Option<DirEntry>> {
            unreachable!("not used by target resolution")
        }

        fn modify_attribute(
            &mut self,
            _dn: &str,
            _op: crate::core::directory::ModifyOp,
            _attr: &str,
            _values: &[String],
        ) -> Result<()> {
            unreachable!("not used by target resolution")
        }

        fn set_password(&mut self, _dn: &str, _old: &str, _new: &str) -> Result<String> {
            unreachable!("not used by target resolution")
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_resolve_no_entry() {
        let mut dir = FakeDirectory::with_dns(&[]);
        let mut prompt = CannedPrompt::default();
        let err = resolve_user(&mut dir, "dc=example,dc=local", "nobody", &mut prompt).unwrap_err();
        assert!(err.to_string().contains("no entry found for 'nobody'"));
        assert_eq!(prompt.select_calls, 0);
    }

    #[test]
    fn test_resolve_single_entry_without_prompt() {
        let mut dir = FakeDirectory::with_dns(&["cn=test2,ou=Users,dc=example,dc=local"]);
        let mut prompt = CannedPrompt::default();
        let dn = resolve_user(&mut dir, "dc=example,dc=local", "test2", &mut prompt).unwrap();
        assert_eq!(dn, "cn=test2,ou=Users,dc=example,dc=local");
        assert_eq!(prompt.select_calls, 0);
        assert_eq!(
            dir.last_filter.as_deref(),
            Some("(|(cn=test2)(uid=test2))")
        );
    }

    #[test]
    fn test_resolve_multiple_entries_uses_selection() {
        let mut dir = FakeDirectory::with_dns(&[
            "cn=test,ou=Users,dc=example,dc=local",
            "cn=test,ou=Admins,dc=example,dc=local",
        ]);
        let mut prompt = CannedPrompt::with_selections(&[1]);
        let dn = resolve_user(&mut dir, "dc=example,dc=local", "test", &mut prompt).unwrap();
        assert_eq!(dn, "cn=test,ou=Admins,dc=example,dc=local");
        assert_eq!(prompt.select_calls, 1);
    }

    #[test]
    fn test_resolve_cancelled_selection_propagates() {
        let mut dir = FakeDirectory::with_dns(&["cn=a,dc=x", "cn=b,dc=x"]);
        let mut prompt = CannedPrompt::default();
        let err = resolve_user(&mut dir, "dc=x", "ab", &mut prompt).unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_resolve_missing_base() {
        let mut dir = FakeDirectory::with_dns(&[]);
        let mut prompt = CannedPrompt::default();
        let err = resolve_user(&mut dir, "", "test", &mut prompt).unwrap_err();
        assert!(err.to_string().contains("no search base"));
    }

    #[test]
    fn test_resolve_group_filter() {
        let mut dir = FakeDirectory::with_dns(&["cn=admins,ou=Groups,dc=x"]);
        let mut prompt = CannedPrompt::default();
        resolve_group(&mut dir, "dc=x", "admins", &mut prompt).unwrap();
        let filter = dir.last_filter.unwrap();
        assert!(filter.contains("groupOfUniqueNames"));
        assert!(filter.contains("(cn=admins)"));
    }
}
