//! Verified credential mutation.
//!
//! Both rotations follow one shape: resolve target, determine authorization
//! mode, resolve the new value, mutate, verify by an independent read, and
//! only then report success. Every step is a single best-effort attempt;
//! a failed verification after a successful mutation is reported as its own
//! condition so the operator knows the directory state may have changed.

use crate::constants;
use crate::core::directory::{Directory, ModifyOp};
use crate::core::profiles::{self, ProfileRequest};
use crate::core::pwgen;
use crate::models::settings::ConfigFile;
use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::util::prompt::Prompt;

/// How the mutation is authorized against the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Target is the bound user: the old secret is the bind password and the
    /// explicit-target parameter stays empty (server convention).
    SelfService,
    /// Administrative reset of another entry: explicit target DN, no old
    /// secret.
    Administrative,
}

/// Self-service iff the target DN equals the bind DN, exact match.
pub fn auth_mode(target_dn: &str, bind_dn: &str) -> AuthMode {
    if target_dn == bind_dn {
        AuthMode::SelfService
    } else {
        AuthMode::Administrative
    }
}

/// Competing sources for the new password, already gathered by the caller.
#[derive(Debug, Default)]
pub struct NewPasswordRequest<'a> {
    /// `--new-password` flag value.
    pub explicit: Option<&'a str>,
    /// `LDAP_NEW_PASSWORD` environment value.
    pub from_env: Option<&'a str>,
    /// `--generate` flag.
    pub generate: bool,
    /// Profile flags, consulted only when generating.
    pub profile: ProfileRequest<'a>,
}

/// A resolved new secret and whether it was synthesized locally.
#[derive(Debug)]
pub struct ResolvedSecret {
    pub value: Zeroizing<String>,
    pub generated: bool,
}

/// Resolve the new password: explicit flag, then environment, then (only on
/// request) generation, then interactive double entry. In non-interactive
/// mode the confirmation entry is skipped.
pub fn resolve_new_password(
    req: &NewPasswordRequest,
    config: &ConfigFile,
    config_path: Option<&Path>,
    prompt: &mut dyn Prompt,
    non_interactive: bool,
) -> Result<ResolvedSecret> {
    if req.generate {
        let set = profiles::resolve(&req.profile, config, config_path)?;
        let pw = pwgen::generate(&set)?;
        return Ok(ResolvedSecret {
            value: Zeroizing::new(pw),
            generated: true,
        });
    }
    if let Some(pw) = req.explicit.filter(|p| !p.is_empty()) {
        return Ok(ResolvedSecret {
            value: Zeroizing::new(pw.to_string()),
            generated: false,
        });
    }
    if let Some(pw) = req.from_env.filter(|p| !p.is_empty()) {
        debug!("use new password from environment");
        return Ok(ResolvedSecret {
            value: Zeroizing::new(pw.to_string()),
            generated: false,
        });
    }

    let pw = prompt.secret("Enter NEW password")?;
    if !non_interactive {
        let repeat = prompt.secret("Repeat NEW password")?;
        if pw != repeat {
            bail!("passwords do not match");
        }
    }
    Ok(ResolvedSecret {
        value: Zeroizing::new(pw),
        generated: false,
    })
}

/// Parameters of one password change.
#[derive(Debug)]
pub struct PasswordChange<'a> {
    pub target_dn: &'a str,
    pub bind_dn: &'a str,
    pub bind_password: &'a str,
}

/// Result of the mutation step: the secret that is actually in effect.
pub struct PasswordApplied {
    pub dn: String,
    /// The secret to verify and report: the server-generated password when
    /// the server chose its own, otherwise the supplied one.
    pub effective: Zeroizing<String>,
    pub server_generated: bool,
}

/// Issue the password-modify operation and close the connection afterwards,
/// so the verification bind cannot reuse this session.
pub fn apply_password_change(
    conn: &mut dyn Directory,
    change: &PasswordChange,
    new_password: &str,
) -> Result<PasswordApplied> {
    let mode = auth_mode(change.target_dn, change.bind_dn);
    let (old_password, explicit_target) = match mode {
        AuthMode::SelfService => {
            debug!("change password for the bound user");
            (change.bind_password, "")
        }
        AuthMode::Administrative => ("", change.target_dn),
    };

    let generated = conn
        .set_password(explicit_target, old_password, new_password)
        .with_context(|| format!("password change for {} failed", change.target_dn))?;
    info!("password for {} changed", change.target_dn);
    conn.close();

    let (effective, server_generated) = if generated.is_empty() {
        (new_password.to_string(), false)
    } else {
        (generated, true)
    };
    Ok(PasswordApplied {
        dn: change.target_dn.to_string(),
        effective: Zeroizing::new(effective),
        server_generated,
    })
}

/// Verify a password change by a fresh bind as the target. A failure here is
/// reported as "changed but verification failed" — the mutation itself went
/// through.
pub fn verify_password<D, F>(reconnect: F, dn: &str, password: &str) -> Result<()>
where
    D: Directory,
    F: FnOnce(&str, &str) -> Result<D>,
{
    debug!(dn, "reconnect with new password to verify");
    match reconnect(dn, password) {
        Ok(mut conn) => {
            conn.close();
            Ok(())
        }
        Err(e) => Err(anyhow!(
            "password for {} changed but verification failed: {:#}",
            dn,
            e
        )),
    }
}

/// Read SSH public key material for upload. The content is used byte for
/// byte, trailing whitespace included.
pub fn read_key_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        bail!("ssh public key file {} not found", path.display());
    }
    fs::read_to_string(path)
        .with_context(|| format!("ssh public key file {} not readable", path.display()))
}

/// Set the SSH public key attribute on an eligible entry and verify the
/// write by re-reading the attribute.
pub fn change_ssh_key(conn: &mut dyn Directory, target_dn: &str, pub_key: &str) -> Result<()> {
    let entry = conn
        .retrieve_entry(target_dn, "", &["*"])
        .with_context(|| format!("search for {} failed", target_dn))?
        .ok_or_else(|| anyhow!("search for {} returned no entry", target_dn))?;

    if !entry.has_object_class(constants::LDAP_PUBLIC_KEY_OBJECT_CLASS) {
        bail!(
            "entry {} is not eligible for {} (missing objectClass {})",
            target_dn,
            constants::LDAP_SSH_ATTR,
            constants::LDAP_PUBLIC_KEY_OBJECT_CLASS
        );
    }

    // add on a missing attribute, replace otherwise; the wrong verb is a
    // directory-side error
    let op = if entry.has_attr(constants::LDAP_SSH_ATTR) {
        ModifyOp::Replace
    } else {
        ModifyOp::Add
    };
    debug!(?op, dn = target_dn, "apply ssh key modification");
    conn.modify_attribute(target_dn, op, constants::LDAP_SSH_ATTR, &[pub_key.to_string()])
        .with_context(|| format!("ssh key change for {} failed", target_dn))?;

    let entry = conn
        .retrieve_entry(target_dn, "", &[constants::LDAP_SSH_ATTR])
        .with_context(|| format!("ssh key for {} changed but verification failed", target_dn))?
        .ok_or_else(|| {
            anyhow!(
                "ssh key for {} changed but verification failed: entry not found",
                target_dn
            )
        })?;
    if entry.attr_value(constants::LDAP_SSH_ATTR) != pub_key {
        bail!(
            "ssh key for {} changed but verification failed: attribute value differs",
            target_dn
        );
    }
    info!("ssh key for {} changed", target_dn);
    Ok(())
}
