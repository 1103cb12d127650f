//! Directory commands: password and SSH key rotation, attribute and group
//! inspection.

use crate::cli::CliContext;
use crate::constants;
use crate::core::config::pick;
use crate::core::directory::Directory;
use crate::core::profiles::ProfileRequest;
use crate::core::rotate::{self, NewPasswordRequest, PasswordChange};
use crate::core::target;
use crate::models::settings::LdapSettings;
use crate::util::ldap::LdapDirectory;
use crate::util::prompt::{Prompt, TermPrompt};
use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};

/// Connection flags shared by every directory command.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Hostname of the directory server
    #[arg(long, short = 'H')]
    pub host: Option<String>,

    /// Port to connect, defaults to 389 (or 636 with --tls)
    #[arg(long, short = 'P')]
    pub port: Option<u16>,

    /// Search base DN, derived from the bind DN when absent
    #[arg(long, short = 'b')]
    pub base: Option<String>,

    /// DN of the user for the directory bind, or env LDAP_BIND_DN
    #[arg(long = "bind-dn", short = 'B')]
    pub bind_dn: Option<String>,

    /// Password for the bind user, or env LDAP_BIND_PASSWORD, or be prompted
    #[arg(long = "bind-password", short = 'p')]
    pub bind_password: Option<String>,

    /// Use secure ldap (ldaps)
    #[arg(long)]
    pub tls: bool,

    /// Do not verify TLS certificates
    #[arg(long, short = 'I')]
    pub insecure: bool,

    /// Connection timeout in seconds
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,
}

/// Target selection flags: explicit DN or a search term.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// DN of the target entry for administrative changes, empty for the bind user
    #[arg(long = "target-dn", short = 'T')]
    pub target_dn: Option<String>,

    /// cn or uid to search for the target DN
    #[arg(long = "target-user", short = 'U')]
    pub target_user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LdapCommand {
    /// Change the password of the bind user or of an administrative target
    #[command(name = "set-password", visible_alias = "change-password")]
    SetPassword(SetPasswordArgs),
    /// Upload an SSH public key to the target entry
    #[command(name = "set-ssh-key", visible_alias = "change-sshpubkey")]
    SetSshKey(SetSshKeyArgs),
    /// Show attributes of the target entry
    #[command(visible_alias = "show-attributes")]
    Show(ShowArgs),
    /// Show group memberships of the target entry
    #[command(visible_alias = "show-groups")]
    Groups(GroupsArgs),
    /// Show members of a group
    #[command(visible_alias = "show-members")]
    Members(MembersArgs),
}

#[derive(Args, Debug)]
pub struct SetPasswordArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// New password to set, or env LDAP_NEW_PASSWORD, or be prompted
    #[arg(long = "new-password", short = 'n', conflicts_with = "generate")]
    pub new_password: Option<String>,

    /// Generate the new password instead of prompting
    #[arg(long, short = 'g')]
    pub generate: bool,

    /// Generation profile as 'length upper lower digits specials first_is_char(0|1)'
    #[arg(long, default_value = constants::LDAP_PASSWORD_PROFILE)]
    pub profile: String,
}

#[derive(Args, Debug)]
pub struct SetSshKeyArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// File with the ssh public key to upload
    #[arg(long = "ssh-key-file", short = 'f', default_value = constants::DEFAULT_SSH_KEY_FILE)]
    pub ssh_key_file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Comma separated list of attributes to show
    #[arg(long, short = 'A', default_value = "*")]
    pub attributes: String,
}

#[derive(Args, Debug)]
pub struct GroupsArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Base DN for the group search, defaults to the search base
    #[arg(long = "group-base", short = 'G')]
    pub group_base: Option<String>,
}

#[derive(Args, Debug)]
pub struct MembersArgs {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    /// Group DN, or a cn to search below the group base
    #[arg(long, short = 'g')]
    pub group: String,

    /// Base DN for the group search, defaults to the search base
    #[arg(long = "group-base", short = 'G')]
    pub group_base: Option<String>,
}

pub fn run(ctx: &CliContext, command: LdapCommand) -> Result<()> {
    match command {
        LdapCommand::SetPassword(args) => run_set_password(ctx, args),
        LdapCommand::SetSshKey(args) => run_set_ssh_key(ctx, args),
        LdapCommand::Show(args) => run_show(ctx, args),
        LdapCommand::Groups(args) => run_groups(ctx, args),
        LdapCommand::Members(args) => run_members(ctx, args),
    }
}

fn run_set_password(ctx: &CliContext, args: SetPasswordArgs) -> Result<()> {
    let mut prompt = TermPrompt;
    let settings = build_settings(ctx, &args.conn, &mut prompt)?;
    let mut conn = login(&settings)?;
    let target_dn = resolve_target(&mut conn, &settings, &args.target, &mut prompt)?;
    debug!(%target_dn, "password change target");

    let env_password = env::var("LDAP_NEW_PASSWORD").ok();
    let needs_prompt = !args.generate
        && args.new_password.as_deref().map_or(true, str::is_empty)
        && env_password.as_deref().map_or(true, str::is_empty);
    if needs_prompt {
        println!("Change password for {}", target_dn);
    }
    let request = NewPasswordRequest {
        explicit: args.new_password.as_deref(),
        from_env: env_password.as_deref(),
        generate: args.generate,
        profile: ProfileRequest {
            descriptor: Some(&args.profile),
            ..ProfileRequest::default()
        },
    };
    let secret = rotate::resolve_new_password(
        &request,
        &ctx.config.file,
        ctx.config.path.as_deref(),
        &mut prompt,
        ctx.non_interactive,
    )?;
    if secret.generated {
        println!("generated Password: {}", secret.value.as_str());
    }
    if secret.value.is_empty() {
        info!("no new password given, some directory servers will generate one");
    }

    let change = PasswordChange {
        target_dn: &target_dn,
        bind_dn: &settings.bind_dn,
        bind_password: &settings.bind_password,
    };
    let applied = rotate::apply_password_change(&mut conn, &change, &secret.value)?;
    if applied.server_generated {
        println!("generated Password: {}", applied.effective.as_str());
    }
    rotate::verify_password(
        |dn, pw| LdapDirectory::connect(&settings, dn, pw),
        &applied.dn,
        &applied.effective,
    )?;
    println!("Password for {} changed and tested", applied.dn);
    Ok(())
}

fn run_set_ssh_key(ctx: &CliContext, args: SetSshKeyArgs) -> Result<()> {
    let mut prompt = TermPrompt;
    let settings = build_settings(ctx, &args.conn, &mut prompt)?;
    let mut conn = login(&settings)?;
    let target_dn = resolve_target(&mut conn, &settings, &args.target, &mut prompt)?;
    debug!(%target_dn, "ssh key target");

    let key = rotate::read_key_file(&args.ssh_key_file)?;
    rotate::change_ssh_key(&mut conn, &target_dn, &key)?;
    conn.close();
    println!("SSH key for {} changed and tested", target_dn);
    Ok(())
}

fn run_show(ctx: &CliContext, args: ShowArgs) -> Result<()> {
    let mut prompt = TermPrompt;
    let settings = build_settings(ctx, &args.conn, &mut prompt)?;
    let mut conn = login(&settings)?;
    let target_dn = resolve_target(&mut conn, &settings, &args.target, &mut prompt)?;

    let attrs: Vec<&str> = args
        .attributes
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    let entry = conn
        .retrieve_entry(&target_dn, "", &attrs)?
        .ok_or_else(|| anyhow!("search for {} returned no entry", target_dn))?;
    conn.close();

    println!("DN '{}' has following attributes:", target_dn);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Attribute").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    for (name, values) in &entry.attrs {
        for value in values {
            table.add_row(vec![name.clone(), value.clone()]);
        }
    }
    println!("{}", table);
    Ok(())
}

fn run_groups(ctx: &CliContext, args: GroupsArgs) -> Result<()> {
    let mut prompt = TermPrompt;
    let settings = build_settings(ctx, &args.conn, &mut prompt)?;
    let mut conn = login(&settings)?;
    let target_dn = resolve_target(&mut conn, &settings, &args.target, &mut prompt)?;

    let group_base = group_base(&settings, args.group_base.as_deref());
    let filter = membership_filter(&target_dn);
    debug!(%filter, "search for group membership");
    let entries = conn.search(&group_base, &filter, &["dn"])?;
    conn.close();

    if entries.is_empty() {
        println!("no groups for {} found", target_dn);
        return Ok(());
    }
    println!("DN '{}' is member of the following groups:", target_dn);
    for entry in entries {
        println!("Group: {}", entry.dn);
    }
    Ok(())
}

fn run_members(ctx: &CliContext, args: MembersArgs) -> Result<()> {
    let mut prompt = TermPrompt;
    let settings = build_settings(ctx, &args.conn, &mut prompt)?;
    let mut conn = login(&settings)?;

    let base = group_base(&settings, args.group_base.as_deref());
    let group_dn = if args.group.contains('=') {
        args.group.clone()
    } else {
        target::resolve_group(&mut conn, &base, &args.group, &mut prompt)?
    };
    let entry = conn
        .retrieve_entry(&group_dn, "", &["member", "uniqueMember"])?
        .ok_or_else(|| anyhow!("search for {} returned no entry", group_dn))?;
    conn.close();

    let mut members: Vec<&String> = Vec::new();
    for attr in ["member", "uniqueMember"] {
        if let Some(values) = entry.attrs.get(attr) {
            members.extend(values);
        }
    }
    if members.is_empty() {
        println!("no members in {} found", group_dn);
        return Ok(());
    }
    println!("Group '{}' has following members:", group_dn);
    for member in members {
        println!("Member: {}", member);
    }
    Ok(())
}

/// Build the immutable connection settings for this invocation:
/// flag, then config file, then environment, then (password only) a prompt.
fn build_settings(
    ctx: &CliContext,
    conn: &ConnectionArgs,
    prompt: &mut dyn Prompt,
) -> Result<LdapSettings> {
    let cfg = &ctx.config.file.ldap;

    let bind_dn = pick(conn.bind_dn.clone(), cfg.binddn.as_deref(), "LDAP_BIND_DN")
        .ok_or_else(|| anyhow!("no bind DN given, use --bind-dn or env LDAP_BIND_DN"))?;

    let mut base_dn = conn.base.clone().or_else(|| cfg.base.clone()).unwrap_or_default();
    if base_dn.is_empty() {
        if let Some(derived) = base_from_bind_dn(&bind_dn) {
            debug!(base = %derived, "use base DN derived from bind DN");
            base_dn = derived;
        }
    }

    let mut bind_password = pick(
        conn.bind_password.clone(),
        cfg.bindpassword.as_deref(),
        "LDAP_BIND_PASSWORD",
    )
    .unwrap_or_default();
    if bind_password.is_empty() {
        bind_password = prompt.secret("Enter bind password")?;
    }
    if bind_password.is_empty() {
        bail!("no bind password given, use --bind-password or env LDAP_BIND_PASSWORD");
    }

    Ok(LdapSettings {
        host: conn.host.clone().or_else(|| cfg.host.clone()).unwrap_or_default(),
        port: conn.port.or(cfg.port).unwrap_or(0),
        tls: conn.tls || cfg.tls.unwrap_or(false),
        insecure: conn.insecure || cfg.insecure.unwrap_or(false),
        timeout_secs: conn
            .timeout
            .or(cfg.timeout)
            .unwrap_or(constants::DEFAULT_LDAP_TIMEOUT),
        base_dn,
        bind_dn,
        bind_password,
        group_base: cfg.groupbase.clone().unwrap_or_default(),
    })
}

fn login(settings: &LdapSettings) -> Result<LdapDirectory> {
    LdapDirectory::connect(settings, &settings.bind_dn, &settings.bind_password)
}

/// Target priority: search term, explicit DN, then the bind user itself.
fn resolve_target(
    conn: &mut dyn Directory,
    settings: &LdapSettings,
    target: &TargetArgs,
    prompt: &mut dyn Prompt,
) -> Result<String> {
    if let Some(user) = target.target_user.as_deref().filter(|u| !u.is_empty()) {
        return target::resolve_user(conn, &settings.base_dn, user, prompt);
    }
    if let Some(dn) = target.target_dn.as_deref().filter(|d| !d.is_empty()) {
        return Ok(dn.to_string());
    }
    Ok(settings.bind_dn.clone())
}

fn group_base(settings: &LdapSettings, flag: Option<&str>) -> String {
    if let Some(base) = flag.filter(|b| !b.is_empty()) {
        return base.to_string();
    }
    if !settings.group_base.is_empty() {
        return settings.group_base.clone();
    }
    settings.base_dn.clone()
}

fn membership_filter(dn: &str) -> String {
    format!(
        "(|(&(objectclass=groupOfUniqueNames)(uniqueMember={dn}))(&(objectclass=groupOfNames)(member={dn})))"
    )
}

/// The last two RDNs of a bind DN make a usable default search base.
fn base_from_bind_dn(bind_dn: &str) -> Option<String> {
    let parts: Vec<&str> = bind_dn.split(',').collect();
    if parts.len() > 2 {
        Some(parts[parts.len() - 2..].join(","))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_from_bind_dn() {
        assert_eq!(
            base_from_bind_dn("cn=admin,ou=x,dc=example,dc=local").as_deref(),
            Some("dc=example,dc=local")
        );
        assert_eq!(
            base_from_bind_dn("cn=admin,dc=example,dc=local").as_deref(),
            Some("dc=example,dc=local")
        );
        assert_eq!(base_from_bind_dn("cn=admin,dc=local"), None);
        assert_eq!(base_from_bind_dn(""), None);
    }

    #[test]
    fn test_membership_filter_names_both_group_classes() {
        let filter = membership_filter("cn=test,dc=x");
        assert!(filter.contains("(uniqueMember=cn=test,dc=x)"));
        assert!(filter.contains("(member=cn=test,dc=x)"));
    }
}
