//! Secret-store commands: read, write, list.

use crate::cli::CliContext;
use crate::constants;
use crate::core::config::pick;
use crate::core::store::{self, ReadFormat, SecretLocation};
use crate::models::settings::VaultSettings;
use crate::util::vault_http::VaultHttp;
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Store flags shared by every secret-store command.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Secret store URL, or env VAULT_ADDR
    #[arg(long, short = 'A')]
    pub addr: Option<String>,

    /// Access token, or env VAULT_TOKEN
    #[arg(long, short = 'T')]
    pub token: Option<String>,

    /// Mount path of the secret engine
    #[arg(long, short = 'M')]
    pub mount: Option<String>,

    /// Secret path to read, write or list
    #[arg(long, short = 'P')]
    pub path: String,

    /// Use the logical API, default is KV2
    #[arg(long, short = 'L')]
    pub logical: bool,
}

#[derive(Subcommand, Debug)]
pub enum VaultCommand {
    /// Read a secret: the full data map or a single key
    Read(ReadArgs),
    /// Write a json object to a path
    Write(WriteArgs),
    /// List entries one level below a path
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Return only this key's value
    pub key: Option<String>,

    /// Output as json
    #[arg(long, short = 'J')]
    pub json: bool,

    /// Output as shell export lines
    #[arg(long, short = 'E')]
    pub export: bool,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// json object to write
    pub data: Option<String>,

    /// File with the json encoded data to write
    #[arg(long = "data-file", value_name = "PATH")]
    pub data_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run(ctx: &CliContext, command: VaultCommand) -> Result<()> {
    match command {
        VaultCommand::Read(args) => run_read(ctx, args),
        VaultCommand::Write(args) => run_write(ctx, args),
        VaultCommand::List(args) => run_list(ctx, args),
    }
}

fn run_read(ctx: &CliContext, args: ReadArgs) -> Result<()> {
    // format conflicts must fail before any network traffic
    let format = ReadFormat::from_flags(args.json, args.export)?;
    let settings = build_settings(ctx, &args.store);
    let location = location(&settings, &args.store);
    debug!(path = %location.data_path(), "vault read");

    let http = VaultHttp::new(&settings)?;
    let output = store::read_secret(&http, &location, args.key.as_deref(), format)?;
    if args.key.is_some() {
        // a bare value, no trailing newline: meant for command substitution
        print!("{}", output);
        std::io::stdout().flush().context("flush stdout")?;
    } else {
        println!("{}", output);
    }
    Ok(())
}

fn run_write(ctx: &CliContext, args: WriteArgs) -> Result<()> {
    let content = payload(args.data, args.data_file.as_deref())?;
    let settings = build_settings(ctx, &args.store);
    let location = location(&settings, &args.store);
    debug!(path = %location.data_path(), "vault write");

    let http = VaultHttp::new(&settings)?;
    store::write_secret(&http, &location, &content)?;
    println!("OK");
    Ok(())
}

fn run_list(ctx: &CliContext, args: ListArgs) -> Result<()> {
    let settings = build_settings(ctx, &args.store);
    let location = location(&settings, &args.store);
    debug!(path = %location.list_path(), "vault list");

    let http = VaultHttp::new(&settings)?;
    for key in store::list_secrets(&http, &location)? {
        println!("{}", key);
    }
    Ok(())
}

fn build_settings(ctx: &CliContext, args: &StoreArgs) -> VaultSettings {
    let cfg = &ctx.config.file.vault;
    VaultSettings {
        addr: pick(args.addr.clone(), cfg.addr.as_deref(), "VAULT_ADDR").unwrap_or_default(),
        token: pick(args.token.clone(), cfg.token.as_deref(), "VAULT_TOKEN").unwrap_or_default(),
        mount: args
            .mount
            .clone()
            .or_else(|| cfg.mount.clone())
            .unwrap_or_else(|| constants::DEFAULT_KV_MOUNT.to_string()),
    }
}

fn location(settings: &VaultSettings, args: &StoreArgs) -> SecretLocation {
    SecretLocation::new(&settings.mount, &args.path, args.logical)
}

/// Inline data wins over the data file; one of them is required.
fn payload(data: Option<String>, data_file: Option<&Path>) -> Result<String> {
    match (data, data_file) {
        (Some(data), _) => Ok(data),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("could not read data file {}", path.display())),
        (None, None) => bail!("requires data to write as argument or --data-file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_inline_wins() {
        let out = payload(Some("{\"a\":1}".into()), Some(Path::new("/nonexistent"))).unwrap();
        assert_eq!(out, "{\"a\":1}");
    }

    #[test]
    fn test_payload_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{\"password\":\"x\"}").unwrap();
        let out = payload(None, Some(&path)).unwrap();
        assert_eq!(out, "{\"password\":\"x\"}");
    }

    #[test]
    fn test_payload_missing_file() {
        let err = payload(None, Some(Path::new("/nonexistent/data.json"))).unwrap_err();
        assert!(err.to_string().contains("could not read data file"));
    }

    #[test]
    fn test_payload_nothing_given() {
        let err = payload(None, None).unwrap_err();
        assert!(err.to_string().contains("requires data to write"));
    }
}
