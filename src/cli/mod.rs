//! CLI routing and command dispatch.

use crate::core::config::{self, LoadedConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub mod genpass;
pub mod ldap;
pub mod vault;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub config: LoadedConfig,
    pub non_interactive: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "credops",
    version,
    about = "Rotate and retrieve credentials across LDAP and Vault backends"
)]
pub struct Cli {
    /// Config file name
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Reduced info output
    #[arg(long, global = true)]
    pub info: bool,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "CREDOPS_NON_INTERACTIVE")]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        init_logging(self.debug, self.info);
        let config = config::load(self.config.as_deref())?;
        let ctx = CliContext {
            config,
            non_interactive: self.non_interactive,
        };
        match self.command {
            Commands::Genpass(args) => genpass::run(&ctx, args),
            Commands::Ldap { command } => ldap::run(&ctx, command),
            Commands::Vault { command } => vault::run(&ctx, command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a password for the given profile
    #[command(visible_aliases = ["gen", "new"])]
    Genpass(genpass::GenpassArgs),
    /// Directory operations: passwords, ssh keys, attributes, groups
    Ldap {
        #[command(subcommand)]
        command: ldap::LdapCommand,
    },
    /// Read, write and list secret-store entries
    Vault {
        #[command(subcommand)]
        command: vault::VaultCommand,
    },
}

fn init_logging(debug: bool, info: bool) {
    let level = if debug {
        "credops=debug"
    } else if info {
        "credops=info"
    } else {
        "error"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
