//! Password generation command.

use crate::cli::CliContext;
use crate::core::profiles::{self, ProfileRequest};
use crate::core::pwgen;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct GenpassArgs {
    /// Define allowed special chars
    #[arg(long = "special-chars", short = 's')]
    pub special_chars: Option<String>,

    /// Ad-hoc profile as 'length upper lower digits specials first_is_char(0|1)'
    #[arg(long, short = 'p', conflicts_with = "profile_set")]
    pub profile: Option<String>,

    /// Use an existing named profile set
    #[arg(long = "profile-set", short = 'P')]
    pub profile_set: Option<String>,

    /// Filename of an external profile catalog
    #[arg(long = "profiles-file")]
    pub profiles_file: Option<String>,

    /// List known profile sets instead of generating
    #[arg(long = "list-profiles", short = 'l')]
    pub list_profiles: bool,
}

pub fn run(ctx: &CliContext, args: GenpassArgs) -> Result<()> {
    if args.list_profiles {
        let listing = profiles::list_profiles(
            args.profiles_file.as_deref(),
            &ctx.config.file,
            ctx.config.path.as_deref(),
        )?;
        print!("{}", listing);
        return Ok(());
    }

    let request = ProfileRequest {
        set_name: args.profile_set.as_deref(),
        descriptor: args.profile.as_deref(),
        special_chars: args.special_chars.as_deref(),
        profiles_file: args.profiles_file.as_deref(),
    };
    let set = profiles::resolve(&request, &ctx.config.file, ctx.config.path.as_deref())?;
    let password = pwgen::generate(&set)?;
    println!("{}", password);
    Ok(())
}
