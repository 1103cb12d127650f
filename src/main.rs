use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = credops::cli::Cli::parse();
    cli.run()
}
