pub mod commands;
pub mod handlers;

use anyhow::Result;
use clap::Parser;

use commands::{Cli, Commands};
use handlers::InstallHandler;

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    quill_logger::init_logger(false);

    match &cli.command {
        Commands::Install { packages, debug } => InstallHandler::install_pkgs(packages, *debug),
    }
}
