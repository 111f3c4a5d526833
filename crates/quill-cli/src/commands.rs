use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quill")]
#[command(version = "0.1.0")]
#[command(propagate_version = true)]
#[command(about = "A minimal package installer for the npm registry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolves packages and installs them into node_modules
    #[command(aliases = ["i", "add"])]
    Install {
        /// List of packages to install (e.g. chalk@2.0.0)
        #[arg()]
        packages: Vec<String>,
        /// Enable debug mode for verbose output
        #[arg(long)]
        debug: bool,
    },
}
