//! CLI argument parsing

use crate::commands::{self, LocateArgs, RenderArgs, ThemeArgs};
use clap::{Parser, Subcommand};

/// Vista CLI - render pages and inspect theme resolution
#[derive(Parser, Debug)]
#[command(name = "vista")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a page for a controller/method and print it
    Render(RenderArgs),

    /// Print the theme selected for a user agent
    Theme(ThemeArgs),

    /// Print the file a logical view name resolves to
    Locate(LocateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Render(args) => commands::render(args),
            Commands::Theme(args) => commands::theme(args),
            Commands::Locate(args) => commands::locate(args),
        }
    }
}
