//! Theme command

use super::load_config;
use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;
use vista_view::agent::UserAgent;
use vista_view::resolve_theme;

/// Arguments for the `theme` command
#[derive(Args, Debug)]
pub struct ThemeArgs {
    /// JSON configuration file (defaults to VISTA_* environment variables)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// User agent to classify
    #[arg(long)]
    pub user_agent: String,

    /// Match theme rules even when agent themes are disabled in the configuration
    #[arg(long)]
    pub force_sniff: bool,

    /// Also print how the agent was classified
    #[arg(short, long)]
    pub verbose: bool,
}

/// Print the theme a user agent resolves to
pub fn theme(args: ThemeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let theme = resolve_theme(
        None,
        &config.default_theme,
        config.use_agent_themes || args.force_sniff,
        &config.themes,
        Some(&args.user_agent),
    );

    if args.verbose {
        let agent = UserAgent::parse(&args.user_agent);
        let classified = agent.classified().unwrap_or_else(|| "unknown".to_string());
        eprintln!("{} {}", style("Agent:").bold(), classified);
    }
    println!("{}", theme);
    Ok(())
}
