//! Locate command

use super::load_config;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use vista_view::{Theme, ViewLocator};

/// Arguments for the `locate` command
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// JSON configuration file (defaults to VISTA_* environment variables)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Active theme (defaults to the configured default theme)
    #[arg(long)]
    pub theme: Option<String>,

    /// Logical view name, e.g. `blog/show` or `layouts/application`
    pub view: String,
}

/// Print the file a view resolves to
pub fn locate(args: LocateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let locator = ViewLocator::new(config.theme_paths.clone(), config.view_extension.as_str())?;

    let default_theme = Theme::new(config.default_theme.as_str());
    let theme = args
        .theme
        .map(Theme::new)
        .unwrap_or_else(|| default_theme.clone());

    let resolved = locator
        .locate(&theme, &default_theme, &args.view)
        .with_context(|| format!("Unable to locate `{}`", args.view))?;

    tracing::debug!(theme = %resolved.theme, "View located");
    println!("{}", resolved.path().display());
    Ok(())
}
