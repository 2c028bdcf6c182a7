//! CLI commands

mod locate;
mod render;
mod theme;

pub use locate::{locate, LocateArgs};
pub use render::{render, RenderArgs};
pub use theme::{theme, ThemeArgs};

use anyhow::{Context, Result};
use std::path::Path;
use vista_view::TemplateConfig;

/// Load configuration from a JSON file, or from `VISTA_*` variables (and
/// `.env`) when no file is given
pub(crate) fn load_config(path: Option<&Path>) -> Result<TemplateConfig> {
    match path {
        Some(path) => TemplateConfig::from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            vista_view::config::load_dotenv();
            TemplateConfig::from_env().context("Failed to load configuration from environment")
        }
    }
}
