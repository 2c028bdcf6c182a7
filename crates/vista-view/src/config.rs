//! Engine configuration
//!
//! [`TemplateConfig`] carries every recognized setting. All fields have
//! defaults, so a configuration file or environment only needs to name what it
//! changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use vista_view::TemplateConfig;
//!
//! let config = TemplateConfig::new("views")
//!     .default_theme("default")
//!     .cache_view(true, 900);
//!
//! // or from VISTA_* environment variables
//! vista_view::config::load_dotenv();
//! let config = TemplateConfig::from_env()?;
//! ```

use crate::cache::CacheExpiry;
use crate::error::{Result, ViewError};
use crate::theme::ThemeRule;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default prefix for environment configuration (`VISTA_THEME_PATHS`, ...)
pub const ENV_PREFIX: &str = "VISTA";

/// Default markup for status messages
pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "<div class=\"notification {type}\">\n\t<div>{message}</div>\n</div>";

/// Configuration for theme resolution, layouts, caching and helpers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Ordered roots searched for theme folders; first match wins
    pub theme_paths: Vec<PathBuf>,
    /// Theme used when nothing else is selected, and as the fallback
    pub default_theme: String,
    /// Folder prefix for layouts, with a trailing slash
    pub layout_folder: String,
    /// Layout rendered when none is requested
    pub default_layout: String,
    /// Layout substituted for every Ajax request
    pub ajax_layout: String,
    /// Select the theme from the requesting user agent
    pub use_agent_themes: bool,
    /// Theme rules in priority order
    pub themes: Vec<ThemeRule>,
    /// Extension appended to logical names that have none
    pub view_extension: String,
    /// Directory holding cached fragments
    pub cache_path: PathBuf,
    /// Cache the current view
    pub cache_view: bool,
    /// Seconds until a cached view expires
    pub cache_view_expires: u64,
    /// Cache the rendered layout
    pub cache_layout: bool,
    /// Seconds until a cached layout expires
    pub cache_layout_expires: u64,
    /// Cache block views (with the view expiration)
    pub cache_blocks: bool,
    /// Markup for status messages, with `{type}` and `{message}` placeholders
    pub message_template: String,
    /// Separator between breadcrumb entries
    pub breadcrumb_separator: String,
    /// Exposed to every view as `site_name`
    pub site_name: String,
    /// Reload templates from disk on every render
    pub auto_reload: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            theme_paths: vec![PathBuf::from("views")],
            default_theme: "default".to_string(),
            layout_folder: "layouts/".to_string(),
            default_layout: "application".to_string(),
            ajax_layout: "ajax".to_string(),
            use_agent_themes: false,
            themes: vec![ThemeRule::new(
                "iphone",
                ["Apple iPhone", "Apple iPod Touch"],
            )],
            view_extension: "html".to_string(),
            cache_path: PathBuf::from("cache"),
            cache_view: false,
            cache_view_expires: 900,
            cache_layout: false,
            cache_layout_expires: 3600,
            cache_blocks: false,
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            breadcrumb_separator: " : ".to_string(),
            site_name: "Unnamed Vista Site".to_string(),
            auto_reload: cfg!(debug_assertions),
        }
    }
}

impl TemplateConfig {
    /// Create a config searching a single theme root
    pub fn new(theme_path: impl Into<PathBuf>) -> Self {
        Self {
            theme_paths: vec![theme_path.into()],
            ..Default::default()
        }
    }

    /// Append a theme root (searched after the existing ones)
    pub fn theme_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.theme_paths.push(path.into());
        self
    }

    /// Set the default theme
    pub fn default_theme(mut self, name: impl Into<String>) -> Self {
        self.default_theme = name.into();
        self
    }

    /// Set the default layout
    pub fn default_layout(mut self, name: impl Into<String>) -> Self {
        self.default_layout = name.into();
        self
    }

    /// Set the Ajax layout
    pub fn ajax_layout(mut self, name: impl Into<String>) -> Self {
        self.ajax_layout = name.into();
        self
    }

    /// Enable agent-based theme selection with the given rules
    pub fn agent_themes(mut self, rules: Vec<ThemeRule>) -> Self {
        self.use_agent_themes = true;
        self.themes = rules;
        self
    }

    /// Set the cache directory
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Configure view caching
    pub fn cache_view(mut self, enabled: bool, expires_secs: u64) -> Self {
        self.cache_view = enabled;
        self.cache_view_expires = expires_secs;
        self
    }

    /// Configure layout caching
    pub fn cache_layout(mut self, enabled: bool, expires_secs: u64) -> Self {
        self.cache_layout = enabled;
        self.cache_layout_expires = expires_secs;
        self
    }

    /// Set the view file extension
    pub fn view_extension(mut self, ext: impl Into<String>) -> Self {
        self.view_extension = ext.into();
        self
    }

    /// Set auto-reload behavior
    pub fn auto_reload(mut self, enabled: bool) -> Self {
        self.auto_reload = enabled;
        self
    }

    /// Set the default separator of `breadcrumb()`
    pub fn breadcrumb_separator(mut self, separator: impl Into<String>) -> Self {
        self.breadcrumb_separator = separator.into();
        self
    }

    /// Expiration durations for both cache categories
    pub fn cache_expiry(&self) -> CacheExpiry {
        CacheExpiry {
            view: Duration::from_secs(self.cache_view_expires),
            layout: Duration::from_secs(self.cache_layout_expires),
        }
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// [`ViewError::ConfigMissing`] when no theme path is configured or the
    /// default theme is empty.
    pub fn validate(&self) -> Result<()> {
        if self.theme_paths.is_empty() {
            return Err(ViewError::ConfigMissing("theme_paths".to_string()));
        }
        if self.default_theme.trim().is_empty() {
            return Err(ViewError::ConfigMissing("default_theme".to_string()));
        }
        Ok(())
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ViewError::config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Load from `VISTA_*` environment variables.
    ///
    /// List fields take comma-separated values
    /// (`VISTA_THEME_PATHS=views,shared/views`).
    pub fn from_env() -> Result<Self> {
        Self::from_env_prefixed(ENV_PREFIX)
    }

    /// Load from environment variables with a custom prefix
    pub fn from_env_prefixed(prefix: &str) -> Result<Self> {
        let config: Self = envy::prefixed(format!("{}_", prefix)).from_env()?;
        config.validate()?;
        Ok(config)
    }
}

/// Load environment variables from a `.env` file, if present.
///
/// Existing variables take precedence over the file.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path
pub fn load_dotenv_from<P: AsRef<Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}
