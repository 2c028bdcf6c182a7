//! View loaders turn a located file into markup

use crate::error::{Result, ViewError};
use crate::locator::ResolvedView;
use crate::nav;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tera::Tera;

/// Variables injected into every rendered file
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Renders a located view file with the request variables
pub trait ViewLoader: Send + Sync {
    /// Render `view` and return its markup
    fn load(&self, view: &ResolvedView, vars: &Variables) -> Result<String>;
}

/// Returns view files verbatim, without template processing
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFileLoader;

impl ViewLoader for RawFileLoader {
    fn load(&self, view: &ResolvedView, _vars: &Variables) -> Result<String> {
        let path = view.path();
        tracing::debug!(path = %path.display(), "File loaded");
        std::fs::read_to_string(&path).map_err(ViewError::from)
    }
}

/// Configuration for the tera-backed loader
#[derive(Debug, Clone)]
pub struct TeraLoaderConfig {
    /// Extension of template files to parse under each theme directory
    pub extension: String,
    /// Whether to reload templates from disk before each render
    pub auto_reload: bool,
    /// Default separator of the `breadcrumb()` template function
    pub breadcrumb_separator: String,
}

impl Default for TeraLoaderConfig {
    fn default() -> Self {
        Self {
            extension: "html".to_string(),
            auto_reload: cfg!(debug_assertions),
            breadcrumb_separator: " : ".to_string(),
        }
    }
}

impl TeraLoaderConfig {
    /// Create a config for the given template extension
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            ..Default::default()
        }
    }

    /// Set auto-reload behavior
    pub fn auto_reload(mut self, enabled: bool) -> Self {
        self.auto_reload = enabled;
        self
    }

    /// Set the default breadcrumb separator
    pub fn breadcrumb_separator(mut self, separator: impl Into<String>) -> Self {
        self.breadcrumb_separator = separator.into();
        self
    }
}

/// Renders views with Tera.
///
/// One `Tera` instance is built per theme directory (`root/theme`) from every
/// template under it, so `{% include %}` and `{% extends %}` resolve relative
/// to the theme the view was found in. Files with another extension are not
/// templates and are returned verbatim.
///
/// Templates can call the navigation helpers:
///
/// ```text
/// {{ breadcrumb(uri=request_uri) }}
/// <li {{ check_menu(item="blog", active=active_controller) }}>
/// <li {{ check_sub_menu(item="edit", active=active_method) }}>
/// ```
pub struct TeraLoader {
    config: TeraLoaderConfig,
    engines: RwLock<HashMap<PathBuf, Tera>>,
}

impl TeraLoader {
    /// Create a loader
    pub fn new(config: TeraLoaderConfig) -> Self {
        Self {
            config,
            engines: RwLock::new(HashMap::new()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &TeraLoaderConfig {
        &self.config
    }

    /// Drop every parsed theme so the next render reads from disk
    pub fn clear(&self) -> Result<()> {
        let mut engines = self
            .engines
            .write()
            .map_err(|e| ViewError::Internal(format!("Failed to acquire lock: {}", e)))?;
        engines.clear();
        Ok(())
    }

    fn build(&self, base_dir: &std::path::Path) -> Result<Tera> {
        let glob = format!("{}/**/*.{}", base_dir.display(), self.config.extension);
        let mut tera = Tera::new(&glob)?;
        register_nav_functions(&mut tera, &self.config.breadcrumb_separator);
        Ok(tera)
    }

    fn is_template(&self, view: &ResolvedView) -> bool {
        Path::new(&view.template)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.config.extension)
    }

    fn render_cached(
        &self,
        view: &ResolvedView,
        context: &tera::Context,
    ) -> Result<Option<String>> {
        let engines = self
            .engines
            .read()
            .map_err(|e| ViewError::Internal(format!("Failed to acquire lock: {}", e)))?;
        match engines.get(&view.base_dir) {
            Some(tera) if tera.get_template_names().any(|n| n == view.template) => {
                tera.render(&view.template, context).map(Some).map_err(ViewError::from)
            }
            _ => Ok(None),
        }
    }
}

impl Default for TeraLoader {
    fn default() -> Self {
        Self::new(TeraLoaderConfig::default())
    }
}

impl ViewLoader for TeraLoader {
    fn load(&self, view: &ResolvedView, vars: &Variables) -> Result<String> {
        if !self.is_template(view) {
            return RawFileLoader.load(view, vars);
        }

        let context = tera::Context::from_serialize(vars)
            .map_err(|e| ViewError::serialization_error(e.to_string()))?;

        if !self.config.auto_reload {
            if let Some(html) = self.render_cached(view, &context)? {
                return Ok(html);
            }
        }

        // Parsed fresh when missing, stale, or when the file appeared after the
        // theme was first parsed
        let tera = self.build(&view.base_dir)?;
        let html = tera.render(&view.template, &context)?;
        tracing::debug!(path = %view.path().display(), "File loaded");

        let mut engines = self
            .engines
            .write()
            .map_err(|e| ViewError::Internal(format!("Failed to acquire lock: {}", e)))?;
        engines.insert(view.base_dir.clone(), tera);

        Ok(html)
    }
}

/// `breadcrumb(uri, separator?)`
struct BreadcrumbFn {
    separator: String,
}

impl tera::Function for BreadcrumbFn {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let uri = match args.get("uri") {
            Some(val) => tera::try_get_value!("breadcrumb", "uri", String, val),
            None => return Err(tera::Error::msg("`breadcrumb` requires a `uri` argument")),
        };
        let separator = match args.get("separator") {
            Some(val) => tera::try_get_value!("breadcrumb", "separator", String, val),
            None => self.separator.clone(),
        };
        Ok(tera::Value::String(nav::breadcrumb_path(&uri, &separator)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `check_menu(item, active)` / `check_sub_menu(item, active)`
struct CurrentClassFn {
    name: &'static str,
}

impl tera::Function for CurrentClassFn {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let string_arg = |key: &str| match args.get(key) {
            Some(val) => tera::from_value::<String>(val.clone()).map_err(|_| {
                tera::Error::msg(format!("`{}` expects a string `{}`", self.name, key))
            }),
            None => Err(tera::Error::msg(format!(
                "`{}` requires an `{}` argument",
                self.name, key
            ))),
        };
        let item = string_arg("item")?;
        let active = string_arg("active")?;
        Ok(tera::Value::String(nav::current_class(&item, &active).to_string()))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

fn register_nav_functions(tera: &mut Tera, separator: &str) {
    tera.register_function(
        "breadcrumb",
        BreadcrumbFn {
            separator: separator.to_string(),
        },
    );
    tera.register_function("check_menu", CurrentClassFn { name: "check_menu" });
    tera.register_function("check_sub_menu", CurrentClassFn { name: "check_sub_menu" });
}
