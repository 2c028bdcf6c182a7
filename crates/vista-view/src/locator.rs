//! View file lookup across theme roots

use crate::error::{Result, ViewError};
use crate::theme::Theme;
use std::path::{Path, PathBuf};

/// A concrete view file selected for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedView {
    /// Logical name that was requested
    pub name: String,
    /// Theme the file was found under
    pub theme: Theme,
    /// `root/theme`, the base for relative includes
    pub base_dir: PathBuf,
    /// Template name relative to `base_dir`
    pub template: String,
}

impl ResolvedView {
    /// Absolute (or root-relative) path of the file
    pub fn path(&self) -> PathBuf {
        self.base_dir.join(&self.template)
    }
}

/// Probes ordered theme roots for view files
#[derive(Debug, Clone)]
pub struct ViewLocator {
    theme_paths: Vec<PathBuf>,
    extension: String,
}

impl ViewLocator {
    /// Create a locator over the given roots.
    ///
    /// # Errors
    ///
    /// [`ViewError::ConfigMissing`] when `theme_paths` is empty.
    pub fn new(theme_paths: Vec<PathBuf>, extension: impl Into<String>) -> Result<Self> {
        if theme_paths.is_empty() {
            return Err(ViewError::ConfigMissing("theme_paths".to_string()));
        }
        Ok(Self {
            theme_paths,
            extension: extension.into().trim_start_matches('.').to_string(),
        })
    }

    /// Configured roots in search order
    pub fn theme_paths(&self) -> &[PathBuf] {
        &self.theme_paths
    }

    /// Template file name for a logical view name
    pub fn file_name(&self, logical_name: &str) -> String {
        let has_extension = Path::new(logical_name).extension().is_some();
        if has_extension || self.extension.is_empty() {
            logical_name.to_string()
        } else {
            format!("{}.{}", logical_name, self.extension)
        }
    }

    /// First `root/theme/name` that exists, searching roots in order
    pub fn find_file(&self, theme: &Theme, logical_name: &str) -> Option<ResolvedView> {
        if logical_name.is_empty() {
            return None;
        }

        let template = self.file_name(logical_name);
        self.theme_paths.iter().find_map(|root| {
            let base_dir = root.join(theme.name());
            if base_dir.join(&template).is_file() {
                Some(ResolvedView {
                    name: logical_name.to_string(),
                    theme: theme.clone(),
                    base_dir,
                    template: template.clone(),
                })
            } else {
                None
            }
        })
    }

    /// Two-phase lookup: the active theme, then the default theme.
    ///
    /// A file missing from the active theme silently falls back to the default
    /// theme; only a miss in both is an error.
    pub fn locate(
        &self,
        theme: &Theme,
        default_theme: &Theme,
        logical_name: &str,
    ) -> Result<ResolvedView> {
        if logical_name.is_empty() {
            return Err(ViewError::not_found("(empty view name)"));
        }

        if let Some(found) = self.find_file(theme, logical_name) {
            return Ok(found);
        }

        if theme != default_theme {
            tracing::debug!(
                view = logical_name,
                theme = %theme,
                default_theme = %default_theme,
                "View missing from active theme, trying default"
            );
            if let Some(found) = self.find_file(default_theme, logical_name) {
                return Ok(found);
            }
        }

        Err(ViewError::not_found(logical_name))
    }
}
