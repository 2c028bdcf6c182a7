//! # vista-view
//!
//! Themed layout and view composition for server-rendered sites.
//!
//! A request renders its current view, expands named blocks, and composes the
//! result into a layout. Views and layouts are looked up in the active theme
//! first and fall back to the default theme, so a theme only needs to contain
//! the files it changes.
//!
//! ## Features
//!
//! - **Themes**: ordered theme roots, explicit or user-agent selected themes
//! - **Blocks**: `{block:NAME:DEFAULT}` regions with per-request overrides and
//!   `{begin:NAME}`...`{end}` captures
//! - **Fragment Cache**: optional filesystem cache for views and layouts
//! - **Tera Templates**: views are rendered with Tera and the request variables
//! - **Messages**: flash messages substituted into the layout
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vista_view::prelude::*;
//!
//! let renderer = Renderer::with_tera(TemplateConfig::new("views"))?;
//!
//! let mut ctx = renderer.context(RequestInfo::new("blog", "show").uri("/blog/42"));
//! ctx.set("title", "Hello")?;
//! ctx.set_block("sidebar", "partials/promo_sidebar");
//!
//! let page = renderer.render(&mut ctx)?;
//! println!("{}", page.body);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod agent;
pub mod blocks;
pub mod cache;
pub mod config;
pub mod context;
mod error;
pub mod loader;
pub mod locator;
pub mod message;
pub mod nav;
pub mod placeholder;
mod renderer;
pub mod request;
pub mod theme;
pub mod web;

pub use blocks::{BlockStore, RenderPhase};
pub use cache::{CacheCategory, CacheExpiry, Fingerprint, FragmentCache};
pub use config::TemplateConfig;
pub use context::RenderContext;
pub use error::{Result, ViewError};
pub use loader::{RawFileLoader, TeraLoader, TeraLoaderConfig, Variables, ViewLoader};
pub use locator::{ResolvedView, ViewLocator};
pub use message::{MemorySession, Message, Messages, SessionStore};
pub use renderer::{RenderOutput, Renderer, MAX_BLOCK_DEPTH};
pub use request::RequestInfo;
pub use theme::{resolve_theme, Theme, ThemeRule};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        RenderContext, RenderOutput, Renderer, RequestInfo, TemplateConfig, Theme, ThemeRule,
        ViewError,
    };
}
