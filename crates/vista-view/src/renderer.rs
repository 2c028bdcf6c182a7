//! Page composition: current view, blocks, layout

use crate::blocks::RenderPhase;
use crate::cache::{CacheCategory, FragmentCache, Fingerprint};
use crate::config::TemplateConfig;
use crate::context::RenderContext;
use crate::error::Result;
use crate::loader::{TeraLoader, TeraLoaderConfig, Variables, ViewLoader};
use crate::locator::ViewLocator;
use crate::placeholder::{self, Segment};
use crate::request::RequestInfo;
use crate::theme::{resolve_theme, Theme};
use http::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use std::sync::Arc;

/// How deep `{block:...}` placeholders may nest
pub const MAX_BLOCK_DEPTH: usize = 8;

/// A composed page ready to send
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Final markup
    pub body: String,
    /// Extra response headers (no-cache headers for Ajax requests)
    pub headers: HeaderMap,
    /// Logical view that was yielded
    pub view: String,
    /// Layout the view was composed into
    pub layout: String,
    /// Theme in effect
    pub theme: Theme,
}

/// Composes pages for requests.
///
/// Holds only configuration and the loader, so one renderer can be shared
/// across threads; all per-request state lives in [`RenderContext`].
///
/// # Example
///
/// ```rust,ignore
/// use vista_view::{Renderer, RequestInfo, TemplateConfig};
///
/// let renderer = Renderer::with_tera(TemplateConfig::new("views"))?;
/// let mut ctx = renderer.context(RequestInfo::new("blog", "show").uri("/blog/42"));
/// let page = renderer.render(&mut ctx)?;
/// ```
#[derive(Clone)]
pub struct Renderer {
    config: Arc<TemplateConfig>,
    locator: ViewLocator,
    loader: Arc<dyn ViewLoader>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Create a renderer with a custom loader.
    ///
    /// # Errors
    ///
    /// Fails fast with [`ViewError::ConfigMissing`](crate::ViewError::ConfigMissing)
    /// when no theme path is configured.
    pub fn new(config: TemplateConfig, loader: impl ViewLoader + 'static) -> Result<Self> {
        Self::with_loader(config, Arc::new(loader))
    }

    /// Create a renderer sharing an existing loader
    pub fn with_loader(config: TemplateConfig, loader: Arc<dyn ViewLoader>) -> Result<Self> {
        config.validate()?;
        let locator = ViewLocator::new(config.theme_paths.clone(), config.view_extension.clone())?;
        tracing::debug!(theme_paths = ?config.theme_paths, "Template renderer loaded");
        Ok(Self {
            config: Arc::new(config),
            locator,
            loader,
        })
    }

    /// Create a renderer that renders views with Tera
    pub fn with_tera(config: TemplateConfig) -> Result<Self> {
        let loader = TeraLoader::new(
            TeraLoaderConfig::new(config.view_extension.clone())
                .auto_reload(config.auto_reload)
                .breadcrumb_separator(config.breadcrumb_separator.clone()),
        );
        Self::new(config, loader)
    }

    /// Get the configuration
    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Get the view locator
    pub fn locator(&self) -> &ViewLocator {
        &self.locator
    }

    /// Start a request
    pub fn context(&self, request: RequestInfo) -> RenderContext {
        let cache = FragmentCache::new(self.config.cache_path.clone(), self.config.cache_expiry());
        RenderContext::new(request, cache)
    }

    /// Theme for the request, resolved once and remembered in the context
    pub fn resolve_theme(&self, ctx: &mut RenderContext) -> Theme {
        if let Some(theme) = &ctx.active_theme {
            return theme.clone();
        }
        let theme = resolve_theme(
            ctx.explicit_theme.as_deref(),
            &self.config.default_theme,
            self.config.use_agent_themes,
            &self.config.themes,
            ctx.request.user_agent.as_deref(),
        );
        ctx.active_theme = Some(theme.clone());
        theme
    }

    /// Layout for the request, with the layout folder prefix
    pub fn layout_name(&self, ctx: &RenderContext) -> String {
        let folder = &self.config.layout_folder;
        if ctx.request.ajax {
            return format!("{}{}", folder, self.config.ajax_layout);
        }
        match ctx.layout.as_deref().filter(|l| !l.is_empty()) {
            Some(layout) if !folder.is_empty() && layout.starts_with(folder.as_str()) => {
                layout.to_string()
            }
            Some(layout) => format!("{}{}", folder, layout),
            None => format!("{}{}", folder, self.config.default_layout),
        }
    }

    /// Compose the page: view, blocks, layout, substitution.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotFound`](crate::ViewError::NotFound) when the view or
    /// layout exists in neither the active nor the default theme. Cache faults
    /// never fail a render.
    pub fn render(&self, ctx: &mut RenderContext) -> Result<RenderOutput> {
        let view = self.prepare(ctx)?;
        let layout = self.layout_name(ctx);
        let theme = self.resolve_theme(ctx);

        let span = tracing::debug_span!("render", view = %view, layout = %layout, theme = %theme);
        let _enter = span.enter();

        let mut headers = HeaderMap::new();
        if ctx.request.ajax {
            headers.append(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store, no-cache, must-revalidate"),
            );
            headers.append(CACHE_CONTROL, HeaderValue::from_static("post-check=0, pre-check=0"));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        }

        let content = self.yield_prepared(ctx, &view)?;

        ctx.phase = RenderPhase::RenderingLayout;
        let layout_category = self.config.cache_layout.then_some(CacheCategory::Layout);
        let rendered_layout = self.render_fragment(ctx, &layout, layout_category, 0);
        ctx.phase = RenderPhase::RenderingView;
        let rendered_layout = rendered_layout?;

        let message = placeholder::guard(&ctx.messages.render(&self.config.message_template));
        let body = placeholder::unguard(
            rendered_layout
                .replace(placeholder::MESSAGE, &message)
                .replace(placeholder::YIELD, &content),
        );

        Ok(RenderOutput {
            body,
            headers,
            view,
            layout,
            theme,
        })
    }

    /// Render only when the context still wants the automatic render
    pub fn autorender(&self, ctx: &mut RenderContext) -> Result<Option<RenderOutput>> {
        if !ctx.autorender {
            tracing::debug!("Autorender disabled for this request");
            return Ok(None);
        }
        self.render(ctx).map(Some)
    }

    /// Render the current view (without layout)
    pub fn yield_view(&self, ctx: &mut RenderContext) -> Result<String> {
        let view = self.prepare(ctx)?;
        self.yield_prepared(ctx, &view).map(placeholder::unguard)
    }

    fn yield_prepared(&self, ctx: &mut RenderContext, view: &str) -> Result<String> {
        let category = (self.config.cache_view && !ctx.request.ajax).then_some(CacheCategory::View);

        let previous = std::mem::replace(&mut ctx.phase, RenderPhase::RenderingView);
        let result = self.render_fragment(ctx, view, category, 0);
        ctx.phase = previous;
        result
    }

    /// Render any view with the request's theme
    pub fn render_view(&self, ctx: &mut RenderContext, name: &str) -> Result<String> {
        self.render_fragment(ctx, name, None, 0).map(placeholder::unguard)
    }

    /// Render a block: the override set for `name`, else `default_view`.
    ///
    /// Returns `Ok(None)` when neither is available.
    pub fn block(
        &self,
        ctx: &mut RenderContext,
        name: &str,
        default_view: Option<&str>,
    ) -> Result<Option<String>> {
        Ok(self
            .render_block(ctx, name, default_view, 0)?
            .map(placeholder::unguard))
    }

    /// Render and consume the status message
    pub fn message(&self, ctx: &mut RenderContext) -> String {
        ctx.messages.render(&self.config.message_template)
    }

    /// Inject the standard variables and settle the current view
    fn prepare(&self, ctx: &mut RenderContext) -> Result<String> {
        let view = ctx
            .current_view
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| ctx.request.default_view());
        ctx.current_view = Some(view.clone());

        let controller = ctx.request.controller.clone();
        let method = ctx.request.method.clone();
        let uri = ctx.request.uri.clone();
        ctx.set("site_name", &self.config.site_name)?;
        ctx.set("request_uri", &uri)?;
        ctx.set("active_controller", &controller)?;
        ctx.set("active_method", &method)?;
        ctx.set("active_view", &view)?;

        self.resolve_theme(ctx);
        Ok(view)
    }

    fn render_block(
        &self,
        ctx: &mut RenderContext,
        name: &str,
        default_view: Option<&str>,
        depth: usize,
    ) -> Result<Option<String>> {
        let Some(view) = ctx.blocks.resolve_block(name, default_view) else {
            return Ok(None);
        };
        let category = (self.config.cache_blocks && !ctx.request.ajax).then_some(CacheCategory::View);
        self.render_fragment(ctx, &view, category, depth).map(Some)
    }

    /// Locate, load and expand one view, through the cache when `category`
    /// is set
    fn render_fragment(
        &self,
        ctx: &mut RenderContext,
        name: &str,
        category: Option<CacheCategory>,
        depth: usize,
    ) -> Result<String> {
        let cached = category.map(|category| (Fingerprint::derive(name, &ctx.request.uri), category));

        if let Some((fingerprint, category)) = &cached {
            if ctx.cache.is_cached(fingerprint, *category) {
                match ctx.cache.get(fingerprint) {
                    Some(html) if !html.is_empty() => {
                        tracing::debug!(view = name, %fingerprint, "Serving cached fragment");
                        let captures = ctx.cache.get_captures(fingerprint);
                        ctx.blocks.restore_captures(captures);
                        return Ok(html);
                    }
                    _ => {}
                }
            }
        }

        let theme = self.resolve_theme(ctx);
        let default_theme = Theme::new(self.config.default_theme.as_str());
        let resolved = self.locator.locate(&theme, &default_theme, name).map_err(|e| {
            tracing::error!(view = name, theme = %theme, "No view could be found");
            e
        })?;

        let raw = self.loader.load(&resolved, &guard_variables(&ctx.variables))?;
        let before = cached.as_ref().map(|_| ctx.blocks.captures().clone());
        let html = self.expand(ctx, &raw, depth)?;

        if let (Some((fingerprint, category)), Some(before)) = (&cached, before) {
            if !ctx.cache.is_cached(fingerprint, *category) {
                ctx.cache.put(fingerprint, &html);
                ctx.cache.put_captures(fingerprint, &ctx.blocks.captures_since(&before));
            }
        }

        Ok(html)
    }

    /// Resolve block placeholders in rendered markup
    fn expand(&self, ctx: &mut RenderContext, src: &str, depth: usize) -> Result<String> {
        let segments = placeholder::segments(src);
        if !segments.iter().any(|s| !matches!(s, Segment::Text(_))) {
            return Ok(src.to_string());
        }

        let base = ctx.blocks.depth();
        let mut out = String::with_capacity(src.len());

        for segment in segments {
            let emitted = match segment {
                Segment::Text(text) => Some(text.to_string()),
                Segment::Block { name, default_view } => {
                    if depth + 1 > MAX_BLOCK_DEPTH {
                        tracing::warn!(block = name, depth, "Block nesting too deep, omitting");
                        None
                    } else {
                        self.render_block(ctx, name, default_view, depth + 1)?
                    }
                }
                Segment::Begin(name) => {
                    ctx.blocks.begin(name);
                    None
                }
                Segment::End => {
                    if ctx.blocks.depth() > base {
                        ctx.blocks.end(ctx.phase)
                    } else {
                        tracing::warn!("Block closed without a matching begin");
                        None
                    }
                }
            };

            if let Some(text) = emitted {
                if ctx.blocks.depth() > base {
                    ctx.blocks.write(&text);
                } else {
                    out.push_str(&text);
                }
            }
        }

        ctx.blocks.truncate(base);
        Ok(out)
    }
}

/// Request data with every `{` guarded, so no value can expand as a
/// placeholder
fn guard_variables(vars: &Variables) -> Variables {
    vars.iter()
        .map(|(key, value)| (key.clone(), placeholder::guard_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::RawFileLoader;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn renderer(root: &TempDir) -> Renderer {
        let config = TemplateConfig::new(root.path().join("views"))
            .cache_path(root.path().join("cache"))
            .auto_reload(false);
        Renderer::new(config, RawFileLoader).unwrap()
    }

    #[test]
    fn test_layout_name() {
        let root = TempDir::new().unwrap();
        let renderer = renderer(&root);

        let mut ctx = renderer.context(RequestInfo::new("blog", "show"));
        assert_eq!(renderer.layout_name(&ctx), "layouts/application");

        ctx.set_layout("admin");
        assert_eq!(renderer.layout_name(&ctx), "layouts/admin");

        ctx.set_layout("layouts/print");
        assert_eq!(renderer.layout_name(&ctx), "layouts/print");

        let ctx = renderer.context(RequestInfo::new("blog", "show").ajax(true));
        assert_eq!(renderer.layout_name(&ctx), "layouts/ajax");
    }

    #[test]
    fn test_missing_theme_paths_rejected() {
        let config = TemplateConfig {
            theme_paths: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            Renderer::new(config, RawFileLoader),
            Err(crate::ViewError::ConfigMissing(_))
        ));
    }

    #[test]
    fn test_capture_in_view_overrides_layout_default() {
        let root = TempDir::new().unwrap();
        let views = root.path().join("views/default");
        write(&views, "blog/show.html", "{begin:title}Post 42{end}<article>body</article>");
        write(
            &views,
            "layouts/application.html",
            "<title>{begin:title}My Site{end}</title>{begin:footer}(c){end}<main>{yield}</main>",
        );

        let renderer = renderer(&root);
        let mut ctx = renderer.context(RequestInfo::new("blog", "show").uri("/blog/42"));
        let page = renderer.render(&mut ctx).unwrap();

        assert_eq!(
            page.body,
            "<title>Post 42</title>(c)<main><article>body</article></main>"
        );
        assert!(!ctx.blocks().is_capturing());
    }

    #[test]
    fn test_unclosed_block_discarded() {
        let root = TempDir::new().unwrap();
        let views = root.path().join("views/default");
        write(&views, "home/index.html", "a{begin:x}b");
        write(&views, "layouts/application.html", "{yield}{end}");

        let renderer = renderer(&root);
        let mut ctx = renderer.context(RequestInfo::new("home", "index"));
        let page = renderer.render(&mut ctx).unwrap();
        assert_eq!(page.body, "a");
        assert_eq!(ctx.blocks().depth(), 0);
    }

    #[test]
    fn test_self_referencing_block_stops() {
        let root = TempDir::new().unwrap();
        let views = root.path().join("views/default");
        write(&views, "loop.html", "x{block:loop:loop}");
        write(&views, "home/index.html", "{block:loop:loop}");
        write(&views, "layouts/application.html", "{yield}");

        let renderer = renderer(&root);
        let mut ctx = renderer.context(RequestInfo::new("home", "index"));
        let page = renderer.render(&mut ctx).unwrap();
        assert_eq!(page.body, "x".repeat(MAX_BLOCK_DEPTH));
    }

    #[test]
    fn test_placeholder_text_in_variables_stays_literal() {
        let root = TempDir::new().unwrap();
        let views = root.path().join("views/default");
        write(&views, "layouts/application.html", "{yield}");
        write(&views, "home/index.html", "<p>home</p>");

        let renderer = renderer(&root);
        let mut ctx = renderer.context(RequestInfo::new("home", "index"));
        ctx.set("note", "{block:x:layouts/application}").unwrap();

        let guarded = guard_variables(ctx.variables());
        let note = guarded["note"].as_str().unwrap();
        assert!(!note.contains('{'));
        assert_eq!(placeholder::unguard(note.to_string()), "{block:x:layouts/application}");
    }

    #[test]
    fn test_autorender_disabled() {
        let root = TempDir::new().unwrap();
        let renderer = renderer(&root);
        let mut ctx = renderer.context(RequestInfo::new("blog", "show"));
        ctx.set_autorender(false);
        assert!(renderer.autorender(&mut ctx).unwrap().is_none());
    }
}
