//! Request-scoped render state

use crate::blocks::{BlockStore, RenderPhase};
use crate::cache::FragmentCache;
use crate::error::{Result, ViewError};
use crate::loader::Variables;
use crate::message::{Messages, SessionStore};
use crate::request::RequestInfo;
use crate::theme::Theme;
use serde::Serialize;

/// Everything one request renders with.
///
/// Created by [`Renderer::context`](crate::Renderer::context) at the start of
/// a request and dropped at its end, so themes, blocks and the cache memo
/// never leak between requests.
///
/// # Example
///
/// ```rust,ignore
/// let mut ctx = renderer.context(RequestInfo::new("blog", "show").uri("/blog/42"));
/// ctx.set("title", "Hello")?;
/// ctx.set_block("sidebar", "partials/promo_sidebar");
/// let page = renderer.render(&mut ctx)?;
/// ```
#[derive(Debug)]
pub struct RenderContext {
    pub(crate) request: RequestInfo,
    pub(crate) current_view: Option<String>,
    pub(crate) layout: Option<String>,
    pub(crate) explicit_theme: Option<String>,
    pub(crate) active_theme: Option<Theme>,
    pub(crate) variables: Variables,
    pub(crate) blocks: BlockStore,
    pub(crate) phase: RenderPhase,
    pub(crate) cache: FragmentCache,
    pub(crate) messages: Messages,
    pub(crate) autorender: bool,
}

impl RenderContext {
    /// Create a context for a request
    pub fn new(request: RequestInfo, cache: FragmentCache) -> Self {
        Self {
            request,
            current_view: None,
            layout: None,
            explicit_theme: None,
            active_theme: None,
            variables: Variables::new(),
            blocks: BlockStore::new(),
            phase: RenderPhase::RenderingView,
            cache,
            messages: Messages::new(),
            autorender: true,
        }
    }

    /// Attach a session for flash messages
    pub fn with_session(mut self, session: Box<dyn SessionStore>) -> Self {
        self.messages = Messages::with_session(session);
        self
    }

    /// The request being rendered
    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    /// Override the view derived from controller/method
    pub fn set_view(&mut self, name: impl Into<String>) {
        self.current_view = Some(name.into());
    }

    /// Explicitly set view, if any
    pub fn view(&self) -> Option<&str> {
        self.current_view.as_deref()
    }

    /// Render into this layout instead of the default
    pub fn set_layout(&mut self, name: impl Into<String>) {
        self.layout = Some(name.into());
    }

    /// Explicitly set layout, if any
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// Force a theme, bypassing user-agent selection
    pub fn set_theme(&mut self, name: impl Into<String>) {
        self.explicit_theme = Some(name.into());
        self.active_theme = None;
    }

    /// Theme in effect, once resolved by the renderer
    pub fn theme(&self) -> Option<&Theme> {
        self.active_theme.as_ref()
    }

    /// Expose a value to every rendered file
    pub fn set<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| ViewError::serialization_error(e.to_string()))?;
        self.variables.insert(key.into(), value);
        Ok(())
    }

    /// Expose every field of a serializable struct or map
    pub fn extend<T: Serialize>(&mut self, data: &T) -> Result<()> {
        match serde_json::to_value(data)
            .map_err(|e| ViewError::serialization_error(e.to_string()))?
        {
            serde_json::Value::Object(map) => {
                self.variables.extend(map);
                Ok(())
            }
            other => Err(ViewError::serialization_error(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    /// Read back a variable
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.variables.get(key)
    }

    /// All variables
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Render `view` wherever the block `name` appears
    pub fn set_block(&mut self, name: impl Into<String>, view: impl Into<String>) {
        self.blocks.set_block(name, view);
    }

    /// Block overrides and captures
    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    /// Start capturing markup for a block
    pub fn begin_block(&mut self, name: impl Into<String>) {
        self.blocks.begin(name);
    }

    /// Append markup to the innermost open block
    pub fn write_block(&mut self, text: &str) -> bool {
        self.blocks.write(text)
    }

    /// Close the innermost block in the current phase; see [`BlockStore::end`]
    pub fn end_block(&mut self) -> Option<String> {
        let emitted = self.blocks.end(self.phase)?;
        if self.blocks.write(&emitted) {
            None
        } else {
            Some(emitted)
        }
    }

    /// Current render phase
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Set a status message shown on this response (and flashed to the session)
    pub fn set_message(&mut self, text: impl Into<String>, kind: impl Into<String>) {
        self.messages.set(text, kind);
    }

    /// Message state
    pub fn messages_mut(&mut self) -> &mut Messages {
        &mut self.messages
    }

    /// Fragment cache handle of this request
    pub fn cache_mut(&mut self) -> &mut FragmentCache {
        &mut self.cache
    }

    /// Skip the automatic render at the end of the request
    pub fn set_autorender(&mut self, enabled: bool) {
        self.autorender = enabled;
    }

    /// Whether the automatic render runs
    pub fn autorender(&self) -> bool {
        self.autorender
    }
}
