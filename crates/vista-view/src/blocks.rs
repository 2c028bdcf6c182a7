//! Named blocks
//!
//! Two flavors share one store. View overrides (`set_block`) swap the view a
//! layout renders for a named region. Captured blocks (`begin`/`end`) record
//! inline markup: a view captures content that the layout later emits in place
//! of its own inline default.

use std::collections::HashMap;

/// Which pass of a request is producing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPhase {
    /// Rendering the current view (or its blocks)
    #[default]
    RenderingView,
    /// Rendering the layout the view is composed into
    RenderingLayout,
}

#[derive(Debug, Clone)]
struct OpenBlock {
    name: String,
    buffer: String,
}

/// Block overrides, captured content and the open-block stack of a request
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    views: HashMap<String, String>,
    captured: HashMap<String, String>,
    open: Vec<OpenBlock>,
}

impl BlockStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `view` wherever the block `name` appears; an empty name is ignored
    pub fn set_block(&mut self, name: impl Into<String>, view: impl Into<String>) {
        let name = name.into();
        if name.is_empty() {
            tracing::debug!("No block name provided");
            return;
        }
        self.views.insert(name, view.into());
    }

    /// View to render for a block: the override if set, else `default_view`
    pub fn resolve_block(&self, name: &str, default_view: Option<&str>) -> Option<String> {
        if name.is_empty() {
            tracing::debug!("No block name provided");
            return None;
        }

        let resolved = self
            .views
            .get(name)
            .map(String::as_str)
            .or(default_view)
            .filter(|view| !view.is_empty());

        if resolved.is_none() {
            tracing::debug!(
                block = name,
                default_view = default_view.unwrap_or_default(),
                "Unable to find the default block"
            );
        }
        resolved.map(str::to_string)
    }

    /// Content previously captured for `name`
    pub fn captured(&self, name: &str) -> Option<&str> {
        self.captured.get(name).map(String::as_str)
    }

    /// Every captured block
    pub fn captures(&self) -> &HashMap<String, String> {
        &self.captured
    }

    /// Captures recorded after `before` was taken, or changed since
    pub fn captures_since(&self, before: &HashMap<String, String>) -> HashMap<String, String> {
        self.captured
            .iter()
            .filter(|(name, content)| before.get(*name) != Some(*content))
            .map(|(name, content)| (name.clone(), content.clone()))
            .collect()
    }

    /// Record captures made elsewhere, e.g. by a cached view
    pub fn restore_captures(&mut self, captures: HashMap<String, String>) {
        self.captured.extend(captures);
    }

    /// Start capturing output for `name`
    pub fn begin(&mut self, name: impl Into<String>) {
        self.open.push(OpenBlock {
            name: name.into(),
            buffer: String::new(),
        });
    }

    /// Whether a capture is in progress
    pub fn is_capturing(&self) -> bool {
        !self.open.is_empty()
    }

    /// Number of open blocks
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Append to the innermost capture; returns `false` when none is open
    pub fn write(&mut self, text: &str) -> bool {
        match self.open.last_mut() {
            Some(block) => {
                block.buffer.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Close the innermost block and return what it emits.
    ///
    /// While rendering a view the buffer is stored for the layout and nothing
    /// is emitted. While rendering the layout, previously captured content
    /// wins over the inline default that was just captured. The caller writes
    /// the result to the enclosing capture or to the output.
    ///
    /// A close with nothing open is logged and ignored.
    pub fn end(&mut self, phase: RenderPhase) -> Option<String> {
        let Some(block) = self.open.pop() else {
            tracing::warn!("Block closed without a matching begin");
            return None;
        };

        match phase {
            RenderPhase::RenderingView => {
                self.captured.insert(block.name, block.buffer);
                None
            }
            RenderPhase::RenderingLayout => Some(
                self.captured
                    .get(&block.name)
                    .cloned()
                    .unwrap_or(block.buffer),
            ),
        }
    }

    /// Discard blocks opened beyond `depth`, logging each one
    pub fn truncate(&mut self, depth: usize) {
        while self.open.len() > depth {
            if let Some(block) = self.open.pop() {
                tracing::warn!(block = %block.name, "Block left open, discarding");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let mut store = BlockStore::new();
        store.set_block("sidebar", "promo_sidebar");
        assert_eq!(
            store.resolve_block("sidebar", Some("standard_sidebar")).as_deref(),
            Some("promo_sidebar")
        );
    }

    #[test]
    fn test_default_used_without_override() {
        let store = BlockStore::new();
        assert_eq!(
            store.resolve_block("sidebar", Some("standard_sidebar")).as_deref(),
            Some("standard_sidebar")
        );
        assert_eq!(store.resolve_block("sidebar", None), None);
        assert_eq!(store.resolve_block("", Some("x")), None);
    }

    #[test]
    fn test_set_block_overwrites_and_ignores_empty_name() {
        let mut store = BlockStore::new();
        store.set_block("footer", "a");
        store.set_block("footer", "b");
        store.set_block("", "c");
        assert_eq!(store.resolve_block("footer", None).as_deref(), Some("b"));
        assert_eq!(store.resolve_block("", None), None);
    }

    #[test]
    fn test_view_phase_captures() {
        let mut store = BlockStore::new();
        store.begin("title");
        assert!(store.write("Post 42"));
        assert_eq!(store.end(RenderPhase::RenderingView), None);
        assert_eq!(store.captured("title"), Some("Post 42"));
        assert!(!store.is_capturing());
    }

    #[test]
    fn test_layout_phase_prefers_captured() {
        let mut store = BlockStore::new();
        store.begin("title");
        store.write("Post 42");
        store.end(RenderPhase::RenderingView);

        store.begin("title");
        store.write("Default title");
        assert_eq!(
            store.end(RenderPhase::RenderingLayout).as_deref(),
            Some("Post 42")
        );

        store.begin("footer");
        store.write("Default footer");
        assert_eq!(
            store.end(RenderPhase::RenderingLayout).as_deref(),
            Some("Default footer")
        );
    }

    #[test]
    fn test_nested_blocks_lifo() {
        let mut store = BlockStore::new();
        store.begin("outer");
        store.write("a");
        store.begin("inner");
        store.write("b");
        assert_eq!(store.depth(), 2);
        store.end(RenderPhase::RenderingView);
        store.write("c");
        store.end(RenderPhase::RenderingView);

        assert_eq!(store.captured("inner"), Some("b"));
        assert_eq!(store.captured("outer"), Some("ac"));
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn test_mismatched_end_is_noop() {
        let mut store = BlockStore::new();
        assert_eq!(store.end(RenderPhase::RenderingLayout), None);
        assert!(!store.write("lost"));
    }

    #[test]
    fn test_truncate_discards_open_blocks() {
        let mut store = BlockStore::new();
        store.begin("a");
        store.begin("b");
        store.truncate(1);
        assert_eq!(store.depth(), 1);
        store.truncate(0);
        assert!(!store.is_capturing());
        assert_eq!(store.captured("a"), None);
    }

    #[test]
    fn test_captures_since_and_restore() {
        let mut store = BlockStore::new();
        store.begin("title");
        store.write("Old");
        store.end(RenderPhase::RenderingView);
        let before = store.captures().clone();

        store.begin("title");
        store.write("New");
        store.end(RenderPhase::RenderingView);
        store.begin("footer");
        store.end(RenderPhase::RenderingView);

        let recorded = store.captures_since(&before);
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded["title"], "New");

        let mut replayed = BlockStore::new();
        replayed.restore_captures(recorded);
        assert_eq!(replayed.captured("title"), Some("New"));
        assert_eq!(replayed.captured("footer"), Some(""));
    }
}
