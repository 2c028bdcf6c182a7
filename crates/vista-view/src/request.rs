//! What the router knows about the current request

/// Routing facts the engine needs: controller, method, path, agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// Sub-directory the controller lives in, with a trailing slash (may be empty)
    pub directory: String,
    /// Controller name
    pub controller: String,
    /// Method (action) name
    pub method: String,
    /// Request path, used for cache fingerprints and breadcrumbs
    pub uri: String,
    /// Raw `User-Agent` header
    pub user_agent: Option<String>,
    /// Whether the request came from `XMLHttpRequest`
    pub ajax: bool,
}

impl RequestInfo {
    /// Create request info for a controller/method pair
    pub fn new(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    /// Set the request path
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Set the controller sub-directory
    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        let mut directory = directory.into();
        if !directory.is_empty() && !directory.ends_with('/') {
            directory.push('/');
        }
        self.directory = directory;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Mark the request as Ajax
    pub fn ajax(mut self, ajax: bool) -> Self {
        self.ajax = ajax;
        self
    }

    /// Logical view derived from routing: `directory + controller/method`
    pub fn default_view(&self) -> String {
        format!("{}{}/{}", self.directory, self.controller, self.method)
    }

    /// Non-empty path segments
    pub fn segments(&self) -> Vec<&str> {
        let path = self.uri.split(['?', '#']).next().unwrap_or_default();
        path.split('/').filter(|s| !s.is_empty()).collect()
    }
}
