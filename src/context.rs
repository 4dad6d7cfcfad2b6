use std::collections::HashMap;

/// Request-scoped attributes passed into evaluation.
///
/// A context is created by the caller for a single evaluation (or a single request) and is never
/// stored by the client.
///
/// # Examples
/// ```
/// # use toggle_core::Context;
/// let context = Context::new()
///     .with_user_id("user-42")
///     .with_remote_address("10.1.2.3")
///     .with_property("plan", "enterprise");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub remote_address: Option<String>,
    pub environment: Option<String>,
    pub app_name: Option<String>,
    pub properties: HashMap<String, String>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Context {
        Context::default()
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Context {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Context {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_remote_address(mut self, remote_address: impl Into<String>) -> Context {
        self.remote_address = Some(remote_address.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Context {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Context {
        self.app_name = Some(app_name.into());
        self
    }

    /// Add a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Context {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a field by its wire name, falling back to custom properties.
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "userId" => self.user_id.as_deref(),
            "sessionId" => self.session_id.as_deref(),
            "remoteAddress" => self.remote_address.as_deref(),
            "environment" => self.environment.as_deref(),
            "appName" => self.app_name.as_deref(),
            _ => self.properties.get(field).map(String::as_str),
        }
    }
}
