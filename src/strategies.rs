//! Strategies decide whether a toggle is on for a given [`Context`], based on parameters
//! configured for the toggle on the server.
//!
//! [`StrategyRegistry`] maps strategy names (as they appear in
//! [`StrategyBinding::name`](crate::StrategyBinding::name)) to implementations. Strategies are
//! resolved at evaluation time; a name without an implementation never matches.
use std::{collections::HashMap, sync::Arc};

use crate::Context;

mod application_hostname;
mod default;
mod user_with_id;

pub use application_hostname::ApplicationHostnameStrategy;
pub use default::DefaultStrategy;
pub use user_with_id::UserWithIdStrategy;

/// A named, pluggable predicate over toggle parameters and a request context.
pub trait Strategy: Send + Sync {
    /// Name used to bind the strategy to toggles.
    fn name(&self) -> &str;

    /// Returns `true` if the strategy matches.
    ///
    /// Implementations must not fail: missing or malformed parameters mean "not enabled".
    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool;
}

impl<T: Strategy + ?Sized> Strategy for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool {
        (**self).is_enabled(parameters, context)
    }
}

/// Name to [`Strategy`] mapping. Names are case-sensitive.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> StrategyRegistry {
        StrategyRegistry::default()
    }

    /// Create a registry with all built-in strategies.
    pub fn with_builtin_strategies() -> StrategyRegistry {
        let mut registry = StrategyRegistry::new();
        registry.add(DefaultStrategy);
        registry.add(UserWithIdStrategy);
        registry.add(ApplicationHostnameStrategy::new());
        registry
    }

    /// Register `strategy` under `name`, replacing any strategy previously registered under the
    /// same name.
    pub fn register(&mut self, name: impl Into<String>, strategy: Arc<dyn Strategy>) -> &mut Self {
        let name = name.into();
        if self.strategies.insert(name.clone(), strategy).is_some() {
            log::debug!(target: "toggle", strategy:display = name; "replaced registered strategy");
        }
        self
    }

    /// Register `strategy` under its own [`Strategy::name`].
    pub fn add(&mut self, strategy: impl Strategy + 'static) -> &mut Self {
        let name = strategy.name().to_owned();
        self.register(name, Arc::new(strategy))
    }

    /// Find the strategy registered under `name`.
    pub fn resolve(&self, name: &str) -> Option<&dyn Strategy> {
        self.strategies.get(name).map(|strategy| &**strategy)
    }

    /// Registered strategy names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Split a comma-separated parameter into trimmed entries.
pub(crate) fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim)
}
