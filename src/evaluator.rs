use std::sync::Arc;

use crate::{strategies::StrategyRegistry, Context, Toggle, ToggleSnapshot};

/// Evaluator answers "is this feature on?" against the current [`ToggleSnapshot`].
///
/// Evaluation never fails and never waits on the fetch cycle. Anything uncertain (unknown toggle,
/// unknown strategy, missing parameter) resolves to "disabled".
pub struct Evaluator {
    snapshot: Arc<ToggleSnapshot>,
    strategies: Arc<StrategyRegistry>,
}

impl Evaluator {
    pub fn new(snapshot: Arc<ToggleSnapshot>, strategies: Arc<StrategyRegistry>) -> Evaluator {
        Evaluator {
            snapshot,
            strategies,
        }
    }

    /// Returns `true` if the toggle named `toggle_name` is enabled for `context`. Unknown toggles
    /// are disabled.
    pub fn is_enabled(&self, toggle_name: &str, context: &Context) -> bool {
        self.is_enabled_or(toggle_name, context, false)
    }

    /// Like [`Evaluator::is_enabled`], but returns `default` if the toggle is unknown.
    pub fn is_enabled_or(&self, toggle_name: &str, context: &Context, default: bool) -> bool {
        let toggles = self.snapshot.get();

        let Some(toggle) = toggles.get(toggle_name) else {
            log::trace!(target: "toggle", toggle:display = toggle_name, default; "evaluated unknown toggle");
            return default;
        };

        let enabled = toggle.is_enabled(&self.strategies, context);
        log::trace!(target: "toggle", toggle:display = toggle_name, enabled; "evaluated a toggle");
        enabled
    }

    /// Names of toggles in the current snapshot.
    pub fn toggle_names(&self) -> Vec<String> {
        self.snapshot.get().iter().map(|t| t.name.clone()).collect()
    }
}

impl Toggle {
    /// Evaluate the toggle against `context`.
    ///
    /// A disabled toggle is off. An enabled toggle without strategies is on. Otherwise the toggle
    /// is on if at least one strategy binding matches, checked in order. Bindings referring to
    /// unregistered strategies never match.
    pub fn is_enabled(&self, strategies: &StrategyRegistry, context: &Context) -> bool {
        if !self.enabled {
            return false;
        }

        if self.strategies.is_empty() {
            return true;
        }

        self.strategies.iter().any(|binding| {
            match strategies.resolve(&binding.name) {
                Some(strategy) => strategy.is_enabled(&binding.parameters, context),
                None => {
                    log::debug!(target: "toggle",
                                toggle:display = self.name,
                                strategy:display = binding.name;
                                "strategy is not registered");
                    false
                }
            }
        })
    }
}
