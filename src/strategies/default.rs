use std::collections::HashMap;

use super::Strategy;
use crate::Context;

/// Always enabled. Used to switch a toggle on for everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn is_enabled(&self, _parameters: &HashMap<String, String>, _context: &Context) -> bool {
        true
    }
}
