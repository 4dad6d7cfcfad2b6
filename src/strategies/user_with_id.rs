use std::collections::HashMap;

use super::{split_list, Strategy};
use crate::Context;

/// Enabled for users listed in the comma-separated `userIds` parameter.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserWithIdStrategy;

impl UserWithIdStrategy {
    pub const USER_IDS_PARAM: &'static str = "userIds";
}

impl Strategy for UserWithIdStrategy {
    fn name(&self) -> &str {
        "userWithId"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool {
        let Some(user_id) = context.user_id.as_deref() else {
            return false;
        };
        let Some(user_ids) = parameters.get(Self::USER_IDS_PARAM) else {
            return false;
        };
        split_list(user_ids).any(|id| id == user_id)
    }
}
