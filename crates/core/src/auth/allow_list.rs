//! Static allow-list authorization.

use std::collections::HashSet;

use super::Authorizer;

/// Authorizer backed by a fixed set of user ids, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    user_ids: HashSet<i64>,
}

impl AllowList {
    pub fn new(user_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            user_ids: user_ids.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

impl Authorizer for AllowList {
    fn is_authorized(&self, user_id: i64) -> bool {
        self.user_ids.contains(&user_id)
    }

    fn method_name(&self) -> &'static str {
        "allow_list"
    }
}
