use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AccountId, RoleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of the requesting guild member taken when an interaction arrives.
pub struct ChatAccount {
    pub id: AccountId,
    /// `username#discriminator`, or the bare username for accounts without one.
    pub display_name: String,
    pub roles: BTreeSet<RoleId>,
}

impl ChatAccount {
    pub fn new(
        id: AccountId,
        display_name: impl Into<String>,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}
