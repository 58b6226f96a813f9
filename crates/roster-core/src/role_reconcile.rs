//! Minimal grant/revoke planning for boolean role targets.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::{AccountId, ChatAccount, RoleId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered `role -> desired presence` mapping for one verification attempt.
pub struct RoleTargets {
    entries: Vec<(RoleId, bool)>,
}

impl RoleTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the desired presence for `role`, keeping the first insertion position.
    pub fn with(mut self, role: RoleId, present: bool) -> Self {
        match self.entries.iter_mut().find(|(existing, _)| *existing == role) {
            Some(entry) => entry.1 = present,
            None => self.entries.push((role, present)),
        }
        self
    }

    pub fn entries(&self) -> &[(RoleId, bool)] {
        &self.entries
    }

    pub fn desired(&self, role: RoleId) -> Option<bool> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == role)
            .map(|(_, present)| *present)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates the role mutations issued during reconciliation.
pub enum RoleChange {
    Grant(RoleId),
    Revoke(RoleId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Public struct `RoleReconcileReport` describing applied role mutations.
pub struct RoleReconcileReport {
    pub applied: Vec<RoleChange>,
    pub unchanged: usize,
}

impl RoleReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

#[async_trait]
/// Trait contract for member role mutation on the chat platform.
pub trait MemberRoleGateway: Send + Sync {
    async fn grant_role(&self, account: AccountId, role: RoleId) -> Result<()>;
    async fn revoke_role(&self, account: AccountId, role: RoleId) -> Result<()>;
}

/// Returns the grant/revoke operations needed to move `current` onto `targets`,
/// in mapping order.
pub fn plan_role_changes(current: &BTreeSet<RoleId>, targets: &RoleTargets) -> Vec<RoleChange> {
    targets
        .entries()
        .iter()
        .filter_map(|(role, present)| match (*present, current.contains(role)) {
            (true, false) => Some(RoleChange::Grant(*role)),
            (false, true) => Some(RoleChange::Revoke(*role)),
            _ => None,
        })
        .collect()
}

/// Applies the planned changes one at a time. A failing call aborts the
/// remaining changes without rolling back the ones already applied.
pub async fn reconcile_roles(
    gateway: &dyn MemberRoleGateway,
    account: &ChatAccount,
    targets: &RoleTargets,
) -> Result<RoleReconcileReport> {
    let changes = plan_role_changes(&account.roles, targets);
    let mut report = RoleReconcileReport {
        applied: Vec::with_capacity(changes.len()),
        unchanged: targets.entries().len().saturating_sub(changes.len()),
    };
    for change in changes {
        match change {
            RoleChange::Grant(role) => gateway
                .grant_role(account.id, role)
                .await
                .with_context(|| format!("failed to grant role {role} to {}", account.id))?,
            RoleChange::Revoke(role) => gateway
                .revoke_role(account.id, role)
                .await
                .with_context(|| format!("failed to revoke role {role} from {}", account.id))?,
        }
        report.applied.push(change);
    }
    if !report.is_noop() {
        info!(
            account = %account.id,
            applied = report.applied.len(),
            unchanged = report.unchanged,
            "reconciled member roles"
        );
    }
    Ok(report)
}
