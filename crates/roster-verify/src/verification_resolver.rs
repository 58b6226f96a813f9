//! Links a chat account to a membership record.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use roster_core::{
    AccountId, ChatAccount, LinkOutcome, LinkRecordId, MembershipNumber, MembershipStore, RoleId,
    RoleTargets,
};
use tracing::{info, warn};

use crate::verification_form::VerificationSubmission;

/// Link attempts made before a membership that keeps changing underneath us
/// fails the request.
pub const MAX_LINK_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Public struct `VerificationRoles` naming the three managed roles.
pub struct VerificationRoles {
    pub verified: RoleId,
    pub manager: RoleId,
    pub individual_contributor: RoleId,
}

impl VerificationRoles {
    /// Verified, plus exactly one of manager / individual contributor.
    pub fn granted(&self, manager: bool) -> RoleTargets {
        RoleTargets::new()
            .with(self.verified, true)
            .with(self.manager, manager)
            .with(self.individual_contributor, !manager)
    }

    pub fn revoked(&self) -> RoleTargets {
        RoleTargets::new()
            .with(self.verified, false)
            .with(self.manager, false)
            .with(self.individual_contributor, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Public struct `VerificationSettings` shared by the interaction handlers.
pub struct VerificationSettings {
    pub roles: VerificationRoles,
    /// Account mentioned in failure replies.
    pub admin_account: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates verification results.
pub enum VerificationOutcome {
    Verified {
        membership_number: MembershipNumber,
        manager: bool,
        link: LinkRecordId,
        newly_linked: bool,
    },
    MembershipNotFound {
        membership_number: MembershipNumber,
    },
}

impl VerificationOutcome {
    pub fn role_targets(&self, roles: &VerificationRoles) -> RoleTargets {
        match self {
            Self::Verified { manager, .. } => roles.granted(*manager),
            Self::MembershipNotFound { .. } => roles.revoked(),
        }
    }
}

#[derive(Clone)]
/// Public struct `VerificationResolver` wrapping the injected membership store.
pub struct VerificationResolver {
    store: Arc<dyn MembershipStore>,
}

impl VerificationResolver {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Upserts the account's link record, then adds it to the matching
    /// membership. Role changes and replies are left to the caller.
    pub async fn resolve(
        &self,
        account: &ChatAccount,
        submission: &VerificationSubmission,
    ) -> Result<VerificationOutcome> {
        let number = &submission.membership_number;
        let link = self
            .store
            .upsert_account_link(account)
            .await
            .with_context(|| format!("failed to upsert link record for {}", account.id))?;

        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let Some(membership) = self
                .store
                .find_membership(number)
                .await
                .with_context(|| format!("failed to find member number {number}"))?
            else {
                info!(account = %account.id, member_number = %number, "verification failed: member number not found");
                return Ok(VerificationOutcome::MembershipNotFound {
                    membership_number: number.clone(),
                });
            };

            let outcome = self
                .store
                .link_membership(&membership, &link)
                .await
                .with_context(|| format!("failed to link {link} to member number {number}"))?;
            match outcome {
                LinkOutcome::Linked | LinkOutcome::AlreadyLinked => {
                    info!(
                        account = %account.id,
                        member_number = %number,
                        link = %link,
                        manager = submission.manager,
                        "verification succeeded"
                    );
                    return Ok(VerificationOutcome::Verified {
                        membership_number: number.clone(),
                        manager: submission.manager,
                        link,
                        newly_linked: outcome == LinkOutcome::Linked,
                    });
                }
                LinkOutcome::Conflict if attempt < MAX_LINK_ATTEMPTS => {
                    warn!(
                        member_number = %number,
                        attempt,
                        "membership changed while linking; re-reading"
                    );
                }
                LinkOutcome::Conflict => bail!(
                    "member number {number} changed concurrently on {MAX_LINK_ATTEMPTS} link attempts"
                ),
            }
        }
    }
}
