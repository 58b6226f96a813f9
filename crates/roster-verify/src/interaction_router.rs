//! Dispatch table from interaction custom ids to verification handlers.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use async_trait::async_trait;
use roster_core::{reconcile_roles, ChatAccount, MemberRoleGateway, RoleReconcileReport};
use tracing::{info, warn};

use crate::verification_form::{
    FormSpec, SubmissionError, VerificationSubmission, VERIFICATION_FORM, VERIFY_BUTTON_ID,
    VERIFY_MODAL_ID,
};
use crate::verification_replies::{
    invalid_submission_reply, membership_not_found_reply, verified_reply,
};
use crate::verification_resolver::{
    VerificationOutcome, VerificationResolver, VerificationSettings,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates the interaction shapes the router understands.
pub enum InteractionKind {
    ButtonPress,
    FormSubmit { fields: BTreeMap<String, String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Platform-neutral interaction delivered by the runtime.
pub struct InteractionEvent {
    pub custom_id: String,
    pub kind: InteractionKind,
    pub account: ChatAccount,
}

#[async_trait]
/// Trait contract for answering the interaction that triggered a handler.
pub trait InteractionResponder: Send + Sync {
    async fn open_form(&self, form: &FormSpec) -> Result<()>;
    async fn reply_ephemeral(&self, content: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates handlers reachable through the dispatch table.
pub enum InteractionRoute {
    OpenVerificationForm,
    ResolveVerification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates what a dispatched interaction ended up doing.
pub enum DispatchReport {
    FormOpened,
    Verified {
        membership_number: String,
        manager: bool,
        roles: RoleReconcileReport,
    },
    MembershipNotFound {
        membership_number: String,
        roles: RoleReconcileReport,
    },
    Rejected {
        error: SubmissionError,
    },
    Unrouted {
        custom_id: String,
    },
}

/// Routes interactions by custom id to the verification handlers.
pub struct InteractionRouter {
    routes: HashMap<&'static str, InteractionRoute>,
    resolver: VerificationResolver,
    settings: VerificationSettings,
}

impl InteractionRouter {
    pub fn new(resolver: VerificationResolver, settings: VerificationSettings) -> Self {
        let routes = HashMap::from([
            (VERIFY_BUTTON_ID, InteractionRoute::OpenVerificationForm),
            (VERIFY_MODAL_ID, InteractionRoute::ResolveVerification),
        ]);
        Self {
            routes,
            resolver,
            settings,
        }
    }

    pub fn route_for(&self, custom_id: &str) -> Option<InteractionRoute> {
        self.routes.get(custom_id).copied()
    }

    pub async fn dispatch(
        &self,
        event: &InteractionEvent,
        roles: &dyn MemberRoleGateway,
        responder: &dyn InteractionResponder,
    ) -> Result<DispatchReport> {
        match (self.route_for(&event.custom_id), &event.kind) {
            (Some(InteractionRoute::OpenVerificationForm), InteractionKind::ButtonPress) => {
                self.open_verification_form(event, responder).await
            }
            (Some(InteractionRoute::ResolveVerification), InteractionKind::FormSubmit { fields }) => {
                self.resolve_verification(event, fields, roles, responder)
                    .await
            }
            _ => {
                warn!(custom_id = %event.custom_id, account = %event.account.id, "ignoring unrouted interaction");
                Ok(DispatchReport::Unrouted {
                    custom_id: event.custom_id.clone(),
                })
            }
        }
    }

    async fn open_verification_form(
        &self,
        event: &InteractionEvent,
        responder: &dyn InteractionResponder,
    ) -> Result<DispatchReport> {
        info!(account = %event.account.id, name = %event.account.display_name, "verify button pressed");
        responder
            .open_form(&VERIFICATION_FORM)
            .await
            .context("failed to open verification form")?;
        Ok(DispatchReport::FormOpened)
    }

    async fn resolve_verification(
        &self,
        event: &InteractionEvent,
        fields: &BTreeMap<String, String>,
        roles: &dyn MemberRoleGateway,
        responder: &dyn InteractionResponder,
    ) -> Result<DispatchReport> {
        let account = &event.account;
        info!(account = %account.id, name = %account.display_name, fields = ?fields, "verify form submitted");
        let submission = match VerificationSubmission::from_fields(fields) {
            Ok(submission) => submission,
            Err(error) => {
                warn!(account = %account.id, error = %error, "rejecting verification form");
                responder
                    .reply_ephemeral(&invalid_submission_reply(&error))
                    .await
                    .context("failed to send validation reply")?;
                return Ok(DispatchReport::Rejected { error });
            }
        };

        let outcome = self.resolver.resolve(account, &submission).await?;
        let targets = outcome.role_targets(&self.settings.roles);
        match outcome {
            VerificationOutcome::Verified {
                membership_number,
                manager,
                ..
            } => {
                if let Err(error) = responder
                    .reply_ephemeral(&verified_reply(&membership_number))
                    .await
                {
                    warn!(account = %account.id, error = %error, "failed to send verification reply; applying roles anyway");
                }
                let roles = reconcile_roles(roles, account, &targets).await?;
                Ok(DispatchReport::Verified {
                    membership_number: membership_number.entered().to_string(),
                    manager,
                    roles,
                })
            }
            VerificationOutcome::MembershipNotFound { membership_number } => {
                let roles = reconcile_roles(roles, account, &targets).await?;
                if let Err(error) = responder
                    .reply_ephemeral(&membership_not_found_reply(
                        &membership_number,
                        self.settings.admin_account,
                    ))
                    .await
                {
                    warn!(account = %account.id, error = %error, "failed to send verification failure reply");
                }
                Ok(DispatchReport::MembershipNotFound {
                    membership_number: membership_number.entered().to_string(),
                    roles,
                })
            }
        }
    }
}
