//! Membership verification flow for the roster bot.
//!
//! Hosts the channel primer, the verification form, the resolver that links a
//! chat account to a membership record, and the interaction dispatch table the
//! platform runtime feeds events into. Nothing here talks to a concrete chat
//! platform or store; those are injected through `roster_core` traits and the
//! gateway traits defined in this crate.

pub mod channel_primer;
pub mod interaction_router;
pub mod verification_form;
pub mod verification_replies;
pub mod verification_resolver;

pub use channel_primer::{
    prime_channel, ButtonSpec, ChannelGateway, ChannelHistoryPage, MessageDeletion, PrimerReport,
    PrimerSettings, WelcomeMessage, WELCOME_MESSAGE,
};
pub use interaction_router::{
    DispatchReport, InteractionEvent, InteractionKind, InteractionResponder, InteractionRoute,
    InteractionRouter,
};
pub use verification_form::{
    FormSpec, SubmissionError, TextInputSpec, VerificationSubmission, MANAGER_FLAG_INPUT_ID,
    MEMBERSHIP_NUMBER_INPUT_ID, VERIFICATION_FORM, VERIFY_BUTTON_ID, VERIFY_MODAL_ID,
};
pub use verification_resolver::{
    VerificationOutcome, VerificationResolver, VerificationRoles, VerificationSettings,
    MAX_LINK_ATTEMPTS,
};
