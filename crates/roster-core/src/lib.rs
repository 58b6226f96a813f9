//! Foundational domain types shared across roster crates.
//!
//! Provides platform-neutral identifiers, the chat account snapshot, the
//! membership store contract, and the role reconciliation helper used by the
//! verification flow and the Discord runtime.

pub mod account;
pub mod ids;
pub mod membership_store;
pub mod role_reconcile;

pub use account::ChatAccount;
pub use ids::{AccountId, ChannelId, GuildId, IdParseError, MessageId, RoleId};
pub use membership_store::{
    LinkOutcome, LinkRecordId, MembershipNumber, MembershipRecord, MembershipStore,
};
pub use role_reconcile::{
    plan_role_changes, reconcile_roles, MemberRoleGateway, RoleChange, RoleReconcileReport,
    RoleTargets,
};
