//! Airtable-backed membership store for roster verification.
//!
//! Wraps the Airtable REST API with a small typed client and implements the
//! `roster_core::MembershipStore` contract on top of the link and membership
//! tables.

pub mod airtable_client;
pub mod airtable_formula;
pub mod airtable_types;
pub mod membership_store;

pub use airtable_client::AirtableApiClient;
pub use airtable_formula::match_field;
pub use airtable_types::{
    AirtableConfig, AirtableError, AirtableRecord, AirtableSchema, DEFAULT_AIRTABLE_API_BASE,
};
pub use membership_store::AirtableMembershipStore;
