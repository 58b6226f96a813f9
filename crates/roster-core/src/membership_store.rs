//! Contract for the remote store holding link and membership records.

use std::{collections::BTreeSet, fmt};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ChatAccount;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Store-assigned identifier of a link record.
pub struct LinkRecordId(pub String);

impl LinkRecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Membership number as matched against the store, plus the text the user typed.
pub struct MembershipNumber {
    value: u64,
    entered: String,
}

impl MembershipNumber {
    pub fn new(value: u64, entered: impl Into<String>) -> Self {
        Self {
            value,
            entered: entered.into(),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Returns the number exactly as submitted, leading zeros included.
    pub fn entered(&self) -> &str {
        &self.entered
    }
}

impl fmt::Display for MembershipNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Snapshot of an externally managed membership record.
///
/// `linked_accounts` doubles as the version used to guard the linked-set write.
pub struct MembershipRecord {
    pub record_id: String,
    pub member_number: u64,
    pub linked_accounts: BTreeSet<LinkRecordId>,
}

impl MembershipRecord {
    pub fn is_linked(&self, link: &LinkRecordId) -> bool {
        self.linked_accounts.contains(link)
    }

    /// Linked set after adding `link`; duplicates collapse.
    pub fn linked_with(&self, link: &LinkRecordId) -> BTreeSet<LinkRecordId> {
        let mut linked = self.linked_accounts.clone();
        linked.insert(link.clone());
        linked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates results of adding a link record to a membership's linked set.
pub enum LinkOutcome {
    Linked,
    AlreadyLinked,
    /// The stored linked set no longer matches the snapshot; nothing was written.
    Conflict,
}

#[async_trait]
/// Trait contract for link/membership record access.
pub trait MembershipStore: Send + Sync {
    /// Returns the link record id for `account`, creating the record when absent.
    async fn upsert_account_link(&self, account: &ChatAccount) -> Result<LinkRecordId>;

    async fn find_membership(&self, number: &MembershipNumber)
        -> Result<Option<MembershipRecord>>;

    /// Adds `link` to the linked set of `snapshot`, writing only when the stored
    /// set still equals `snapshot.linked_accounts`.
    async fn link_membership(
        &self,
        snapshot: &MembershipRecord,
        link: &LinkRecordId,
    ) -> Result<LinkOutcome>;
}
