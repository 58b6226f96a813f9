//! `MembershipStore` implementation over the Airtable link and membership tables.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use roster_core::{
    ChatAccount, LinkOutcome, LinkRecordId, MembershipNumber, MembershipRecord, MembershipStore,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::airtable_client::AirtableApiClient;
use crate::airtable_formula::match_field;
use crate::airtable_types::{AirtableConfig, AirtableError, AirtableRecord, AirtableSchema};

#[derive(Clone)]
/// Long-lived store handle shared by every interaction handler.
pub struct AirtableMembershipStore {
    client: AirtableApiClient,
    members_table: String,
    links_table: String,
    schema: AirtableSchema,
}

impl AirtableMembershipStore {
    pub fn new(config: &AirtableConfig) -> Result<Self, AirtableError> {
        if config.members_table.trim().is_empty() || config.links_table.trim().is_empty() {
            return Err(AirtableError::InvalidConfig(
                "members and links table ids cannot be empty".to_string(),
            ));
        }
        let client = AirtableApiClient::new(
            &config.api_base,
            &config.token,
            &config.base_id,
            config.request_timeout_ms,
        )?;
        Ok(Self {
            client,
            members_table: config.members_table.trim().to_string(),
            links_table: config.links_table.trim().to_string(),
            schema: config.schema.clone(),
        })
    }

    fn membership_from_record(
        &self,
        record: &AirtableRecord,
        fallback_number: u64,
    ) -> Result<MembershipRecord, AirtableError> {
        let linked_accounts = self.linked_set(record)?;
        Ok(MembershipRecord {
            record_id: record.id.clone(),
            member_number: record
                .integer_field(&self.schema.member_number_field)
                .unwrap_or(fallback_number),
            linked_accounts,
        })
    }

    fn linked_set(&self, record: &AirtableRecord) -> Result<BTreeSet<LinkRecordId>, AirtableError> {
        Ok(record
            .linked_ids(&self.schema.member_links_field)?
            .into_iter()
            .map(LinkRecordId::new)
            .collect())
    }
}

#[async_trait]
impl MembershipStore for AirtableMembershipStore {
    async fn upsert_account_link(&self, account: &ChatAccount) -> Result<LinkRecordId> {
        let formula = match_field(&self.schema.link_account_field, account.id.get());
        let existing = self
            .client
            .first_record(&self.links_table, &formula)
            .await
            .with_context(|| format!("failed to look up link record for {}", account.id))?;
        if let Some(record) = existing {
            return Ok(LinkRecordId::new(record.id));
        }

        let mut fields = Map::new();
        fields.insert(
            self.schema.link_name_field.clone(),
            Value::String(account.display_name.clone()),
        );
        fields.insert(
            self.schema.link_account_field.clone(),
            Value::from(account.id.get()),
        );
        let upserted = self
            .client
            .upsert_record(
                &self.links_table,
                &[self.schema.link_account_field.as_str()],
                fields,
            )
            .await
            .with_context(|| format!("failed to create link record for {}", account.id))?;
        if upserted.created {
            info!(account = %account.id, record = %upserted.record.id, "created link record");
        } else {
            warn!(
                account = %account.id,
                record = %upserted.record.id,
                "link record appeared concurrently; merged instead of creating a duplicate"
            );
        }
        Ok(LinkRecordId::new(upserted.record.id))
    }

    async fn find_membership(
        &self,
        number: &MembershipNumber,
    ) -> Result<Option<MembershipRecord>> {
        let formula = match_field(&self.schema.member_number_field, number.value());
        let record = self
            .client
            .first_record(&self.members_table, &formula)
            .await
            .with_context(|| format!("failed to look up member number {number}"))?;
        record
            .map(|record| self.membership_from_record(&record, number.value()))
            .transpose()
            .map_err(Into::into)
    }

    async fn link_membership(
        &self,
        snapshot: &MembershipRecord,
        link: &LinkRecordId,
    ) -> Result<LinkOutcome> {
        if snapshot.is_linked(link) {
            return Ok(LinkOutcome::AlreadyLinked);
        }

        let current = self
            .client
            .get_record(&self.members_table, &snapshot.record_id)
            .await
            .with_context(|| format!("failed to re-read membership {}", snapshot.record_id))?;
        let current_linked = self.linked_set(&current)?;
        if current_linked.contains(link) {
            return Ok(LinkOutcome::AlreadyLinked);
        }
        if current_linked != snapshot.linked_accounts {
            return Ok(LinkOutcome::Conflict);
        }

        let linked: Vec<Value> = snapshot
            .linked_with(link)
            .into_iter()
            .map(|id| Value::String(id.0))
            .collect();
        let mut fields = Map::new();
        fields.insert(self.schema.member_links_field.clone(), Value::Array(linked));
        self.client
            .update_record(&self.members_table, &snapshot.record_id, fields)
            .await
            .with_context(|| format!("failed to link membership {}", snapshot.record_id))?;
        Ok(LinkOutcome::Linked)
    }
}
