use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_AIRTABLE_API_BASE: &str = "https://api.airtable.com/v0";
pub const DEFAULT_AIRTABLE_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
/// Enumerates supported `AirtableError` values.
pub enum AirtableError {
    #[error("missing airtable access token")]
    MissingApiToken,
    #[error("invalid airtable configuration: {0}")]
    InvalidConfig(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("airtable {operation} returned non-success status {status}: {body}")]
    HttpStatus {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid airtable response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Field names used on the link and membership tables.
pub struct AirtableSchema {
    pub link_account_field: String,
    pub link_name_field: String,
    pub member_number_field: String,
    pub member_links_field: String,
}

impl Default for AirtableSchema {
    fn default() -> Self {
        Self {
            link_account_field: "ID".to_string(),
            link_name_field: "Name".to_string(),
            member_number_field: "Member Number".to_string(),
            member_links_field: "Discord".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
/// Public struct `AirtableConfig` used to build the membership store.
pub struct AirtableConfig {
    pub api_base: String,
    pub token: String,
    pub base_id: String,
    pub members_table: String,
    pub links_table: String,
    pub request_timeout_ms: u64,
    pub schema: AirtableSchema,
}

impl AirtableConfig {
    pub fn new(
        token: impl Into<String>,
        base_id: impl Into<String>,
        members_table: impl Into<String>,
        links_table: impl Into<String>,
    ) -> Self {
        Self {
            api_base: DEFAULT_AIRTABLE_API_BASE.to_string(),
            token: token.into(),
            base_id: base_id.into(),
            members_table: members_table.into(),
            links_table: links_table.into(),
            request_timeout_ms: DEFAULT_AIRTABLE_REQUEST_TIMEOUT_MS,
            schema: AirtableSchema::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One Airtable row as returned by the REST API.
pub struct AirtableRecord {
    pub id: String,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl AirtableRecord {
    /// Reads a linked-record field; a missing field is an empty link list.
    pub fn linked_ids(&self, name: &str) -> Result<Vec<String>, AirtableError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value.as_str().map(str::to_string).ok_or_else(|| {
                        AirtableError::InvalidResponse(format!(
                            "record {} field '{name}' contains a non-string link",
                            self.id
                        ))
                    })
                })
                .collect(),
            Some(other) => Err(AirtableError::InvalidResponse(format!(
                "record {} field '{name}' is not a link list: {other}",
                self.id
            ))),
        }
    }

    /// Reads a numeric field, accepting integral floats as Airtable returns them.
    pub fn integer_field(&self, name: &str) -> Option<u64> {
        let value = self.fields.get(name)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|number| number.is_finite() && *number >= 0.0 && number.fract() == 0.0)
                .map(|number| number as u64)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AirtableListResponse {
    #[serde(default)]
    pub(crate) records: Vec<AirtableRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AirtableUpsertResponse {
    #[serde(default)]
    pub(crate) records: Vec<AirtableRecord>,
    #[serde(rename = "createdRecords", default)]
    pub(crate) created_records: Vec<String>,
}
