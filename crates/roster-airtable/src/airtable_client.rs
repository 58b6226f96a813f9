//! Airtable REST API client helpers used by the membership store.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Url,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::airtable_types::{
    AirtableError, AirtableListResponse, AirtableRecord, AirtableUpsertResponse,
};

const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone)]
/// Created-or-merged record returned by an upsert.
pub struct AirtableUpsertedRecord {
    pub record: AirtableRecord,
    pub created: bool,
}

#[derive(Clone)]
/// Thin typed wrapper over one Airtable base.
pub struct AirtableApiClient {
    http: reqwest::Client,
    api_base: Url,
    base_id: String,
}

impl AirtableApiClient {
    pub fn new(
        api_base: &str,
        token: &str,
        base_id: &str,
        request_timeout_ms: u64,
    ) -> Result<Self, AirtableError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AirtableError::MissingApiToken);
        }
        let base_id = base_id.trim();
        if base_id.is_empty() {
            return Err(AirtableError::InvalidConfig(
                "base id cannot be empty".to_string(),
            ));
        }
        let api_base = Url::parse(api_base.trim().trim_end_matches('/')).map_err(|error| {
            AirtableError::InvalidConfig(format!("invalid api base '{api_base}': {error}"))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(AirtableError::InvalidConfig(format!(
                "api base '{api_base}' cannot carry path segments"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("roster-verify-bot"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|error| {
                AirtableError::InvalidConfig(format!("invalid access token header: {error}"))
            })?,
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_base,
            base_id: base_id.to_string(),
        })
    }

    /// Returns the first record matching `formula`, if any.
    pub async fn first_record(
        &self,
        table: &str,
        formula: &str,
    ) -> Result<Option<AirtableRecord>, AirtableError> {
        let url = self.table_url(table, None)?;
        let response: AirtableListResponse = self
            .request_json("list records", || {
                self.http
                    .get(url.clone())
                    .query(&[("filterByFormula", formula), ("maxRecords", "1")])
            })
            .await?;
        Ok(response.records.into_iter().next())
    }

    pub async fn get_record(
        &self,
        table: &str,
        record_id: &str,
    ) -> Result<AirtableRecord, AirtableError> {
        let url = self.table_url(table, Some(record_id))?;
        self.request_json("get record", || self.http.get(url.clone()))
            .await
    }

    /// Creates a record, or merges into the existing one whose `merge_on`
    /// fields match.
    pub async fn upsert_record(
        &self,
        table: &str,
        merge_on: &[&str],
        fields: Map<String, Value>,
    ) -> Result<AirtableUpsertedRecord, AirtableError> {
        let url = self.table_url(table, None)?;
        let payload = json!({
            "performUpsert": { "fieldsToMergeOn": merge_on },
            "records": [{ "fields": fields }],
        });
        let response: AirtableUpsertResponse = self
            .request_json("upsert record", || {
                self.http.patch(url.clone()).json(&payload)
            })
            .await?;
        let record = response.records.into_iter().next().ok_or_else(|| {
            AirtableError::InvalidResponse("upsert response contained no records".to_string())
        })?;
        let created = response.created_records.iter().any(|id| id == &record.id);
        Ok(AirtableUpsertedRecord { record, created })
    }

    pub async fn update_record(
        &self,
        table: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> Result<AirtableRecord, AirtableError> {
        let url = self.table_url(table, Some(record_id))?;
        let payload = json!({ "fields": fields });
        self.request_json("update record", || {
            self.http.patch(url.clone()).json(&payload)
        })
        .await
    }

    fn table_url(&self, table: &str, record_id: Option<&str>) -> Result<Url, AirtableError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AirtableError::InvalidConfig("api base cannot carry path segments".to_string())
            })?;
            segments.pop_if_empty().push(&self.base_id).push(table.trim());
            if let Some(record_id) = record_id {
                segments.push(record_id);
            }
        }
        Ok(url)
    }

    async fn request_json<T, F>(&self, operation: &str, builder: F) -> Result<T, AirtableError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        let response = builder().send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AirtableError::HttpStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn truncate_for_error(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
