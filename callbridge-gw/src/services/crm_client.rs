//! Downstream record store client
//!
//! Salesforce-style REST interface: a SOQL query endpoint for lookups and
//! sobject create/update for activity writes. Object and phone-field names
//! come from configuration because the order schema is customer-specific,
//! so query results are read dynamically rather than via derived structs.

use async_trait::async_trait;
use callbridge_common::config::StoreConfig;
use callbridge_common::{Error, Result};
use serde_json::{json, Value};

use crate::models::{ActivityRecord, NewActivity, OrderRecord};

/// Activity object and field names on the store side
const ACTIVITY_OBJECT: &str = "Task";
const ACTIVITY_KEY_FIELD: &str = "CallObject";
const ACTIVITY_INSIGHTS_FLAG_FIELD: &str = "Insights_Logged__c";

/// Upper bound on candidate orders returned by the loose pre-filter
const CANDIDATE_QUERY_LIMIT: usize = 50;

/// Seam for the record store so the engine is testable in-memory
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loose pre-filter: orders whose phone field contains `phone_suffix`.
    /// Candidates still need exact confirmation after normalization.
    async fn find_order_candidates(&self, phone_suffix: &str) -> Result<Vec<OrderRecord>>;

    /// Activities whose correlation key equals `call_id` (zero or more)
    async fn find_activities_by_call_id(&self, call_id: &str) -> Result<Vec<ActivityRecord>>;

    /// Create an activity; returns the store-issued id
    async fn create_activity(&self, activity: &NewActivity) -> Result<String>;

    /// Replace an activity's description and insights flag
    async fn update_activity(
        &self,
        activity_id: &str,
        description: &str,
        insights_logged: bool,
    ) -> Result<()>;
}

/// HTTP client for the record store
pub struct CrmClient {
    http_client: reqwest::Client,
    config: StoreConfig,
}

impl CrmClient {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Store(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Run a SOQL query and return the raw record objects
    async fn query(&self, soql: &str) -> Result<Vec<Value>> {
        let url = format!("{}/query", self.base_url());

        tracing::debug!(soql = %soql, "Store query");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .query(&[("q", soql)])
            .send()
            .await
            .map_err(|e| Error::Store(format!("Store query failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Store query returned {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Store response parse failed: {}", e)))?;

        match body.get("records").and_then(Value::as_array) {
            Some(records) => Ok(records.clone()),
            None => Err(Error::Store("Store response missing 'records'".to_string())),
        }
    }

    fn candidate_soql(&self, phone_suffix: &str) -> String {
        // The suffix is digit-only by construction; quoting is still escaped
        // in case configuration ever routes free text here.
        let suffix = escape_soql(phone_suffix);
        let status_clause = if self.config.order_status_filter.is_empty() {
            String::new()
        } else {
            format!(
                " AND Status__c = '{}'",
                escape_soql(&self.config.order_status_filter)
            )
        };

        format!(
            "SELECT Id, Name, {field} FROM {object} WHERE {field} LIKE '%{suffix}%'{status} \
             ORDER BY CreatedDate DESC LIMIT {limit}",
            field = self.config.order_phone_field,
            object = self.config.order_object,
            suffix = suffix,
            status = status_clause,
            limit = CANDIDATE_QUERY_LIMIT,
        )
    }

    fn activity_soql(call_id: &str) -> String {
        format!(
            "SELECT Id, Subject, Description, {key}, WhatId, CallDurationInSeconds, {flag} \
             FROM {object} WHERE {key} = '{id}'",
            key = ACTIVITY_KEY_FIELD,
            flag = ACTIVITY_INSIGHTS_FLAG_FIELD,
            object = ACTIVITY_OBJECT,
            id = escape_soql(call_id),
        )
    }
}

#[async_trait]
impl RecordStore for CrmClient {
    async fn find_order_candidates(&self, phone_suffix: &str) -> Result<Vec<OrderRecord>> {
        let records = self.query(&self.candidate_soql(phone_suffix)).await?;
        let orders: Vec<OrderRecord> = records
            .iter()
            .map(|record| parse_order(record, &self.config.order_phone_field))
            .collect();

        tracing::debug!(
            suffix = %phone_suffix,
            candidates = orders.len(),
            "Candidate orders fetched"
        );
        Ok(orders)
    }

    async fn find_activities_by_call_id(&self, call_id: &str) -> Result<Vec<ActivityRecord>> {
        let records = self.query(&Self::activity_soql(call_id)).await?;
        Ok(records
            .iter()
            .map(|record| parse_activity(record, call_id))
            .collect())
    }

    async fn create_activity(&self, activity: &NewActivity) -> Result<String> {
        let url = format!("{}/sobjects/{}", self.base_url(), ACTIVITY_OBJECT);

        let mut body = json!({
            "Subject": activity.subject,
            "Description": activity.description,
            "Status": "Completed",
            "CallType": activity.call_type,
            "CallDurationInSeconds": activity.duration_secs,
            ACTIVITY_KEY_FIELD: activity.call_id,
            ACTIVITY_INSIGHTS_FLAG_FIELD: activity.insights_logged,
        });
        if let Some(order_id) = &activity.order_id {
            body["WhatId"] = json!(order_id);
        }

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Store(format!("Activity create failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Activity create returned {}: {}",
                status, text
            )));
        }

        let created: Value = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Activity create parse failed: {}", e)))?;

        created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Store("Activity create response missing 'id'".to_string()))
    }

    async fn update_activity(
        &self,
        activity_id: &str,
        description: &str,
        insights_logged: bool,
    ) -> Result<()> {
        let url = format!(
            "{}/sobjects/{}/{}",
            self.base_url(),
            ACTIVITY_OBJECT,
            activity_id
        );

        let body = json!({
            "Description": description,
            ACTIVITY_INSIGHTS_FLAG_FIELD: insights_logged,
        });

        let response = self
            .http_client
            .patch(&url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Store(format!("Activity update failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Activity update returned {}: {}",
                status, text
            )));
        }

        Ok(())
    }
}

/// Escape single quotes for inclusion in a SOQL string literal
fn escape_soql(value: &str) -> String {
    value.replace('\'', "\\'")
}

fn parse_order(record: &Value, phone_field: &str) -> OrderRecord {
    OrderRecord {
        id: string_field(record, "Id"),
        name: string_field(record, "Name"),
        phone: string_field(record, phone_field),
    }
}

fn parse_activity(record: &Value, call_id: &str) -> ActivityRecord {
    ActivityRecord {
        id: string_field(record, "Id"),
        subject: string_field(record, "Subject"),
        description: string_field(record, "Description"),
        call_id: call_id.to_string(),
        order_id: record
            .get("WhatId")
            .and_then(Value::as_str)
            .map(str::to_string),
        duration_secs: record
            .get("CallDurationInSeconds")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        insights_logged: record
            .get(ACTIVITY_INSIGHTS_FLAG_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn string_field(record: &Value, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
