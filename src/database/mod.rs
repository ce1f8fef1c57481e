use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;

/// A stored row, kept as an open record. Fields the business logic depends on
/// are promoted to typed structs at the handler boundary; everything else is
/// forwarded verbatim.
pub type Row = Map<String, Value>;

/// Filter rendered as `column=eq.value` against the store's REST interface.
pub type EqFilter<'a> = (&'a str, &'a str);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("table store rejected the request ({status})")]
    Rejected { status: StatusCode, body: String },
    #[error("table store returned a malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the external table-oriented data store.
///
/// The store is a black box keyed by table name and row filters; this client
/// never interprets rows beyond relaying them. Requests authenticate with the
/// service key, which bypasses the store's row-level policies.
#[derive(Clone)]
pub struct TableStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl TableStore {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.identity_base_url().to_string(),
            service_key: config.identity_service_key.clone(),
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn query(filters: &[EqFilter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|(column, value)| (column.to_string(), format!("eq.{}", value)))
            .collect()
    }

    pub async fn select(&self, table: &str, filters: &[EqFilter<'_>]) -> Result<Vec<Row>, StoreError> {
        let mut query = Self::query(filters);
        query.push(("select".to_string(), "*".to_string()));

        let response = self
            .http
            .get(self.endpoint(table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .query(&query)
            .send()
            .await?;

        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn insert(&self, table: &str, row: &Row) -> Result<Row, StoreError> {
        let response = self
            .http
            .post(self.endpoint(table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let body = Self::check(response).await?.text().await?;
        let mut rows: Vec<Row> = serde_json::from_str(&body)?;
        rows.pop().ok_or_else(|| StoreError::Rejected {
            status: StatusCode::OK,
            body: "insert returned no rows".to_string(),
        })
    }

    pub async fn update(
        &self,
        table: &str,
        filters: &[EqFilter<'_>],
        patch: &Row,
    ) -> Result<Vec<Row>, StoreError> {
        let response = self
            .http
            .patch(self.endpoint(table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=representation")
            .query(&Self::query(filters))
            .json(patch)
            .send()
            .await?;

        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn delete(&self, table: &str, filters: &[EqFilter<'_>]) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.endpoint(table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .query(&Self::query(filters))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Rejected { status, body })
        }
    }
}
