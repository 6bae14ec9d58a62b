//! Backend-as-a-service REST client (PostgREST conventions)
//!
//! - list:   `GET    {base}/rest/v1/{table}?select=*`
//! - insert: `POST   {base}/rest/v1/{table}` with `Prefer: return=minimal`
//! - update: `PATCH  {base}/rest/v1/{table}?id=eq.{id}`

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;

use super::PersonStore;
use crate::error::StoreError;
use crate::model::{NewPerson, Person, VotePatch};

const USER_AGENT: &str = concat!("loyal-finder/", env!("CARGO_PKG_VERSION"));

/// REST client for the hosted `people` table
pub struct RestStore {
    http_client: reqwest::Client,
    table_url: String,
}

impl RestStore {
    /// `base_url` is the project URL (e.g. `https://xyz.supabase.co`);
    /// `api_key` is the anonymous key sent as `apikey` and bearer token
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            let key = HeaderValue::from_str(api_key)
                .map_err(|e| StoreError::Network(format!("invalid api key: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| StoreError::Network(format!("invalid api key: {}", e)))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
        })
    }

    /// Turn a non-success response into `StoreError::Api`
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PersonStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn list_all(&self) -> Result<Vec<Person>, StoreError> {
        tracing::debug!(url = %self.table_url, "Listing people");

        let response = self
            .http_client
            .get(&self.table_url)
            .query(&[("select", "*")])
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        response
            .json::<Vec<Person>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn insert(&self, person: &NewPerson) -> Result<(), StoreError> {
        tracing::debug!(url = %self.table_url, name = %person.name, "Inserting person");

        let response = self
            .http_client
            .post(&self.table_url)
            .header("Prefer", "return=minimal")
            .json(person)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn update_votes(&self, id: &str, patch: VotePatch) -> Result<(), StoreError> {
        tracing::debug!(url = %self.table_url, id = %id, ?patch, "Patching vote counters");

        let filter = format!("eq.{}", id);
        let response = self
            .http_client
            .patch(&self.table_url)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
