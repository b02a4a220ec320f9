//! Session logging service client.
//!
//! Records locked-in / brain-rot sessions and visited URLs for a user.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::response::{decode, transport_error};
use super::{http_client, join_url, ApiResponse};
use crate::error::{CoreError, Result};
use crate::storage::ApiConfig;

const SERVICE: &str = "session service";

/// Body of `POST /brainrot/trigger`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrainrotTrigger {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub look_away_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub struct SessionApiClient {
    client: Client,
    base_url: String,
    user_id: String,
}

impl SessionApiClient {
    pub fn new(base_url: &str, user_id: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(SERVICE, timeout)?,
            base_url: base_url.to_string(),
            user_id: user_id.to_string(),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(
            &api.session_base_url,
            &api.user_id,
            Duration::from_secs(api.timeout_secs),
        )
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn user_path(&self, suffix: &str) -> String {
        format!("user/{}/{}", self.user_id, suffix)
    }

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        let url = join_url(&self.base_url, path);
        debug!(url = url.as_str(), "POST");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        decode(SERVICE, response).await
    }

    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let url = join_url(&self.base_url, path);
        debug!(url = url.as_str(), "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        decode(SERVICE, response).await
    }

    /// `locked_in` selects productive mode; false starts a brain-rot session.
    pub async fn start_session(&self, locked_in: bool, notes: &str) -> Result<ApiResponse> {
        self.post(
            &self.user_path("state/start"),
            json!({ "locked_in": locked_in, "notes": notes }),
        )
        .await
    }

    /// End `session_id`, or the active session when `None`.
    pub async fn end_session(&self, session_id: Option<&str>) -> Result<ApiResponse> {
        let body = match session_id {
            Some(id) => json!({ "session_id": id }),
            None => json!({}),
        };
        self.post(&self.user_path("state/end"), body).await
    }

    pub async fn toggle_session(&self, notes: &str) -> Result<ApiResponse> {
        self.post(&self.user_path("state/toggle"), json!({ "notes": notes }))
            .await
    }

    pub async fn start_eye_tracking(&self) -> Result<ApiResponse> {
        self.post("brainrot/start", json!({ "user_id": self.user_id }))
            .await
    }

    pub async fn trigger_brainrot(&self, trigger: &BrainrotTrigger) -> Result<ApiResponse> {
        let body = serde_json::to_value(trigger).map_err(|e| CoreError::Api {
            service: SERVICE.to_string(),
            message: e.to_string(),
            source: Some(Box::new(e)),
        })?;
        self.post("brainrot/trigger", body).await
    }

    pub async fn submit_url(&self, url: &str) -> Result<ApiResponse> {
        self.post("url/submit", json!({ "user_id": self.user_id, "url": url }))
            .await
    }

    /// Categorize without recording the visit.
    pub async fn categorize_url(&self, url: &str) -> Result<ApiResponse> {
        self.post("url/categorize", json!({ "url": url })).await
    }

    pub async fn history(&self) -> Result<ApiResponse> {
        self.get(&self.user_path("history")).await
    }

    pub async fn stats(&self) -> Result<ApiResponse> {
        self.get(&self.user_path("stats")).await
    }

    pub async fn locked_in_sessions(&self) -> Result<ApiResponse> {
        self.get(&self.user_path("locked-in")).await
    }

    pub async fn health(&self) -> Result<ApiResponse> {
        self.get("health").await
    }
}
