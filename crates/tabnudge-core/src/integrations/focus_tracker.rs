//! Eye-tracking focus service client.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::response::{decode, transport_error};
use super::{http_client, join_url, ApiResponse};
use crate::error::Result;
use crate::storage::ApiConfig;

const SERVICE: &str = "focus tracker";

pub struct FocusTrackerClient {
    client: Client,
    base_url: String,
}

impl FocusTrackerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(SERVICE, timeout)?,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(&api.focus_base_url, Duration::from_secs(api.timeout_secs))
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<ApiResponse> {
        let mut request = self.client.post(join_url(&self.base_url, path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        decode(SERVICE, response).await
    }

    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let response = self
            .client
            .get(join_url(&self.base_url, path))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        decode(SERVICE, response).await
    }

    /// Start tracking, optionally for a fixed number of seconds.
    pub async fn start(&self, duration_secs: Option<u64>) -> Result<ApiResponse> {
        let body = match duration_secs {
            Some(secs) => json!({ "duration": secs }),
            None => json!({}),
        };
        self.post("start", Some(body)).await
    }

    pub async fn stop(&self) -> Result<ApiResponse> {
        self.post("stop", None).await
    }

    pub async fn status(&self) -> Result<ApiResponse> {
        self.get("status").await
    }

    pub async fn stats(&self) -> Result<ApiResponse> {
        self.get("stats").await
    }

    pub async fn reset_error(&self) -> Result<ApiResponse> {
        self.post("reset_error", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use mockito::Matcher;

    #[tokio::test]
    async fn start_sends_duration() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/start")
            .match_body(Matcher::Json(json!({"duration": 60})))
            .with_status(200)
            .with_body(
                r#"{"status": "success", "message": "Eye tracking started", "duration": 60}"#,
            )
            .create_async()
            .await;

        let client = FocusTrackerClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let response = client.start(Some(60)).await.unwrap();
        assert_eq!(response.summary(), "Eye tracking started");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn stop_without_session_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/stop")
            .with_status(200)
            .with_body(r#"{"status": "error", "message": "No tracking in progress"}"#)
            .create_async()
            .await;

        let client = FocusTrackerClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = client.stop().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Api { ref message, .. } if message == "No tracking in progress"
        ));
    }

    #[tokio::test]
    async fn stats_in_progress_keeps_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stats")
            .with_status(200)
            .with_body(
                r#"{"status": "in_progress", "times_looked_away": 2, "currently_focused": true}"#,
            )
            .create_async()
            .await;

        let client = FocusTrackerClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let stats = client.stats().await.unwrap();
        assert_eq!(stats.status.as_deref(), Some("in_progress"));
        assert_eq!(stats.get("times_looked_away"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn status_with_error_field_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/status")
            .with_status(200)
            .with_body(r#"{"status": "inactive", "error": "Tracking error: camera busy"}"#)
            .create_async()
            .await;

        let client = FocusTrackerClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = client.status().await.unwrap_err();
        assert!(err.to_string().contains("camera busy"));
    }
}
