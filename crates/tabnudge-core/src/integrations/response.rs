use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// JSON body returned by the remote services.
///
/// Only the common envelope fields are typed; everything else is kept in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiResponse {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// One-line description for the user.
    pub fn summary(&self) -> String {
        match (&self.message, &self.status) {
            (Some(message), _) => message.clone(),
            (None, Some(status)) => format!("status: {status}"),
            (None, None) => "OK".to_string(),
        }
    }
}

pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> CoreError {
    CoreError::Api {
        service: service.to_string(),
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}

/// Decode a response, turning HTTP failures and error envelopes into
/// `CoreError::Api`.
pub(crate) async fn decode(service: &str, response: reqwest::Response) -> Result<ApiResponse> {
    let code = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(service, e))?;
    let parsed = serde_json::from_str::<ApiResponse>(&text);

    if !code.is_success() {
        let detail = parsed
            .ok()
            .and_then(|body| body.error.or(body.message))
            .unwrap_or_else(|| text.trim().to_string());
        let message = if detail.is_empty() {
            format!("HTTP {code}")
        } else {
            format!("HTTP {code}: {detail}")
        };
        return Err(CoreError::api(service, message));
    }

    let body = parsed.map_err(|e| CoreError::Api {
        service: service.to_string(),
        message: format!("invalid response body: {e}"),
        source: Some(Box::new(e)),
    })?;

    if let Some(error) = &body.error {
        return Err(CoreError::api(service, error.clone()));
    }
    if body.status.as_deref() == Some("error") {
        let message = body
            .message
            .clone()
            .unwrap_or_else(|| "request failed".to_string());
        return Err(CoreError::api(service, message));
    }
    Ok(body)
}
