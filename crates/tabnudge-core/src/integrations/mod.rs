//! Clients for the remote services the popup talks to.
//!
//! Both services are consumed as-is: JSON in, JSON out, with a `status`
//! field signalling success. Calls are never retried.

pub mod focus_tracker;
mod response;
pub mod session_api;

pub use focus_tracker::FocusTrackerClient;
pub use response::ApiResponse;
pub use session_api::{BrainrotTrigger, SessionApiClient};

use std::time::Duration;

use reqwest::Client;

use crate::error::Result;

fn http_client(service: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| response::transport_error(service, e))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::join_url;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h/api/", "/health"), "http://h/api/health");
        assert_eq!(join_url("http://h", "stats"), "http://h/stats");
    }
}
