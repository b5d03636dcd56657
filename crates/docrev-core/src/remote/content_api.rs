use crate::error::{DocrevError, RemoteFailureKind};
use crate::remote::DocumentAnalyzer;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, info};

pub const ENDPOINT_VAR: &str = "DOCREV_ENDPOINT";
pub const API_KEY_VAR: &str = "DOCREV_API_KEY";
pub const API_VERSION_VAR: &str = "DOCREV_API_VERSION";

const DEFAULT_API_VERSION: &str = "2025-11-01";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Connection settings for the content analysis service.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

impl RemoteConfig {
    /// Load from the environment. Endpoint and key are required; the API
    /// version has a default.
    pub fn from_env() -> Result<RemoteConfig, DocrevError> {
        let endpoint = required_var(ENDPOINT_VAR)?;
        let api_key = required_var(API_KEY_VAR)?;
        let api_version = env::var(API_VERSION_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        Ok(RemoteConfig {
            endpoint,
            api_key,
            api_version,
        })
    }
}

fn required_var(name: &'static str) -> Result<String, DocrevError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(DocrevError::MissingConfig(name)),
    }
}

/// HTTP backend for the content analysis service.
///
/// The service's analyze operation is asynchronous on the wire: submitting
/// the binary returns an `Operation-Location` URL which is polled until the
/// operation reports `succeeded` or `failed`.
pub struct ContentApiAnalyzer {
    config: RemoteConfig,
    client: Client,
    poll_interval: Duration,
    max_polls: u32,
}

impl ContentApiAnalyzer {
    pub fn new(config: RemoteConfig) -> ContentApiAnalyzer {
        ContentApiAnalyzer {
            config,
            client: Client::new(),
            poll_interval: Duration::from_secs(2),
            max_polls: 120,
        }
    }

    fn analyze_url(&self, profile_id: &str) -> String {
        format!(
            "{}/analyzers/{}:analyze?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            profile_id,
            self.config.api_version
        )
    }

    fn submit(&self, profile_id: &str, document: &[u8]) -> Result<String, DocrevError> {
        let url = self.analyze_url(profile_id);
        debug!(profile_id, url = %url, bytes = document.len(), "submitting document");

        let response = self
            .client
            .post(&url)
            .header(KEY_HEADER, &self.config.api_key)
            .header("Content-Type", "application/pdf")
            .body(document.to_vec())
            .send()
            .map_err(|e| transport_error(profile_id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(profile_id, status, &response_text(response)));
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| DocrevError::RemoteCall {
                kind: RemoteFailureKind::Service,
                profile_id: profile_id.to_string(),
                message: "response carried no Operation-Location header".to_string(),
            })
    }

    fn poll(&self, profile_id: &str, operation_url: &str) -> Result<Value, DocrevError> {
        for attempt in 0..self.max_polls {
            let response = self
                .client
                .get(operation_url)
                .header(KEY_HEADER, &self.config.api_key)
                .send()
                .map_err(|e| transport_error(profile_id, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(status_error(profile_id, status, &response_text(response)));
            }

            let body: Value = response.json().map_err(|e| DocrevError::RemoteCall {
                kind: RemoteFailureKind::Service,
                profile_id: profile_id.to_string(),
                message: format!("operation response is not JSON: {e}"),
            })?;

            match body.get("status").and_then(Value::as_str) {
                Some(s) if s.eq_ignore_ascii_case("succeeded") => {
                    info!(profile_id, attempt, "analysis succeeded");
                    return Ok(body);
                }
                Some(s) if s.eq_ignore_ascii_case("failed") => {
                    let message = body
                        .get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(Value::as_str)
                        .unwrap_or("operation reported failure");
                    return Err(DocrevError::RemoteCall {
                        kind: RemoteFailureKind::Service,
                        profile_id: profile_id.to_string(),
                        message: message.to_string(),
                    });
                }
                _ => std::thread::sleep(self.poll_interval),
            }
        }

        Err(DocrevError::RemoteCall {
            kind: RemoteFailureKind::Service,
            profile_id: profile_id.to_string(),
            message: format!("operation did not complete after {} polls", self.max_polls),
        })
    }
}

impl DocumentAnalyzer for ContentApiAnalyzer {
    fn analyze(&self, profile_id: &str, document: &[u8]) -> Result<Value, DocrevError> {
        let operation_url = self.submit(profile_id, document)?;
        self.poll(profile_id, &operation_url)
    }

    fn backend_name(&self) -> &str {
        "content-api"
    }
}

/// Map an HTTP status onto the failure taxonomy.
pub fn failure_kind(status: StatusCode) -> RemoteFailureKind {
    match status {
        StatusCode::NOT_FOUND => RemoteFailureKind::UnknownProfile,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteFailureKind::Auth,
        s if s.is_client_error() => RemoteFailureKind::MalformedInput,
        _ => RemoteFailureKind::Service,
    }
}

fn status_error(profile_id: &str, status: StatusCode, body: &str) -> DocrevError {
    DocrevError::RemoteCall {
        kind: failure_kind(status),
        profile_id: profile_id.to_string(),
        message: format!("HTTP {status}: {body}"),
    }
}

fn transport_error(profile_id: &str, err: reqwest::Error) -> DocrevError {
    DocrevError::RemoteCall {
        kind: RemoteFailureKind::Service,
        profile_id: profile_id.to_string(),
        message: err.to_string(),
    }
}

fn response_text(response: reqwest::blocking::Response) -> String {
    response.text().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            failure_kind(StatusCode::NOT_FOUND),
            RemoteFailureKind::UnknownProfile
        );
        assert_eq!(failure_kind(StatusCode::UNAUTHORIZED), RemoteFailureKind::Auth);
        assert_eq!(failure_kind(StatusCode::FORBIDDEN), RemoteFailureKind::Auth);
        assert_eq!(
            failure_kind(StatusCode::BAD_REQUEST),
            RemoteFailureKind::MalformedInput
        );
        assert_eq!(
            failure_kind(StatusCode::INTERNAL_SERVER_ERROR),
            RemoteFailureKind::Service
        );
    }

    #[test]
    fn test_analyze_url_shape() {
        let analyzer = ContentApiAnalyzer::new(RemoteConfig {
            endpoint: "https://example.net/cu/".to_string(),
            api_key: "k".to_string(),
            api_version: "2025-11-01".to_string(),
        });
        assert_eq!(
            analyzer.analyze_url("analyzer_invoices"),
            "https://example.net/cu/analyzers/analyzer_invoices:analyze?api-version=2025-11-01"
        );
    }
}
