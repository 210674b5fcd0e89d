//! Model preflight: ask the Ollama server which models are installed.
//!
//! A missing model only surfaces as an error on the first caption request,
//! after the whole document has been extracted. Listing `/api/tags` up front
//! lets the run warn immediately with the `ollama pull` command that fixes it.
//! The check never fails the run: an unreachable server or an odd response
//! is logged and captioning proceeds.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    model: String,
}

impl TagEntry {
    fn id(&self) -> &str {
        if self.name.is_empty() {
            &self.model
        } else {
            &self.name
        }
    }
}

/// Outcome of a preflight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightStatus {
    /// The configured model is installed.
    Available,
    /// The server answered but does not list the model.
    Missing { installed: Vec<String> },
    /// The server could not be queried.
    Unreachable { reason: String },
}

/// `true` when an installed tag satisfies the requested model.
///
/// `bakllava` matches `bakllava:latest`; `llava:13b` only matches itself.
pub fn model_matches(requested: &str, installed: &str) -> bool {
    installed == requested || installed.starts_with(&format!("{requested}:"))
}

/// Query `{host}/api/tags` and report whether `model` is installed.
pub async fn check_model(host: &str, model: &str) -> PreflightStatus {
    let url = format!("{}/api/tags", host.trim_end_matches('/'));
    debug!("Preflight: GET {}", url);

    let client = match Client::builder().timeout(Duration::from_secs(10)).build() {
        Ok(c) => c,
        Err(e) => {
            return PreflightStatus::Unreachable {
                reason: e.to_string(),
            }
        }
    };

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            return PreflightStatus::Unreachable {
                reason: e.to_string(),
            }
        }
    };

    if !response.status().is_success() {
        return PreflightStatus::Unreachable {
            reason: format!("HTTP {}", response.status()),
        };
    }

    match response.json::<TagsResponse>().await {
        Ok(tags) => status_from_tags(model, tags),
        Err(e) => PreflightStatus::Unreachable {
            reason: format!("unexpected /api/tags response: {e}"),
        },
    }
}

fn status_from_tags(model: &str, tags: TagsResponse) -> PreflightStatus {
    let installed: Vec<String> = tags.models.iter().map(|m| m.id().to_string()).collect();
    if installed.iter().any(|name| model_matches(model, name)) {
        PreflightStatus::Available
    } else {
        PreflightStatus::Missing { installed }
    }
}

/// Run the check and log the outcome.
pub async fn warn_if_model_missing(host: &str, model: &str) -> PreflightStatus {
    let status = check_model(host, model).await;
    match &status {
        PreflightStatus::Available => info!("Model '{}' is available on {}", model, host),
        PreflightStatus::Missing { installed } => warn!(
            "Model '{}' is not installed on {} (available: {:?}). Install it with: ollama pull {}",
            model, host, installed, model
        ),
        PreflightStatus::Unreachable { reason } => {
            warn!("Could not list models on {}: {}", host, reason)
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_matches_latest_tag() {
        assert!(model_matches("bakllava", "bakllava:latest"));
        assert!(model_matches("bakllava", "bakllava"));
        assert!(!model_matches("llava", "bakllava:latest"));
        assert!(!model_matches("llava:13b", "llava:7b"));
    }

    #[test]
    fn tags_response_parsing() {
        let body = r#"{"models":[{"name":"bakllava:latest","model":"bakllava:latest","size":4733363377},{"model":"llama3:8b"}]}"#;
        let tags: TagsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(status_from_tags("bakllava", tags), PreflightStatus::Available);

        let tags: TagsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            status_from_tags("llava", tags),
            PreflightStatus::Missing {
                installed: vec!["bakllava:latest".into(), "llama3:8b".into()]
            }
        );
    }

    #[test]
    fn empty_tags_response() {
        let tags: TagsResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(
            status_from_tags("bakllava", tags),
            PreflightStatus::Missing { installed: vec![] }
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_not_fatal() {
        let status = check_model("http://127.0.0.1:1", "bakllava").await;
        assert!(matches!(status, PreflightStatus::Unreachable { .. }));
    }
}
