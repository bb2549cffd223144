//! Transport abstraction over the room and game-state endpoints.
//!
//! The trait seam lets tests drive the sync manager with a scripted
//! in-memory transport; production uses [`HttpTransport`] over reqwest.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use domain::models::game_state::{GameStateResponse, TransitionRequest};
use domain::models::room::RoomDetail;
use domain::models::GameId;

/// Request timeout for a single poll or transition call.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors crossing the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server rejected the write because the version moved on.
    #[error("Version conflict")]
    Conflict,

    /// Room or state does not exist (or has expired, indistinguishably).
    #[error("Not found")]
    NotFound,

    /// A structured API error other than conflict/not-found.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// Network-level failure; counts toward the disconnect threshold.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl TransportError {
    /// Transient failures feed the connectivity classifier; the rest are
    /// definitive answers from the server.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Http(_) => true,
            TransportError::Api { code, .. } => {
                code == "service_unavailable" || code == "internal_error"
            }
            TransportError::Conflict | TransportError::NotFound => false,
        }
    }
}

/// The three calls the sync manager needs.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    async fn fetch_room(&self, slug: &str) -> Result<RoomDetail, TransportError>;

    async fn fetch_state(
        &self,
        slug: &str,
        game_id: &GameId,
    ) -> Result<GameStateResponse, TransportError>;

    async fn submit_transition(
        &self,
        slug: &str,
        game_id: &GameId,
        request: &TransitionRequest,
    ) -> Result<GameStateResponse, TransportError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    message: String,
}

/// HTTP implementation over the backend's REST surface.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn decode_error(response: reqwest::Response) -> TransportError {
        let status = response.status();
        match response.json::<ApiErrorBody>().await {
            Ok(body) if body.error == "version_conflict" => TransportError::Conflict,
            Ok(body) if body.error == "not_found" => TransportError::NotFound,
            Ok(body) => TransportError::Api {
                code: body.error,
                message: body.message,
            },
            Err(_) => TransportError::Api {
                code: if status.is_server_error() {
                    "service_unavailable".into()
                } else {
                    status.as_str().to_string()
                },
                message: format!("Unexpected response status {}", status),
            },
        }
    }
}

#[async_trait]
impl RoomTransport for HttpTransport {
    async fn fetch_room(&self, slug: &str) -> Result<RoomDetail, TransportError> {
        let url = format!("{}/api/v1/rooms/{}", self.base_url, slug);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn fetch_state(
        &self,
        slug: &str,
        game_id: &GameId,
    ) -> Result<GameStateResponse, TransportError> {
        let url = format!(
            "{}/api/v1/rooms/{}/state/{}",
            self.base_url, slug, game_id
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn submit_transition(
        &self,
        slug: &str,
        game_id: &GameId,
        request: &TransitionRequest,
    ) -> Result<GameStateResponse, TransportError> {
        let url = format!(
            "{}/api/v1/rooms/{}/state/{}",
            self.base_url, slug, game_id
        );
        let response = self.client.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(!TransportError::Conflict.is_transient());
        assert!(!TransportError::NotFound.is_transient());
        assert!(TransportError::Api {
            code: "service_unavailable".into(),
            message: "later".into()
        }
        .is_transient());
        assert!(!TransportError::Api {
            code: "room_full".into(),
            message: "full".into()
        }
        .is_transient());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://localhost:8080/");
        assert_eq!(transport.base_url, "http://localhost:8080");
    }
}
