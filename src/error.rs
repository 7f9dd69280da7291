//! Error types for the status API and the chat gateway.

use thiserror::Error;

/// Message posted when the status API rate-limits us.
pub const RATE_LIMITED_MESSAGE: &str =
    "Error: Request failed with status code 429 (Too many requests), try again in 5 minutes";

/// Message posted for every other fetch failure.
pub const GENERIC_FETCH_MESSAGE: &str =
    "An error occurred while fetching war status. Please try again later.";

/// Failure talking to the war status API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 429 Too Many Requests.
    #[error("request failed with status code 429 (too many requests)")]
    RateLimited,

    /// Any other non-success HTTP status.
    #[error("request failed with status code {0}")]
    Status(u16),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Every listed campaign failed to fetch.
    #[error("all {0} campaign status requests failed")]
    AllCampaignsFailed(usize),
}

impl FetchError {
    /// Classify an HTTP status code. Returns `None` for success codes.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            429 => Some(FetchError::RateLimited),
            other => Some(FetchError::Status(other)),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }

    /// The short human-readable message posted to the channel.
    pub fn user_message(&self) -> &'static str {
        if self.is_rate_limited() {
            RATE_LIMITED_MESSAGE
        } else {
            GENERIC_FETCH_MESSAGE
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            if let Some(err) = FetchError::from_status(status.as_u16()) {
                return err;
            }
        }
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else if e.is_timeout() {
            FetchError::Network(format!("request timed out: {}", e))
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Failure talking to Discord.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("discord http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("discord api error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid gateway payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("gateway protocol error: {0}")]
    Protocol(String),

    #[error("gateway session rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(FetchError::from_status(200).is_none());
        assert!(FetchError::from_status(204).is_none());
        assert!(matches!(
            FetchError::from_status(429),
            Some(FetchError::RateLimited)
        ));
        assert!(matches!(
            FetchError::from_status(503),
            Some(FetchError::Status(503))
        ));
    }

    #[test]
    fn test_user_message() {
        assert_eq!(FetchError::RateLimited.user_message(), RATE_LIMITED_MESSAGE);
        assert_eq!(
            FetchError::Status(500).user_message(),
            GENERIC_FETCH_MESSAGE
        );
        assert_eq!(
            FetchError::Network("boom".to_string()).user_message(),
            GENERIC_FETCH_MESSAGE
        );
        assert_eq!(
            FetchError::AllCampaignsFailed(2).user_message(),
            GENERIC_FETCH_MESSAGE
        );
    }
}
