use std::time::Duration;

use serde_json::Value;

/// Shown when the coach could not produce any reply.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment. 💪";

pub const RATE_LIMITED_NOTICE: &str =
    "Whoa, slow down! Too many messages at once. Please wait a moment and try again.";

pub const QUOTA_EXHAUSTED_NOTICE: &str =
    "Your AI coach is out of credits. Please add credits to keep chatting.";

const GENERIC_FAILURE_NOTICE: &str = "Something went wrong talking to your coach.";

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("rate limited")]
    RateLimited,

    #[error("quota exhausted")]
    QuotaExhausted,

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CoachError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl CoachError {
    /// Classify a non-success response. The body is expected to be
    /// `{"error": "..."}` but anything else is tolerated.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::QuotaExhausted,
            _ => {
                let message = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| {
                        v["error"]
                            .as_str()
                            .or_else(|| v["error"]["message"].as_str())
                            .map(str::to_string)
                    })
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE_NOTICE.to_string());
                Self::Server { status, message }
            }
        }
    }

    /// Rate limiting, quota and server messages get their own notice.
    /// Everything else means the turn produced nothing and the caller
    /// should show [`FALLBACK_REPLY`].
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::QuotaExhausted | Self::Server { .. }
        )
    }

    /// Text suitable for showing to the user.
    pub fn user_notice(&self) -> &str {
        match self {
            Self::RateLimited => RATE_LIMITED_NOTICE,
            Self::QuotaExhausted => QUOTA_EXHAUSTED_NOTICE,
            Self::Server { message, .. } => message,
            Self::InvalidRequest(message) | Self::InvalidResponse(message) => message,
            Self::Transport(_) | Self::IdleTimeout(_) => FALLBACK_REPLY,
        }
    }
}
