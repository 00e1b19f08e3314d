use std::time::Duration;

use futures::stream;
use tokio_util::sync::CancellationToken;

use super::error::CoachError;
use super::models::CoachRequest;
use super::stream::{DeltaStream, assemble_deltas};
use crate::core::AppConfig;

/// Client for the streaming coach endpoint.
#[derive(Clone, Debug)]
pub struct CoachClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    request_timeout: Duration,
    idle_timeout: Option<Duration>,
}

impl CoachClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.coach_url(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
            idle_timeout: config.idle_timeout,
        }
    }

    /// Send one chat turn and return the reply as a stream of text
    /// deltas.
    ///
    /// Failing to reach the endpoint or a non-success status is
    /// returned as an error before any delta. A fresh call is needed
    /// for every turn. Cancelling `cancel` while the request is in
    /// flight returns an empty stream.
    pub async fn consume(
        &self,
        request: &CoachRequest,
        cancel: CancellationToken,
    ) -> Result<DeltaStream, CoachError> {
        tracing::debug!("Sending coach request to {}", self.url);

        let send = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.request_timeout)
            .json(request)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Coach request cancelled before a response");
                return Ok(Box::pin(stream::empty::<Result<String, CoachError>>()));
            }
            response = send => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = CoachError::from_status(status.as_u16(), &body);
            tracing::error!("Coach request failed with {}: {}", status, body);
            return Err(err);
        }

        Ok(assemble_deltas(
            response.bytes_stream(),
            cancel,
            self.idle_timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn test_config(url: &str) -> AppConfig {
        AppConfig {
            functions_url: url.to_string(),
            api_key: "test-key".to_string(),
            request_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(5)),
            history_window: 5,
        }
    }

    async fn reply_text(deltas: DeltaStream) -> String {
        deltas
            .map(|d| d.expect("Unexpected stream error"))
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    #[tokio::test]
    async fn test_consume_streams_reply() {
        let mut server = mockito::Server::new_async().await;

        let sse_response = r#"data: {"id":"chunk1","choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"},"finish_reason":null}]}

data: {"id":"chunk2","choices":[{"index":0,"delta":{"content":"lo"},"finish_reason":null}]}

data: {"id":"chunk3","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}

data: [DONE]

"#;

        let mock = server
            .mock("POST", "/fitness-coach")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "message": "Say hello"
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_response)
            .create_async()
            .await;

        let client = CoachClient::new(&test_config(&server.url()));
        let deltas = client
            .consume(&CoachRequest::new("Say hello"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply_text(deltas).await, "Hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_consume_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/fitness-coach")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Rate limit exceeded. Please try again in a moment."}"#)
            .create_async()
            .await;

        let client = CoachClient::new(&test_config(&server.url()));
        let result = client
            .consume(&CoachRequest::new("hi"), CancellationToken::new())
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(CoachError::RateLimited)));
    }

    #[tokio::test]
    async fn test_consume_quota_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/fitness-coach")
            .with_status(402)
            .create_async()
            .await;

        let client = CoachClient::new(&test_config(&server.url()));
        let result = client
            .consume(&CoachRequest::new("hi"), CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CoachError::QuotaExhausted)));
    }

    #[tokio::test]
    async fn test_consume_connection_refused() {
        // Nothing listens on port 1
        let client = CoachClient::new(&test_config("http://127.0.0.1:1"));
        let result = client
            .consume(&CoachRequest::new("hi"), CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CoachError::Transport(_))));
    }
}
