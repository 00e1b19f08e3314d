use std::time::Duration;

use futures::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::error::CoachError;
use super::sse::SseDecoder;

/// Ordered text deltas of one coach reply. Dropping it abandons the
/// reply without affecting anything else.
pub type DeltaStream = BoxStream<'static, Result<String, CoachError>>;

async fn next_chunk<S>(
    body: &mut S,
    idle_timeout: Option<Duration>,
) -> Result<Option<S::Item>, tokio::time::error::Elapsed>
where
    S: Stream + Unpin,
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, body.next()).await,
        None => Ok(body.next().await),
    }
}

/// Drive an [`SseDecoder`] over a chunked response body, yielding
/// each text delta as soon as it is complete.
///
/// The body is read until it ends even after `[DONE]`; anything that
/// arrives after the sentinel is discarded. A read error or idle
/// timeout before the first delta is yielded as an error. After that
/// it just ends the reply early, keeping what was received.
/// Cancelling `cancel` stops reading at the next chunk boundary.
pub fn assemble_deltas<S, B, E>(
    body: S,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut body = Box::pin(body);
        let mut decoder = SseDecoder::new();
        let mut emitted = 0usize;
        let mut failure: Option<CoachError> = None;
        let mut cancelled = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = next_chunk(&mut body, idle_timeout) => next,
            };

            match next {
                Ok(Some(Ok(chunk))) => {
                    for delta in decoder.feed(chunk.as_ref()) {
                        emitted += 1;
                        yield Ok(delta);
                    }
                }
                Ok(Some(Err(e))) => {
                    if emitted == 0 {
                        failure = Some(CoachError::Transport(e.to_string()));
                    } else {
                        tracing::warn!("Response body failed after {} deltas: {}", emitted, e);
                    }
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    let limit = idle_timeout.unwrap_or_default();
                    if emitted == 0 {
                        failure = Some(CoachError::IdleTimeout(limit));
                    } else {
                        tracing::warn!("No data for {:?} after {} deltas, ending reply", limit, emitted);
                    }
                    break;
                }
            }
        }

        if cancelled {
            tracing::debug!("Reply cancelled after {} deltas", emitted);
        } else if let Some(err) = failure {
            yield Err(err);
        } else {
            for delta in decoder.finish() {
                emitted += 1;
                yield Ok(delta);
            }
            if decoder.dropped_frames() > 0 {
                tracing::warn!("Dropped {} unparseable frames", decoder.dropped_frames());
            }
            tracing::debug!(
                "Reply stream finished with {} deltas (sentinel: {})",
                emitted,
                decoder.saw_sentinel()
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static str]) -> Vec<Result<&'static [u8], String>> {
        parts.iter().copied().map(|p| Ok(p.as_bytes())).collect()
    }

    async fn collect(deltas: DeltaStream) -> Vec<Result<String, CoachError>> {
        deltas.collect().await
    }

    #[tokio::test]
    async fn test_assembles_split_frames() {
        let body = stream::iter(chunks(&[
            "data: {\"choices\":[{\"delta\":",
            "{\"content\":\"Hi\"}}]}\n\n",
            ": keep-alive\n\ndata: {\"choices\":[{\"delta\":{\"content\":\" you\"}}]}\n\ndata: [DONE]\n\n",
        ]));
        let out = collect(assemble_deltas(body, CancellationToken::new(), None)).await;
        let text: String = out.into_iter().map(|d| d.unwrap()).collect();
        assert_eq!(text, "Hi you");
    }

    #[tokio::test]
    async fn test_ignores_bytes_after_sentinel() {
        let body = stream::iter(chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"end\"}}]}\n\ndata: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"extra\"}}]}\n\n",
        ]));
        let out = collect(assemble_deltas(body, CancellationToken::new(), None)).await;
        let text: String = out.into_iter().map(|d| d.unwrap()).collect();
        assert_eq!(text, "end");
    }

    #[tokio::test]
    async fn test_empty_body_yields_nothing() {
        let body = stream::iter(chunks(&[]));
        let out = collect(assemble_deltas(body, CancellationToken::new(), None)).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_error_before_any_delta_is_transport_failure() {
        let body = stream::iter(vec![
            Ok(b": ping\n\n".as_slice()),
            Err("connection reset".to_string()),
        ]);
        let out = collect(assemble_deltas(body, CancellationToken::new(), None)).await;
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], Err(CoachError::Transport(msg)) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_error_after_delta_keeps_content() {
        let body = stream::iter(vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n".as_slice()),
            Err("connection reset".to_string()),
        ]);
        let out = collect(assemble_deltas(body, CancellationToken::new(), None)).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), "partial");
    }

    #[tokio::test]
    async fn test_cancelled_before_start_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let body = stream::iter(chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n",
        ]));
        let out = collect(assemble_deltas(body, cancel, None)).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_between_chunks() {
        let cancel = CancellationToken::new();
        let body = stream::iter(chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"one\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"two\"}}]}\n\n",
        ]));
        let mut deltas = assemble_deltas(body, cancel.clone(), None);

        assert_eq!(deltas.next().await.unwrap().unwrap(), "one");
        cancel.cancel();
        assert!(deltas.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_before_first_delta() {
        let body = stream::pending::<Result<&'static [u8], String>>();
        let out = collect(assemble_deltas(
            body,
            CancellationToken::new(),
            Some(Duration::from_secs(5)),
        ))
        .await;
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(CoachError::IdleTimeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_after_delta_ends_reply() {
        let body = stream::iter(chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"so far\"}}]}\n\n",
        ]))
        .chain(stream::pending());
        let out = collect(assemble_deltas(
            body,
            CancellationToken::new(),
            Some(Duration::from_secs(5)),
        ))
        .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), "so far");
    }
}
