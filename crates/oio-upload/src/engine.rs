// Path: crates/oio-upload/src/engine.rs
//! `HttpUploadEngine`: the `UploadEngine` implementation.
//!
//! The reference design's "central buffer + per-destination cursor, single
//! event loop" model is realized here as a
//! `tokio::sync::broadcast`-fed byte stream: one producer task reads the
//! caller's `PayloadSource` exactly once and publishes each chunk; every
//! destination subscribes independently and drives its own `reqwest` PUT
//! from the resulting stream, so a slow destination cannot stall a fast one
//!.

use crate::metrics;
use async_trait::async_trait;
use bytes::Bytes;
use oio_api::upload::{
    Destination, PayloadSource, PutOutcome, UploadEngine, UploadReport, UploadTimeouts,
};
use oio_types::error::{ErrorCode, UploadError};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::warn;

/// Number of in-flight chunks the broadcast channel buffers before a slow
/// destination starts lagging.
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Default)]
pub struct HttpUploadEngine;

impl HttpUploadEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UploadEngine for HttpUploadEngine {
    async fn run(
        &self,
        mut source: Box<dyn PayloadSource>,
        destinations: Vec<Destination>,
        timeouts: UploadTimeouts,
    ) -> UploadReport {
        let content_length = source.content_length();

        let client = match reqwest::ClientBuilder::new()
        .connect_timeout(timeouts.connect)
        .build()
        {
            Ok(client) => client,
            Err(e) => {
                let outcomes = destinations
                .into_iter()
                .map(|d| failed_outcome(d, format!("client build failed: {e}")))
                .collect();
                return UploadReport {
                    outcomes,
                    source_md5: [0u8; 16],
                };
            }
        };

        let (tx, _unused_rx) = broadcast::channel::<Bytes>(BROADCAST_CAPACITY);
        let receivers: Vec<broadcast::Receiver<Bytes>> =
        destinations.iter().map(|_| tx.subscribe()).collect();

        let producer = tokio::spawn(async move {
                let mut ctx = md5::Context::new();
                loop {
                    match source.next_chunk().await {
                        Ok(Some(bytes)) => {
                            ctx.consume(&bytes);
                            let _ = tx.send(bytes);
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "payload source read failed, truncating upload");
                            break;
                        }
                    }
                }
                drop(tx);
                ctx.compute().0
            });

        let mut tasks = Vec::with_capacity(destinations.len());
        let mut identities = Vec::with_capacity(destinations.len());
        for (dest, rx) in destinations.into_iter().zip(receivers.into_iter()) {
            identities.push((dest.user_data.clone(), dest.url.clone()));
            let client = client.clone();
            let operation_timeout = timeouts.operation;
            tasks.push(tokio::spawn(run_one(
                        client,
                        dest,
                        rx,
                        content_length,
                        operation_timeout,
                    )));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (task, (user_data, url)) in tasks.into_iter().zip(identities.into_iter()) {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_err) => outcomes.push(PutOutcome {
                        user_data,
                        url,
                        http_code: None,
                        success: false,
                        headers_in: HashMap::new(),
                        error: Some(format!("upload task did not complete: {join_err}")),
                    }),
            }
        }

        let source_md5 = producer.await.unwrap_or([0u8; 16]);
        UploadReport {
            outcomes,
            source_md5,
        }
    }
}

fn failed_outcome(dest: Destination, error: String) -> PutOutcome {
    PutOutcome {
        user_data: dest.user_data,
        url: dest.url,
        http_code: None,
        success: false,
        headers_in: HashMap::new(),
        error: Some(error),
    }
}

fn classify_error(dest_url: &str, err: &reqwest::Error) -> UploadError {
    if err.is_timeout() {
        if err.is_connect() {
            UploadError::ConnectTimeout(dest_url.to_string())
        } else {
            UploadError::OperationTimeout(dest_url.to_string())
        }
    } else {
        UploadError::Transport(dest_url.to_string(), err.to_string())
    }
}

async fn run_one(
    client: reqwest::Client,
    dest: Destination,
    rx: broadcast::Receiver<Bytes>,
    content_length: u64,
    operation_timeout: Duration,
) -> PutOutcome {
    let stream = futures::stream::unfold(rx, |mut rx| async move {
            match rx.recv().await {
                Ok(bytes) => Some((Ok::<Bytes, std::io::Error>(bytes), rx)),
                Err(broadcast::error::RecvError::Closed) => None,
                Err(broadcast::error::RecvError::Lagged(n)) => Some((
                        Err(std::io::Error::other(format!(
                                    "destination fell behind the source by {n} chunks"
                                ))),
                        rx,
                    )),
            }
        });
    let body = reqwest::Body::wrap_stream(stream);

    let mut request = client
    .put(dest.url.as_str())
    .timeout(operation_timeout)
    .header(reqwest::header::CONTENT_LENGTH, content_length.to_string())
    .body(body);
    for (key, value) in &dest.headers_out {
        request = request.header(key.as_str(), value.as_str());
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let http_code = status.as_u16();
            let success = status.is_success();
            let headers_in = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
            metrics::record_destination(if success { "ok" } else { "http_error" });
            PutOutcome {
                user_data: dest.user_data,
                url: dest.url,
                http_code: Some(http_code),
                success,
                headers_in,
                error: if success {
                    None
                } else {
                    Some(format!("destination returned HTTP {http_code}"))
                },
            }
        }
        Err(e) => {
            let typed = classify_error(&dest.url, &e);
            metrics::record_destination(typed.code());
            PutOutcome {
                user_data: dest.user_data,
                url: dest.url,
                http_code: None,
                success: false,
                headers_in: HashMap::new(),
                error: Some(typed.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSource {
        chunks: Vec<Bytes>,
        index: usize,
        total_len: u64,
    }

    impl VecSource {
        fn new(data: &[u8], chunk_size: usize) -> Self {
            let chunks: Vec<Bytes> = data
            .chunks(chunk_size)
            .map(|c| Bytes::copy_from_slice(c))
            .collect();
            Self {
                total_len: data.len() as u64,
                chunks,
                index: 0,
            }
        }
    }

    #[async_trait]
    impl PayloadSource for VecSource {
        fn content_length(&self) -> u64 {
            self.total_len
        }

        async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
            if self.index >= self.chunks.len() {
                return Ok(None);
            }
            let chunk = self.chunks[self.index].clone();
            self.index += 1;
            Ok(Some(chunk))
        }
    }

    #[test]
    fn source_md5_matches_reference_digest() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let expected = md5::compute(data).0;
        let mut ctx = md5::Context::new();
        for chunk in data.chunks(7) {
            ctx.consume(chunk);
        }
        assert_eq!(ctx.compute().0, expected);
    }

    #[tokio::test]
    async fn run_attempts_every_destination_at_least_once() {
        let engine = HttpUploadEngine::new();
        let source = Box::new(VecSource::new(b"hello world", 4));
        let destinations = vec![
            Destination {
                url: "http://127.0.0.1:1/unreachable-a".to_string(),
                headers_out: HashMap::new(),
                user_data: "a".to_string(),
            },
            Destination {
                url: "http://127.0.0.1:1/unreachable-b".to_string(),
                headers_out: HashMap::new(),
                user_data: "b".to_string(),
            },
        ];
        let report = engine
        .run(
            source,
            destinations,
            UploadTimeouts {
                connect: Duration::from_millis(200),
                operation: Duration::from_millis(200),
            },
        )
        .await;
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failure_count(), 2, "nothing listens on port 1");
        assert_ne!(report.source_md5, [0u8; 16]);
    }
}
