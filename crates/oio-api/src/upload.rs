// Path: crates/oio-api/src/upload.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// One destination to stream the payload to.
#[derive(Debug, Clone)]
pub struct Destination {
    pub url: String,
    pub headers_out: HashMap<String, String>,
    /// Opaque caller-supplied correlation id, threaded back in `PutOutcome`
    ///.
    pub user_data: String,
}

/// Per-destination outcome after `run()` returns.
#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub user_data: String,
    pub url: String,
    pub http_code: Option<u16>,
    pub success: bool,
    pub headers_in: HashMap<String, String>,
    pub error: Option<String>,
}

/// Tunables for one `run()` call.
#[derive(Debug, Clone, Copy)]
pub struct UploadTimeouts {
    pub connect: Duration,
    pub operation: Duration,
}

/// Aggregate result of one `run()` call.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub outcomes: Vec<PutOutcome>,
    /// MD5 computed once over the source bytes.
    pub source_md5: [u8; 16],
}

impl UploadReport {
    /// `get_failure_number() == 0` implies all destinations succeeded
    ///.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.len() - self.failure_count()
    }

    pub fn source_md5_hex(&self) -> String {
        hex::encode(self.source_md5)
    }
}

/// A pull-based source of payload bytes, read exactly once and fanned out
/// to every destination.
#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// Total length of the payload, known up-front.
    fn content_length(&self) -> u64;

    /// Reads the next chunk, or `Ok(None)` at end of stream.
    async fn next_chunk(&mut self) -> std::io::Result<Option<bytes::Bytes>>;
}

/// The parallel HTTP upload engine contract.
#[async_trait]
pub trait UploadEngine: Send + Sync {
    async fn run(
        &self,
        source: Box<dyn PayloadSource>,
        destinations: Vec<Destination>,
        timeouts: UploadTimeouts,
    ) -> UploadReport;
}
