// Path: crates/oio-types/src/error/mod.rs
//! Unified error taxonomy for the control plane.
//!
//! Every subsystem defines its own `thiserror` enum; each variant carries a
//! stable, machine-readable code via the `ErrorCode` trait, independent of
//! its human-readable `Display` message. The gateway is the *only* place
//! that maps a category to an HTTP status.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the Conscience service registry.
#[derive(Debug, Error)]
pub enum ConscienceError {
    #[error("service type {0:?} is unknown")]
    UnknownType(String),
    #[error("service {0:?} not found")]
    ServiceNotFound(String),
    #[error("invalid score expression: {0}")]
    InvalidExpression(String),
    #[error("lock value {0} out of range [0, 100]")]
    LockOutOfRange(i32),
}

impl ErrorCode for ConscienceError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "CONSCIENCE_UNKNOWN_TYPE",
            Self::ServiceNotFound(_) => "CONSCIENCE_SERVICE_NOT_FOUND",
            Self::InvalidExpression(_) => "CONSCIENCE_INVALID_EXPRESSION",
            Self::LockOutOfRange(_) => "CONSCIENCE_LOCK_OUT_OF_RANGE",
        }
    }
}

/// Errors raised by the directory resolver.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no META1 host set known for this URL")]
    NotFound,
    #[error("upstream RPC timed out")]
    ReadTimeout,
    #[error("upstream RPC redirected to {0}")]
    Redirect(String),
    #[error("redirect loop detected at {0}")]
    LoopRedirect(String),
    #[error("too many redirects ({0})")]
    TooManyRedirect(u32),
    #[error("directory backend error: {0}")]
    Backend(String),
}

impl ErrorCode for DirectoryError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "DIRECTORY_NOT_FOUND",
            Self::ReadTimeout => "READ_TIMEOUT",
            Self::Redirect(_) => "REDIRECT",
            Self::LoopRedirect(_) => "LOOP_REDIRECT",
            Self::TooManyRedirect(_) => "TOOMANY_REDIRECT",
            Self::Backend(_) => "DIRECTORY_BACKEND_ERROR",
        }
    }
}

/// Errors raised by the META2 container engine.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container not found")]
    ContainerNotFound,
    #[error("content not found")]
    ContentNotFound,
    #[error("an alias already exists at this path and versioning is disabled")]
    ContentExists,
    #[error("storage policy cannot be satisfied: {0}")]
    PolicyNotSatisfiable(String),
    #[error("storage policy is not supported: {0}")]
    PolicyNotSupported(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("operation not allowed: {0}")]
    NotAllowed(String),
    #[error("sqlite backend error: {0}")]
    Backend(String),
}

impl ErrorCode for ContainerError {
    fn code(&self) -> &'static str {
        match self {
            Self::ContainerNotFound => "CONTAINER_NOTFOUND",
            Self::ContentNotFound => "CONTENT_NOTFOUND",
            Self::ContentExists => "CONTENT_EXISTS",
            Self::PolicyNotSatisfiable(_) => "POLICY_NOT_SATISFIABLE",
            Self::PolicyNotSupported(_) => "POLICY_NOT_SUPPORTED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotAllowed(_) => "NOT_ALLOWED",
            Self::Backend(_) => "INTERNAL_ERROR",
        }
    }
}

/// Errors raised by the chunk layout generator.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no RAWX service available for the first chunk position")]
    PlatformError,
    #[error("storage policy could not be satisfied after position {0}")]
    PolicyNotSatisfiable(u32),
    #[error("namespace cannot satisfy the requested policy: {0}")]
    NamespaceImpossible(String),
}

impl ErrorCode for LayoutError {
    fn code(&self) -> &'static str {
        match self {
            Self::PlatformError => "PLATFORM_ERROR",
            Self::PolicyNotSatisfiable(_) => "POLICY_NOT_SATISFIABLE",
            Self::NamespaceImpossible(_) => "NSIMPOSSIBLE",
        }
    }
}

/// Errors raised by the parallel HTTP upload engine.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("connect timed out for destination {0}")]
    ConnectTimeout(String),
    #[error("operation timed out for destination {0}")]
    OperationTimeout(String),
    #[error("destination {0} returned HTTP {1}")]
    HttpStatus(String, u16),
    #[error("transport error for destination {0}: {1}")]
    Transport(String, String),
    #[error("source read failed: {0}")]
    SourceRead(String),
}

impl ErrorCode for UploadError {
    fn code(&self) -> &'static str {
        match self {
            Self::ConnectTimeout(_) => "UPLOAD_CONNECT_TIMEOUT",
            Self::OperationTimeout(_) => "UPLOAD_OPERATION_TIMEOUT",
            Self::HttpStatus(_, _) => "UPLOAD_HTTP_ERROR",
            Self::Transport(_, _) => "UPLOAD_TRANSPORT_ERROR",
            Self::SourceRead(_) => "UPLOAD_SOURCE_READ_ERROR",
        }
    }
}

/// The top-level error enum the gateway converts to a REST error body
///.
#[derive(Debug, Error)]
pub enum OioError {
    #[error(transparent)]
    Conscience(#[from] ConscienceError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for OioError {
    fn code(&self) -> &'static str {
        match self {
            Self::Conscience(e) => e.code(),
            Self::Directory(e) => e.code(),
            Self::Container(e) => e.code(),
            Self::Layout(e) => e.code(),
            Self::Upload(e) => e.code(),
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type OioResult<T> = Result<T, OioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_not_found_maps_to_stable_code() {
        let e: OioError = ContainerError::ContainerNotFound.into();
        assert_eq!(e.code(), "CONTAINER_NOTFOUND");
    }

    #[test]
    fn upload_http_error_carries_status_in_message_not_code() {
        let e: OioError = UploadError::HttpStatus("http://rawx1/abc".into(), 500).into();
        assert_eq!(e.code(), "UPLOAD_HTTP_ERROR");
        assert!(e.to_string().contains("500"));
    }
}
