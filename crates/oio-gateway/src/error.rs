// Path: crates/oio-gateway/src/error.rs
//! Uniform REST error body and category→HTTP-status mapping. This is the only layer in the workspace that turns a
//! subsystem's `ErrorCode` into an HTTP status; everywhere else the
//! category code is carried unchanged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oio_types::error::{
    ConscienceError, ContainerError, DirectoryError, ErrorCode, LayoutError, OioError, UploadError,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
}

pub struct AppError(pub OioError);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(OioError::BadRequest(msg.into()))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self(OioError::Internal(msg.into()))
    }

    fn status(&self) -> StatusCode {
        match &self.0 {
            OioError::Container(ContainerError::ContainerNotFound)
            | OioError::Container(ContainerError::ContentNotFound)
            | OioError::Directory(DirectoryError::NotFound) => StatusCode::NOT_FOUND,
            OioError::Container(ContainerError::ContentExists) => StatusCode::CONFLICT,
            OioError::Container(ContainerError::PolicyNotSatisfiable(_))
            | OioError::Container(ContainerError::PolicyNotSupported(_))
            | OioError::Layout(LayoutError::PolicyNotSatisfiable(_))
            | OioError::Layout(LayoutError::NamespaceImpossible(_)) => StatusCode::FORBIDDEN,
            OioError::Container(ContainerError::BadRequest(_))
            | OioError::BadRequest(_) => StatusCode::BAD_REQUEST,
            OioError::Container(ContainerError::NotAllowed(_)) => StatusCode::FORBIDDEN,
            OioError::Directory(DirectoryError::Redirect(_)) => StatusCode::TEMPORARY_REDIRECT,
            OioError::Directory(DirectoryError::LoopRedirect(_))
            | OioError::Directory(DirectoryError::TooManyRedirect(_)) => StatusCode::BAD_GATEWAY,
            OioError::Directory(DirectoryError::ReadTimeout)
            | OioError::Upload(UploadError::ConnectTimeout(_))
            | OioError::Upload(UploadError::OperationTimeout(_))
            | OioError::Upload(UploadError::Transport(_, _)) => StatusCode::SERVICE_UNAVAILABLE,
            OioError::Upload(UploadError::HttpStatus(_, _)) => StatusCode::BAD_GATEWAY,
            OioError::Upload(UploadError::SourceRead(_)) => StatusCode::BAD_REQUEST,
            OioError::Conscience(ConscienceError::UnknownType(_))
            | OioError::Conscience(ConscienceError::ServiceNotFound(_)) => StatusCode::NOT_FOUND,
            OioError::Conscience(ConscienceError::InvalidExpression(_))
            | OioError::Conscience(ConscienceError::LockOutOfRange(_)) => StatusCode::BAD_REQUEST,
            OioError::Layout(LayoutError::PlatformError) => StatusCode::SERVICE_UNAVAILABLE,
            OioError::Container(ContainerError::Backend(_))
            | OioError::Directory(DirectoryError::Backend(_))
            | OioError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for AppError
where
E: Into<OioError>,
{
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(code = self.0.code(), status = status.as_u16(), "{}", self.0);
        let body = ErrorBody {
            status: status.as_u16(),
            message: format!("{}: {}", self.0.code(), self.0),
        };
        (status, Json(body)).into_response()
    }
}
