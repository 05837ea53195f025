use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use snafu::prelude::*;
use tracing::*;

use crate::error::GlyphError;

/// Whether a failure is the caller's fault or the detector's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Inference,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("No image uploaded"))]
    MissingImage,
    #[snafu(display("Read multipart body error: {}", source))]
    Multipart { source: MultipartError },
    #[snafu(display("Decode image error: {}", source))]
    Decode { source: image::ImageError },
    #[snafu(display("Detection error: {}", source))]
    Detection { source: GlyphError },
    #[snafu(display("Detection worker error: {}", source))]
    Worker { source: tokio::task::JoinError },
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::MissingImage | ApiError::Multipart { .. } | ApiError::Decode { .. } => {
                ErrorKind::Input
            }
            ApiError::Detection { .. } | ApiError::Worker { .. } => ErrorKind::Inference,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage | ApiError::Decode { .. } => StatusCode::BAD_REQUEST,
            ApiError::Multipart { source } => source.status(),
            ApiError::Detection { .. } | ApiError::Worker { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the caller. Detector internals never leave the process.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::MissingImage => "No image uploaded",
            ApiError::Multipart { source } if source.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "Upload too large"
            }
            ApiError::Multipart { .. } => "Malformed multipart request",
            ApiError::Decode { .. } => "Invalid image",
            ApiError::Detection { .. } | ApiError::Worker { .. } => "Inference failed",
        }
    }

    pub fn log(&self) {
        match self.kind() {
            ErrorKind::Input => warn!(error = %self, "Rejected detection request"),
            ErrorKind::Inference => error!(error = %self, "Detection failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message(),
        };

        (self.status(), Json(body)).into_response()
    }
}
