use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use pragma_engine::EngineError;
use pragma_ketchup::KetchupError;
use pragma_types::TypeError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown collection with name {0}")]
    UnknownCollection(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] KetchupError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownCollection(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Type(TypeError::UnsupportedMediaType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Type(TypeError::InvalidIdentity(_)) => StatusCode::BAD_REQUEST,
            Self::Type(TypeError::InvalidCollectionName(_)) => StatusCode::BAD_REQUEST,
            Self::Engine(EngineError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Engine(EngineError::RevisionConflict { .. }) => StatusCode::CONFLICT,
            Self::Engine(EngineError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Engine(EngineError::RevisionGap { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Snapshot(KetchupError::UnencodableName(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            status: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
