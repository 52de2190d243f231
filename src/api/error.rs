//! Mapping from handler failures to the fixed status codes and JSON envelopes
//! the UI expects. Failure detail is logged here and never sent to the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use super::models::{
    ENQUEUE_FAILED, ErrorResponse, MISSING_DOWNLOAD_URL, MISSING_QUERY, MessageResponse,
    SEARCH_FAILED,
};
use crate::enqueue::EnqueueError;
use crate::search::SearchError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing search query")]
    MissingQuery,

    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("missing download url")]
    MissingDownloadUrl,

    #[error("enqueue failed: {0}")]
    Enqueue(#[from] EnqueueError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingQuery | ApiError::MissingDownloadUrl => StatusCode::BAD_REQUEST,
            ApiError::Search(_) | ApiError::Enqueue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::MissingQuery => error_body(status, MISSING_QUERY),
            ApiError::MissingDownloadUrl => message_body(status, MISSING_DOWNLOAD_URL),
            ApiError::Search(e) => {
                error!("error fetching from indexer: {:#}", e);
                error_body(status, SEARCH_FAILED)
            }
            ApiError::Enqueue(e) => {
                error!("error executing sabcmd: {:#}", e);
                message_body(status, ENQUEUE_FAILED)
            }
        }
    }
}

fn error_body(status: StatusCode, error: &str) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
    };
    (status, Json(body)).into_response()
}

fn message_body(status: StatusCode, message: &str) -> Response {
    (status, Json(MessageResponse::new(message))).into_response()
}
