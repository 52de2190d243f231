use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::enqueue::Enqueuer;
use crate::search::SearchClient;

use super::error::ApiError;
use super::models::{ENQUEUED, MessageResponse, SaveRequest};

pub async fn health_handler() -> &'static str {
    "OK"
}

/// `GET /api/search?q=...`: relay the indexer's JSON for `q`.
///
/// Only the first `q` counts when the parameter is repeated.
pub async fn search_handler(
    State(search_client): State<Arc<SearchClient>>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let query = params
        .ok()
        .and_then(|Query(params)| params.into_iter().find(|(key, _)| key == "q"))
        .map(|(_, value)| value)
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingQuery)?;

    let body = search_client.search(&query).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// `POST /api/save` with `{ "downloadUrl": ... }`: queue the NZB in SABnzbd.
///
/// The body is parsed by hand so a missing content type or malformed JSON
/// is reported the same way as a missing field.
pub async fn save_handler(
    State(enqueuer): State<Arc<Enqueuer>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let download_url = serde_json::from_slice::<SaveRequest>(&body)
        .ok()
        .and_then(|req| req.download_url)
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::MissingDownloadUrl)?;

    enqueuer.enqueue(&download_url).await?;

    Ok(Json(MessageResponse::new(ENQUEUED)))
}
