use axum::{
    Json,
    extract::{Query, State},
};
use driveview_services::FileEntry;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::session::Session, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub files: Vec<FileEntry>,
    pub total: usize,
}

/// `GET /api/search` — unpaginated full-text search over the whole drive.
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Some(query) = params.query.filter(|q| !q.is_empty()) else {
        return Err(ApiError::BadRequest(
            "The search query must not be empty".to_string(),
        ));
    };

    let page = state
        .graph
        .search(&session.access_token, &query, None, None)
        .await?;

    let files: Vec<FileEntry> = page.value.into_iter().map(FileEntry::from).collect();

    Ok(Json(SearchResponse {
        total: files.len(),
        files,
    }))
}
