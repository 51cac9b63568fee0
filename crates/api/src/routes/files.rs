use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::Response,
};
use driveview_services::{FileEntry, FileListing, PreviewKind, bundle, preview};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{error::ApiError, extractors::session::Session, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub search: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_items_per_page", rename = "itemsPerPage")]
    pub items_per_page: u32,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_page() -> u32 {
    1
}

fn default_items_per_page() -> u32 {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetailResponse {
    #[serde(flatten)]
    pub entry: FileEntry,
    pub preview: PreviewKind,
    pub type_label: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadMultipleRequest {
    #[serde(rename = "fileIds")]
    pub file_ids: Vec<String>,
}

/// `GET /api/files` — one listing window, driven by the gateway's cursor
/// cache. A non-empty `search` overrides `path`.
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileListing>, ApiError> {
    let listing = state
        .listings
        .list(
            &session.access_token,
            &query.path,
            &query.search,
            query.page,
            query.items_per_page,
        )
        .await?;

    Ok(Json(listing))
}

/// `GET /api/files/{id}` — item metadata, preview classification, and a
/// best-effort thumbnail.
pub async fn get(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<FileDetailResponse>, ApiError> {
    let item = state.graph.get_item(&session.access_token, &id).await?;
    let mut entry = FileEntry::from(item);
    entry.embed_url = entry.view_url.clone();

    if !entry.is_folder {
        // Thumbnail lookup failures never fail the detail call.
        match state.graph.thumbnail_url(&session.access_token, &id).await {
            Ok(thumbnail) => entry.thumbnail_url = thumbnail,
            Err(e) => warn!("thumbnail fetch failed (non-critical): {e}"),
        }
    }

    let preview = preview::classify(&entry.name, &entry.mime_type);
    let type_label = preview::describe_file_type(&entry.name);

    Ok(Json(FileDetailResponse {
        entry,
        preview,
        type_label,
    }))
}

/// `GET /api/files/{id}/content` — raw bytes for previews, fetched
/// through the item's pre-authenticated download URL.
pub async fn content(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let item = state.graph.get_item(&session.access_token, &id).await?;

    let Some(download_url) = item.download_url.as_deref() else {
        return Err(ApiError::NotFound(
            "The file has no downloadable content".to_string(),
        ));
    };

    let (bytes, content_type) = state.graph.download(download_url).await?;
    let content_type = content_type
        .or_else(|| item.file.as_ref().and_then(|f| f.mime_type.clone()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap())
}

/// `POST /api/files/download-multiple` — bundles the requested files into
/// a single ZIP stream. Entries without downloadable content are skipped.
pub async fn download_multiple(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<DownloadMultipleRequest>,
) -> Result<Response, ApiError> {
    if body.file_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide a non-empty list of file ids".to_string(),
        ));
    }

    let mut entries = Vec::with_capacity(body.file_ids.len());
    for id in &body.file_ids {
        let item = state.graph.get_item(&session.access_token, id).await?;
        let Some(download_url) = item.download_url.as_deref() else {
            debug!(%id, "skipping entry without a download URL");
            continue;
        };
        let (bytes, _) = state.graph.download(download_url).await?;
        entries.push((item.name, bytes));
    }

    let archive = bundle::write_zip(&entries)
        .map_err(|e| ApiError::Internal(format!("Failed to build the archive: {e}")))?;

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"drive-files.zip\"",
        )
        .body(Body::from(archive))
        .unwrap())
}
