use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;

use pragma_engine::{EngineRegistry, StorageEngine};
use pragma_types::{Collection, Document, DocumentId, MediaType, Revision};

use crate::error::{ServerError, ServerResult};

/// Revision of the document carried by a response.
pub const X_REVISION: HeaderName = HeaderName::from_static("x-revision");

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self { registry }
    }

    fn engine(&self, name: &str) -> ServerResult<Arc<StorageEngine>> {
        self.registry
            .find(name)
            .ok_or_else(|| ServerError::UnknownCollection(name.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "includeRevs")]
    pub include_revs: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevisionQuery {
    pub rev: Option<String>,
}

/// A document as listed in a JSON array.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEnvelope {
    pub id: DocumentId,
    pub revision: Revision,
    pub media_type: MediaType,
    pub content: serde_json::Value,
}

impl From<&Document> for DocumentEnvelope {
    fn from(document: &Document) -> Self {
        // Stored JSON that does not parse is returned as a string.
        let content = match document.media_type {
            MediaType::ApplicationJson => serde_json::from_slice(&document.content)
                .unwrap_or_else(|_| serde_json::Value::String(document.content_str().into_owned())),
            MediaType::TextPlain => serde_json::Value::String(document.content_str().into_owned()),
        };
        Self {
            id: document.id,
            revision: document.revision,
            media_type: document.media_type,
            content,
        }
    }
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "pragma-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_collections(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "collections": state.registry.list_names() }))
}

pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> ServerResult<Response> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServerError::BadRequest("collection name must not be empty".into()));
    }
    Collection::validate_name(name)?;
    let engine = state.registry.create_or_get(name)?;
    Ok((StatusCode::CREATED, Json(json!({ "name": engine.name() }))).into_response())
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<StatusCode> {
    if state.registry.remove(&name) {
        Ok(StatusCode::OK)
    } else {
        Err(ServerError::UnknownCollection(name))
    }
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Json<Vec<DocumentEnvelope>>> {
    let include_all = query
        .include_revs
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
    let documents = state.engine(&name)?.get_all(include_all).await?;
    Ok(Json(documents.iter().map(DocumentEnvelope::from).collect()))
}

pub async fn create_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Response> {
    let engine = state.engine(&name)?;
    let media_type = request_media_type(&headers)?;
    let stored = engine.insert(Document::new(media_type, body)).await?;
    Ok(document_response(StatusCode::CREATED, &name, &stored))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    Query(query): Query<RevisionQuery>,
) -> ServerResult<Response> {
    let engine = state.engine(&name)?;
    let id: DocumentId = id.parse()?;
    let revision = query.rev.as_deref().map(parse_revision).transpose()?;
    let document = engine.get(id, revision).await?;
    Ok(document_response(StatusCode::OK, &name, &document))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Response> {
    let engine = state.engine(&name)?;
    let id: DocumentId = id.parse()?;
    let expected = expected_revision(&headers)?;
    let stored = engine.update(id, body, expected).await?;
    Ok(document_response(StatusCode::OK, &name, &stored))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    let engine = state.engine(&name)?;
    let id: DocumentId = id.parse()?;
    engine.delete(id).await?;
    Ok(StatusCode::OK)
}

/// Operator export of a whole collection in Ketchup layout.
pub async fn export_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Response> {
    let collection = state.engine(&name)?.snapshot().await?;
    let bytes = pragma_ketchup::encode_to_vec(&collection)?;
    tracing::info!(collection = %name, bytes = bytes.len(), "exported over http");
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}.ketchup\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn request_media_type(headers: &HeaderMap) -> ServerResult<MediaType> {
    let value = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Ok(MediaType::parse(value)?)
}

fn parse_revision(value: &str) -> ServerResult<Revision> {
    match value.trim().parse::<Revision>() {
        Ok(revision) if revision > 0 => Ok(revision),
        _ => Err(ServerError::BadRequest(format!(
            "Parameter rev needs to be a positive integer, got {value:?}"
        ))),
    }
}

/// `If-Match` carries the revision the client last saw, optionally quoted.
fn expected_revision(headers: &HeaderMap) -> ServerResult<Option<Revision>> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ServerError::BadRequest("If-Match is not valid text".into()))?
        .trim();
    if value == "*" {
        return Ok(None);
    }
    parse_revision(value.trim_matches('"')).map(Some)
}

/// `collection` is a validated name and needs no escaping in `Location`.
fn document_response(status: StatusCode, collection: &str, document: &Document) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, document.media_type.as_str().to_string()),
            (
                header::LOCATION,
                format!("/collections/{collection}/docs/{}", document.id),
            ),
            (X_REVISION, document.revision.to_string()),
        ],
        document.content.clone(),
    )
        .into_response()
}
