//! Record File HTTP Routes
//!
//! Token issuance, listing and deletion for the files of configured tables.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::warn;

use crate::file_storage::{AccessToken, FileAccessService, FileRecord, StorageError, TokenRequest};
use crate::observability::Event;

// ==================
// Shared State
// ==================

/// Services of the configured tables, keyed by lowercase table name
#[derive(Debug, Default)]
pub struct StorageState {
    services: HashMap<String, Arc<FileAccessService>>,
}

impl StorageState {
    pub fn new(services: impl IntoIterator<Item = FileAccessService>) -> Self {
        let services = services
            .into_iter()
            .map(|s| (s.table_name().to_lowercase(), Arc::new(s)))
            .collect();
        Self { services }
    }

    /// Service bound to `table`, matched case-insensitively
    pub fn service(&self, table: &str) -> Result<&Arc<FileAccessService>, StorageError> {
        self.services
            .get(&table.to_lowercase())
            .ok_or_else(|| StorageError::UnknownTable(table.to_string()))
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.values().map(|s| s.table_name()).collect();
        names.sort_unstable();
        names
    }
}

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: StorageError) -> ApiError {
    let code = err.status_code();
    if err.is_client_error() {
        warn!(event = Event::RequestRejected.as_str(), code, error = %err);
    } else {
        warn!(event = Event::RequestFailed.as_str(), code, error = %err);
    }

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse {
            error: err.to_string(),
            code,
        }),
    )
}

// ==================
// Routes
// ==================

/// Create record file routes.
///
/// Paths match case-sensitively, so the mixed-case paths existing clients
/// call are served alongside lowercase aliases.
pub fn storage_routes(state: Arc<StorageState>) -> Router {
    Router::new()
        .route("/:table/:id/StorageToken", post(issue_token_handler))
        .route("/:table/:id/storagetoken", post(issue_token_handler))
        .route("/:table/:id/MobileServiceFiles", get(list_files_handler))
        .route("/:table/:id/mobileservicefiles", get(list_files_handler))
        .route("/:table/:id/MobileServiceFiles/:name", delete(delete_file_handler))
        .route("/:table/:id/mobileservicefiles/:name", delete(delete_file_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn issue_token_handler(
    State(state): State<Arc<StorageState>>,
    Path((table, id)): Path<(String, String)>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<AccessToken>, ApiError> {
    let service = state.service(&table).map_err(error_response)?;
    let Json(request) = body
        .map_err(|e| error_response(StorageError::InvalidArgument(e.body_text())))?;

    let token = service
        .issue_token(&id, &request, None)
        .await
        .map_err(error_response)?;

    Ok(Json(token))
}

async fn list_files_handler(
    State(state): State<Arc<StorageState>>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<Vec<FileRecord>>, ApiError> {
    let service = state.service(&table).map_err(error_response)?;
    let files = service.list_files(&id, None).await.map_err(error_response)?;
    Ok(Json(files))
}

async fn delete_file_handler(
    State(state): State<Arc<StorageState>>,
    Path((table, id, name)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let service = state.service(&table).map_err(error_response)?;
    service
        .delete_file(&id, &name, None)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::file_storage::{AzureBlobProvider, MemoryBlobClient};

    fn app() -> (Router, Arc<MemoryBlobClient>) {
        let client = Arc::new(MemoryBlobClient::new());
        let provider = AzureBlobProvider::new("UseDevelopmentStorage=true", client.clone()).unwrap();
        let service = FileAccessService::new("Notes", Arc::new(provider)).unwrap();
        let state = Arc::new(StorageState::new([service]));
        (storage_routes(state), client)
    }

    async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[test]
    fn test_state_lookup_ignores_case() {
        let (_, client) = app();
        let provider = AzureBlobProvider::new("UseDevelopmentStorage=true", client).unwrap();
        let state = StorageState::new([FileAccessService::new("Notes", Arc::new(provider)).unwrap()]);
        assert!(state.service("NOTES").is_ok());
        assert!(matches!(state.service("orders"), Err(StorageError::UnknownTable(_))));
        assert_eq!(state.table_names(), vec!["Notes"]);
    }

    #[tokio::test]
    async fn test_issue_token() {
        let (router, _) = app();
        let body = json!({
            "permissions": 3,
            "targetFile": {"name": "photo.png", "tableName": "Notes", "parentId": "abc"}
        });

        let (status, token) = send(router, Method::POST, "/Notes/abc/StorageToken", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(token["entityId"], "abc");
        assert_eq!(token["permissions"], 3);
        assert_eq!(token["scope"], "Record");
        assert!(token["resourceUri"].as_str().unwrap().ends_with("/notes-abc"));
        assert!(token["rawToken"].as_str().unwrap().contains("sp=rw"));
    }

    #[tokio::test]
    async fn test_issue_token_without_target_is_bad_request() {
        let (router, _) = app();
        let (status, error) =
            send(router, Method::POST, "/Notes/abc/storagetoken", Some(json!({"permissions": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], 400);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (router, _) = app();
        let (status, error) = send(
            router,
            Method::POST,
            "/Notes/abc/storagetoken",
            Some(json!({"permissions": "Read, Everything"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let (router, _) = app();
        let (status, error) = send(router, Method::GET, "/Orders/abc/MobileServiceFiles", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["code"], 404);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (router, client) = app();
        client
            .put_blob("notes-abc", "photo.png", b"data", HashMap::new())
            .unwrap();

        let (status, files) = send(router.clone(), Method::GET, "/Notes/abc/MobileServiceFiles", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(files.as_array().unwrap().len(), 1);
        assert_eq!(files[0]["name"], "photo.png");
        assert_eq!(files[0]["length"], 4);

        let (status, _) = send(router.clone(), Method::DELETE, "/Notes/abc/MobileServiceFiles/photo.png", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!client.blob_exists("notes-abc", "photo.png"));

        let (status, _) = send(router, Method::DELETE, "/Notes/abc/mobileservicefiles/photo.png", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_lowercase_aliases() {
        let (router, client) = app();
        client
            .put_blob("notes-abc", "photo.png", b"data", HashMap::new())
            .unwrap();

        let (status, files) = send(router.clone(), Method::GET, "/notes/abc/mobileservicefiles", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(files.as_array().unwrap().len(), 1);

        let body = json!({
            "permissions": 1,
            "targetFile": {"name": "photo.png", "tableName": "Notes", "parentId": "abc"}
        });
        let (status, _) = send(router.clone(), Method::POST, "/Notes/abc/storagetoken", Some(body)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(router, Method::GET, "/Notes/abc/files", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
