//! HTTP request handlers for the user records API
//!
//! Handlers are thin: they extract the request, run one [`RecordService`] call on
//! the blocking pool, and shape the result. A missing record is a normal 200
//! response carrying an `error` field, not an HTTP error.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Json as JsonExtractor,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::core::{Collection, Error, Record};
use crate::records::RecordService;
use crate::storage::RecordStore;

/// Body of the soft not-found response for lookups and updates
pub const NOT_FOUND_MESSAGE: &str = "User not found";

/// Shared handler state
pub type SharedService<S> = Arc<RecordService<S>>;

// Response types

/// Error body, used for validation failures, server failures and soft not-found
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    /// Create an error body
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Success acknowledgement
#[derive(Debug, Serialize)]
pub struct Ack {
    /// Always true
    pub success: bool,
}

impl Ack {
    fn ok() -> Self {
        Self { success: true }
    }
}

/// Either the record or the soft not-found body
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LookupResponse {
    /// Record exists
    Found(Record),
    /// No record with the requested id
    Missing(ErrorResponse),
}

impl From<Option<Record>> for LookupResponse {
    fn from(record: Option<Record>) -> Self {
        match record {
            Some(record) => Self::Found(record),
            None => Self::Missing(ErrorResponse::new(NOT_FOUND_MESSAGE)),
        }
    }
}

/// Result of a bulk creation
#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    /// Always true
    pub success: bool,
    /// Created records with their assigned ids, in request order
    #[serde(rename = "newRecords")]
    pub new_records: Vec<Record>,
}

/// System health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current system status
    pub status: String,
    /// Service version
    pub version: String,
    /// Storage backend in use
    pub records_backend: String,
}

/// Handler error: a crate [`Error`] rendered as a JSON response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

/// JSON body extractor whose rejections render as [`ApiError`] validation failures
pub struct JsonRequest<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonRequest<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let route = format!("{} {}", req.method(), req.uri().path());
        let JsonExtractor(value) = JsonExtractor::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::warn!("Rejected body for {}: {}", route, rejection.body_text());
                ApiError(Error::validation(body_rejection_message(&rejection)))
            })?;
        Ok(JsonRequest(value))
    }
}

fn body_rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "request body must be sent as application/json".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON".to_string(),
        JsonRejection::JsonDataError(err) => {
            format!("request body has the wrong shape: {}", err.body_text())
        }
        other => format!("request body could not be read: {}", other.body_text()),
    }
}

/// Run one service call on the blocking pool; the store does synchronous file I/O
async fn run_blocking<S, T, F>(service: SharedService<S>, op: F) -> Result<T, ApiError>
where
    S: RecordStore,
    T: Send + 'static,
    F: FnOnce(&RecordService<S>) -> crate::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(service.as_ref()))
        .await
        .map_err(|e| Error::internal(format!("Blocking task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// List every record in stored order
pub async fn list_records<S: RecordStore>(
    State(service): State<SharedService<S>>,
) -> Result<Json<Collection>, ApiError> {
    let records = run_blocking(service, |svc| svc.list()).await?;
    Ok(Json(records))
}

/// Get a record by id, or the soft not-found body
pub async fn get_record<S: RecordStore>(
    State(service): State<SharedService<S>>,
    Path(id): Path<String>,
) -> Result<Json<LookupResponse>, ApiError> {
    let record = run_blocking(service, move |svc| svc.get(&id)).await?;
    Ok(Json(record.into()))
}

/// Create a record and return it with its assigned id
pub async fn create_record<S: RecordStore>(
    State(service): State<SharedService<S>>,
    JsonRequest(body): JsonRequest<Value>,
) -> Result<Json<Record>, ApiError> {
    let record = run_blocking(service, move |svc| svc.create(body)).await?;
    Ok(Json(record))
}

/// Shallow-merge the body into a record, or return the soft not-found body
pub async fn update_record<S: RecordStore>(
    State(service): State<SharedService<S>>,
    Path(id): Path<String>,
    JsonRequest(body): JsonRequest<Value>,
) -> Result<Json<LookupResponse>, ApiError> {
    let record = run_blocking(service, move |svc| svc.update(&id, body)).await?;
    Ok(Json(record.into()))
}

/// Delete a record; succeeds whether or not it existed
pub async fn delete_record<S: RecordStore>(
    State(service): State<SharedService<S>>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    run_blocking(service, move |svc| svc.delete(&id)).await?;
    Ok(Json(Ack::ok()))
}

/// Delete every record listed in `{ "ids": [...] }`
pub async fn bulk_delete_records<S: RecordStore>(
    State(service): State<SharedService<S>>,
    JsonRequest(body): JsonRequest<Value>,
) -> Result<Json<Ack>, ApiError> {
    run_blocking(service, move |svc| svc.bulk_delete(&body)).await?;
    Ok(Json(Ack::ok()))
}

/// Create one record per element of `{ "users": [...] }`
pub async fn bulk_create_records<S: RecordStore>(
    State(service): State<SharedService<S>>,
    JsonRequest(body): JsonRequest<Value>,
) -> Result<Json<BulkCreateResponse>, ApiError> {
    let new_records = run_blocking(service, move |svc| svc.bulk_create(body)).await?;
    Ok(Json(BulkCreateResponse {
        success: true,
        new_records,
    }))
}

/// Health check
pub async fn health_check<S: RecordStore>(
    State(service): State<SharedService<S>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        records_backend: service.store().describe(),
    })
}
