// 🌐 HTTP API - dashboard data, reports and CSV downloads over JSON
//
// Handlers lock the shared store, run one store/analytics call, and wrap the
// result in `ApiResponse`.

use crate::analytics::AnalyticsSnapshot;
use crate::error::StoreError;
use crate::export::{export_dataset, ExportKind, ExportPayload};
use crate::models::{Client, DateWindow, Enrollment, NewClient, NewEnrollment, NewProgram, Program};
use crate::pagination::{paginate, Page, DEFAULT_PAGE_SIZE};
use crate::report::ReportDocument;
use crate::session::SessionGate;
use crate::store::{RecordStore, SqliteStore};
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<SqliteStore>>,
    gate: SessionGate,
}

impl AppState {
    pub fn new(store: SqliteStore, gate: SessionGate) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            gate,
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, SqliteStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::internal("record store lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::DuplicateEnrollment { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !err.is_client_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<crate::error::ExportError> for ApiError {
    fn from(err: crate::error::ExportError) -> Self {
        tracing::error!(error = %err, "export failed");
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::err(self.message))).into_response()
    }
}

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::ok(data))))
}

fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data))))
}

// ============================================================================
// Query parameters
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl WindowQuery {
    fn window(&self) -> Option<DateWindow> {
        DateWindow::from_optional_dates(self.from, self.to)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// `text` for the printable rendering, JSON otherwise
    pub format: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/clients - Search and page through clients
async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> ApiResult<Page<Client>> {
    let clients = state.store()?.search_clients(query.search.as_deref().unwrap_or(""))?;
    ok(paginate(
        &clients,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PAGE_SIZE),
    ))
}

/// POST /api/clients - Register a client
async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<NewClient>,
) -> ApiResult<Client> {
    let client = state.store()?.create_client(&payload)?;
    created(client)
}

/// GET /api/clients/:id - Client profile
async fn get_client(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Client> {
    match state.store()?.fetch_client(id)? {
        Some(client) => ok(client),
        None => Err(StoreError::NotFound { entity: "client", id }.into()),
    }
}

/// GET /api/clients/:id/enrollments - Programs one client is enrolled in
async fn get_client_enrollments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Enrollment>> {
    let store = state.store()?;
    if store.fetch_client(id)?.is_none() {
        return Err(StoreError::NotFound { entity: "client", id }.into());
    }
    ok(store.fetch_client_enrollments(id)?)
}

/// GET /api/programs
async fn list_programs(State(state): State<AppState>) -> ApiResult<Vec<Program>> {
    ok(state.store()?.fetch_programs()?)
}

/// POST /api/programs
async fn create_program(
    State(state): State<AppState>,
    Json(payload): Json<NewProgram>,
) -> ApiResult<Program> {
    created(state.store()?.create_program(&payload)?)
}

/// GET /api/enrollments
async fn list_enrollments(State(state): State<AppState>) -> ApiResult<Vec<Enrollment>> {
    ok(state.store()?.fetch_enrollments()?)
}

/// POST /api/enrollments - Enroll a client in a program
async fn create_enrollment(
    State(state): State<AppState>,
    Json(payload): Json<NewEnrollment>,
) -> ApiResult<Enrollment> {
    created(state.store()?.enroll_client(&payload)?)
}

/// GET /api/analytics?from=&to= - Everything the dashboard charts need
async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<AnalyticsSnapshot> {
    let dataset = state.store()?.load_dataset()?;
    ok(AnalyticsSnapshot::compute(&dataset, query.window().as_ref()))
}

/// GET /api/report?from=&to=&format=text
async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let dataset = state.store()?.load_dataset()?;
    let window = DateWindow::from_optional_dates(query.from, query.to);
    let document = ReportDocument::assemble(&dataset, window.as_ref(), Utc::now());

    if query.format.as_deref() == Some("text") {
        let headers = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
        return Ok((headers, document.to_plain_text()).into_response());
    }
    Ok(Json(ApiResponse::ok(document)).into_response())
}

/// GET /api/export/:kind?from=&to= - CSV download, or all three as JSON
async fn get_export(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<Response, ApiError> {
    let kind = ExportKind::parse(&kind)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("unknown export '{}'", kind)))?;

    let dataset = state.store()?.load_dataset()?;
    let mut payloads = export_dataset(kind, &dataset, query.window().as_ref())?;
    tracing::info!(kind = kind.as_str(), files = payloads.len(), "export generated");

    if kind == ExportKind::All {
        return Ok(Json(ApiResponse::ok(payloads)).into_response());
    }

    let ExportPayload { filename, content } = payloads
        .pop()
        .ok_or_else(|| ApiError::internal("export produced no payload"))?;
    let headers = [
        (header::CONTENT_TYPE, ExportPayload::CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, content).into_response())
}

async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if state.gate.authorize(authorization) {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "rejected unauthenticated request");
        ApiError::new(StatusCode::UNAUTHORIZED, "missing or invalid bearer token").into_response()
    }
}

/// Full application router: `/api/...` with session gate and CORS
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/:id", get(get_client))
        .route("/clients/:id/enrollments", get(get_client_enrollments))
        .route("/programs", get(list_programs).post(create_program))
        .route("/enrollments", get(list_enrollments).post(create_enrollment))
        .route("/analytics", get(get_analytics))
        .route("/report", get(get_report))
        .route("/export/:kind", get(get_export))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
