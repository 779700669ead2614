//! Case HTTP Routes
//!
//! One handler per store operation, plus filtered listing, statistics and
//! a health check.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::envelope::{ApiError, DataEnvelope, MessageEnvelope};
use crate::entity::{Case, CaseFields, CasePatch};
use crate::search::{parse_query, search, CaseFilter, CaseSort};
use crate::stats::CaseStats;
use crate::storage::CaseStore;

pub const DELETED_MESSAGE: &str = "Case deleted";

// ==================
// Shared State
// ==================

/// State shared across case handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<CaseStore>>,
    /// Report missing/malformed ids as 404/400 instead of `200 data:null`.
    pub strict_not_found: bool,
}

impl AppState {
    pub fn new(store: CaseStore, strict_not_found: bool) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            strict_not_found,
        }
    }
}

// ==================
// Request/Response Types
// ==================

/// Query parameters accepted by `GET /cases`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub owner: Option<String>,
    pub customer: Option<String>,
    pub case_number: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    /// Build the filter and sort. Explicit parameters win over `q` tokens.
    pub fn into_query(self) -> Result<(CaseFilter, CaseSort), ApiError> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let sort = CaseSort {
            key: match present(self.sort) {
                Some(key) => key.parse().map_err(ApiError::InvalidQuery)?,
                None => Default::default(),
            },
            order: match present(self.order) {
                Some(order) => order.parse().map_err(ApiError::InvalidQuery)?,
                None => Default::default(),
            },
        };

        let explicit = CaseFilter {
            status: present(self.status),
            priority: present(self.priority),
            owner: present(self.owner),
            customer: present(self.customer),
            case_number: present(self.case_number),
            terms: Vec::new(),
        };
        let filter = match present(self.q) {
            Some(q) => explicit.or(parse_query(&q)),
            None => explicit,
        };

        Ok((filter, sort))
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ==================
// Routes
// ==================

/// Create case routes mounted at `cases_path` (e.g. `/api/v1/cases`).
///
/// The collection path also answers with a trailing slash.
pub fn case_routes(cases_path: &str, state: AppState) -> Router {
    let collection = cases_path.trim_end_matches('/');

    Router::new()
        .route(collection, get(list_cases).post(create_case))
        .route(&format!("{collection}/"), get(list_cases).post(create_case))
        .route(&format!("{collection}/stats"), get(case_stats))
        .route(
            &format!("{collection}/{{id}}"),
            get(get_case).put(update_case).delete(delete_case),
        )
        .with_state(state)
}

/// Health check route
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Answer for paths no route matches.
pub async fn fallback_handler() -> ApiError {
    ApiError::RouteNotFound
}

// ==================
// Handlers
// ==================

async fn list_cases(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<DataEnvelope<Vec<Case>>>, ApiError> {
    let Query(params) = params?;
    let (filter, sort) = params.into_query()?;

    let cases = state.store.read().await.list();
    let found = search(cases, &filter, sort);

    debug!(count = found.len(), "listed cases");
    Ok(DataEnvelope::ok(found))
}

async fn case_stats(State(state): State<AppState>) -> Json<DataEnvelope<CaseStats>> {
    let cases = state.store.read().await.list();
    DataEnvelope::ok(CaseStats::collect(&cases))
}

/// Decode a JSON body regardless of its `Content-Type`. An empty body is `{}`.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

async fn create_case(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<DataEnvelope<Case>>), ApiError> {
    let fields: CaseFields = parse_body(&body)?;
    let case = state.store.write().await.create(fields)?;
    Ok((StatusCode::CREATED, DataEnvelope::ok(case)))
}

async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataEnvelope<Option<Case>>>, ApiError> {
    let store = state.store.read().await;

    let case = if state.strict_not_found {
        Some(store.find(&id)?)
    } else {
        store.get(&id)
    };

    Ok(DataEnvelope::ok(case))
}

async fn update_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<DataEnvelope<Option<Case>>>, ApiError> {
    let patch: CasePatch = parse_body(&body)?;
    let mut store = state.store.write().await;

    let case = match store.update(&id, patch) {
        Ok(case) => Some(case),
        Err(err) if state.strict_not_found => return Err(err.into()),
        Err(err) => {
            debug!(%err, "update skipped");
            None
        }
    };

    Ok(DataEnvelope::ok(case))
}

async fn delete_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    let mut store = state.store.write().await;

    if state.strict_not_found {
        store.remove(&id)?;
    } else if !store.delete(&id) {
        debug!(id = %id, "delete matched nothing");
    }

    Ok(MessageEnvelope::ok(DELETED_MESSAGE))
}
