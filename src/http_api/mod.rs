use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        FromRequest, FromRequestParts, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::allocation::{AllocatedResource, ResourceRequirement};
use crate::calculations::{LevelStaffing, OpenPosition};
use crate::engine::ProjectBudgetReport;
use crate::persistence::PortfolioStore;
use crate::portfolio::{Portfolio, PortfolioError};
use crate::project::{Client, Project};
use crate::rate_card::RateCardEntry;
use crate::requests::{
    NewAllocationRequest, NewClientRequest, NewProjectRequest, NewRateCardRequest,
    NewRequirementRequest, UpdateBudgetRequest,
};
use crate::session::{Capability, Session, SessionError};

pub type SharedStore = Arc<dyn PortfolioStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    portfolio: Arc<RwLock<Portfolio>>,
    store: Option<SharedStore>,
    /// Serializes writers so each change starts from the last committed state.
    writer: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(portfolio: Portfolio) -> Self {
        Self {
            portfolio: Arc::new(RwLock::new(portfolio)),
            store: None,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Persists the portfolio through `store` after every successful change.
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    fn snapshot(&self) -> Portfolio {
        self.portfolio.read().clone()
    }

    /// Applies `change` to a copy of the portfolio, saves the copy and only
    /// then publishes it. A failed change or a failed save leaves the shared
    /// portfolio untouched.
    async fn commit<T, F>(&self, change: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Portfolio) -> Result<T, ApiError> + Send,
        T: Send,
    {
        let _writer = self.writer.lock().await;
        let mut next = self.snapshot();
        let output = change(&mut next)?;

        let next = match self.store.clone() {
            Some(store) => tokio::task::spawn_blocking(move || {
                store.save_portfolio(&next).map(|()| next)
            })
            .await
            .map_err(|err| ApiError::internal(format!("persistence task failed: {err}")))?
            .map_err(|err| {
                error!(error = %err, "failed to persist portfolio");
                ApiError::internal(format!("failed to persist portfolio: {err}"))
            })?,
            None => next,
        };

        *self.portfolio.write() = next;
        Ok(output)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<PortfolioError> for ApiError {
    fn from(value: PortfolioError) -> Self {
        match value {
            PortfolioError::ClientNotFound(_) | PortfolioError::ProjectNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            PortfolioError::DuplicateAllocation { .. } | PortfolioError::IdsExhausted(_) => {
                ApiError::Conflict(value.to_string())
            }
            PortfolioError::Validation(_) | PortfolioError::Cost(_) => {
                ApiError::Invalid(value.to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::Forbidden { .. } => ApiError::Forbidden(value.to_string()),
            _ => ApiError::Unauthorized(value.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::Invalid(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "unauthorized", message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// JSON body whose rejections are reported as `invalid_request`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct Body<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
struct Path<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
struct Query<T>(T);

/// Builds the session for this request and checks it may exercise `capability`.
fn authorize(headers: &HeaderMap, capability: Capability) -> Result<Session, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(SessionError::MissingToken)?
        .to_str()
        .map_err(|_| SessionError::MalformedToken("authorization header is not ASCII".into()))?;
    let session = Session::from_bearer(header)?;
    session.ensure_active(Utc::now())?;
    if let Err(err) = session.require(capability) {
        warn!(subject = session.subject(), %capability, "request forbidden");
        return Err(err.into());
    }
    Ok(session)
}

#[derive(Debug, Deserialize)]
struct AsOfQuery {
    as_of: Option<NaiveDate>,
}

impl AsOfQuery {
    fn reference_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioReportEntry {
    pub project_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ProjectBudgetReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/clients", get(list_clients).post(create_client))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project).delete(delete_project))
        .route("/projects/:id/budget", put(update_budget))
        .route("/projects/:id/report", get(project_report))
        .route("/projects/:id/open-positions", get(open_positions))
        .route("/projects/:id/staffing", get(staffing))
        .route("/projects/:id/allocations", post(create_allocation))
        .route(
            "/projects/:id/allocations/:resource_id",
            delete(release_allocation),
        )
        .route("/projects/:id/requirements", post(add_requirement))
        .route("/rate-cards", get(list_rate_cards).post(upsert_rate_card))
        .route("/reports", get(portfolio_reports))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "resource-ledger HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_clients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Client>>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let clients = state.portfolio.read().clients().to_vec();
    Ok(Json(clients))
}

async fn create_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Body(request): Body<NewClientRequest>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    authorize(&headers, Capability::ManageClients)?;
    let created = state
        .commit(|portfolio| Ok(portfolio.create_client(request)?))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Project>>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let projects = state.portfolio.read().projects().to_vec();
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Body(request): Body<NewProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    authorize(&headers, Capability::ManageProjects)?;
    let created = state
        .commit(|portfolio| Ok(portfolio.create_project(request)?))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
) -> Result<Json<Project>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let project = state.portfolio.read().find_project(project_id).cloned();
    project
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("project {project_id} not found")))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Capability::ManageProjects)?;
    state
        .commit(|portfolio| {
            if portfolio.delete_project(project_id) {
                Ok(())
            } else {
                Err(ApiError::not_found(format!("project {project_id} not found")))
            }
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_budget(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
    Body(request): Body<UpdateBudgetRequest>,
) -> Result<Json<Project>, ApiError> {
    authorize(&headers, Capability::ManageProjects)?;
    let updated = state
        .commit(|portfolio| {
            portfolio.update_quoted_budget(project_id, request.quoted_budget)?;
            portfolio
                .find_project(project_id)
                .cloned()
                .ok_or_else(|| ApiError::internal("project not found after budget update"))
        })
        .await?;
    Ok(Json(updated))
}

async fn project_report(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<ProjectBudgetReport>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let report = state
        .portfolio
        .read()
        .budget_report(project_id, query.reference_date())?;
    Ok(Json(report))
}

async fn open_positions(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
) -> Result<Json<Vec<OpenPosition>>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let positions = state.portfolio.read().open_positions(project_id)?;
    Ok(Json(positions))
}

async fn staffing(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
) -> Result<Json<Vec<LevelStaffing>>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let balance = state.portfolio.read().staffing(project_id)?;
    Ok(Json(balance))
}

async fn create_allocation(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
    Body(request): Body<NewAllocationRequest>,
) -> Result<(StatusCode, Json<AllocatedResource>), ApiError> {
    authorize(&headers, Capability::ManageStaffing)?;
    let allocation = state
        .commit(|portfolio| Ok(portfolio.allocate(project_id, request)?))
        .await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

async fn release_allocation(
    State(state): State<AppState>,
    Path((project_id, resource_id)): Path<(u32, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&headers, Capability::ManageStaffing)?;
    state
        .commit(|portfolio| {
            if portfolio.release_allocation(project_id, &resource_id)? {
                Ok(())
            } else {
                Err(ApiError::not_found(format!(
                    "'{resource_id}' is not allocated to project {project_id}"
                )))
            }
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_requirement(
    State(state): State<AppState>,
    Path(project_id): Path<u32>,
    headers: HeaderMap,
    Body(request): Body<NewRequirementRequest>,
) -> Result<Json<ResourceRequirement>, ApiError> {
    authorize(&headers, Capability::ManageStaffing)?;
    let requirement = state
        .commit(|portfolio| Ok(portfolio.add_requirement(project_id, request)?))
        .await?;
    Ok(Json(requirement))
}

async fn list_rate_cards(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RateCardEntry>>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let entries = state.portfolio.read().rate_cards().to_vec();
    Ok(Json(entries))
}

async fn upsert_rate_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Body(request): Body<NewRateCardRequest>,
) -> Result<Json<RateCardEntry>, ApiError> {
    authorize(&headers, Capability::ManageRateCards)?;
    let entry = state
        .commit(|portfolio| Ok(portfolio.upsert_rate_card(request)?))
        .await?;
    Ok(Json(entry))
}

async fn portfolio_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<Vec<PortfolioReportEntry>>, ApiError> {
    authorize(&headers, Capability::ViewBudgets)?;
    let snapshot = state.snapshot();
    let results = snapshot.portfolio_reports(query.reference_date());
    let entries = results
        .into_iter()
        .map(|(project_id, result)| match result {
            Ok(report) => PortfolioReportEntry {
                project_id,
                report: Some(report),
                error: None,
            },
            Err(err) => PortfolioReportEntry {
                project_id,
                report: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    Ok(Json(entries))
}
