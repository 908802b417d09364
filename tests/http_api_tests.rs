#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use resource_ledger::http_api::{self, AppState, PortfolioReportEntry};
use resource_ledger::session::encode_unsigned_token;
use resource_ledger::{
    BudgetStatus, Claims, Client, OpenPosition, PersistenceError, Portfolio, PortfolioStore,
    Project, ProjectBudgetReport, Role,
};
use std::{io, sync::Arc};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn bearer(role: Role) -> String {
    let token = encode_unsigned_token(&Claims {
        sub: "tester".into(),
        role,
        exp: None,
    });
    format!("Bearer {token}")
}

fn new_router() -> axum::Router {
    http_api::router(AppState::new(Portfolio::new()))
}

fn request(method: &str, uri: &str, role: Option<Role>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header(header::AUTHORIZATION, bearer(role));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = new_router();
    let (status, _) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = new_router();
    let (status, bytes) = send(&app, request("GET", "/projects", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn user_role_cannot_write() {
    let app = new_router();
    let (status, bytes) = send(
        &app,
        request(
            "POST",
            "/rate-cards",
            Some(Role::User),
            Some(json!({ "level": "SR", "rate": 300.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(&app, request("GET", "/rate-cards", Some(Role::User), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn budget_lifecycle_via_http_api() {
    let app = new_router();
    let admin = Some(Role::Admin);

    let (status, bytes) = send(
        &app,
        request(
            "POST",
            "/projects",
            admin,
            Some(json!({ "name": "Portal", "quoted_budget": 100000.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project: Project = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(project.id, 1);

    let (status, _) = send(
        &app,
        request("POST", "/rate-cards", admin, Some(json!({ "level": "SR", "rate": 300.0 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/projects/1/allocations",
            admin,
            Some(json!({
                "resource_id": "r1",
                "resource_name": "Ada",
                "level": "SR",
                "start_date": "2024-01-01",
                "end_date": "2024-12-31"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/projects/1/requirements",
            admin,
            Some(json!({ "level": "SR", "quantity": 2 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, bytes) = send(
        &app,
        request("GET", "/projects/1/report?as_of=2025-01-01", Some(Role::User), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report: ProjectBudgetReport = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report.line_items[0].working_days, 236);
    assert_eq!(report.reconciliation.total_spend, 70_800.0);
    assert_eq!(report.reconciliation.status, BudgetStatus::Surplus);
    assert_eq!(report.open_positions.len(), 1);

    let (status, bytes) =
        send(&app, request("GET", "/projects/1/open-positions", admin, None)).await;
    assert_eq!(status, StatusCode::OK);
    let open: Vec<OpenPosition> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(open[0].remaining, 1);

    let (status, _) = send(
        &app,
        request("PUT", "/projects/1/budget", admin, Some(json!({ "quoted_budget": 70000.0 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, bytes) =
        send(&app, request("GET", "/reports?as_of=2025-01-01", admin, None)).await;
    assert_eq!(status, StatusCode::OK);
    let entries: Vec<PortfolioReportEntry> = serde_json::from_slice(&bytes).unwrap();
    let report = entries[0].report.as_ref().unwrap();
    assert_eq!(report.reconciliation.status, BudgetStatus::Deficit);

    let release = || request("DELETE", "/projects/1/allocations/r1", admin, None);
    let (status, _) = send(&app, release()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, release()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("DELETE", "/projects/1", admin, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request("GET", "/projects/1", admin, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payloads_map_to_client_errors() {
    let app = new_router();
    let admin = Some(Role::Admin);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/projects",
            admin,
            Some(json!({ "name": "Neg", "quoted_budget": -1.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/projects",
            admin,
            Some(json!({ "name": "Ok", "client_id": 5, "quoted_budget": 1.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/projects",
            admin,
            Some(json!({ "name": "Ok", "quoted_budget": 1.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let allocation = json!({
        "resource_id": "r1",
        "resource_name": "Ada",
        "level": "SR",
        "start_date": "2024-01-01"
    });
    let allocate = || request("POST", "/projects/1/allocations", admin, Some(allocation.clone()));
    let (status, _) = send(&app, allocate()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, allocate()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        request("GET", "/projects/1/report?as_of=2023-12-01", admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_requests_are_json_invalid_request_errors() {
    let app = new_router();
    let admin = Some(Role::Admin);

    let cases = [
        request("POST", "/projects", admin, Some(json!({ "name": "No budget" }))),
        request("GET", "/projects/abc", admin, None),
        request("GET", "/reports?as_of=notadate", admin, None),
        request("GET", "/projects/1/report?as_of=2024-13-01", admin, None),
    ];
    for req in cases {
        let uri = req.uri().to_string();
        let (status, bytes) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_request", "{uri}");
        assert!(!body["message"].as_str().unwrap().is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn exhausted_ids_are_a_conflict() {
    let portfolio =
        Portfolio::from_parts(vec![], vec![Project::new(u32::MAX, "Last", 1.0)], vec![]).unwrap();
    let app = http_api::router(AppState::new(portfolio));

    let (status, bytes) = send(
        &app,
        request(
            "POST",
            "/projects",
            Some(Role::Admin),
            Some(json!({ "name": "Overflow", "quoted_budget": 1.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "conflict");
}

struct UnwritableStore;

impl PortfolioStore for UnwritableStore {
    fn save_portfolio(&self, _portfolio: &Portfolio) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io(io::Error::other("disk full")))
    }

    fn load_portfolio(&self) -> Result<Option<Portfolio>, PersistenceError> {
        Ok(None)
    }
}

#[tokio::test]
async fn failed_save_leaves_state_unchanged() {
    let mut project = Project::new(1, "Portal", 500.0);
    project.client_id = Some(1);
    let portfolio = Portfolio::from_parts(
        vec![Client {
            id: 1,
            name: "Acme".into(),
            contact_email: None,
        }],
        vec![project],
        vec![],
    )
    .unwrap();
    let state = AppState::new(portfolio).with_store(Arc::new(UnwritableStore));
    let app = http_api::router(state);
    let admin = Some(Role::Admin);

    let (status, bytes) = send(
        &app,
        request("POST", "/clients", admin, Some(json!({ "name": "Initech" }))),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "internal_error");

    let (status, _) = send(
        &app,
        request("PUT", "/projects/1/budget", admin, Some(json!({ "quoted_budget": 9.0 }))),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, _) = send(&app, request("DELETE", "/projects/1", admin, None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, bytes) = send(&app, request("GET", "/clients", admin, None)).await;
    let clients: Vec<Client> = serde_json::from_slice(&bytes).unwrap();
    let names: Vec<&str> = clients.iter().map(|client| client.name.as_str()).collect();
    assert_eq!(names, vec!["Acme"]);

    let (status, bytes) = send(&app, request("GET", "/projects/1", admin, None)).await;
    assert_eq!(status, StatusCode::OK);
    let project: Project = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(project.quoted_budget, 500.0);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn writes_are_persisted_to_store() {
    use resource_ledger::SqlitePortfolioStore;

    let store = Arc::new(SqlitePortfolioStore::in_memory().unwrap());
    let state = AppState::new(Portfolio::new()).with_store(store.clone());
    let app = http_api::router(state);

    let (status, _) = send(
        &app,
        request("POST", "/clients", Some(Role::Admin), Some(json!({ "name": "Initech" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = store.load_portfolio().unwrap().expect("portfolio persisted");
    assert_eq!(stored.clients()[0].name, "Initech");

    let (status, _) = send(&app, request("GET", "/clients", Some(Role::Admin), None)).await;
    assert_eq!(status, StatusCode::OK);
}
