use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use vigil_challan::ChallanError;
use vigil_core::ViolationService;
use vigil_fines::FineSchedule;
use vigil_store::{InMemoryViolationStore, StoreError, ViolationStore};
use vigil_types::{Violation, ViolationReport};

#[derive(Clone)]
struct AppState {
    service: Arc<ViolationService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = std::env::var("VIGIL_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let evidence_dir = std::env::var("VIGIL_EVIDENCE_DIR").unwrap_or_else(|_| "./processed".into());

    // Single store instance for the process lifetime; handlers share it
    // through the service.
    let store: Arc<dyn ViolationStore> = Arc::new(InMemoryViolationStore::new());
    let service = Arc::new(ViolationService::new(
        store,
        FineSchedule::default(),
        evidence_dir.clone(),
    ));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/violations", post(record_violation).get(list_violations))
        .route("/violations/:id/challan", post(generate_challan))
        .with_state(AppState { service })
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = addr.parse()?;
    println!("vigil violation service listening on {addr}");
    println!("reading evidence images from {evidence_dir}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn record_violation(
    State(state): State<AppState>,
    Json(report): Json<ViolationReport>,
) -> Result<(StatusCode, Json<Violation>), (StatusCode, String)> {
    let stored = state
        .service
        .ingest(report)
        .await
        .map_err(store_response)?;
    println!("violation recorded: {}", stored.id);
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list_violations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Violation>>, (StatusCode, String)> {
    let all = state.service.list().await.map_err(store_response)?;
    Ok(Json(all))
}

async fn generate_challan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, (StatusCode, String)> {
    let challan = state.service.issue_challan(id).await.map_err(|e| match e {
        ChallanError::Store(e) => store_response(e),
        ChallanError::Render(msg) => {
            // The approval already committed; the record stays APPROVED.
            eprintln!("challan render failed for violation {id}: {msg}");
            (StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
    })?;

    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", challan.filename),
        )
        .body(Body::from(challan.pdf))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn store_response(e: StoreError) -> (StatusCode, String) {
    let status = match e {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict { .. } => StatusCode::CONFLICT,
        StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
