//! HTTP transport over [`QueryFacade`].
//!
//! Handlers do no work of their own: each one is a facade call serialized
//! as JSON, after the store lock has already been released.

use axum::extract::{Query, State};
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::facade::{AlertsResponse, HealthResponse, HistoryResponse, PricesResponse, QueryFacade};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

pub fn router(facade: QueryFacade) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/prices", get(prices))
        .route("/alerts", get(alerts))
        .route("/history", get(history))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(facade)
}

async fn health(State(facade): State<QueryFacade>) -> Json<HealthResponse> {
    Json(facade.health_check())
}

async fn prices(State(facade): State<QueryFacade>) -> Json<PricesResponse> {
    Json(facade.get_latest_prices())
}

async fn alerts(State(facade): State<QueryFacade>) -> Json<AlertsResponse> {
    Json(facade.get_active_alerts())
}

async fn history(
    State(facade): State<QueryFacade>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryResponse> {
    Json(facade.get_history(params.limit))
}
