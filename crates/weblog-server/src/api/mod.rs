//! HTTP router assembly and the health endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::config::CorsConfig;
use crate::features::{self, FeatureState};
use crate::middleware;
use crate::search::ElasticClient;

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, cors: &CorsConfig) -> Router {
    let elastic = state.elastic.clone();

    Router::new()
        .route("/health", get(health_check))
        .with_state(elastic)
        .nest("/api/v1", features::router(state))
        // Apply layers from innermost to outermost
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

/// Health check handler
///
/// Reports search cluster health; 503 when the cluster cannot be reached.
async fn health_check(State(client): State<ElasticClient>) -> Response {
    match client.cluster_health().await {
        Ok(health) => {
            let message = match health.status.as_str() {
                "green" => "Search cluster is healthy",
                "yellow" => "Search cluster is degraded (some replicas missing)",
                _ => "Search cluster has issues",
            };

            (
                StatusCode::OK,
                Json(json!({
                    "cluster_name": health.cluster_name,
                    "status": health.status,
                    "node_count": health.number_of_nodes,
                    "message": message,
                })),
            )
                .into_response()
        },
        Err(e) => {
            tracing::error!("Search cluster health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": {
                        "message": "Failed to connect to search cluster",
                        "details": e.to_string(),
                        "status": StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                    }
                })),
            )
                .into_response()
        },
    }
}
