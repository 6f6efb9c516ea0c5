//! Axum HTTP surface for the engineer recommender (spec.md §6). Mirrors
//! `terraphim_server::axum_server`: one `Router` built over a shared,
//! process-wide [`SearchOrchestrator`], wrapped in a permissive CORS layer
//! for the search/similarity/health routes.

mod api;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use recruit_service::SearchOrchestrator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::Result;

pub fn build_router(orchestrator: Arc<SearchOrchestrator>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/db-health", get(api::db_health))
        .route("/search/filter", post(api::search_filter))
        .route(
            "/search/filter-similarity",
            post(api::search_filter_similarity),
        )
        .route("/engineers/{id}/similar", get(api::engineer_similar))
        .with_state(orchestrator)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(vec![Method::GET, Method::POST]),
        )
}

pub async fn serve(addr: SocketAddr, orchestrator: Arc<SearchOrchestrator>) -> Result<()> {
    let app = build_router(orchestrator);
    log::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
