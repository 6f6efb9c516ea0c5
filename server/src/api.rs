//! Request handlers for the engineer recommender's HTTP surface (spec.md §6).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use recruit_graph::GraphClient;
use recruit_types::{EngineerId, SearchRequest, SearchResponse, SimilarityResponse};
use recruit_service::SearchOrchestrator;
use serde::Deserialize;

use crate::error::Result;

/// Unconditional liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 200 when the graph backend answers its ping, 500 otherwise (spec.md §6).
pub async fn db_health(State(orchestrator): State<Arc<SearchOrchestrator>>) -> impl IntoResponse {
    if orchestrator.store().ping().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "graph unreachable")
    }
}

/// `POST /search/filter`.
pub async fn search_filter(
    State(orchestrator): State<Arc<SearchOrchestrator>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let response = orchestrator.search(&request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSimilarityRequest {
    #[serde(flatten)]
    pub filter: SearchRequest,
    pub reference_engineer_id: String,
}

/// `POST /search/filter-similarity`.
pub async fn search_filter_similarity(
    State(orchestrator): State<Arc<SearchOrchestrator>>,
    Json(body): Json<FilterSimilarityRequest>,
) -> Result<Json<SearchResponse>> {
    let reference_id = EngineerId::new(body.reference_engineer_id);
    let response = orchestrator
        .filter_similarity(&body.filter, &reference_id)
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<usize>,
}

/// `GET /engineers/:id/similar?limit=`.
pub async fn engineer_similar(
    State(orchestrator): State<Arc<SearchOrchestrator>>,
    Path(id): Path<String>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<SimilarityResponse>> {
    let reference_id = EngineerId::new(id);
    let limit = query.limit.unwrap_or(10);
    let response = orchestrator.similar(&reference_id, limit).await?;
    Ok(Json(response))
}
