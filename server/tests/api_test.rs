//! End-to-end tests driving the router through `tower::ServiceExt::oneshot`,
//! the way `terraphim_server::api_test` exercises its own handlers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use recruit_config::KnowledgeBaseConfig;
use recruit_graph::MemoryGraphStore;
use recruit_server::build_router;
use recruit_service::SearchOrchestrator;
use recruit_types::{
    DomainId, DomainKind, DomainNode, Engineer, EngineerDomainEdge, EngineerId,
    EngineerSkillEdge, ProficiencyLevel, SkillId, SkillNode, StartTimeline,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn seeded_store() -> MemoryGraphStore {
    let mut store = MemoryGraphStore::new();
    store.add_skill(
        SkillNode {
            id: SkillId::new("skill_rust"),
            name: "Rust".to_string(),
            is_category: false,
        },
        None,
    );
    store.add_domain(
        DomainNode {
            id: DomainId::new("fintech"),
            name: "Fintech".to_string(),
            kind: DomainKind::Business,
        },
        None,
    );
    store.add_engineer(
        Engineer {
            id: EngineerId::new("eng_ada"),
            name: "Ada".to_string(),
            headline: "Backend engineer".to_string(),
            years_experience: 8.0,
            timezone: "America/New_York".to_string(),
            salary: 150_000.0,
            start_timeline: StartTimeline::Immediate,
            embedding: None,
        },
        vec![EngineerSkillEdge {
            skill_id: SkillId::new("skill_rust"),
            proficiency_level: ProficiencyLevel::Expert,
            confidence_score: 0.9,
            years_used: 5.0,
        }],
        vec![EngineerDomainEdge {
            domain_id: DomainId::new("fintech"),
            years: 4.0,
            source: None,
        }],
        vec![],
    );
    store.add_engineer(
        Engineer {
            id: EngineerId::new("eng_grace"),
            name: "Grace".to_string(),
            headline: "Backend engineer".to_string(),
            years_experience: 3.0,
            timezone: "America/New_York".to_string(),
            salary: 110_000.0,
            start_timeline: StartTimeline::Immediate,
            embedding: None,
        },
        vec![EngineerSkillEdge {
            skill_id: SkillId::new("skill_rust"),
            proficiency_level: ProficiencyLevel::Learning,
            confidence_score: 0.4,
            years_used: 0.5,
        }],
        vec![],
        vec![],
    );
    store
}

fn test_app() -> axum::Router {
    let orchestrator = Arc::new(SearchOrchestrator::new(
        seeded_store(),
        KnowledgeBaseConfig::default(),
    ));
    build_router(orchestrator)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_unconditionally_ok() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn db_health_reflects_the_store_ping() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/db-health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_filter_returns_camel_case_response_fields() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/search/filter")
                .header("content-type", "application/json")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["totalCount"], json!(2));
    assert!(body.get("appliedFilters").is_some());
    assert!(body.get("queryMetadata").is_some());
}

#[tokio::test]
async fn search_filter_rejects_out_of_range_limit_with_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/search/filter")
                .header("content-type", "application/json")
                .body(Body::from(json!({"limit": 999}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["kind"], json!("validation"));
}

#[tokio::test]
async fn engineer_similar_excludes_the_reference_and_respects_limit() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/engineers/eng_ada/similar?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let similar = body["similar"].as_array().unwrap();
    assert!(similar.len() <= 1);
    assert!(similar.iter().all(|s| s["engineer"] != json!("eng_ada")));
}

#[tokio::test]
async fn engineer_similar_unknown_id_is_404() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/engineers/eng_missing/similar")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
