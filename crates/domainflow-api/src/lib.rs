//! Thin external-facing HTTP/WebSocket layer (§6): the `/api/v2` route
//! table and its error envelope. Session authentication, CORS policy
//! hardening, and request routing beyond this contract are the transport
//! collaborator's job (§1) — this crate only exposes the core's
//! operations over HTTP.

pub mod auth;
pub mod campaigns;
pub mod dto;
pub mod error;
pub mod keyword_sets;
pub mod personas;
pub mod proxies;
pub mod stringify;
pub mod websocket;

use domainflow_broadcast::Broadcaster;
use domainflow_orchestrator::Orchestrator;
use domainflow_registry::{PersonaRegistry, ProxyPool};
use domainflow_storage::Store;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Store>,
    pub orchestrator: Arc<Orchestrator>,
    pub broadcaster: Arc<Broadcaster>,
    pub registry: Arc<Registries>,
}

/// Bundles the Persona Registry and Proxy Pool the way [`Store`] bundles
/// its repositories, so `ApiState` doesn't grow a field per registry.
pub struct Registries {
    pub personas: Arc<PersonaRegistry>,
    pub proxies: Arc<ProxyPool>,
}

pub fn create_router(state: ApiState) -> axum::Router {
    let api = axum::Router::new()
        .merge(campaigns::router())
        .merge(personas::router())
        .merge(proxies::router())
        .merge(keyword_sets::router())
        .merge(websocket::router())
        .with_state(state);

    axum::Router::new()
        .nest("/api/v2", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domainflow_queue::{JobQueue, QueueConfig};
    use domainflow_storage::db::run_migrations;
    use domainflow_storage::ProxyRepository;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn test_state() -> ApiState {
        let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = Arc::new(Store::new(pool.clone()));
        let queue = Arc::new(JobQueue::new(pool.clone(), QueueConfig::default()));
        ApiState {
            orchestrator: Arc::new(Orchestrator::new(store.clone(), queue)),
            broadcaster: Arc::new(Broadcaster::new(64)),
            registry: Arc::new(Registries {
                personas: Arc::new(PersonaRegistry::new(store.personas.clone())),
                proxies: Arc::new(ProxyPool::new(
                    Arc::new(ProxyRepository::new(pool)),
                    Default::default(),
                )),
            }),
            store,
        }
    }

    #[tokio::test]
    async fn creating_a_generation_campaign_returns_it() {
        let app = create_router(test_state().await);
        let body = serde_json::json!({
            "type": "generation",
            "name": "q1 expansion",
            "patternType": "suffix_variable",
            "variableLength": 2,
            "characterSet": "ab",
            "constantString": "shop",
            "tld": "com",
            "numDomainsToGenerate": 4,
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v2/campaigns")
                    .header("content-type", "application/json")
                    .header("x-user-id", Uuid::new_v4().to_string())
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_auth_header_is_rejected() {
        let app = create_router(test_state().await);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v2/campaigns")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_campaign_returns_not_found() {
        let app = create_router(test_state().await);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v2/campaigns/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
