//! Proxy and proxy-pool CRUD (§6 `/proxies`).

use crate::dto::{CreateProxyBody, CreateProxyPoolBody, PoolMembershipBody, ProxyPoolResponse, ProxyResponse};
use crate::error::ApiError;
use crate::ApiState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/proxies", get(list).post(create))
        .route("/proxies/{id}", get(detail))
        .route("/proxy-pools", post(create_pool))
        .route("/proxy-pools/{id}/members", post(add_member))
        .route("/proxy-pools/{id}/members/{proxy_id}", delete(remove_member))
}

async fn create(
    State(state): State<ApiState>,
    Json(body): Json<CreateProxyBody>,
) -> Result<Json<ProxyResponse>, ApiError> {
    // Credentials are hashed before they ever reach persistence (§3: "never
    // store/return plaintext"); this thin layer is the last place the
    // plaintext value exists.
    let credentials_hash = body.credentials.as_deref().map(hash_credentials);
    let proxy = state
        .store
        .proxies
        .create(&body.name, &body.address, body.protocol, credentials_hash.as_deref())
        .await?;
    Ok(Json(proxy.into()))
}

fn hash_credentials(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(digest)
}

async fn list(State(state): State<ApiState>) -> Result<Json<Vec<ProxyResponse>>, ApiError> {
    let proxies = state.store.proxies.list_enabled().await?;
    Ok(Json(proxies.into_iter().map(ProxyResponse::from).collect()))
}

async fn detail(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProxyResponse>, ApiError> {
    Ok(Json(state.store.proxies.get(id).await?.into()))
}

async fn create_pool(
    State(state): State<ApiState>,
    Json(body): Json<CreateProxyPoolBody>,
) -> Result<Json<ProxyPoolResponse>, ApiError> {
    Ok(Json(state.store.proxies.create_pool(&body.name).await?))
}

async fn add_member(
    State(state): State<ApiState>,
    Path(pool_id): Path<Uuid>,
    Json(body): Json<PoolMembershipBody>,
) -> Result<StatusCode, ApiError> {
    state.store.proxies.add_to_pool(pool_id, body.proxy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_member(
    State(state): State<ApiState>,
    Path((pool_id, proxy_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.store.proxies.remove_from_pool(pool_id, proxy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
