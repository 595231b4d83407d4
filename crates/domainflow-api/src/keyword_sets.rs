//! Keyword set CRUD (§6 `/keyword-sets`).

use crate::dto::{CreateKeywordSetBody, KeywordSetResponse};
use crate::error::ApiError;
use crate::ApiState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use domainflow_storage::models::KeywordRule;
use uuid::Uuid;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/keyword-sets", get(list).post(create))
        .route("/keyword-sets/{id}", get(detail).delete(remove))
}

async fn create(
    State(state): State<ApiState>,
    Json(body): Json<CreateKeywordSetBody>,
) -> Result<Json<KeywordSetResponse>, ApiError> {
    let rules: Option<Vec<KeywordRule>> = body.rules.map(|rs| rs.into_iter().map(Into::into).collect());
    Ok(Json(state.store.keyword_sets.create(&body.name, rules).await?))
}

async fn list(State(state): State<ApiState>) -> Result<Json<Vec<KeywordSetResponse>>, ApiError> {
    Ok(Json(state.store.keyword_sets.list().await?))
}

async fn detail(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<KeywordSetResponse>, ApiError> {
    Ok(Json(state.store.keyword_sets.get(id).await?))
}

async fn remove(State(state): State<ApiState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.store.keyword_sets.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
