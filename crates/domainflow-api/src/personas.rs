//! Persona CRUD (§6 `/personas`).

use crate::dto::{CreatePersonaBody, PersonaResponse, SetEnabledBody};
use crate::error::ApiError;
use crate::ApiState;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use uuid::Uuid;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/personas", get(list).post(create))
        .route("/personas/{id}", get(detail))
        .route("/personas/{id}/enabled", put(set_enabled))
}

async fn create(
    State(state): State<ApiState>,
    Json(body): Json<CreatePersonaBody>,
) -> Result<Json<PersonaResponse>, ApiError> {
    let persona = state.registry.personas.create(&body.name, body.persona_type, body.config_details).await?;
    Ok(Json(persona))
}

async fn list(
    State(state): State<ApiState>,
    axum::extract::Query(query): axum::extract::Query<PersonaTypeQuery>,
) -> Result<Json<Vec<PersonaResponse>>, ApiError> {
    Ok(Json(state.store.personas.get_active(query.persona_type).await?))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonaTypeQuery {
    persona_type: domainflow_core::PersonaType,
}

async fn detail(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonaResponse>, ApiError> {
    Ok(Json(state.store.personas.get(id).await?))
}

async fn set_enabled(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetEnabledBody>,
) -> Result<Json<PersonaResponse>, ApiError> {
    state.store.personas.set_enabled(id, body.enabled).await?;
    Ok(Json(state.store.personas.get(id).await?))
}
