//! Campaign routes (§6): create, list, detail, lifecycle transitions,
//! delete, and the three per-type results pages.

use crate::auth::AuthedUser;
use crate::dto::{
    CampaignResponse, CreateCampaignBody, ListCampaignsQuery, PageBody, ResultsQuery,
};
use crate::error::ApiError;
use crate::ApiState;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use domainflow_core::{Cursor, Error};
use domainflow_orchestrator::orchestrator::CampaignResults;
use domainflow_storage::campaigns::CampaignFilters;
use uuid::Uuid;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/campaigns", post(create).get(list))
        .route("/campaigns/{id}", get(detail))
        .route("/campaigns/{id}", delete(remove))
        .route("/campaigns/{id}/start", post(start))
        .route("/campaigns/{id}/pause", post(pause))
        .route("/campaigns/{id}/resume", post(resume))
        .route("/campaigns/{id}/cancel", post(cancel))
        .route("/campaigns/{id}/results/generated-domains", get(generated_domains))
        .route("/campaigns/{id}/results/dns-validation", get(dns_validation_results))
        .route("/campaigns/{id}/results/http-keyword", get(http_keyword_results))
}

async fn create(
    State(state): State<ApiState>,
    AuthedUser(owner): AuthedUser,
    Json(body): Json<CreateCampaignBody>,
) -> Result<Json<CampaignResponse>, ApiError> {
    let campaign = state.orchestrator.create(body.into_request(owner)).await?;
    Ok(Json(campaign))
}

async fn list(
    State(state): State<ApiState>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<PageBody<CampaignResponse>>, ApiError> {
    let cursor = parse_cursor(query.cursor.as_deref())?;
    let filters = CampaignFilters {
        campaign_type: query.campaign_type,
        status: query.status,
        owner_user_id: None,
    };
    let page = state.store.campaigns.list(&filters, cursor, query.limit).await?;
    Ok(Json(PageBody::from_page(page)))
}

async fn detail(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    Ok(Json(state.store.campaigns.get(id).await?))
}

async fn remove(
    State(state): State<ApiState>,
    AuthedUser(actor): AuthedUser,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, ApiError> {
    state.orchestrator.delete(id, Some(actor)).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn start(
    State(state): State<ApiState>,
    AuthedUser(actor): AuthedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    Ok(Json(state.orchestrator.start(id, Some(actor)).await?))
}

async fn pause(
    State(state): State<ApiState>,
    AuthedUser(actor): AuthedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    Ok(Json(state.orchestrator.pause(id, Some(actor)).await?))
}

async fn resume(
    State(state): State<ApiState>,
    AuthedUser(actor): AuthedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    Ok(Json(state.orchestrator.resume(id, Some(actor)).await?))
}

async fn cancel(
    State(state): State<ApiState>,
    AuthedUser(actor): AuthedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, ApiError> {
    Ok(Json(state.orchestrator.cancel(id, Some(actor)).await?))
}

async fn generated_domains(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match results(&state, id, query).await? {
        CampaignResults::Generation(page) => {
            Ok(Json(serde_json::to_value(PageBody::from_page(page)).map_err(Error::from)?))
        }
        _ => Err(Error::validation("campaign is not a generation campaign").into()),
    }
}

async fn dns_validation_results(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match results(&state, id, query).await? {
        CampaignResults::DnsValidation(page) => {
            Ok(Json(serde_json::to_value(PageBody::from_page(page)).map_err(Error::from)?))
        }
        _ => Err(Error::validation("campaign is not a dns validation campaign").into()),
    }
}

async fn http_keyword_results(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match results(&state, id, query).await? {
        CampaignResults::HttpKeyword(page) => {
            Ok(Json(serde_json::to_value(PageBody::from_page(page)).map_err(Error::from)?))
        }
        _ => Err(Error::validation("campaign is not an http keyword campaign").into()),
    }
}

async fn results(state: &ApiState, id: Uuid, query: ResultsQuery) -> Result<CampaignResults, ApiError> {
    let cursor = parse_cursor(query.cursor.as_deref())?;
    Ok(state.orchestrator.get_results(id, cursor, query.limit).await?)
}

fn parse_cursor(raw: Option<&str>) -> Result<Option<Cursor>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => Cursor::decode(raw)
            .map(Some)
            .ok_or_else(|| Error::validation("invalid cursor").into()),
    }
}
