//! Saved estimate routes. Every route is scoped to the authenticated user;
//! someone else's estimate looks exactly like a missing one.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::AppState;
use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use crate::client::api::{
    EstimateDraft, EstimateListResponse, EstimateResponse, MessageResponse, SavedEstimateResponse,
};

const NOT_FOUND: &str = "Estimate not found";

pub(super) async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<EstimateDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SavedEstimateResponse>)> {
    let Json(draft) = payload?;
    draft.validate()?;

    let estimate = state.db.create_estimate(auth.user_id, &draft).await?;
    tracing::info!(
        user_id = auth.user_id,
        estimate_id = estimate.id,
        total_cost = %estimate.total_cost,
        "Saved estimate"
    );

    Ok((
        StatusCode::CREATED,
        Json(SavedEstimateResponse {
            message: "Estimate saved successfully".to_string(),
            estimate_id: estimate.id,
            estimate,
        }),
    ))
}

pub(super) async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<EstimateListResponse>> {
    let estimates = state.db.list_estimates(auth.user_id).await?;
    Ok(Json(EstimateListResponse { estimates }))
}

pub(super) async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<EstimateResponse>> {
    let Path(id) = path?;
    let estimate = state
        .db
        .get_estimate(id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(EstimateResponse { estimate }))
}

/// Full replacement of an estimate's contents.
pub(super) async fn replace(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EstimateDraft>, JsonRejection>,
) -> ApiResult<Json<EstimateResponse>> {
    let Path(id) = path?;
    let Json(draft) = payload?;
    draft.validate()?;

    let estimate = state
        .db
        .replace_estimate(id, auth.user_id, &draft)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    tracing::info!(user_id = auth.user_id, estimate_id = id, "Updated estimate");

    Ok(Json(EstimateResponse { estimate }))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = path?;
    if !state.db.delete_estimate(id, auth.user_id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    tracing::info!(user_id = auth.user_id, estimate_id = id, "Deleted estimate");

    Ok(Json(MessageResponse {
        message: "Estimate deleted successfully".to_string(),
    }))
}
