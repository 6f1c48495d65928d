//! Catalog routes: material prices, labor rates, consumption ratios.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::AppState;
use super::auth::AuthUser;
use super::error::{ApiError, ApiResult};
use crate::client::api::{
    ConsumptionRatiosResponse, CreatedLaborResponse, CreatedMaterialResponse, LaborRatesResponse,
    MaterialResponse, MaterialsResponse, MessageResponse,
};
use crate::pricing::catalog::{MaterialPatch, NewLaborRate, NewMaterial};

#[derive(Debug, Default, Deserialize)]
pub(super) struct QualityFilter {
    quality: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct CategoryFilter {
    category: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(super) async fn list_materials(
    State(state): State<AppState>,
    query: Result<Query<QualityFilter>, QueryRejection>,
) -> ApiResult<Json<MaterialsResponse>> {
    let Query(filter) = query?;
    let materials = state
        .db
        .list_materials(non_blank(filter.quality.as_deref()))
        .await?;
    Ok(Json(MaterialsResponse { materials }))
}

pub(super) async fn get_material(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MaterialResponse>> {
    let Path(id) = path?;
    let material = state
        .db
        .get_material(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Material not found"))?;
    Ok(Json(MaterialResponse { material }))
}

pub(super) async fn add_material(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<NewMaterial>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedMaterialResponse>)> {
    let Json(mut material) = payload?;
    material.material_name = material.material_name.trim().to_string();
    material.unit = material.unit.trim().to_string();
    material.quality = material.quality.trim().to_string();

    if material.material_name.is_empty() || material.unit.is_empty() {
        return Err(ApiError::bad_request("Material name, unit, and price are required"));
    }
    if material.price <= Decimal::ZERO {
        return Err(ApiError::bad_request("Price must be greater than zero"));
    }
    if material.quality.is_empty() {
        material.quality = "standard".to_string();
    }

    let material_id = state.db.add_material(&material).await?;
    tracing::info!(
        user_id = auth.user_id,
        material_id,
        "Added material {}",
        material.material_name
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedMaterialResponse {
            message: "Material added successfully".to_string(),
            material_id,
        }),
    ))
}

pub(super) async fn update_material(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<MaterialPatch>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if patch.price.is_some_and(|price| price <= Decimal::ZERO) {
        return Err(ApiError::bad_request("Price must be greater than zero"));
    }
    if !state.db.update_material(id, &patch).await? {
        return Err(ApiError::not_found("Material not found"));
    }
    tracing::info!(user_id = auth.user_id, material_id = id, "Updated material");

    Ok(Json(MessageResponse {
        message: "Material updated successfully".to_string(),
    }))
}

pub(super) async fn list_labor_rates(State(state): State<AppState>) -> ApiResult<Json<LaborRatesResponse>> {
    let labor_rates = state.db.list_labor_rates().await?;
    Ok(Json(LaborRatesResponse { labor_rates }))
}

pub(super) async fn add_labor_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<NewLaborRate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedLaborResponse>)> {
    let Json(mut rate) = payload?;
    rate.labor_type = rate.labor_type.trim().to_string();
    if rate.labor_type.is_empty() {
        return Err(ApiError::bad_request("Labor type and rate are required"));
    }
    if rate.rate <= Decimal::ZERO {
        return Err(ApiError::bad_request("Rate must be greater than zero"));
    }

    let labor_id = state.db.add_labor_rate(&rate).await?;
    tracing::info!(user_id = auth.user_id, labor_id, "Added labor rate {}", rate.labor_type);

    Ok((
        StatusCode::CREATED,
        Json(CreatedLaborResponse {
            message: "Labor rate added successfully".to_string(),
            labor_id,
        }),
    ))
}

pub(super) async fn list_consumption_ratios(
    State(state): State<AppState>,
    query: Result<Query<CategoryFilter>, QueryRejection>,
) -> ApiResult<Json<ConsumptionRatiosResponse>> {
    let Query(filter) = query?;
    let consumption_ratios = state
        .db
        .list_consumption_ratios(non_blank(filter.category.as_deref()))
        .await?;
    Ok(Json(ConsumptionRatiosResponse { consumption_ratios }))
}
