//! Calculator routes. Each validates its request, runs the matching
//! estimation mode and returns the result as JSON. No authentication needed.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use rust_decimal::prelude::ToPrimitive;

use super::AppState;
use super::error::ApiResult;
use crate::chat::ChatReply;
use crate::client::api::{
    BrickRequest, ChatRequest, ConcreteSlabRequest, ConstructionCostRequest, DetailedRequest, PaintRequest,
    RawMaterialRequest, ReadyMixRequest,
};
use crate::error::ValidationError;
use crate::estimation::{
    AreaPaintInput, AreaUnit, BrickEstimate, BrickInput, ConstructionCost, ConstructionInput, DetailedBreakdown,
    LengthUnit, PaintEstimate, PlotSpec, RawMaterialEstimate, RawMaterialInput, ReadyMixEstimate, ReadyMixInput,
    RegionRef, SlabEstimate, SlabInput, WallPaintInput,
};
use crate::pricing::catalog::{BRICKS_MATERIAL, paint_material_name};
use crate::pricing::{ConcreteGrade, QualityTier};

const DEFAULT_SLAB_THICKNESS_M: f64 = 0.15;
const DEFAULT_WALL_THICKNESS_M: f64 = 0.23;
const DEFAULT_PAINT_TYPE: &str = "Interior";

pub(crate) fn parse_quality(raw: Option<&str>) -> Result<QualityTier, ValidationError> {
    match raw.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => q.parse().map_err(|_| ValidationError::UnknownQuality(q.to_string())),
        None => Ok(QualityTier::default()),
    }
}

fn parse_grade(raw: Option<&str>) -> Result<ConcreteGrade, ValidationError> {
    match raw.map(str::trim).filter(|g| !g.is_empty()) {
        Some(g) => g.parse().map_err(|_| ValidationError::UnknownGrade(g.to_string())),
        None => Ok(ConcreteGrade::default()),
    }
}

fn parse_unit<U>(raw: Option<&str>) -> Result<U, ValidationError>
where
    U: std::str::FromStr + Default,
{
    match raw.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) => u.parse().map_err(|_| ValidationError::UnknownUnit(u.to_string())),
        None => Ok(U::default()),
    }
}

pub(super) async fn construction_cost(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionCostRequest>, JsonRejection>,
) -> ApiResult<Json<ConstructionCost>> {
    let Json(req) = payload?;
    let input = ConstructionInput::new(
        req.length,
        req.breadth,
        req.num_floors.unwrap_or(1),
        parse_quality(req.quality.as_deref())?,
    );
    Ok(Json(state.estimator.construction_cost(&input)?))
}

pub(super) async fn concrete_slab(
    State(state): State<AppState>,
    payload: Result<Json<ConcreteSlabRequest>, JsonRejection>,
) -> ApiResult<Json<SlabEstimate>> {
    let Json(req) = payload?;
    let input = SlabInput {
        length: req.length,
        breadth: req.breadth,
        thickness: req.thickness.unwrap_or(DEFAULT_SLAB_THICKNESS_M),
        unit: parse_unit::<LengthUnit>(req.unit.as_deref())?,
        grade: parse_grade(req.grade.as_deref())?,
    };
    Ok(Json(state.estimator.concrete_slab(&input, &req.region)?))
}

/// Direct-area requests are priced from the catalog; wall geometry uses the
/// table paint rate.
pub(super) async fn paint(
    State(state): State<AppState>,
    payload: Result<Json<PaintRequest>, JsonRejection>,
) -> ApiResult<Json<PaintEstimate>> {
    let Json(req) = payload?;

    if let Some(area) = req.area {
        let paint_type = req
            .paint_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_PAINT_TYPE);
        let price = state
            .db
            .find_material(&paint_material_name(paint_type), None)
            .await?
            .and_then(|m| m.price.to_f64());
        if price.is_none() {
            tracing::debug!(paint_type, "No catalog price for paint, using table rate");
        }
        let input = AreaPaintInput {
            area,
            coats: req.coats,
        };
        return Ok(Json(state.estimator.area_paint(&input, price)?));
    }

    let (Some(wall_height), Some(wall_width)) = (req.wall_height, req.wall_width) else {
        return Err(ValidationError::Missing { field: "area" }.into());
    };
    let input = WallPaintInput {
        wall_height,
        wall_width,
        door_count: req.door_count,
        door_dimensions: req.door_dimensions,
        window_count: req.window_count,
        window_dimensions: req.window_dimensions,
        coats: req.coats,
    };
    Ok(Json(state.estimator.wall_paint(&input)?))
}

pub(super) async fn bricks(
    State(state): State<AppState>,
    payload: Result<Json<BrickRequest>, JsonRejection>,
) -> ApiResult<Json<BrickEstimate>> {
    let Json(req) = payload?;
    let quality = req
        .quality
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or("standard");
    let input = BrickInput {
        wall_length: req.wall_length,
        wall_height: req.wall_height,
        wall_thickness: req.wall_thickness.unwrap_or(DEFAULT_WALL_THICKNESS_M),
    };
    let price = state
        .db
        .find_material(BRICKS_MATERIAL, Some(quality))
        .await?
        .and_then(|m| m.price.to_f64());
    Ok(Json(state.estimator.bricks(&input, price, &RegionRef::default())?))
}

pub(super) async fn raw_materials(
    State(state): State<AppState>,
    payload: Result<Json<RawMaterialRequest>, JsonRejection>,
) -> ApiResult<Json<RawMaterialEstimate>> {
    let Json(req) = payload?;
    let input = RawMaterialInput {
        area: req.area,
        unit: parse_unit::<AreaUnit>(req.unit.as_deref())?,
    };
    Ok(Json(state.estimator.raw_materials(&input, &req.region)?))
}

pub(super) async fn ready_mix(
    State(state): State<AppState>,
    payload: Result<Json<ReadyMixRequest>, JsonRejection>,
) -> ApiResult<Json<ReadyMixEstimate>> {
    let Json(req) = payload?;
    let input = ReadyMixInput {
        height: req.height,
        width: req.width,
        depth: req.depth,
    };
    Ok(Json(state.estimator.ready_mix(&input, &req.region)?))
}

pub(super) async fn detailed(
    State(state): State<AppState>,
    payload: Result<Json<DetailedRequest>, JsonRejection>,
) -> ApiResult<Json<DetailedBreakdown>> {
    let Json(req) = payload?;
    let plot = PlotSpec {
        width: req.width,
        length: req.length,
        floors: req.floors.unwrap_or(1),
    };
    let mut ctx = state
        .estimator
        .detailed(&plot, parse_quality(req.quality.as_deref())?)?;
    for (key, value) in req.material_overrides.iter().chain(req.labor_overrides.iter()) {
        ctx.apply_override(key, *value)?;
    }
    Ok(Json(ctx.recompute()))
}

pub(super) async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let Json(req) = payload?;
    if req.message.trim().is_empty() {
        return Err(ValidationError::Missing { field: "message" }.into());
    }
    Ok(Json(state.chatbot.respond(&req.message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quality() {
        assert_eq!(parse_quality(None), Ok(QualityTier::Standard));
        assert_eq!(parse_quality(Some("  ")), Ok(QualityTier::Standard));
        assert_eq!(parse_quality(Some("High_End")), Ok(QualityTier::HighEnd));
        assert_eq!(
            parse_quality(Some("premium")),
            Err(ValidationError::UnknownQuality("premium".into()))
        );
    }

    #[test]
    fn test_parse_grade_and_unit() {
        assert_eq!(parse_grade(Some("m20")), Ok(ConcreteGrade::M20));
        assert_eq!(parse_grade(None), Ok(ConcreteGrade::M15));
        assert!(matches!(parse_grade(Some("M40")), Err(ValidationError::UnknownGrade(_))));

        assert_eq!(parse_unit::<LengthUnit>(Some("ft")), Ok(LengthUnit::Feet));
        assert_eq!(parse_unit::<AreaUnit>(None), Ok(AreaUnit::Sqft));
        assert!(matches!(
            parse_unit::<AreaUnit>(Some("acre")),
            Err(ValidationError::UnknownUnit(_))
        ));
    }
}
