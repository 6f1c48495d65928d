//! Raw material take-off per built-up area, and bricks per wall.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::to_currency;
use crate::error::{ValidationError, require_positive};
use crate::pricing::{CoefficientBundle, RawMaterialBasis};

pub const SQ_YARD_TO_SQ_FEET: f64 = 9.0;
const KG_PER_TON: f64 = 1000.0;
/// Walls at least this thick (m) are laid two bricks deep.
const DOUBLE_BRICK_THICKNESS: f64 = 0.23;
const BRICKS_PER_SQFT_DOUBLE: f64 = 8.0;
const BRICKS_PER_SQFT_SINGLE: f64 = 4.0;
const BRICK_WASTAGE: f64 = 1.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    #[default]
    Sqft,
    Sqyd,
}

impl AreaUnit {
    pub fn to_sqft(&self, area: f64) -> f64 {
        match self {
            Self::Sqft => area,
            Self::Sqyd => area * SQ_YARD_TO_SQ_FEET,
        }
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqft => write!(f, "sqft"),
            Self::Sqyd => write!(f, "sqyd"),
        }
    }
}

impl FromStr for AreaUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['.', ' '], "").as_str() {
            "sqft" | "squarefeet" | "ft2" => Ok(Self::Sqft),
            "sqyd" | "squareyards" | "yd2" => Ok(Self::Sqyd),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialInput {
    pub area: f64,
    pub unit: AreaUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialEstimate {
    pub area_sqft: f64,
    pub cement_bags: f64,
    pub sand_tons: f64,
    pub aggregate_tons: f64,
    pub bricks: f64,
    pub steel_kg: f64,
    pub cement_cost: Decimal,
    pub sand_cost: Decimal,
    pub aggregate_cost: Decimal,
    pub brick_cost: Decimal,
    pub steel_cost: Decimal,
    pub total_cost: Decimal,
}

pub fn raw_materials(
    basis: &RawMaterialBasis,
    bundle: &CoefficientBundle,
    input: &RawMaterialInput,
) -> Result<RawMaterialEstimate, ValidationError> {
    let area = input.unit.to_sqft(require_positive("area", input.area)?);
    let factor = area / basis.per_area;

    let cement_bags = basis.cement_bags * factor;
    let sand_tons = basis.sand_tons * factor;
    let aggregate_tons = basis.aggregate_tons * factor;
    let bricks = basis.bricks * factor;
    let steel_kg = basis.steel_kg * factor;

    let cement_cost = to_currency(cement_bags * bundle.cement_price);
    let sand_cost = to_currency(sand_tons * bundle.sand_price * KG_PER_TON);
    let aggregate_cost = to_currency(aggregate_tons * bundle.aggregate_price * KG_PER_TON);
    let brick_cost = to_currency(bricks * bundle.brick_price);
    let steel_cost = to_currency(steel_kg * bundle.steel_price);

    Ok(RawMaterialEstimate {
        area_sqft: area,
        cement_bags,
        sand_tons,
        aggregate_tons,
        bricks,
        steel_kg,
        cement_cost,
        sand_cost,
        aggregate_cost,
        brick_cost,
        steel_cost,
        total_cost: cement_cost + sand_cost + aggregate_cost + brick_cost + steel_cost,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickInput {
    pub wall_length: f64,
    pub wall_height: f64,
    /// Metres.
    pub wall_thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickEstimate {
    pub wall_area: f64,
    pub bricks_per_sqft: f64,
    pub bricks_needed: u64,
    pub brick_price: Decimal,
    pub total_cost: Decimal,
}

pub fn bricks(input: &BrickInput, brick_price: f64) -> Result<BrickEstimate, ValidationError> {
    let wall_area = require_positive("wall_length", input.wall_length)?
        * require_positive("wall_height", input.wall_height)?;
    if !(input.wall_thickness.is_finite() && input.wall_thickness >= 0.0) {
        return Err(ValidationError::invalid("wall_thickness", "must be a non-negative number"));
    }
    if !(brick_price.is_finite() && brick_price >= 0.0) {
        return Err(ValidationError::invalid("brick_price", "must be a non-negative number"));
    }

    let per_sqft = if input.wall_thickness >= DOUBLE_BRICK_THICKNESS {
        BRICKS_PER_SQFT_DOUBLE
    } else {
        BRICKS_PER_SQFT_SINGLE
    };
    let with_wastage = wall_area * per_sqft * BRICK_WASTAGE;

    Ok(BrickEstimate {
        wall_area,
        bricks_per_sqft: per_sqft,
        bricks_needed: with_wastage.round() as u64,
        brick_price: to_currency(brick_price),
        total_cost: to_currency(with_wastage * brick_price),
    })
}
