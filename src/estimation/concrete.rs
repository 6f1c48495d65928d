//! Concrete slab and ready-mix volumes.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::to_currency;
use crate::error::{ValidationError, require_positive};
use crate::pricing::{CoefficientBundle, ConcreteGrade, PricingTables};

pub const FEET_TO_METERS: f64 = 0.3048;
pub const CUBIC_METERS_TO_CUBIC_YARDS: f64 = 1.30795;
/// Sand and aggregate prices are per kg equivalent.
const KG_PER_TON: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Meters,
    Feet,
}

impl LengthUnit {
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            Self::Meters => value,
            Self::Feet => value * FEET_TO_METERS,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meters => write!(f, "meters"),
            Self::Feet => write!(f, "feet"),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(Self::Meters),
            "ft" | "foot" | "feet" => Ok(Self::Feet),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabInput {
    pub length: f64,
    pub breadth: f64,
    pub thickness: f64,
    pub unit: LengthUnit,
    pub grade: ConcreteGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabEstimate {
    pub volume_m3: f64,
    pub grade: ConcreteGrade,
    pub ratio: String,
    pub strength: String,
    pub cement_bags: f64,
    pub sand_tons: f64,
    pub aggregate_tons: f64,
    pub cement_cost: Decimal,
    pub sand_cost: Decimal,
    pub aggregate_cost: Decimal,
    pub total_cost: Decimal,
}

/// Material quantities and cost of a slab.
///
/// The grade's share of each component is scaled against the reference mix,
/// whose per-m³ yield is fixed in the tables.
pub fn concrete_slab(
    tables: &PricingTables,
    bundle: &CoefficientBundle,
    input: &SlabInput,
) -> Result<SlabEstimate, ValidationError> {
    let length = input.unit.to_meters(require_positive("length", input.length)?);
    let breadth = input.unit.to_meters(require_positive("breadth", input.breadth)?);
    let thickness = input.unit.to_meters(require_positive("thickness", input.thickness)?);
    let volume = length * breadth * thickness;

    let mix = tables.grades.mix(input.grade);
    let yields = &tables.concrete_yield;
    let reference = &yields.reference_mix;
    let parts = mix.total_parts();
    let reference_parts = reference.total_parts();

    let scale = |share: f64, reference_share: f64| (share / parts) / (reference_share / reference_parts);

    let cement_bags = yields.cement_bags_per_m3 * scale(mix.cement, reference.cement) * volume;
    let sand_tons = yields.sand_tons_per_m3 * scale(mix.sand, reference.sand) * volume;
    let aggregate_tons =
        yields.aggregate_tons_per_m3 * scale(mix.aggregate, reference.aggregate) * volume;

    let cement_cost = to_currency(cement_bags * bundle.cement_price);
    let sand_cost = to_currency(sand_tons * bundle.sand_price * KG_PER_TON);
    let aggregate_cost = to_currency(aggregate_tons * bundle.aggregate_price * KG_PER_TON);

    Ok(SlabEstimate {
        volume_m3: volume,
        grade: input.grade,
        ratio: mix.ratio_label(),
        strength: mix.strength.clone(),
        cement_bags,
        sand_tons,
        aggregate_tons,
        cement_cost,
        sand_cost,
        aggregate_cost,
        total_cost: cement_cost + sand_cost + aggregate_cost,
    })
}

/// Pour dimensions in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyMixInput {
    pub height: f64,
    pub width: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyMixEstimate {
    pub volume_m3: f64,
    pub volume_yd3: f64,
    pub rate_per_m3: Decimal,
    pub total_cost: Decimal,
}

pub fn ready_mix(
    bundle: &CoefficientBundle,
    input: &ReadyMixInput,
) -> Result<ReadyMixEstimate, ValidationError> {
    let volume = require_positive("height", input.height)?
        * require_positive("width", input.width)?
        * require_positive("depth", input.depth)?;

    Ok(ReadyMixEstimate {
        volume_m3: volume,
        volume_yd3: volume * CUBIC_METERS_TO_CUBIC_YARDS,
        rate_per_m3: to_currency(bundle.ready_mix_price),
        total_cost: to_currency(volume * bundle.ready_mix_price),
    })
}
