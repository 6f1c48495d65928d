//! Quantity and cost derivation.
//!
//! Every mode is a pure function of the pricing tables (or a resolved
//! regional bundle) and a validated input:
//!
//! - construction cost by quality tier
//! - concrete slab quantities by grade
//! - raw material quantities per built-up area
//! - wall paint (with openings) or paint by direct area
//! - ready-mix concrete volume
//! - the detailed material/labor breakdown ([`DetailedContext`])
//! - bricks for a wall
//!
//! Arithmetic runs in `f64`; currency leaves the pipeline as a [`Decimal`]
//! rounded to two places.

mod concrete;
mod construction;
mod detailed;
mod materials;
mod paint;

use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub use concrete::{
    CUBIC_METERS_TO_CUBIC_YARDS, FEET_TO_METERS, LengthUnit, ReadyMixEstimate, ReadyMixInput,
    SlabEstimate, SlabInput, concrete_slab, ready_mix,
};
pub use construction::{
    ConstructionCost, ConstructionInput, construction_cost, construction_cost_for_area,
};
pub use detailed::{DetailedBreakdown, DetailedContext, LaborItem, LaborLine, MaterialItem, MaterialLine, PlotSpec};
pub use materials::{
    AreaUnit, BrickEstimate, BrickInput, RawMaterialEstimate, RawMaterialInput, SQ_YARD_TO_SQ_FEET,
    bricks, raw_materials,
};
pub use paint::{AreaPaintInput, PaintEstimate, WallPaintInput, area_paint, parse_opening, wall_paint};

pub use crate::error::ValidationError;

use crate::pricing::{CoefficientBundle, PricingResolver, PricingTables, QualityTier};

/// Round a computed amount to currency precision (two places, half away from zero).
pub fn to_currency(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Optional region selector carried by calculator requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionRef {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl RegionRef {
    pub fn new(state: impl Into<String>, city: Option<String>) -> Self {
        Self {
            state: Some(state.into()),
            city,
        }
    }
}

/// Runs the estimation modes against one set of pricing tables.
#[derive(Debug, Clone)]
pub struct Estimator {
    resolver: PricingResolver,
}

impl Estimator {
    pub fn new(tables: Arc<PricingTables>) -> Self {
        Self {
            resolver: PricingResolver::new(tables),
        }
    }

    pub fn tables(&self) -> &PricingTables {
        self.resolver.tables()
    }

    pub fn resolver(&self) -> &PricingResolver {
        &self.resolver
    }

    /// Bundle for a region selector, defaulting to the tables' default state.
    pub fn bundle(&self, region: &RegionRef) -> Result<&CoefficientBundle, ValidationError> {
        self.resolver
            .resolve_or_default(region.state.as_deref(), region.city.as_deref())
    }

    pub fn construction_cost(
        &self,
        input: &ConstructionInput,
    ) -> Result<ConstructionCost, ValidationError> {
        construction_cost(self.tables(), input)
    }

    pub fn concrete_slab(
        &self,
        input: &SlabInput,
        region: &RegionRef,
    ) -> Result<SlabEstimate, ValidationError> {
        concrete_slab(self.tables(), self.bundle(region)?, input)
    }

    pub fn raw_materials(
        &self,
        input: &RawMaterialInput,
        region: &RegionRef,
    ) -> Result<RawMaterialEstimate, ValidationError> {
        raw_materials(&self.tables().raw_materials, self.bundle(region)?, input)
    }

    pub fn ready_mix(
        &self,
        input: &ReadyMixInput,
        region: &RegionRef,
    ) -> Result<ReadyMixEstimate, ValidationError> {
        ready_mix(self.bundle(region)?, input)
    }

    pub fn wall_paint(&self, input: &WallPaintInput) -> Result<PaintEstimate, ValidationError> {
        wall_paint(&self.tables().paint, input)
    }

    pub fn area_paint(
        &self,
        input: &AreaPaintInput,
        price_per_litre: Option<f64>,
    ) -> Result<PaintEstimate, ValidationError> {
        area_paint(&self.tables().paint, input, price_per_litre)
    }

    /// Bricks priced at `brick_price`, or the region's brick price when `None`.
    pub fn bricks(
        &self,
        input: &BrickInput,
        brick_price: Option<f64>,
        region: &RegionRef,
    ) -> Result<BrickEstimate, ValidationError> {
        let price = match brick_price {
            Some(price) => price,
            None => self.bundle(region)?.brick_price,
        };
        bricks(input, price)
    }

    /// A detailed breakdown context with every line item auto-filled.
    pub fn detailed(
        &self,
        plot: &PlotSpec,
        quality: QualityTier,
    ) -> Result<DetailedContext, ValidationError> {
        DetailedContext::new(self.tables(), plot, quality)
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(Arc::new(PricingTables::reference()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_to_currency_rounding() {
        assert_eq!(to_currency(1234.5678), dec!(1234.57));
        assert_eq!(to_currency(0.125), dec!(0.13));
        assert_eq!(to_currency(0.1 + 0.2), dec!(0.30));
        assert_eq!(to_currency(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn test_region_selection() {
        let estimator = Estimator::default();
        let chennai = RegionRef::new("Tamil Nadu", Some("Chennai".into()));
        assert_eq!(estimator.bundle(&chennai).unwrap().ready_mix_price, 5500.0);

        let unknown = RegionRef::new("goa", None);
        assert!(matches!(
            estimator.bundle(&unknown),
            Err(ValidationError::UnknownRegion { .. })
        ));
    }

    #[test]
    fn test_bricks_use_region_price_when_unpriced() {
        let estimator = Estimator::default();
        let input = BrickInput {
            wall_length: 10.0,
            wall_height: 10.0,
            wall_thickness: 0.23,
        };
        let region = RegionRef::new("karnataka", Some("bangalore".into()));
        let estimate = estimator.bricks(&input, None, &region).unwrap();
        // 100 sq.ft * 8 * 1.1 = 880 bricks at 8.5
        assert_eq!(estimate.total_cost, dec!(7480.00));
    }
}
