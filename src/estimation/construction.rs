//! Construction cost by quality tier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::to_currency;
use crate::error::{ValidationError, require_positive};
use crate::pricing::{PricingTables, QualityTier};

/// Plot dimensions (feet) and build quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionInput {
    pub plot_length: f64,
    pub plot_breadth: f64,
    pub num_floors: u32,
    pub quality: QualityTier,
}

impl ConstructionInput {
    pub fn new(plot_length: f64, plot_breadth: f64, num_floors: u32, quality: QualityTier) -> Self {
        Self {
            plot_length,
            plot_breadth,
            num_floors,
            quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionCost {
    pub plot_area: f64,
    pub total_area: f64,
    pub num_floors: u32,
    pub quality: QualityTier,
    pub rate_per_sqft: Decimal,
    pub total_cost: Decimal,
    pub material_cost: Decimal,
    pub labor_cost: Decimal,
    pub cost_per_sqft: Decimal,
}

/// Cost of building `plot_length × plot_breadth` on every floor.
pub fn construction_cost(
    tables: &PricingTables,
    input: &ConstructionInput,
) -> Result<ConstructionCost, ValidationError> {
    let length = require_positive("plot_length", input.plot_length)?;
    let breadth = require_positive("plot_breadth", input.plot_breadth)?;
    if input.num_floors == 0 {
        return Err(ValidationError::NonPositive { field: "num_floors" });
    }

    let plot_area = length * breadth;
    let total_area = plot_area * f64::from(input.num_floors);
    Ok(price_area(tables, plot_area, total_area, input.num_floors, input.quality))
}

/// Cost for an already known built-up area.
pub fn construction_cost_for_area(
    tables: &PricingTables,
    total_area: f64,
    quality: QualityTier,
) -> Result<ConstructionCost, ValidationError> {
    let area = require_positive("total_area", total_area)?;
    Ok(price_area(tables, area, area, 1, quality))
}

fn price_area(
    tables: &PricingTables,
    plot_area: f64,
    total_area: f64,
    num_floors: u32,
    quality: QualityTier,
) -> ConstructionCost {
    let rate = tables.tier_rates.rate(quality);
    let cost = total_area * rate;

    let total_cost = to_currency(cost);
    let material_cost = to_currency(cost * tables.material_share);
    // Labor takes the remainder so the split always adds up to the total.
    let labor_cost = total_cost - material_cost;

    tracing::debug!(total_area, %quality, %total_cost, "Priced construction");

    ConstructionCost {
        plot_area,
        total_area,
        num_floors,
        quality,
        rate_per_sqft: to_currency(rate),
        total_cost,
        material_cost,
        labor_cost,
        cost_per_sqft: to_currency(cost / total_area),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_standard_house() {
        let tables = PricingTables::reference();
        let input = ConstructionInput::new(30.0, 40.0, 2, QualityTier::Standard);
        let cost = construction_cost(&tables, &input).unwrap();

        assert_eq!(cost.plot_area, 1200.0);
        assert_eq!(cost.total_area, 2400.0);
        assert_eq!(cost.total_cost, dec!(3600000));
        assert_eq!(cost.material_cost, dec!(2520000));
        assert_eq!(cost.labor_cost, dec!(1080000));
        assert_eq!(cost.cost_per_sqft, dec!(1500));
    }

    #[test]
    fn test_zero_floors_rejected() {
        let tables = PricingTables::reference();
        let input = ConstructionInput::new(30.0, 40.0, 0, QualityTier::Luxury);
        assert_eq!(
            construction_cost(&tables, &input),
            Err(ValidationError::NonPositive { field: "num_floors" })
        );
    }

    #[test]
    fn test_non_positive_dimensions_rejected() {
        let tables = PricingTables::reference();
        let input = ConstructionInput::new(0.0, 40.0, 1, QualityTier::Normal);
        assert!(construction_cost(&tables, &input).is_err());
        assert!(construction_cost_for_area(&tables, -10.0, QualityTier::Normal).is_err());
    }

    #[test]
    fn test_direct_area() {
        let tables = PricingTables::reference();
        let cost = construction_cost_for_area(&tables, 1000.0, QualityTier::HighEnd).unwrap();
        assert_eq!(cost.total_cost, dec!(2000000));
        assert_eq!(cost.num_floors, 1);
    }

    proptest! {
        #[test]
        fn prop_split_and_rate_consistent(
            length in 1.0f64..200.0,
            breadth in 1.0f64..200.0,
            floors in 1u32..6,
            tier_idx in 0usize..4,
        ) {
            let tables = PricingTables::reference();
            let quality = QualityTier::ALL[tier_idx];
            let input = ConstructionInput::new(length, breadth, floors, quality);
            let cost = construction_cost(&tables, &input).unwrap();

            prop_assert_eq!(cost.material_cost + cost.labor_cost, cost.total_cost);

            let per_sqft = cost.total_cost.to_f64().unwrap() / cost.total_area;
            prop_assert_eq!(cost.cost_per_sqft, to_currency(per_sqft));
        }
    }
}
