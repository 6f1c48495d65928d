//! Detailed material and labor breakdown.
//!
//! A [`DetailedContext`] carries the plot area, the quality-rate total and
//! every line item. Line items are auto-filled from the tables and can then
//! be overridden one by one; [`DetailedContext::recompute`] always prices the
//! current field values.
//!
//! The quality-rate total and the line-item grand total are computed
//! independently and reported side by side.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::to_currency;
use crate::error::{ValidationError, require_positive};
use crate::pricing::{DetailedMaterialRates, DetailedRates, LaborShares, LineRate, PricingTables, QualityTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialItem {
    Steel,
    Cement,
    Bricks,
    Stone,
    Sand,
    Water,
}

impl MaterialItem {
    pub const ALL: [MaterialItem; 6] = [
        Self::Steel,
        Self::Cement,
        Self::Bricks,
        Self::Stone,
        Self::Sand,
        Self::Water,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Steel => "steel",
            Self::Cement => "cement",
            Self::Bricks => "bricks",
            Self::Stone => "stone",
            Self::Sand => "sand",
            Self::Water => "water",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Steel => "Steel",
            Self::Cement => "Cement",
            Self::Bricks => "Bricks",
            Self::Stone => "Stone aggregate",
            Self::Sand => "Sand",
            Self::Water => "Water",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Steel => "kg",
            Self::Cement => "bag",
            Self::Bricks => "piece",
            Self::Stone | Self::Sand => "ton",
            Self::Water => "litre",
        }
    }

    fn rate(&self, rates: &DetailedMaterialRates) -> LineRate {
        match self {
            Self::Steel => rates.steel,
            Self::Cement => rates.cement,
            Self::Bricks => rates.bricks,
            Self::Stone => rates.stone,
            Self::Sand => rates.sand,
            Self::Water => rates.water,
        }
    }
}

impl fmt::Display for MaterialItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == key)
            .ok_or_else(|| format!("Unknown material: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaborItem {
    Excavation,
    Labor,
    Design,
    DoorsWindows,
    Shuttering,
    Plumbing,
    Electrical,
    Flooring,
    Painting,
    Boundary,
    Other,
}

impl LaborItem {
    pub const ALL: [LaborItem; 11] = [
        Self::Excavation,
        Self::Labor,
        Self::Design,
        Self::DoorsWindows,
        Self::Shuttering,
        Self::Plumbing,
        Self::Electrical,
        Self::Flooring,
        Self::Painting,
        Self::Boundary,
        Self::Other,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excavation => "excavation",
            Self::Labor => "labor",
            Self::Design => "design",
            Self::DoorsWindows => "doors_windows",
            Self::Shuttering => "shuttering",
            Self::Plumbing => "plumbing",
            Self::Electrical => "electrical",
            Self::Flooring => "flooring",
            Self::Painting => "painting",
            Self::Boundary => "boundary",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excavation => "Excavation & foundation",
            Self::Labor => "Labor",
            Self::Design => "Architect & design",
            Self::DoorsWindows => "Doors & windows",
            Self::Shuttering => "Shuttering",
            Self::Plumbing => "Plumbing",
            Self::Electrical => "Electrical",
            Self::Flooring => "Flooring & tiling",
            Self::Painting => "Painting",
            Self::Boundary => "Compound wall",
            Self::Other => "Miscellaneous",
        }
    }

    fn percent(&self, shares: &LaborShares) -> f64 {
        match self {
            Self::Excavation => shares.excavation,
            Self::Labor => shares.labor,
            Self::Design => shares.design,
            Self::DoorsWindows => shares.doors_windows,
            Self::Shuttering => shares.shuttering,
            Self::Plumbing => shares.plumbing,
            Self::Electrical => shares.electrical,
            Self::Flooring => shares.flooring,
            Self::Painting => shares.painting,
            Self::Boundary => shares.boundary,
            Self::Other => shares.other,
        }
    }
}

impl fmt::Display for LaborItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaborItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == key)
            .ok_or_else(|| format!("Unknown labor item: {}", s))
    }
}

/// Plot dimensions in feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub width: f64,
    pub length: f64,
    pub floors: u32,
}

impl PlotSpec {
    pub fn area(&self) -> Result<f64, ValidationError> {
        let width = require_positive("width", self.width)?;
        let length = require_positive("length", self.length)?;
        if self.floors == 0 {
            return Err(ValidationError::NonPositive { field: "floors" });
        }
        Ok(width * length * f64::from(self.floors))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub item: MaterialItem,
    pub label: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborLine {
    pub item: LaborItem,
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedBreakdown {
    pub area: f64,
    pub quality: QualityTier,
    pub quality_rate: Decimal,
    /// `area × quality_rate`, independent of the line items.
    pub quality_total: Decimal,
    pub materials: Vec<MaterialLine>,
    pub labor: Vec<LaborLine>,
    pub material_total: Decimal,
    pub labor_total: Decimal,
    pub grand_total: Decimal,
}

/// Editable state of a detailed breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedContext {
    rates: DetailedRates,
    quality: QualityTier,
    quality_rate: f64,
    area: f64,
    quantities: [f64; 6],
    prices: [f64; 6],
    labor: [f64; 11],
}

impl DetailedContext {
    /// Build a context for a plot and auto-fill every line item.
    pub fn new(
        tables: &PricingTables,
        plot: &PlotSpec,
        quality: QualityTier,
    ) -> Result<Self, ValidationError> {
        let area = plot.area()?;
        let mut ctx = Self {
            rates: tables.detailed.clone(),
            quality,
            quality_rate: tables.tier_rates.rate(quality),
            area,
            quantities: [0.0; 6],
            prices: [0.0; 6],
            labor: [0.0; 11],
        };
        ctx.auto_fill();
        Ok(ctx)
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn quality(&self) -> QualityTier {
        self.quality
    }

    pub fn quality_total(&self) -> f64 {
        self.area * self.quality_rate
    }

    /// Reset every line item to the values derived from area and quality.
    pub fn auto_fill(&mut self) {
        let scale = self.area / self.rates.per_area;
        for item in MaterialItem::ALL {
            let rate = item.rate(&self.rates.materials);
            self.quantities[item.index()] = (rate.quantity * scale).round();
            self.prices[item.index()] = rate.price;
        }

        let total = self.quality_total();
        for item in LaborItem::ALL {
            let percent = item.percent(&self.rates.labor_percent);
            self.labor[item.index()] = (total * percent / 100.0).round();
        }
    }

    pub fn material_quantity(&self, item: MaterialItem) -> f64 {
        self.quantities[item.index()]
    }

    pub fn material_price(&self, item: MaterialItem) -> f64 {
        self.prices[item.index()]
    }

    pub fn labor_amount(&self, item: LaborItem) -> f64 {
        self.labor[item.index()]
    }

    pub fn set_material_quantity(
        &mut self,
        item: MaterialItem,
        quantity: f64,
    ) -> Result<(), ValidationError> {
        self.quantities[item.index()] = non_negative(item.as_str(), quantity)?;
        Ok(())
    }

    pub fn set_material_price(&mut self, item: MaterialItem, price: f64) -> Result<(), ValidationError> {
        self.prices[item.index()] = non_negative(item.as_str(), price)?;
        Ok(())
    }

    pub fn set_labor_amount(&mut self, item: LaborItem, amount: f64) -> Result<(), ValidationError> {
        self.labor[item.index()] = non_negative(item.as_str(), amount)?;
        Ok(())
    }

    /// Set one field by name: `<material>` or `<material>.quantity`,
    /// `<material>.price`, or a labor item.
    pub fn apply_override(&mut self, key: &str, value: f64) -> Result<(), ValidationError> {
        let (name, field) = match key.trim().split_once('.') {
            Some((name, field)) => (name, Some(field.trim().to_lowercase())),
            None => (key, None),
        };
        if let Ok(item) = name.parse::<MaterialItem>() {
            return match field.as_deref() {
                None | Some("quantity") | Some("qty") => self.set_material_quantity(item, value),
                Some("price") => self.set_material_price(item, value),
                Some(other) => Err(ValidationError::invalid(
                    "override",
                    format!("unknown material field '{}'", other),
                )),
            };
        }
        match (name.parse::<LaborItem>(), field) {
            (Ok(item), None) => self.set_labor_amount(item, value),
            _ => Err(ValidationError::invalid(
                "override",
                format!("unknown line item '{}'", key.trim()),
            )),
        }
    }

    /// Price the current field values.
    pub fn recompute(&self) -> DetailedBreakdown {
        let materials: Vec<MaterialLine> = MaterialItem::ALL
            .into_iter()
            .map(|item| {
                let quantity = self.material_quantity(item);
                let price = self.material_price(item);
                MaterialLine {
                    item,
                    label: item.label().to_string(),
                    unit: item.unit().to_string(),
                    quantity,
                    unit_price: to_currency(price),
                    amount: to_currency(quantity * price),
                }
            })
            .collect();

        let labor: Vec<LaborLine> = LaborItem::ALL
            .into_iter()
            .map(|item| LaborLine {
                item,
                label: item.label().to_string(),
                amount: to_currency(self.labor_amount(item)),
            })
            .collect();

        let material_total: Decimal = materials.iter().map(|line| line.amount).sum();
        let labor_total: Decimal = labor.iter().map(|line| line.amount).sum();

        DetailedBreakdown {
            area: self.area,
            quality: self.quality,
            quality_rate: to_currency(self.quality_rate),
            quality_total: to_currency(self.quality_total()),
            materials,
            labor,
            material_total,
            labor_total,
            grand_total: material_total + labor_total,
        }
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::invalid(field, "must be a non-negative number"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    fn context(width: f64, length: f64, floors: u32, quality: QualityTier) -> DetailedContext {
        DetailedContext::new(
            &PricingTables::reference(),
            &PlotSpec {
                width,
                length,
                floors,
            },
            quality,
        )
        .unwrap()
    }

    #[test]
    fn test_auto_fill_for_thousand_sqft() {
        let ctx = context(25.0, 40.0, 1, QualityTier::Standard);
        assert_eq!(ctx.area(), 1000.0);
        assert_eq!(ctx.material_quantity(MaterialItem::Steel), 4000.0);
        assert_eq!(ctx.material_quantity(MaterialItem::Cement), 400.0);
        assert_eq!(ctx.material_quantity(MaterialItem::Water), 5000.0);
        assert_eq!(ctx.labor_amount(LaborItem::Labor), 375000.0);
        assert_eq!(ctx.labor_amount(LaborItem::Other), 30000.0);

        let breakdown = ctx.recompute();
        assert_eq!(breakdown.quality_total, dec!(1500000));
        // 260000 + 160000 + 64000 + 37500 + 600 + 2500
        assert_eq!(breakdown.material_total, dec!(524600));
        // 83% of the quality total
        assert_eq!(breakdown.labor_total, dec!(1245000));
        assert_eq!(breakdown.grand_total, dec!(1769600));
    }

    #[test]
    fn test_quantities_are_rounded() {
        // 333 sq.ft: steel 1332, stone 4.995 -> 5
        let ctx = context(9.0, 37.0, 1, QualityTier::Normal);
        assert_eq!(ctx.material_quantity(MaterialItem::Steel), 1332.0);
        assert_eq!(ctx.material_quantity(MaterialItem::Stone), 5.0);
        assert_eq!(ctx.material_quantity(MaterialItem::Sand), 4.0);
    }

    #[test]
    fn test_overrides_flow_into_totals() {
        let mut ctx = context(25.0, 40.0, 1, QualityTier::Standard);
        let before = ctx.recompute();

        ctx.set_material_quantity(MaterialItem::Steel, 0.0).unwrap();
        ctx.set_labor_amount(LaborItem::Design, 100.0).unwrap();
        let after = ctx.recompute();

        assert_eq!(after.material_total, before.material_total - dec!(260000));
        assert_eq!(after.labor_total, before.labor_total - dec!(45000) + dec!(100));
        assert_eq!(after.quality_total, before.quality_total);

        ctx.auto_fill();
        assert_eq!(ctx.recompute(), before);
    }

    #[test]
    fn test_negative_override_rejected() {
        let mut ctx = context(25.0, 40.0, 1, QualityTier::Standard);
        assert!(ctx.set_material_price(MaterialItem::Cement, -1.0).is_err());
        assert!(ctx.set_labor_amount(LaborItem::Other, f64::NAN).is_err());
        assert_eq!(ctx.material_price(MaterialItem::Cement), 400.0);
    }

    #[test]
    fn test_named_overrides() {
        let mut ctx = context(25.0, 40.0, 1, QualityTier::Standard);
        ctx.apply_override("steel", 3500.0).unwrap();
        ctx.apply_override("cement.price", 420.0).unwrap();
        ctx.apply_override("doors-windows", 90000.0).unwrap();

        assert_eq!(ctx.material_quantity(MaterialItem::Steel), 3500.0);
        assert_eq!(ctx.material_price(MaterialItem::Cement), 420.0);
        assert_eq!(ctx.labor_amount(LaborItem::DoorsWindows), 90000.0);

        assert!(ctx.apply_override("gold", 1.0).is_err());
        assert!(ctx.apply_override("steel.colour", 1.0).is_err());
        assert!(ctx.apply_override("painting.price", 1.0).is_err());
    }

    #[test]
    fn test_invalid_plot_rejected() {
        let plot = PlotSpec {
            width: 20.0,
            length: 30.0,
            floors: 0,
        };
        assert_eq!(
            DetailedContext::new(&PricingTables::reference(), &plot, QualityTier::Luxury),
            Err(ValidationError::NonPositive { field: "floors" })
        );
    }

    #[test]
    fn test_item_parsing() {
        assert_eq!("Steel".parse::<MaterialItem>(), Ok(MaterialItem::Steel));
        assert_eq!("doors-windows".parse::<LaborItem>(), Ok(LaborItem::DoorsWindows));
        assert!("gold".parse::<MaterialItem>().is_err());
    }

    proptest! {
        #[test]
        fn prop_totals_add_up_and_recompute_is_idempotent(
            width in 5.0f64..120.0,
            length in 5.0f64..120.0,
            floors in 1u32..5,
            tier_idx in 0usize..4,
            steel in proptest::option::of(0.0f64..100000.0),
            painting in proptest::option::of(0.0f64..1000000.0),
        ) {
            let mut ctx = context(width, length, floors, QualityTier::ALL[tier_idx]);
            if let Some(steel) = steel {
                ctx.set_material_quantity(MaterialItem::Steel, steel).unwrap();
            }
            if let Some(painting) = painting {
                ctx.set_labor_amount(LaborItem::Painting, painting).unwrap();
            }

            let first = ctx.recompute();
            prop_assert_eq!(first.material_total + first.labor_total, first.grand_total);
            let line_sum: Decimal = first.materials.iter().map(|l| l.amount).sum::<Decimal>()
                + first.labor.iter().map(|l| l.amount).sum::<Decimal>();
            prop_assert_eq!(line_sum, first.grand_total);
            prop_assert_eq!(ctx.recompute(), first);
        }
    }
}
