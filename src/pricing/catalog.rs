//! Material price catalog, labor rates and consumption ratios.
//!
//! These rows live in the database and are served through `/api/pricing`.
//! [`CatalogSeed::reference`] is inserted on first start.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A priced material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPrice {
    pub id: i64,
    pub material_name: String,
    pub unit: String,
    pub price: Decimal,
    pub quality: String,
}

/// A material to add to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub material_name: String,
    pub unit: String,
    pub price: Decimal,
    #[serde(default = "default_quality")]
    pub quality: String,
}

/// Partial update of a material row. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl MaterialPatch {
    pub fn is_empty(&self) -> bool {
        self.material_name.is_none()
            && self.unit.is_none()
            && self.price.is_none()
            && self.quality.is_none()
    }

    pub fn apply(&self, material: &mut MaterialPrice) {
        if let Some(name) = &self.material_name {
            material.material_name = name.clone();
        }
        if let Some(unit) = &self.unit {
            material.unit = unit.clone();
        }
        if let Some(price) = self.price {
            material.price = price;
        }
        if let Some(quality) = &self.quality {
            material.quality = quality.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborRate {
    pub id: i64,
    pub labor_type: String,
    pub rate: Decimal,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLaborRate {
    pub labor_type: String,
    pub rate: Decimal,
    #[serde(default = "default_labor_unit")]
    pub unit: String,
}

/// Material consumed per sq.ft of built-up area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRatio {
    pub id: i64,
    pub material_name: String,
    pub ratio_per_sqft: Decimal,
    pub unit: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConsumptionRatio {
    pub material_name: String,
    pub ratio_per_sqft: Decimal,
    pub unit: String,
    pub category: String,
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_labor_unit() -> String {
    "per day".to_string()
}

/// Catalog name of the paint price for a paint type (`Interior`/`Exterior`).
pub fn paint_material_name(paint_type: &str) -> String {
    let mut chars = paint_type.trim().chars();
    let kind = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => "Interior".to_string(),
    };
    format!("Paint ({})", kind)
}

pub const BRICKS_MATERIAL: &str = "Bricks";

/// Initial catalog contents.
#[derive(Debug, Clone)]
pub struct CatalogSeed {
    pub materials: Vec<NewMaterial>,
    pub labor_rates: Vec<NewLaborRate>,
    pub consumption_ratios: Vec<NewConsumptionRatio>,
}

impl CatalogSeed {
    pub fn reference() -> Self {
        let material = |name: &str, unit: &str, price: Decimal, quality: &str| NewMaterial {
            material_name: name.to_string(),
            unit: unit.to_string(),
            price,
            quality: quality.to_string(),
        };
        let labor = |labor_type: &str, rate: Decimal| NewLaborRate {
            labor_type: labor_type.to_string(),
            rate,
            unit: default_labor_unit(),
        };
        let ratio = |name: &str, ratio: Decimal, unit: &str, category: &str| NewConsumptionRatio {
            material_name: name.to_string(),
            ratio_per_sqft: ratio,
            unit: unit.to_string(),
            category: category.to_string(),
        };

        Self {
            materials: vec![
                material("Cement", "bag", dec!(350), "standard"),
                material("Cement", "bag", dec!(420), "premium"),
                material("Sand", "ton", dec!(1200), "standard"),
                material("Aggregate", "ton", dec!(1500), "standard"),
                material("Steel (TMT)", "kg", dec!(65), "standard"),
                material("Steel (TMT)", "kg", dec!(75), "premium"),
                material(BRICKS_MATERIAL, "piece", dec!(8), "standard"),
                material(BRICKS_MATERIAL, "piece", dec!(12), "premium"),
                material("Paint (Interior)", "liter", dec!(350), "standard"),
                material("Paint (Exterior)", "liter", dec!(450), "standard"),
                material("Tiles (Floor)", "sqft", dec!(45), "standard"),
                material("Tiles (Floor)", "sqft", dec!(85), "premium"),
            ],
            labor_rates: vec![
                labor("Mason", dec!(800)),
                labor("Helper", dec!(500)),
                labor("Carpenter", dec!(850)),
                labor("Electrician", dec!(900)),
                labor("Plumber", dec!(850)),
                labor("Painter", dec!(700)),
            ],
            consumption_ratios: vec![
                ratio("Cement", dec!(0.4), "bag", "construction"),
                ratio("Sand", dec!(0.045), "ton", "construction"),
                ratio("Aggregate", dec!(0.09), "ton", "construction"),
                ratio("Steel (TMT)", dec!(4.5), "kg", "construction"),
                ratio(BRICKS_MATERIAL, dec!(8), "piece", "masonry"),
                ratio("Paint (Interior)", dec!(0.15), "liter", "finishing"),
                ratio("Tiles (Floor)", dec!(1.1), "sqft", "finishing"),
            ],
        }
    }
}
