//! Versioned pricing tables.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ConcreteGrade, QualityTier, normalize_key};
use crate::error::ConfigError;

/// City name every state must define.
pub const DEFAULT_CITY: &str = "default";

/// Regional price coefficients.
///
/// `sand_price` and `aggregate_price` are per kg equivalent; the calculators
/// scale ton quantities by 1000 before applying them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientBundle {
    /// Construction rate per sq.ft.
    pub rate_per_area: f64,
    /// Per 50 kg bag.
    pub cement_price: f64,
    pub sand_price: f64,
    pub aggregate_price: f64,
    /// Per brick.
    pub brick_price: f64,
    /// Per kg.
    pub steel_price: f64,
    /// Ready-mix concrete per m³.
    pub ready_mix_price: f64,
}

impl CoefficientBundle {
    fn coefficients(&self) -> [(&'static str, f64); 7] {
        [
            ("rate_per_area", self.rate_per_area),
            ("cement_price", self.cement_price),
            ("sand_price", self.sand_price),
            ("aggregate_price", self.aggregate_price),
            ("brick_price", self.brick_price),
            ("steel_price", self.steel_price),
            ("ready_mix_price", self.ready_mix_price),
        ]
    }
}

/// Construction rate per sq.ft for each quality tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRates {
    pub normal: f64,
    pub standard: f64,
    pub high_end: f64,
    pub luxury: f64,
}

impl TierRates {
    pub fn rate(&self, tier: QualityTier) -> f64 {
        match tier {
            QualityTier::Normal => self.normal,
            QualityTier::Standard => self.standard,
            QualityTier::HighEnd => self.high_end,
            QualityTier::Luxury => self.luxury,
        }
    }
}

/// Cement : sand : aggregate proportions of a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeMix {
    pub cement: f64,
    pub sand: f64,
    pub aggregate: f64,
    pub strength: String,
}

impl GradeMix {
    fn new(cement: f64, sand: f64, aggregate: f64, strength: &str) -> Self {
        Self {
            cement,
            sand,
            aggregate,
            strength: strength.to_string(),
        }
    }

    pub fn total_parts(&self) -> f64 {
        self.cement + self.sand + self.aggregate
    }

    /// Ratio label such as `1:1.5:3`.
    pub fn ratio_label(&self) -> String {
        format!("{}:{}:{}", self.cement, self.sand, self.aggregate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeTable {
    pub m10: GradeMix,
    pub m15: GradeMix,
    pub m20: GradeMix,
    pub m25: GradeMix,
}

impl GradeTable {
    pub fn mix(&self, grade: ConcreteGrade) -> &GradeMix {
        match grade {
            ConcreteGrade::M10 => &self.m10,
            ConcreteGrade::M15 => &self.m15,
            ConcreteGrade::M20 => &self.m20,
            ConcreteGrade::M25 => &self.m25,
        }
    }
}

/// Material yield of one m³ of the reference mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteYield {
    pub cement_bags_per_m3: f64,
    pub sand_tons_per_m3: f64,
    pub aggregate_tons_per_m3: f64,
    pub reference_mix: GradeMix,
}

/// Raw material quantities per `per_area` sq.ft of built-up area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialBasis {
    pub per_area: f64,
    pub cement_bags: f64,
    pub sand_tons: f64,
    pub aggregate_tons: f64,
    pub bricks: f64,
    pub steel_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningSize {
    pub width: f64,
    pub height: f64,
}

impl OpeningSize {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintRates {
    /// Sq.ft covered by one litre per coat.
    pub coverage_per_litre: f64,
    pub price_per_litre: f64,
    pub labor_per_sqft: f64,
    pub default_coats: u32,
    pub door: OpeningSize,
    pub window: OpeningSize,
}

/// Quantity per `per_area` sq.ft and unit price of one detailed material line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineRate {
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedMaterialRates {
    pub steel: LineRate,
    pub cement: LineRate,
    pub bricks: LineRate,
    pub stone: LineRate,
    pub sand: LineRate,
    pub water: LineRate,
}

/// Labor items as percentages of the quality-rate total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborShares {
    pub excavation: f64,
    pub labor: f64,
    pub design: f64,
    pub doors_windows: f64,
    pub shuttering: f64,
    pub plumbing: f64,
    pub electrical: f64,
    pub flooring: f64,
    pub painting: f64,
    pub boundary: f64,
    pub other: f64,
}

impl LaborShares {
    fn values(&self) -> [f64; 11] {
        [
            self.excavation,
            self.labor,
            self.design,
            self.doors_windows,
            self.shuttering,
            self.plumbing,
            self.electrical,
            self.flooring,
            self.painting,
            self.boundary,
            self.other,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedRates {
    pub per_area: f64,
    pub materials: DetailedMaterialRates,
    pub labor_percent: LaborShares,
}

/// Every coefficient the estimation modes depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTables {
    pub version: u32,
    /// State used when a calculator request names no region.
    pub default_state: String,
    /// Share of the construction cost attributed to materials.
    pub material_share: f64,
    pub regions: BTreeMap<String, BTreeMap<String, CoefficientBundle>>,
    pub tier_rates: TierRates,
    pub grades: GradeTable,
    pub concrete_yield: ConcreteYield,
    pub raw_materials: RawMaterialBasis,
    pub paint: PaintRates,
    pub detailed: DetailedRates,
}

impl PricingTables {
    /// The built-in reference tables.
    pub fn reference() -> Self {
        let mut regions = BTreeMap::new();
        regions.insert(
            "tamil-nadu".to_string(),
            cities(&[
                ("chennai", [1800.0, 400.0, 50.0, 60.0, 8.0, 65.0, 5500.0]),
                ("coimbatore", [1600.0, 380.0, 45.0, 55.0, 7.0, 62.0, 5200.0]),
                ("madurai", [1500.0, 370.0, 42.0, 52.0, 6.5, 60.0, 5000.0]),
                ("kanyakumari", [1450.0, 360.0, 40.0, 50.0, 6.0, 58.0, 4800.0]),
                (DEFAULT_CITY, [1500.0, 370.0, 45.0, 55.0, 7.0, 60.0, 5000.0]),
            ]),
        );
        regions.insert(
            "kerala".to_string(),
            cities(&[
                ("thiruvananthapuram", [1700.0, 390.0, 48.0, 58.0, 7.5, 63.0, 5300.0]),
                ("kochi", [1750.0, 395.0, 49.0, 59.0, 7.8, 64.0, 5400.0]),
                (DEFAULT_CITY, [1700.0, 390.0, 48.0, 58.0, 7.5, 63.0, 5300.0]),
            ]),
        );
        regions.insert(
            "karnataka".to_string(),
            cities(&[
                ("bangalore", [1900.0, 410.0, 52.0, 62.0, 8.5, 67.0, 5600.0]),
                ("mysore", [1550.0, 375.0, 46.0, 56.0, 7.2, 61.0, 5100.0]),
                (DEFAULT_CITY, [1700.0, 390.0, 48.0, 58.0, 7.5, 63.0, 5300.0]),
            ]),
        );

        Self {
            version: 1,
            default_state: "tamil-nadu".to_string(),
            material_share: 0.7,
            regions,
            tier_rates: TierRates {
                normal: 1200.0,
                standard: 1500.0,
                high_end: 2000.0,
                luxury: 2500.0,
            },
            grades: GradeTable {
                m10: GradeMix::new(1.0, 3.0, 6.0, "Low"),
                m15: GradeMix::new(1.0, 2.0, 4.0, "Medium"),
                m20: GradeMix::new(1.0, 1.5, 3.0, "High"),
                m25: GradeMix::new(1.0, 1.0, 2.0, "Very High"),
            },
            concrete_yield: ConcreteYield {
                cement_bags_per_m3: 6.5,
                sand_tons_per_m3: 0.5,
                aggregate_tons_per_m3: 1.0,
                reference_mix: GradeMix::new(1.0, 2.0, 4.0, "Medium"),
            },
            raw_materials: RawMaterialBasis {
                per_area: 100.0,
                cement_bags: 8.0,
                sand_tons: 1.2,
                aggregate_tons: 1.5,
                bricks: 800.0,
                steel_kg: 40.0,
            },
            paint: PaintRates {
                coverage_per_litre: 10.0,
                price_per_litre: 350.0,
                labor_per_sqft: 250.0,
                default_coats: 2,
                door: OpeningSize {
                    width: 7.0,
                    height: 3.0,
                },
                window: OpeningSize {
                    width: 4.0,
                    height: 3.0,
                },
            },
            detailed: DetailedRates {
                per_area: 1000.0,
                materials: DetailedMaterialRates {
                    steel: LineRate { quantity: 4000.0, price: 65.0 },
                    cement: LineRate { quantity: 400.0, price: 400.0 },
                    bricks: LineRate { quantity: 8000.0, price: 8.0 },
                    stone: LineRate { quantity: 15.0, price: 2500.0 },
                    sand: LineRate { quantity: 12.0, price: 50.0 },
                    water: LineRate { quantity: 5000.0, price: 0.5 },
                },
                labor_percent: LaborShares {
                    excavation: 5.0,
                    labor: 25.0,
                    design: 3.0,
                    doors_windows: 8.0,
                    shuttering: 6.0,
                    plumbing: 7.0,
                    electrical: 8.0,
                    flooring: 10.0,
                    painting: 5.0,
                    boundary: 4.0,
                    other: 2.0,
                },
            },
        }
    }

    /// Parse tables from TOML. Region keys are normalized and the result validated.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let mut tables: PricingTables =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;

        tables.default_state = normalize_key(&tables.default_state);
        let mut regions = BTreeMap::new();
        for (state, cities) in std::mem::take(&mut tables.regions) {
            let state_key = normalize_key(&state);
            let mut normalized = BTreeMap::new();
            for (city, bundle) in cities {
                let city_key = normalize_key(&city);
                if normalized.insert(city_key.clone(), bundle).is_some() {
                    return Err(ConfigError::InvalidTables(format!(
                        "city '{}' is defined twice in state '{}'",
                        city_key, state_key
                    )));
                }
            }
            if regions.insert(state_key.clone(), normalized).is_some() {
                return Err(ConfigError::InvalidTables(format!(
                    "state '{}' is defined twice",
                    state_key
                )));
            }
        }
        tables.regions = regions;

        tables.validate()?;
        Ok(tables)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check the structural invariants every calculator relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidTables(msg));

        if self.version == 0 {
            return invalid("version must be at least 1".into());
        }
        if self.regions.is_empty() {
            return invalid("no regions defined".into());
        }
        if !self.regions.contains_key(&self.default_state) {
            return invalid(format!("default state '{}' is not defined", self.default_state));
        }
        for (state, cities) in &self.regions {
            if !cities.contains_key(DEFAULT_CITY) {
                return invalid(format!("state '{}' has no '{}' city", state, DEFAULT_CITY));
            }
            for (city, bundle) in cities {
                for (name, value) in bundle.coefficients() {
                    if !positive(value) {
                        return invalid(format!("{}/{}: {} must be positive", state, city, name));
                    }
                }
            }
        }

        let rates: Vec<f64> = QualityTier::ALL
            .iter()
            .map(|tier| self.tier_rates.rate(*tier))
            .collect();
        if !positive(rates[0]) || rates.windows(2).any(|pair| pair[0] >= pair[1]) {
            return invalid("tier rates must be positive and strictly increasing".into());
        }

        for grade in ConcreteGrade::ALL {
            let mix = self.grades.mix(grade);
            if ![mix.cement, mix.sand, mix.aggregate].into_iter().all(positive) {
                return invalid(format!("grade {} has a non-positive ratio", grade));
            }
        }
        // Each grade must be richer in cement than the one below it.
        for pair in ConcreteGrade::ALL.windows(2) {
            let (lower, higher) = (self.grades.mix(pair[0]), self.grades.mix(pair[1]));
            if higher.sand / higher.cement >= lower.sand / lower.cement
                || higher.aggregate / higher.cement >= lower.aggregate / lower.cement
            {
                return invalid(format!(
                    "grade {} must have lower sand and aggregate ratios than {}",
                    pair[1], pair[0]
                ));
            }
        }

        let y = &self.concrete_yield;
        let r = &y.reference_mix;
        if ![
            r.cement,
            r.sand,
            r.aggregate,
            y.cement_bags_per_m3,
            y.sand_tons_per_m3,
            y.aggregate_tons_per_m3,
        ]
        .into_iter()
        .all(positive)
        {
            return invalid("concrete yield values must be positive".into());
        }

        if !(self.material_share > 0.0 && self.material_share < 1.0) {
            return invalid("material_share must be between 0 and 1".into());
        }

        let raw = &self.raw_materials;
        if ![
            raw.per_area,
            raw.cement_bags,
            raw.sand_tons,
            raw.aggregate_tons,
            raw.bricks,
            raw.steel_kg,
        ]
        .into_iter()
        .all(positive)
        {
            return invalid("raw material basis values must be positive".into());
        }

        let paint = &self.paint;
        if ![
            paint.coverage_per_litre,
            paint.price_per_litre,
            paint.labor_per_sqft,
            paint.door.width,
            paint.door.height,
            paint.window.width,
            paint.window.height,
        ]
        .into_iter()
        .all(positive)
            || paint.default_coats == 0
        {
            return invalid("paint rates must be positive".into());
        }

        let detailed = &self.detailed;
        let m = &detailed.materials;
        let lines = [m.steel, m.cement, m.bricks, m.stone, m.sand, m.water];
        if !positive(detailed.per_area)
            || lines
                .iter()
                .any(|line| !(line.quantity >= 0.0 && line.price >= 0.0))
            || detailed
                .labor_percent
                .values()
                .iter()
                .any(|pct| !(0.0..=100.0).contains(pct))
        {
            return invalid("detailed breakdown rates are out of range".into());
        }

        Ok(())
    }
}

impl Default for PricingTables {
    fn default() -> Self {
        Self::reference()
    }
}

fn cities(rows: &[(&str, [f64; 7])]) -> BTreeMap<String, CoefficientBundle> {
    rows.iter()
        .map(|(city, [rate, cement, sand, aggregate, bricks, steel, rmc])| {
            (
                city.to_string(),
                CoefficientBundle {
                    rate_per_area: *rate,
                    cement_price: *cement,
                    sand_price: *sand,
                    aggregate_price: *aggregate,
                    brick_price: *bricks,
                    steel_price: *steel,
                    ready_mix_price: *rmc,
                },
            )
        })
        .collect()
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
