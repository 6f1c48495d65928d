//! Pricing reference data.
//!
//! - [`PricingTables`]: one versioned value holding every coefficient the
//!   estimation modes read (regional bundles, tier rates, grade mixes,
//!   per-mode constants).
//! - [`PricingResolver`]: `(state, city)` lookup with default-city fallback.
//! - [`catalog`]: material prices, labor rates and consumption ratios served
//!   by the API.

pub mod catalog;
mod resolver;
mod tables;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use resolver::{PricingResolver, normalize_key};
pub use tables::{
    CoefficientBundle, ConcreteYield, DetailedMaterialRates, DetailedRates, GradeMix, GradeTable,
    LaborShares, LineRate, OpeningSize, PaintRates, PricingTables, RawMaterialBasis, TierRates,
};

/// Construction quality tier. Ordered from cheapest to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityTier {
    Normal,
    Standard,
    HighEnd,
    Luxury,
}

impl Default for QualityTier {
    fn default() -> Self {
        Self::Standard
    }
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Normal, Self::Standard, Self::HighEnd, Self::Luxury];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Standard => "standard",
            Self::HighEnd => "high-end",
            Self::Luxury => "luxury",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "standard" => Ok(Self::Standard),
            "high-end" | "high_end" | "highend" | "high end" => Ok(Self::HighEnd),
            "luxury" => Ok(Self::Luxury),
            _ => Err(format!("Unknown quality tier: {}", s)),
        }
    }
}

/// Concrete grade, named after its characteristic strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConcreteGrade {
    M10,
    M15,
    M20,
    M25,
}

impl Default for ConcreteGrade {
    fn default() -> Self {
        Self::M15
    }
}

impl ConcreteGrade {
    pub const ALL: [ConcreteGrade; 4] = [Self::M10, Self::M15, Self::M20, Self::M25];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M10 => "M10",
            Self::M15 => "M15",
            Self::M20 => "M20",
            Self::M25 => "M25",
        }
    }
}

impl fmt::Display for ConcreteGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcreteGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M10" => Ok(Self::M10),
            "M15" => Ok(Self::M15),
            "M20" => Ok(Self::M20),
            "M25" => Ok(Self::M25),
            _ => Err(format!("Unknown concrete grade: {}", s)),
        }
    }
}
