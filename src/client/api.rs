//! Request and response types shared between the API server and client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::estimation::{ConstructionCost, DetailedBreakdown, PlotSpec, RegionRef, to_currency};
use crate::pricing::catalog::{ConsumptionRatio, LaborRate, MaterialPrice};

pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";
pub const DEFAULT_MATERIAL_QUALITY: &str = "standard";

// ==================== Auth ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `username` may also be the account's email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserProfile,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

// ==================== Estimates ====================

/// A saved estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: i64,
    pub project_name: String,
    pub plot_length: Decimal,
    pub plot_breadth: Decimal,
    pub total_area: Decimal,
    pub num_floors: i32,
    pub material_quality: String,
    pub total_cost: Decimal,
    #[serde(default)]
    pub cost_per_sqft: Option<Decimal>,
    /// Free-form calculator output stored alongside the headline figures.
    #[serde(default)]
    pub estimate_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// An estimate that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateDraft {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default)]
    pub plot_length: Decimal,
    #[serde(default)]
    pub plot_breadth: Decimal,
    #[serde(default)]
    pub total_area: Decimal,
    #[serde(default)]
    pub num_floors: i32,
    #[serde(default = "default_material_quality")]
    pub material_quality: String,
    #[serde(default)]
    pub total_cost: Decimal,
    #[serde(default)]
    pub cost_per_sqft: Option<Decimal>,
    #[serde(default)]
    pub estimate_data: serde_json::Value,
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

fn default_material_quality() -> String {
    DEFAULT_MATERIAL_QUALITY.to_string()
}

impl EstimateDraft {
    /// Draft from a construction-cost result and the plot dimensions that produced it.
    pub fn from_construction(
        project_name: impl Into<String>,
        plot_length: f64,
        plot_breadth: f64,
        cost: &ConstructionCost,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            project_name: project_name.into(),
            plot_length: to_currency(plot_length),
            plot_breadth: to_currency(plot_breadth),
            total_area: to_currency(cost.total_area),
            num_floors: i32::try_from(cost.num_floors).unwrap_or(i32::MAX),
            material_quality: cost.quality.to_string(),
            total_cost: cost.total_cost,
            cost_per_sqft: Some(cost.cost_per_sqft),
            estimate_data: serde_json::to_value(cost)?,
        })
    }

    /// Draft from a detailed breakdown, costed at its line-item grand total.
    pub fn from_detailed(
        project_name: impl Into<String>,
        plot: &PlotSpec,
        breakdown: &DetailedBreakdown,
    ) -> Result<Self, serde_json::Error> {
        let cost_per_sqft = if breakdown.area > 0.0 {
            Decimal::try_from(breakdown.area)
                .ok()
                .filter(|area| !area.is_zero())
                .map(|area| (breakdown.grand_total / area).round_dp(2))
        } else {
            None
        };
        Ok(Self {
            project_name: project_name.into(),
            plot_length: to_currency(plot.length),
            plot_breadth: to_currency(plot.width),
            total_area: to_currency(breakdown.area),
            num_floors: i32::try_from(plot.floors).unwrap_or(i32::MAX),
            material_quality: breakdown.quality.to_string(),
            total_cost: breakdown.grand_total,
            cost_per_sqft,
            estimate_data: serde_json::to_value(breakdown)?,
        })
    }

    /// Required headline figures must be present and positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("plot_length", self.plot_length),
            ("plot_breadth", self.plot_breadth),
            ("total_area", self.total_area),
            ("total_cost", self.total_cost),
        ];
        for (field, value) in positive {
            if value <= Decimal::ZERO {
                return Err(ValidationError::Missing { field });
            }
        }
        if self.num_floors <= 0 {
            return Err(ValidationError::Missing { field: "num_floors" });
        }
        if self.project_name.trim().is_empty() {
            return Err(ValidationError::Missing {
                field: "project_name",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub estimate: Estimate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateListResponse {
    pub estimates: Vec<Estimate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEstimateResponse {
    pub message: String,
    pub estimate_id: i64,
    pub estimate: Estimate,
}

// ==================== Pricing ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialsResponse {
    pub materials: Vec<MaterialPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialResponse {
    pub material: MaterialPrice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedMaterialResponse {
    pub message: String,
    pub material_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborRatesResponse {
    pub labor_rates: Vec<LaborRate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedLaborResponse {
    pub message: String,
    pub labor_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionRatiosResponse {
    pub consumption_ratios: Vec<ConsumptionRatio>,
}

// ==================== Calculators ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructionCostRequest {
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub breadth: f64,
    #[serde(default)]
    pub num_floors: Option<u32>,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcreteSlabRequest {
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub breadth: f64,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(flatten)]
    pub region: RegionRef,
}

/// Either `area` or the wall geometry must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaintRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_width: Option<f64>,
    #[serde(default)]
    pub door_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_dimensions: Option<String>,
    #[serde(default)]
    pub window_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coats: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paint_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrickRequest {
    #[serde(default)]
    pub wall_length: f64,
    #[serde(default)]
    pub wall_height: f64,
    #[serde(default)]
    pub wall_thickness: Option<f64>,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMaterialRequest {
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub region: RegionRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadyMixRequest {
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub depth: f64,
    #[serde(flatten)]
    pub region: RegionRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedRequest {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub floors: Option<u32>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub material_overrides: std::collections::BTreeMap<String, f64>,
    #[serde(default)]
    pub labor_overrides: std::collections::BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}
