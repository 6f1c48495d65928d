//! In-memory database backend.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Database, NewUser, UserRecord};
use crate::client::api::{Estimate, EstimateDraft};
use crate::error::DatabaseError;
use crate::pricing::catalog::{
    CatalogSeed, ConsumptionRatio, LaborRate, MaterialPatch, MaterialPrice, NewLaborRate, NewMaterial,
};

#[derive(Debug, Default)]
struct State {
    users: Vec<UserRecord>,
    materials: Vec<MaterialPrice>,
    labor_rates: Vec<LaborRate>,
    consumption_ratios: Vec<ConsumptionRatio>,
    /// `(owner, estimate)`
    estimates: Vec<(i64, Estimate)>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Process-local storage. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    state: RwLock<State>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn materialize(id: i64, draft: &EstimateDraft, created_at: chrono::DateTime<Utc>) -> Estimate {
    Estimate {
        id,
        project_name: draft.project_name.clone(),
        plot_length: draft.plot_length,
        plot_breadth: draft.plot_breadth,
        total_area: draft.total_area,
        num_floors: draft.num_floors,
        material_quality: draft.material_quality.clone(),
        total_cost: draft.total_cost,
        cost_per_sqft: draft.cost_per_sqft,
        estimate_data: draft.estimate_data.clone(),
        created_at,
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord, DatabaseError> {
        let mut state = self.state.write().await;
        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(DatabaseError::Constraint("username or email already taken".into()));
        }

        let record = UserRecord {
            id: state.next_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        state.users.push(record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.username == login || u.email == login)
            .cloned())
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .any(|u| u.username == username || u.email == email))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "user",
                id: id.to_string(),
            })?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list_materials(&self, quality: Option<&str>) -> Result<Vec<MaterialPrice>, DatabaseError> {
        let state = self.state.read().await;
        let mut materials: Vec<MaterialPrice> = state
            .materials
            .iter()
            .filter(|m| quality.is_none_or(|q| m.quality == q))
            .cloned()
            .collect();
        materials.sort_by(|a, b| {
            a.material_name
                .cmp(&b.material_name)
                .then_with(|| a.quality.cmp(&b.quality))
        });
        Ok(materials)
    }

    async fn get_material(&self, id: i64) -> Result<Option<MaterialPrice>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.materials.iter().find(|m| m.id == id).cloned())
    }

    async fn find_material(
        &self,
        name: &str,
        quality: Option<&str>,
    ) -> Result<Option<MaterialPrice>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .materials
            .iter()
            .find(|m| m.material_name == name && quality.is_none_or(|q| m.quality == q))
            .cloned())
    }

    async fn add_material(&self, material: &NewMaterial) -> Result<i64, DatabaseError> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        state.materials.push(MaterialPrice {
            id,
            material_name: material.material_name.clone(),
            unit: material.unit.clone(),
            price: material.price,
            quality: material.quality.clone(),
        });
        Ok(id)
    }

    async fn update_material(&self, id: i64, patch: &MaterialPatch) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        match state.materials.iter_mut().find(|m| m.id == id) {
            Some(material) => {
                patch.apply(material);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_labor_rates(&self) -> Result<Vec<LaborRate>, DatabaseError> {
        let state = self.state.read().await;
        let mut rates = state.labor_rates.clone();
        rates.sort_by(|a, b| a.labor_type.cmp(&b.labor_type));
        Ok(rates)
    }

    async fn add_labor_rate(&self, rate: &NewLaborRate) -> Result<i64, DatabaseError> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        state.labor_rates.push(LaborRate {
            id,
            labor_type: rate.labor_type.clone(),
            rate: rate.rate,
            unit: rate.unit.clone(),
        });
        Ok(id)
    }

    async fn list_consumption_ratios(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<ConsumptionRatio>, DatabaseError> {
        let state = self.state.read().await;
        let mut ratios: Vec<ConsumptionRatio> = state
            .consumption_ratios
            .iter()
            .filter(|r| category.is_none_or(|c| r.category == c))
            .cloned()
            .collect();
        ratios.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.material_name.cmp(&b.material_name))
        });
        Ok(ratios)
    }

    async fn seed_catalog(&self, seed: &CatalogSeed) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.materials.is_empty() {
            return Ok(false);
        }

        for material in &seed.materials {
            let id = state.next_id();
            state.materials.push(MaterialPrice {
                id,
                material_name: material.material_name.clone(),
                unit: material.unit.clone(),
                price: material.price,
                quality: material.quality.clone(),
            });
        }
        for rate in &seed.labor_rates {
            let id = state.next_id();
            state.labor_rates.push(LaborRate {
                id,
                labor_type: rate.labor_type.clone(),
                rate: rate.rate,
                unit: rate.unit.clone(),
            });
        }
        for ratio in &seed.consumption_ratios {
            let id = state.next_id();
            state.consumption_ratios.push(ConsumptionRatio {
                id,
                material_name: ratio.material_name.clone(),
                ratio_per_sqft: ratio.ratio_per_sqft,
                unit: ratio.unit.clone(),
                category: ratio.category.clone(),
            });
        }
        Ok(true)
    }

    async fn create_estimate(&self, user_id: i64, draft: &EstimateDraft) -> Result<Estimate, DatabaseError> {
        let mut state = self.state.write().await;
        let estimate = materialize(state.next_id(), draft, Utc::now());
        state.estimates.push((user_id, estimate.clone()));
        Ok(estimate)
    }

    async fn list_estimates(&self, user_id: i64) -> Result<Vec<Estimate>, DatabaseError> {
        let state = self.state.read().await;
        let mut estimates: Vec<Estimate> = state
            .estimates
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, e)| e.clone())
            .collect();
        estimates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(estimates)
    }

    async fn get_estimate(&self, id: i64, user_id: i64) -> Result<Option<Estimate>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .estimates
            .iter()
            .find(|(owner, e)| *owner == user_id && e.id == id)
            .map(|(_, e)| e.clone()))
    }

    async fn replace_estimate(
        &self,
        id: i64,
        user_id: i64,
        draft: &EstimateDraft,
    ) -> Result<Option<Estimate>, DatabaseError> {
        let mut state = self.state.write().await;
        let Some((_, existing)) = state
            .estimates
            .iter_mut()
            .find(|(owner, e)| *owner == user_id && e.id == id)
        else {
            return Ok(None);
        };
        *existing = materialize(id, draft, existing.created_at);
        Ok(Some(existing.clone()))
    }

    async fn delete_estimate(&self, id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.estimates.len();
        state
            .estimates
            .retain(|(owner, e)| !(*owner == user_id && e.id == id));
        Ok(state.estimates.len() != before)
    }
}
