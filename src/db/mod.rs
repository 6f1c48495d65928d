//! Persistence for users, the pricing catalog and saved estimates.
//!
//! [`Database`] has two implementations: [`InMemoryDatabase`] (the default
//! when no `DATABASE_URL` is configured, and in tests) and [`PgStore`].

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::InMemoryDatabase;
pub use postgres::PgStore;

use crate::client::api::{Estimate, EstimateDraft};
use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::pricing::catalog::{
    CatalogSeed, ConsumptionRatio, LaborRate, MaterialPatch, MaterialPrice, NewLaborRate, NewMaterial,
};

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Database abstraction layer.
#[async_trait]
pub trait Database: Send + Sync {
    // --- Users ---

    /// Insert a user. A taken username or email is a `Constraint` error.
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord, DatabaseError>;

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, DatabaseError>;

    /// Find a user by username or email.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError>;

    // --- Catalog ---

    async fn list_materials(&self, quality: Option<&str>) -> Result<Vec<MaterialPrice>, DatabaseError>;

    async fn get_material(&self, id: i64) -> Result<Option<MaterialPrice>, DatabaseError>;

    /// Lookup by exact name, optionally restricted to a quality. The oldest row wins.
    async fn find_material(
        &self,
        name: &str,
        quality: Option<&str>,
    ) -> Result<Option<MaterialPrice>, DatabaseError>;

    async fn add_material(&self, material: &NewMaterial) -> Result<i64, DatabaseError>;

    /// Returns `false` when no such material exists.
    async fn update_material(&self, id: i64, patch: &MaterialPatch) -> Result<bool, DatabaseError>;

    async fn list_labor_rates(&self) -> Result<Vec<LaborRate>, DatabaseError>;

    async fn add_labor_rate(&self, rate: &NewLaborRate) -> Result<i64, DatabaseError>;

    async fn list_consumption_ratios(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<ConsumptionRatio>, DatabaseError>;

    /// Insert the seed rows if the catalog is empty. Returns whether anything was inserted.
    async fn seed_catalog(&self, seed: &CatalogSeed) -> Result<bool, DatabaseError>;

    // --- Estimates ---

    async fn create_estimate(&self, user_id: i64, draft: &EstimateDraft) -> Result<Estimate, DatabaseError>;

    /// All of a user's estimates, newest first.
    async fn list_estimates(&self, user_id: i64) -> Result<Vec<Estimate>, DatabaseError>;

    /// `None` when the estimate does not exist or belongs to someone else.
    async fn get_estimate(&self, id: i64, user_id: i64) -> Result<Option<Estimate>, DatabaseError>;

    /// Replace an owned estimate's contents, keeping its id and creation time.
    async fn replace_estimate(
        &self,
        id: i64,
        user_id: i64,
        draft: &EstimateDraft,
    ) -> Result<Option<Estimate>, DatabaseError>;

    async fn delete_estimate(&self, id: i64, user_id: i64) -> Result<bool, DatabaseError>;
}

/// Connect to PostgreSQL when configured, otherwise fall back to memory.
pub async fn connect(config: Option<&DatabaseConfig>) -> Result<Arc<dyn Database>, DatabaseError> {
    match config {
        Some(config) => {
            let store = PgStore::new(config).await?;
            store.run_migrations().await?;
            tracing::info!("Connected to PostgreSQL (pool size {})", config.pool_size);
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory database");
            Ok(Arc::new(InMemoryDatabase::new()))
        }
    }
}
