//! PostgreSQL backend.

use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use super::{Database, NewUser, UserRecord};
use crate::client::api::{Estimate, EstimateDraft};
use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::pricing::catalog::{
    CatalogSeed, ConsumptionRatio, LaborRate, MaterialPatch, MaterialPrice, NewLaborRate, NewMaterial,
};

mod embedded {
    refinery::embed_migrations!("migrations");
}

const ESTIMATE_COLUMNS: &str = "id, project_name, plot_length, plot_breadth, total_area, num_floors, \
     material_quality, total_cost, cost_per_sqft, estimate_data, created_at";

/// Database store backed by a connection pool.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Create a new store and connect to the database.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url().to_string());
        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: config.pool_size,
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        // Test connection
        let _ = pool.get().await?;

        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let mut conn = self.conn().await?;
        let client: &mut tokio_postgres::Client = &mut conn;
        let report = embedded::migrations::runner()
            .run_async(client)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        for migration in report.applied_migrations() {
            tracing::info!("Applied migration {}", migration);
        }
        Ok(())
    }

    async fn conn(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }
}

fn row_to_user(row: &Row) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

fn row_to_material(row: &Row) -> MaterialPrice {
    MaterialPrice {
        id: row.get("id"),
        material_name: row.get("material_name"),
        unit: row.get("unit"),
        price: row.get("price"),
        quality: row.get("quality"),
    }
}

fn row_to_estimate(row: &Row) -> Estimate {
    Estimate {
        id: row.get("id"),
        project_name: row.get("project_name"),
        plot_length: row.get("plot_length"),
        plot_breadth: row.get("plot_breadth"),
        total_area: row.get("total_area"),
        num_floors: row.get("num_floors"),
        material_quality: row.get("material_quality"),
        total_cost: row.get("total_cost"),
        cost_per_sqft: row.get("cost_per_sqft"),
        estimate_data: row.get("estimate_data"),
        created_at: row.get("created_at"),
    }
}

fn map_unique_violation(e: tokio_postgres::Error) -> DatabaseError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        DatabaseError::Constraint(e.to_string())
    } else {
        DatabaseError::Query(e)
    }
}

#[async_trait]
impl Database for PgStore {
    // ==================== Users ====================

    async fn create_user(&self, user: &NewUser) -> Result<UserRecord, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
                 RETURNING id, username, email, password_hash, created_at",
                &[&user.username, &user.email, &user.password_hash],
            )
            .await
            .map_err(map_unique_violation)?;
        Ok(row_to_user(&row))
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, username, email, password_hash, created_at FROM users \
                 WHERE username = $1 OR email = $1 LIMIT 1",
                &[&login],
            )
            .await?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
                &[&username, &email],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        let updated = conn
            .execute(
                "UPDATE users SET password_hash = $2 WHERE id = $1",
                &[&id, &password_hash],
            )
            .await?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity: "user",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    // ==================== Catalog ====================

    async fn list_materials(&self, quality: Option<&str>) -> Result<Vec<MaterialPrice>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, material_name, unit, price, quality FROM material_prices \
                 WHERE ($1::TEXT IS NULL OR quality = $1) ORDER BY material_name, quality",
                &[&quality],
            )
            .await?;
        Ok(rows.iter().map(row_to_material).collect())
    }

    async fn get_material(&self, id: i64) -> Result<Option<MaterialPrice>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, material_name, unit, price, quality FROM material_prices WHERE id = $1",
                &[&id],
            )
            .await?;
        Ok(row.as_ref().map(row_to_material))
    }

    async fn find_material(
        &self,
        name: &str,
        quality: Option<&str>,
    ) -> Result<Option<MaterialPrice>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, material_name, unit, price, quality FROM material_prices \
                 WHERE material_name = $1 AND ($2::TEXT IS NULL OR quality = $2) \
                 ORDER BY id LIMIT 1",
                &[&name, &quality],
            )
            .await?;
        Ok(row.as_ref().map(row_to_material))
    }

    async fn add_material(&self, material: &NewMaterial) -> Result<i64, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO material_prices (material_name, unit, price, quality) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
                &[
                    &material.material_name,
                    &material.unit,
                    &material.price,
                    &material.quality,
                ],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn update_material(&self, id: i64, patch: &MaterialPatch) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let updated = conn
            .execute(
                r#"
                UPDATE material_prices SET
                    material_name = COALESCE($2, material_name),
                    unit = COALESCE($3, unit),
                    price = COALESCE($4, price),
                    quality = COALESCE($5, quality),
                    updated_at = NOW()
                WHERE id = $1
                "#,
                &[
                    &id,
                    &patch.material_name,
                    &patch.unit,
                    &patch.price,
                    &patch.quality,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn list_labor_rates(&self) -> Result<Vec<LaborRate>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, labor_type, rate, unit FROM labor_rates ORDER BY labor_type",
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| LaborRate {
                id: row.get("id"),
                labor_type: row.get("labor_type"),
                rate: row.get("rate"),
                unit: row.get("unit"),
            })
            .collect())
    }

    async fn add_labor_rate(&self, rate: &NewLaborRate) -> Result<i64, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO labor_rates (labor_type, rate, unit) VALUES ($1, $2, $3) RETURNING id",
                &[&rate.labor_type, &rate.rate, &rate.unit],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn list_consumption_ratios(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<ConsumptionRatio>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT id, material_name, ratio_per_sqft, unit, category FROM consumption_ratios \
                 WHERE ($1::TEXT IS NULL OR category = $1) ORDER BY category, material_name",
                &[&category],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| ConsumptionRatio {
                id: row.get("id"),
                material_name: row.get("material_name"),
                ratio_per_sqft: row.get("ratio_per_sqft"),
                unit: row.get("unit"),
                category: row.get("category"),
            })
            .collect())
    }

    async fn seed_catalog(&self, seed: &CatalogSeed) -> Result<bool, DatabaseError> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await?;

        let existing: i64 = tx
            .query_one("SELECT COUNT(*) FROM material_prices", &[])
            .await?
            .get(0);
        if existing > 0 {
            return Ok(false);
        }

        for m in &seed.materials {
            tx.execute(
                "INSERT INTO material_prices (material_name, unit, price, quality) VALUES ($1, $2, $3, $4)",
                &[&m.material_name, &m.unit, &m.price, &m.quality],
            )
            .await?;
        }
        for r in &seed.labor_rates {
            tx.execute(
                "INSERT INTO labor_rates (labor_type, rate, unit) VALUES ($1, $2, $3)",
                &[&r.labor_type, &r.rate, &r.unit],
            )
            .await?;
        }
        for c in &seed.consumption_ratios {
            tx.execute(
                "INSERT INTO consumption_ratios (material_name, ratio_per_sqft, unit, category) \
                 VALUES ($1, $2, $3, $4)",
                &[&c.material_name, &c.ratio_per_sqft, &c.unit, &c.category],
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            materials = seed.materials.len(),
            labor_rates = seed.labor_rates.len(),
            "Seeded pricing catalog"
        );
        Ok(true)
    }

    // ==================== Estimates ====================

    async fn create_estimate(&self, user_id: i64, draft: &EstimateDraft) -> Result<Estimate, DatabaseError> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO estimates (user_id, project_name, plot_length, plot_breadth, total_area, \
             num_floors, material_quality, total_cost, cost_per_sqft, estimate_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            ESTIMATE_COLUMNS
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &user_id,
                    &draft.project_name,
                    &draft.plot_length,
                    &draft.plot_breadth,
                    &draft.total_area,
                    &draft.num_floors,
                    &draft.material_quality,
                    &draft.total_cost,
                    &draft.cost_per_sqft,
                    &draft.estimate_data,
                ],
            )
            .await?;
        Ok(row_to_estimate(&row))
    }

    async fn list_estimates(&self, user_id: i64) -> Result<Vec<Estimate>, DatabaseError> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM estimates WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            ESTIMATE_COLUMNS
        );
        let rows = conn.query(&sql, &[&user_id]).await?;
        Ok(rows.iter().map(row_to_estimate).collect())
    }

    async fn get_estimate(&self, id: i64, user_id: i64) -> Result<Option<Estimate>, DatabaseError> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM estimates WHERE id = $1 AND user_id = $2",
            ESTIMATE_COLUMNS
        );
        let row = conn.query_opt(&sql, &[&id, &user_id]).await?;
        Ok(row.as_ref().map(row_to_estimate))
    }

    async fn replace_estimate(
        &self,
        id: i64,
        user_id: i64,
        draft: &EstimateDraft,
    ) -> Result<Option<Estimate>, DatabaseError> {
        let conn = self.conn().await?;
        let sql = format!(
            "UPDATE estimates SET project_name = $3, plot_length = $4, plot_breadth = $5, \
             total_area = $6, num_floors = $7, material_quality = $8, total_cost = $9, \
             cost_per_sqft = $10, estimate_data = $11 \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            ESTIMATE_COLUMNS
        );
        let row = conn
            .query_opt(
                &sql,
                &[
                    &id,
                    &user_id,
                    &draft.project_name,
                    &draft.plot_length,
                    &draft.plot_breadth,
                    &draft.total_area,
                    &draft.num_floors,
                    &draft.material_quality,
                    &draft.total_cost,
                    &draft.cost_per_sqft,
                    &draft.estimate_data,
                ],
            )
            .await?;
        Ok(row.as_ref().map(row_to_estimate))
    }

    async fn delete_estimate(&self, id: i64, user_id: i64) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM estimates WHERE id = $1 AND user_id = $2",
                &[&id, &user_id],
            )
            .await?;
        Ok(deleted > 0)
    }
}

#[cfg(all(test, feature = "integration"))]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
        let store = PgStore::new(&DatabaseConfig::new(url, 2)).await.unwrap();
        store.run_migrations().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_estimate_round_trip() {
        let store = store().await;
        let suffix = rand::random::<u32>();
        let user = store
            .create_user(&NewUser {
                username: format!("pg_user_{}", suffix),
                email: format!("pg_user_{}@example.com", suffix),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        let draft = EstimateDraft {
            project_name: "Duplex".into(),
            plot_length: dec!(30),
            plot_breadth: dec!(40),
            total_area: dec!(2400),
            num_floors: 2,
            material_quality: "standard".into(),
            total_cost: dec!(3600000.00),
            cost_per_sqft: Some(dec!(1500.00)),
            estimate_data: serde_json::json!({"source": "test"}),
        };
        let saved = store.create_estimate(user.id, &draft).await.unwrap();
        let fetched = store.get_estimate(saved.id, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.total_cost, dec!(3600000.00));
        assert_eq!(fetched.estimate_data["source"], "test");

        assert!(store.delete_estimate(saved.id, user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = store().await;
        let suffix = rand::random::<u32>();
        let new_user = NewUser {
            username: format!("dup_{}", suffix),
            email: format!("dup_{}@example.com", suffix),
            password_hash: "hash".into(),
        };
        store.create_user(&new_user).await.unwrap();
        assert!(matches!(
            store.create_user(&new_user).await,
            Err(DatabaseError::Constraint(_))
        ));
    }
}
