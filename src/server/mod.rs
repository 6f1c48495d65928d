//! REST API under `/api`.
//!
//! Calculators, the chat endpoint and catalog reads are public. Account
//! profile, catalog writes and saved estimates need a bearer token issued by
//! `/api/auth/register` or `/api/auth/login`.

mod auth;
mod calculators;
mod error;
mod estimates;
mod pricing;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use auth::{AuthUser, TokenStore, hash_password, verify_password};
pub use error::{ApiError, ApiResult};

use crate::chat::Chatbot;
use crate::client::api::HealthResponse;
use crate::config::Config;
use crate::db::{self, Database};
use crate::estimation::Estimator;
use crate::pricing::PricingTables;
use crate::pricing::catalog::CatalogSeed;

/// Shared state for the API.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub tokens: TokenStore,
    pub estimator: Estimator,
    pub chatbot: Arc<Chatbot>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, tables: Arc<PricingTables>, token_ttl: Duration) -> Self {
        Self {
            db,
            tokens: TokenStore::new(token_ttl),
            estimator: Estimator::new(tables),
            chatbot: Arc::new(Chatbot::default()),
        }
    }
}

/// The public API server.
pub struct ApiServer;

impl ApiServer {
    /// Build the axum router.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/api/health", get(health_check))
            // Accounts
            .route("/api/auth/register", post(auth::register))
            .route("/api/auth/login", post(auth::login))
            .route("/api/auth/profile", get(auth::profile))
            .route("/api/auth/change-password", post(auth::change_password))
            // Catalog
            .route(
                "/api/pricing/materials",
                get(pricing::list_materials).post(pricing::add_material),
            )
            .route(
                "/api/pricing/materials/{id}",
                get(pricing::get_material).put(pricing::update_material),
            )
            .route(
                "/api/pricing/labor",
                get(pricing::list_labor_rates).post(pricing::add_labor_rate),
            )
            .route(
                "/api/pricing/consumption-ratios",
                get(pricing::list_consumption_ratios),
            )
            // Calculators
            .route(
                "/api/calculators/construction-cost",
                post(calculators::construction_cost),
            )
            .route("/api/calculators/concrete-slab", post(calculators::concrete_slab))
            .route("/api/calculators/paint", post(calculators::paint))
            .route("/api/calculators/bricks", post(calculators::bricks))
            .route("/api/calculators/raw-materials", post(calculators::raw_materials))
            .route("/api/calculators/ready-mix", post(calculators::ready_mix))
            .route("/api/calculators/detailed", post(calculators::detailed))
            .route("/api/chat", post(calculators::chat))
            // Saved estimates
            .route("/api/estimates", get(estimates::list).post(estimates::create))
            .route(
                "/api/estimates/{id}",
                get(estimates::get)
                    .put(estimates::replace)
                    .delete(estimates::delete),
            )
            .fallback(not_found)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Connect storage, seed the catalog and serve until Ctrl-C.
    pub async fn start(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let tables = Arc::new(config.load_pricing()?);
        tracing::info!(version = tables.version, "Loaded pricing tables");

        let db = db::connect(config.database.as_ref()).await?;
        if db.seed_catalog(&CatalogSeed::reference()).await? {
            tracing::info!("Catalog was empty, inserted reference prices");
        }

        let state = AppState::new(db, tables, config.auth.token_ttl);
        let listener = TcpListener::bind(config.server.addr()).await?;
        tracing::info!("API listening on {}", listener.local_addr()?);

        Self::serve(listener, state).await?;
        Ok(())
    }

    /// Serve on an already-bound listener.
    pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
        axum::serve(listener, Self::router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

// -- Handlers --

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Construction Cost Estimation API is running".to_string(),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::db::InMemoryDatabase;

    async fn app() -> Router {
        let db = Arc::new(InMemoryDatabase::new());
        db.seed_catalog(&CatalogSeed::reference()).await.unwrap();
        let state = AppState::new(
            db,
            Arc::new(PricingTables::reference()),
            Duration::from_secs(3600),
        );
        ApiServer::router(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, username: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "secret99",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Resource not found");
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "ab", "email": "ab@example.com", "password": "secret99"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username must be at least 3 characters");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "mason", "email": "not-an-email", "password": "secret99"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email format");

        register(&app, "mason").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "mason", "email": "other@example.com", "password": "secret99"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username or email already exists");
    }

    #[tokio::test]
    async fn test_login_with_mixed_case_email() {
        let app = app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "mason", "email": "Mason@Example.com", "password": "secret99"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        for login in ["Mason@Example.com", "mason@example.com", " MASON@EXAMPLE.COM "] {
            let (status, body) = send(
                &app,
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": login, "password": "secret99"})),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "login with {:?}", login);
            assert_eq!(body["user"]["email"], "mason@example.com");
        }

        // Usernames stay case-sensitive.
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "MASON", "password": "secret99"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_and_profile() {
        let app = app().await;
        register(&app, "carpenter").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "carpenter@example.com", "password": "wrong-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "carpenter", "password": "secret99"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["access_token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/auth/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "carpenter");

        let (status, _) = send(&app, "GET", "/api/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, "GET", "/api/auth/profile", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = app().await;
        let token = register(&app, "painter").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/change-password",
            Some(&token),
            Some(json!({"current_password": "nope", "new_password": "newsecret"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/change-password",
            Some(&token),
            Some(json!({"current_password": "secret99", "new_password": "newsecret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password changed successfully");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": "painter", "password": "newsecret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_construction_cost_route() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/calculators/construction-cost",
            None,
            Some(json!({"length": 30, "breadth": 40, "num_floors": 2, "quality": "luxury"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_area"], 2400.0);
        assert_eq!(body["total_cost"], 6000000.0);
        assert_eq!(body["cost_per_sqft"], 2500.0);

        let (status, body) = send(
            &app,
            "POST",
            "/api/calculators/construction-cost",
            None,
            Some(json!({"length": 0, "breadth": 40})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("greater than zero"));
    }

    #[tokio::test]
    async fn test_paint_route_rejects_covered_wall() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/calculators/paint",
            None,
            Some(json!({
                "wall_height": 8, "wall_width": 10,
                "door_count": 2, "door_dimensions": "7x5",
                "window_count": 1, "window_dimensions": "4x3",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Paintable area"));
    }

    #[tokio::test]
    async fn test_paint_route_uses_catalog_price() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/calculators/paint",
            None,
            Some(json!({"area": 100, "coats": 2, "paint_type": "exterior"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["litres"], 20.0);
        assert_eq!(body["paint_cost"], 9000.0);
    }

    #[tokio::test]
    async fn test_ready_mix_and_region_errors() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/calculators/ready-mix",
            None,
            Some(json!({"height": 2, "width": 3, "depth": 0.15})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["volume_yd3"].as_f64().unwrap() - 1.177155).abs() < 1e-6);

        let (status, body) = send(
            &app,
            "POST",
            "/api/calculators/raw-materials",
            None,
            Some(json!({"area": 1000, "state": "atlantis"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown region: atlantis");
    }

    #[tokio::test]
    async fn test_detailed_route_with_overrides() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/calculators/detailed",
            None,
            Some(json!({
                "width": 25, "length": 40, "quality": "standard",
                "material_overrides": {"steel": 0},
                "labor_overrides": {"design": 100},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["material_total"], 264600.0);
        assert_eq!(body["labor_total"], 1200100.0);
        assert_eq!(body["grand_total"], 1464700.0);
    }

    #[tokio::test]
    async fn test_chat_route() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/chat",
            None,
            Some(json!({"message": "hello, what is the cost?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "costs");
        assert!(!body["lines"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_routes() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/api/pricing/materials?quality=premium", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["materials"].as_array().unwrap().len(), 4);

        let (status, _) = send(
            &app,
            "POST",
            "/api/pricing/materials",
            None,
            Some(json!({"material_name": "Gravel", "unit": "ton", "price": 900})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = register(&app, "supplier").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/pricing/materials",
            Some(&token),
            Some(json!({"material_name": "Gravel", "unit": "ton", "price": 900})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["material_id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/pricing/materials/{}", id),
            Some(&token),
            Some(json!({"price": 950})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", &format!("/api/pricing/materials/{}", id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["material"]["price"], 950.0);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/pricing/materials/99999",
            Some(&token),
            Some(json!({"price": 950})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Material not found");

        let (status, body) = send(&app, "GET", "/api/pricing/consumption-ratios?category=finishing", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["consumption_ratios"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_estimates_are_private() {
        let app = app().await;
        let owner = register(&app, "owner").await;
        let stranger = register(&app, "stranger").await;

        let draft = json!({
            "project_name": "Corner plot",
            "plot_length": 30, "plot_breadth": 40, "total_area": 1200,
            "num_floors": 1, "material_quality": "standard", "total_cost": 1800000,
        });
        let (status, _) = send(&app, "POST", "/api/estimates", None, Some(draft.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, "POST", "/api/estimates", Some(&owner), Some(draft)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["estimate_id"].as_i64().unwrap();
        let uri = format!("/api/estimates/{}", id);

        let (status, body) = send(&app, "GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimate"]["total_cost"], 1800000.0);

        let (status, body) = send(&app, "GET", &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Estimate not found");
        let (status, _) = send(&app, "DELETE", &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "GET", "/api/estimates", Some(&stranger), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["estimates"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, "DELETE", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_estimate_replace_and_validation() {
        let app = app().await;
        let token = register(&app, "surveyor").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/estimates",
            Some(&token),
            Some(json!({"plot_length": 30, "plot_breadth": 40, "total_area": 1200})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "total_cost is required");

        let (_, body) = send(
            &app,
            "POST",
            "/api/estimates",
            Some(&token),
            Some(json!({
                "plot_length": 30, "plot_breadth": 40, "total_area": 1200,
                "num_floors": 1, "total_cost": 1800000,
            })),
        )
        .await;
        let id = body["estimate_id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/estimates/{}", id),
            Some(&token),
            Some(json!({
                "project_name": "Extended",
                "plot_length": 30, "plot_breadth": 40, "total_area": 2400,
                "num_floors": 2, "material_quality": "luxury", "total_cost": 6000000,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimate"]["id"].as_i64(), Some(id));
        assert_eq!(body["estimate"]["project_name"], "Extended");
        assert_eq!(body["estimate"]["material_quality"], "luxury");

        let (status, _) = send(
            &app,
            "PUT",
            "/api/estimates/424242",
            Some(&token),
            Some(json!({
                "plot_length": 1, "plot_breadth": 1, "total_area": 1,
                "num_floors": 1, "total_cost": 1,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
