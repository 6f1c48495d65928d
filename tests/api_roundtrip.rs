//! End-to-end: the HTTP client against a live server on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tokio::net::TcpListener;

use sitecost::client::api::{ConstructionCostRequest, EstimateDraft};
use sitecost::client::{ApiClient, ClientError, EstimateStore, SessionManager};
use sitecost::db::{Database, InMemoryDatabase};
use sitecost::pricing::PricingTables;
use sitecost::pricing::catalog::CatalogSeed;
use sitecost::server::{ApiServer, AppState};

async fn spawn_server() -> String {
    let db = Arc::new(InMemoryDatabase::new());
    db.seed_catalog(&CatalogSeed::reference()).await.unwrap();
    let state = AppState::new(db, Arc::new(PricingTables::reference()), Duration::from_secs(3600));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(ApiServer::serve(listener, state));
    format!("http://{}/api", addr)
}

#[tokio::test]
async fn test_estimate_lifecycle_over_http() {
    let base_url = spawn_server().await;
    let client = ApiClient::new(&base_url, SessionManager::in_memory());

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");

    // Calculators are public.
    let cost = client
        .construction_cost(&ConstructionCostRequest {
            length: 30.0,
            breadth: 40.0,
            num_floors: Some(1),
            quality: Some("standard".into()),
        })
        .await
        .unwrap();
    assert_eq!(cost.total_area, 1200.0);

    let mut store = EstimateStore::new(client);
    let draft = EstimateDraft::from_construction("Plot 12", 30.0, 40.0, &cost).unwrap();
    store.remember(draft.clone());

    assert!(matches!(store.save_last().await, Err(ClientError::AuthRequired)));
    assert!(store.last().is_some());

    store
        .client()
        .register("site_engineer", "Engineer@Example.com", "s3cret-pass")
        .await
        .unwrap();
    assert!(store.client().is_authenticated());

    let saved = store.save_last().await.unwrap();
    assert!(store.last().is_none());
    assert_eq!(saved.project_name, "Plot 12");

    let fetched = store.get(saved.id).await.unwrap();
    assert_eq!(fetched.total_cost, cost.total_cost);
    assert_eq!(fetched.total_area, dec!(1200));
    assert_eq!(fetched.material_quality, "standard");

    let mut revised = draft;
    revised.project_name = "Plot 12 (revised)".into();
    revised.num_floors = 2;
    revised.total_area = dec!(2400);
    revised.total_cost = cost.total_cost * dec!(2);
    let updated = store.update(saved.id, &revised).await.unwrap();
    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.num_floors, 2);

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].project_name, "Plot 12 (revised)");

    store.delete(saved.id).await.unwrap();
    assert!(matches!(store.get(saved.id).await, Err(ClientError::NotFound(_))));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_and_server_errors_surface_verbatim() {
    let base_url = spawn_server().await;

    let first = ApiClient::new(&base_url, SessionManager::in_memory());
    first
        .register("quantity_surveyor", "qs@example.com", "first-pass")
        .await
        .unwrap();

    // Email logins work too; a second client starts signed out.
    let second = ApiClient::new(&base_url, SessionManager::in_memory());
    assert!(matches!(second.profile().await, Err(ClientError::AuthRequired)));
    let user = second.login("qs@example.com", "first-pass").await.unwrap();
    assert_eq!(user.username, "quantity_surveyor");
    assert_eq!(second.profile().await.unwrap().email, "qs@example.com");

    match second.login("quantity_surveyor", "wrong").await {
        Err(ClientError::Network { status, message }) => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "Invalid username or password");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    match first.register("quantity_surveyor", "other@example.com", "another-pass").await {
        Err(ClientError::Network { status, message }) => {
            assert_eq!(status, Some(409));
            assert_eq!(message, "Username or email already exists");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // The catalog was seeded at startup.
    let materials = first.materials(Some("standard")).await.unwrap();
    assert!(!materials.is_empty());
    assert!(materials.iter().all(|m| m.quality == "standard"));

    let reply = first.chat("what does it cost per sq ft?").await.unwrap();
    assert!(!reply.lines.is_empty());
}
