//! Labelworks backend
//!
//! Material inventory reconciliation for a label manufacturer: purchase
//! orders and length adjustments are the sources of truth, and every write to
//! them refreshes the inventory snapshot stored on the affected materials.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod stores;

pub use config::Config;

use services::{ChangeNotifier, InventoryService};
use stores::Stores;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Present when running against Postgres
    pub db: Option<sqlx::PgPool>,
    pub stores: Stores,
    pub inventory: InventoryService,
    pub notifier: Arc<ChangeNotifier>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire services together and subscribe the inventory engine to order
    /// and adjustment changes
    pub async fn build(stores: Stores, config: Config, db: Option<sqlx::PgPool>) -> Self {
        let inventory = InventoryService::from_config(&stores, &config.inventory);
        let notifier = Arc::new(ChangeNotifier::new(
            config.inventory.trigger_max_attempts,
            config.inventory.trigger_retry_delay(),
        ));
        notifier.subscribe(Arc::new(inventory.clone())).await;

        Self {
            db,
            stores,
            inventory,
            notifier,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Labelworks API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
