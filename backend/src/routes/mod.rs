//! Route definitions for the Labelworks backend

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/inventory", inventory_routes())
        .nest("/materials", material_routes())
        .nest("/purchase-orders", purchase_order_routes())
        .nest("/length-adjustments", length_adjustment_routes())
}

/// Inventory reconciliation routes
fn inventory_routes() -> Router<AppState> {
    Router::new().route("/recompute", post(handlers::recompute_inventory))
}

/// Material routes
fn material_routes() -> Router<AppState> {
    Router::new().route(
        "/:material_id/inventory",
        get(handlers::get_material_inventory),
    )
}

/// Purchase order routes
fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_purchase_order))
        .route("/arrival", post(handlers::set_purchase_order_arrival))
        .route(
            "/:order_id",
            put(handlers::update_purchase_order).delete(handlers::delete_purchase_order),
        )
        .route(
            "/vendor/:vendor_id",
            delete(handlers::delete_vendor_purchase_orders),
        )
}

/// Length adjustment routes
fn length_adjustment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_length_adjustment))
        .route(
            "/:adjustment_id",
            put(handlers::update_length_adjustment).delete(handlers::delete_length_adjustment),
        )
        .route(
            "/material/:material_id",
            delete(handlers::delete_material_length_adjustments),
        )
}
