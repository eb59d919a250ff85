//! # Routes
//!
//! Axum router configuration for the shopping API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Auth:
///   - POST /api/v1/auth/register - Create an account
///   - POST /api/v1/auth/login - Log in (optional budget)
///   - POST /api/v1/auth/logout - Log out
///
/// - Catalog:
///   - GET /api/v1/products?category= - List products within budget
///   - GET /api/v1/products/{id} - Get product by ID
///
/// - Budget and cart:
///   - GET|PUT|DELETE /api/v1/budget
///   - GET /api/v1/cart
///   - POST /api/v1/cart/items
///   - DELETE /api/v1/cart/items/{product_id}
///
/// - Reservations:
///   - GET|POST /api/v1/reservations
///   - GET /api/v1/reservations/{id}
///   - POST /api/v1/reservations/{id}/cancel
///   - POST /api/v1/reservations/{id}/purchase
///
/// - Checkout:
///   - POST /api/v1/checkout/summary - Preview totals
///   - POST /api/v1/checkout - Place order
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout));

    let catalog_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product));

    let cart_routes = Router::new()
        .route(
            "/budget",
            get(handlers::get_budget)
                .put(handlers::set_budget)
                .delete(handlers::clear_budget),
        )
        .route("/cart", get(handlers::get_cart))
        .route("/cart/items", post(handlers::add_to_cart))
        .route("/cart/items/{product_id}", delete(handlers::remove_from_cart));

    let reservation_routes = Router::new()
        .route(
            "/reservations",
            get(handlers::list_reservations).post(handlers::reserve),
        )
        .route("/reservations/{reservation_id}", get(handlers::get_reservation))
        .route(
            "/reservations/{reservation_id}/cancel",
            post(handlers::cancel_reservation),
        )
        .route(
            "/reservations/{reservation_id}/purchase",
            post(handlers::purchase_reservation),
        );

    let checkout_routes = Router::new()
        .route("/checkout", post(handlers::place_order))
        .route("/checkout/summary", post(handlers::checkout_summary));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(catalog_routes)
        .merge(cart_routes)
        .merge(reservation_routes)
        .merge(checkout_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
