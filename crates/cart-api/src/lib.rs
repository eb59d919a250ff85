//! # cart-api
//!
//! HTTP API layer for smart-cart-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server over a single shopping session
//! - REST endpoints for login, catalog, budget, cart, reservations and checkout
//! - Mapping of engine errors to status codes with a machine-readable `kind`
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/auth/register` | Create account |
//! | POST | `/api/v1/auth/login` | Log in, optional budget |
//! | POST | `/api/v1/auth/logout` | Log out |
//! | GET | `/api/v1/products` | List products (`?category=`) |
//! | GET | `/api/v1/products/{id}` | Get product |
//! | GET/PUT/DELETE | `/api/v1/budget` | View, set or clear the budget |
//! | GET | `/api/v1/cart` | View cart |
//! | POST | `/api/v1/cart/items` | Add to cart |
//! | DELETE | `/api/v1/cart/items/{id}` | Remove from cart |
//! | GET/POST | `/api/v1/reservations` | List or create reservations |
//! | GET | `/api/v1/reservations/{id}` | Reservation details |
//! | POST | `/api/v1/reservations/{id}/cancel` | Cancel with refund |
//! | POST | `/api/v1/reservations/{id}/purchase` | Move into cart |
//! | POST | `/api/v1/checkout/summary` | Order preview |
//! | POST | `/api/v1/checkout` | Place order |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
