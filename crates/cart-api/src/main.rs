//! # Smart-Cart RS
//!
//! In-store shopping engine: budget-gated cart, reservations and checkout.
//!
//! ## Usage
//!
//! ```bash
//! # Optional overrides
//! export PORT=8080
//! export CATALOG_PATH=config/products.toml
//! export LOG_FORMAT=json
//!
//! # Run the server
//! smart-cart
//! ```

use cart_api::{
    routes,
    state::{AppConfig, AppState},
};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config before logging so LOG_FORMAT from .env is honored
    let config = AppConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    print_banner();

    // Initialize application state
    let state = AppState::from_config(config)?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Products loaded: {} ({})",
        state.catalog.len(),
        state.catalog.currency()
    );
    if let Some(day) = state.config.fixed_today {
        info!("Business date pinned to {}", day);
    }

    let app = routes::create_router(state);

    info!("🛒 Smart-Cart starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🔑 Login: POST http://{}/api/v1/auth/login", addr);
        info!("💳 Checkout: POST http://{}/api/v1/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Smart-Cart RS 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━
  In-store shopping engine
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
