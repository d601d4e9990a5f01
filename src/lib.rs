//! Café ordering and back-office service.
//!
//! Customers browse the menu, pay through a hosted checkout page and earn
//! loyalty points; staff work the ticket queue, clock shifts and log stock;
//! managers see the dashboard, run payroll and maintain the menu.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod loyalty;
pub mod payment;
pub mod pricing;
pub mod routes;
pub mod service;
pub mod state;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub use routes::router;

pub const DEFAULT_LOG_FILTER: &str = "info,sea_orm=info,sqlx=warn";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
