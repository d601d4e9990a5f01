use std::sync::Arc;

use anyhow::Context;
use cafe::{config::Config, payment::StripeGateway, state::AppState};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cafe::init_tracing();

    let config = Config::from_env().context("loading configuration")?;
    let conn = Database::connect(config.database_url.as_str())
        .await
        .context("connecting to the database")?;
    if config.run_migrations {
        Migrator::up(&conn, None).await.context("running migrations")?;
    }

    let gateway = Arc::new(StripeGateway::new(&config.payment));
    let address = config.server_addr();
    let app = cafe::router(AppState::new(conn, config, gateway));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cafe::shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
