use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::payment::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub conn: DatabaseConnection,
    pub config: Arc<Config>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(conn: DatabaseConnection, config: Config, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            conn,
            config: Arc::new(config),
            gateway,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conn", &self.conn)
            .field("server", &self.config.server_addr())
            .finish_non_exhaustive()
    }
}
