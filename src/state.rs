use std::sync::Arc;

use crate::config::Config;
use crate::gateway::PaymentGateway;
use crate::mailer::Mailer;
use crate::storage::Storage;

/// Shared handles passed into every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        storage: Storage,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            gateway,
            mailer,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &[u8] {
        self.config.jwt_secret.as_bytes()
    }
}
