use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, mailer::Mailer};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub mailer: Arc<dyn Mailer>,
    pub jwt_secret: Arc<str>,
    pub tx_timeout: Duration,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, mailer: Arc<dyn Mailer>, config: &AppConfig) -> Self {
        Self {
            orm,
            mailer,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            tx_timeout: config.tx_timeout,
        }
    }
}
