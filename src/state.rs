use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    payment::PaymentGateway,
    storage::ImageStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn PaymentGateway>,
    pub images: Arc<dyn ImageStore>,
}
