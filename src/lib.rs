pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::Store;

#[derive(Clone)]
pub struct AppState {
    /// Read-side queries for the list and detail views.
    pub db: DatabaseConnection,
    /// Write path used by the booking and account services.
    pub store: Arc<dyn Store>,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            store: Arc::new(store::SeaOrmStore::new(db.clone())),
            db,
            config,
        }
    }
}
