//! Book rental server
//!
//! Users register and log in, books are added to and removed from the
//! catalog, users borrow and return books, and a background sweeper flags
//! overdue loans. Every operation except registration and login passes
//! through a bearer-token gate.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repository::Repository;
use services::Services;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
    pub repository: Repository,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Repository) -> Self {
        let services = Services::new(repository.clone(), &config.auth);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            repository,
        }
    }
}
