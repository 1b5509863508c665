//! Business logic services

pub mod catalog;
pub mod gate;
pub mod loans;
pub mod sweeper;
pub mod tokens;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub gate: gate::AuthGate,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sweeper: sweeper::OverdueSweeper,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> Self {
        let tokens = tokens::TokenService::from_config(auth_config);

        Self {
            gate: gate::AuthGate::new(tokens.clone()),
            users: users::UsersService::new(repository.clone(), tokens),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            sweeper: sweeper::OverdueSweeper::new(repository),
        }
    }
}
