//! Registration and login

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginUser, NewUser, RegisterUser, User},
    repository::Repository,
    services::tokens::TokenService,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    tokens: TokenService,
}

impl UsersService {
    pub fn new(repository: Repository, tokens: TokenService) -> Self {
        Self { repository, tokens }
    }

    /// Register a new user, returning its identifier
    pub async fn register(&self, request: RegisterUser) -> AppResult<Uuid> {
        request
            .validate()
            .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

        if self
            .repository
            .users_get_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists("username already exists".to_string()));
        }

        // The store enforces uniqueness too, so a concurrent registration of the
        // same name still ends in AlreadyExists.
        let password_hash = self.hash_password(&request.password)?;
        let user = self
            .repository
            .users_create(&NewUser::new(request.username, password_hash))
            .await?;

        tracing::info!(user_id = %user.id, "User registered: {}", user.username);
        Ok(user.id)
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, request: LoginUser) -> AppResult<String> {
        let user = self
            .repository
            .users_get_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::NotFound("username not found".to_string()))?;

        if !self.verify_password(&user, &request.password)? {
            return Err(AppError::Unauthenticated("invalid password".to_string()));
        }

        self.tokens.issue(user.id)
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
