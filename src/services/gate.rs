//! Authorization gate: decides whether an inbound operation may run and
//! resolves the caller behind its bearer token.

use axum::http::Method;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    services::tokens::TokenService,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Inbound operations known to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RegisterUser,
    LoginUser,
    AddBook,
    RemoveBook,
    GetBook,
    BorrowBook,
    ReturnBook,
    Health,
}

impl Operation {
    /// Operations that run without a bearer token
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Operation::RegisterUser | Operation::LoginUser | Operation::Health
        )
    }

    /// Map a gateway route (method + matched path template) to its operation
    pub fn resolve(method: &Method, route: &str) -> Option<Self> {
        let route = route.strip_prefix("/api/v1").unwrap_or(route);
        let op = match (method.as_str(), route) {
            ("POST", "/register") => Operation::RegisterUser,
            ("POST", "/login") => Operation::LoginUser,
            ("POST", "/book/add") => Operation::AddBook,
            ("DELETE", "/book/remove/:id") => Operation::RemoveBook,
            ("GET", "/book/:id") => Operation::GetBook,
            ("POST", "/book/borrow/:id") => Operation::BorrowBook,
            ("POST", "/book/return/:id") => Operation::ReturnBook,
            ("GET", "/health") | ("GET", "/ready") => Operation::Health,
            _ => return None,
        };
        Some(op)
    }
}

/// Identity of the user a request was authorized for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
}

/// A payload that has passed the gate, paired with its caller
#[derive(Debug, Clone)]
pub struct AuthorizedRequest<T> {
    pub identity: CallerIdentity,
    pub payload: T,
}

impl<T> AuthorizedRequest<T> {
    pub fn new(identity: CallerIdentity, payload: T) -> Self {
        Self { identity, payload }
    }
}

#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenService,
}

impl AuthGate {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Admit an operation given its `authorization` metadata.
    ///
    /// Public operations pass with no identity. Anything else, including
    /// unknown operations, needs a valid `Bearer <token>` value.
    pub fn admit(
        &self,
        operation: Option<Operation>,
        authorization: Option<&str>,
    ) -> AppResult<Option<CallerIdentity>> {
        if operation.is_some_and(Operation::is_public) {
            return Ok(None);
        }

        self.authenticate(authorization).map(Some)
    }

    /// Resolve the caller from an `authorization` metadata value
    pub fn authenticate(&self, authorization: Option<&str>) -> AppResult<CallerIdentity> {
        let header = authorization.ok_or_else(|| {
            AppError::Unauthenticated("Unauthorized: no authorization metadata".to_string())
        })?;

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Unauthenticated("Unauthorized: invalid or missing token".to_string())
            })?;

        let user_id = self.tokens.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            e
        })?;

        Ok(CallerIdentity { user_id })
    }
}
