//! HTTP gateway: maps routes onto the lending operations

pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, MatchedPath, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    services::gate::{CallerIdentity, Operation},
    AppState,
};

/// Generic acknowledgement body
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// JSON body extractor whose rejections surface as `InvalidArgument`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections surface as `InvalidArgument`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Gate middleware: runs before every routed handler.
///
/// The `Authorization` header is handed to the gate as the call's
/// `authorization` metadata. On success the caller identity is attached to the
/// request; on failure the handler is never reached.
pub async fn intercept(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let operation = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| Operation::resolve(request.method(), path.as_str()));

    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity = state
        .services
        .gate
        .admit(operation, authorization)
        .map_err(|e| {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected unauthenticated call: {}",
                e
            );
            e
        })?;

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}

/// Extractor for the caller identity attached by the gate
pub struct Caller(pub CallerIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .map(Caller)
            .ok_or_else(|| AppError::Unauthenticated("Invalid token claims".to_string()))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Users
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        // Catalog
        .route("/book/add", post(books::add_book))
        .route("/book/remove/:id", delete(books::remove_book))
        .route("/book/:id", get(books::get_book))
        // Lending
        .route("/book/borrow/:id", post(loans::borrow_book))
        .route("/book/return/:id", post(loans::return_book))
        .route_layer(middleware::from_fn_with_state(state.clone(), intercept))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
