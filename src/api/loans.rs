//! Lending endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::Loan, services::gate::AuthorizedRequest, AppState};

use super::{ApiPath, Caller};

/// Loan response with computed dates
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub message: String,
    pub loan: Loan,
}

/// Borrow a book for the caller
#[utoipa::path(
    post,
    path = "/book/borrow/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Book borrowed", body = LoanResponse),
        (status = 400, description = "Invalid book ID or book already borrowed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    Caller(identity): Caller,
    ApiPath(id): ApiPath<String>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let loan = state
        .services
        .loans
        .borrow_book(AuthorizedRequest::new(identity, id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            message: "Book borrowed successfully".to_string(),
            loan,
        }),
    ))
}

/// Return a borrowed (or late) book
#[utoipa::path(
    post,
    path = "/book/return/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book returned", body = LoanResponse),
        (status = 400, description = "Invalid book ID format"),
        (status = 404, description = "Book not found or not on loan")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    Caller(identity): Caller,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<LoanResponse>> {
    let loan = state
        .services
        .loans
        .return_book(AuthorizedRequest::new(identity, id))
        .await?;

    Ok(Json(LoanResponse {
        message: "Book returned successfully".to_string(),
        loan,
    }))
}
