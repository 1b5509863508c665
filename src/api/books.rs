//! Catalog endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, CreateBook},
    services::gate::AuthorizedRequest,
    AppState,
};

use super::{ApiJson, ApiPath, Caller, MessageResponse};

#[derive(Serialize, ToSchema)]
pub struct AddBookResponse {
    pub message: String,
    pub book: Book,
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/book/add",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book added", body = AddBookResponse),
        (status = 400, description = "Invalid published_date"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    Caller(identity): Caller,
    ApiJson(request): ApiJson<CreateBook>,
) -> AppResult<(StatusCode, Json<AddBookResponse>)> {
    let book = state
        .services
        .catalog
        .add_book(AuthorizedRequest::new(identity, request))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddBookResponse {
            message: "book successfully added".to_string(),
            book,
        }),
    ))
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/book/remove/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book removed", body = MessageResponse),
        (status = 400, description = "Invalid book ID format"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn remove_book(
    State(state): State<AppState>,
    Caller(identity): Caller,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .catalog
        .remove_book(AuthorizedRequest::new(identity, id))
        .await?;

    Ok(Json(MessageResponse {
        message: "Book successfully removed".to_string(),
    }))
}

/// Get a book and its status
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 400, description = "Invalid book ID format"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Caller(identity): Caller,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .catalog
        .get_book(AuthorizedRequest::new(identity, id))
        .await?;
    Ok(Json(book))
}
