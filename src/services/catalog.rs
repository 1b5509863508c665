//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{parse_id, Book, CreateBook},
    repository::Repository,
    services::gate::AuthorizedRequest,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog with status `Available`.
    /// No duplicate-title check is made.
    pub async fn add_book(&self, request: AuthorizedRequest<CreateBook>) -> AppResult<Book> {
        let new_book = request.payload.into_new_book()?;
        let book = self.repository.books_create(&new_book).await?;

        tracing::info!(
            book_id = %book.id,
            user_id = %request.identity.user_id,
            "Book added: {}",
            book.title
        );
        Ok(book)
    }

    /// Delete a book record. A book currently out on loan is removed as well;
    /// its loan history stays in `borrowed_books`.
    pub async fn remove_book(&self, request: AuthorizedRequest<String>) -> AppResult<()> {
        let book_id = parse_id(&request.payload, "book")?;

        let deleted = self.repository.books_delete(book_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        tracing::info!(book_id = %book_id, user_id = %request.identity.user_id, "Book removed");
        Ok(())
    }

    /// Read a book and its current status
    pub async fn get_book(&self, request: AuthorizedRequest<String>) -> AppResult<Book> {
        let book_id = parse_id(&request.payload, "book")?;
        self.repository
            .books_get_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }
}
