//! Repository layer: the store port and its adapters

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, Loan, NewBook, NewUser, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence port for the `users`, `books` and `borrowed_books` collections.
///
/// Every method is a single atomic unit from the caller's point of view.
/// `loans_open` and `loans_close` touch both a book and a loan and must apply
/// both writes or neither.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Cheap connectivity check used by the readiness probe.
    async fn ping(&self) -> AppResult<()>;

    /// Insert a user. Fails with `AlreadyExists` when the username is taken.
    async fn users_create(&self, user: &NewUser) -> AppResult<User>;

    async fn users_get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Insert a book with status `Available`.
    async fn books_create(&self, book: &NewBook) -> AppResult<Book>;

    async fn books_get_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// Delete a book, returning the number of records removed.
    async fn books_delete(&self, id: Uuid) -> AppResult<u64>;

    /// Move the book held by `loan` from `Borrowed` to `Late`, provided `loan`
    /// is still open. Returns `false` when the book is missing, not `Borrowed`,
    /// or the loan has been closed since it was listed.
    async fn loans_mark_late(&self, loan: &Loan) -> AppResult<bool>;

    /// Move the book from `Available` to `Borrowed` and insert `loan`.
    /// Returns `false`, writing nothing, when the book is not `Available`.
    async fn loans_open(&self, loan: &Loan) -> AppResult<bool>;

    /// Close the open loan on `book_id` and reset the book to `Available`.
    /// Returns `None`, writing nothing, when no loan is open on the book.
    async fn loans_close(&self, book_id: Uuid, returned_at: DateTime<Utc>) -> AppResult<Option<Loan>>;

    /// Open loans whose return date is strictly before `now`.
    async fn loans_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Loan>>;
}

/// Store handle shared by all services
pub type Repository = Arc<dyn LibraryStore>;
