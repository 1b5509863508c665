//! In-process store adapter, used for local runs and tests.
//!
//! All three collections sit behind one lock, so each port method is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::LibraryStore;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookStatus, Loan, NewBook, NewUser, User},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    books: HashMap<Uuid, Book>,
    borrowed_books: Vec<Loan>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All loans ever recorded for a book, open or closed
    pub async fn loans_for_book(&self, book_id: Uuid) -> Vec<Loan> {
        let tables = self.tables.read().await;
        tables
            .borrowed_books
            .iter()
            .filter(|loan| loan.book_id == book_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn users_create(&self, user: &NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::AlreadyExists("username already exists".to_string()));
        }

        let created = User {
            id: user.id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn users_get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn books_create(&self, book: &NewBook) -> AppResult<Book> {
        let created = Book {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            published_date: book.published_date,
            status: BookStatus::Available,
        };
        self.tables.write().await.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn books_get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn books_delete(&self, id: Uuid) -> AppResult<u64> {
        let removed = self.tables.write().await.books.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn loans_mark_late(&self, loan: &Loan) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let still_open = tables
            .borrowed_books
            .iter()
            .any(|open| open.id == loan.id && open.book_id == loan.book_id && open.is_open());
        if !still_open {
            return Ok(false);
        }

        match tables.books.get_mut(&loan.book_id) {
            Some(book) if book.status == BookStatus::Borrowed => {
                book.status = BookStatus::Late;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn loans_open(&self, loan: &Loan) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.books.get_mut(&loan.book_id) {
            Some(book) if book.status == BookStatus::Available => {
                book.status = BookStatus::Borrowed;
            }
            _ => return Ok(false),
        }
        tables.borrowed_books.push(loan.clone());
        Ok(true)
    }

    async fn loans_close(&self, book_id: Uuid, returned_at: DateTime<Utc>) -> AppResult<Option<Loan>> {
        let mut tables = self.tables.write().await;
        let Some(loan) = tables
            .borrowed_books
            .iter_mut()
            .find(|loan| loan.book_id == book_id && loan.is_open())
        else {
            return Ok(None);
        };
        loan.returned_at = Some(returned_at);
        let closed = loan.clone();

        if let Some(book) = tables.books.get_mut(&book_id) {
            book.status = BookStatus::Available;
        }
        Ok(Some(closed))
    }

    async fn loans_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Loan>> {
        let tables = self.tables.read().await;
        let mut loans: Vec<Loan> = tables
            .borrowed_books
            .iter()
            .filter(|loan| loan.is_overdue(now))
            .cloned()
            .collect();
        loans.sort_by_key(|loan| loan.return_date);
        Ok(loans)
    }
}
