//! PostgreSQL adapter for the store port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::LibraryStore;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookStatus, Loan, NewBook, NewUser, User},
};

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl LibraryStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn users_create(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::AlreadyExists("username already exists".to_string())
            }
            other => AppError::Database(other),
        })
    }

    async fn users_get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn books_create(&self, book: &NewBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, published_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.published_date)
        .bind(BookStatus::Available)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn books_get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn books_delete(&self, id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn loans_mark_late(&self, loan: &Loan) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books SET status = $1
            WHERE id = $2 AND status = $3
              AND EXISTS (
                SELECT 1 FROM borrowed_books
                WHERE id = $4 AND book_id = $2 AND returned_at IS NULL
              )
            "#,
        )
        .bind(BookStatus::Late)
        .bind(loan.book_id)
        .bind(BookStatus::Borrowed)
        .bind(loan.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn loans_open(&self, loan: &Loan) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query("UPDATE books SET status = $1 WHERE id = $2 AND status = $3")
            .bind(BookStatus::Borrowed)
            .bind(loan.book_id)
            .bind(BookStatus::Available)
            .execute(&mut *tx)
            .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO borrowed_books (id, book_id, user_id, borrowed_date, return_date, returned_at)
            VALUES ($1, $2, $3, $4, $5, NULL)
            "#,
        )
        .bind(loan.id)
        .bind(loan.book_id)
        .bind(loan.user_id)
        .bind(loan.borrowed_date)
        .bind(loan.return_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn loans_close(&self, book_id: Uuid, returned_at: DateTime<Utc>) -> AppResult<Option<Loan>> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE borrowed_books SET returned_at = $1
            WHERE book_id = $2 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(returned_at)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(loan) = loan else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE books SET status = $1 WHERE id = $2")
            .bind(BookStatus::Available)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(loan))
    }

    async fn loans_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM borrowed_books
            WHERE returned_at IS NULL AND return_date < $1
            ORDER BY return_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }
}
