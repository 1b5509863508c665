//! Lending workflow: borrow and return

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{book::parse_id, Loan},
    repository::Repository,
    services::gate::AuthorizedRequest,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for the authorized caller
    pub async fn borrow_book(&self, request: AuthorizedRequest<String>) -> AppResult<Loan> {
        self.borrow_book_at(request, Utc::now()).await
    }

    /// Borrow a book, treating `now` as the borrow instant.
    ///
    /// The status change and the loan insert are one store operation, so a
    /// book is never left `Borrowed` without its loan.
    pub async fn borrow_book_at(
        &self,
        request: AuthorizedRequest<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let user_id = request.identity.user_id;
        let book_id = parse_id(&request.payload, "book")?;

        let book = self
            .repository
            .books_get_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))?;

        // Late books are still out and must be returned before lending again.
        if book.status.is_out() {
            return Err(AppError::InvalidArgument("the book is already borrowed".to_string()));
        }

        let loan = Loan::new(book_id, user_id, now);
        if !self.repository.loans_open(&loan).await? {
            // Lost a race with another borrower (or a removal) since the lookup.
            return Err(AppError::InvalidArgument("the book is already borrowed".to_string()));
        }

        tracing::info!(
            book_id = %book_id,
            user_id = %user_id,
            return_date = %loan.return_date,
            "Book borrowed"
        );
        Ok(loan)
    }

    /// Return a book, closing its open loan whether it was `Borrowed` or `Late`
    pub async fn return_book(&self, request: AuthorizedRequest<String>) -> AppResult<Loan> {
        self.return_book_at(request, Utc::now()).await
    }

    pub async fn return_book_at(
        &self,
        request: AuthorizedRequest<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let book_id = parse_id(&request.payload, "book")?;

        if self.repository.books_get_by_id(book_id).await?.is_none() {
            return Err(AppError::NotFound("book not found".to_string()));
        }

        let loan = self
            .repository
            .loans_close(book_id, now)
            .await?
            .ok_or_else(|| AppError::NotFound("no open loan for this book".to_string()))?;

        tracing::info!(
            book_id = %book_id,
            user_id = %request.identity.user_id,
            late = now > loan.return_date,
            "Book returned"
        );
        Ok(loan)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};
    use tokio_test::assert_err;
    use uuid::Uuid;

    use super::*;
    use crate::{
        models::{BookStatus, NewBook},
        repository::{LibraryStore, MemoryStore, MockLibraryStore},
        services::gate::CallerIdentity,
    };

    fn authorized(user_id: Uuid, book_id: impl ToString) -> AuthorizedRequest<String> {
        AuthorizedRequest::new(CallerIdentity { user_id }, book_id.to_string())
    }

    async fn store_with_book() -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let book = store
            .books_create(&NewBook {
                id: Uuid::new_v4(),
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                published_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            })
            .await
            .unwrap();
        (store, book.id)
    }

    #[tokio::test]
    async fn borrow_marks_book_and_records_one_loan() {
        let (store, book_id) = store_with_book().await;
        let loans = LoansService::new(store.clone());
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let loan = loans.borrow_book_at(authorized(user_id, book_id), now).await.unwrap();
        assert_eq!(loan.user_id, user_id);
        assert_eq!(loan.borrowed_date, now);
        assert_eq!(loan.return_date, now + Duration::days(7));

        let book = store.books_get_by_id(book_id).await.unwrap().unwrap();
        assert_eq!(book.status, BookStatus::Borrowed);
        assert_eq!(store.loans_for_book(book_id).await, vec![loan]);
    }

    #[tokio::test]
    async fn second_borrow_is_rejected() {
        let (store, book_id) = store_with_book().await;
        let loans = LoansService::new(store.clone());

        loans.borrow_book(authorized(Uuid::new_v4(), book_id)).await.unwrap();
        let err = loans.borrow_book(authorized(Uuid::new_v4(), book_id)).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(store.loans_for_book(book_id).await.len(), 1);
    }

    #[tokio::test]
    async fn late_book_cannot_be_borrowed_again() {
        let (store, book_id) = store_with_book().await;
        let loans = LoansService::new(store.clone());

        let loan = loans.borrow_book(authorized(Uuid::new_v4(), book_id)).await.unwrap();
        assert!(store.loans_mark_late(&loan).await.unwrap());

        let err = loans.borrow_book(authorized(Uuid::new_v4(), book_id)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn concurrent_borrows_yield_exactly_one_loan() {
        let (store, book_id) = store_with_book().await;
        let loans = LoansService::new(store.clone());

        let attempts = (0..8).map(|_| {
            let loans = loans.clone();
            tokio::spawn(async move { loans.borrow_book(authorized(Uuid::new_v4(), book_id)).await })
        });
        let mut succeeded = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            match attempt.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(err) => assert!(matches!(err, AppError::InvalidArgument(_))),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(store.loans_for_book(book_id).await.len(), 1);
    }

    #[tokio::test]
    async fn borrow_validates_id_and_existence() {
        let (store, _) = store_with_book().await;
        let loans = LoansService::new(store);

        let malformed = loans.borrow_book(authorized(Uuid::new_v4(), "not-an-id")).await;
        assert!(matches!(malformed, Err(AppError::InvalidArgument(_))));

        let missing = loans.borrow_book(authorized(Uuid::new_v4(), Uuid::new_v4())).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn store_failure_while_opening_loan_is_internal() {
        let book_id = Uuid::new_v4();
        let mut store = MockLibraryStore::new();
        store.expect_books_get_by_id().returning(move |id| {
            Ok(Some(crate::models::Book {
                id,
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                published_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
                status: BookStatus::Available,
            }))
        });
        store
            .expect_loans_open()
            .times(1)
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let loans = LoansService::new(Arc::new(store));
        let err = assert_err!(loans.borrow_book(authorized(Uuid::new_v4(), book_id)).await);
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn return_resets_late_book_and_allows_new_borrow() {
        let (store, book_id) = store_with_book().await;
        let loans = LoansService::new(store.clone());
        let now = Utc::now();

        let loan = loans.borrow_book_at(authorized(Uuid::new_v4(), book_id), now).await.unwrap();
        assert!(store.loans_mark_late(&loan).await.unwrap());

        let returned_at = now + Duration::days(9);
        let closed = loans
            .return_book_at(authorized(Uuid::new_v4(), book_id), returned_at)
            .await
            .unwrap();
        assert_eq!(closed.returned_at, Some(returned_at));

        let book = store.books_get_by_id(book_id).await.unwrap().unwrap();
        assert_eq!(book.status, BookStatus::Available);

        loans.borrow_book(authorized(Uuid::new_v4(), book_id)).await.unwrap();
        assert_eq!(store.loans_for_book(book_id).await.len(), 2);
    }

    #[tokio::test]
    async fn return_without_open_loan_is_not_found() {
        let (store, book_id) = store_with_book().await;
        let loans = LoansService::new(store);

        let err = loans.return_book(authorized(Uuid::new_v4(), book_id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
