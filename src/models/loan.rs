//! Loan (borrowed book) model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Grace period granted to every loan
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// Loan record from the `borrowed_books` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub borrowed_date: DateTime<Utc>,
    /// Due date, always `borrowed_date` plus the loan period
    pub return_date: DateTime<Utc>,
    /// Set when the book comes back; `None` while the loan is open
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// Open a new loan starting at `now`
    pub fn new(book_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            user_id,
            borrowed_date: now,
            return_date: now + Duration::days(LOAN_PERIOD_DAYS),
            returned_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Strictly past the due date and still open
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && now > self.return_date
    }
}
