//! Overdue sweeper: periodically flags books whose loan is past due as `Late`.
//!
//! The sweeper runs outside the gate as a trusted internal task. It takes no
//! lock across records, so a borrow or return landing mid-sweep can race with
//! a status write. The `Borrowed -> Late` write is conditioned on the listed
//! loan still being open, so a book returned and borrowed again mid-sweep is
//! left alone.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{
    error::AppResult,
    models::{BookStatus, Loan},
    repository::Repository,
};

/// Shortest period the background task will tick at
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Outcome of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Overdue open loans considered
    pub examined: usize,
    /// Books moved from `Borrowed` to `Late`
    pub marked_late: usize,
    /// Books already `Late` (or otherwise not `Borrowed`)
    pub skipped: usize,
    /// Loans whose lookup or update failed
    pub failed: usize,
}

#[derive(Clone)]
pub struct OverdueSweeper {
    repository: Repository,
}

impl OverdueSweeper {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Sweep every open loan past due at `now`.
    ///
    /// Only the initial listing can fail the run. Per-loan failures are logged
    /// and counted; the next scheduled run retries them.
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let overdue = self.repository.loans_overdue(now).await?;
        let mut report = SweepReport::default();

        for loan in &overdue {
            report.examined += 1;
            match self.sweep_loan(loan).await {
                Ok(true) => report.marked_late += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(
                        loan_id = %loan.id,
                        book_id = %loan.book_id,
                        error = %e,
                        "Failed to update overdue book"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn sweep_loan(&self, loan: &Loan) -> AppResult<bool> {
        let Some(book) = self.repository.books_get_by_id(loan.book_id).await? else {
            tracing::warn!(loan_id = %loan.id, book_id = %loan.book_id, "Overdue loan references a missing book");
            return Ok(false);
        };

        if book.status != BookStatus::Borrowed {
            return Ok(false);
        }

        let updated = self.repository.loans_mark_late(loan).await?;
        if updated {
            tracing::info!(book_id = %book.id, loan_id = %loan.id, "Book status updated to Late");
        }
        Ok(updated)
    }

    /// Run the sweep every `period` on its own task, starting immediately.
    /// Periods shorter than [`MIN_SWEEP_PERIOD`] are raised to it.
    pub fn start(self, period: Duration) -> JoinHandle<()> {
        let period = period.max(MIN_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval_timer.tick().await;
                tracing::debug!("Running overdue sweep");

                match self.sweep(Utc::now()).await {
                    Ok(report) => tracing::info!(
                        examined = report.examined,
                        marked_late = report.marked_late,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Overdue sweep finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Overdue sweep failed"),
                }
            }
        })
    }
}
