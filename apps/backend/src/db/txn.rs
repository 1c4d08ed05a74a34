use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::error::AppError;

/// The boxed future a [`with_txn`] closure returns; it may borrow the
/// transaction for its whole lifetime.
pub type TxnFuture<'c, R> = Pin<Box<dyn Future<Output = Result<R, AppError>> + Send + 'c>>;

/// Execute a function within a database transaction.
///
/// Begin → run closure → commit on Ok / rollback on Err. Every mutating
/// procedure on the board is exactly one such transaction; there is no
/// long-running in-process game loop holding state across requests.
/// Call sites wrap their body in `Box::pin(async move { .. })`.
pub async fn with_txn<R, F>(db: &DatabaseConnection, f: F) -> Result<R, AppError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxnFuture<'c, R>,
{
    let txn = db.begin().await?;
    let out = f(&txn).await;

    match out {
        Ok(val) => {
            txn.commit().await?;
            Ok(val)
        }
        Err(err) => {
            // Best-effort rollback; preserve original error
            let _ = txn.rollback().await;
            Err(err)
        }
    }
}

/// Bounded retry for NOWAIT lock contention. Each attempt is a fresh
/// transaction; anything non-retryable propagates immediately. A retried
/// request that lost its turn in the meantime is rejected by turn
/// re-validation inside the operation, which is the correct outcome.
pub async fn retry_contended<R, F, Fut>(op: F) -> Result<R, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<R, AppError>>,
{
    const ATTEMPTS: u32 = 3;

    let mut last = None;
    for attempt in 0..ATTEMPTS {
        match op().await {
            Ok(val) => return Ok(val),
            Err(err) if err.is_retryable() && attempt + 1 < ATTEMPTS => {
                tracing::debug!(attempt, "lock contention, retrying");
                tokio::time::sleep(Duration::from_millis(25 * (attempt as u64 + 1))).await;
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    // Unreachable with ATTEMPTS > 0; the loop returns on the last attempt.
    Err(last.unwrap_or_else(|| AppError::internal("retry loop exhausted")))
}
