//! Transaction-scoped advisory locks for lobby serialization.
//!
//! Seat joins for a room serialize on an advisory lock keyed by the join
//! code, a scope deliberately distinct from GameState row locking so lobby
//! churn never contends with move throughput. The lock is
//! transaction-scoped (`pg_advisory_xact_lock`), not session-scoped: a
//! session lock acquired and released on different pooled connections
//! leaks, a transaction lock cannot outlive its transaction.

use sea_orm::{ConnectionTrait, DatabaseTransaction, DbBackend, Statement};
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::domain::DomainError;

pub fn advisory_lock_id(key: &str) -> i64 {
    xxh3_64(key.as_bytes()) as i64
}

/// Serialize all concurrent joiners of one room. Blocks until acquired;
/// released automatically at transaction end.
pub async fn seat_join_lock(txn: &DatabaseTransaction, join_code: &str) -> Result<(), DomainError> {
    let lock_key = advisory_lock_id(&format!("seat:{join_code}"));

    match txn.get_database_backend() {
        DbBackend::Postgres => {
            txn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock($1)",
                vec![lock_key.into()],
            ))
            .await?;
            Ok(())
        }
        // SQLite serializes writers on its own; nothing to acquire.
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_id_is_stable_for_a_code() {
        assert_eq!(
            advisory_lock_id("seat:ABC234"),
            advisory_lock_id("seat:ABC234")
        );
    }

    #[test]
    fn lock_id_differs_between_codes() {
        assert_ne!(
            advisory_lock_id("seat:ABC234"),
            advisory_lock_id("seat:XYZ789")
        );
    }
}
