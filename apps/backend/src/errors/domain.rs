//! Domain-level error type used across services and repos.
//!
//! This error type is HTTP- and DB-agnostic. Handlers should return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use sea_orm::{DbErr, SqlErr};

/// Rule/input violations. Always surfaced verbatim to the caller and
/// never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    OutOfTurn,
    CardNotInHand,
    IllegalCombination,
    IllegalFirstPlay,
    PassWhileLeading,
    PhaseMismatch,
    RoomFull,
    RoomNotJoinable,
    NameTaken,
    EmptyName,
    AlreadySeated,
    MalformedCards,
    Other(String),
}

/// Semantic conflicts. `LockUnavailable` and `LeaseHeld` are the
/// caller-visible "retry" signals; no partial write has occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    SeatTaken,
    JoinCodeConflict,
    LockUnavailable,
    LeaseHeld,
    OptimisticLock,
    UniqueViolation,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Room,
    Seat,
    GameState,
    QueueEntry,
    Other(String),
}

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input/user validation or business rule violation
    Validation(ValidationKind, String),
    /// Semantic conflict
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Authorization failure (caller may not act for this seat/room)
    Forbidden(String),
    /// Infrastructure/operational failures
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Forbidden(d) => write!(f, "forbidden: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn validation_other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::Validation(ValidationKind::Other(detail.clone()), detail)
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }

    /// True when the caller may safely retry the identical request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Conflict(ConflictKind::LockUnavailable, _)
                | DomainError::Conflict(ConflictKind::OptimisticLock, _)
        )
    }
}

/// Postgres "lock_not_available" (raised by FOR UPDATE NOWAIT).
const PG_LOCK_NOT_AVAILABLE: &str = "55P03";

fn is_lock_unavailable(message: &str) -> bool {
    message.contains(PG_LOCK_NOT_AVAILABLE) || message.contains("could not obtain lock")
}

impl From<DbErr> for DomainError {
    fn from(err: DbErr) -> Self {
        if let Some(sql_err) = err.sql_err() {
            if matches!(sql_err, SqlErr::UniqueConstraintViolation(_)) {
                return DomainError::conflict(ConflictKind::UniqueViolation, err.to_string());
            }
        }
        match &err {
            DbErr::Query(runtime) | DbErr::Exec(runtime)
                if is_lock_unavailable(&runtime.to_string()) =>
            {
                DomainError::conflict(ConflictKind::LockUnavailable, err.to_string())
            }
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                DomainError::infra(InfraErrorKind::DbUnavailable, err.to_string())
            }
            _ => DomainError::infra(InfraErrorKind::Other("DB".into()), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::RuntimeErr;

    use super::*;

    #[test]
    fn nowait_lock_failure_maps_to_a_retryable_conflict() {
        let err = DbErr::Query(RuntimeErr::Internal(
            "error returned from database: 55P03: could not obtain lock on row".into(),
        ));
        let domain = DomainError::from(err);
        assert!(matches!(
            domain,
            DomainError::Conflict(ConflictKind::LockUnavailable, _)
        ));
        assert!(domain.is_retryable());
    }

    #[test]
    fn other_query_failures_stay_infra_errors() {
        let err = DbErr::Query(RuntimeErr::Internal("syntax error at or near".into()));
        let domain = DomainError::from(err);
        assert!(matches!(domain, DomainError::Infra(_, _)));
        assert!(!domain.is_retryable());
    }

    #[test]
    fn unique_violations_are_not_retryable() {
        let domain =
            DomainError::conflict(ConflictKind::UniqueViolation, "duplicate key value");
        assert!(!domain.is_retryable());
    }
}
