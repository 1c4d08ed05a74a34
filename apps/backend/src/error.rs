use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::errors::ErrorCode;

/// RFC-7807 style error body. Every call into the board gets a structured
/// response, including unexpected store faults (reported as INTERNAL with
/// detail in the operator logs only).
#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    /// True when the request may be resent verbatim (no partial write occurred).
    pub retryable: bool,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {detail}")]
    Forbidden { code: ErrorCode, detail: String },
    #[error("Database error: {detail}")]
    Db { detail: String },
    #[error("Internal error: {detail}")]
    Internal { code: ErrorCode, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn bad_request(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Validation {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn forbidden(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::InternalError,
            detail: detail.into(),
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::NotFound { code, .. } => *code,
            AppError::Unauthorized => ErrorCode::Unauthorized,
            AppError::Forbidden { code, .. } => *code,
            AppError::Db { .. } => ErrorCode::DbError,
            AppError::Internal { code, .. } => *code,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Validation { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::NotFound { detail, .. }
            | AppError::Forbidden { detail, .. } => detail.clone(),
            AppError::Unauthorized => "Authentication required".to_string(),
            // Operational detail stays in the logs; callers get a generic line.
            AppError::Db { .. } | AppError::Internal { .. } | AppError::Config { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Db { .. } | AppError::Internal { .. } | AppError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True when the caller may resend the identical request; no partial
    /// write has occurred.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::LockContention | ErrorCode::OptimisticLock
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = %self.code(), error = %self, "request rejected");
        }
        HttpResponse::build(status).json(ProblemDetails {
            type_: "about:blank".to_string(),
            title: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            status: status.as_u16(),
            detail: self.detail(),
            code: self.code().to_string(),
            retryable: self.is_retryable(),
        })
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(kind, detail) => AppError::Validation {
                code: match kind {
                    ValidationKind::OutOfTurn => ErrorCode::OutOfTurn,
                    ValidationKind::CardNotInHand => ErrorCode::CardNotInHand,
                    ValidationKind::IllegalCombination => ErrorCode::IllegalCombination,
                    ValidationKind::IllegalFirstPlay => ErrorCode::IllegalFirstPlay,
                    ValidationKind::PassWhileLeading => ErrorCode::PassWhileLeading,
                    ValidationKind::PhaseMismatch => ErrorCode::PhaseMismatch,
                    ValidationKind::RoomFull => ErrorCode::RoomFull,
                    ValidationKind::RoomNotJoinable => ErrorCode::RoomNotJoinable,
                    ValidationKind::NameTaken => ErrorCode::NameTaken,
                    ValidationKind::EmptyName => ErrorCode::EmptyName,
                    ValidationKind::AlreadySeated => ErrorCode::AlreadySeated,
                    ValidationKind::MalformedCards => ErrorCode::MalformedCards,
                    _ => ErrorCode::ValidationError,
                },
                detail,
            },
            DomainError::Conflict(kind, detail) => AppError::Conflict {
                code: match kind {
                    ConflictKind::SeatTaken => ErrorCode::SeatTaken,
                    ConflictKind::JoinCodeConflict => ErrorCode::JoinCodeConflict,
                    ConflictKind::LockUnavailable => ErrorCode::LockContention,
                    ConflictKind::LeaseHeld => ErrorCode::LeaseHeld,
                    ConflictKind::OptimisticLock => ErrorCode::OptimisticLock,
                    ConflictKind::UniqueViolation => ErrorCode::UniqueViolation,
                    ConflictKind::Other(_) => ErrorCode::Conflict,
                },
                detail,
            },
            DomainError::NotFound(kind, detail) => AppError::NotFound {
                code: match kind {
                    NotFoundKind::Room => ErrorCode::RoomNotFound,
                    NotFoundKind::Seat => ErrorCode::SeatNotFound,
                    NotFoundKind::GameState => ErrorCode::GameStateNotFound,
                    NotFoundKind::QueueEntry => ErrorCode::QueueEntryNotFound,
                    NotFoundKind::Other(_) => ErrorCode::RoomNotFound,
                },
                detail,
            },
            DomainError::Forbidden(detail) => AppError::Forbidden {
                code: ErrorCode::Forbidden,
                detail,
            },
            DomainError::Infra(_, detail) => AppError::Db { detail },
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::from(DomainError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    async fn problem_body(err: &AppError) -> serde_json::Value {
        let resp = err.error_response();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn lock_contention_is_reported_retryable() {
        let err = AppError::from(DomainError::conflict(
            ConflictKind::LockUnavailable,
            "row locked",
        ));
        let body = problem_body(&err).await;
        assert_eq!(body["status"], 409);
        assert_eq!(body["code"], "LOCK_CONTENTION");
        assert_eq!(body["retryable"], true);
    }

    #[actix_web::test]
    async fn unique_violations_are_conflicts_but_not_retryable() {
        let err = AppError::from(DomainError::conflict(
            ConflictKind::UniqueViolation,
            "duplicate key value violates unique constraint",
        ));
        let body = problem_body(&err).await;
        assert_eq!(body["status"], 409);
        assert_eq!(body["code"], "UNIQUE_VIOLATION");
        assert_eq!(body["retryable"], false);
    }

    #[actix_web::test]
    async fn unclassified_conflicts_are_not_retryable() {
        let err = AppError::from(DomainError::conflict(
            ConflictKind::Other("STATE".into()),
            "room already closed",
        ));
        let body = problem_body(&err).await;
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["retryable"], false);
    }
}
