//! Error codes for the Big Two backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the Big Two backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    Unauthorized,
    Forbidden,

    // Move validation
    OutOfTurn,
    CardNotInHand,
    IllegalCombination,
    IllegalFirstPlay,
    PassWhileLeading,
    PhaseMismatch,
    MalformedCards,

    // Lobby validation
    RoomFull,
    RoomNotJoinable,
    NameTaken,
    EmptyName,
    AlreadySeated,
    RankedNoBots,

    // Conflicts
    SeatTaken,
    JoinCodeConflict,
    LockContention,
    LeaseHeld,
    OptimisticLock,
    UniqueViolation,
    Conflict,

    // Resource Not Found
    RoomNotFound,
    SeatNotFound,
    GameStateNotFound,
    QueueEntryNotFound,

    // General
    ValidationError,
    InternalError,
    ConfigError,
    DbError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::OutOfTurn => "OUT_OF_TURN",
            ErrorCode::CardNotInHand => "CARD_NOT_IN_HAND",
            ErrorCode::IllegalCombination => "ILLEGAL_COMBINATION",
            ErrorCode::IllegalFirstPlay => "ILLEGAL_FIRST_PLAY",
            ErrorCode::PassWhileLeading => "PASS_WHILE_LEADING",
            ErrorCode::PhaseMismatch => "PHASE_MISMATCH",
            ErrorCode::MalformedCards => "MALFORMED_CARDS",
            ErrorCode::RoomFull => "ROOM_FULL",
            ErrorCode::RoomNotJoinable => "ROOM_NOT_JOINABLE",
            ErrorCode::NameTaken => "NAME_TAKEN",
            ErrorCode::EmptyName => "EMPTY_NAME",
            ErrorCode::AlreadySeated => "ALREADY_SEATED",
            ErrorCode::RankedNoBots => "RANKED_NO_BOTS",
            ErrorCode::SeatTaken => "SEAT_TAKEN",
            ErrorCode::JoinCodeConflict => "JOIN_CODE_CONFLICT",
            ErrorCode::LockContention => "LOCK_CONTENTION",
            ErrorCode::LeaseHeld => "LEASE_HELD",
            ErrorCode::OptimisticLock => "OPTIMISTIC_LOCK",
            ErrorCode::UniqueViolation => "UNIQUE_VIOLATION",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::SeatNotFound => "SEAT_NOT_FOUND",
            ErrorCode::GameStateNotFound => "GAME_STATE_NOT_FOUND",
            ErrorCode::QueueEntryNotFound => "QUEUE_ENTRY_NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InternalError => "INTERNAL",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::DbError => "DB_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
