//! Reasons a room refuses an inbound event.
//!
//! None of these reach the client. The gateway logs them and drops the event.

/// Result alias for room operations.
pub type Result<T> = std::result::Result<T, GameError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("connection is not a member of this room")]
    NotMember,
    #[error("only the host may do this")]
    NotHost,
    #[error("a round is already in progress")]
    RoundInProgress,
    #[error("no round is active")]
    NotActive,
    #[error("answers are not being collected")]
    NotCollecting,
    #[error("answers already submitted for this round")]
    AlreadySubmitted,
    #[error("no round result is stored")]
    NoResults,
    #[error("unknown player")]
    UnknownPlayer,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("entry already scores zero")]
    NothingToInvalidate,
    #[error("room was torn down")]
    RoomClosed,
    #[error("name must not be empty")]
    InvalidName,
}
