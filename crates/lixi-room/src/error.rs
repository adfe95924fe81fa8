//! Error types for the room layer.
//!
//! Every variant is a caller-input or state-precondition failure — none
//! is fatal, and none leaves a partial mutation behind. Each maps to a
//! stable machine-readable code that the presentation layer translates
//! into a localized notice.

use lixi_protocol::{PlayerId, PrizeId, RoomCode};

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room exists under that code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The player id is not a member of the room.
    #[error("player {0} not found in room")]
    PlayerNotFound(PlayerId),

    /// A join attempt with an empty (after trim) display name.
    #[error("player name is required")]
    NameRequired,

    /// An initial prize list entry that fails validation.
    #[error("invalid prize: {0}")]
    InvalidPrize(String),

    /// A cash prize with a zero amount.
    #[error("cash amount must be positive")]
    InvalidValue,

    /// A troll prize with an empty label.
    #[error("troll prize label must not be empty")]
    InvalidLabel,

    /// A prize quantity of zero where at least one unit is required.
    #[error("prize quantity must be positive")]
    InvalidQty,

    /// No prize entry exists under that id.
    #[error("prize {0} not found")]
    PrizeNotFound(PrizeId),

    /// A draw was attempted while the room was not in the Started phase.
    #[error("game is not running")]
    GameNotRunning,

    /// The draw trigger's effort magnitude was below the minimum gate.
    #[error("draw effort below minimum threshold")]
    DrawTooWeak,

    /// The player has used every allotted draw.
    #[error("player {0} is out of draws")]
    OutOfDraws(PlayerId),

    /// Every prize entry has been depleted.
    #[error("no prizes left in the pool")]
    NoPrizeLeft,

    /// The room's command channel is closed (actor gone).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// Stable SCREAMING_SNAKE wire code for this error, the string
    /// clients key their error handling on.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            Self::NameRequired => "NAME_REQUIRED",
            Self::InvalidPrize(_) => "INVALID_PRIZE",
            Self::InvalidValue => "INVALID_VALUE",
            Self::InvalidLabel => "INVALID_LABEL",
            Self::InvalidQty => "INVALID_QTY",
            Self::PrizeNotFound(_) => "PRIZE_NOT_FOUND",
            Self::GameNotRunning => "GAME_NOT_RUNNING",
            Self::DrawTooWeak => "DRAW_TOO_WEAK",
            Self::OutOfDraws(_) => "OUT_OF_DRAWS",
            Self::NoPrizeLeft => "NO_PRIZE_LEFT",
            Self::Unavailable(_) => "ROOM_UNAVAILABLE",
        }
    }
}
