//! Core wire types for the lixi protocol.
//!
//! Everything in this module travels between client and server as JSON:
//! identifiers, prize shapes, the full room status snapshot, client
//! requests, and the pushed event stream. The room crate layers behavior
//! on top of these shapes; this crate only defines the language.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room's short join code.
///
/// Codes are 6-digit numeric strings, human-enterable and shown in QR
/// links. Lookups are normalized (trimmed, upper-cased) on both write and
/// read, so `" 123456 "` and `"123456"` resolve to the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Builds a code from raw client input, applying the canonical form.
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a joined player, assigned at join time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a prize entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrizeId(String);

impl PrizeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrizeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room mode
// ---------------------------------------------------------------------------

/// How the room is played.
///
/// `Local` is a legacy pass-the-phone variant; the server only carries the
/// flag through to clients, it does not change any rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    #[default]
    Online,
    Local,
}

// ---------------------------------------------------------------------------
// Prizes
// ---------------------------------------------------------------------------

/// What kind of prize an entry is, with the kind-specific fields inline.
///
/// Cash prizes carry a positive amount in đồng plus its pre-formatted
/// display string; troll prizes are novelty labels with no value.
/// `#[serde(tag = "kind")]` keeps the wire shape flat:
/// `{ "kind": "cash", "amount": 500000, "formatted": "500.000đ", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PrizeKind {
    Cash { amount: u64, formatted: String },
    Troll,
}

/// One depletable prize class in a room's pool.
///
/// `remaining` is decremented by exactly one on each successful draw of
/// this entry; an entry at zero stays in the list for display but is
/// excluded from the drawable pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeEntry {
    pub id: PrizeId,
    #[serde(flatten)]
    pub kind: PrizeKind,
    pub label: String,
    pub remaining: u32,
}

impl PrizeEntry {
    /// The text a winner sees: the formatted cash string for cash prizes,
    /// the label for troll prizes.
    pub fn prize_text(&self) -> &str {
        match &self.kind {
            PrizeKind::Cash { formatted, .. } => formatted,
            PrizeKind::Troll => &self.label,
        }
    }

    /// Cash amount in đồng, if this is a cash prize.
    pub fn cash_amount(&self) -> Option<u64> {
        match self.kind {
            PrizeKind::Cash { amount, .. } => Some(amount),
            PrizeKind::Troll => None,
        }
    }

    pub fn is_drawable(&self) -> bool {
        self.remaining > 0
    }
}

/// A prize description supplied by the host when creating a room, before
/// the server has assigned ids or formatted amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PrizeSpec {
    Cash {
        amount: u64,
        qty: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Troll {
        label: String,
        qty: u32,
    },
}

// ---------------------------------------------------------------------------
// Status snapshot
// ---------------------------------------------------------------------------

/// One line in a player's personal win history, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Epoch milliseconds.
    pub at: u64,
    pub prize_text: String,
}

/// One line in the room's public winner feed, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    /// Epoch milliseconds.
    pub at: u64,
    pub player_id: PlayerId,
    pub player_name: String,
    pub prize_text: String,
}

/// What clients see of a player in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub draws_used: u32,
}

/// The full read-only projection of a room, pushed to every subscriber
/// after each mutation and returned by status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub code: RoomCode,
    pub host_name: String,
    pub mode: RoomMode,
    pub draws_per_player: u32,
    pub started: bool,
    pub ended: bool,
    pub total_players: usize,
    /// Sum of `remaining` over all entries.
    pub total_prizes: u32,
    /// Sum of `amount * remaining` over cash entries, in đồng.
    pub total_budget: u64,
    pub prizes: Vec<PrizeEntry>,
    pub players: Vec<PlayerSummary>,
    /// Most-recent-first, capped to a 20-item window for transmission.
    pub winners: Vec<WinnerRecord>,
}

// ---------------------------------------------------------------------------
// Client requests
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// Internally tagged so the JSON reads naturally:
/// `{ "type": "draw", "code": "123456", "player_id": "...", "effort": 18.4 }`.
///
/// Room codes arrive as raw strings and are normalized server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    CreateRoom {
        #[serde(default)]
        host_name: Option<String>,
        #[serde(default)]
        mode: Option<RoomMode>,
        #[serde(default)]
        draws_per_player: Option<u32>,
        /// When absent, the server seeds the default cash chips.
        #[serde(default)]
        prizes: Option<Vec<PrizeSpec>>,
    },
    GetStatus {
        code: String,
    },
    Join {
        code: String,
        name: String,
    },
    Start {
        code: String,
    },
    End {
        code: String,
    },
    AddCashPrize {
        code: String,
        #[serde(default)]
        label: Option<String>,
        amount: u64,
        qty: u32,
    },
    AddTrollPrize {
        code: String,
        label: String,
        qty: u32,
    },
    SetPrizeQty {
        code: String,
        prize_id: PrizeId,
        qty: u32,
    },
    RemovePrize {
        code: String,
        prize_id: PrizeId,
    },
    Draw {
        code: String,
        player_id: PlayerId,
        /// Gesture magnitude from the client's shake detector. The server
        /// only uses it for the minimum-effort gate.
        effort: f64,
    },
    Subscribe {
        code: String,
    },
}

// ---------------------------------------------------------------------------
// Pushed events
// ---------------------------------------------------------------------------

/// A named event pushed to every live subscriber of a room.
///
/// Adjacently tagged (`event` + `data`) so the names match the event
/// stream clients key their handlers on: `player_joined`, `room_status`,
/// `prize_won`, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Full snapshot; sent immediately on subscribe and after every
    /// mutation, always after the mutation's semantic event.
    RoomStatus(StatusSnapshot),
    PlayerJoined { id: PlayerId, name: String },
    GameStarted,
    GameEnded,
    PrizePoolUpdated(Vec<PrizeEntry>),
    PrizeWon {
        player_id: PlayerId,
        player_name: String,
        prize: PrizeEntry,
        prize_text: String,
    },
    WinnerAdded(WinnerRecord),
    /// Keep-alive heartbeat; `t` is epoch milliseconds.
    Ping { t: u64 },
}

// ---------------------------------------------------------------------------
// Server messages
// ---------------------------------------------------------------------------

/// A direct answer to one `ClientRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    RoomCreated {
        code: RoomCode,
        room: StatusSnapshot,
    },
    Status(StatusSnapshot),
    Joined {
        player_id: PlayerId,
        player_name: String,
        room: StatusSnapshot,
    },
    /// Acknowledgement for start/end.
    Ok,
    DrawResult {
        prize: PrizeEntry,
        prize_text: String,
        receipts: Vec<Receipt>,
    },
}

/// Everything the server can send down a connection: request replies,
/// pushed room events, or an error with a stable machine-readable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Reply(Reply),
    Event(RoomEvent),
    Error { code: String, message: String },
}
