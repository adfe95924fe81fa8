//! One game session: lifecycle, players, and the draw engine.
//!
//! `Room` is plain synchronous state. Every mutation is a short critical
//! section with validation up front, so a failed operation never leaves a
//! partial write behind. Serialization of concurrent callers is the
//! actor's job ([`crate::actor`]); nothing here locks.

use lixi_protocol::{
    PlayerId, PlayerSummary, PrizeEntry, PrizeId, PrizeSpec, Receipt,
    RoomCode, RoomMode, StatusSnapshot, WinnerRecord,
};
use rand::Rng;

use crate::{
    PrizePool, RoomError,
    id::{new_entity_id, now_ms},
};

/// Minimum gesture magnitude for a draw to count. Anything below this is
/// sensor noise or a half-hearted nudge and is rejected outright.
pub const MIN_EFFORT: f64 = 12.0;

/// Bounds for `draws_per_player`; host input is clamped into this range.
pub const MIN_DRAWS_PER_PLAYER: u32 = 1;
pub const MAX_DRAWS_PER_PLAYER: u32 = 50;

/// How many winner records a status snapshot carries.
pub const WINNER_WINDOW: usize = 20;

/// Fallback host display name ("the host" in Vietnamese drinking slang).
pub const DEFAULT_HOST_NAME: &str = "Chủ Xị";

/// Host-supplied settings for a new room.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub host_name: String,
    pub mode: RoomMode,
    /// Clamped to `[1, 50]` at construction.
    pub draws_per_player: u32,
    pub prizes: Vec<PrizeSpec>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            host_name: DEFAULT_HOST_NAME.to_string(),
            mode: RoomMode::Online,
            draws_per_player: 1,
            prizes: default_prizes(),
        }
    }
}

/// The preset cash chips seeded when the host doesn't pick any prizes:
/// 500k ×1, 200k ×1, 100k ×2, 50k ×5.
pub fn default_prizes() -> Vec<PrizeSpec> {
    [(500_000, 1), (200_000, 1), (100_000, 2), (50_000, 5)]
        .into_iter()
        .map(|(amount, qty)| PrizeSpec::Cash { amount, qty, label: None })
        .collect()
}

/// One joined participant.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: u64,
    pub draws_used: u32,
    /// Most-recent-first. Unbounded; clients display a prefix.
    pub receipts: Vec<Receipt>,
}

/// Everything a successful draw produced, for the reply and the fan-out.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    /// The chosen entry after its decrement.
    pub prize: PrizeEntry,
    pub prize_text: String,
    pub player_name: String,
    pub winner: WinnerRecord,
    /// The drawing player's full receipt list, newest first.
    pub receipts: Vec<Receipt>,
}

/// One hosted game session.
///
/// Lifecycle phases are two idempotent flags: `start()` always forces
/// started, `end()` always forces ended, and starting an ended room
/// re-enters the running phase.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host_name: String,
    mode: RoomMode,
    draws_per_player: u32,
    started: bool,
    ended: bool,
    pool: PrizePool,
    /// Join order preserved; ids are generated so uniqueness holds.
    players: Vec<Player>,
    /// Most-recent-first; truncated to [`WINNER_WINDOW`] in snapshots.
    winners: Vec<WinnerRecord>,
}

impl Room {
    /// Builds a room from host config, clamping `draws_per_player` and
    /// validating the initial prize list.
    pub fn new(code: RoomCode, config: RoomConfig) -> Result<Self, RoomError> {
        let host_name = {
            let trimmed = config.host_name.trim();
            if trimmed.is_empty() {
                DEFAULT_HOST_NAME.to_string()
            } else {
                trimmed.to_string()
            }
        };
        Ok(Self {
            code,
            host_name,
            mode: config.mode,
            draws_per_player: config
                .draws_per_player
                .clamp(MIN_DRAWS_PER_PLAYER, MAX_DRAWS_PER_PLAYER),
            started: false,
            ended: false,
            pool: PrizePool::from_specs(&config.prizes)?,
            players: Vec::new(),
            winners: Vec::new(),
        })
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn draws_per_player(&self) -> u32 {
        self.draws_per_player
    }

    /// A draw is permitted only in this phase.
    pub fn is_running(&self) -> bool {
        self.started && !self.ended
    }

    /// Forces the running phase. Idempotent; also re-opens an ended room.
    pub fn start(&mut self) {
        self.started = true;
        self.ended = false;
    }

    /// Forces the ended phase. Idempotent.
    pub fn end(&mut self) {
        self.ended = true;
        self.started = false;
    }

    /// Adds a player. Display names are trimmed and must be non-empty;
    /// duplicates are allowed (two cousins can both be "Minh").
    pub fn join(&mut self, name: &str) -> Result<&Player, RoomError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoomError::NameRequired);
        }
        self.players.push(Player {
            id: PlayerId::new(new_entity_id()),
            name: name.to_string(),
            joined_at: now_ms(),
            draws_used: 0,
            receipts: Vec::new(),
        });
        Ok(self.players.last().unwrap())
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn pool(&self) -> &PrizePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut PrizePool {
        &mut self.pool
    }

    /// The core draw: validate, pick uniformly over distinct drawable
    /// entries, then mutate.
    ///
    /// Preconditions are checked in a fixed order (player, phase, effort,
    /// turn budget, pool) and the first violation wins, so error
    /// reporting is deterministic. Only after every check passes does the
    /// multi-field update happen, which makes it atomic from any
    /// observer's point of view.
    pub fn draw<R: Rng>(
        &mut self,
        player_id: &PlayerId,
        effort: f64,
        rng: &mut R,
    ) -> Result<DrawOutcome, RoomError> {
        let player_idx = self
            .players
            .iter()
            .position(|p| &p.id == player_id)
            .ok_or_else(|| RoomError::PlayerNotFound(player_id.clone()))?;
        if !self.is_running() {
            return Err(RoomError::GameNotRunning);
        }
        if !effort.is_finite() || effort < MIN_EFFORT {
            return Err(RoomError::DrawTooWeak);
        }
        if self.players[player_idx].draws_used >= self.draws_per_player {
            return Err(RoomError::OutOfDraws(player_id.clone()));
        }
        let entry_idx = self.pool.pick_drawable(rng).ok_or(RoomError::NoPrizeLeft)?;

        // All checks passed — the multi-field update below is the only
        // mutation path and runs to completion.
        let prize = self.pool.take_one(entry_idx).clone();
        let prize_text = prize.prize_text().to_string();
        let at = now_ms();

        let player = &mut self.players[player_idx];
        player.draws_used += 1;
        player.receipts.insert(
            0,
            Receipt { at, prize_text: prize_text.clone() },
        );

        // The public winner feed shows the label even for cash prizes;
        // the formatted amount is only on the winner's own receipt.
        let winner = WinnerRecord {
            at,
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            prize_text: prize.label.clone(),
        };
        self.winners.insert(0, winner.clone());

        tracing::info!(
            room = %self.code,
            player = %player.id,
            prize = %prize.label,
            remaining = prize.remaining,
            "prize drawn"
        );

        Ok(DrawOutcome {
            prize,
            prize_text,
            player_name: self.players[player_idx].name.clone(),
            winner,
            receipts: self.players[player_idx].receipts.clone(),
        })
    }

    /// The full read-only projection pushed to subscribers after every
    /// mutation.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            code: self.code.clone(),
            host_name: self.host_name.clone(),
            mode: self.mode,
            draws_per_player: self.draws_per_player,
            started: self.started,
            ended: self.ended,
            total_players: self.players.len(),
            total_prizes: self.pool.total_remaining(),
            total_budget: self.pool.total_cash_budget(),
            prizes: self.pool.entries().to_vec(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSummary {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    draws_used: p.draws_used,
                })
                .collect(),
            winners: self.winners.iter().take(WINNER_WINDOW).cloned().collect(),
        }
    }
}
