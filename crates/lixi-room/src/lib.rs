//! Room management for the lixi lucky-money server.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! prize pool, players, winner feed, and subscriber set. Callers hold a
//! cheap [`RoomHandle`] and talk to the actor over a command channel,
//! which serializes all mutations per room.
//!
//! # Key types
//!
//! - [`Room`] — lifecycle flags, players, and the draw engine
//! - [`PrizePool`] — ordered, depletable prize entries
//! - [`RoomRegistry`] — maps join codes to live rooms
//! - [`RoomHandle`] — send operations to a running room actor
//! - [`RoomError`] — every caller-input and precondition failure

pub mod id;

mod actor;
mod error;
mod prize;
mod registry;
mod room;

pub use actor::{DrawReply, JoinReply, RoomHandle, Subscriber, SubscriberId};
pub use error::RoomError;
pub use prize::{MAX_PRIZE_AMOUNT, MAX_PRIZE_QTY, PrizePool, format_vnd};
pub use registry::RoomRegistry;
pub use room::{
    DEFAULT_HOST_NAME, DrawOutcome, MAX_DRAWS_PER_PLAYER, MIN_DRAWS_PER_PLAYER,
    MIN_EFFORT, Player, Room, RoomConfig, WINNER_WINDOW, default_prizes,
};
