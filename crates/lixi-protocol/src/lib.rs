//! Wire protocol for the lixi lucky-money room server.
//!
//! This crate defines the language clients and server speak:
//!
//! - **Types** ([`ClientRequest`], [`ServerMessage`], [`RoomEvent`],
//!   [`StatusSnapshot`], the id newtypes) — the structures that travel
//!   on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer knows nothing about rooms or connections; it only
//! knows shapes. The room crate gives the shapes behavior, the server
//! crate moves them over WebSocket.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientRequest, PlayerId, PlayerSummary, PrizeEntry, PrizeId, PrizeKind,
    PrizeSpec, Receipt, Reply, RoomCode, RoomEvent, RoomMode, ServerMessage,
    StatusSnapshot, WinnerRecord,
};
