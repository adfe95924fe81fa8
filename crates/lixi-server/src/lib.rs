//! # lixi-server
//!
//! WebSocket front end for the lixi lucky-money room server.
//!
//! Clients connect, send JSON requests ([`lixi_protocol::ClientRequest`]),
//! and receive JSON replies plus — once subscribed to a room — the pushed
//! event stream ([`lixi_protocol::RoomEvent`]). All game rules live in
//! `lixi-room`; this crate only moves messages.

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{LixiServer, LixiServerBuilder};
