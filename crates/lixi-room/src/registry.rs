//! Room registry: owns every live room and maps join codes to handles.
//!
//! One registry per process, constructed at startup and passed by
//! reference into every handler — never a module-level singleton. Rooms
//! exist for the lifetime of the process; there is no destroy path (this
//! is a live-event tool, not a persisted store).

use std::collections::HashMap;

use lixi_protocol::{RoomCode, StatusSnapshot};

use crate::actor::spawn_room;
use crate::{Room, RoomConfig, RoomError, RoomHandle, id::new_room_code};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Process-wide mapping from room code to the room's actor handle.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the config, generates a code that is unique against the
    /// live map (retrying on collision), spawns the room's actor, and
    /// returns the handle plus the initial status snapshot.
    pub fn create_room(
        &mut self,
        config: RoomConfig,
    ) -> Result<(RoomHandle, StatusSnapshot), RoomError> {
        let mut code = new_room_code();
        while self.rooms.contains_key(&code) {
            code = new_room_code();
        }

        let room = Room::new(code.clone(), config)?;
        let snapshot = room.status();
        let handle = spawn_room(room, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, total = self.rooms.len(), "room created");
        Ok((handle, snapshot))
    }

    /// Looks up a room by raw client input; the code is trimmed and
    /// upper-cased before the lookup so QR scans and typed codes behave
    /// identically.
    pub fn get(&self, raw_code: &str) -> Result<RoomHandle, RoomError> {
        let code = RoomCode::normalized(raw_code);
        self.rooms
            .get(&code)
            .cloned()
            .ok_or(RoomError::RoomNotFound(code))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }
}
