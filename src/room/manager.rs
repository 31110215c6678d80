//! Registry of rooms.
//!
//! Lookups for different room names only contend on the map shard; all
//! per-room mutation happens behind the room's own lock.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::GameSettings;
use crate::error::{GameError, Result};
use crate::room::player::Outbox;
use crate::room::session::{Departure, Room};
use crate::util::id::ConnId;

#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: DashMap<String, Arc<Room>>,
    settings: GameSettings,
}

impl RoomManager {
    pub fn new(settings: GameSettings) -> Self {
        Self { rooms: DashMap::new(), settings }
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    /// Returns the named room, creating an empty one on first reference.
    pub fn resolve(&self, name: &str) -> Arc<Room> {
        match self.rooms.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let room = Arc::new(Room::new(name, self.settings));
                entry.insert(room.clone());
                tracing::info!(room = %name, "room created");
                room
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Room>> {
        self.rooms.get(name).map(|r| r.clone())
    }

    /// Unregisters `room`. A newer room registered under the same name is kept.
    pub fn remove(&self, room: &Arc<Room>) {
        if self.rooms.remove_if(room.name(), |_, current| Arc::ptr_eq(current, room)).is_some() {
            tracing::info!(room = %room.name(), "room destroyed");
        }
    }

    /// Joins the named room, creating it if needed.
    ///
    /// A room torn down between lookup and join is unregistered and the join
    /// retried against a fresh room.
    pub fn join(&self, name: &str, id: ConnId, player_name: &str, tx: &Outbox) -> Result<Arc<Room>> {
        loop {
            let room = self.resolve(name);
            match room.join(id, player_name.to_string(), tx.clone()) {
                Ok(()) => return Ok(room),
                Err(GameError::RoomClosed) => self.remove(&room),
                Err(err) => return Err(err),
            }
        }
    }

    /// Removes the player and tears the room down if it emptied.
    pub fn leave(&self, room: &Arc<Room>, id: ConnId) -> Result<()> {
        if room.leave(id)? == Departure::Emptied {
            self.remove(room);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn resolve_creates_once() {
        let rooms = RoomManager::default();
        let a = rooms.resolve("sala");
        let b = rooms.resolve("sala");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(rooms.len(), 1);
        rooms.resolve("outra");
        assert_eq!(rooms.len(), 2);
    }

    #[test]
    fn last_leave_destroys_room() {
        let rooms = RoomManager::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = ConnId::new();
        let room = rooms.join("sala", id, "Ana", &tx).unwrap();
        rooms.leave(&room, id).unwrap();
        assert!(rooms.get("sala").is_none());
        assert!(room.is_closed());

        let fresh = rooms.join("sala", ConnId::new(), "Bia", &tx).unwrap();
        assert!(!Arc::ptr_eq(&room, &fresh));
        assert_eq!(fresh.players().len(), 1);
    }

    #[test]
    fn stale_handle_does_not_remove_new_room() {
        let rooms = RoomManager::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = ConnId::new();
        let old = rooms.join("sala", id, "Ana", &tx).unwrap();
        rooms.leave(&old, id).unwrap();
        let new = rooms.resolve("sala");
        rooms.remove(&old);
        assert!(rooms.get("sala").is_some_and(|r| Arc::ptr_eq(&r, &new)));
    }

    #[test]
    fn join_skips_closed_room() {
        let rooms = RoomManager::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = ConnId::new();
        let old = rooms.join("sala", id, "Ana", &tx).unwrap();
        // Simulate a leave that closed the room but has not unregistered it yet.
        assert_eq!(old.leave(id).unwrap(), Departure::Emptied);
        assert!(rooms.get("sala").is_some());

        let joined = rooms.join("sala", ConnId::new(), "Bia", &tx).unwrap();
        assert!(!Arc::ptr_eq(&old, &joined));
        assert_eq!(rooms.len(), 1);
    }
}
