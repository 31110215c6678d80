//! Routes one connection's inbound events to its room.
//!
//! The connection, not the room, remembers which room it joined; every event
//! is resolved against that association.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GameError, Result};
use crate::game::{Answers, Category};
use crate::room::player::Outbox;
use crate::room::{Room, RoomManager};
use crate::util::id::ConnId;
use crate::ws::protocol::{duration_from_value, ClientEvent};

const MAX_PLAYER_NAME: usize = 32;
const MAX_ROOM_NAME: usize = 64;

/// Trims and caps a display name. Empty names are refused.
fn clean_name(raw: &str, max: usize) -> Result<String> {
    let name: String = raw.trim().chars().take(max).collect();
    if name.is_empty() { Err(GameError::InvalidName) } else { Ok(name) }
}

/// Keeps the entries whose key names a category; the rest is ignored.
pub fn answers_from_wire(raw: HashMap<String, String>) -> Answers {
    raw.into_iter()
        .filter_map(|(key, value)| key.parse::<Category>().ok().map(|c| (c, value)))
        .collect()
}

pub struct Client {
    id: ConnId,
    tx: Outbox,
    room: Option<Arc<Room>>,
}

impl Client {
    pub fn new(id: ConnId, tx: Outbox) -> Self {
        Self { id, tx, room: None }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn room(&self) -> Option<&Arc<Room>> {
        self.room.as_ref()
    }

    pub fn handle(&mut self, rooms: &RoomManager, event: ClientEvent) -> Result<()> {
        let (player_name, room_name) = match event {
            ClientEvent::JoinGame { player_name, room_name } => (player_name, room_name),
            other => {
                let room = self.room.as_ref().ok_or(GameError::NotMember)?;
                return self.dispatch(room, other);
            }
        };

        let player_name = clean_name(&player_name, MAX_PLAYER_NAME)?;
        let room_name = clean_name(&room_name, MAX_ROOM_NAME)?;
        if self.room.as_ref().is_some_and(|r| r.name() == room_name && !r.is_closed()) {
            return Ok(());
        }
        if let Some(previous) = self.room.take() {
            rooms.leave(&previous, self.id)?;
        }
        self.room = Some(rooms.join(&room_name, self.id, &player_name, &self.tx)?);
        Ok(())
    }

    fn dispatch(&self, room: &Arc<Room>, event: ClientEvent) -> Result<()> {
        match event {
            ClientEvent::JoinGame { .. } => Ok(()),
            ClientEvent::StartGame => room.start_game(self.id).map(drop),
            ClientEvent::StopRound => room.stop_round(self.id),
            ClientEvent::SubmitAnswers { answers } => room.submit_answers(self.id, answers_from_wire(answers)),
            ClientEvent::InvalidateWord { target_player_id, category } => {
                let target: ConnId = target_player_id.parse().map_err(|_| GameError::UnknownPlayer)?;
                let category: Category = category.parse()?;
                room.invalidate_word(self.id, target, category)
            }
            ClientEvent::ClientUpdateTimeOption(value) => {
                room.set_preferred_duration(self.id, duration_from_value(&value))
            }
            ClientEvent::RestartGame => room.restart_game(self.id),
            ClientEvent::EndGame => room.end_game(self.id),
        }
    }

    /// Leaves the current room, if any. Called exactly once per connection.
    pub fn disconnect(&mut self, rooms: &RoomManager) {
        if let Some(room) = self.room.take() {
            if let Err(err) = rooms.leave(&room, self.id) {
                tracing::debug!(player = %self.id, %err, "leave on disconnect ignored");
            }
        }
    }
}
