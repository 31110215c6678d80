//! One room's game session.
//!
//! Every operation takes the room lock for its whole duration, so events for
//! the same room never interleave, and every broadcast a transition produces
//! is queued before the lock is released. Per-connection queues are FIFO, so
//! members observe broadcasts in transition order.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::GameSettings;
use crate::error::{GameError, Result};
use crate::game::scoring::Submission;
use crate::game::{score_round, Answers, Category, RoundResult};
use crate::room::player::{Outbox, PlayerInfo, Roster};
use crate::room::round::{random_letter, spawn_countdown, PhaseKind, Round};
use crate::util::id::ConnId;
use crate::ws::protocol::ServerEvent;

/// Whether a departure left anyone behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    Remaining,
    /// The room is now closed and must be unregistered.
    Emptied,
}

#[derive(Debug)]
pub struct Room {
    name: String,
    settings: GameSettings,
    state: Mutex<RoomState>,
}

#[derive(Debug)]
struct RoomState {
    roster: Roster,
    round: Round,
    /// Set when the last player leaves. A closed room accepts nothing.
    closed: bool,
}

impl RoomState {
    fn member(&self, id: ConnId) -> Result<()> {
        if self.roster.contains(id) { Ok(()) } else { Err(GameError::NotMember) }
    }

    fn host(&self, id: ConnId) -> Result<()> {
        self.member(id)?;
        if self.roster.is_host(id) { Ok(()) } else { Err(GameError::NotHost) }
    }

    fn broadcast_roster(&self) {
        self.roster.broadcast(&ServerEvent::UpdatePlayerList(self.roster.snapshot()));
    }

    /// Deactivates the round and asks every member for their answers.
    fn end_round(&mut self, room: &str, stopped_by: Option<&str>) -> Result<()> {
        if !self.round.is_active() {
            return Err(GameError::NotActive);
        }
        if let Some(name) = stopped_by {
            self.roster.broadcast(&ServerEvent::ServerMessage(format!("{name} called STOP!")));
        }
        let expected: HashSet<ConnId> = self.roster.iter().map(|p| p.id).collect();
        self.round.finish(expected)?;
        info!(room, stopped_by, "round ended, collecting answers");
        self.roster.broadcast(&ServerEvent::CollectAnswers);
        Ok(())
    }

    /// Scores the round once the collection barrier is reached.
    fn score_if_complete(&mut self, room: &str) {
        if !self.round.barrier_reached() {
            return;
        }
        let Some(letter) = self.round.letter else {
            warn!(room, "collection finished without a letter");
            return;
        };
        let result = {
            let submissions: Vec<Submission<'_>> = self
                .roster
                .iter()
                .map(|p| Submission { player: p.id, name: &p.name, answers: self.round.answers.get(&p.id) })
                .collect();
            score_round(letter, &Category::ALL, &submissions)
        };
        for row in &result.player_results {
            if let Some(player) = self.roster.get_mut(row.id) {
                player.score += i64::from(row.total_round_score);
            }
        }
        info!(room, %letter, players = result.player_results.len(), "round scored");
        let event = ServerEvent::ShowResults(result.clone());
        self.round.complete(result);
        self.roster.broadcast(&event);
        self.broadcast_roster();
    }
}

impl Room {
    pub fn new(name: impl Into<String>, settings: GameSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            state: Mutex::new(RoomState {
                roster: Roster::default(),
                round: Round::new(settings.default_duration),
                closed: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a player. The first one in becomes host.
    pub fn join(&self, id: ConnId, player_name: String, tx: Outbox) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(GameError::RoomClosed);
        }
        if state.roster.contains(id) {
            return Ok(());
        }
        info!(room = %self.name, player = %id, name = %player_name, "player joined");
        state.roster.add(id, player_name, tx);
        state.broadcast_roster();
        let duration = state.round.preferred_duration;
        state.roster.send_to(id, &ServerEvent::ServerUpdateTimeOption(duration));
        Ok(())
    }

    /// Removes a player. Emptying the room closes it and stops its timer.
    pub fn leave(&self, id: ConnId) -> Result<Departure> {
        let mut state = self.state.lock();
        let (removed, promoted) = state.roster.remove(id).ok_or(GameError::NotMember)?;
        info!(room = %self.name, player = %id, name = %removed.name, "player left");
        state.round.forget(id);
        if state.roster.is_empty() {
            state.round.reset();
            state.closed = true;
            return Ok(Departure::Emptied);
        }
        if let Some(host) = promoted {
            info!(room = %self.name, player = %host, "host promoted");
        }
        state.broadcast_roster();
        state.score_if_complete(&self.name);
        Ok(Departure::Remaining)
    }

    /// Stores the duration for upcoming rounds. `None` (an unusable value from
    /// the client) falls back to the configured default.
    pub fn set_preferred_duration(&self, id: ConnId, seconds: Option<u32>) -> Result<()> {
        let mut state = self.state.lock();
        state.member(id)?;
        let seconds = seconds.unwrap_or(self.settings.default_duration);
        state.round.preferred_duration = seconds;
        debug!(room = %self.name, seconds, "preferred duration changed");
        state.roster.broadcast_except(id, &ServerEvent::ServerUpdateTimeOption(seconds));
        Ok(())
    }

    /// Opens a round with a random letter and starts its countdown.
    pub fn start_game(self: &Arc<Self>, id: ConnId) -> Result<char> {
        let mut state = self.state.lock();
        state.host(id)?;
        let letter = random_letter();
        let timer = state.round.begin(letter)?;
        let serial = state.round.serial();
        let duration = state.round.preferred_duration;

        let weak = Arc::downgrade(self);
        spawn_countdown(timer, self.settings.tick, move || match weak.upgrade() {
            Some(room) => room.on_tick(serial),
            None => ControlFlow::Break(()),
        });

        info!(room = %self.name, %letter, duration, "round started");
        state.roster.broadcast(&ServerEvent::GameStarted { letter, start_time: duration });
        Ok(letter)
    }

    /// One countdown step for round `serial`. Breaks once the round is over or
    /// the room is gone.
    fn on_tick(&self, serial: u64) -> ControlFlow<()> {
        let mut state = self.state.lock();
        if state.closed {
            return ControlFlow::Break(());
        }
        let Some(time_left) = state.round.tick(serial) else {
            return ControlFlow::Break(());
        };
        state.roster.broadcast(&ServerEvent::TimerTick { time_left });
        if time_left > 0 {
            return ControlFlow::Continue(());
        }
        if let Err(err) = state.end_round(&self.name, None) {
            debug!(room = %self.name, %err, "timer expiry ignored");
        }
        ControlFlow::Break(())
    }

    /// Ends the active round on behalf of `id` and announces who stopped it.
    pub fn stop_round(&self, id: ConnId) -> Result<()> {
        let mut state = self.state.lock();
        let name = state.roster.get(id).ok_or(GameError::NotMember)?.name.clone();
        state.end_round(&self.name, Some(&name))
    }

    pub fn submit_answers(&self, id: ConnId, answers: Answers) -> Result<()> {
        let mut state = self.state.lock();
        state.member(id)?;
        state.round.record(id, answers)?;
        debug!(room = %self.name, player = %id, "answers received");
        state.score_if_complete(&self.name);
        Ok(())
    }

    /// Host-only: zeroes `target`'s entry in `category` and takes the points
    /// back from both the round total and the cumulative score.
    pub fn invalidate_word(&self, id: ConnId, target: ConnId, category: Category) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.host(id)?;
        let result = state.round.result.as_mut().ok_or(GameError::NoResults)?;
        let player = state.roster.get_mut(target).ok_or(GameError::UnknownPlayer)?;
        let row = result.player_mut(target).ok_or(GameError::UnknownPlayer)?;
        let deducted = row.invalidate(category)?;
        player.score -= i64::from(deducted);
        info!(room = %self.name, player = %target, %category, deducted, "word invalidated");

        let event = ServerEvent::ResultsUpdated(result.clone());
        state.roster.broadcast(&event);
        state.broadcast_roster();
        Ok(())
    }

    /// Host-only: zeroes every score and discards the round in progress.
    pub fn restart_game(&self, id: ConnId) -> Result<()> {
        let mut state = self.state.lock();
        state.host(id)?;
        for player in state.roster.iter_mut() {
            player.score = 0;
        }
        state.round.reset();
        info!(room = %self.name, "game restarted");
        state.roster.broadcast(&ServerEvent::GameRestarted);
        state.broadcast_roster();
        Ok(())
    }

    /// Broadcasts the final ranking. Round state is untouched.
    pub fn end_game(&self, id: ConnId) -> Result<()> {
        let state = self.state.lock();
        state.member(id)?;
        state.roster.broadcast(&ServerEvent::ShowFinalRanking(state.roster.ranking()));
        Ok(())
    }

    pub fn players(&self) -> Vec<PlayerInfo> {
        self.state.lock().roster.snapshot()
    }

    pub fn phase(&self) -> PhaseKind {
        self.state.lock().round.phase.kind()
    }

    pub fn result(&self) -> Option<RoundResult> {
        self.state.lock().round.result.clone()
    }

    pub fn letter(&self) -> Option<char> {
        self.state.lock().round.letter
    }

    pub fn preferred_duration(&self) -> u32 {
        self.state.lock().round.preferred_duration
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn outbox() -> Outbox {
        mpsc::unbounded_channel().0
    }

    fn hosts(room: &Room) -> usize {
        room.players().iter().filter(|p| p.is_host).count()
    }

    #[test]
    fn exactly_one_host_through_joins_and_leaves() {
        let room = Room::new("sala", GameSettings::default());
        let ids: Vec<ConnId> = (0..5).map(|_| ConnId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            room.join(*id, format!("p{i}"), outbox()).unwrap();
            assert_eq!(hosts(&room), 1);
        }
        for id in [ids[2], ids[0], ids[4], ids[1]] {
            assert_eq!(room.leave(id).unwrap(), Departure::Remaining);
            assert_eq!(hosts(&room), 1);
        }
        assert_eq!(room.leave(ids[3]).unwrap(), Departure::Emptied);
        assert!(room.is_closed());
        assert_eq!(room.join(ConnId::new(), "late".into(), outbox()), Err(GameError::RoomClosed));
    }

    #[test]
    fn strangers_are_refused() {
        let room = Room::new("sala", GameSettings::default());
        let member = ConnId::new();
        let stranger = ConnId::new();
        room.join(member, "Ana".into(), outbox()).unwrap();
        assert_eq!(room.leave(stranger), Err(GameError::NotMember));
        assert_eq!(room.stop_round(stranger), Err(GameError::NotMember));
        assert_eq!(room.end_game(stranger), Err(GameError::NotMember));
        assert_eq!(room.set_preferred_duration(stranger, Some(30)), Err(GameError::NotMember));
        assert_eq!(room.submit_answers(stranger, Answers::new()), Err(GameError::NotMember));
        assert_eq!(room.invalidate_word(member, stranger, Category::Nome), Err(GameError::NoResults));
        assert_eq!(room.preferred_duration(), GameSettings::default().default_duration);
    }

    #[test]
    fn bad_duration_falls_back_to_default() {
        let room = Room::new("sala", GameSettings { default_duration: 75, ..GameSettings::default() });
        let id = ConnId::new();
        room.join(id, "Ana".into(), outbox()).unwrap();
        room.set_preferred_duration(id, Some(120)).unwrap();
        assert_eq!(room.preferred_duration(), 120);
        room.set_preferred_duration(id, None).unwrap();
        assert_eq!(room.preferred_duration(), 75);
    }
}
