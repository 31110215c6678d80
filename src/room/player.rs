//! Room membership: players, host flag and host succession.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::util::id::ConnId;
use crate::ws::protocol::ServerEvent;

/// Delivery handle for one connection. The gateway drains it into the socket.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug)]
pub struct Player {
    pub id: ConnId,
    pub name: String,
    /// Cumulative score; invalidations can push it below zero.
    pub score: i64,
    pub is_host: bool,
    tx: Outbox,
}

impl Player {
    pub fn new(id: ConnId, name: String, is_host: bool, tx: Outbox) -> Self {
        Self { id, name, score: 0, is_host, tx }
    }

    /// Queues an event for this player. A closed outbox means the socket is
    /// already going away; its disconnect will arrive separately.
    pub fn send(&self, event: &ServerEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(player = %self.id, "outbox closed");
        }
    }
}

/// Roster entry as broadcast in `updatePlayerList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: ConnId,
    pub name: String,
    pub score: i64,
    pub is_host: bool,
}

/// Entry of the end-of-session ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: i64,
}

/// Players in join order. Join order is also host-succession order.
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn get(&self, id: ConnId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ConnId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_host(&self, id: ConnId) -> bool {
        self.get(id).is_some_and(|p| p.is_host)
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// Appends a player. The first player of an empty roster becomes host.
    pub fn add(&mut self, id: ConnId, name: String, tx: Outbox) {
        let is_host = self.players.is_empty();
        self.players.push(Player::new(id, name, is_host, tx));
    }

    /// Removes a player, promoting the earliest remaining joiner if the host
    /// left. Returns the removed player and the id of a newly promoted host.
    pub fn remove(&mut self, id: ConnId) -> Option<(Player, Option<ConnId>)> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        let removed = self.players.remove(idx);
        let mut promoted = None;
        if removed.is_host {
            if let Some(next) = self.players.first_mut() {
                next.is_host = true;
                promoted = Some(next.id);
            }
        }
        Some((removed, promoted))
    }

    pub fn snapshot(&self) -> Vec<PlayerInfo> {
        self.players
            .iter()
            .map(|p| PlayerInfo { id: p.id, name: p.name.clone(), score: p.score, is_host: p.is_host })
            .collect()
    }

    /// Names and scores, best first. Ties keep join order.
    pub fn ranking(&self) -> Vec<RankingEntry> {
        let mut ranking: Vec<RankingEntry> = self
            .players
            .iter()
            .map(|p| RankingEntry { name: p.name.clone(), score: p.score })
            .collect();
        ranking.sort_by(|a, b| b.score.cmp(&a.score));
        ranking
    }

    pub fn broadcast(&self, event: &ServerEvent) {
        for p in &self.players {
            p.send(event);
        }
    }

    pub fn broadcast_except(&self, skip: ConnId, event: &ServerEvent) {
        for p in self.players.iter().filter(|p| p.id != skip) {
            p.send(event);
        }
    }

    pub fn send_to(&self, id: ConnId, event: &ServerEvent) {
        if let Some(p) = self.get(id) {
            p.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbox() -> Outbox {
        mpsc::unbounded_channel().0
    }

    fn host_count(roster: &Roster) -> usize {
        roster.iter().filter(|p| p.is_host).count()
    }

    #[test]
    fn first_joiner_is_host() {
        let mut roster = Roster::default();
        let (a, b) = (ConnId::new(), ConnId::new());
        roster.add(a, "a".into(), outbox());
        roster.add(b, "b".into(), outbox());
        assert!(roster.is_host(a));
        assert!(!roster.is_host(b));
        assert_eq!(host_count(&roster), 1);
    }

    #[test]
    fn host_passes_to_earliest_remaining_joiner() {
        let mut roster = Roster::default();
        let ids: Vec<ConnId> = (0..3).map(|_| ConnId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            roster.add(*id, format!("p{i}"), outbox());
        }
        let (removed, promoted) = roster.remove(ids[0]).unwrap();
        assert!(removed.is_host);
        assert_eq!(promoted, Some(ids[1]));
        assert_eq!(roster.host().map(|p| p.id), Some(ids[1]));
        assert_eq!(host_count(&roster), 1);

        let (_, promoted) = roster.remove(ids[2]).unwrap();
        assert_eq!(promoted, None);
        assert_eq!(host_count(&roster), 1);
    }

    #[test]
    fn removing_unknown_player_is_none() {
        let mut roster = Roster::default();
        roster.add(ConnId::new(), "a".into(), outbox());
        assert!(roster.remove(ConnId::new()).is_none());
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn ranking_is_stable_and_descending() {
        let mut roster = Roster::default();
        let ids: Vec<ConnId> = (0..3).map(|_| ConnId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            roster.add(*id, format!("p{i}"), outbox());
        }
        roster.get_mut(ids[0]).unwrap().score = 10;
        roster.get_mut(ids[1]).unwrap().score = 25;
        roster.get_mut(ids[2]).unwrap().score = 10;
        let names: Vec<String> = roster.ranking().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["p1", "p0", "p2"]);
    }

    #[test]
    fn broadcast_except_skips_sender() {
        let mut roster = Roster::default();
        let (a, b) = (ConnId::new(), ConnId::new());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        roster.add(a, "a".into(), tx_a);
        roster.add(b, "b".into(), tx_b);
        roster.broadcast_except(a, &ServerEvent::ServerUpdateTimeOption(90));
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), ServerEvent::ServerUpdateTimeOption(90));
    }
}
