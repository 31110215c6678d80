//! JSON frames exchanged over the socket.
//!
//! Adjacently tagged: `{"type": "joinGame", "data": {...}}`. Payload-less events
//! carry only `type`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::parse_duration;
use crate::game::RoundResult;
use crate::room::player::{PlayerInfo, RankingEntry};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinGame { player_name: String, room_name: String },
    StartGame,
    StopRound,
    SubmitAnswers { answers: HashMap<String, String> },
    #[serde(rename_all = "camelCase")]
    InvalidateWord { target_player_id: String, category: String },
    /// Browsers send select values as strings, scripts as numbers.
    ClientUpdateTimeOption(Value),
    RestartGame,
    EndGame,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinGame { .. } => "joinGame",
            ClientEvent::StartGame => "startGame",
            ClientEvent::StopRound => "stopRound",
            ClientEvent::SubmitAnswers { .. } => "submitAnswers",
            ClientEvent::InvalidateWord { .. } => "invalidateWord",
            ClientEvent::ClientUpdateTimeOption(_) => "clientUpdateTimeOption",
            ClientEvent::RestartGame => "restartGame",
            ClientEvent::EndGame => "endGame",
        }
    }
}

/// Reads a duration out of a `clientUpdateTimeOption` payload.
pub fn duration_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|s| u32::try_from(s).ok()).filter(|s| *s > 0),
        Value::String(s) => parse_duration(s),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    UpdatePlayerList(Vec<PlayerInfo>),
    ServerUpdateTimeOption(u32),
    #[serde(rename_all = "camelCase")]
    GameStarted { letter: char, start_time: u32 },
    #[serde(rename_all = "camelCase")]
    TimerTick { time_left: u32 },
    CollectAnswers,
    ShowResults(RoundResult),
    ResultsUpdated(RoundResult),
    ShowFinalRanking(Vec<RankingEntry>),
    GameRestarted,
    ServerMessage(String),
}
