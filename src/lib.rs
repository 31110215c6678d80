//! Room-isolated multiplayer word game server ("Adedonha" / "Stop").
//!
//! Players join a named room, the host opens a round with a random letter,
//! everyone fills the categories, and the server scores the round centrally.

pub mod config;
pub mod error;
pub mod game;
pub mod http;
pub mod room;
pub mod telemetry;
pub mod util;
pub mod ws;
