//! Configuration utilities (ports, static assets, round timing).

use std::{env, net::{Ipv4Addr, SocketAddr}};
use std::path::PathBuf;
use std::time::Duration;

/// Round duration used when a room has no preference or receives a bad one.
pub const DEFAULT_ROUND_SECS: u32 = 60;

/// Durations offered by the lobby page.
pub const DURATION_OPTIONS: [u32; 5] = [30, 60, 90, 120, 180];

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 8080, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Resolve the static directory path used by the server.
/// Order:
/// 1) STATIC_DIR env var
/// 2) ./static
pub fn static_dir() -> PathBuf {
    env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./static"))
}

/// Per-room game settings, copied into every room the registry creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Initial preferred round duration, in seconds.
    pub default_duration: u32,
    /// Countdown period. One tick removes one second from the round.
    pub tick: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self { default_duration: DEFAULT_ROUND_SECS, tick: Duration::from_secs(1) }
    }
}

impl GameSettings {
    /// Reads `ROUND_SECONDS` and `TICK_MILLIS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_duration = env::var("ROUND_SECONDS")
            .ok()
            .and_then(|v| parse_duration(&v))
            .unwrap_or(defaults.default_duration);
        let tick = env::var("TICK_MILLIS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick);
        Self { default_duration, tick }
    }
}

/// Parses a round duration. Only positive integers are accepted.
pub fn parse_duration(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|secs| *secs > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_must_be_positive_integer() {
        assert_eq!(parse_duration("90"), Some(90));
        assert_eq!(parse_duration(" 30 "), Some(30));
        assert_eq!(parse_duration("0"), None);
        assert_eq!(parse_duration("-5"), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("1.5"), None);
    }
}
