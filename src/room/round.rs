//! Round state machine and its countdown.
//!
//! Idle -> Active -> Collecting -> Scored, with Scored -> Active on the next
//! start and any phase -> Idle on restart. The countdown token lives inside
//! `Phase::Active`, so a timer cannot outlive the active phase.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{GameError, Result};
use crate::game::{Answers, RoundResult};
use crate::util::id::ConnId;

#[derive(Debug)]
pub enum Phase {
    Idle,
    Active { remaining: u32, timer: CancellationToken },
    /// Waiting for answers from everyone who was in the room when the round
    /// ended and is still in it.
    Collecting { expected: HashSet<ConnId> },
    Scored,
}

/// Observable name of a [`Phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseKind {
    Idle,
    Active,
    Collecting,
    Scored,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Active { .. } => PhaseKind::Active,
            Phase::Collecting { .. } => PhaseKind::Collecting,
            Phase::Scored => PhaseKind::Scored,
        }
    }
}

#[derive(Debug)]
pub struct Round {
    pub letter: Option<char>,
    pub phase: Phase,
    /// Seconds for the next round; survives across rounds.
    pub preferred_duration: u32,
    pub answers: HashMap<ConnId, Answers>,
    /// Kept after scoring so the host can invalidate entries.
    pub result: Option<RoundResult>,
    serial: u64,
}

/// Uniform pick from `A..=Z`.
pub fn random_letter() -> char {
    char::from(b'A' + rand::thread_rng().gen_range(0..26u8))
}

impl Round {
    pub fn new(preferred_duration: u32) -> Self {
        Self {
            letter: None,
            phase: Phase::Idle,
            preferred_duration,
            answers: HashMap::new(),
            result: None,
            serial: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    /// Identifies the current round. Countdown ticks carry it so a stale timer
    /// cannot touch a later round.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Opens a round with `letter`. Only legal from Idle or Scored.
    ///
    /// Returns the countdown token the caller hands to the timer task.
    pub fn begin(&mut self, letter: char) -> Result<CancellationToken> {
        if matches!(self.phase, Phase::Active { .. } | Phase::Collecting { .. }) {
            return Err(GameError::RoundInProgress);
        }
        let timer = CancellationToken::new();
        self.serial += 1;
        self.letter = Some(letter);
        self.answers.clear();
        self.result = None;
        self.phase = Phase::Active { remaining: self.preferred_duration, timer: timer.clone() };
        Ok(timer)
    }

    /// One countdown step. Returns the seconds left, or `None` if `serial`
    /// does not name the active round.
    pub fn tick(&mut self, serial: u64) -> Option<u32> {
        if serial != self.serial {
            return None;
        }
        match &mut self.phase {
            Phase::Active { remaining, .. } => {
                *remaining = remaining.saturating_sub(1);
                Some(*remaining)
            }
            _ => None,
        }
    }

    /// End-of-round: stops the countdown and starts waiting for `expected`.
    /// A no-op unless the round is active.
    pub fn finish(&mut self, expected: HashSet<ConnId>) -> Result<()> {
        let Phase::Active { timer, .. } = &self.phase else {
            return Err(GameError::NotActive);
        };
        timer.cancel();
        self.phase = Phase::Collecting { expected };
        Ok(())
    }

    /// Stores one player's answers. Each expected player submits once.
    pub fn record(&mut self, player: ConnId, answers: Answers) -> Result<()> {
        let Phase::Collecting { expected } = &self.phase else {
            return Err(GameError::NotCollecting);
        };
        if !expected.contains(&player) {
            return Err(GameError::NotMember);
        }
        if self.answers.contains_key(&player) {
            return Err(GameError::AlreadySubmitted);
        }
        self.answers.insert(player, answers);
        Ok(())
    }

    /// Drops a departed player from the collection barrier.
    pub fn forget(&mut self, player: ConnId) {
        if let Phase::Collecting { expected } = &mut self.phase {
            expected.remove(&player);
        }
        self.answers.remove(&player);
    }

    /// True once every expected player has submitted.
    pub fn barrier_reached(&self) -> bool {
        match &self.phase {
            Phase::Collecting { expected } => expected.iter().all(|p| self.answers.contains_key(p)),
            _ => false,
        }
    }

    pub fn complete(&mut self, result: RoundResult) {
        self.phase = Phase::Scored;
        self.result = Some(result);
    }

    /// Cancels a running countdown without changing phase otherwise.
    pub fn cancel_timer(&self) {
        if let Phase::Active { timer, .. } = &self.phase {
            timer.cancel();
        }
    }

    /// Back to Idle, discarding letter, answers and any stored result.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.phase = Phase::Idle;
        self.letter = None;
        self.answers.clear();
        self.result = None;
    }
}

/// Runs `on_tick` every `period` until the token is cancelled or the callback
/// breaks. The first call happens one period after spawning.
pub fn spawn_countdown<F>(token: CancellationToken, period: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if on_tick().is_break() {
                        break;
                    }
                }
            }
        }
    })
}
