//! Round scoring.
//!
//! Pure: the engine only reads the answers handed to it by the owning room and
//! returns a fresh [`RoundResult`]. Applying totals to cumulative scores is the
//! room's job.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::error::{GameError, Result};
use crate::game::category::Category;
use crate::game::normalize::normalize;
use crate::util::id::ConnId;

/// Points for a valid answer nobody else gave in that category.
pub const UNIQUE_POINTS: u32 = 10;
/// Points for a valid answer at least one other player also gave.
pub const SHARED_POINTS: u32 = 5;

/// Raw answers of one player, keyed by category. Missing means empty.
pub type Answers = BTreeMap<Category, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub answer: String,
    pub points: u32,
    pub invalidated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub id: ConnId,
    pub name: String,
    pub answers: BTreeMap<Category, CategoryScore>,
    pub total_round_score: u32,
}

impl PlayerResult {
    /// Zeroes a positive entry and returns the points taken away.
    ///
    /// `total_round_score` is reduced by the same amount; the caller owes the
    /// matching deduction on the player's cumulative score.
    pub fn invalidate(&mut self, category: Category) -> Result<u32> {
        let entry = self
            .answers
            .get_mut(&category)
            .ok_or_else(|| GameError::UnknownCategory(category.to_string()))?;
        if entry.points == 0 {
            return Err(GameError::NothingToInvalidate);
        }
        let deducted = entry.points;
        entry.points = 0;
        entry.invalidated = true;
        self.total_round_score -= deducted;
        Ok(deducted)
    }

    pub fn points_sum(&self) -> u32 {
        self.answers.values().map(|a| a.points).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub letter: char,
    pub categories: Vec<Category>,
    pub player_results: Vec<PlayerResult>,
}

impl RoundResult {
    pub fn player(&self, id: ConnId) -> Option<&PlayerResult> {
        self.player_results.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: ConnId) -> Option<&mut PlayerResult> {
        self.player_results.iter_mut().find(|p| p.id == id)
    }
}

/// One row of input to [`score_round`].
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub player: ConnId,
    pub name: &'a str,
    /// `None` for players who never submitted.
    pub answers: Option<&'a Answers>,
}

struct Checked {
    category: Category,
    raw: String,
    normalized: String,
    valid: bool,
}

/// Normalizes one player's answers and decides validity, which depends only
/// on that player's own submission and the letter.
fn check_answers(letter: &str, categories: &[Category], answers: Option<&Answers>) -> Vec<Checked> {
    let raw_of = |c: &Category| {
        answers
            .and_then(|a| a.get(c))
            .cloned()
            .unwrap_or_default()
    };
    let entries: Vec<(Category, String, String)> = categories
        .iter()
        .map(|c| {
            let raw = raw_of(c);
            let normalized = normalize(&raw);
            (*c, raw, normalized)
        })
        .collect();

    let mut seen = HashSet::new();
    let mut self_duplicates = HashSet::new();
    for (_, _, normalized) in &entries {
        if !normalized.is_empty() && !seen.insert(normalized.as_str()) {
            self_duplicates.insert(normalized.as_str());
        }
    }

    let valid: Vec<bool> = entries
        .iter()
        .map(|(_, _, n)| !n.is_empty() && !self_duplicates.contains(n.as_str()) && n.starts_with(letter))
        .collect();

    entries
        .into_iter()
        .zip(valid)
        .map(|((category, raw, normalized), valid)| Checked { category, raw, normalized, valid })
        .collect()
}

/// Scores every submission of a round.
///
/// Output rows follow the order of `submissions`; categories follow `categories`.
pub fn score_round(letter: char, categories: &[Category], submissions: &[Submission<'_>]) -> RoundResult {
    let normalized_letter = normalize(letter.encode_utf8(&mut [0; 4]));

    let checked: Vec<Vec<Checked>> = submissions
        .iter()
        .map(|s| check_answers(&normalized_letter, categories, s.answers))
        .collect();

    // How many players validly gave each (category, answer).
    let mut tally: HashMap<(Category, &str), usize> = HashMap::new();
    for entry in checked.iter().flatten().filter(|e| e.valid) {
        *tally.entry((entry.category, entry.normalized.as_str())).or_default() += 1;
    }

    let player_results = submissions
        .iter()
        .zip(&checked)
        .map(|(submission, entries)| {
            let answers: BTreeMap<Category, CategoryScore> = entries
                .iter()
                .map(|e| {
                    let points = if !e.valid {
                        0
                    } else if tally.get(&(e.category, e.normalized.as_str())).copied().unwrap_or(0) > 1 {
                        SHARED_POINTS
                    } else {
                        UNIQUE_POINTS
                    };
                    (e.category, CategoryScore { answer: e.raw.clone(), points, invalidated: false })
                })
                .collect();
            let total_round_score = answers.values().map(|a| a.points).sum();
            PlayerResult {
                id: submission.player,
                name: submission.name.to_string(),
                answers,
                total_round_score,
            }
        })
        .collect();

    RoundResult { letter, categories: categories.to_vec(), player_results }
}
