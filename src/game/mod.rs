//! Game rules: categories, answer normalization and scoring.

pub mod category;
pub mod normalize;
pub mod scoring;

pub use category::Category;
pub use scoring::{score_round, Answers, RoundResult};
