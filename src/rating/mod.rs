//! Skill model using the TrueSkill algorithm
//!
//! This module provides match-quality scoring and rating updates for
//! two-team games, built on the skillratings crate.

pub mod calculator;
pub mod trueskill;

// Re-export commonly used types
pub use calculator::{RatingChange, RatingUpdate, SkillModel};
pub use trueskill::TrueSkillCalculator;
