//! Behavioral learner profiles.
//!
//! `t` is the interaction index. Difficulty is the concept's 1-5 rating.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileKind {
    /// Steady honest progress from 0.2 to 0.8
    Honest,
    HighAbility,
    /// Fast impulsive answers at chance level
    RandomGuesser,
    /// Low ability, near-perfect copied answers
    ConsistentCheater,
    /// Cheats in waves
    IntermittentCheater,
    /// Low ability with occasional lucky streaks
    LuckyLow,
    /// Learns quickly, then stalls at 0.6
    Plateau,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 7] = [
        ProfileKind::Honest,
        ProfileKind::HighAbility,
        ProfileKind::RandomGuesser,
        ProfileKind::ConsistentCheater,
        ProfileKind::IntermittentCheater,
        ProfileKind::LuckyLow,
        ProfileKind::Plateau,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Honest => "HONEST",
            Self::HighAbility => "HIGH_ABILITY",
            Self::RandomGuesser => "RANDOM_GUESSER",
            Self::ConsistentCheater => "CONSISTENT_CHEATER",
            Self::IntermittentCheater => "INTERMITTENT_CHEATER",
            Self::LuckyLow => "LUCKY_LOW",
            Self::Plateau => "PLATEAU",
        }
    }

    /// True knowledge level at step `t`.
    pub fn real_ability(&self, t: usize) -> f64 {
        let t = t as f64;
        match self {
            Self::Honest => (0.2 + 0.6 * (t / 100.0)).clamp(0.0, 1.0),
            Self::HighAbility => 0.9,
            Self::RandomGuesser => 0.1,
            Self::ConsistentCheater => 0.2,
            Self::IntermittentCheater => (0.3 + 0.2 * (t / 100.0)).clamp(0.0, 1.0),
            Self::LuckyLow => 0.25,
            Self::Plateau if t < 40.0 => (0.3 + 0.3 * (t / 40.0)).clamp(0.0, 1.0),
            Self::Plateau => 0.6,
        }
    }

    pub fn should_cheat(&self, t: usize) -> bool {
        match self {
            Self::ConsistentCheater => true,
            Self::IntermittentCheater => (t as f64 * 0.5).sin() > 0.5,
            _ => false,
        }
    }

    pub fn probability_correct<R: Rng + ?Sized>(&self, difficulty: u8, t: usize, rng: &mut R) -> f64 {
        let difficulty = f64::from(difficulty.max(1));
        let ability = self.real_ability(t);
        match self {
            Self::Honest => (ability / (difficulty / 2.0)).clamp(0.0, 0.95),
            Self::HighAbility => (0.9 / (difficulty / 3.0)).clamp(0.0, 0.98),
            Self::RandomGuesser => 0.25,
            Self::ConsistentCheater => 0.95,
            Self::IntermittentCheater if self.should_cheat(t) => 0.95,
            Self::IntermittentCheater => (ability / (difficulty / 2.0)).clamp(0.0, 1.0),
            Self::LuckyLow => {
                let base = 0.25 / (difficulty / 2.0);
                if rng.gen::<f64>() < 0.1 {
                    (base + 0.3).clamp(0.0, 0.9)
                } else {
                    base.clamp(0.0, 1.0)
                }
            }
            Self::Plateau => (ability / (difficulty / 2.0)).clamp(0.0, 0.9),
        }
    }

    /// Seconds spent answering.
    pub fn response_time<R: Rng + ?Sized>(&self, t: usize, rng: &mut R) -> f64 {
        let (min, max) = match self {
            Self::Honest => (5.0, 15.0),
            Self::HighAbility => (3.0, 8.0),
            Self::RandomGuesser => (1.0, 3.0),
            // copy-paste or an external tool
            Self::ConsistentCheater => (0.5, 2.0),
            Self::IntermittentCheater if self.should_cheat(t) => (1.0, 2.0),
            Self::IntermittentCheater => (8.0, 12.0),
            Self::LuckyLow => (10.0, 20.0),
            Self::Plateau => (6.0, 10.0),
        };
        normal_in_range(rng, min, max)
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| EngineError::UnknownProfile(s.to_string()))
    }
}

/// Normal sample centred in `[min, max]` with six sigmas spanning the range,
/// clamped to it (Box-Muller).
pub fn normal_in_range<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let u = 1.0 - rng.gen::<f64>();
    let v = 1.0 - rng.gen::<f64>();
    let z = (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos();
    let mean = (max + min) / 2.0;
    let deviation = (max - min) / 6.0;
    (z * deviation + mean).clamp(min, max)
}
