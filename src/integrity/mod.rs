//! Integrity Engine
//!
//! Scores how far one interaction's evidence can be trusted. Each heuristic
//! yields an independent penalty `p` and the running confidence is
//! multiplied by `1 - p`, so the score degrades smoothly and stays in
//! `[0, 1]`.

pub mod history;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::IntegrityConfig;
use crate::error::{EngineError, Result};
use crate::graph::ConceptGraph;
use crate::types::{clamp_unit, Area, CompetenceId, StudentModel};

use history::{Outcome, OutcomeHistory};

/// Mastery assumed when the targeted competence does not exist yet.
const PERFORMANCE_FLOOR: f64 = 0.1;

/// One learner verdict as produced by an exercise evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub concept_id: String,
    pub area: Area,
    pub competence: CompetenceId,
    pub correct: bool,
    pub response_time_seconds: f64,
    /// Milliseconds since epoch
    pub timestamp: i64,
    #[serde(default)]
    pub focus_lost_count: Option<u32>,
}

impl Interaction {
    pub fn validate(&self) -> Result<()> {
        if self.concept_id.trim().is_empty() {
            return Err(EngineError::InvalidInteraction(
                "concept id is empty".to_string(),
            ));
        }
        if !self.response_time_seconds.is_finite() || self.response_time_seconds < 0.0 {
            return Err(EngineError::InvalidInteraction(format!(
                "response time must be a non-negative number of seconds, got {}",
                self.response_time_seconds
            )));
        }
        if self.timestamp < 0 {
            return Err(EngineError::InvalidInteraction(format!(
                "timestamp must not be negative, got {}",
                self.timestamp
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    FocusLost,
    TimeAnomaly,
    PerformanceGap,
    ImprobableStreak,
    LowPriorReliability,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FocusLost => "FOCUS_LOST",
            Self::TimeAnomaly => "TIME_ANOMALY",
            Self::PerformanceGap => "PERFORMANCE_GAP",
            Self::ImprobableStreak => "IMPROBABLE_STREAK",
            Self::LowPriorReliability => "LOW_PRIOR_RELIABILITY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityFlag {
    pub kind: FlagKind,
    pub penalty: f64,
    pub detail: String,
}

impl fmt::Display for IntegrityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (penalty: {:.0}%)",
            self.kind.as_str(),
            self.detail,
            self.penalty * 100.0
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityResult {
    pub reliable: bool,
    pub score: f64,
    pub flags: Vec<IntegrityFlag>,
    pub block_update: bool,
}

impl IntegrityResult {
    pub fn from_score(score: f64, flags: Vec<IntegrityFlag>, config: &IntegrityConfig) -> Self {
        let score = clamp_unit(score);
        Self {
            reliable: score >= config.reliable_threshold,
            score,
            flags,
            block_update: score < config.block_threshold,
        }
    }

    /// Full trust, used when integrity scoring is disabled.
    pub fn trusted() -> Self {
        Self {
            reliable: true,
            score: 1.0,
            flags: Vec::new(),
            block_update: false,
        }
    }

    pub fn has_flag(&self, kind: FlagKind) -> bool {
        self.flags.iter().any(|f| f.kind == kind)
    }

    pub fn penalty(&self, kind: FlagKind) -> f64 {
        self.flags
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.penalty)
            .unwrap_or(0.0)
    }
}

pub struct IntegrityEngine {
    config: IntegrityConfig,
    graph: Arc<ConceptGraph>,
    history: OutcomeHistory,
}

impl IntegrityEngine {
    pub fn new(config: IntegrityConfig, graph: Arc<ConceptGraph>) -> Self {
        Self {
            config,
            graph,
            history: OutcomeHistory::new(),
        }
    }

    pub fn config(&self) -> &IntegrityConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: IntegrityConfig) {
        self.config = config;
    }

    pub fn history(&self) -> &OutcomeHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Score one interaction and append it to the concept's rolling history.
    ///
    /// Malformed evidence is rejected before any state is touched.
    pub fn evaluate(
        &mut self,
        interaction: &Interaction,
        model: &StudentModel,
    ) -> Result<IntegrityResult> {
        interaction.validate()?;

        let mut confidence = 1.0;
        let mut flags = Vec::new();
        let mut apply = |kind: FlagKind, penalty: f64, detail: String| {
            confidence *= 1.0 - penalty;
            flags.push(IntegrityFlag {
                kind,
                penalty,
                detail,
            });
        };

        let focus_lost = interaction.focus_lost_count.unwrap_or(0);
        if focus_lost > 0 {
            let penalty = (f64::from(focus_lost) * self.config.focus_penalty_per_loss)
                .min(self.config.max_focus_penalty);
            apply(
                FlagKind::FocusLost,
                penalty,
                format!("left the exercise {focus_lost} time(s)"),
            );
        }

        let time_penalty = self.time_penalty(interaction.response_time_seconds);
        if time_penalty > self.config.flag_threshold {
            apply(
                FlagKind::TimeAnomaly,
                time_penalty,
                format!("{:.1}s response", interaction.response_time_seconds),
            );
        }

        let prior = prior_performance(model, interaction);

        let gap_penalty = self.gap_penalty(interaction, model, prior);
        if gap_penalty > self.config.flag_threshold {
            apply(
                FlagKind::PerformanceGap,
                gap_penalty,
                format!("unexpectedly correct at mastery {prior:.2}"),
            );
        }

        // the streak includes the interaction under evaluation
        let streak = if interaction.correct {
            self.history.trailing_correct(&interaction.concept_id) + 1
        } else {
            0
        };
        let streak_penalty = self.streak_penalty(streak, prior);
        if streak_penalty > self.config.flag_threshold {
            apply(
                FlagKind::ImprobableStreak,
                streak_penalty,
                format!("{streak} consecutive at mastery {prior:.2}"),
            );
        }

        let reliability = model.global.reliability;
        if reliability < self.config.prior_reliability_floor {
            let penalty =
                (self.config.prior_reliability_floor - reliability) * self.config.prior_penalty_scale;
            apply(
                FlagKind::LowPriorReliability,
                penalty,
                format!("long-run reliability {:.0}%", reliability * 100.0),
            );
        }

        let result = IntegrityResult::from_score(confidence, flags, &self.config);

        self.history.record(
            &interaction.concept_id,
            Outcome {
                correct: interaction.correct,
                timestamp: interaction.timestamp,
            },
        );

        tracing::debug!(
            concept_id = %interaction.concept_id,
            score = result.score,
            flags = result.flags.len(),
            "interaction evaluated"
        );
        if result.block_update {
            tracing::warn!(
                concept_id = %interaction.concept_id,
                score = result.score,
                flags = ?result.flags.iter().map(|f| f.kind.as_str()).collect::<Vec<_>>(),
                "integrity too low, update blocked"
            );
        }

        Ok(result)
    }

    /// Logistic penalty on answers faster than expected. Slow answers are
    /// never penalized.
    fn time_penalty(&self, response_time_seconds: f64) -> f64 {
        let z = (self.config.expected_response_seconds - response_time_seconds)
            / self.config.time_scale_seconds;
        if z <= 0.0 {
            return 0.0;
        }
        let penalty = 1.0 / (1.0 + (-2.0 * (z - 1.5)).exp());
        penalty.clamp(0.0, self.config.max_time_penalty)
    }

    fn gap_penalty(&self, interaction: &Interaction, model: &StudentModel, prior: f64) -> f64 {
        if !interaction.correct {
            return 0.0;
        }
        let Some(node) = self.graph.node(&interaction.concept_id) else {
            return 0.0;
        };

        let expected = (prior / f64::from(node.difficulty)).clamp(0.0, 1.0);
        let gap = 1.0 - expected;
        if gap <= self.config.gap_threshold {
            return 0.0;
        }

        let attempts = model
            .competence(interaction.area, &interaction.competence)
            .map(|c| c.attempts)
            .unwrap_or(0)
            .max(1);
        let history_factor =
            (f64::from(attempts) / f64::from(self.config.history_saturation.max(1))).min(1.0);

        let base = (gap - self.config.gap_threshold) * 2.0;
        (base * history_factor).clamp(0.0, self.config.max_gap_penalty)
    }

    fn streak_penalty(&self, streak: usize, prior: f64) -> f64 {
        if streak < self.config.streak_min_length {
            return 0.0;
        }
        let probability = prior.powi(streak as i32);
        if probability >= self.config.streak_probability_floor {
            return 0.0;
        }
        // log10(0) is -inf, which saturates at the cap
        let penalty = -probability.log10() / 10.0;
        penalty.clamp(0.0, self.config.max_streak_penalty)
    }
}

fn prior_performance(model: &StudentModel, interaction: &Interaction) -> f64 {
    model
        .competence(interaction.area, &interaction.competence)
        .map(|c| c.performance)
        .unwrap_or(PERFORMANCE_FLOOR)
}
