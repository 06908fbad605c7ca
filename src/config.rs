use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::policy::InteractionPolicy;

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityConfig {
    pub expected_response_seconds: f64,
    pub time_scale_seconds: f64,
    pub focus_penalty_per_loss: f64,
    pub max_focus_penalty: f64,
    pub max_time_penalty: f64,
    pub gap_threshold: f64,
    pub max_gap_penalty: f64,
    /// Attempts after which the gap penalty applies in full
    pub history_saturation: u32,
    pub streak_min_length: usize,
    pub streak_probability_floor: f64,
    pub max_streak_penalty: f64,
    pub prior_reliability_floor: f64,
    pub prior_penalty_scale: f64,
    /// Penalties at or below this are ignored
    pub flag_threshold: f64,
    pub block_threshold: f64,
    pub reliable_threshold: f64,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            expected_response_seconds: 5.0,
            time_scale_seconds: 2.0,
            focus_penalty_per_loss: 0.35,
            max_focus_penalty: 0.9,
            max_time_penalty: 0.7,
            gap_threshold: 0.5,
            max_gap_penalty: 0.6,
            history_saturation: 20,
            streak_min_length: 5,
            streak_probability_floor: 0.01,
            max_streak_penalty: 0.5,
            prior_reliability_floor: 0.5,
            prior_penalty_scale: 0.3,
            flag_threshold: 0.05,
            block_threshold: 0.05,
            reliable_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    pub retrieval_threshold_low: f64,
    pub stability_threshold_low: f64,
    pub spaced_review_interval_ms: i64,
    pub recent_performance_floor: f64,
    /// Evocation score assumed when the input carries none
    pub default_evocation_score: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            retrieval_threshold_low: 0.4,
            stability_threshold_low: 0.5,
            spaced_review_interval_ms: DAY_MS,
            recent_performance_floor: 0.6,
            default_evocation_score: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Normal exercises between forced evocations
    pub interval: u32,
    pub mastery_threshold: f64,
    pub use_prerequisites: bool,
    pub time_threshold_ms: i64,
    /// Minimum exercises between two mastery-triggered evocations
    pub mastery_cooldown: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            interval: 3,
            mastery_threshold: 0.4,
            use_prerequisites: true,
            time_threshold_ms: 4 * HOUR_MS,
            mastery_cooldown: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    pub base_gain: f64,
    pub base_loss: f64,
    pub retrieval_bonus: f64,
    pub retrieval_mitigation: f64,
    pub min_impact: f64,
    pub stability_gain: f64,
    pub stability_loss: f64,
    pub global_blend: f64,
    pub reliability_alpha: f64,
    /// Retrieval quality assumed when no evocation has been scored
    pub missing_evocation_score: f64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            base_gain: 0.15,
            base_loss: 0.10,
            retrieval_bonus: 0.5,
            retrieval_mitigation: 0.4,
            min_impact: 0.1,
            stability_gain: 0.05,
            stability_loss: 0.12,
            global_blend: 0.2,
            reliability_alpha: 0.1,
            missing_evocation_score: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub integrity: IntegrityConfig,
    pub decision: DecisionConfig,
    pub retrieval: RetrievalConfig,
    pub update: UpdateConfig,
    pub policy: InteractionPolicy,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("COMPAS_RETRIEVAL_INTERVAL") {
            config.retrieval.interval = val.parse().unwrap_or(config.retrieval.interval);
        }
        if let Ok(val) = std::env::var("COMPAS_RETRIEVAL_TIME_THRESHOLD_MS") {
            config.retrieval.time_threshold_ms =
                val.parse().unwrap_or(config.retrieval.time_threshold_ms);
        }
        if let Ok(val) = std::env::var("COMPAS_RETRIEVAL_MASTERY_THRESHOLD") {
            config.retrieval.mastery_threshold =
                val.parse().unwrap_or(config.retrieval.mastery_threshold);
        }
        if let Ok(val) = std::env::var("COMPAS_SPACED_REVIEW_INTERVAL_MS") {
            config.decision.spaced_review_interval_ms =
                val.parse().unwrap_or(config.decision.spaced_review_interval_ms);
        }
        if let Ok(val) = std::env::var("COMPAS_USE_PREREQUISITES") {
            config.retrieval.use_prerequisites =
                val.parse().unwrap_or(config.retrieval.use_prerequisites);
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;

        let unit_fields = [
            ("retrieval.mastery_threshold", self.retrieval.mastery_threshold),
            ("decision.retrieval_threshold_low", self.decision.retrieval_threshold_low),
            ("decision.stability_threshold_low", self.decision.stability_threshold_low),
            ("decision.recent_performance_floor", self.decision.recent_performance_floor),
            ("decision.default_evocation_score", self.decision.default_evocation_score),
            ("update.missing_evocation_score", self.update.missing_evocation_score),
            ("update.global_blend", self.update.global_blend),
            ("update.reliability_alpha", self.update.reliability_alpha),
            ("integrity.reliable_threshold", self.integrity.reliable_threshold),
            ("integrity.block_threshold", self.integrity.block_threshold),
        ];
        if let Some((name, value)) = unit_fields
            .iter()
            .find(|(_, v)| !(0.0..=1.0).contains(v))
        {
            return Err(EngineError::InvalidConfig(format!(
                "{name} must lie in [0, 1], got {value}"
            )));
        }

        if self.retrieval.interval == 0 {
            return Err(EngineError::InvalidConfig(
                "retrieval.interval must be at least 1".to_string(),
            ));
        }
        if self.retrieval.time_threshold_ms <= 0 || self.decision.spaced_review_interval_ms <= 0 {
            return Err(EngineError::InvalidConfig(
                "time thresholds must be positive".to_string(),
            ));
        }
        if self.integrity.expected_response_seconds <= 0.0
            || self.integrity.time_scale_seconds <= 0.0
        {
            return Err(EngineError::InvalidConfig(
                "integrity response-time parameters must be positive".to_string(),
            ));
        }
        if self.integrity.block_threshold > self.integrity.reliable_threshold {
            return Err(EngineError::InvalidConfig(format!(
                "integrity.block_threshold {} exceeds reliable_threshold {}",
                self.integrity.block_threshold, self.integrity.reliable_threshold
            )));
        }
        Ok(())
    }
}
