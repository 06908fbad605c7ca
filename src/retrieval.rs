//! Retrieval Scheduler
//!
//! Gate consulted before an exercise is generated. Three triggers are checked
//! in order (elapsed time, exercise interval, low mastery with cooldown); the
//! first match blocks the learner behind a forced retrieval prompt.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::RetrievalConfig;
use crate::graph::ConceptGraph;
use crate::selectors::mastery_map;
use crate::types::{clamp_unit, StudentModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    Interval,
    Mastery,
    Time,
    None,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interval => "INTERVAL",
            Self::Mastery => "MASTERY",
            Self::Time => "TIME",
            Self::None => "NONE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalDecision {
    pub should_trigger: bool,
    pub concept_to_retrieve: String,
    pub reason: String,
    pub trigger_type: TriggerType,
}

pub struct RetrievalScheduler {
    config: RetrievalConfig,
    graph: Arc<ConceptGraph>,
    /// `global.attempts` at the last mastery-triggered evocation
    last_mastery_trigger: i64,
}

impl RetrievalScheduler {
    pub fn new(config: RetrievalConfig, graph: Arc<ConceptGraph>) -> Self {
        Self {
            config,
            graph,
            last_mastery_trigger: -1,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Forget the mastery-trigger cooldown.
    pub fn reset(&mut self) {
        self.last_mastery_trigger = -1;
    }

    pub fn should_block_for_evocation(
        &mut self,
        model: &StudentModel,
        current_concept_id: &str,
        now_ms: i64,
    ) -> RetrievalDecision {
        let global = &model.global;

        let Some(last_evocation) = global.last_evocation_timestamp else {
            return self.trigger(
                TriggerType::Time,
                model,
                current_concept_id,
                "Session start, initial evocation.".to_string(),
            );
        };
        let elapsed = now_ms.saturating_sub(last_evocation);
        if elapsed > self.config.time_threshold_ms {
            return self.trigger(
                TriggerType::Time,
                model,
                current_concept_id,
                format!(
                    "Refresh window exceeded ({}min > {}min).",
                    elapsed / 60_000,
                    self.config.time_threshold_ms / 60_000
                ),
            );
        }

        if global.exercises_since_last_evocation >= self.config.interval {
            return self.trigger(
                TriggerType::Interval,
                model,
                current_concept_id,
                format!("Reached the limit of {} exercises.", self.config.interval),
            );
        }

        let mastery = mastery_map(model)
            .get(current_concept_id)
            .copied()
            .unwrap_or(0.0);
        let iteration = i64::try_from(global.attempts).unwrap_or(i64::MAX);
        let since_last = iteration.saturating_sub(self.last_mastery_trigger);
        let cooled_down = since_last >= i64::try_from(self.config.mastery_cooldown).unwrap_or(i64::MAX);
        if mastery < self.config.mastery_threshold && cooled_down {
            self.last_mastery_trigger = iteration;
            return self.trigger(
                TriggerType::Mastery,
                model,
                current_concept_id,
                format!("Low mastery alert ({:.0}%).", mastery * 100.0),
            );
        }

        RetrievalDecision {
            should_trigger: false,
            concept_to_retrieve: current_concept_id.to_string(),
            reason: "Stable flow.".to_string(),
            trigger_type: TriggerType::None,
        }
    }

    /// Weakest prerequisite of the current concept by mastery (unknown
    /// concepts count as 0, ties keep list order), or the concept itself.
    pub fn select_concept_to_retrieve(&self, current_concept_id: &str, model: &StudentModel) -> String {
        if !self.config.use_prerequisites {
            return current_concept_id.to_string();
        }
        let prerequisites = self.graph.prerequisites(current_concept_id);
        let Some(first) = prerequisites.first() else {
            return current_concept_id.to_string();
        };

        let masteries = mastery_map(model);
        let mastery_of = |id: &str| masteries.get(id).copied().unwrap_or(0.0);

        let mut weakest = first;
        let mut lowest = mastery_of(first.as_str());
        for prerequisite in &prerequisites[1..] {
            let mastery = mastery_of(prerequisite.as_str());
            if mastery < lowest {
                lowest = mastery;
                weakest = prerequisite;
            }
        }
        weakest.clone()
    }

    /// Restart the evocation clock.
    pub fn register_successful_evocation(&self, mut model: StudentModel, now_ms: i64) -> StudentModel {
        model.global.last_evocation_timestamp = Some(now_ms);
        model.global.exercises_since_last_evocation = 0;
        tracing::debug!(student_id = %model.id, "evocation registered");
        model
    }

    /// Restart the evocation clock and keep the check's quality for the next
    /// mastery update.
    pub fn register_evocation_result(
        &self,
        model: StudentModel,
        quality: f64,
        now_ms: i64,
    ) -> StudentModel {
        let mut model = self.register_successful_evocation(model, now_ms);
        model.global.last_evocation_score = Some(clamp_unit(quality));
        model
    }

    /// Count one normal exercise completion.
    pub fn increment_exercise_count(&self, mut model: StudentModel) -> StudentModel {
        model.global.exercises_since_last_evocation =
            model.global.exercises_since_last_evocation.saturating_add(1);
        model
    }

    fn trigger(
        &self,
        trigger_type: TriggerType,
        model: &StudentModel,
        current_concept_id: &str,
        reason: String,
    ) -> RetrievalDecision {
        let target = self.select_concept_to_retrieve(current_concept_id, model);
        let reason = if target == current_concept_id {
            format!("{reason} Reinforcing: {target}.")
        } else {
            format!("{reason} Evoking prerequisite: {target}.")
        };

        tracing::info!(
            student_id = %model.id,
            trigger = trigger_type.as_str(),
            concept_id = %current_concept_id,
            target = %target,
            "forced evocation triggered"
        );

        RetrievalDecision {
            should_trigger: true,
            concept_to_retrieve: target,
            reason,
            trigger_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HOUR_MS;
    use crate::graph::catalog;
    use crate::types::{Area, Competence};

    const NOW: i64 = 100 * HOUR_MS;

    fn scheduler() -> RetrievalScheduler {
        RetrievalScheduler::new(RetrievalConfig::default(), Arc::new(catalog::unified()))
    }

    fn fresh_model() -> StudentModel {
        StudentModel::new("s1", NOW)
    }

    fn with_concept(mut model: StudentModel, concept: &str, performance: f64) -> StudentModel {
        model
            .area_mut(Area::Arithmetic)
            .competences
            .conceptual
            .insert(concept.to_string(), Competence::with_state(performance, 0.0));
        model
    }

    #[test]
    fn test_missing_timestamp_triggers_time() {
        let mut model = fresh_model();
        model.global.last_evocation_timestamp = None;
        let decision = scheduler().should_block_for_evocation(&model, "fractions", NOW);
        assert!(decision.should_trigger);
        assert_eq!(decision.trigger_type, TriggerType::Time);
    }

    #[test]
    fn test_time_trigger_after_threshold() {
        let mut model = with_concept(fresh_model(), "fractions", 0.9);
        model.global.last_evocation_timestamp = Some(NOW - 5 * HOUR_MS);
        let decision = scheduler().should_block_for_evocation(&model, "fractions", NOW);
        assert_eq!(decision.trigger_type, TriggerType::Time);

        model.global.last_evocation_timestamp = Some(NOW - 3 * HOUR_MS);
        let decision = scheduler().should_block_for_evocation(&model, "fractions", NOW);
        assert_eq!(decision.trigger_type, TriggerType::None);
        assert!(!decision.should_trigger);
    }

    #[test]
    fn test_extreme_stored_timestamps_saturate() {
        let json = r#"{"id":"old","global":{"lastEvocationTimestamp":-9223372036854775808}}"#;
        let model: StudentModel = serde_json::from_str(json).unwrap();
        let decision = scheduler().should_block_for_evocation(&model, "fractions", 1_700_000_000_000);
        assert_eq!(decision.trigger_type, TriggerType::Time);

        let mut model = with_concept(fresh_model(), "fractions", 0.9);
        model.global.last_evocation_timestamp = Some(i64::MAX);
        let decision = scheduler().should_block_for_evocation(&model, "fractions", i64::MIN);
        assert_eq!(decision.trigger_type, TriggerType::None);
    }

    #[test]
    fn test_interval_trigger() {
        let scheduler = scheduler();
        let mut model = with_concept(fresh_model(), "fractions", 0.9);
        model.global.exercises_since_last_evocation = 2;

        let mut probe = RetrievalScheduler::new(RetrievalConfig::default(), Arc::new(catalog::unified()));
        assert_eq!(
            probe.should_block_for_evocation(&model, "fractions", NOW).trigger_type,
            TriggerType::None
        );

        let model = scheduler.increment_exercise_count(model);
        assert_eq!(
            probe.should_block_for_evocation(&model, "fractions", NOW).trigger_type,
            TriggerType::Interval
        );
    }

    #[test]
    fn test_mastery_trigger_respects_cooldown() {
        let mut scheduler = scheduler();
        let mut model = with_concept(fresh_model(), "fractions", 0.1);
        model.global.attempts = 5;

        let first = scheduler.should_block_for_evocation(&model, "fractions", NOW);
        assert_eq!(first.trigger_type, TriggerType::Mastery);

        model.global.attempts = 7;
        let cooling = scheduler.should_block_for_evocation(&model, "fractions", NOW);
        assert_eq!(cooling.trigger_type, TriggerType::None);

        model.global.attempts = 8;
        let again = scheduler.should_block_for_evocation(&model, "fractions", NOW);
        assert_eq!(again.trigger_type, TriggerType::Mastery);
    }

    #[test]
    fn test_mastery_trigger_waits_for_early_attempts() {
        let mut scheduler = scheduler();
        let model = fresh_model();
        // attempts 0 is only one iteration past the initial -1 marker
        let decision = scheduler.should_block_for_evocation(&model, "mean", NOW);
        assert_eq!(decision.trigger_type, TriggerType::None);

        scheduler.reset();
        let mut model = model;
        model.global.attempts = 2;
        let decision = scheduler.should_block_for_evocation(&model, "mean", NOW);
        assert_eq!(decision.trigger_type, TriggerType::Mastery);
    }

    #[test]
    fn test_select_weakest_prerequisite() {
        let scheduler = scheduler();
        let model = with_concept(fresh_model(), "multiples", 0.6);
        let model = with_concept(model, "prime_factorization", 0.3);
        assert_eq!(scheduler.select_concept_to_retrieve("lcm", &model), "prime_factorization");

        // unseen prerequisites count as 0, first in list order wins the tie
        let empty = fresh_model();
        assert_eq!(scheduler.select_concept_to_retrieve("lcm", &empty), "multiples");

        assert_eq!(scheduler.select_concept_to_retrieve("fractions", &empty), "fractions");
        assert_eq!(scheduler.select_concept_to_retrieve("unknown", &empty), "unknown");
    }

    #[test]
    fn test_prerequisite_walk_can_be_disabled() {
        let config = RetrievalConfig {
            use_prerequisites: false,
            ..RetrievalConfig::default()
        };
        let scheduler = RetrievalScheduler::new(config, Arc::new(catalog::unified()));
        assert_eq!(scheduler.select_concept_to_retrieve("lcm", &fresh_model()), "lcm");
    }

    #[test]
    fn test_trigger_reason_names_target() {
        let mut scheduler = scheduler();
        let mut model = fresh_model();
        model.global.exercises_since_last_evocation = 3;
        let decision = scheduler.should_block_for_evocation(&model, "lcm", NOW);
        assert_eq!(decision.concept_to_retrieve, "multiples");
        assert!(decision.reason.contains("Evoking prerequisite: multiples"));
    }

    #[test]
    fn test_register_successful_evocation_resets_counter() {
        let scheduler = scheduler();
        for prior in [0, 1, 7, u32::MAX] {
            let mut model = fresh_model();
            model.global.exercises_since_last_evocation = prior;
            let model = scheduler.register_successful_evocation(model, NOW + 1);
            assert_eq!(model.global.exercises_since_last_evocation, 0);
            assert_eq!(model.global.last_evocation_timestamp, Some(NOW + 1));
        }
    }

    #[test]
    fn test_register_evocation_result_stores_quality() {
        let scheduler = scheduler();
        let model = scheduler.register_evocation_result(fresh_model(), 1.4, NOW);
        assert_eq!(model.global.last_evocation_score, Some(1.0));
        assert_eq!(model.global.exercises_since_last_evocation, 0);
    }
}
