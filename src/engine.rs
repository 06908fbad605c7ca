//! `TutorEngine`: one session-scoped entry point over the pedagogical
//! components.
//!
//! Call order per exercise:
//! 1. [`TutorEngine::next_step`] before generating an exercise. It returns a
//!    forced evocation or a pedagogical decision.
//! 2. [`TutorEngine::record_verdict`] once the learner answered.
//! 3. [`TutorEngine::complete_evocation`] after a forced retrieval check.
//!
//! The two stateful components sit behind `parking_lot` locks so one engine
//! can be shared across a session's handlers. The student model is never
//! stored: every call takes it and returns the new value.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decision::{DecisionEngine, DecisionInput, PedagogicalDecision};
use crate::error::Result;
use crate::graph::{catalog, ConceptGraph};
use crate::integrity::{IntegrityEngine, IntegrityResult, Interaction};
use crate::policy::{InteractionContext, InteractionPolicy, PolicyOverride};
use crate::retrieval::{RetrievalDecision, RetrievalScheduler};
use crate::types::{Area, StudentModel};
use crate::update::{MasteryUpdate, MasteryUpdater};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub concept_id: String,
    #[serde(default)]
    pub area: Option<Area>,
    pub last_performance_score: f64,
    #[serde(default)]
    pub context: InteractionContext,
    pub now_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextStep {
    /// The learner must pass a retrieval prompt first
    Evocation(RetrievalDecision),
    Exercise(PedagogicalDecision),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictOutcome {
    pub model: StudentModel,
    pub integrity: IntegrityResult,
    /// False when the integrity score blocked the mastery update
    pub applied: bool,
}

pub struct TutorEngine {
    graph: Arc<ConceptGraph>,
    integrity: Mutex<IntegrityEngine>,
    scheduler: Mutex<RetrievalScheduler>,
    decision: RwLock<DecisionEngine>,
    updater: MasteryUpdater,
}

impl TutorEngine {
    pub fn new(config: EngineConfig, graph: Arc<ConceptGraph>) -> Result<Self> {
        config.validate()?;
        let EngineConfig {
            integrity,
            decision,
            retrieval,
            update,
            policy,
        } = config;

        Ok(Self {
            integrity: Mutex::new(IntegrityEngine::new(integrity, Arc::clone(&graph))),
            scheduler: Mutex::new(RetrievalScheduler::new(retrieval, Arc::clone(&graph))),
            decision: RwLock::new(DecisionEngine::new(decision, policy)),
            updater: MasteryUpdater::new(update),
            graph,
        })
    }

    /// Engine over the built-in arithmetic and statistics catalog.
    pub fn with_catalog(config: EngineConfig) -> Result<Self> {
        Self::new(config, Arc::new(catalog::unified()))
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    /// Scheduler gate first; the decision engine only runs when no evocation
    /// is due.
    pub fn next_step(&self, model: &StudentModel, request: &StepRequest) -> NextStep {
        let evocation = self.scheduler.lock().should_block_for_evocation(
            model,
            &request.concept_id,
            request.now_ms,
        );
        if evocation.should_trigger {
            return NextStep::Evocation(evocation);
        }

        let input = DecisionInput {
            current_concept_id: &request.concept_id,
            model,
            graph: &self.graph,
            last_performance_score: request.last_performance_score,
            current_time: request.now_ms,
            area: request.area,
            last_evocation_score: model.global.last_evocation_score,
        };
        NextStep::Exercise(self.decision.read().decide(&input, request.context))
    }

    /// Score the interaction, apply it unless blocked, and count the exercise
    /// toward the next evocation (retrieval checks are not counted).
    pub fn record_verdict(
        &self,
        model: StudentModel,
        interaction: &Interaction,
        context: InteractionContext,
    ) -> Result<VerdictOutcome> {
        let integrity = self.integrity.lock().evaluate(interaction, &model)?;

        let applied = !integrity.block_update;
        let mut model = if applied {
            let weight = self.decision.read().policy().weights(context).mastery_weight;
            let update = MasteryUpdate::new(
                interaction.area,
                interaction.competence.clone(),
                interaction.correct,
                integrity.score,
            )
            .with_weight(weight);
            self.updater.apply(model, &update, interaction.timestamp)
        } else {
            model
        };

        if context != InteractionContext::Retrieval {
            model = self.scheduler.lock().increment_exercise_count(model);
        }

        Ok(VerdictOutcome {
            model,
            integrity,
            applied,
        })
    }

    /// Close a forced retrieval check with its quality in `[0, 1]`.
    pub fn complete_evocation(&self, model: StudentModel, quality: f64, now_ms: i64) -> StudentModel {
        self.scheduler
            .lock()
            .register_evocation_result(model, quality, now_ms)
    }

    /// Drop the integrity streak window and the mastery-trigger cooldown.
    pub fn clear_history(&self) {
        self.integrity.lock().clear_history();
        self.scheduler.lock().reset();
    }

    pub fn policy(&self) -> InteractionPolicy {
        self.decision.read().policy().clone()
    }

    pub fn update_policy(&self, context: InteractionContext, patch: PolicyOverride) -> Result<()> {
        self.decision.write().policy_mut().update(context, patch)
    }

    pub fn reset_policy(&self) {
        self.decision.write().policy_mut().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HOUR_MS;
    use crate::types::CompetenceId;

    const NOW: i64 = 1_000 * HOUR_MS;

    fn engine() -> TutorEngine {
        TutorEngine::with_catalog(EngineConfig::default()).unwrap()
    }

    fn interaction(correct: bool) -> Interaction {
        Interaction {
            concept_id: "fractions".to_string(),
            area: Area::Arithmetic,
            competence: CompetenceId::conceptual("fractions"),
            correct,
            response_time_seconds: 9.0,
            timestamp: NOW,
            focus_lost_count: None,
        }
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TutorEngine>();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.retrieval.interval = 0;
        assert!(TutorEngine::with_catalog(config).is_err());
    }

    #[test]
    fn test_record_verdict_counts_practice_only() {
        let engine = engine();
        let model = StudentModel::new("s1", NOW);

        let outcome = engine
            .record_verdict(model, &interaction(true), InteractionContext::Practice)
            .unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.model.global.exercises_since_last_evocation, 1);

        let outcome = engine
            .record_verdict(outcome.model, &interaction(true), InteractionContext::Retrieval)
            .unwrap();
        assert_eq!(outcome.model.global.exercises_since_last_evocation, 1);
    }

    #[test]
    fn test_retrieval_context_weight_applies() {
        let engine = engine();
        let outcome = engine
            .record_verdict(
                StudentModel::new("s1", NOW),
                &interaction(true),
                InteractionContext::Retrieval,
            )
            .unwrap();
        let competence = outcome
            .model
            .competence(Area::Arithmetic, &CompetenceId::conceptual("fractions"))
            .unwrap();
        assert!((competence.performance - 0.165 * 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_next_step_gates_on_interval() {
        let engine = engine();
        let mut model = StudentModel::new("s1", NOW);
        model.global.exercises_since_last_evocation = 3;

        let request = StepRequest {
            concept_id: "fractions".to_string(),
            area: Some(Area::Arithmetic),
            last_performance_score: 1.0,
            context: InteractionContext::Practice,
            now_ms: NOW,
        };
        assert!(matches!(engine.next_step(&model, &request), NextStep::Evocation(_)));

        let model = engine.complete_evocation(model, 0.8, NOW);
        assert_eq!(model.global.last_evocation_score, Some(0.8));
        assert!(matches!(engine.next_step(&model, &request), NextStep::Exercise(_)));
    }

    #[test]
    fn test_policy_updates_are_shared() {
        let engine = engine();
        engine
            .update_policy(
                InteractionContext::Practice,
                PolicyOverride {
                    mastery_weight: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            engine.policy().weights(InteractionContext::Practice).mastery_weight,
            0.5
        );
        engine.reset_policy();
        assert_eq!(engine.policy(), InteractionPolicy::default());
    }
}
