use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decision::{DecisionEngine, DecisionInput};
use crate::error::Result;
use crate::graph::ConceptGraph;
use crate::integrity::{IntegrityEngine, IntegrityResult, Interaction};
use crate::policy::InteractionContext;
use crate::selectors::find_competence;
use crate::types::{Area, CompetenceId, StudentModel};
use crate::update::{MasteryUpdate, MasteryUpdater};

use super::metrics::{decision_drift, ConditionSummary, SimulationLog};
use super::profiles::ProfileKind;

/// Simulated clock origin, 2024-01-01T00:00:00Z.
const EPOCH_MS: i64 = 1_704_067_200_000;
/// Simulated time between two interactions.
const STEP_MS: i64 = 60_000;

pub const DEFAULT_START_CONCEPT: &str = "multiples";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentReport {
    pub profile: ProfileKind,
    pub iterations: usize,
    pub seed: u64,
    /// Integrity scoring disabled
    pub condition_a: ConditionSummary,
    /// Integrity scoring enabled
    pub condition_b: ConditionSummary,
    pub decision_drift: f64,
}

/// A/B experiment driver: the same virtual learner runs once with every
/// answer fully trusted and once through the integrity engine.
pub struct SimulationRunner {
    config: EngineConfig,
    graph: Arc<ConceptGraph>,
    start_concept: String,
}

impl SimulationRunner {
    pub fn new(config: EngineConfig, graph: Arc<ConceptGraph>) -> Self {
        Self {
            config,
            graph,
            start_concept: DEFAULT_START_CONCEPT.to_string(),
        }
    }

    pub fn with_start_concept(mut self, concept_id: impl Into<String>) -> Self {
        self.start_concept = concept_id.into();
        self
    }

    pub fn run_experiment(
        &self,
        profile: ProfileKind,
        iterations: usize,
        seed: u64,
    ) -> Result<ExperimentReport> {
        let logs_a = self.simulate(profile, iterations, seed, false)?;
        let logs_b = self.simulate(profile, iterations, seed, true)?;

        let report = ExperimentReport {
            profile,
            iterations,
            seed,
            condition_a: ConditionSummary::from_logs(&logs_a),
            condition_b: ConditionSummary::from_logs(&logs_b),
            decision_drift: decision_drift(&logs_a, &logs_b),
        };
        tracing::info!(
            profile = %profile,
            mae_a = report.condition_a.mae,
            mae_b = report.condition_b.mae,
            drift = report.decision_drift,
            "experiment finished"
        );
        Ok(report)
    }

    /// Every profile, in parallel.
    pub fn run_all(&self, iterations: usize, seed: u64) -> Result<Vec<ExperimentReport>> {
        ProfileKind::ALL[..]
            .par_iter()
            .map(|profile| self.run_experiment(*profile, iterations, seed))
            .collect()
    }

    /// One condition on a fresh model. Both conditions of an experiment
    /// share the seed, so they face the same random stream.
    pub fn simulate(
        &self,
        profile: ProfileKind,
        iterations: usize,
        seed: u64,
        use_integrity: bool,
    ) -> Result<Vec<SimulationLog>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let condition = if use_integrity { "B" } else { "A" };
        let mut model = StudentModel::new(format!("sim-{profile}-{condition}"), EPOCH_MS);
        let mut integrity =
            IntegrityEngine::new(self.config.integrity.clone(), Arc::clone(&self.graph));
        let decision = DecisionEngine::new(self.config.decision.clone(), self.config.policy.clone());
        let updater = MasteryUpdater::new(self.config.update.clone());

        let mut logs: Vec<SimulationLog> = Vec::with_capacity(iterations);
        let mut current = self.start_concept.clone();

        for t in 0..iterations {
            let now = EPOCH_MS + t as i64 * STEP_MS;
            let last_score = match logs.last() {
                Some(log) if log.correct => 1.0,
                _ => 0.0,
            };

            let step = decision.decide(
                &DecisionInput {
                    current_concept_id: &current,
                    model: &model,
                    graph: &self.graph,
                    last_performance_score: last_score,
                    current_time: now,
                    area: None,
                    last_evocation_score: model.global.last_evocation_score,
                },
                InteractionContext::Practice,
            );
            if let Some(target) = step.target_concept_id {
                current = target;
            }

            let node = self.graph.node(&current);
            let difficulty = node.map(|n| n.difficulty).unwrap_or(1);
            let area = node
                .and_then(|n| n.domain.area())
                .unwrap_or(Area::Arithmetic);
            let competence = CompetenceId::conceptual(current.as_str());

            let real_ability = profile.real_ability(t);
            let probability = profile.probability_correct(difficulty, t, &mut rng);
            let correct = rng.gen::<f64>() < probability;
            let response_time = profile.response_time(t, &mut rng);

            let result = if use_integrity {
                integrity.evaluate(
                    &Interaction {
                        concept_id: current.clone(),
                        area,
                        competence: competence.clone(),
                        correct,
                        response_time_seconds: response_time,
                        timestamp: now,
                        focus_lost_count: None,
                    },
                    &model,
                )?
            } else {
                IntegrityResult::trusted()
            };

            if !result.block_update {
                model = updater.apply(
                    model,
                    &MasteryUpdate::new(area, competence.clone(), correct, result.score),
                    now,
                );
            }

            let mastery = find_competence(&model, &competence, Some(area))
                .map(|c| c.performance)
                .unwrap_or(0.0);

            logs.push(SimulationLog {
                t,
                concept_id: current.clone(),
                difficulty,
                correct,
                response_time,
                integrity_score: result.score,
                mastery,
                real_ability,
            });
        }

        Ok(logs)
    }
}
