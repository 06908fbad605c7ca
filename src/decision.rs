//! Decision Engine
//!
//! Priority-ordered rule list: the first matching rule wins. Thresholds for
//! remediation and advancement come from the [`InteractionPolicy`] entry of
//! the interaction context; every decision carries a reasoning string with
//! the numbers that triggered it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{DecisionConfig, HOUR_MS};
use crate::graph::ConceptGraph;
use crate::policy::{InteractionContext, InteractionPolicy};
use crate::selectors::find_competence;
use crate::types::{Area, CompetenceId, StudentModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    ScaffoldCurrent,
    ReduceScaffoldCurrent,
    EvokePrerequisite,
    SpacedReview,
    RemediateCurrent,
    AdvanceToNext,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScaffoldCurrent => "scaffold_current",
            Self::ReduceScaffoldCurrent => "reduce_scaffold_current",
            Self::EvokePrerequisite => "evoke_prerequisite",
            Self::SpacedReview => "spaced_review",
            Self::RemediateCurrent => "remediate_current",
            Self::AdvanceToNext => "advance_to_next",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct DecisionInput<'a> {
    pub current_concept_id: &'a str,
    pub model: &'a StudentModel,
    pub graph: &'a ConceptGraph,
    /// Score of the latest attempt, in `[0, 1]`
    pub last_performance_score: f64,
    /// Milliseconds since epoch
    pub current_time: i64,
    /// Restricts the competence lookup to one area
    pub area: Option<Area>,
    pub last_evocation_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedagogicalDecision {
    pub decision: DecisionKind,
    pub target_concept_id: Option<String>,
    pub reasoning: String,
    pub confidence: f64,
}

impl PedagogicalDecision {
    fn new(
        decision: DecisionKind,
        target: impl Into<String>,
        confidence: f64,
        reasoning: String,
    ) -> Self {
        Self {
            decision,
            target_concept_id: Some(target.into()),
            reasoning,
            confidence,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: DecisionConfig,
    policy: InteractionPolicy,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig, policy: InteractionPolicy) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn policy(&self) -> &InteractionPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut InteractionPolicy {
        &mut self.policy
    }

    pub fn decide(
        &self,
        input: &DecisionInput<'_>,
        context: InteractionContext,
    ) -> PedagogicalDecision {
        let decision = self.evaluate_rules(input, context);
        tracing::debug!(
            concept_id = %input.current_concept_id,
            context = %context,
            decision = %decision.decision,
            target = decision.target_concept_id.as_deref().unwrap_or(""),
            confidence = decision.confidence,
            "pedagogical decision"
        );
        decision
    }

    fn evaluate_rules(
        &self,
        input: &DecisionInput<'_>,
        context: InteractionContext,
    ) -> PedagogicalDecision {
        let current = input.current_concept_id;
        let competence_id = CompetenceId::parse(current);
        let competence = find_competence(input.model, &competence_id, input.area);
        let node = input.graph.node(current);

        let (Some(competence), Some(node)) = (competence, node) else {
            return PedagogicalDecision::new(
                DecisionKind::ScaffoldCurrent,
                current,
                0.5,
                format!(
                    "Competence or concept \"{current}\" not found; falling back to preventive scaffold."
                ),
            );
        };

        let thresholds = self.policy.thresholds(context);
        let performance = competence.performance;

        if performance < thresholds.scaffold_threshold {
            return PedagogicalDecision::new(
                DecisionKind::RemediateCurrent,
                current,
                0.9,
                format!(
                    "Low performance ({performance:.2} < {:.2} [{context}]). Intensive reinforcement of the concept.",
                    thresholds.scaffold_threshold
                ),
            );
        }

        if performance > thresholds.reduce_threshold {
            if let Some(next) = next_concept(input.graph, current) {
                return PedagogicalDecision::new(
                    DecisionKind::AdvanceToNext,
                    next,
                    0.95,
                    format!(
                        "High performance ({performance:.2} > {:.2}). Ready for the next concept: {next}.",
                        thresholds.reduce_threshold
                    ),
                );
            }
            return PedagogicalDecision::new(
                DecisionKind::ReduceScaffoldCurrent,
                current,
                0.85,
                format!(
                    "High performance ({performance:.2} > {:.2}). No dependent concept; reducing support.",
                    thresholds.reduce_threshold
                ),
            );
        }

        if competence.retrieval_strength < self.config.retrieval_threshold_low {
            if let Some(prerequisite) = weakest_prerequisite(&node.prerequisites, input.model) {
                return PedagogicalDecision::new(
                    DecisionKind::EvokePrerequisite,
                    prerequisite,
                    0.8,
                    format!(
                        "Weak retrieval ({:.2} < {:.2}). Reinforcing prerequisite \"{prerequisite}\".",
                        competence.retrieval_strength, self.config.retrieval_threshold_low
                    ),
                );
            }
        }

        if competence.stability < self.config.stability_threshold_low {
            let since_review = input.current_time.saturating_sub(competence.last_reviewed);
            if since_review > self.config.spaced_review_interval_ms {
                return PedagogicalDecision::new(
                    DecisionKind::SpacedReview,
                    current,
                    0.75,
                    format!(
                        "Low stability ({:.2} < {:.2}). Spaced review due, last seen {}.",
                        competence.stability,
                        self.config.stability_threshold_low,
                        format_elapsed(since_review)
                    ),
                );
            }
        }

        if input.last_performance_score < self.config.recent_performance_floor {
            return PedagogicalDecision::new(
                DecisionKind::ScaffoldCurrent,
                current,
                0.7,
                format!(
                    "Low score on the last attempt ({:.2} < {:.2}). Adding targeted support.",
                    input.last_performance_score, self.config.recent_performance_floor
                ),
            );
        }

        let evocation = input
            .last_evocation_score
            .unwrap_or(self.config.default_evocation_score);
        PedagogicalDecision::new(
            DecisionKind::ScaffoldCurrent,
            current,
            0.6,
            format!(
                "Intermediate state in \"{context}\" context (performance {performance:.2}, evocation {evocation:.2}). Consolidating with standard scaffold."
            ),
        )
    }
}

/// Lowest-difficulty concept listing `concept_id` as a prerequisite, ties
/// broken by id.
fn next_concept<'g>(graph: &'g ConceptGraph, concept_id: &str) -> Option<&'g str> {
    graph
        .dependents(concept_id)
        .into_iter()
        .min_by_key(|node| node.difficulty)
        .map(|node| node.id.as_str())
}

/// Located prerequisite with the lowest performance. Prerequisites the
/// learner has never practiced, or that sit at full performance, are skipped.
fn weakest_prerequisite<'p>(prerequisites: &'p [String], model: &StudentModel) -> Option<&'p str> {
    let mut weakest = None;
    let mut lowest = 1.0;
    for prerequisite in prerequisites {
        let id = CompetenceId::parse(prerequisite);
        if let Some(competence) = find_competence(model, &id, None) {
            if competence.performance < lowest {
                lowest = competence.performance;
                weakest = Some(prerequisite.as_str());
            }
        }
    }
    weakest
}

fn format_elapsed(ms: i64) -> String {
    let hours = ms / HOUR_MS;
    let days = hours / 24;
    if days > 0 {
        format!("{days} day(s) ago")
    } else if hours > 0 {
        format!("{hours} hour(s) ago")
    } else {
        "less than an hour ago".to_string()
    }
}
