//! Mastery Update Cascade
//!
//! Applies one verdict to the competence model: the targeted competence
//! moves by a delta scaled by integrity and retrieval quality, procedural
//! slots propagate a damped share into their transversal global competence,
//! and the running global statistics and area mastery are refreshed.

use serde::{Deserialize, Serialize};

use crate::config::UpdateConfig;
use crate::types::{clamp_unit, Area, Competence, CompetenceId, StudentModel};

/// One verdict to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryUpdate {
    pub area: Area,
    pub competence: CompetenceId,
    pub correct: bool,
    /// Integrity Engine score; NaN counts as 0
    pub integrity_score: f64,
    /// Context weight on the performance delta, 1.0 for practice
    #[serde(default = "default_weight")]
    pub mastery_weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl MasteryUpdate {
    pub fn new(area: Area, competence: CompetenceId, correct: bool, integrity_score: f64) -> Self {
        Self {
            area,
            competence,
            correct,
            integrity_score,
            mastery_weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, mastery_weight: f64) -> Self {
        self.mastery_weight = mastery_weight;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MasteryUpdater {
    config: UpdateConfig,
}

impl MasteryUpdater {
    pub fn new(config: UpdateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    pub fn apply(&self, mut model: StudentModel, update: &MasteryUpdate, now_ms: i64) -> StudentModel {
        let integrity = clamp_unit(update.integrity_score);
        let weight = if update.mastery_weight.is_finite() {
            update.mastery_weight.max(0.0)
        } else {
            default_weight()
        };

        if !model.areas.contains_key(&update.area) {
            tracing::warn!(
                student_id = %model.id,
                area = %update.area,
                "area missing from student model, initializing"
            );
        }

        // absent evocation evidence counts as a weak signal, not a neutral one
        let retrieval_quality = model
            .global
            .last_evocation_score
            .map(clamp_unit)
            .unwrap_or(self.config.missing_evocation_score);

        tracing::debug!(
            student_id = %model.id,
            area = %update.area,
            competence = %update.competence,
            correct = update.correct,
            integrity,
            retrieval_quality,
            "applying mastery update"
        );

        let area = model.area_mut(update.area);
        let target = area.competences.get_or_insert(&update.competence);
        *target = self.next_state(target, update.correct, integrity, retrieval_quality, weight, now_ms);
        let updated = target.clone();
        let was_mastered = area.mastery;
        let mastered = area.refresh_mastery();

        tracing::debug!(
            competence = %update.competence,
            performance = updated.performance,
            stability = updated.stability,
            medal = updated.medal().as_str(),
            "competence updated"
        );

        if let Some(slot) = update.competence.global_slot() {
            let global = model.global.slot_mut(slot);
            let projected =
                self.next_state(global, update.correct, integrity, retrieval_quality, weight, now_ms);
            let blend = self.config.global_blend;
            let performance = global.performance * (1.0 - blend) + projected.performance * blend;
            let stability = global.stability * (1.0 - blend) + projected.stability * blend;
            global.set_state(performance, stability);
            global.attempts = global.attempts.saturating_add(1);
        }

        let alpha = self.config.reliability_alpha;
        let global = &mut model.global;
        global.reliability = clamp_unit((1.0 - alpha) * global.reliability + alpha * integrity);
        global.attempts = global.attempts.saturating_add(1);

        if mastered && !was_mastered {
            tracing::info!(student_id = %model.id, area = %update.area, "area mastered");
        }

        model
    }

    fn next_state(
        &self,
        prev: &Competence,
        correct: bool,
        integrity: f64,
        retrieval_quality: f64,
        weight: f64,
        now_ms: i64,
    ) -> Competence {
        let config = &self.config;
        let impact = integrity.max(config.min_impact);

        let delta = if correct {
            let cognitive_multiplier = 1.0 + retrieval_quality * config.retrieval_bonus;
            config.base_gain * impact * cognitive_multiplier
        } else {
            // a slip after good retrieval is procedural, not conceptual
            let mitigation = retrieval_quality * config.retrieval_mitigation;
            -config.base_loss * impact * (1.0 - mitigation)
        };

        let stability = if correct {
            prev.stability + config.stability_gain * integrity
        } else {
            prev.stability - config.stability_loss
        };

        let mut next = prev.clone();
        next.set_state(prev.performance + delta * weight, stability);
        next.reliability = integrity;
        next.attempts = prev.attempts.saturating_add(1);
        next.last_reviewed = now_ms;
        next.retrieval_strength = retrieval_quality;
        next.last_retrieval_score = Some(retrieval_quality);
        next
    }
}

/// Apply one verdict with the default update constants and practice weight.
pub fn update_student_state(
    model: StudentModel,
    area: Area,
    competence: CompetenceId,
    correct: bool,
    integrity_score: f64,
    now_ms: i64,
) -> StudentModel {
    MasteryUpdater::default().apply(
        model,
        &MasteryUpdate::new(area, competence, correct, integrity_score),
        now_ms,
    )
}
