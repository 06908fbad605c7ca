#![allow(dead_code)]

use std::sync::Arc;

use compas_engine::config::HOUR_MS;
use compas_engine::graph::catalog;
use compas_engine::{
    Area, Competence, CompetenceId, ConceptGraph, EngineConfig, Interaction, StudentModel,
    TutorEngine,
};

pub const FIXED_TIMESTAMP: i64 = 1_700_000_000_000;
pub const FOUR_HOURS_MS: i64 = 4 * HOUR_MS;

pub fn unified_graph() -> Arc<ConceptGraph> {
    Arc::new(catalog::unified())
}

pub fn create_test_engine() -> TutorEngine {
    TutorEngine::new(EngineConfig::default(), unified_graph()).expect("default config is valid")
}

/// Fresh learner with the evocation clock started at `FIXED_TIMESTAMP`.
pub fn fresh_model() -> StudentModel {
    StudentModel::new("student-test", FIXED_TIMESTAMP)
}

/// Learner holding one conceptual competence at the given state.
pub fn model_with_concept(
    area: Area,
    concept_id: &str,
    performance: f64,
    stability: f64,
    attempts: u32,
) -> StudentModel {
    let mut model = fresh_model();
    let mut competence = Competence::with_state(performance, stability);
    competence.attempts = attempts;
    competence.last_reviewed = FIXED_TIMESTAMP;
    model
        .area_mut(area)
        .competences
        .conceptual
        .insert(concept_id.to_string(), competence);
    model
}

pub fn sample_interaction(concept_id: &str, area: Area, correct: bool) -> Interaction {
    Interaction {
        concept_id: concept_id.to_string(),
        area,
        competence: CompetenceId::conceptual(concept_id),
        correct,
        response_time_seconds: 9.0,
        timestamp: FIXED_TIMESTAMP,
        focus_lost_count: None,
    }
}
