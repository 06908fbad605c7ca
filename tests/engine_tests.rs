//! End-to-end tests for the pedagogical engine.
//!
//! Covers the reference learner scenarios (fresh update, gold medal,
//! improbable streak, time-triggered evocation), rule priority in the
//! decision engine, and the `TutorEngine` session flow.

mod common;

use common::*;

use compas_engine::config::HOUR_MS;
use compas_engine::{
    Area, Competence, CompetenceId, DecisionEngine, DecisionInput, DecisionKind, EngineConfig,
    FlagKind, IntegrityEngine, IntegrityResult, InteractionContext, Medal, NextStep,
    PolicyOverride, RetrievalConfig, RetrievalScheduler, StepRequest, TriggerType,
};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn test_fresh_competence_single_correct_answer() {
    let engine = create_test_engine();
    let interaction = sample_interaction("fractions", Area::Arithmetic, true);

    let outcome = engine
        .record_verdict(fresh_model(), &interaction, InteractionContext::Practice)
        .unwrap();

    assert_eq!(outcome.integrity.score, 1.0);
    assert!(outcome.applied);
    let competence = outcome
        .model
        .competence(Area::Arithmetic, &CompetenceId::conceptual("fractions"))
        .unwrap();
    // 0.15 * 1.0 * (1 + 0.2 * 0.5)
    assert!(approx(competence.performance, 0.165));
    assert_eq!(competence.medal(), Medal::None);
}

#[test]
fn test_high_performance_and_stability_is_gold() {
    let competence = Competence::with_state(0.9, 0.75);
    assert_eq!(competence.medal(), Medal::Gold);

    let model = model_with_concept(Area::Statistics, "mean", 0.9, 0.75, 12);
    let stored = model
        .competence(Area::Statistics, &CompetenceId::conceptual("mean"))
        .unwrap();
    assert_eq!(stored.medal(), Medal::Gold);
}

#[test]
fn test_improbable_streak_flagged_on_fifth_answer() {
    let mut integrity = IntegrityEngine::new(EngineConfig::default().integrity, unified_graph());
    let model = model_with_concept(Area::Arithmetic, "fractions", 0.1, 0.0, 1);
    let interaction = sample_interaction("fractions", Area::Arithmetic, true);

    for _ in 0..4 {
        let result = integrity.evaluate(&interaction, &model).unwrap();
        assert!(!result.has_flag(FlagKind::ImprobableStreak));
    }

    let fifth = integrity.evaluate(&interaction, &model).unwrap();
    assert!(fifth.has_flag(FlagKind::ImprobableStreak));
    assert!(fifth.penalty(FlagKind::ImprobableStreak) > 0.0);
    assert!(fifth.score < 1.0);
}

#[test]
fn test_stale_evocation_triggers_time() {
    let mut scheduler = RetrievalScheduler::new(RetrievalConfig::default(), unified_graph());
    let now = FIXED_TIMESTAMP;
    let mut model = fresh_model();
    model.global.last_evocation_timestamp = Some(now - 5 * HOUR_MS);
    assert_eq!(scheduler.config().time_threshold_ms, FOUR_HOURS_MS);

    let decision = scheduler.should_block_for_evocation(&model, "fractions", now);

    assert!(decision.should_trigger);
    assert_eq!(decision.trigger_type, TriggerType::Time);
}

// ============================================================================
// Retrieval scheduling
// ============================================================================

#[test]
fn test_interval_trigger_after_counted_exercises() {
    let mut scheduler = RetrievalScheduler::new(RetrievalConfig::default(), unified_graph());
    let mut model = fresh_model();
    // keep the mastery trigger quiet
    model
        .area_mut(Area::Arithmetic)
        .competences
        .conceptual
        .insert("percentages".to_string(), Competence::with_state(0.7, 0.5));

    for _ in 0..2 {
        model = scheduler.increment_exercise_count(model);
        let decision = scheduler.should_block_for_evocation(&model, "percentages", FIXED_TIMESTAMP);
        assert!(!decision.should_trigger);
    }

    model = scheduler.increment_exercise_count(model);
    let decision = scheduler.should_block_for_evocation(&model, "percentages", FIXED_TIMESTAMP);
    assert!(decision.should_trigger);
    assert_eq!(decision.trigger_type, TriggerType::Interval);
    assert_eq!(decision.concept_to_retrieve, "fractions");

    let model = scheduler.register_successful_evocation(model, FIXED_TIMESTAMP);
    assert_eq!(model.global.exercises_since_last_evocation, 0);
    let decision = scheduler.should_block_for_evocation(&model, "percentages", FIXED_TIMESTAMP);
    assert_eq!(decision.trigger_type, TriggerType::None);
}

#[test]
fn test_successful_evocation_always_zeroes_counter() {
    let scheduler = RetrievalScheduler::new(RetrievalConfig::default(), unified_graph());
    for prior in [0, 1, 3, 250, u32::MAX] {
        let mut model = fresh_model();
        model.global.exercises_since_last_evocation = prior;
        let later = FIXED_TIMESTAMP + HOUR_MS;

        let model = scheduler.register_successful_evocation(model, later);
        assert_eq!(model.global.exercises_since_last_evocation, 0);
        assert_eq!(model.global.last_evocation_timestamp, Some(later));
    }
}

#[test]
fn test_mastery_cooldown_reset_is_idempotent() {
    let mut scheduler = RetrievalScheduler::new(RetrievalConfig::default(), unified_graph());
    let mut model = fresh_model();
    model.global.attempts = 2;

    let first = scheduler.should_block_for_evocation(&model, "lcm", FIXED_TIMESTAMP);
    assert_eq!(first.trigger_type, TriggerType::Mastery);

    let cooling = scheduler.should_block_for_evocation(&model, "lcm", FIXED_TIMESTAMP);
    assert!(!cooling.should_trigger);

    scheduler.reset();
    scheduler.reset();
    let again = scheduler.should_block_for_evocation(&model, "lcm", FIXED_TIMESTAMP);
    assert_eq!(again.trigger_type, TriggerType::Mastery);
}

// ============================================================================
// Decision priority
// ============================================================================

#[test]
fn test_advance_outranks_low_last_score() {
    let config = EngineConfig::default();
    let engine = DecisionEngine::new(config.decision, config.policy);
    let graph = unified_graph();
    let model = model_with_concept(Area::Arithmetic, "fractions", 0.9, 0.8, 10);

    let decision = engine.decide(
        &DecisionInput {
            current_concept_id: "fractions",
            model: &model,
            graph: &graph,
            last_performance_score: 0.0,
            current_time: FIXED_TIMESTAMP,
            area: Some(Area::Arithmetic),
            last_evocation_score: None,
        },
        InteractionContext::Practice,
    );

    assert_eq!(decision.decision, DecisionKind::AdvanceToNext);
    // percentages and ratios tie on difficulty
    assert_eq!(decision.target_concept_id.as_deref(), Some("percentages"));
}

#[test]
fn test_remediation_outranks_everything() {
    let config = EngineConfig::default();
    let engine = DecisionEngine::new(config.decision, config.policy);
    let graph = unified_graph();
    let model = model_with_concept(Area::Arithmetic, "lcm", 0.3, 0.0, 10);

    let decision = engine.decide(
        &DecisionInput {
            current_concept_id: "lcm",
            model: &model,
            graph: &graph,
            last_performance_score: 0.0,
            current_time: FIXED_TIMESTAMP + 10 * 24 * HOUR_MS,
            area: None,
            last_evocation_score: Some(0.1),
        },
        InteractionContext::Practice,
    );

    assert_eq!(decision.decision, DecisionKind::RemediateCurrent);
    assert_eq!(decision.target_concept_id.as_deref(), Some("lcm"));
    assert!(approx(decision.confidence, 0.9));
}

// ============================================================================
// Integrity classification
// ============================================================================

#[test]
fn test_reliable_boundary_is_inclusive() {
    let config = EngineConfig::default().integrity;

    let at = IntegrityResult::from_score(0.5, Vec::new(), &config);
    assert!(at.reliable);

    let below = IntegrityResult::from_score(0.499, Vec::new(), &config);
    assert!(!below.reliable);
    assert!(!below.block_update);
}

// ============================================================================
// TutorEngine session flow
// ============================================================================

#[test]
fn test_session_flow_through_facade() {
    let engine = create_test_engine();
    let mut model = fresh_model();
    let request = StepRequest {
        concept_id: "fractions".to_string(),
        area: Some(Area::Arithmetic),
        last_performance_score: 1.0,
        context: InteractionContext::Practice,
        now_ms: FIXED_TIMESTAMP,
    };

    assert!(matches!(engine.next_step(&model, &request), NextStep::Exercise(_)));

    for _ in 0..3 {
        let outcome = engine
            .record_verdict(
                model,
                &sample_interaction("fractions", Area::Arithmetic, true),
                InteractionContext::Practice,
            )
            .unwrap();
        assert!(outcome.applied);
        assert!(outcome.integrity.score > 0.0 && outcome.integrity.score <= 1.0);
        model = outcome.model;
    }
    assert_eq!(model.global.exercises_since_last_evocation, 3);
    assert_eq!(model.global.attempts, 3);

    let NextStep::Evocation(evocation) = engine.next_step(&model, &request) else {
        panic!("expected a forced evocation after three exercises");
    };
    assert_eq!(evocation.trigger_type, TriggerType::Interval);

    let model = engine.complete_evocation(model, 0.9, FIXED_TIMESTAMP);
    assert_eq!(model.global.last_evocation_score, Some(0.9));

    let NextStep::Exercise(decision) = engine.next_step(&model, &request) else {
        panic!("evocation should have reset the interval");
    };
    assert_eq!(decision.target_concept_id.as_deref(), Some("fractions"));
}

#[test]
fn test_blocked_verdict_leaves_competence_untouched() {
    let engine = create_test_engine();
    let model = model_with_concept(Area::Arithmetic, "fractions", 0.6, 0.4, 4);
    let mut interaction = sample_interaction("fractions", Area::Arithmetic, true);
    interaction.focus_lost_count = Some(10);
    interaction.response_time_seconds = 0.0;

    let outcome = engine
        .record_verdict(model, &interaction, InteractionContext::Practice)
        .unwrap();

    assert!(outcome.integrity.block_update);
    assert!(!outcome.applied);
    let competence = outcome
        .model
        .competence(Area::Arithmetic, &CompetenceId::conceptual("fractions"))
        .unwrap();
    assert_eq!(competence.performance, 0.6);
    assert_eq!(competence.attempts, 4);
    assert_eq!(outcome.model.global.exercises_since_last_evocation, 1);
}

#[test]
fn test_invalid_interaction_is_rejected() {
    let engine = create_test_engine();
    let mut interaction = sample_interaction("fractions", Area::Arithmetic, true);
    interaction.response_time_seconds = f64::NAN;

    assert!(engine
        .record_verdict(fresh_model(), &interaction, InteractionContext::Practice)
        .is_err());
}

#[test]
fn test_policy_override_validation() {
    let engine = create_test_engine();
    let rejected = engine.update_policy(
        InteractionContext::Assessment,
        PolicyOverride {
            scaffold_threshold: Some(0.95),
            reduce_threshold: Some(0.5),
            ..Default::default()
        },
    );
    assert!(rejected.is_err());

    let default_weight = engine
        .policy()
        .weights(InteractionContext::Assessment)
        .mastery_weight;
    engine
        .update_policy(
            InteractionContext::Assessment,
            PolicyOverride {
                mastery_weight: Some(default_weight + 0.25),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(approx(
        engine.policy().weights(InteractionContext::Assessment).mastery_weight,
        default_weight + 0.25
    ));
}
