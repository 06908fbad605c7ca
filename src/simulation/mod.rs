//! Deterministic virtual learners for end-to-end evaluation of the engine.
//!
//! Each experiment runs one behavioral profile twice over fresh models,
//! without and with integrity scoring, and compares how far the mastery
//! estimate drifts from the learner's true ability.

pub mod metrics;
pub mod profiles;
pub mod runner;

pub use metrics::{ConditionSummary, SimulationLog};
pub use profiles::ProfileKind;
pub use runner::{ExperimentReport, SimulationRunner};
