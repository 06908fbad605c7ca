//! # compas-engine - adaptive pedagogical state engine
//!
//! Decides, for each learner interaction, how far its evidence can be
//! trusted, which pedagogical action comes next and how the learner's
//! per-concept mastery estimate moves.
//!
//! ## Modules
//!
//! - [`types`] - competence model (`StudentModel` and its parts, medals)
//! - [`graph`] - concept graph and the built-in catalog
//! - [`policy`] - per-context update weights and decision thresholds
//! - [`integrity`] - multiplicative trust scoring of one interaction
//! - [`decision`] - priority-ordered pedagogical decision rules
//! - [`retrieval`] - forced memory-retrieval scheduling
//! - [`update`] - mastery update cascade
//! - [`selectors`] - read-only model queries
//! - [`engine`] - `TutorEngine` façade over all of the above
//! - [`simulation`] - virtual learners and A/B experiments
//!
//! ## Example
//!
//! ```rust
//! use compas_engine::{
//!     Area, CompetenceId, EngineConfig, Interaction, InteractionContext, StudentModel,
//!     TutorEngine,
//! };
//!
//! let engine = TutorEngine::with_catalog(EngineConfig::default()).unwrap();
//! let model = StudentModel::new("student-1", 0);
//!
//! let interaction = Interaction {
//!     concept_id: "fractions".to_string(),
//!     area: Area::Arithmetic,
//!     competence: CompetenceId::conceptual("fractions"),
//!     correct: true,
//!     response_time_seconds: 12.0,
//!     timestamp: 1_000,
//!     focus_lost_count: None,
//! };
//! let outcome = engine
//!     .record_verdict(model, &interaction, InteractionContext::Practice)
//!     .unwrap();
//! assert!(outcome.applied);
//! ```

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod graph;
pub mod integrity;
pub mod logging;
pub mod policy;
pub mod retrieval;
pub mod selectors;
pub mod simulation;
pub mod types;
pub mod update;

pub use config::{DecisionConfig, EngineConfig, IntegrityConfig, RetrievalConfig, UpdateConfig};
pub use decision::{DecisionEngine, DecisionInput, DecisionKind, PedagogicalDecision};
pub use engine::{NextStep, StepRequest, TutorEngine, VerdictOutcome};
pub use error::{EngineError, Result};
pub use graph::{ConceptDomain, ConceptGraph, ConceptNode};
pub use integrity::{FlagKind, IntegrityEngine, IntegrityFlag, IntegrityResult, Interaction};
pub use policy::{InteractionContext, InteractionPolicy, PolicyOverride};
pub use retrieval::{RetrievalDecision, RetrievalScheduler, TriggerType};
pub use types::*;
pub use update::{update_student_state, MasteryUpdate, MasteryUpdater};
