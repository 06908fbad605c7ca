//! Competence Model
//!
//! One learner's mastery state: per-area procedural and conceptual
//! competences, cross-area transversal competences and the global running
//! statistics the retrieval scheduler and integrity engine read.
//!
//! Every struct deserializes with `#[serde(default)]` so records written by
//! older schema versions load with zeroed gaps instead of failing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ==================== Medal ====================

/// Medal tier derived from a competence's performance and stability.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Medal {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    pub const GOLD_PERFORMANCE: f64 = 0.85;
    pub const GOLD_STABILITY: f64 = 0.7;
    pub const SILVER_PERFORMANCE: f64 = 0.65;
    pub const BRONZE_PERFORMANCE: f64 = 0.35;

    /// Pure medal rule. Monotonic in both inputs.
    pub fn derive(performance: f64, stability: f64) -> Self {
        if performance >= Self::GOLD_PERFORMANCE && stability >= Self::GOLD_STABILITY {
            Self::Gold
        } else if performance >= Self::SILVER_PERFORMANCE {
            Self::Silver
        } else if performance >= Self::BRONZE_PERFORMANCE {
            Self::Bronze
        } else {
            Self::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
        }
    }

    /// SILVER or better.
    pub fn is_solid(&self) -> bool {
        *self >= Self::Silver
    }

    pub fn is_awarded(&self) -> bool {
        *self != Self::None
    }
}

// ==================== Area ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Arithmetic,
    Statistics,
    Algebra,
}

impl Area {
    /// Unlock order used by the surrounding application.
    pub const ALL: [Area; 3] = [Area::Arithmetic, Area::Statistics, Area::Algebra];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::Statistics => "statistics",
            Self::Algebra => "algebra",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "arithmetic" => Some(Self::Arithmetic),
            "statistics" => Some(Self::Statistics),
            "algebra" => Some(Self::Algebra),
            _ => None,
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Competence identifiers ====================

/// Transversal competence a procedural slot propagates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalSlot {
    Calculation,
    ProblemSolving,
}

/// Which competence of an area an interaction targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompetenceId {
    CalculationSpecific,
    ProblemSolvingSpecific,
    Conceptual(String),
}

impl CompetenceId {
    pub const CALCULATION_SPECIFIC: &'static str = "calculation_specific";
    pub const PROBLEM_SOLVING_SPECIFIC: &'static str = "problem_solving_specific";

    pub fn parse(s: &str) -> Self {
        match s {
            Self::CALCULATION_SPECIFIC => Self::CalculationSpecific,
            Self::PROBLEM_SOLVING_SPECIFIC => Self::ProblemSolvingSpecific,
            other => Self::Conceptual(other.to_string()),
        }
    }

    pub fn conceptual(concept_id: impl Into<String>) -> Self {
        Self::Conceptual(concept_id.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CalculationSpecific => Self::CALCULATION_SPECIFIC,
            Self::ProblemSolvingSpecific => Self::PROBLEM_SOLVING_SPECIFIC,
            Self::Conceptual(id) => id,
        }
    }

    pub fn is_procedural(&self) -> bool {
        !matches!(self, Self::Conceptual(_))
    }

    pub fn global_slot(&self) -> Option<GlobalSlot> {
        match self {
            Self::CalculationSpecific => Some(GlobalSlot::Calculation),
            Self::ProblemSolvingSpecific => Some(GlobalSlot::ProblemSolving),
            Self::Conceptual(_) => None,
        }
    }
}

impl From<String> for CompetenceId {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<CompetenceId> for String {
    fn from(value: CompetenceId) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CompetenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Competence ====================

/// Learner state for one skill or concept. All scores are in `[0, 1]`.
///
/// The medal is not stored: [`Competence::medal`] derives it from the
/// current performance/stability, and serialization writes the derived tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CompetenceRecord", into = "CompetenceRecord")]
pub struct Competence {
    /// Mastery estimate
    pub performance: f64,
    /// Resistance to forgetting
    pub stability: f64,
    /// Integrity score of the evidence behind the last update
    pub reliability: f64,
    pub retrieval_strength: f64,
    pub last_retrieval_score: Option<f64>,
    pub attempts: u32,
    /// Milliseconds since epoch, 0 when never reviewed
    pub last_reviewed: i64,
}

impl Default for Competence {
    fn default() -> Self {
        Self {
            performance: 0.0,
            stability: 0.0,
            reliability: 1.0,
            retrieval_strength: 0.0,
            last_retrieval_score: None,
            attempts: 0,
            last_reviewed: 0,
        }
    }
}

/// Persisted shape. `medal` is output only; a stored tier is ignored on load.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CompetenceRecord {
    performance: f64,
    stability: f64,
    #[serde(skip_deserializing)]
    medal: Medal,
    reliability: f64,
    retrieval_strength: f64,
    last_retrieval_score: Option<f64>,
    attempts: u32,
    last_reviewed: i64,
}

impl Default for CompetenceRecord {
    fn default() -> Self {
        Competence::default().into()
    }
}

impl From<CompetenceRecord> for Competence {
    fn from(record: CompetenceRecord) -> Self {
        Self {
            performance: clamp_unit(record.performance),
            stability: clamp_unit(record.stability),
            reliability: clamp_unit(record.reliability),
            retrieval_strength: clamp_unit(record.retrieval_strength),
            last_retrieval_score: record.last_retrieval_score.map(clamp_unit),
            attempts: record.attempts,
            last_reviewed: record.last_reviewed,
        }
    }
}

impl From<Competence> for CompetenceRecord {
    fn from(competence: Competence) -> Self {
        Self {
            medal: competence.medal(),
            performance: competence.performance,
            stability: competence.stability,
            reliability: competence.reliability,
            retrieval_strength: competence.retrieval_strength,
            last_retrieval_score: competence.last_retrieval_score,
            attempts: competence.attempts,
            last_reviewed: competence.last_reviewed,
        }
    }
}

impl Competence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(performance: f64, stability: f64) -> Self {
        let mut competence = Self::default();
        competence.set_state(performance, stability);
        competence
    }

    /// Tier for the current performance/stability.
    pub fn medal(&self) -> Medal {
        Medal::derive(self.performance, self.stability)
    }

    /// Clamp and store performance/stability.
    pub fn set_state(&mut self, performance: f64, stability: f64) {
        self.performance = clamp_unit(performance);
        self.stability = clamp_unit(stability);
    }
}

// ==================== Areas ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaCompetences {
    pub calculation_specific: Competence,
    pub problem_solving_specific: Competence,
    /// Created lazily on first reference
    pub conceptual: BTreeMap<String, Competence>,
}

impl AreaCompetences {
    pub fn get(&self, id: &CompetenceId) -> Option<&Competence> {
        match id {
            CompetenceId::CalculationSpecific => Some(&self.calculation_specific),
            CompetenceId::ProblemSolvingSpecific => Some(&self.problem_solving_specific),
            CompetenceId::Conceptual(concept_id) => self.conceptual.get(concept_id),
        }
    }

    /// Resolve a competence, creating a zeroed conceptual entry if missing.
    pub fn get_or_insert(&mut self, id: &CompetenceId) -> &mut Competence {
        match id {
            CompetenceId::CalculationSpecific => &mut self.calculation_specific,
            CompetenceId::ProblemSolvingSpecific => &mut self.problem_solving_specific,
            CompetenceId::Conceptual(concept_id) => {
                self.conceptual.entry(concept_id.clone()).or_default()
            }
        }
    }

    /// Both procedural slots at SILVER+ and at least one conceptual at SILVER+.
    pub fn is_mastered(&self) -> bool {
        self.calculation_specific.medal().is_solid()
            && self.problem_solving_specific.medal().is_solid()
            && self.conceptual.values().any(|c| c.medal().is_solid())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathArea {
    pub mastery: bool,
    pub competences: AreaCompetences,
}

impl MathArea {
    pub fn refresh_mastery(&mut self) -> bool {
        self.mastery = self.competences.is_mastered();
        self.mastery
    }
}

// ==================== Global metrics ====================

/// Cross-area transversal competences plus running statistics.
///
/// Scalar scores are clamped to `[0, 1]` on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "GlobalMetricsRecord")]
pub struct GlobalMetrics {
    /// EMA of interaction integrity scores
    pub reliability: f64,
    pub stability: f64,
    pub attempts: u64,
    pub last_evocation_timestamp: Option<i64>,
    pub exercises_since_last_evocation: u32,
    pub last_evocation_score: Option<f64>,
    #[serde(rename = "calculation_global")]
    pub calculation_global: Competence,
    #[serde(rename = "problem_solving_global")]
    pub problem_solving_global: Competence,
}

impl Default for GlobalMetrics {
    fn default() -> Self {
        Self {
            reliability: 1.0,
            stability: 0.0,
            attempts: 0,
            last_evocation_timestamp: None,
            exercises_since_last_evocation: 0,
            last_evocation_score: None,
            calculation_global: Competence::default(),
            problem_solving_global: Competence::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GlobalMetricsRecord {
    reliability: f64,
    stability: f64,
    attempts: u64,
    last_evocation_timestamp: Option<i64>,
    exercises_since_last_evocation: u32,
    last_evocation_score: Option<f64>,
    #[serde(rename = "calculation_global")]
    calculation_global: Competence,
    #[serde(rename = "problem_solving_global")]
    problem_solving_global: Competence,
}

impl Default for GlobalMetricsRecord {
    fn default() -> Self {
        let zero = GlobalMetrics::default();
        Self {
            reliability: zero.reliability,
            stability: zero.stability,
            attempts: zero.attempts,
            last_evocation_timestamp: zero.last_evocation_timestamp,
            exercises_since_last_evocation: zero.exercises_since_last_evocation,
            last_evocation_score: zero.last_evocation_score,
            calculation_global: zero.calculation_global,
            problem_solving_global: zero.problem_solving_global,
        }
    }
}

impl From<GlobalMetricsRecord> for GlobalMetrics {
    fn from(record: GlobalMetricsRecord) -> Self {
        Self {
            reliability: clamp_unit(record.reliability),
            stability: clamp_unit(record.stability),
            attempts: record.attempts,
            last_evocation_timestamp: record.last_evocation_timestamp,
            exercises_since_last_evocation: record.exercises_since_last_evocation,
            last_evocation_score: record.last_evocation_score.map(clamp_unit),
            calculation_global: record.calculation_global,
            problem_solving_global: record.problem_solving_global,
        }
    }
}

impl GlobalMetrics {
    pub fn slot(&self, slot: GlobalSlot) -> &Competence {
        match slot {
            GlobalSlot::Calculation => &self.calculation_global,
            GlobalSlot::ProblemSolving => &self.problem_solving_global,
        }
    }

    pub fn slot_mut(&mut self, slot: GlobalSlot) -> &mut Competence {
        match slot {
            GlobalSlot::Calculation => &mut self.calculation_global,
            GlobalSlot::ProblemSolving => &mut self.problem_solving_global,
        }
    }
}

// ==================== Profile ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub preferred_language: String,
    pub language_level: LanguageLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educational_level: Option<String>,
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self {
            name: None,
            preferred_language: "ca".to_string(),
            language_level: LanguageLevel::Medium,
            educational_level: None,
        }
    }
}

// ==================== Student model ====================

/// Root aggregate. Callers own persistence; the engine only transforms it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentModel {
    pub id: String,
    pub profile: StudentProfile,
    pub global: GlobalMetrics,
    pub areas: BTreeMap<Area, MathArea>,
}

impl Default for StudentModel {
    fn default() -> Self {
        Self {
            id: "anon".to_string(),
            profile: StudentProfile::default(),
            global: GlobalMetrics::default(),
            areas: BTreeMap::new(),
        }
    }
}

impl StudentModel {
    /// Fresh learner: every area zeroed, evocation clock started at `now_ms`.
    pub fn new(id: impl Into<String>, now_ms: i64) -> Self {
        let areas = Area::ALL
            .iter()
            .map(|area| (*area, MathArea::default()))
            .collect();

        Self {
            id: id.into(),
            profile: StudentProfile::default(),
            global: GlobalMetrics {
                last_evocation_timestamp: Some(now_ms),
                ..GlobalMetrics::default()
            },
            areas,
        }
    }

    pub fn area(&self, area: Area) -> Option<&MathArea> {
        self.areas.get(&area)
    }

    /// Area entry, created zeroed when an older record lacks it.
    pub fn area_mut(&mut self, area: Area) -> &mut MathArea {
        self.areas.entry(area).or_default()
    }

    pub fn competence(&self, area: Area, id: &CompetenceId) -> Option<&Competence> {
        self.area(area).and_then(|a| a.competences.get(id))
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
