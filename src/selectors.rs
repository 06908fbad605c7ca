//! Read-only queries over a [`StudentModel`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Area, Competence, CompetenceId, StudentModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaffoldingLevel {
    /// Step-by-step decomposition with worked examples
    High,
    /// General hints without the solution
    Medium,
    /// Socratic questions only
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaBadge {
    Mastered,
    NearlyMastered,
    InProgress,
    Accessible,
}

/// Locate a competence by id, restricted to `area` when given, otherwise
/// searching areas in unlock order.
pub fn find_competence<'a>(
    model: &'a StudentModel,
    id: &CompetenceId,
    area: Option<Area>,
) -> Option<&'a Competence> {
    match area {
        Some(area) => model.competence(area, id),
        None => model
            .areas
            .values()
            .find_map(|math_area| math_area.competences.get(id)),
    }
}

/// Concept id → performance for every conceptual competence. A concept
/// present in several areas keeps its first value in unlock order.
pub fn mastery_map(model: &StudentModel) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    for math_area in model.areas.values() {
        for (concept_id, competence) in &math_area.competences.conceptual {
            map.entry(concept_id.clone())
                .or_insert(competence.performance);
        }
    }
    map
}

/// Performance of a concept, 0 when the learner has never met it.
pub fn concept_mastery(model: &StudentModel, concept_id: &str) -> f64 {
    model
        .areas
        .values()
        .find_map(|a| a.competences.conceptual.get(concept_id))
        .map(|c| c.performance)
        .unwrap_or(0.0)
}

pub fn unlocked_areas(model: &StudentModel) -> Vec<Area> {
    let mastered = |area: Area| model.area(area).map(|a| a.mastery).unwrap_or(false);

    let mut unlocked = vec![Area::Arithmetic];
    if mastered(Area::Arithmetic) {
        unlocked.push(Area::Statistics);
    }
    if mastered(Area::Statistics) {
        unlocked.push(Area::Algebra);
    }
    unlocked
}

pub fn scaffolding_level(model: &StudentModel, area: Area, id: &CompetenceId) -> ScaffoldingLevel {
    let Some(math_area) = model.area(area) else {
        return ScaffoldingLevel::High;
    };
    if math_area.mastery {
        return ScaffoldingLevel::Low;
    }

    let has_medal = math_area
        .competences
        .get(id)
        .map(|c| c.medal().is_awarded())
        .unwrap_or(false);
    if has_medal {
        ScaffoldingLevel::Medium
    } else {
        ScaffoldingLevel::High
    }
}

pub fn area_badge(model: &StudentModel, area: Area) -> AreaBadge {
    let Some(math_area) = model.area(area) else {
        return AreaBadge::Accessible;
    };
    if math_area.mastery {
        return AreaBadge::Mastered;
    }

    let competences = &math_area.competences;
    let count = [
        competences.calculation_specific.medal().is_awarded(),
        competences.problem_solving_specific.medal().is_awarded(),
        competences.conceptual.values().any(|c| c.medal().is_awarded()),
    ]
    .into_iter()
    .filter(|awarded| *awarded)
    .count();

    match count {
        0 => AreaBadge::Accessible,
        1 => AreaBadge::InProgress,
        _ => AreaBadge::NearlyMastered,
    }
}
