use serde::{Deserialize, Serialize};

/// One simulated interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationLog {
    pub t: usize,
    pub concept_id: String,
    pub difficulty: u8,
    pub correct: bool,
    pub response_time: f64,
    pub integrity_score: f64,
    /// Model estimate after the update
    pub mastery: f64,
    pub real_ability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSummary {
    pub final_mastery: f64,
    pub final_real_ability: f64,
    pub mae: f64,
    pub inflation_index: f64,
    pub mean_integrity_score: f64,
}

impl ConditionSummary {
    pub fn from_logs(logs: &[SimulationLog]) -> Self {
        let Some(last) = logs.last() else {
            return Self::default();
        };
        Self {
            final_mastery: last.mastery,
            final_real_ability: last.real_ability,
            mae: mean_absolute_error(logs),
            inflation_index: inflation_index(logs),
            mean_integrity_score: logs.iter().map(|l| l.integrity_score).sum::<f64>()
                / logs.len() as f64,
        }
    }
}

pub fn mean_absolute_error(logs: &[SimulationLog]) -> f64 {
    if logs.is_empty() {
        return 0.0;
    }
    logs.iter()
        .map(|l| (l.mastery - l.real_ability).abs())
        .sum::<f64>()
        / logs.len() as f64
}

/// Final overestimate spread over the run length.
pub fn inflation_index(logs: &[SimulationLog]) -> f64 {
    match logs.last() {
        Some(last) => (last.mastery - last.real_ability) / logs.len() as f64,
        None => 0.0,
    }
}

/// Mean absolute difficulty difference between two runs, step by step over
/// the shorter one.
pub fn decision_drift(a: &[SimulationLog], b: &[SimulationLog]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (f64::from(x.difficulty) - f64::from(y.difficulty)).abs())
        .sum::<f64>()
        / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(t: usize, difficulty: u8, mastery: f64, real_ability: f64) -> SimulationLog {
        SimulationLog {
            t,
            concept_id: "fractions".to_string(),
            difficulty,
            correct: true,
            response_time: 5.0,
            integrity_score: 0.5,
            mastery,
            real_ability,
        }
    }

    #[test]
    fn test_empty_logs() {
        assert_eq!(mean_absolute_error(&[]), 0.0);
        assert_eq!(inflation_index(&[]), 0.0);
        assert_eq!(decision_drift(&[], &[log(0, 1, 0.0, 0.0)]), 0.0);
        assert_eq!(ConditionSummary::from_logs(&[]), ConditionSummary::default());
    }

    #[test]
    fn test_summary_metrics() {
        let logs = vec![log(0, 1, 0.1, 0.3), log(1, 2, 0.9, 0.5)];
        let summary = ConditionSummary::from_logs(&logs);

        assert!((summary.mae - 0.3).abs() < 1e-9);
        assert!((summary.inflation_index - 0.2).abs() < 1e-9);
        assert_eq!(summary.final_mastery, 0.9);
        assert_eq!(summary.mean_integrity_score, 0.5);
    }

    #[test]
    fn test_drift_uses_shorter_run() {
        let a = vec![log(0, 1, 0.0, 0.0), log(1, 3, 0.0, 0.0), log(2, 5, 0.0, 0.0)];
        let b = vec![log(0, 2, 0.0, 0.0), log(1, 3, 0.0, 0.0)];
        assert!((decision_drift(&a, &b) - 0.5).abs() < 1e-9);
    }
}
