//! Interaction Policy
//!
//! Per-context lookup table of mastery-update weights and decision
//! thresholds. Constructed explicitly and handed to the components that need
//! it; there is no process-wide instance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionContext {
    /// Standard practice with scaffolding
    #[default]
    Practice,
    /// Unsupported recall (testing effect)
    Retrieval,
    /// Intensive reinforcement of a weak concept
    Remedial,
    /// Formal evaluation
    Assessment,
}

impl InteractionContext {
    pub const ALL: [InteractionContext; 4] = [
        InteractionContext::Practice,
        InteractionContext::Retrieval,
        InteractionContext::Remedial,
        InteractionContext::Assessment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Retrieval => "retrieval",
            Self::Remedial => "remedial",
            Self::Assessment => "assessment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "practice" => Some(Self::Practice),
            "retrieval" => Some(Self::Retrieval),
            "remedial" => Some(Self::Remedial),
            "assessment" => Some(Self::Assessment),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Practice => 0,
            Self::Retrieval => 1,
            Self::Remedial => 2,
            Self::Assessment => 3,
        }
    }
}

impl fmt::Display for InteractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionThresholds {
    /// Remediate when performance is below this
    pub scaffold_threshold: f64,
    /// Advance or reduce support when performance is above this
    pub reduce_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionWeights {
    /// Multiplier on the mastery delta
    pub mastery_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextPolicy {
    pub weights: InteractionWeights,
    pub thresholds: InteractionThresholds,
}

impl ContextPolicy {
    const fn new(mastery_weight: f64, scaffold_threshold: f64, reduce_threshold: f64) -> Self {
        Self {
            weights: InteractionWeights { mastery_weight },
            thresholds: InteractionThresholds {
                scaffold_threshold,
                reduce_threshold,
            },
        }
    }

    fn validate(&self, context: InteractionContext) -> Result<()> {
        let InteractionThresholds {
            scaffold_threshold,
            reduce_threshold,
        } = self.thresholds;
        let weight = self.weights.mastery_weight;

        if !weight.is_finite() || weight < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "{context}: mastery weight must be a non-negative number, got {weight}"
            )));
        }
        if !(0.0..=1.0).contains(&scaffold_threshold) || !(0.0..=1.0).contains(&reduce_threshold)
        {
            return Err(EngineError::InvalidConfig(format!(
                "{context}: thresholds must lie in [0, 1], got {scaffold_threshold}/{reduce_threshold}"
            )));
        }
        if scaffold_threshold > reduce_threshold {
            return Err(EngineError::InvalidConfig(format!(
                "{context}: scaffold threshold {scaffold_threshold} exceeds reduce threshold {reduce_threshold}"
            )));
        }
        Ok(())
    }
}

/// Partial update applied by [`InteractionPolicy::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyOverride {
    pub mastery_weight: Option<f64>,
    pub scaffold_threshold: Option<f64>,
    pub reduce_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionPolicy {
    practice: ContextPolicy,
    retrieval: ContextPolicy,
    remedial: ContextPolicy,
    assessment: ContextPolicy,
}

impl Default for InteractionPolicy {
    fn default() -> Self {
        Self {
            practice: ContextPolicy::new(1.0, 0.5, 0.8),
            // low immediate impact, cautious thresholds
            retrieval: ContextPolicy::new(0.3, 0.4, 0.85),
            // amplified for fast recovery
            remedial: ContextPolicy::new(1.2, 0.6, 0.75),
            assessment: ContextPolicy::new(0.8, 0.5, 0.85),
        }
    }
}

impl InteractionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, context: InteractionContext) -> ContextPolicy {
        self.entries()[context.index()]
    }

    pub fn thresholds(&self, context: InteractionContext) -> InteractionThresholds {
        self.get(context).thresholds
    }

    pub fn weights(&self, context: InteractionContext) -> InteractionWeights {
        self.get(context).weights
    }

    /// Apply a partial override to one context. The table is left untouched
    /// when the result would be inconsistent.
    pub fn update(&mut self, context: InteractionContext, patch: PolicyOverride) -> Result<()> {
        let mut next = self.get(context);
        if let Some(weight) = patch.mastery_weight {
            next.weights.mastery_weight = weight;
        }
        if let Some(threshold) = patch.scaffold_threshold {
            next.thresholds.scaffold_threshold = threshold;
        }
        if let Some(threshold) = patch.reduce_threshold {
            next.thresholds.reduce_threshold = threshold;
        }
        next.validate(context)?;

        *self.slot_mut(context) = next;
        tracing::info!(
            context = %context,
            mastery_weight = next.weights.mastery_weight,
            scaffold_threshold = next.thresholds.scaffold_threshold,
            reduce_threshold = next.thresholds.reduce_threshold,
            "interaction policy updated"
        );
        Ok(())
    }

    /// Restore the default table.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn validate(&self) -> Result<()> {
        InteractionContext::ALL
            .iter()
            .try_for_each(|context| self.get(*context).validate(*context))
    }

    fn entries(&self) -> [ContextPolicy; 4] {
        [self.practice, self.retrieval, self.remedial, self.assessment]
    }

    fn slot_mut(&mut self, context: InteractionContext) -> &mut ContextPolicy {
        match context {
            InteractionContext::Practice => &mut self.practice,
            InteractionContext::Retrieval => &mut self.retrieval,
            InteractionContext::Remedial => &mut self.remedial,
            InteractionContext::Assessment => &mut self.assessment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let policy = InteractionPolicy::default();

        let practice = policy.get(InteractionContext::Practice);
        assert_eq!(practice.weights.mastery_weight, 1.0);
        assert_eq!(practice.thresholds.scaffold_threshold, 0.5);
        assert_eq!(practice.thresholds.reduce_threshold, 0.8);

        assert_eq!(policy.weights(InteractionContext::Retrieval).mastery_weight, 0.3);
        assert_eq!(policy.thresholds(InteractionContext::Retrieval).scaffold_threshold, 0.4);
        assert_eq!(policy.thresholds(InteractionContext::Retrieval).reduce_threshold, 0.85);

        assert_eq!(policy.weights(InteractionContext::Remedial).mastery_weight, 1.2);
        assert_eq!(policy.thresholds(InteractionContext::Remedial).scaffold_threshold, 0.6);
        assert_eq!(policy.thresholds(InteractionContext::Remedial).reduce_threshold, 0.75);

        assert_eq!(policy.weights(InteractionContext::Assessment).mastery_weight, 0.8);
        assert_eq!(policy.thresholds(InteractionContext::Assessment).reduce_threshold, 0.85);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_update_and_reset() {
        let mut policy = InteractionPolicy::new();
        policy
            .update(
                InteractionContext::Practice,
                PolicyOverride {
                    mastery_weight: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(policy.weights(InteractionContext::Practice).mastery_weight, 0.5);
        // thresholds untouched by a weight-only patch
        assert_eq!(policy.thresholds(InteractionContext::Practice).scaffold_threshold, 0.5);

        policy.reset();
        assert_eq!(policy, InteractionPolicy::default());
    }

    #[test]
    fn test_inconsistent_override_is_rejected() {
        let mut policy = InteractionPolicy::new();
        let err = policy
            .update(
                InteractionContext::Remedial,
                PolicyOverride {
                    scaffold_threshold: Some(0.9),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert!(matches!(err, EngineError::InvalidConfig(_)));
        assert_eq!(policy, InteractionPolicy::default());
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let mut policy = InteractionPolicy::new();
        let result = policy.update(
            InteractionContext::Assessment,
            PolicyOverride {
                mastery_weight: Some(-1.0),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_context_parse() {
        for context in InteractionContext::ALL {
            assert_eq!(InteractionContext::parse(context.as_str()), Some(context));
        }
        assert_eq!(InteractionContext::parse("nope"), None);
    }
}
