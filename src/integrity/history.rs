//! Bounded per-concept outcome history.
//!
//! One arena of fixed-capacity rings, indexed by concept id. Appending to a
//! full ring overwrites the oldest entry in O(1); memory per concept never
//! exceeds [`HISTORY_CAPACITY`] outcomes.

use std::collections::HashMap;

pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub correct: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
struct OutcomeRing {
    slots: [Outcome; HISTORY_CAPACITY],
    /// Next write position
    head: usize,
    len: usize,
}

impl OutcomeRing {
    fn new() -> Self {
        Self {
            slots: [Outcome::default(); HISTORY_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, outcome: Outcome) {
        self.slots[self.head] = outcome;
        self.head = (self.head + 1) % HISTORY_CAPACITY;
        self.len = (self.len + 1).min(HISTORY_CAPACITY);
    }

    /// Newest first.
    fn iter_recent(&self) -> impl Iterator<Item = &Outcome> + '_ {
        (1..=self.len).map(move |back| {
            &self.slots[(self.head + HISTORY_CAPACITY - back) % HISTORY_CAPACITY]
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeHistory {
    index: HashMap<String, usize>,
    rings: Vec<OutcomeRing>,
}

impl OutcomeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, concept_id: &str, outcome: Outcome) {
        let slot = match self.index.get(concept_id) {
            Some(slot) => *slot,
            None => {
                self.rings.push(OutcomeRing::new());
                let slot = self.rings.len() - 1;
                self.index.insert(concept_id.to_string(), slot);
                slot
            }
        };
        self.rings[slot].push(outcome);
    }

    /// Consecutive correct outcomes ending at the most recent one.
    pub fn trailing_correct(&self, concept_id: &str) -> usize {
        self.ring(concept_id)
            .map(|ring| ring.iter_recent().take_while(|o| o.correct).count())
            .unwrap_or(0)
    }

    pub fn len(&self, concept_id: &str) -> usize {
        self.ring(concept_id).map(|ring| ring.len).unwrap_or(0)
    }

    /// Stored outcomes for a concept, oldest first.
    pub fn outcomes(&self, concept_id: &str) -> Vec<Outcome> {
        let mut outcomes: Vec<Outcome> = self
            .ring(concept_id)
            .map(|ring| ring.iter_recent().copied().collect())
            .unwrap_or_default();
        outcomes.reverse();
        outcomes
    }

    pub fn concept_count(&self) -> usize {
        self.index.len()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.rings.clear();
    }

    fn ring(&self, concept_id: &str) -> Option<&OutcomeRing> {
        self.index.get(concept_id).map(|slot| &self.rings[*slot])
    }
}
