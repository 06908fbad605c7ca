//! Concept Graph
//!
//! Static catalog of domain concepts: difficulty plus prerequisite and
//! related-concept edges. The prerequisite relation restricted to present
//! nodes is expected to be acyclic; that is an authoring invariant checked by
//! [`ConceptGraph::find_cycle`] in tests, never at runtime.

pub mod catalog;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::Area;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptDomain {
    Arithmetic,
    Statistics,
    Algebra,
    Geometry,
}

impl ConceptDomain {
    /// Student-model area this domain's competences live in.
    pub fn area(&self) -> Option<Area> {
        match self {
            Self::Arithmetic => Some(Area::Arithmetic),
            Self::Statistics => Some(Area::Statistics),
            Self::Algebra => Some(Area::Algebra),
            Self::Geometry => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptNode {
    pub id: String,
    pub domain: ConceptDomain,
    /// 1 (basic) to 5 (advanced)
    pub difficulty: u8,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub related_concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ConceptNode {
    pub fn new(id: impl Into<String>, domain: ConceptDomain, difficulty: u8) -> Self {
        Self {
            id: id.into(),
            domain,
            difficulty: difficulty.clamp(1, 5),
            prerequisites: Vec::new(),
            related_concepts: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_prerequisites(mut self, prerequisites: &[&str]) -> Self {
        self.prerequisites = prerequisites.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_related(mut self, related: &[&str]) -> Self {
        self.related_concepts = related.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn requires(&self, concept_id: &str) -> bool {
        self.prerequisites.iter().any(|p| p == concept_id)
    }
}

/// Concept id → node. Iteration order is by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptGraph {
    nodes: BTreeMap<String, ConceptNode>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = ConceptNode>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert(node);
        }
        graph
    }

    pub fn insert(&mut self, node: ConceptNode) -> Option<ConceptNode> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Union of two graphs; nodes from `other` win on id collision.
    pub fn merge(mut self, other: ConceptGraph) -> Self {
        self.nodes.extend(other.nodes);
        self
    }

    pub fn node(&self, concept_id: &str) -> Option<&ConceptNode> {
        self.nodes.get(concept_id)
    }

    pub fn contains(&self, concept_id: &str) -> bool {
        self.nodes.contains_key(concept_id)
    }

    pub fn prerequisites(&self, concept_id: &str) -> &[String] {
        self.node(concept_id)
            .map(|n| n.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    pub fn related(&self, concept_id: &str) -> &[String] {
        self.node(concept_id)
            .map(|n| n.related_concepts.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes listing `concept_id` as a prerequisite, in id order.
    pub fn dependents(&self, concept_id: &str) -> Vec<&ConceptNode> {
        self.nodes.values().filter(|n| n.requires(concept_id)).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConceptNode> {
        self.nodes.values()
    }

    /// First prerequisite cycle among present nodes, as the id path that
    /// closes it. Edges to absent nodes are ignored.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut done: HashSet<&str> = HashSet::new();

        for start in self.nodes.keys() {
            if done.contains(start.as_str()) {
                continue;
            }
            let mut path: Vec<&str> = Vec::new();
            if let Some(cycle) = self.visit(start, &mut path, &mut done) {
                return Some(cycle);
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|p| *p == id) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            return Some(cycle);
        }
        if done.contains(id) {
            return None;
        }
        let node = self.nodes.get(id)?;

        path.push(id);
        for prereq in &node.prerequisites {
            if !self.nodes.contains_key(prereq) {
                continue;
            }
            if let Some(cycle) = self.visit(prereq, path, done) {
                return Some(cycle);
            }
        }
        path.pop();
        done.insert(id);
        None
    }
}
