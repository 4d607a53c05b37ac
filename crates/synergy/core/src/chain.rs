//! Capability chains - graph descriptions of module combinations.
//!
//! A chain says "this rule needs modules X then Y then Z installed together".
//! It carries no runtime behavior: the rule builder flattens it into the
//! required-module set, and hosts may use [`CapabilityChain::is_complete`] or
//! [`CapabilityChain::edges`] for validation and visualization.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{EngineError, ErrorSeverity};
use crate::snapshot::normalize_module_id;

/// Errors raised while building a [`CapabilityChain`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("capability chain has no root node")]
    NoRoot,
}

impl EngineError for ChainError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoRoot => "CHAIN_NO_ROOT",
        }
    }
}

/// Read-only graph of capability ids.
///
/// Supports a single linear chain (`A → B → C`) as well as branching graphs
/// with several roots. Cycles are tolerated; traversal visits each id once.
/// Edges may be declared before they are attached to a root: such nodes are
/// part of the chain but do not count towards completeness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityChain {
    roots: Vec<String>,
    successors: HashMap<String, Vec<String>>,
    /// Every id touched, reachable ones first in breadth-first order.
    ids: Vec<String>,
    /// Every id reachable from the roots, in breadth-first discovery order.
    reachable: Vec<String>,
}

impl CapabilityChain {
    /// Starts an empty chain; at least one root is required to build.
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// Convenience for a straight chain: the first id is the root and each
    /// id links to the next.
    pub fn linear<I, S>(ids: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ChainBuilder::default().linear(ids).build()
    }

    /// Root ids in insertion order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Successors of `id`, empty if the id has none or is unknown.
    pub fn successors(&self, id: &str) -> &[String] {
        self.successors
            .get(&normalize_module_id(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Flattened, de-duplicated ids of every node the chain touches,
    /// reachable or not.
    pub fn all_ids(&self) -> &[String] {
        &self.ids
    }

    /// Ids reachable from some root.
    pub fn reachable_ids(&self) -> &[String] {
        &self.reachable
    }

    /// Returns true iff every id reachable from every root is installed.
    ///
    /// `installed` must hold normalized (upper-case) ids, as produced by
    /// [`crate::EventSnapshot::active_module_ids`].
    pub fn is_complete(&self, installed: &HashSet<String>) -> bool {
        self.reachable.iter().all(|id| installed.contains(id))
    }

    /// All `(from, to)` links, for visualization.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.ids.iter().flat_map(move |from| {
            self.successors
                .get(from)
                .into_iter()
                .flatten()
                .map(move |to| (from.as_str(), to.as_str()))
        })
    }

    /// Number of distinct ids touched.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false for a built chain, which has at least one root.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Builder for [`CapabilityChain`].
#[derive(Clone, Debug, Default)]
pub struct ChainBuilder {
    roots: Vec<String>,
    successors: HashMap<String, Vec<String>>,
    nodes: Vec<String>,
}

impl ChainBuilder {
    /// Adds a root node. Adding the same root twice is a no-op.
    pub fn add_root(mut self, id: impl AsRef<str>) -> Self {
        let id = normalize_module_id(id.as_ref());
        self.touch(&id);
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        self
    }

    /// Adds a directed link `from → to`, creating either node if needed.
    pub fn add_edge(mut self, from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        let from = normalize_module_id(from.as_ref());
        let to = normalize_module_id(to.as_ref());
        self.touch(&from);
        self.touch(&to);
        let next = self.successors.entry(from).or_default();
        if !next.contains(&to) {
            next.push(to);
        }
        self
    }

    /// Appends a straight chain. The first id becomes a root.
    pub fn linear<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = ids
            .into_iter()
            .map(|id| normalize_module_id(id.as_ref()))
            .collect();
        if let Some(first) = ids.first() {
            self = self.add_root(first);
        }
        for pair in ids.windows(2) {
            self = self.add_edge(&pair[0], &pair[1]);
        }
        self
    }

    /// Freezes the graph. Fails only if no root was added.
    pub fn build(self) -> Result<CapabilityChain, ChainError> {
        if self.roots.is_empty() {
            return Err(ChainError::NoRoot);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut reachable = Vec::with_capacity(self.nodes.len());
        let mut queue: VecDeque<&str> = self.roots.iter().map(String::as_str).collect();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            reachable.push(id.to_owned());
            if let Some(next) = self.successors.get(id) {
                queue.extend(next.iter().map(String::as_str));
            }
        }

        let detached = self
            .nodes
            .iter()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned();
        let ids = reachable.iter().cloned().chain(detached).collect();

        Ok(CapabilityChain {
            roots: self.roots,
            successors: self.successors,
            ids,
            reachable,
        })
    }

    fn touch(&mut self, id: &str) {
        if !self.nodes.iter().any(|n| n == id) {
            self.nodes.push(id.to_owned());
        }
    }
}
