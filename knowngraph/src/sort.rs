// Copyright 2019 Facebook, Inc.
//
// This software may be used and distributed according to the terms of the
// GNU General Public License version 2 or any later version.

//! # sort
//!
//! Orderings over the whole graph: plain topological order and the
//! merge-aware display order.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::errors::*;
use crate::graph::KnownGraph;
use crate::merge::{MergeEntry, MergeSequencer};
use crate::node::NodeIndex;

impl<K: Clone + Eq + Hash + Debug> KnownGraph<K> {
    /// Return all known (non-ghost) keys in topological order.
    ///
    /// Every parent occurs before all of its children; the order among
    /// unrelated nodes is unspecified. Ghosts release their children but
    /// are not part of the output.
    ///
    /// Fails with [`ErrorKind::Cycle`] if distance propagation left any
    /// node unfinished; no partial order is produced.
    pub fn topo_sort(&self) -> Result<Vec<K>> {
        let unfinished: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| node.gdfo.is_none())
            .map(|node| format!("{:?}", node.key))
            .collect();
        if !unfinished.is_empty() {
            return Err(ErrorKind::Cycle(unfinished).into());
        }

        let mut pending: Vec<NodeIndex> = self.tail_indexes();
        let mut seen_parents: Vec<usize> = vec![0; self.nodes.len()];
        let mut order: Vec<K> = Vec::with_capacity(self.nodes.len());
        while let Some(idx) = pending.pop() {
            let node = &self.nodes[idx];
            if node.parents.is_some() {
                order.push(node.key.clone());
            }
            for &child in &node.children {
                seen_parents[child] += 1;
                if seen_parents[child] == self.nodes[child].parent_count() {
                    pending.push(child);
                }
            }
        }
        Ok(order)
    }

    /// Merge-sorted history of `tip`, as laid out by `sequencer`.
    ///
    /// Hands the sequencer the parent map restricted to known nodes (ghost
    /// keys may still appear inside parent lists and are the sequencer's
    /// to ignore) and strips the sequence numbers from its output.
    ///
    /// Fails with [`ErrorKind::UnknownKey`] if `tip` is absent or a ghost.
    pub fn merge_sort<S>(&self, sequencer: &S, tip: &K) -> Result<Vec<MergeEntry<K>>>
    where
        S: MergeSequencer<K>,
    {
        let idx = self.resolve(tip)?;
        if self.nodes[idx].is_ghost() {
            return Err(ErrorKind::UnknownKey(format!("{:?}", tip)).into());
        }
        let mut parent_map = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if let Some(ref parents) = node.parents {
                let parent_keys: Vec<K> = parents
                    .iter()
                    .map(|&p| self.nodes[p].key.clone())
                    .collect();
                parent_map.insert(node.key.clone(), parent_keys);
            }
        }
        let sequenced = sequencer.sequence(parent_map, tip.clone())?;
        Ok(sequenced.into_iter().map(|record| record.entry).collect())
    }
}
