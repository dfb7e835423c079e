// Copyright 2019 Facebook, Inc.
//
// This software may be used and distributed according to the terms of the
// GNU General Public License version 2 or any later version.

//! # heads
//!
//! Finding the un-dominated tips among a set of candidate revisions.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::errors::*;
use crate::graph::KnownGraph;
use crate::node::NodeIndex;

/// Append-only memo table for `heads` answers.
///
/// The graph never changes once built, so entries stay valid forever and
/// are never invalidated. Reads take the shared lock; an insert happens at
/// most once per distinct candidate set. Hit/miss counters live outside the
/// lock.
pub(crate) struct HeadsCache<K> {
    enabled: bool,
    map: RwLock<HashMap<Vec<NodeIndex>, HashSet<K>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<K: Clone> HeadsCache<K> {
    pub(crate) fn new(enabled: bool) -> Self {
        HeadsCache {
            enabled,
            map: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    fn get(&self, key: &[NodeIndex]) -> Option<HashSet<K>> {
        if !self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        match self.map.read().get(key) {
            Some(heads) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(heads.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, key: Vec<NodeIndex>, heads: &HashSet<K>) {
        if self.enabled {
            self.map.write().insert(key, heads.clone());
        }
    }

    pub(crate) fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl<K: Clone + Eq + Hash + Debug> KnownGraph<K> {
    /// Return the heads from among `keys`.
    ///
    /// A key reachable through the ancestry of another candidate is not
    /// returned; all the others are. The walk is bounded by the smallest
    /// distance label among the candidates: a node at or below that bound
    /// cannot reach any candidate through parent edges, because distance
    /// only shrinks walking parent-ward.
    ///
    /// The result is an unordered set. Callers that need a stable order
    /// must impose one from their own candidate list.
    ///
    /// Fails with [`ErrorKind::UnknownKey`] if any key, the null-root
    /// sentinel included, is not in the graph.
    pub fn heads<I>(&self, keys: I) -> Result<HashSet<K>>
    where
        I: IntoIterator<Item = K>,
    {
        let mut candidates: HashSet<NodeIndex> = HashSet::new();
        for key in keys {
            candidates.insert(self.resolve(&key)?);
        }
        if let Some(ref null_key) = self.null_key {
            if let Some(&null_idx) = self.index.get(null_key) {
                // The null root is only a head when nothing else is there.
                if candidates.remove(&null_idx) && candidates.is_empty() {
                    let mut heads = HashSet::with_capacity(1);
                    heads.insert(null_key.clone());
                    return Ok(heads);
                }
            }
        }
        if candidates.len() < 2 {
            return Ok(candidates
                .into_iter()
                .map(|idx| self.nodes[idx].key.clone())
                .collect());
        }

        let mut cache_key: Vec<NodeIndex> = candidates.iter().cloned().collect();
        cache_key.sort_unstable();
        if let Some(heads) = self.cache.get(&cache_key) {
            return Ok(heads);
        }

        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut pending: Vec<NodeIndex> = Vec::new();
        let mut min_gdfo: Option<u64> = None;
        for &idx in &candidates {
            let node = &self.nodes[idx];
            if let Some(ref parents) = node.parents {
                pending.extend(parents.iter().cloned());
            }
            // A candidate without a settled distance (cycle member) simply
            // contributes no bound.
            if let Some(gdfo) = node.gdfo {
                min_gdfo = Some(match min_gdfo {
                    Some(min) => min.min(gdfo),
                    None => gdfo,
                });
            }
        }
        while let Some(idx) = pending.pop() {
            if !seen.insert(idx) {
                continue;
            }
            let node = &self.nodes[idx];
            if let (Some(gdfo), Some(min)) = (node.gdfo, min_gdfo) {
                if gdfo <= min {
                    // Marked seen, but nothing above the bound lies beyond.
                    continue;
                }
            }
            if let Some(ref parents) = node.parents {
                pending.extend(parents.iter().cloned());
            }
        }

        let heads: HashSet<K> = candidates
            .iter()
            .filter(|&&idx| !seen.contains(&idx))
            .map(|&idx| self.nodes[idx].key.clone())
            .collect();
        self.cache.insert(cache_key, &heads);
        Ok(heads)
    }
}
