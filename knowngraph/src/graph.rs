// Copyright 2019 Facebook, Inc.
//
// This software may be used and distributed according to the terms of the
// GNU General Public License version 2 or any later version.

//! # graph
//!
//! The ancestry graph over a fully loaded parent map. See [`KnownGraph`] for
//! the main structure.

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::hash::Hash;

use crate::errors::*;
use crate::heads::HeadsCache;
use crate::node::{Node, NodeIndex};

/// Options used to configure how a [`KnownGraph`] is built.
pub struct GraphOptions<K> {
    cache: bool,
    null_key: Option<K>,
}

impl<K: Clone + Eq + Hash + Debug> GraphOptions<K> {
    /// Creates a default set of options ready for configuration.
    ///
    /// The default values are:
    /// - Memoize `heads` results.
    /// - No null-root sentinel.
    pub fn new() -> Self {
        GraphOptions {
            cache: true,
            null_key: None,
        }
    }

    /// Set whether `heads` results are memoized. The graph never changes
    /// after construction, so cached answers stay valid forever; disabling
    /// only trades speed for memory.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Register the key that stands for "no revision" (the ancestor of an
    /// empty tree). `heads` treats it specially: it is only a head when it
    /// is the sole candidate.
    pub fn null_key(mut self, key: K) -> Self {
        self.null_key = Some(key);
        self
    }

    /// Build the graph from a complete parent map.
    ///
    /// Every key referenced as a parent but absent from the map becomes a
    /// ghost. Distance labels are propagated before the graph is returned,
    /// so construction is the only expensive step.
    pub fn build(self, parent_map: HashMap<K, Vec<K>>) -> KnownGraph<K> {
        let mut graph = KnownGraph {
            nodes: Vec::with_capacity(parent_map.len()),
            index: HashMap::with_capacity(parent_map.len()),
            null_key: self.null_key,
            cache: HeadsCache::new(self.cache),
        };
        for (key, parent_keys) in parent_map {
            graph.add_entry(key, parent_keys);
        }
        graph.propagate_gdfo();
        graph
    }
}

/// An ancestry graph whose parent relationships are all known up front.
///
/// Built once from a parent map and immutable afterwards (apart from the
/// internal `heads` memo table). Answers structural questions about the
/// graph: which candidates are un-merged tips ([`KnownGraph::heads`]), a
/// parents-first total order ([`KnownGraph::topo_sort`]), and a merge-aware
/// display order ([`KnownGraph::merge_sort`]).
///
/// Each node carries a "greatest distance from origin" label: tails and
/// ghosts sit at 1, every other node one above its furthest parent. Since a
/// parent's label is always strictly below its child's, the label bounds
/// ancestry walks without touching the whole graph.
pub struct KnownGraph<K> {
    pub(crate) nodes: Vec<Node<K>>,
    pub(crate) index: HashMap<K, NodeIndex>,
    pub(crate) null_key: Option<K>,
    pub(crate) cache: HeadsCache<K>,
}

impl<K: Clone + Eq + Hash + Debug> KnownGraph<K> {
    /// Build a graph from a parent map with default options.
    pub fn new(parent_map: HashMap<K, Vec<K>>) -> Self {
        GraphOptions::new().build(parent_map)
    }

    /// Number of nodes the graph knows about, ghosts included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// The parent keys of `key` in input order, or `None` if `key` is a
    /// ghost.
    pub fn parent_keys(&self, key: &K) -> Result<Option<Vec<&K>>> {
        let node = self.node(key)?;
        Ok(node
            .parents
            .as_ref()
            .map(|parents| parents.iter().map(|&p| &self.nodes[p].key).collect()))
    }

    /// The keys that list `key` as a parent. Unordered.
    pub fn child_keys(&self, key: &K) -> Result<Vec<&K>> {
        let node = self.node(key)?;
        Ok(node
            .children
            .iter()
            .map(|&c| &self.nodes[c].key)
            .collect())
    }

    /// The greatest distance from origin of `key`, or `None` if the node is
    /// caught in a cycle and the distance never settled.
    pub fn gdfo(&self, key: &K) -> Result<Option<u64>> {
        Ok(self.node(key)?.gdfo)
    }

    pub fn is_ghost(&self, key: &K) -> Result<bool> {
        Ok(self.node(key)?.is_ghost())
    }

    /// Keys of the real nodes with an explicitly empty parent list. Ghosts
    /// also act as tails during propagation but are not reported here, since
    /// nothing is known about them.
    pub fn tails(&self) -> Vec<&K> {
        self.nodes
            .iter()
            .filter(|node| node.is_tail() && !node.is_ghost())
            .map(|node| &node.key)
            .collect()
    }

    /// Hits and misses of the `heads` memo table so far.
    pub fn cache_stats(&self) -> (usize, usize) {
        self.cache.stats()
    }

    pub(crate) fn resolve(&self, key: &K) -> Result<NodeIndex> {
        match self.index.get(key) {
            Some(&idx) => Ok(idx),
            None => Err(ErrorKind::UnknownKey(format!("{:?}", key)).into()),
        }
    }

    pub(crate) fn node(&self, key: &K) -> Result<&Node<K>> {
        self.resolve(key).map(move |idx| &self.nodes[idx])
    }

    /// Indexes of every propagation seed: explicit roots and ghosts.
    pub(crate) fn tail_indexes(&self) -> Vec<NodeIndex> {
        (0..self.nodes.len())
            .filter(|&idx| self.nodes[idx].is_tail())
            .collect()
    }

    fn intern(&mut self, key: K) -> NodeIndex {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(key.clone(), idx);
        self.nodes.push(Node::ghost(key));
        idx
    }

    fn add_entry(&mut self, key: K, parent_keys: Vec<K>) {
        let idx = self.intern(key);
        let mut parents = Vec::with_capacity(parent_keys.len());
        for parent_key in parent_keys {
            let parent_idx = self.intern(parent_key);
            self.nodes[parent_idx].children.push(idx);
            parents.push(parent_idx);
        }
        self.nodes[idx].parents = Some(parents);
    }

    /// Label every node with its greatest distance from origin.
    ///
    /// Seeds the tails at 1 and relaxes each child edge exactly once. A
    /// child is finalized the moment its last parent has contributed; until
    /// then only a (contributing-parent count, running maximum) pair is kept
    /// per pending child, so the side table is bounded by the frontier, not
    /// by the edge count. Nodes on a cycle never hear from their full parent
    /// set and keep `gdfo == None`, which is how later orderings detect the
    /// cycle.
    fn propagate_gdfo(&mut self) {
        let mut pending: HashMap<NodeIndex, (usize, u64)> = HashMap::new();
        let mut queue: Vec<(NodeIndex, u64)> = Vec::new();
        for idx in self.tail_indexes() {
            self.nodes[idx].gdfo = Some(1);
            queue.push((idx, 1));
        }
        while let Some((idx, gdfo)) = queue.pop() {
            let candidate = gdfo + 1;
            for i in 0..self.nodes[idx].children.len() {
                let child = self.nodes[idx].children[i];
                let total = self.nodes[child].parent_count();
                let entry = pending.entry(child).or_insert((0, 0));
                entry.0 += 1;
                if candidate > entry.1 {
                    entry.1 = candidate;
                }
                if entry.0 == total {
                    let final_gdfo = entry.1;
                    pending.remove(&child);
                    self.nodes[child].gdfo = Some(final_gdfo);
                    queue.push((child, final_gdfo));
                }
            }
        }
    }
}

impl<K: Debug> Debug for KnownGraph<K> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for node in &self.nodes {
            let parents: Option<Vec<&K>> = node
                .parents
                .as_ref()
                .map(|parents| parents.iter().map(|&p| &self.nodes[p].key).collect());
            let children: Vec<&K> = node
                .children
                .iter()
                .map(|&c| &self.nodes[c].key)
                .collect();
            writeln!(
                f,
                "{:?} gdfo:{:?} parents:{:?} children:{:?}",
                node.key, node.gdfo, parents, children
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    fn ancestry_1() -> HashMap<&'static str, Vec<&'static str>> {
        hashmap! {
            "rev1" => vec!["null:"],
            "rev2a" => vec!["rev1"],
            "rev2b" => vec!["rev1"],
            "rev3" => vec!["rev2a"],
            "rev4" => vec!["rev3", "rev2b"],
        }
    }

    fn sorted_child_keys<'a>(graph: &KnownGraph<&'a str>, key: &&'a str) -> Vec<String> {
        let mut children: Vec<String> = graph
            .child_keys(key)
            .unwrap()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        children.sort();
        children
    }

    #[test]
    fn test_children_ancestry_1() {
        let graph = KnownGraph::new(ancestry_1());
        assert_eq!(sorted_child_keys(&graph, &"null:"), vec!["rev1"]);
        assert_eq!(sorted_child_keys(&graph, &"rev1"), vec!["rev2a", "rev2b"]);
        assert_eq!(sorted_child_keys(&graph, &"rev2a"), vec!["rev3"]);
        assert_eq!(sorted_child_keys(&graph, &"rev2b"), vec!["rev4"]);
        assert_eq!(sorted_child_keys(&graph, &"rev3"), vec!["rev4"]);
        assert_eq!(sorted_child_keys(&graph, &"rev4"), Vec::<String>::new());
    }

    #[test]
    fn test_gdfo_ancestry_1() {
        let graph = KnownGraph::new(ancestry_1());
        assert_eq!(graph.gdfo(&"null:").unwrap(), Some(1));
        assert_eq!(graph.gdfo(&"rev1").unwrap(), Some(2));
        assert_eq!(graph.gdfo(&"rev2a").unwrap(), Some(3));
        assert_eq!(graph.gdfo(&"rev2b").unwrap(), Some(3));
        assert_eq!(graph.gdfo(&"rev3").unwrap(), Some(4));
        assert_eq!(graph.gdfo(&"rev4").unwrap(), Some(5));
    }

    #[test]
    fn test_gdfo_diamond() {
        let graph = KnownGraph::new(hashmap! {
            "a" => vec![],
            "b" => vec!["a"],
            "c" => vec!["a"],
            "d" => vec!["b", "c"],
        });
        assert_eq!(graph.gdfo(&"a").unwrap(), Some(1));
        assert_eq!(graph.gdfo(&"b").unwrap(), Some(2));
        assert_eq!(graph.gdfo(&"c").unwrap(), Some(2));
        assert_eq!(graph.gdfo(&"d").unwrap(), Some(3));
    }

    #[test]
    fn test_gdfo_uneven_merge() {
        // The merge must wait for its longest parent chain, not its first.
        let graph = KnownGraph::new(hashmap! {
            "a" => vec![],
            "b" => vec!["a"],
            "c" => vec!["b"],
            "d" => vec!["c"],
            "e" => vec!["a", "d"],
        });
        assert_eq!(graph.gdfo(&"e").unwrap(), Some(5));
    }

    #[test]
    fn test_ghost_is_a_tail() {
        let graph = KnownGraph::new(hashmap! { "b" => vec!["a"] });
        assert_eq!(graph.len(), 2);
        assert!(graph.is_ghost(&"a").unwrap());
        assert!(!graph.is_ghost(&"b").unwrap());
        assert_eq!(graph.gdfo(&"a").unwrap(), Some(1));
        assert_eq!(graph.gdfo(&"b").unwrap(), Some(2));
        assert_eq!(graph.parent_keys(&"a").unwrap(), None);
        assert_eq!(graph.parent_keys(&"b").unwrap(), Some(vec![&"a"]));
    }

    #[test]
    fn test_gdfo_with_ghost() {
        // g never appears as a key, so it is a ghost feeding d and c.
        let graph = KnownGraph::new(hashmap! {
            "f" => vec!["null:"],
            "e" => vec!["f"],
            "b" => vec!["e"],
            "d" => vec!["e", "g"],
            "a" => vec!["b", "e"],
            "c" => vec!["b", "d"],
        });
        assert_eq!(graph.gdfo(&"f").unwrap(), Some(2));
        assert_eq!(graph.gdfo(&"e").unwrap(), Some(3));
        assert_eq!(graph.gdfo(&"g").unwrap(), Some(1));
        assert_eq!(graph.gdfo(&"b").unwrap(), Some(4));
        assert_eq!(graph.gdfo(&"d").unwrap(), Some(4));
        assert_eq!(graph.gdfo(&"a").unwrap(), Some(5));
        assert_eq!(graph.gdfo(&"c").unwrap(), Some(5));
    }

    #[test]
    fn test_cycle_nodes_never_settle() {
        let graph = KnownGraph::new(hashmap! {
            "a" => vec![],
            "b" => vec!["a", "c"],
            "c" => vec!["b"],
        });
        assert_eq!(graph.gdfo(&"a").unwrap(), Some(1));
        assert_eq!(graph.gdfo(&"b").unwrap(), None);
        assert_eq!(graph.gdfo(&"c").unwrap(), None);
    }

    #[test]
    fn test_tails() {
        let graph = KnownGraph::new(hashmap! {
            "a" => vec![],
            "b" => vec![],
            "c" => vec!["a", "b", "ghost"],
        });
        let mut tails: Vec<String> = graph.tails().into_iter().map(|k| k.to_string()).collect();
        tails.sort();
        // The ghost is a propagation seed but not a known tail.
        assert_eq!(tails, vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_key_fails() {
        let graph = KnownGraph::new(ancestry_1());
        assert!(graph.gdfo(&"missing").is_err());
        assert!(graph.parent_keys(&"missing").is_err());
        assert!(graph.child_keys(&"missing").is_err());
        assert!(!graph.contains_key(&"missing"));
        assert!(graph.contains_key(&"null:"));
    }

    #[test]
    fn test_empty_graph() {
        let graph = KnownGraph::<&str>::new(HashMap::new());
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.tails().is_empty());
    }

    #[test]
    fn test_gdfo_property_random_dags() {
        // Parents are always drawn from lower-numbered keys, so the input
        // is acyclic by construction and the gdfo recurrence must hold
        // everywhere.
        fn prop(edges: Vec<Vec<u8>>) -> bool {
            let n = edges.len().min(48);
            let mut parent_map = HashMap::new();
            for (i, parents) in edges.iter().take(n).enumerate() {
                let parents: Vec<usize> = parents
                    .iter()
                    .map(|&p| p as usize % (i + 1))
                    .filter(|&p| p < i)
                    .collect();
                parent_map.insert(i, parents);
            }
            let graph = KnownGraph::new(parent_map.clone());
            parent_map.iter().all(|(key, parents)| {
                let gdfo = graph.gdfo(key).unwrap().unwrap();
                if parents.is_empty() {
                    gdfo == 1
                } else {
                    let max_parent = parents
                        .iter()
                        .map(|p| graph.gdfo(p).unwrap().unwrap())
                        .max()
                        .unwrap();
                    gdfo == max_parent + 1
                }
            })
        }
        quickcheck::quickcheck(prop as fn(Vec<Vec<u8>>) -> bool);
    }
}
