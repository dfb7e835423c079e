// Copyright 2019 Facebook, Inc.
//
// This software may be used and distributed according to the terms of the
// GNU General Public License version 2 or any later version.

//! # knowngraph
//!
//! Ancestry queries over a revision graph that has been loaded completely
//! into memory.
//!
//! A [`KnownGraph`] is built once from a `key -> parent keys` map and is
//! immutable afterwards. Keys referenced as parents but never described
//! become ghosts: tolerated, usable as traversal boundaries, excluded from
//! orderings. During construction every node is labelled with its greatest
//! distance from origin, which later lets ancestry walks stop early instead
//! of visiting everything.
//!
//! Queries:
//! - [`KnownGraph::heads`]: which of these keys are un-merged tips?
//! - [`KnownGraph::topo_sort`]: a parents-first order over all known keys.
//! - [`KnownGraph::merge_sort`]: merge-aware display order with dotted
//!   revision numbers, produced by a pluggable [`MergeSequencer`].
//!
//! ```
//! use knowngraph::KnownGraph;
//! use std::collections::HashMap;
//!
//! let mut parent_map = HashMap::new();
//! parent_map.insert("a", vec![]);
//! parent_map.insert("b", vec!["a"]);
//! parent_map.insert("c", vec!["a"]);
//! let graph = KnownGraph::new(parent_map);
//!
//! let heads = graph.heads(vec!["b", "c"]).unwrap();
//! assert_eq!(heads.len(), 2);
//! assert_eq!(graph.topo_sort().unwrap()[0], "a");
//! ```

mod errors;
mod graph;
mod heads;
mod merge;
mod node;
mod sort;

pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::graph::{GraphOptions, KnownGraph};
pub use crate::merge::{MergeEntry, MergeSequencer, Revno, SequencedEntry};
