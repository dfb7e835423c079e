// Copyright 2019 Facebook, Inc.
//
// This software may be used and distributed according to the terms of the
// GNU General Public License version 2 or any later version.

//! Arena storage for graph nodes.

/// Index of a node in the graph arena. Stable for the lifetime of the graph.
pub(crate) type NodeIndex = usize;

/// A single revision in the graph.
///
/// Edges are stored as arena indexes rather than references, so the
/// parent/child back-links cannot form an ownership cycle.
#[derive(Debug)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    /// `None` marks a ghost: a key referenced as a parent but never itself
    /// described by the input. Ghosts have unknown ancestry.
    pub(crate) parents: Option<Vec<NodeIndex>>,
    pub(crate) children: Vec<NodeIndex>,
    /// Greatest distance from origin. Written once, when propagation has
    /// heard from every parent; a node caught in a cycle keeps `None`.
    pub(crate) gdfo: Option<u64>,
}

impl<K> Node<K> {
    /// A new node with unknown ancestry. The builder fills in `parents`
    /// when (if) the input describes this key.
    pub(crate) fn ghost(key: K) -> Self {
        Node {
            key,
            parents: None,
            children: Vec::new(),
            gdfo: None,
        }
    }

    pub(crate) fn is_ghost(&self) -> bool {
        self.parents.is_none()
    }

    /// A tail has no real parents: an explicit root or a ghost.
    pub(crate) fn is_tail(&self) -> bool {
        match self.parents {
            None => true,
            Some(ref parents) => parents.is_empty(),
        }
    }

    pub(crate) fn parent_count(&self) -> usize {
        self.parents.as_ref().map_or(0, Vec::len)
    }
}
