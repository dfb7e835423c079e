// Copyright 2019 Facebook, Inc.
//
// This software may be used and distributed according to the terms of the
// GNU General Public License version 2 or any later version.

//! # tsort
//!
//! Merge-aware topological sorting with dotted revision numbers.
//!
//! [`merge_sort`] lays out the history of a tip revision the way a log
//! display wants it: newest first, every revision above its parents, each
//! merged branch tucked directly under the revision that merged it. The
//! mainline (leftmost-parent chain from the tip) is numbered `1..=n`; a
//! merged revision gets a three-part dotted number `base.branch.position`.
//!
//! For a history where `C` merges `B` back into the mainline:
//!
//! ```text
//! A --- C        2
//!  \   /           1.1.1    [end of merge]
//!   B            1
//! ```
//!
//! [`MergeSorter`] packages the algorithm behind the
//! [`knowngraph::MergeSequencer`] interface.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use knowngraph::{ErrorKind, MergeEntry, MergeSequencer, Result, Revno, SequencedEntry};

/// The stock [`MergeSequencer`]: stateless, one entry per reachable
/// revision, numbering as described in the crate docs.
pub struct MergeSorter;

impl<K: Clone + Eq + Hash + Debug> MergeSequencer<K> for MergeSorter {
    fn sequence(
        &self,
        parent_map: HashMap<K, Vec<K>>,
        tip: K,
    ) -> Result<Vec<SequencedEntry<K>>> {
        merge_sort(&parent_map, &tip)
    }
}

/// Merge-sort the ancestry of `tip`.
///
/// Parent keys without an entry in `parent_map` are unknown ancestors:
/// they terminate chains but never appear in the output. Revisions in the
/// map that are not ancestors of `tip` are ignored.
///
/// Fails if `tip` has no entry, or if a cycle is reachable from it.
pub fn merge_sort<K>(parent_map: &HashMap<K, Vec<K>>, tip: &K) -> Result<Vec<SequencedEntry<K>>>
where
    K: Clone + Eq + Hash + Debug,
{
    if !parent_map.contains_key(tip) {
        return Err(ErrorKind::UnknownKey(format!("{:?}", tip)).into());
    }

    // Intern the sub-graph reachable from the tip. Only parents with an
    // entry of their own become edges.
    fn intern<K: Clone + Eq + Hash>(
        key: &K,
        index: &mut HashMap<K, usize>,
        keys: &mut Vec<K>,
        parents: &mut Vec<Vec<usize>>,
        to_expand: &mut Vec<usize>,
    ) -> usize {
        if let Some(&id) = index.get(key) {
            return id;
        }
        let id = keys.len();
        index.insert(key.clone(), id);
        keys.push(key.clone());
        parents.push(Vec::new());
        to_expand.push(id);
        id
    }

    let mut index: HashMap<K, usize> = HashMap::new();
    let mut keys: Vec<K> = Vec::new();
    let mut parents: Vec<Vec<usize>> = Vec::new();
    let mut to_expand: Vec<usize> = Vec::new();
    intern(tip, &mut index, &mut keys, &mut parents, &mut to_expand);
    while let Some(id) = to_expand.pop() {
        let key = keys[id].clone();
        if let Some(parent_keys) = parent_map.get(&key) {
            let mut ids = Vec::with_capacity(parent_keys.len());
            for parent in parent_keys {
                if parent_map.contains_key(parent) {
                    ids.push(intern(
                        parent,
                        &mut index,
                        &mut keys,
                        &mut parents,
                        &mut to_expand,
                    ));
                }
            }
            parents[id] = ids;
        }
    }
    let node_count = keys.len();

    let mut child_count = vec![0usize; node_count];
    for parent_ids in &parents {
        for &parent in parent_ids {
            child_count[parent] += 1;
        }
    }

    // The mainline is the leftmost-parent chain from the tip, numbered
    // from 1 at the bottom.
    let mut mainline_no = vec![0u64; node_count];
    {
        let mut chain = Vec::new();
        let mut on_chain = vec![false; node_count];
        let mut cur = 0;
        loop {
            if on_chain[cur] {
                // first-parent cycle; reported below once the walk stalls
                break;
            }
            on_chain[cur] = true;
            chain.push(cur);
            match parents[cur].first() {
                Some(&parent) => cur = parent,
                None => break,
            }
        }
        let chain_len = chain.len() as u64;
        for (i, &id) in chain.iter().enumerate() {
            mainline_no[id] = chain_len - i as u64;
        }
    }

    // Emit newest-first. A revision goes out only once everything that
    // merged it has gone out, which puts it at the latest position the
    // parents-after-children rule allows. The first emitted child naming a
    // revision as leftmost parent claims it: the revision continues that
    // child's branch (same depth, next dotted number down).
    let mut emit_order: Vec<usize> = Vec::with_capacity(node_count);
    let mut remaining = child_count;
    let mut claimer: Vec<Option<usize>> = vec![None; node_count];
    let mut depth = vec![0usize; node_count];
    // In an acyclic sub-graph the only node without reachable children is
    // the tip itself; anything else stalls the walk and is a cycle.
    let mut stack: Vec<usize> = (0..node_count).filter(|&id| remaining[id] == 0).collect();
    while let Some(id) = stack.pop() {
        emit_order.push(id);
        if let Some(&first) = parents[id].first() {
            if mainline_no[first] == 0 && claimer[first].is_none() {
                claimer[first] = Some(id);
            }
        }
        // Left-to-right, so the rightmost parent that comes ready is
        // popped (and displayed) first, right under the merge.
        for &parent in &parents[id] {
            remaining[parent] -= 1;
            if remaining[parent] == 0 {
                depth[parent] = if mainline_no[parent] > 0 {
                    0
                } else if let Some(claiming_child) = claimer[parent] {
                    depth[claiming_child]
                } else {
                    depth[id] + 1
                };
                stack.push(parent);
            }
        }
    }
    if emit_order.len() < node_count {
        let mut emitted = vec![false; node_count];
        for &id in &emit_order {
            emitted[id] = true;
        }
        let unfinished: Vec<String> = (0..node_count)
            .filter(|&id| !emitted[id])
            .map(|id| format!("{:?}", keys[id]))
            .collect();
        return Err(ErrorKind::Cycle(unfinished).into());
    }

    // Number oldest-first so branch counters follow the historical merge
    // order, then flip back.
    let mut revno: Vec<Option<Revno>> = vec![None; node_count];
    let mut branch_count: HashMap<u64, u64> = HashMap::new();
    let mut rows: Vec<(usize, Revno, bool)> = Vec::with_capacity(node_count);
    for &id in emit_order.iter().rev() {
        let number = if mainline_no[id] > 0 {
            Revno::Mainline(mainline_no[id])
        } else {
            let first = parents[id].first().cloned();
            let continued = match first {
                Some(parent) if mainline_no[parent] == 0 && claimer[parent] == Some(id) => {
                    match revno[parent] {
                        Some(Revno::Dotted(base, branch, pos)) => Some((base, branch, pos)),
                        _ => None,
                    }
                }
                _ => None,
            };
            match continued {
                Some((base, branch, pos)) => Revno::Dotted(base, branch, pos + 1),
                None => {
                    let base = match first {
                        None => 0,
                        Some(parent) => match revno[parent] {
                            Some(Revno::Mainline(no)) => no,
                            Some(Revno::Dotted(base, _, _)) => base,
                            None => 0,
                        },
                    };
                    let counter = branch_count.entry(base).or_insert(0);
                    *counter += 1;
                    Revno::Dotted(base, *counter, 1)
                }
            }
        };
        let end_of_merge = match number {
            Revno::Mainline(no) => no == 1,
            Revno::Dotted(_, _, pos) => pos == 1,
        };
        revno[id] = Some(number.clone());
        rows.push((id, number, end_of_merge));
    }
    rows.reverse();

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(sequence, (id, revno, end_of_merge))| SequencedEntry {
            sequence,
            entry: MergeEntry {
                key: keys[id].clone(),
                merge_depth: depth[id],
                revno,
                end_of_merge,
            },
        })
        .collect())
}
