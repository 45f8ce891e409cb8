//! Rank and root filtering
//!
//! Rules, applied in this fixed order:
//! 1. nodes whose rank is excluded are dropped
//! 2. species not placed directly under a genus are dropped
//! 3. nodes named as configured roots are pinned: their parent is nulled
//! 4. other parentless nodes are extra roots, dropped or retained per policy
//! 5. nothing below a species is kept
//!
//! A dropped node takes its whole subtree with it. The surviving forest is
//! exactly the set of nodes reachable from the roots without crossing a
//! dropped node, which also leaves out any node caught in a parent cycle.

use super::graph::TaxonGraph;
use crate::error::{Result, SyncError};
use std::collections::{HashMap, VecDeque};
use tracing::warn;
use ukbol_common::config::{ExtraRootPolicy, TaxonomyConfig};
use ukbol_common::db::TaxonNode;

const SPECIES: &str = "species";
const GENUS: &str = "genus";

/// How many anomalous names to include in a warning
const SAMPLE_SIZE: usize = 10;

/// Counters describing what the filter removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub excluded_rank: usize,
    pub misplaced_species: usize,
    pub pinned_roots: usize,
    pub extra_roots: usize,
    pub retained_extra_roots: usize,
    /// Direct children of kept species that were cut off
    pub truncated: usize,
    pub cycle_members: usize,
    /// Graph nodes that did not make it into the forest
    pub dropped: usize,
}

/// Surviving taxa, re-indexed, with parent→child edges between survivors only
#[derive(Debug, Default)]
pub struct Forest {
    nodes: Vec<TaxonNode>,
    index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl Forest {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, idx: usize) -> &TaxonNode {
        &self.nodes[idx]
    }

    pub fn get(&self, id: &str) -> Option<&TaxonNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Configured roots first (by name, then ID), then any retained extra roots
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    fn push(&mut self, node: TaxonNode) -> usize {
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.children.push(Vec::new());
        idx
    }
}

/// Apply the rank and root rules to a linked graph
///
/// Fails with [`SyncError::NoRoots`] when none of the configured root names
/// survive, since writing would leave an empty taxonomy.
pub fn apply_filter(graph: &TaxonGraph, config: &TaxonomyConfig) -> Result<(Forest, FilterStats)> {
    let mut stats = FilterStats::default();
    let len = graph.len();

    // Rules 1 and 2
    let mut dropped = vec![false; len];
    for idx in 0..len {
        let node = graph.node(idx);
        if config.excluded_ranks.contains(&node.rank) {
            dropped[idx] = true;
            stats.excluded_rank += 1;
        } else if node.rank == SPECIES {
            let under_genus = graph
                .parent_of(idx)
                .is_some_and(|parent| graph.node(parent).rank == GENUS);
            if !under_genus {
                dropped[idx] = true;
                stats.misplaced_species += 1;
            }
        }
    }

    // Rule 3
    let mut pinned = vec![false; len];
    let mut roots: Vec<usize> = Vec::new();
    for idx in 0..len {
        if !dropped[idx] && config.root_names.contains(&graph.node(idx).name) {
            pinned[idx] = true;
            roots.push(idx);
        }
    }
    sort_by_name(graph, &mut roots);
    stats.pinned_roots = roots.len();

    let missing: Vec<&str> = config
        .root_names
        .iter()
        .filter(|name| !roots.iter().any(|&idx| &graph.node(idx).name == *name))
        .map(String::as_str)
        .collect();
    if roots.is_empty() {
        return Err(SyncError::NoRoots(join(config.root_names.iter().map(String::as_str))));
    }
    if !missing.is_empty() {
        warn!(missing = %join(missing.iter().copied()), "Configured root taxa not found in source");
    }

    // Rule 4
    let mut extra: Vec<usize> = (0..len)
        .filter(|&idx| !dropped[idx] && !pinned[idx] && graph.node(idx).parent_id.is_none())
        .collect();
    sort_by_name(graph, &mut extra);
    stats.extra_roots = extra.len();
    if !extra.is_empty() {
        warn!(
            count = extra.len(),
            policy = ?config.extra_roots,
            sample = %join(extra.iter().take(SAMPLE_SIZE).map(|&idx| graph.node(idx).name.as_str())),
            "Parentless taxa outside the configured roots"
        );
        if config.extra_roots == ExtraRootPolicy::Retain {
            stats.retained_extra_roots = extra.len();
            roots.extend(extra);
        }
    }

    stats.cycle_members = log_cycles(graph, &pinned);

    // Rule 5 and subtree removal, by breadth-first reachability from the roots
    let mut forest = Forest::default();
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    for &root in &roots {
        let mut node = graph.node(root).clone();
        node.parent_id = None;
        let idx = forest.push(node);
        forest.roots.push(idx);
        queue.push_back((root, idx));
    }

    while let Some((graph_idx, forest_idx)) = queue.pop_front() {
        if graph.node(graph_idx).rank == SPECIES {
            stats.truncated += graph.children(graph_idx).len();
            continue;
        }
        for &child in graph.children(graph_idx) {
            // Pinned roots were placed already; dropped nodes take their subtree
            if dropped[child] || pinned[child] {
                continue;
            }
            let child_idx = forest.push(graph.node(child).clone());
            forest.children[forest_idx].push(child_idx);
            queue.push_back((child, child_idx));
        }
    }

    stats.dropped = len - forest.len();
    Ok((forest, stats))
}

fn sort_by_name(graph: &TaxonGraph, indices: &mut [usize]) {
    indices.sort_by(|&a, &b| {
        let (a, b) = (graph.node(a), graph.node(b));
        a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
    });
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Find parent-link cycles (ignoring links above pinned roots) and log them
///
/// Each node has at most one parent, so marking the nodes on the current walk
/// up the parent chain finds every cycle exactly once.
fn log_cycles(graph: &TaxonGraph, pinned: &[bool]) -> usize {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unseen,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unseen; graph.len()];
    let mut members = 0;

    for start in 0..graph.len() {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(idx) = current {
            match marks[idx] {
                Mark::Done => break,
                Mark::OnPath => {
                    let cycle_start = path.iter().position(|&p| p == idx).unwrap_or(0);
                    let cycle = &path[cycle_start..];
                    members += cycle.len();
                    warn!(
                        length = cycle.len(),
                        ids = %join(cycle.iter().take(SAMPLE_SIZE).map(|&i| graph.node(i).id.as_str())),
                        "Parent cycle detected, its members are not emitted"
                    );
                    break;
                }
                Mark::Unseen => {
                    marks[idx] = Mark::OnPath;
                    path.push(idx);
                    current = if pinned[idx] { None } else { graph.parent_of(idx) };
                }
            }
        }
        for idx in path {
            marks[idx] = Mark::Done;
        }
    }

    members
}
