//! Partition a family into forests of generation levels.
//!
//! Each pass picks the deepest founder, walks its descendants breadth-first (one wave per
//! generation), then pulls in the remaining relatives through co-parent, child and parent
//! links. Whatever a pass cannot reach becomes the input of the next pass.

use crate::error::Result;
use crate::model::PedigreeEntry;
use crate::validate::Pedigree;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForestNode {
    pub id: String,
    /// Parents placed in the same forest, paternal first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// One connected component; `levels[0]` is the earliest generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Forest {
    pub levels: Vec<Vec<ForestNode>>,
}

impl Forest {
    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().flatten().map(|n| n.id.as_str())
    }

    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|n| n.id == id))
    }

    pub fn node(&self, id: &str) -> Option<&ForestNode> {
        self.levels.iter().flatten().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub forests: Vec<Forest>,
    /// Individuals no pass could place, sorted by id.
    pub unplaced: Vec<String>,
}

/// Splits `entries` into independent forests of generation levels.
///
/// Fails only when the entries themselves are invalid (duplicate ids, parent cycles).
pub fn build_forests(entries: &[PedigreeEntry]) -> Result<Partition> {
    if entries.is_empty() {
        return Ok(Partition::default());
    }
    let pedigree = Pedigree::new(entries)?;
    Ok(partition(&pedigree))
}

pub(crate) fn partition(pedigree: &Pedigree<'_>) -> Partition {
    let mut remaining: Vec<usize> = pedigree.sorted.clone();
    let mut forests = Vec::new();

    while !remaining.is_empty() {
        let Some(root) = choose_root(pedigree, &remaining) else {
            break;
        };
        let available: FxHashSet<usize> = remaining.iter().copied().collect();
        let placement = grow(pedigree, root, &remaining, &available);
        remaining.retain(|i| !placement.generation.contains_key(i));
        debug!(
            root = pedigree.id(root),
            placed = placement.generation.len(),
            remaining = remaining.len(),
            "forest pass finished"
        );
        forests.push(placement.into_forest(pedigree));
    }

    let unplaced: Vec<String> = remaining
        .iter()
        .map(|&i| pedigree.id(i).to_string())
        .collect();
    if !unplaced.is_empty() {
        warn!(
            count = unplaced.len(),
            individuals = ?unplaced,
            "could not place some individuals in any forest"
        );
    }

    Partition { forests, unplaced }
}

/// Founder with the deepest line of descent; ties go to the smallest id.
fn choose_root(pedigree: &Pedigree<'_>, remaining: &[usize]) -> Option<usize> {
    let mut memo: FxHashMap<usize, usize> = FxHashMap::default();
    let mut best: Option<(usize, usize)> = None;
    for &candidate in remaining {
        if !pedigree.parents[candidate].is_empty() {
            continue;
        }
        let d = depth(pedigree, candidate, &mut memo);
        if best.is_none_or(|(_, best_depth)| d > best_depth) {
            best = Some((candidate, d));
        }
    }
    best.map(|(root, _)| root)
}

/// Number of generations below and including `start`, memoized across calls of one pass.
fn depth(pedigree: &Pedigree<'_>, start: usize, memo: &mut FxHashMap<usize, usize>) -> usize {
    if let Some(&d) = memo.get(&start) {
        return d;
    }
    let mut stack = vec![start];
    while let Some(&node) = stack.last() {
        if memo.contains_key(&node) {
            stack.pop();
            continue;
        }
        let pending: Vec<usize> = pedigree.children[node]
            .iter()
            .copied()
            .filter(|c| !memo.contains_key(c))
            .collect();
        if pending.is_empty() {
            let below = pedigree.children[node]
                .iter()
                .filter_map(|c| memo.get(c))
                .max()
                .copied()
                .unwrap_or(0);
            memo.insert(node, below + 1);
            stack.pop();
        } else {
            stack.extend(pending);
        }
    }
    memo.get(&start).copied().unwrap_or(1)
}

/// Individuals placed so far, keyed by a generation number that may go negative while
/// ancestors are being pulled in above the root.
#[derive(Debug, Default)]
struct Placement {
    levels: BTreeMap<i64, Vec<usize>>,
    generation: FxHashMap<usize, i64>,
}

impl Placement {
    fn push(&mut self, node: usize, generation: i64) {
        self.levels.entry(generation).or_default().push(node);
        self.generation.insert(node, generation);
    }

    fn insert_after(&mut self, node: usize, anchor: usize) {
        let Some(&generation) = self.generation.get(&anchor) else {
            return;
        };
        let level = self.levels.entry(generation).or_default();
        let at = level
            .iter()
            .position(|&n| n == anchor)
            .map_or(level.len(), |pos| pos + 1);
        level.insert(at, node);
        self.generation.insert(node, generation);
    }

    fn relocate(&mut self, node: usize, generation: i64) {
        if let Some(level) = self
            .generation
            .get(&node)
            .copied()
            .and_then(|old| self.levels.get_mut(&old))
        {
            level.retain(|&n| n != node);
        }
        self.push(node, generation);
    }

    fn get(&self, node: usize) -> Option<i64> {
        self.generation.get(&node).copied()
    }

    fn into_forest(self, pedigree: &Pedigree<'_>) -> Forest {
        let levels = self
            .levels
            .into_values()
            .filter(|level| !level.is_empty())
            .map(|level| {
                level
                    .into_iter()
                    .map(|n| ForestNode {
                        id: pedigree.id(n).to_string(),
                        parents: pedigree.parents[n]
                            .iter()
                            .filter(|&&p| self.generation.contains_key(&p))
                            .map(|&p| pedigree.id(p).to_string())
                            .collect(),
                    })
                    .collect()
            })
            .collect();
        Forest { levels }
    }
}

fn grow(
    pedigree: &Pedigree<'_>,
    root: usize,
    remaining: &[usize],
    available: &FxHashSet<usize>,
) -> Placement {
    let mut placement = Placement::default();

    // Descendants of the root, one wave per generation.
    placement.push(root, 0);
    let mut wave = vec![root];
    let mut generation = 0;
    while !wave.is_empty() {
        generation += 1;
        let mut next = Vec::new();
        for &node in &wave {
            for &child in &pedigree.children[node] {
                if available.contains(&child) && placement.get(child).is_none() {
                    placement.push(child, generation);
                    next.push(child);
                }
            }
        }
        wave = next;
    }

    // Relatives reachable only through a partner, a child or a parent.
    loop {
        let mut progressed = false;
        for &node in remaining {
            if placement.get(node).is_some() {
                continue;
            }
            if let Some(&partner) = pedigree.partners[node]
                .iter()
                .find(|&&p| placement.get(p).is_some())
            {
                placement.insert_after(node, partner);
                progressed = true;
            } else if let Some(child_gen) = pedigree.children[node]
                .iter()
                .filter_map(|&c| placement.get(c))
                .min()
            {
                placement.push(node, child_gen - 1);
                progressed = true;
            } else if let Some(parent_gen) = pedigree.parents[node]
                .iter()
                .filter_map(|&p| placement.get(p))
                .max()
            {
                placement.push(node, parent_gen + 1);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    settle_generations(pedigree, remaining, &mut placement);
    placement
}

/// Pushes anyone sitting level with or above one of their parents down below that parent.
///
/// Partner placement can put a child next to a co-parent from an older generation; the layout
/// needs every parent on a strictly earlier level. Terminates because the pedigree is acyclic:
/// each round fixes at least one more generation of the longest parent chain.
fn settle_generations(pedigree: &Pedigree<'_>, remaining: &[usize], placement: &mut Placement) {
    for _ in 0..=remaining.len() {
        let mut moved = false;
        for &node in remaining {
            let Some(generation) = placement.get(node) else {
                continue;
            };
            let deepest_parent = pedigree.parents[node]
                .iter()
                .filter_map(|&p| placement.get(p))
                .max();
            if let Some(parent_gen) = deepest_parent.filter(|&g| generation <= g) {
                placement.relocate(node, parent_gen + 1);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, father: Option<&str>, mother: Option<&str>) -> PedigreeEntry {
        PedigreeEntry::new(id).with_parents(father, mother)
    }

    #[test]
    fn depth_counts_generations() {
        let entries = vec![
            entry("g", None, None),
            entry("p", Some("g"), None),
            entry("c", Some("p"), None),
            entry("other", None, None),
        ];
        let p = Pedigree::new(&entries).unwrap();
        let mut memo = FxHashMap::default();
        assert_eq!(depth(&p, 0, &mut memo), 3);
        assert_eq!(depth(&p, 3, &mut memo), 1);
        assert_eq!(memo.get(&1), Some(&2));
    }

    #[test]
    fn relocate_moves_between_levels() {
        let mut placement = Placement::default();
        placement.push(1, 0);
        placement.push(2, 0);
        placement.relocate(2, 3);
        assert_eq!(placement.levels.get(&0), Some(&vec![1]));
        assert_eq!(placement.levels.get(&3), Some(&vec![2]));
        assert_eq!(placement.get(2), Some(3));
    }
}
