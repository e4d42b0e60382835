//! Entry indexing and validation.
//!
//! Everything downstream works on dense indices into the entry slice; ids are only looked up
//! once, here.

use crate::error::{Error, Result};
use crate::model::PedigreeEntry;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Read-only relationship index over one family's entries.
#[derive(Debug)]
pub(crate) struct Pedigree<'a> {
    pub entries: &'a [PedigreeEntry],
    /// Entry indices sorted by individual id.
    pub sorted: Vec<usize>,
    /// Known parents of each entry (paternal first), restricted to ids present in the input.
    pub parents: Vec<Vec<usize>>,
    /// Children of each entry, sorted by id.
    pub children: Vec<Vec<usize>>,
    /// Co-parents of each entry, sorted by id.
    pub partners: Vec<Vec<usize>>,
}

impl<'a> Pedigree<'a> {
    pub fn new(entries: &'a [PedigreeEntry]) -> Result<Self> {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        index.reserve(entries.len());
        for (i, e) in entries.iter().enumerate() {
            if index.insert(e.individual_id.as_str(), i).is_some() {
                return Err(Error::DuplicateIndividual {
                    individual_id: e.individual_id.clone(),
                });
            }
        }

        let mut sorted: Vec<usize> = (0..entries.len()).collect();
        sorted.sort_by(|&a, &b| entries[a].individual_id.cmp(&entries[b].individual_id));

        let mut parents: Vec<Vec<usize>> = Vec::with_capacity(entries.len());
        for e in entries {
            let mut known = Vec::with_capacity(2);
            for pid in e.parent_ids() {
                match index.get(pid) {
                    Some(&p) => known.push(p),
                    None => debug!(
                        individual = %e.individual_id,
                        parent = pid,
                        "parent is not part of the pedigree; treating as unknown"
                    ),
                }
            }
            parents.push(known);
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
        let mut partners: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
        for &child in &sorted {
            for &p in &parents[child] {
                children[p].push(child);
            }
            if let [a, b] = parents[child][..] {
                partners[a].push(b);
                partners[b].push(a);
            }
        }
        for list in &mut partners {
            list.sort_by(|&a, &b| entries[a].individual_id.cmp(&entries[b].individual_id));
            list.dedup();
        }

        let pedigree = Self {
            entries,
            sorted,
            parents,
            children,
            partners,
        };
        pedigree.check_acyclic()?;
        Ok(pedigree)
    }

    pub fn id(&self, i: usize) -> &'a str {
        self.entries[i].individual_id.as_str()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Depth-first walk along parent edges; a back edge means somebody is their own ancestor.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        let mut marks = vec![Mark::New; self.len()];
        let mut stack: Vec<(usize, usize)> = Vec::new();
        for &start in &self.sorted {
            if marks[start] != Mark::New {
                continue;
            }
            marks[start] = Mark::Open;
            stack.push((start, 0));

            while let Some((node, next)) = stack.last_mut() {
                let node = *node;
                let Some(&parent) = self.parents[node].get(*next) else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                *next += 1;
                match marks[parent] {
                    Mark::Open => {
                        return Err(Error::CyclicPedigree {
                            individual_id: self.id(parent).to_string(),
                        });
                    }
                    Mark::New => {
                        marks[parent] = Mark::Open;
                        stack.push((parent, 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        Ok(())
    }
}

/// Checks that `entries` can be laid out: ids are unique and nobody is their own ancestor.
///
/// Parent ids that do not name another entry are allowed and treated as unknown parents.
pub fn validate_entries(entries: &[PedigreeEntry]) -> Result<()> {
    Pedigree::new(entries).map(|_| ())
}
