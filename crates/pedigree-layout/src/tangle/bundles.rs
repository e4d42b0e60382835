use super::{LayoutBundle, LayoutLink, LayoutNode};
use crate::forest::Forest;
use crate::options::LayoutOptions;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Working state of one layout call.
#[derive(Debug)]
pub(super) struct Tangle<'o> {
    pub options: &'o LayoutOptions,
    pub levels: Vec<Vec<usize>>,
    pub nodes: Vec<LayoutNode>,
    pub bundles: Vec<LayoutBundle>,
    pub links: Vec<LayoutLink>,
}

impl<'o> Tangle<'o> {
    pub fn from_forest(forest: &Forest, options: &'o LayoutOptions) -> Self {
        let mut levels: Vec<Vec<usize>> = Vec::with_capacity(forest.levels.len());
        let mut nodes: Vec<LayoutNode> = Vec::with_capacity(forest.len());
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        for (level, members) in forest.levels.iter().enumerate() {
            let mut slots = Vec::with_capacity(members.len());
            for n in members {
                index.insert(n.id.as_str(), nodes.len());
                slots.push(nodes.len());
                nodes.push(LayoutNode {
                    id: n.id.clone(),
                    level,
                    parents: Vec::new(),
                    bundle: None,
                    bundles: Vec::new(),
                    x: 0.0,
                    y: 0.0,
                    height: 0.0,
                });
            }
            levels.push(slots);
        }

        // Resolve parent ids. Forests only reference parents on earlier levels; anything else
        // would break the top-down routing, so it is ignored here.
        for (level, members) in forest.levels.iter().enumerate() {
            for n in members {
                let Some(&me) = index.get(n.id.as_str()) else {
                    continue;
                };
                let parents: Vec<usize> = n
                    .parents
                    .iter()
                    .filter_map(|p| index.get(p.as_str()).copied())
                    .filter(|&p| nodes[p].level < level)
                    .collect();
                nodes[me].parents = parents;
            }
        }

        let mut tangle = Self {
            options,
            levels,
            nodes,
            bundles: Vec::new(),
            links: Vec::new(),
        };
        tangle.build_bundles();
        tangle.build_links();
        tangle.index_bundles_on_parents();
        tangle
    }

    /// One bundle per distinct parent set per level.
    fn build_bundles(&mut self) {
        for level in 0..self.levels.len() {
            let mut by_parents: IndexMap<Vec<usize>, usize> = IndexMap::new();
            for slot in 0..self.levels[level].len() {
                let n = self.levels[level][slot];
                if self.nodes[n].parents.is_empty() {
                    continue;
                }
                let mut key = self.nodes[n].parents.clone();
                key.sort_unstable();

                let b = match by_parents.get(&key) {
                    Some(&b) => b,
                    None => {
                        let shallowest = self.nodes[n]
                            .parents
                            .iter()
                            .map(|&p| self.nodes[p].level)
                            .min()
                            .unwrap_or(level);
                        let mut parent_ids: Vec<&str> =
                            key.iter().map(|&p| self.nodes[p].id.as_str()).collect();
                        parent_ids.sort_unstable();
                        let b = self.bundles.len();
                        self.bundles.push(LayoutBundle {
                            id: parent_ids.join("-X-"),
                            level,
                            parents: self.nodes[n].parents.clone(),
                            children: Vec::new(),
                            links: Vec::new(),
                            span: level - shallowest,
                            i: 0,
                            x: 0.0,
                            y: 0.0,
                        });
                        by_parents.insert(key, b);
                        b
                    }
                };
                self.bundles[b].children.push(n);
                self.nodes[n].bundle = Some(b);
            }
        }
    }

    fn build_links(&mut self) {
        for n in 0..self.nodes.len() {
            let Some(b) = self.nodes[n].bundle else {
                continue;
            };
            for pi in 0..self.nodes[n].parents.len() {
                let target = self.nodes[n].parents[pi];
                self.bundles[b].links.push(self.links.len());
                self.links.push(LayoutLink {
                    source: n,
                    target,
                    bundle: b,
                    xt: 0.0,
                    yt: 0.0,
                    xb: 0.0,
                    yb: 0.0,
                    x1: 0.0,
                    y1: 0.0,
                    x2: 0.0,
                    y2: 0.0,
                    xs: 0.0,
                    ys: 0.0,
                });
            }
        }
    }

    /// Reverse pointers from parents to the bundles below them, widest span first, and the
    /// node heights that stacking those bundles needs.
    fn index_bundles_on_parents(&mut self) {
        for b in 0..self.bundles.len() {
            for pi in 0..self.bundles[b].parents.len() {
                let p = self.bundles[b].parents[pi];
                self.nodes[p].bundles.push(b);
            }
        }
        // A bundle takes its slot from the parent carrying the most bundles.
        let mut slot_owner_load = vec![0usize; self.bundles.len()];
        for n in 0..self.nodes.len() {
            let mut own = std::mem::take(&mut self.nodes[n].bundles);
            own.sort_by(|&a, &b| self.bundles[b].span.cmp(&self.bundles[a].span));
            for (i, &b) in own.iter().enumerate() {
                if own.len() > slot_owner_load[b] {
                    slot_owner_load[b] = own.len();
                    self.bundles[b].i = i;
                }
            }
            let node = &mut self.nodes[n];
            node.height = (own.len().max(1) - 1) as f64 * self.options.metro_d;
            node.bundles = own;
        }
    }
}
