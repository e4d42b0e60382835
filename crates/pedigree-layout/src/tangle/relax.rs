//! Geometry passes over a [`Tangle`].
//!
//! Relaxation alternates two passes. Centring pulls every parent towards the middle of the
//! sibships it heads, averaging the pulls of a parent with several bundles and scaling them by
//! the cooling step. Rebalancing then restores the spacing on every level by pushing the
//! right-hand node (and what hangs below it) further right.

use super::Bounds;
use super::bundles::Tangle;
use rustc_hash::{FxHashMap, FxHashSet};

impl Tangle<'_> {
    pub fn place_on_grid(&mut self) {
        let origin = self.options.origin();
        for (level, members) in self.levels.iter().enumerate() {
            let y = origin + level as f64 * self.options.level_y_padding;
            for (slot, &n) in members.iter().enumerate() {
                let node = &mut self.nodes[n];
                node.x = origin + slot as f64 * self.options.horizontal_spacing;
                node.y = y;
            }
        }
    }

    /// Single bottom-up sweep: parents that start left of a child are moved right to it,
    /// together with everything after them on their level.
    pub fn center_parents(&mut self) {
        let tolerance = self.options.tolerance;
        let mut visited: FxHashSet<usize> = FxHashSet::default();
        for level in (0..self.levels.len()).rev() {
            for slot in 0..self.levels[level].len() {
                let n = self.levels[level][slot];
                let Some(b) = self.nodes[n].bundle else {
                    continue;
                };
                if !visited.insert(b) {
                    continue;
                }
                let min_parent_x = self.bundles[b]
                    .parents
                    .iter()
                    .map(|&p| self.nodes[p].x)
                    .fold(f64::INFINITY, f64::min);
                let shift = self.nodes[n].x - min_parent_x;
                if shift > tolerance {
                    let parents = self.bundles[b].parents.clone();
                    self.shift_rest_of_levels(&parents, shift);
                }
            }
        }
    }

    /// Shifts `members` and every node after them on their levels by `dx`, each node once.
    fn shift_rest_of_levels(&mut self, members: &[usize], dx: f64) {
        let mut first_slot: FxHashMap<usize, usize> = FxHashMap::default();
        for &m in members {
            let level = self.nodes[m].level;
            let Some(slot) = self.levels[level].iter().position(|&n| n == m) else {
                continue;
            };
            first_slot
                .entry(level)
                .and_modify(|s| *s = (*s).min(slot))
                .or_insert(slot);
        }
        for (level, slot) in first_slot {
            for i in slot..self.levels[level].len() {
                let n = self.levels[level][i];
                self.nodes[n].x += dx;
            }
        }
    }

    pub fn position_bundles(&mut self) {
        for b in 0..self.bundles.len() {
            let (x, y) = self.parent_mean(b);
            self.bundles[b].x = x;
            self.bundles[b].y = y;
        }
    }

    fn parent_mean(&self, b: usize) -> (f64, f64) {
        let parents = &self.bundles[b].parents;
        let count = parents.len().max(1) as f64;
        let (sx, sy) = parents.iter().fold((0.0, 0.0), |(sx, sy), &p| {
            (sx + self.nodes[p].x, sy + self.nodes[p].y)
        });
        (sx / count, sy / count)
    }

    /// Midpoint of the horizontal extent of a bundle's children.
    fn children_midpoint(&self, b: usize) -> Option<f64> {
        let children = &self.bundles[b].children;
        let lo = children
            .iter()
            .map(|&c| self.nodes[c].x)
            .fold(f64::INFINITY, f64::min);
        let hi = children
            .iter()
            .map(|&c| self.nodes[c].x)
            .fold(f64::NEG_INFINITY, f64::max);
        (lo.is_finite() && hi.is_finite()).then_some((lo + hi) / 2.0)
    }

    /// Vertical offset that stacks the bundles of a parent (`metro_d` apart, centred on the
    /// tallest parent).
    fn bundle_offset(&self, b: usize) -> f64 {
        let tallest = self.bundles[b]
            .parents
            .iter()
            .map(|&p| self.nodes[p].height)
            .fold(0.0, f64::max);
        self.bundles[b].i as f64 * self.options.metro_d - tallest / 2.0
    }

    pub fn route_links(&mut self) {
        let elbow_drop = self.options.level_y_padding / 2.0;
        for l in 0..self.links.len() {
            let (source, target, b) = {
                let link = &self.links[l];
                (link.source, link.target, link.bundle)
            };
            let offset = self.bundle_offset(b);
            let (xs, ys) = (self.nodes[source].x, self.nodes[source].y);
            let (xt, yt) = (self.nodes[target].x, self.nodes[target].y + offset);
            let (xb, yb) = (self.bundles[b].x, self.bundles[b].y + offset);
            let elbow_y = ys - elbow_drop;

            let link = &mut self.links[l];
            link.xt = xt;
            link.yt = yt;
            link.xb = xb;
            link.yb = yb;
            link.x1 = xb;
            link.y1 = elbow_y;
            link.x2 = xs;
            link.y2 = elbow_y;
            link.xs = xs;
            link.ys = ys;
        }
    }

    /// Moves every parent by `step` times the mean of the pulls of the bundles it heads.
    ///
    /// A bundle pulls each of its parents by the signed distance from the parents' mean to the
    /// midpoint of its children. All pulls are measured before anything moves.
    pub fn center_bundles(&mut self, step: f64) {
        let mut pull = vec![(0.0_f64, 0usize); self.nodes.len()];
        for b in 0..self.bundles.len() {
            let Some(mid) = self.children_midpoint(b) else {
                continue;
            };
            let (bundle_x, _) = self.parent_mean(b);
            let delta = mid - bundle_x;
            for &p in &self.bundles[b].parents {
                pull[p].0 += delta;
                pull[p].1 += 1;
            }
        }
        for (node, (sum, count)) in self.nodes.iter_mut().zip(pull) {
            if count > 0 {
                node.x += step * sum / count as f64;
            }
        }
        self.position_bundles();
    }

    /// Restores `horizontal_spacing` between neighbours on every level, top to bottom, and
    /// leaves each level ordered left to right.
    ///
    /// A pushed node carries its descendants along; bundles and children already carried in
    /// this pass are not shifted twice.
    pub fn rebalance(&mut self) {
        let spacing = self.options.horizontal_spacing;
        let tolerance = self.options.tolerance;
        let mut moved_bundles: FxHashSet<usize> = FxHashSet::default();
        let mut moved_children: FxHashSet<usize> = FxHashSet::default();

        for level in 0..self.levels.len() {
            let mut order = std::mem::take(&mut self.levels[level]);
            order.sort_by(|&a, &b| self.nodes[a].x.total_cmp(&self.nodes[b].x));
            for w in 1..order.len() {
                let (prev, cur) = (order[w - 1], order[w]);
                let deficit = spacing - (self.nodes[cur].x - self.nodes[prev].x);
                if deficit > tolerance {
                    self.push_right(cur, deficit, &mut moved_bundles, &mut moved_children);
                }
            }
            self.levels[level] = order;
        }

        self.position_bundles();
    }

    fn push_right(
        &mut self,
        start: usize,
        dx: f64,
        moved_bundles: &mut FxHashSet<usize>,
        moved_children: &mut FxHashSet<usize>,
    ) {
        self.nodes[start].x += dx;
        let mut stack = vec![start];
        while let Some(n) = stack.pop() {
            for bi in 0..self.nodes[n].bundles.len() {
                let b = self.nodes[n].bundles[bi];
                if !moved_bundles.insert(b) {
                    continue;
                }
                for ci in 0..self.bundles[b].children.len() {
                    let c = self.bundles[b].children[ci];
                    if moved_children.insert(c) {
                        self.nodes[c].x += dx;
                        stack.push(c);
                    }
                }
            }
        }
    }

    /// Shifts the forest horizontally so its leftmost node sits on the first grid slot.
    pub fn align_left(&mut self) {
        let min_x = self.nodes.iter().map(|n| n.x).fold(f64::INFINITY, f64::min);
        if !min_x.is_finite() {
            return;
        }
        let dx = self.options.origin() - min_x;
        for node in &mut self.nodes {
            node.x += dx;
        }
        self.position_bundles();
    }

    pub fn bounds(&self) -> Bounds {
        let margin = self.options.margin();
        let node_extent = self.nodes.iter().flat_map(|n| {
            let half = n.height / 2.0;
            [
                (n.x - margin, n.y - half - margin),
                (n.x + margin, n.y + half + margin),
            ]
        });
        let bundle_extent = self.bundles.iter().map(|b| (b.x, b.y));
        Bounds::from_points(node_extent.chain(bundle_extent)).unwrap_or(Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2.0 * self.options.padding,
            max_y: 2.0 * self.options.padding,
        })
    }
}
