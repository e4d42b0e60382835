//! Tangled-tree layout of one forest.
//!
//! Nodes, bundles and links live in flat arenas and refer to each other by index. A bundle is
//! the meeting point of one parent set on one level; every child of that parent set hangs off
//! the same bundle, so siblings share a sibship line instead of drawing independent edges.
//!
//! Pipeline: build the arenas ([`bundles`]), place levels on a grid, centre parents above
//! their children, then relax ([`relax`]) until an iteration moves no node by more than the
//! tolerance or the iteration cap is hit. The relaxation step cools after a warm phase, so
//! layouts whose pulls keep disagreeing still settle.

mod bundles;
mod relax;

use crate::error::{Error, Result};
use crate::forest::Forest;
use crate::options::LayoutOptions;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    pub level: usize,
    /// Parent nodes, paternal first.
    pub parents: Vec<usize>,
    /// The bundle this node hangs from (`None` for founders).
    pub bundle: Option<usize>,
    /// Bundles hanging from this node, widest span first.
    pub bundles: Vec<usize>,
    pub x: f64,
    pub y: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutBundle {
    /// Sorted parent ids joined with `-X-`.
    pub id: String,
    pub level: usize,
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
    pub links: Vec<usize>,
    /// Levels between the bundle and its shallowest parent.
    pub span: usize,
    /// Stacking slot among the bundles of its busiest parent.
    pub i: usize,
    pub x: f64,
    pub y: f64,
}

/// One child→parent edge routed `target → bundle → elbow → elbow → source`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutLink {
    /// Child node.
    pub source: usize,
    /// Parent node.
    pub target: usize,
    pub bundle: usize,
    pub xt: f64,
    pub yt: f64,
    pub xb: f64,
    pub yb: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub xs: f64,
    pub ys: f64,
}

impl LayoutLink {
    pub fn points(&self) -> [(f64, f64); 5] {
        [
            (self.xt, self.yt),
            (self.xb, self.yb),
            (self.x1, self.y1),
            (self.x2, self.y2),
            (self.xs, self.ys),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn overlaps_x(&self, other: &Self) -> bool {
        self.min_x < other.max_x && other.min_x < self.max_x
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestLayout {
    /// Node indices per level, left to right.
    pub levels: Vec<Vec<usize>>,
    pub nodes: Vec<LayoutNode>,
    pub bundles: Vec<LayoutBundle>,
    pub links: Vec<LayoutLink>,
    pub bounds: Bounds,
    /// Relaxation iterations used, including the final quiet one.
    pub iterations: usize,
}

impl ForestLayout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for n in &mut self.nodes {
            n.x += dx;
            n.y += dy;
        }
        for b in &mut self.bundles {
            b.x += dx;
            b.y += dy;
        }
        for l in &mut self.links {
            l.xt += dx;
            l.xb += dx;
            l.x1 += dx;
            l.x2 += dx;
            l.xs += dx;
            l.yt += dy;
            l.yb += dy;
            l.y1 += dy;
            l.y2 += dy;
            l.ys += dy;
        }
        self.bounds.min_x += dx;
        self.bounds.max_x += dx;
        self.bounds.min_y += dy;
        self.bounds.max_y += dy;
    }
}

/// Lays out one forest. The only failure is a relaxation that does not settle within
/// `options.max_iterations`.
pub fn compute_layout(forest: &Forest, options: &LayoutOptions) -> Result<ForestLayout> {
    let mut tangle = bundles::Tangle::from_forest(forest, options);
    tangle.place_on_grid();
    tangle.center_parents();
    tangle.position_bundles();
    tangle.route_links();

    let mut iterations = 0;
    loop {
        if iterations >= options.max_iterations {
            warn!(
                iterations,
                nodes = tangle.nodes.len(),
                "tangled layout did not converge"
            );
            return Err(Error::NonConvergent { iterations });
        }
        iterations += 1;
        let before: Vec<f64> = tangle.nodes.iter().map(|n| n.x).collect();
        tangle.center_bundles(options.step(iterations));
        tangle.rebalance();
        let moved = tangle
            .nodes
            .iter()
            .zip(&before)
            .map(|(n, &x)| (n.x - x).abs())
            .fold(0.0, f64::max);
        if moved <= options.tolerance {
            break;
        }
    }
    debug!(
        iterations,
        nodes = tangle.nodes.len(),
        bundles = tangle.bundles.len(),
        "tangled layout converged"
    );

    tangle.align_left();
    tangle.route_links();
    let bounds = tangle.bounds();
    Ok(ForestLayout {
        levels: tangle.levels,
        nodes: tangle.nodes,
        bundles: tangle.bundles,
        links: tangle.links,
        bounds,
        iterations,
    })
}
