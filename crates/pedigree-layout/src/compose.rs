use crate::error::Result;
use crate::forest::build_forests;
use crate::model::PedigreeEntry;
use crate::options::LayoutOptions;
use crate::tangle::{Bounds, ForestLayout, compute_layout};
use serde::Serialize;
use tracing::debug;

/// Layout of a whole family: one [`ForestLayout`] per connected component, placed side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PedigreeLayout {
    pub forests: Vec<ForestLayout>,
    /// Individuals that could not be placed in any forest.
    pub unplaced: Vec<String>,
    pub bounds: Bounds,
    /// Node size the layout was computed for; renderers draw shapes at this size.
    pub node_size: f64,
}

impl PedigreeLayout {
    /// `(id, x, y)` of every node, forest by forest.
    pub fn node_positions(&self) -> impl Iterator<Item = (&str, f64, f64)> {
        self.forests
            .iter()
            .flat_map(|f| f.nodes.iter().map(|n| (n.id.as_str(), n.x, n.y)))
    }

    pub fn node_count(&self) -> usize {
        self.forests.iter().map(|f| f.nodes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }
}

/// Validates, partitions and lays out `entries`, left to right one forest at a time.
pub fn layout_pedigree(
    entries: &[PedigreeEntry],
    options: &LayoutOptions,
) -> Result<PedigreeLayout> {
    let partition = build_forests(entries)?;

    let mut forests: Vec<ForestLayout> = Vec::with_capacity(partition.forests.len());
    for forest in &partition.forests {
        let mut layout = compute_layout(forest, options)?;
        if let Some(prev) = forests.last() {
            let dx = prev.bounds.max_x + options.forest_gap - layout.bounds.min_x;
            layout.translate(dx, 0.0);
        }
        forests.push(layout);
    }

    let bounds = forests
        .iter()
        .map(|f| f.bounds)
        .reduce(|a, b| a.union(&b))
        .unwrap_or(Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2.0 * options.padding,
            max_y: 2.0 * options.padding,
        });
    debug!(
        forests = forests.len(),
        unplaced = partition.unplaced.len(),
        width = bounds.width(),
        height = bounds.height(),
        "pedigree layout ready"
    );

    Ok(PedigreeLayout {
        forests,
        unplaced: partition.unplaced,
        bounds,
        node_size: options.node_size,
    })
}
