//! Click dispatch over a rendered pedigree.

use crate::svg::{NodeShape, SvgRenderOptions, entries_by_id, render_pedigree_svg};
use pedigree_layout::{PedigreeEntry, PedigreeLayout, Sex};
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
struct HitTarget {
    id: String,
    x: f64,
    y: f64,
    shape: NodeShape,
}

/// A laid out pedigree plus the caller's click handler.
///
/// The host owns event plumbing; it forwards either the `data-individual-id` of the clicked
/// SVG group ([`click`](Self::click)) or a point in layout coordinates
/// ([`click_at`](Self::click_at)). Either way the handler receives the individual id.
pub struct PedigreeView<'a> {
    layout: PedigreeLayout,
    entries: Vec<PedigreeEntry>,
    targets: Vec<HitTarget>,
    index: FxHashMap<String, usize>,
    on_click: Box<dyn FnMut(&str) + 'a>,
}

impl<'a> PedigreeView<'a> {
    pub fn new(
        layout: PedigreeLayout,
        entries: &[PedigreeEntry],
        on_click: impl FnMut(&str) + 'a,
    ) -> Self {
        let by_id = entries_by_id(entries);
        let targets: Vec<HitTarget> = layout
            .forests
            .iter()
            .flat_map(|f| f.nodes.iter())
            .map(|n| HitTarget {
                id: n.id.clone(),
                x: n.x,
                y: n.y,
                shape: NodeShape::for_sex(
                    by_id.get(n.id.as_str()).map_or(Sex::Unknown, |e| e.sex),
                ),
            })
            .collect();
        let index = targets
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        Self {
            layout,
            entries: entries.to_vec(),
            targets,
            index,
            on_click: Box::new(on_click),
        }
    }

    pub fn layout(&self) -> &PedigreeLayout {
        &self.layout
    }

    pub fn render_svg(&self, options: &SvgRenderOptions) -> String {
        render_pedigree_svg(&self.layout, &self.entries, options)
    }

    /// Forwards a click on `id`. Ids that are not drawn in this view are ignored.
    pub fn click(&mut self, id: &str) -> bool {
        if !self.index.contains_key(id) {
            debug!(id, "click on an individual outside the view");
            return false;
        }
        (self.on_click)(id);
        true
    }

    /// The individual whose symbol covers `(x, y)`. Later nodes are drawn on top, so they win.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&str> {
        self.hit_index(x, y).map(|i| self.targets[i].id.as_str())
    }

    /// Hit-tests `(x, y)` and forwards the click when it lands on a node.
    pub fn click_at(&mut self, x: f64, y: f64) -> bool {
        let Some(i) = self.hit_index(x, y) else {
            return false;
        };
        (self.on_click)(&self.targets[i].id);
        true
    }

    fn hit_index(&self, x: f64, y: f64) -> Option<usize> {
        let size = self.layout.node_size;
        self.targets
            .iter()
            .rposition(|t| t.shape.contains(x - t.x, y - t.y, size))
    }
}

impl fmt::Debug for PedigreeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PedigreeView")
            .field("nodes", &self.targets.len())
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
