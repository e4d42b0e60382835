use serde::{Deserialize, Serialize};

/// Geometry and convergence knobs for the tangled layout.
///
/// All fields have defaults, so a host can deserialize a partial JSON object
/// (e.g. `{"horizontal_spacing": 120}`) and keep the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Minimum distance between node centres on one level.
    pub horizontal_spacing: f64,
    /// Vertical distance between generations. Sibship elbows sit halfway.
    pub level_y_padding: f64,
    /// Outer margin around the drawing.
    pub padding: f64,
    /// Side length of a node square (diameter of a node circle).
    pub node_size: f64,
    /// Vertical offset between the bundles hanging off one parent.
    pub metro_d: f64,
    /// Horizontal gap between independently laid out forests.
    pub forest_gap: f64,
    /// Relaxation iteration cap; reaching it is reported as a non-convergent layout.
    pub max_iterations: usize,
    /// Movements at or below this distance count as "no movement".
    pub tolerance: f64,
    /// Per-iteration decay of the relaxation step once `cooling_delay` iterations have run.
    pub cooling: f64,
    /// Iterations that move nodes by their full pull before cooling starts.
    pub cooling_delay: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            horizontal_spacing: 80.0,
            level_y_padding: 100.0,
            padding: 20.0,
            node_size: 40.0,
            metro_d: 4.0,
            forest_gap: 80.0,
            max_iterations: 1000,
            tolerance: 1e-6,
            cooling: 0.95,
            cooling_delay: 50,
        }
    }
}

impl LayoutOptions {
    /// Centre coordinate of the first slot on either axis.
    pub(crate) fn origin(&self) -> f64 {
        self.padding + self.node_size / 2.0
    }

    /// Fraction of its pull a node moves by in relaxation iteration `iteration` (1-based).
    pub(crate) fn step(&self, iteration: usize) -> f64 {
        let cooled = iteration.saturating_sub(self.cooling_delay.max(1));
        self.cooling.clamp(0.0, 1.0).powi(cooled.min(i32::MAX as usize) as i32)
    }

    /// Distance from a node centre to the viewport edge it may touch.
    pub(crate) fn margin(&self) -> f64 {
        self.node_size / 2.0 + self.padding
    }
}
