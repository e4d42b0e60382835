use crate::Result;
use pedigree_layout::{Error as LayoutError, PedigreeEntry, PedigreeLayout, Sex};
use rustc_hash::FxHashMap;
use std::fmt::Write as _;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Extra space around the layout bounds in the viewBox.
    pub viewbox_padding: f64,
    /// Root `id` attribute; defaults to `pedigree`.
    pub diagram_id: Option<String>,
    /// When true, draw the individual id under every node.
    pub show_labels: bool,
    pub font_size: f64,
    pub stroke_width: f64,
    /// Width of the white stroke drawn under every link.
    pub halo_width: f64,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            viewbox_padding: 8.0,
            diagram_id: None,
            show_labels: true,
            font_size: 12.0,
            stroke_width: 1.5,
            halo_width: 5.0,
        }
    }
}

/// Symbol drawn for an individual: squares for males, circles for everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Square,
    Circle,
}

impl NodeShape {
    pub fn for_sex(sex: Sex) -> Self {
        match sex {
            Sex::Male => Self::Square,
            Sex::Female | Sex::Unknown => Self::Circle,
        }
    }

    /// Whether `(dx, dy)`, relative to the node centre, falls inside a symbol of `size`.
    pub fn contains(self, dx: f64, dy: f64, size: f64) -> bool {
        let half = size / 2.0;
        match self {
            Self::Square => dx.abs() <= half && dy.abs() <= half,
            Self::Circle => dx * dx + dy * dy <= half * half,
        }
    }
}

pub(crate) fn entries_by_id(entries: &[PedigreeEntry]) -> FxHashMap<&str, &PedigreeEntry> {
    entries
        .iter()
        .map(|e| (e.individual_id.as_str(), e))
        .collect()
}

const PEDIGREE_CSS: &str = r#".pedigree-link-halo { fill: none; stroke: #fff; stroke-linejoin: round; }
.pedigree-link { fill: none; stroke: #000; stroke-linejoin: round; }
.pedigree-node { cursor: pointer; }
.pedigree-node rect, .pedigree-node circle { stroke: #000; }
.pedigree-label { font-family: ui-sans-serif, system-ui, sans-serif; text-anchor: middle; }
.pedigree-label-halo { fill: none; stroke: #fff; stroke-width: 3; stroke-linejoin: round; }
.pedigree-label-text { fill: #000; }
.pedigree-error { fill: #111827; font-family: ui-sans-serif, system-ui, sans-serif; text-anchor: middle; }"#;

/// Draws a computed layout. Nodes look up sex and affection status in `entries`; ids without
/// an entry are drawn as unknown, unaffected circles.
pub fn render_pedigree_svg(
    layout: &PedigreeLayout,
    entries: &[PedigreeEntry],
    options: &SvgRenderOptions,
) -> String {
    let diagram_id = options.diagram_id.as_deref().unwrap_or("pedigree");
    let by_id = entries_by_id(entries);

    let pad = options.viewbox_padding.max(0.0);
    let vb_min_x = layout.bounds.min_x - pad;
    let vb_min_y = layout.bounds.min_y - pad;
    let vb_w = (layout.bounds.width() + pad * 2.0).max(1.0);
    let vb_h = (layout.bounds.height() + pad * 2.0).max(1.0);

    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg id="{id}" width="100%" xmlns="http://www.w3.org/2000/svg" viewBox="{x} {y} {w} {h}" style="max-width: {w}px; background-color: white;" role="graphics-document document" aria-roledescription="pedigree">"#,
        id = escape_xml(diagram_id),
        x = fmt(vb_min_x),
        y = fmt(vb_min_y),
        w = fmt(vb_w),
        h = fmt(vb_h),
    );
    let _ = write!(&mut out, "<style>{PEDIGREE_CSS}</style>");
    if !layout.unplaced.is_empty() {
        let _ = write!(
            &mut out,
            "<desc>{} individuals could not be placed: {}</desc>",
            layout.unplaced.len(),
            escape_xml(&layout.unplaced.join(", "))
        );
    }

    // Halos first so crossing links stay readable.
    let paths: Vec<String> = layout
        .forests
        .iter()
        .flat_map(|f| f.links.iter().map(|l| link_path(&l.points())))
        .collect();
    let _ = write!(
        &mut out,
        r#"<g class="links"><g class="halos" stroke-width="{}">"#,
        fmt(options.halo_width)
    );
    for d in &paths {
        let _ = write!(&mut out, r#"<path class="pedigree-link-halo" d="{d}"/>"#);
    }
    let _ = write!(
        &mut out,
        r#"</g><g class="lines" stroke-width="{}">"#,
        fmt(options.stroke_width)
    );
    for d in &paths {
        let _ = write!(&mut out, r#"<path class="pedigree-link" d="{d}"/>"#);
    }
    out.push_str("</g></g>");

    let size = layout.node_size;
    out.push_str(r#"<g class="nodes">"#);
    for forest in &layout.forests {
        for n in &forest.nodes {
            let entry = by_id.get(n.id.as_str());
            let shape = NodeShape::for_sex(entry.map_or(Sex::Unknown, |e| e.sex));
            let fill = if entry.is_some_and(|e| e.is_affected()) {
                "#000"
            } else {
                "#fff"
            };
            let _ = write!(
                &mut out,
                r#"<g class="pedigree-node" data-individual-id="{id}" transform="translate({x}, {y})">"#,
                id = escape_xml(&n.id),
                x = fmt(n.x),
                y = fmt(n.y),
            );
            match shape {
                NodeShape::Square => {
                    let _ = write!(
                        &mut out,
                        r#"<rect x="{o}" y="{o}" width="{s}" height="{s}" fill="{fill}" stroke-width="{sw}"/>"#,
                        o = fmt(-size / 2.0),
                        s = fmt(size),
                        sw = fmt(options.stroke_width),
                    );
                }
                NodeShape::Circle => {
                    let _ = write!(
                        &mut out,
                        r#"<circle r="{r}" fill="{fill}" stroke-width="{sw}"/>"#,
                        r = fmt(size / 2.0),
                        sw = fmt(options.stroke_width),
                    );
                }
            }
            out.push_str("</g>");
        }
    }
    out.push_str("</g>");

    if options.show_labels {
        let label_dy = size / 2.0 + options.font_size + 2.0;
        let _ = write!(
            &mut out,
            r#"<g class="pedigree-label" font-size="{}">"#,
            fmt(options.font_size)
        );
        for class in ["pedigree-label-halo", "pedigree-label-text"] {
            for n in layout.forests.iter().flat_map(|f| f.nodes.iter()) {
                let _ = write!(
                    &mut out,
                    r#"<text class="{class}" x="{x}" y="{y}">{text}</text>"#,
                    x = fmt(n.x),
                    y = fmt(n.y + label_dy),
                    text = escape_xml(&n.id),
                );
            }
        }
        out.push_str("</g>");
    }

    out.push_str("</svg>\n");
    out
}

/// Placeholder drawn when a pedigree cannot be laid out.
pub fn render_fallback_svg(message: &str, options: &SvgRenderOptions) -> String {
    let diagram_id = options.diagram_id.as_deref().unwrap_or("pedigree");
    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg id="{id}" width="100%" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 80" style="max-width: 400px; background-color: white;" role="graphics-document document" aria-roledescription="pedigree-error">"#,
        id = escape_xml(diagram_id),
    );
    let _ = write!(&mut out, "<style>{PEDIGREE_CSS}</style>");
    out.push_str(r#"<text class="pedigree-error" x="200" y="32" font-size="16">could not resolve pedigree</text>"#);
    let _ = write!(
        &mut out,
        r#"<text class="pedigree-error" x="200" y="56" font-size="11">{}</text>"#,
        escape_xml(message)
    );
    out.push_str("</svg>\n");
    out
}

/// Renders a layout outcome. Layout failures (non-convergence, cycles, duplicate ids) become
/// the fallback SVG; input errors are passed through.
pub fn render_layout_result(
    result: pedigree_layout::Result<PedigreeLayout>,
    entries: &[PedigreeEntry],
    options: &SvgRenderOptions,
) -> Result<String> {
    match result {
        Ok(layout) => Ok(render_pedigree_svg(&layout, entries, options)),
        Err(
            err @ (LayoutError::NonConvergent { .. }
            | LayoutError::CyclicPedigree { .. }
            | LayoutError::DuplicateIndividual { .. }),
        ) => {
            warn!(error = %err, "pedigree layout failed; rendering fallback");
            Ok(render_fallback_svg(&err.to_string(), options))
        }
        Err(err) => Err(err.into()),
    }
}

fn link_path(points: &[(f64, f64)]) -> String {
    let mut d = String::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(&mut d, "{cmd}{},{}", fmt(x), fmt(y));
    }
    d
}

fn fmt(v: f64) -> String {
    // Integral values print without a fractional part; `-0` and float noise collapse.
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_prints_integral_coordinates_plainly() {
        assert_eq!(fmt(40.0), "40");
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(37.5), "37.5");
        assert_eq!(fmt(80.000_000_1), "80");
        assert_eq!(fmt(f64::NAN), "0");
    }

    #[test]
    fn link_path_visits_every_control_point() {
        let d = link_path(&[(40.0, 40.0), (80.0, 40.0), (80.0, 90.0)]);
        assert_eq!(d, "M40,40L80,40L80,90");
    }

    #[test]
    fn shapes_hit_test_their_own_outline() {
        assert!(NodeShape::Square.contains(19.0, 19.0, 40.0));
        assert!(!NodeShape::Circle.contains(19.0, 19.0, 40.0));
        assert!(NodeShape::Circle.contains(0.0, 20.0, 40.0));
        assert!(!NodeShape::Square.contains(21.0, 0.0, 40.0));
    }
}
