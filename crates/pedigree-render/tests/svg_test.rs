use pedigree_layout::{
    Affected, LayoutOptions, PedigreeEntry, Sex, layout_pedigree, parse_json,
};
use pedigree_render::{Error, SvgRenderOptions, render_layout_result, render_pedigree_svg};

fn trio() -> Vec<PedigreeEntry> {
    vec![
        PedigreeEntry::new("C")
            .with_parents(Some("F"), Some("M"))
            .with_sex(Sex::Female)
            .with_affected(Affected::Affected),
        PedigreeEntry::new("F")
            .with_sex(Sex::Male)
            .with_affected(Affected::Unaffected),
        PedigreeEntry::new("M")
            .with_sex(Sex::Female)
            .with_affected(Affected::Unknown),
    ]
}

fn render_trio(options: &SvgRenderOptions) -> String {
    let entries = trio();
    let layout = layout_pedigree(&entries, &LayoutOptions::default()).unwrap();
    render_pedigree_svg(&layout, &entries, options)
}

#[test]
fn svg_root_covers_the_layout_bounds() {
    let svg = render_trio(&SvgRenderOptions::default());
    assert!(svg.starts_with(r#"<svg id="pedigree" "#));
    assert!(svg.contains(r#"viewBox="-8 -8 176 196""#));
    assert!(svg.ends_with("</svg>\n"));
}

#[test]
fn svg_draws_males_as_squares_and_fills_affected_individuals() {
    let svg = render_trio(&SvgRenderOptions::default());
    assert!(svg.contains(
        r##"data-individual-id="F" transform="translate(40, 40)"><rect x="-20" y="-20" width="40" height="40" fill="#fff""##
    ));
    // affected == 2 is drawn filled.
    assert!(svg.contains(
        r##"data-individual-id="C" transform="translate(80, 140)"><circle r="20" fill="#000""##
    ));
    assert!(svg.contains(
        r##"data-individual-id="M" transform="translate(120, 40)"><circle r="20" fill="#fff""##
    ));
}

#[test]
fn svg_draws_link_halos_under_link_lines() {
    let svg = render_trio(&SvgRenderOptions::default());
    assert_eq!(svg.matches(r#"class="pedigree-link-halo""#).count(), 2);
    assert_eq!(svg.matches(r#"class="pedigree-link""#).count(), 2);

    let first_halo = svg.find(r#"class="pedigree-link-halo""#).unwrap();
    let first_line = svg.find(r#"class="pedigree-link""#).unwrap();
    assert!(first_halo < first_line);
    assert!(svg.contains(r#"d="M40,40L80,40L80,90L80,90L80,140""#));
}

#[test]
fn svg_outlines_labels_before_filling_them() {
    let svg = render_trio(&SvgRenderOptions::default());
    assert_eq!(svg.matches(r#"class="pedigree-label-halo""#).count(), 3);
    assert_eq!(svg.matches(r#"class="pedigree-label-text""#).count(), 3);
    assert!(
        svg.find(r#"class="pedigree-label-halo""#).unwrap()
            < svg.find(r#"class="pedigree-label-text""#).unwrap()
    );
    assert!(svg.contains(r#"class="pedigree-label-text" x="80" y="174">C</text>"#));

    let bare = render_trio(&SvgRenderOptions {
        show_labels: false,
        ..Default::default()
    });
    assert!(!bare.contains("<text"));
}

#[test]
fn svg_escapes_individual_ids() {
    let entries = vec![PedigreeEntry::new("a<&>b")];
    let layout = layout_pedigree(&entries, &LayoutOptions::default()).unwrap();
    let svg = render_pedigree_svg(&layout, &entries, &SvgRenderOptions::default());
    assert!(svg.contains(r#"data-individual-id="a&lt;&amp;&gt;b""#));
    assert!(!svg.contains("a<&>b"));
}

#[test]
fn layout_failures_render_the_fallback() {
    let entries = trio();
    let options = LayoutOptions {
        max_iterations: 1,
        ..Default::default()
    };
    let svg = render_layout_result(
        layout_pedigree(&entries, &options),
        &entries,
        &SvgRenderOptions::default(),
    )
    .unwrap();
    assert!(svg.contains("could not resolve pedigree"));
    assert!(svg.contains("non-convergent layout"));
    assert!(!svg.contains("data-individual-id"));

    let cyclic = vec![PedigreeEntry::new("a").with_parents(Some("a"), None)];
    let svg = render_layout_result(
        layout_pedigree(&cyclic, &LayoutOptions::default()),
        &cyclic,
        &SvgRenderOptions::default(),
    )
    .unwrap();
    assert!(svg.contains("could not resolve pedigree"));
}

#[test]
fn input_errors_are_not_swallowed() {
    let err = parse_json("not json").unwrap_err();
    let result = render_layout_result(Err(err), &[], &SvgRenderOptions::default());
    assert!(matches!(
        result,
        Err(Error::Layout(pedigree_layout::Error::Json(_)))
    ));
}

#[test]
fn empty_layout_renders_an_empty_canvas() {
    let layout = layout_pedigree(&[], &LayoutOptions::default()).unwrap();
    let svg = render_pedigree_svg(&layout, &[], &SvgRenderOptions::default());
    assert!(svg.contains(r#"viewBox="-8 -8 56 56""#));
    assert!(!svg.contains("data-individual-id"));
}
