use pedigree_layout::{
    Error, Forest, ForestLayout, LayoutOptions, PedigreeEntry, build_forests, compute_layout,
    layout_pedigree,
};

fn entry(id: &str, father: Option<&str>, mother: Option<&str>) -> PedigreeEntry {
    PedigreeEntry::new(id).with_parents(father, mother)
}

fn trio() -> Vec<PedigreeEntry> {
    vec![
        entry("C", Some("F"), Some("M")),
        entry("F", None, None),
        entry("M", None, None),
    ]
}

fn single_forest(entries: &[PedigreeEntry]) -> Forest {
    let mut partition = build_forests(entries).unwrap();
    assert_eq!(partition.forests.len(), 1);
    partition.forests.remove(0)
}

fn xy(layout: &ForestLayout, id: &str) -> (f64, f64) {
    let n = layout.node(id).unwrap();
    (n.x, n.y)
}

fn assert_sibships_centred(layout: &ForestLayout, tolerance: f64) {
    for b in &layout.bundles {
        let xs: Vec<f64> = b.children.iter().map(|&c| layout.nodes[c].x).collect();
        let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(
            (b.x - (lo + hi) / 2.0).abs() < tolerance,
            "bundle {} at {} over children {xs:?}",
            b.id,
            b.x
        );
    }
}

fn assert_spaced(layout: &ForestLayout, spacing: f64) {
    for level in &layout.levels {
        for pair in level.windows(2) {
            let gap = layout.nodes[pair[1]].x - layout.nodes[pair[0]].x;
            assert!(gap >= spacing - 1e-6, "gap of {gap} on level {level:?}");
        }
    }
}

#[test]
fn layout_centres_a_child_under_its_parents() {
    let forest = single_forest(&trio());
    let layout = compute_layout(&forest, &LayoutOptions::default()).unwrap();

    assert_eq!(xy(&layout, "F"), (40.0, 40.0));
    assert_eq!(xy(&layout, "M"), (120.0, 40.0));
    assert_eq!(xy(&layout, "C"), (80.0, 140.0));
    assert_eq!(layout.iterations, 2);

    let c = layout.node("C").unwrap();
    let parent_ids: Vec<&str> = c
        .parents
        .iter()
        .map(|&p| layout.nodes[p].id.as_str())
        .collect();
    assert_eq!(parent_ids, vec!["F", "M"]);

    assert_eq!(layout.bundles.len(), 1);
    let bundle = &layout.bundles[0];
    assert_eq!(bundle.id, "F-X-M");
    assert_eq!((bundle.x, bundle.y), (80.0, 40.0));
    assert_eq!(bundle.span, 1);

    assert_eq!(layout.links.len(), 2);
    let to_father = &layout.links[0];
    assert_eq!(layout.nodes[to_father.target].id, "F");
    assert_eq!(
        to_father.points(),
        [
            (40.0, 40.0),
            (80.0, 40.0),
            (80.0, 90.0),
            (80.0, 90.0),
            (80.0, 140.0)
        ]
    );

    assert_eq!(
        (
            layout.bounds.min_x,
            layout.bounds.min_y,
            layout.bounds.max_x,
            layout.bounds.max_y
        ),
        (0.0, 0.0, 160.0, 180.0)
    );
}

#[test]
fn layout_of_a_singleton_has_no_links_or_bundles() {
    let forest = single_forest(&[entry("solo", None, None)]);
    let layout = compute_layout(&forest, &LayoutOptions::default()).unwrap();

    assert_eq!(layout.levels, vec![vec![0]]);
    assert_eq!(xy(&layout, "solo"), (40.0, 40.0));
    assert!(layout.links.is_empty());
    assert!(layout.bundles.is_empty());
    assert_eq!(layout.iterations, 1);
    assert_eq!(layout.bounds.width(), 80.0);
    assert_eq!(layout.bounds.height(), 80.0);
}

#[test]
fn layout_of_three_generations_converges_to_centred_sibships() {
    let entries = vec![
        entry("A", None, None),
        entry("B", None, None),
        entry("C", Some("A"), Some("B")),
        entry("D", Some("A"), Some("B")),
        entry("E", Some("A"), Some("B")),
        entry("X", None, None),
        entry("Y", None, None),
        entry("C1", Some("C"), Some("X")),
        entry("C2", Some("C"), Some("X")),
        entry("E1", Some("E"), Some("Y")),
    ];
    let forest = single_forest(&entries);
    let layout = compute_layout(&forest, &LayoutOptions::default()).unwrap();

    let expected = [
        ("A", (120.0, 40.0)),
        ("B", (200.0, 40.0)),
        ("C", (40.0, 140.0)),
        ("X", (120.0, 140.0)),
        ("E", (200.0, 140.0)),
        ("D", (280.0, 140.0)),
        ("Y", (360.0, 140.0)),
        ("C1", (40.0, 240.0)),
        ("C2", (120.0, 240.0)),
        ("E1", (280.0, 240.0)),
    ];
    for (id, pos) in expected {
        assert_eq!(xy(&layout, id), pos, "position of {id}");
    }
    assert_eq!(layout.iterations, 3);

    // E is pulled towards its own child and swaps places with D.
    let middle: Vec<&str> = layout.levels[1]
        .iter()
        .map(|&n| layout.nodes[n].id.as_str())
        .collect();
    assert_eq!(middle, vec!["C", "X", "E", "D", "Y"]);

    assert_sibships_centred(&layout, 1e-6);

    let c1_to_c = layout
        .links
        .iter()
        .find(|l| layout.nodes[l.source].id == "C1" && layout.nodes[l.target].id == "C")
        .unwrap();
    assert_eq!(
        c1_to_c.points(),
        [
            (40.0, 140.0),
            (80.0, 140.0),
            (80.0, 190.0),
            (40.0, 190.0),
            (40.0, 240.0)
        ]
    );
}

#[test]
fn layout_stacks_bundles_of_a_remarried_parent() {
    let entries = vec![
        entry("A", None, None),
        entry("B", None, None),
        entry("P", None, None),
        entry("CA", Some("P"), Some("A")),
        entry("CB", Some("P"), Some("B")),
    ];
    let forest = single_forest(&entries);
    let options = LayoutOptions::default();
    let layout = compute_layout(&forest, &options).unwrap();

    let p = layout.node("P").unwrap();
    assert_eq!(p.bundles.len(), 2);
    assert_eq!(p.height, options.metro_d);

    let slots: Vec<usize> = p.bundles.iter().map(|&b| layout.bundles[b].i).collect();
    assert_eq!(slots, vec![0, 1]);

    // The two marriage lines leave P at different heights.
    let ys: Vec<f64> = p
        .bundles
        .iter()
        .map(|&b| layout.bundles[b].links[0])
        .map(|l| layout.links[l].yb)
        .collect();
    assert_eq!(ys, vec![38.0, 42.0]);
}

#[test]
fn layout_settles_half_siblings_with_a_shared_parent() {
    // P has A alone and B with Q, so its two sibships pull it different distances.
    let entries = vec![
        entry("P", None, None),
        entry("Q", None, None),
        entry("A", Some("P"), None),
        entry("B", Some("P"), Some("Q")),
    ];
    let forest = single_forest(&entries);
    let options = LayoutOptions::default();
    let layout = compute_layout(&forest, &options).unwrap();

    assert!(layout.iterations < options.max_iterations);
    assert_sibships_centred(&layout, 1e-3);
    assert_spaced(&layout, options.horizontal_spacing);
    let (px, _) = xy(&layout, "P");
    let (qx, _) = xy(&layout, "Q");
    let (ax, _) = xy(&layout, "A");
    let (bx, _) = xy(&layout, "B");
    assert!((px - 40.0).abs() < 1e-3, "P at {px}");
    assert!((qx - 200.0).abs() < 1e-3, "Q at {qx}");
    assert_eq!((ax, bx), (40.0, 120.0));
}

#[test]
fn layout_settles_a_parent_with_two_partners() {
    let entries = vec![
        entry("i001", None, None),
        entry("i002", None, None),
        entry("i003", None, None),
        entry("i004", Some("i001"), Some("i002")),
        entry("i005", Some("i003"), Some("i001")),
    ];
    let forest = single_forest(&entries);
    let options = LayoutOptions::default();
    let layout = compute_layout(&forest, &options).unwrap();

    assert!(layout.iterations < options.max_iterations);
    assert_sibships_centred(&layout, 1e-3);
    assert_spaced(&layout, options.horizontal_spacing);
    assert_eq!(layout.bundles.len(), 2);
}

#[test]
fn layout_converges_when_cooling_starts_at_once() {
    let entries = vec![
        entry("P", None, None),
        entry("Q", None, None),
        entry("A", Some("P"), None),
        entry("B", Some("P"), Some("Q")),
    ];
    let forest = single_forest(&entries);
    let options = LayoutOptions {
        cooling_delay: 1,
        ..Default::default()
    };
    let layout = compute_layout(&forest, &options).unwrap();
    assert!(layout.iterations < options.max_iterations);
    assert_spaced(&layout, options.horizontal_spacing);
}

#[test]
fn layout_reports_non_convergence_at_the_iteration_cap() {
    let forest = single_forest(&trio());
    let options = LayoutOptions {
        max_iterations: 1,
        ..Default::default()
    };
    let err = compute_layout(&forest, &options).unwrap_err();
    assert!(matches!(err, Error::NonConvergent { iterations: 1 }));
    assert!(err.to_string().contains("non-convergent layout"));
}

#[test]
fn layout_pedigree_places_disjoint_families_side_by_side() {
    let mut entries = trio();
    entries.extend([
        entry("c2", Some("f2"), Some("m2")),
        entry("f2", None, None),
        entry("m2", None, None),
    ]);
    let layout = layout_pedigree(&entries, &LayoutOptions::default()).unwrap();

    assert_eq!(layout.forests.len(), 2);
    let (first, second) = (&layout.forests[0], &layout.forests[1]);
    assert!(!first.bounds.overlaps_x(&second.bounds));
    assert_eq!(second.bounds.min_x, first.bounds.max_x + 80.0);
    assert_eq!(xy(second, "f2"), (280.0, 40.0));
    assert_eq!(xy(second, "c2"), (320.0, 140.0));
    assert_eq!(second.links[0].xt, 280.0);

    assert_eq!(layout.bounds.min_x, 0.0);
    assert_eq!(layout.bounds.max_x, 400.0);
    assert_eq!(layout.node_count(), 6);
}

#[test]
fn layout_pedigree_of_nothing_is_empty() {
    let layout = layout_pedigree(&[], &LayoutOptions::default()).unwrap();
    assert!(layout.is_empty());
    assert!(layout.unplaced.is_empty());
}

#[test]
fn layout_pedigree_is_deterministic() {
    let entries = vec![
        entry("A", None, None),
        entry("B", None, None),
        entry("P", None, None),
        entry("CA", Some("P"), Some("A")),
        entry("CB", Some("P"), Some("B")),
        entry("CB2", Some("P"), Some("B")),
        entry("S", None, None),
        entry("G", Some("CA"), Some("S")),
    ];
    let options = LayoutOptions::default();
    let a = layout_pedigree(&entries, &options).unwrap();
    let b = layout_pedigree(&entries, &options).unwrap();
    assert_eq!(a, b);
    let bits = |l: &pedigree_layout::PedigreeLayout| -> Vec<(u64, u64)> {
        l.node_positions()
            .map(|(_, x, y)| (x.to_bits(), y.to_bits()))
            .collect()
    };
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn layout_options_accept_partial_json() {
    let options: LayoutOptions = serde_json::from_str(r#"{"horizontal_spacing": 120}"#).unwrap();
    assert_eq!(options.horizontal_spacing, 120.0);
    assert_eq!(options.max_iterations, 1000);
}
