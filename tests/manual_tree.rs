use std::fs;
use std::path::Path;

use genpdf::{Margins, PaperSize};
use pdf_manual::elements::pt;
use pdf_manual::model::Block;
use pdf_manual::outline::OutlineItem;
use pdf_manual::{
    fonts, showcase, DemoRegistry, LoadError, Manual, ManualBuilder, ManualError, ManualPlan,
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Two packages: one with a bare example and two sections, one with a single section.
fn sample_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "manual.toml",
        r#"
title = "Sample"

[[part]]
page = "cover"

[[part]]
package = "shapes"

[[part]]
package = "text"
"#,
    );
    write(
        root,
        "manual/cover.toml",
        r#"
[[content]]
kind = "header"
title = "Sample manual"
"#,
    );
    write(
        root,
        "shapes/shapes.toml",
        r#"
name = "Shapes"
examples = ["overview"]

[[intro]]
kind = "text"
body = "Shapes and lines."

[[section]]
name = "Lines"
examples = ["line", "polyline"]

[[section]]
name = "Curves"
examples = [{ file = "circle", eval = false }]
"#,
    );
    write(
        root,
        "text/text.toml",
        r#"
[[section]]
name = "Paragraphs"
examples = ["paragraph"]
"#,
    );

    for (package, stem) in [
        ("shapes", "overview"),
        ("shapes", "line"),
        ("shapes", "polyline"),
        ("shapes", "circle"),
        ("text", "paragraph"),
    ] {
        write(
            root,
            &format!("{package}/{stem}.rs"),
            &format!("//! The {stem} example.\n\nmanual.stroke_axis();\n"),
        );
    }
    dir
}

fn sample_demos() -> DemoRegistry {
    DemoRegistry::new()
        .with("shapes", "overview", |manual| {
            manual.stroke_axis();
            Ok(())
        })
        .with("shapes", "line", |manual| {
            manual.stroke_line([0.0, 0.0], [100.0, 100.0]);
            Ok(())
        })
        .with("shapes", "polyline", |manual| {
            manual.stroke_polygon(&[[0.0, 0.0], [50.0, 80.0], [100.0, 0.0]]);
            Ok(())
        })
        .with("text", "paragraph", |manual| {
            manual.text("A **bold** paragraph.");
            Ok(())
        })
}

fn titles(items: &[OutlineItem]) -> Vec<&str> {
    items.iter().map(OutlineItem::title).collect()
}

#[test]
fn outline_follows_declaration_order() {
    let tree = sample_tree();
    let mut manual = Manual::new(tree.path())
        .with_demos(sample_demos())
        .with_diagnostics(std::io::sink());
    manual.build_from_sources().unwrap();

    let outline = manual.outline();
    assert_eq!(titles(outline.items()), ["Cover", "Shapes", "Text"]);

    let shapes = &outline.items()[1];
    assert!(shapes.is_closed());
    assert_eq!(titles(shapes.children()), ["Overview", "Lines", "Curves"]);
    assert_eq!(titles(shapes.children()[1].children()), ["Line", "Polyline"]);
    assert_eq!(titles(shapes.children()[2].children()), ["Circle"]);

    let text = &outline.items()[2];
    assert_eq!(titles(text.children()), ["Paragraphs"]);
    assert_eq!(titles(text.children()[0].children()), ["Paragraph"]);

    assert_eq!(manual.title(), Some("Sample"));
    assert!(manual.failures().is_empty());
}

#[test]
fn every_example_starts_its_own_page() {
    let tree = sample_tree();
    let mut manual = Manual::new(tree.path())
        .with_demos(sample_demos())
        .with_diagnostics(std::io::sink());
    manual.build_from_sources().unwrap();

    // Cover, two package covers and five examples.
    assert_eq!(manual.page_number(), 8);
    let breaks = manual
        .blocks()
        .iter()
        .filter(|block| matches!(block, Block::PageBreak))
        .count();
    assert_eq!(breaks, 7);

    let pages: Vec<usize> = manual
        .outline()
        .walk()
        .into_iter()
        .filter(|(_, item)| item.children().is_empty())
        .filter_map(|(_, item)| item.destination())
        .map(|destination| destination.page)
        .collect();
    assert_eq!(pages, [1, 3, 4, 5, 6, 8]);
}

#[test]
fn missing_example_source_is_fatal() {
    let tree = sample_tree();
    fs::remove_file(tree.path().join("shapes/polyline.rs")).unwrap();

    let mut manual = Manual::new(tree.path())
        .with_demos(sample_demos())
        .with_diagnostics(std::io::sink());
    let err = manual.build_from_sources().unwrap_err();
    match err {
        ManualError::Load(LoadError::Io { path, .. }) => {
            assert!(path.ends_with("shapes/polyline.rs"), "{}", path.display());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_demonstration_does_not_stop_the_build() {
    let tree = sample_tree();
    let mut manual = Manual::new(tree.path())
        .with_demos(DemoRegistry::new())
        .with_diagnostics(std::io::sink());
    manual.build_from_sources().unwrap();

    let failed: Vec<&str> = manual
        .failures()
        .iter()
        .map(|failure| failure.filename.as_str())
        .collect();
    // `circle.rs` is declared with `eval = false`.
    assert_eq!(failed, ["overview.rs", "line.rs", "polyline.rs", "paragraph.rs"]);
    assert_eq!(manual.page_number(), 8);
}

/// A standalone page and a package titled alike, the package holding an example and a section
/// that share a title as well.
fn shared_title_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "manual.toml",
        r#"
[[part]]
page = "graphics"

[[part]]
package = "graphics"
"#,
    );
    write(
        root,
        "manual/graphics.toml",
        r#"
[[content]]
kind = "header"
title = "About graphics"
"#,
    );
    write(
        root,
        "graphics/graphics.toml",
        r#"
examples = ["text"]

[[section]]
name = "Text"
examples = ["paragraph"]
"#,
    );
    write(root, "graphics/text.rs", "manual.text(\"Hello\");\n");
    write(root, "graphics/paragraph.rs", "manual.text(\"A paragraph.\");\n");
    dir
}

#[test]
fn package_sharing_a_page_title_gets_its_own_children() {
    let tree = shared_title_tree();
    let mut manual = Manual::new(tree.path()).with_diagnostics(std::io::sink());
    manual.build_from_sources().unwrap();

    let outline = manual.outline();
    assert_eq!(titles(outline.items()), ["Graphics", "Graphics"]);

    let page = &outline.items()[0];
    assert!(page.children().is_empty());
    assert_eq!(page.destination().map(|destination| destination.page), Some(1));

    let package = &outline.items()[1];
    assert!(package.is_closed());
    assert_eq!(package.destination().map(|destination| destination.page), Some(2));
    assert_eq!(titles(package.children()), ["Text", "Text"]);
}

#[test]
fn section_sharing_an_example_title_gets_its_examples() {
    let tree = shared_title_tree();
    let mut manual = Manual::new(tree.path()).with_diagnostics(std::io::sink());
    manual.build_from_sources().unwrap();

    let package = &manual.outline().items()[1];
    let example = &package.children()[0];
    let section = &package.children()[1];

    assert!(example.children().is_empty());
    assert_eq!(example.destination().map(|destination| destination.page), Some(3));

    assert!(section.is_closed());
    assert_eq!(titles(section.children()), ["Paragraph"]);
    assert_eq!(
        section.children()[0].destination().map(|destination| destination.page),
        Some(4)
    );
}

#[test]
fn bundled_manual_lays_out_without_failures() {
    let root = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/sources"));
    let plan = ManualPlan::load(root).unwrap();
    assert_eq!(plan.parts.len(), 5);

    let mut manual = Manual::new(root)
        .with_demos(showcase::demos())
        .with_diagnostics(std::io::sink());
    manual.build(&plan).unwrap();

    assert!(manual.failures().is_empty(), "{:?}", manual.failures());
    assert_eq!(manual.page_number(), 21);
    assert!(manual.outline().find(&["Graphics", "Stroke styles", "Dash"]).is_some());
}

#[test]
fn rendered_pages_match_the_outline() {
    if !fonts::fonts_available() {
        eprintln!("Skipping rendered_pages_match_the_outline: bundled fonts missing.");
        return;
    }

    let tree = sample_tree();
    let mut manual = Manual::new(tree.path())
        .with_title("Letter sample")
        .with_demos(sample_demos())
        .with_diagnostics(std::io::sink());
    manual.build_from_sources().unwrap();
    assert_eq!(manual.title(), Some("Letter sample"));
    let outline = manual.outline().clone();

    let margin = pt(54.0);
    let rendered = ManualBuilder::new()
        .with_paper_size(PaperSize::Letter)
        .with_margins(Margins::trbl(margin, margin, margin, margin))
        .render(manual.into_content())
        .unwrap();
    assert_eq!(rendered.page_count, 8);

    let mut previous = 0;
    for (_, item) in outline.walk() {
        let Some(destination) = item.destination() else {
            continue;
        };
        let page = rendered.page_of(destination).expect("destination was rendered");
        assert!(page >= previous, "{} went backwards", item.title());
        if item.children().is_empty() {
            assert!(page > previous, "{} shares a page", item.title());
        }
        previous = page;
    }
}
