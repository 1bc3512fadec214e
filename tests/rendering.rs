#![cfg(feature = "bookmarks")]

use std::path::Path;

use pdf_manual::bookmarks::{read_outline, OutlineNode};
use pdf_manual::fonts;
use pdf_manual::{showcase, Manual, ManualBuilder, RenderedManual};
use sha2::{Digest, Sha256};

const SKIP_MESSAGE: &str =
    "bundled fonts missing. Set PDF_MANUAL_FONTS_DIR or copy assets/fonts next to the binary.";

fn sources_root() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/sources"))
}

fn render_bundled_manual() -> Option<RenderedManual> {
    if !fonts::fonts_available() {
        return None;
    }

    let mut manual = Manual::new(sources_root())
        .with_demos(showcase::demos())
        .with_diagnostics(std::io::sink());
    manual.build_from_sources().expect("lay out bundled manual");
    assert!(manual.failures().is_empty(), "{:?}", manual.failures());

    let rendered = ManualBuilder::new()
        .with_page_numbers()
        .render_with_bookmarks(manual.into_content())
        .expect("render bundled manual");
    Some(rendered)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

fn flatten(nodes: &[OutlineNode]) -> Vec<&OutlineNode> {
    let mut out = Vec::new();
    for node in nodes {
        out.push(node);
        out.extend(flatten(&node.children));
    }
    out
}

#[test]
fn renders_one_page_per_example() {
    let Some(rendered) = render_bundled_manual() else {
        eprintln!("Skipping renders_one_page_per_example: {SKIP_MESSAGE}");
        return;
    };

    assert!(rendered.bytes.starts_with(b"%PDF"));
    let document = lopdf::Document::load_mem(&rendered.bytes).expect("parse rendered manual");
    assert_eq!(document.get_pages().len(), rendered.page_count);

    // Two standalone pages, three package covers and sixteen examples.
    assert!(rendered.page_count >= 21, "only {} pages", rendered.page_count);
}

#[test]
fn rendering_is_deterministic() {
    let Some(first) = render_bundled_manual() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_MESSAGE}");
        return;
    };
    let Some(second) = render_bundled_manual() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_MESSAGE}");
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "PDF output should be deterministic once metadata is scrubbed"
    );
}

#[test]
fn embedded_outline_mirrors_the_sources() {
    let Some(rendered) = render_bundled_manual() else {
        eprintln!("Skipping embedded_outline_mirrors_the_sources: {SKIP_MESSAGE}");
        return;
    };

    let outline = read_outline(&rendered.bytes).expect("read outline");
    let titles: Vec<&str> = outline.iter().map(|node| node.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Cover",
            "How to read this manual",
            "Basic Concepts",
            "Graphics",
            "Images"
        ]
    );

    let basic = &outline[2];
    assert_eq!(basic.children[0].title, "Creation");
    assert_eq!(basic.children[1].title, "Coordinates");
    let coordinates: Vec<&str> = basic.children[1]
        .children
        .iter()
        .map(|node| node.title.as_str())
        .collect();
    assert_eq!(coordinates, ["Origin", "Axis", "Measurement"]);

    // Package entries are closed: their /Count is negative.
    assert!(outline[2..].iter().all(|node| node.count.unwrap_or(0) < 0));
    assert_eq!(outline[2].count, Some(-3));

    let examples: Vec<u32> = flatten(&outline)
        .into_iter()
        .filter(|node| node.children.is_empty())
        .map(|node| node.page.expect("every leaf has a page"))
        .collect();
    assert!(
        examples.windows(2).all(|pair| pair[0] < pair[1]),
        "leaf pages should be distinct and increasing: {examples:?}"
    );
    assert_eq!(outline[0].page, Some(1));
}
