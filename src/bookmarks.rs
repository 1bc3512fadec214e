//! Bookmark management built on top of `lopdf`.
//!
//! `genpdf` has no notion of a document outline, so the rendered bytes are reopened with `lopdf`
//! and an `/Outlines` tree is added to the catalog.

use std::collections::{BTreeMap, HashMap};
use std::io;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use thiserror::Error;

use crate::outline::{Destination, Outline, OutlineItem};

/// Errors that can occur while embedding or reading bookmarks.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("failed to parse PDF bytes")]
    Parse(#[from] lopdf::Error),

    #[error("failed to write PDF bytes")]
    Io(#[from] io::Error),

    #[error("PDF catalog entry is missing")]
    MissingCatalog,

    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,

    #[error("bookmark `{title}` refers to missing page {page}")]
    MissingPage { title: String, page: usize },

    #[error("bookmark `{title}` points at content that was never rendered")]
    UnresolvedDestination { title: String },

    #[error("malformed outline: {0}")]
    InvalidOutline(String),
}

/// A bookmark read back from a PDF.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineNode {
    pub title: String,
    /// 1-based page the bookmark opens.
    pub page: Option<u32>,
    /// Raw `/Count` entry; negative for closed items.
    pub count: Option<i64>,
    pub children: Vec<OutlineNode>,
}

/// Writes `outline` into the PDF as a nested `/Outlines` tree.
///
/// `resolve` maps a destination to its 1-based physical page.  Items without a destination open
/// the page of their first descendant that has one; items with none at all carry no `/Dest`.
pub fn apply_outline<F>(
    pdf_bytes: &[u8],
    outline: &Outline,
    resolve: F,
) -> Result<Vec<u8>, BookmarkError>
where
    F: Fn(Destination) -> Option<usize>,
{
    if outline.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let outlines_id = document.new_object_id();

    let writer = OutlineWriter {
        pages: &pages,
        resolve: &resolve,
    };
    let (first, last) = writer.write_level(&mut document, outlines_id, outline.items())?;

    let mut root = Dictionary::new();
    root.set("Type", Object::Name(b"Outlines".to_vec()));
    root.set("First", Object::Reference(first));
    root.set("Last", Object::Reference(last));
    root.set("Count", Object::Integer(visible_count(outline.items())));
    document
        .objects
        .insert(outlines_id, Object::Dictionary(root));

    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;
    let catalog = document
        .get_object_mut(catalog_id)
        .map_err(|_| BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Number of entries shown below `items` when every open item is expanded.
fn visible_count(items: &[OutlineItem]) -> i64 {
    items
        .iter()
        .map(|item| {
            1 + if item.is_closed() {
                0
            } else {
                visible_count(item.children())
            }
        })
        .sum()
}

/// `/Count` of an item: its visible descendants, negated when the item is closed.
fn item_count(item: &OutlineItem) -> Option<i64> {
    if item.children().is_empty() {
        return None;
    }
    let count = visible_count(item.children());
    Some(if item.is_closed() { -count } else { count })
}

/// Encodes a title as a PDF text string, using UTF-16BE for anything beyond ASCII.
fn encode_title(title: &str) -> Object {
    if title.is_ascii() {
        return Object::string_literal(title);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in title.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_title(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

struct OutlineWriter<'a, F> {
    pages: &'a BTreeMap<u32, ObjectId>,
    resolve: &'a F,
}

impl<F> OutlineWriter<'_, F>
where
    F: Fn(Destination) -> Option<usize>,
{
    fn page_ref(&self, item: &OutlineItem) -> Result<Option<ObjectId>, BookmarkError> {
        let Some(destination) = item.effective_destination() else {
            return Ok(None);
        };
        let page = (self.resolve)(destination).ok_or_else(|| {
            BookmarkError::UnresolvedDestination {
                title: item.title().to_owned(),
            }
        })?;
        let page_ref = u32::try_from(page)
            .ok()
            .and_then(|number| self.pages.get(&number))
            .copied()
            .ok_or_else(|| BookmarkError::MissingPage {
                title: item.title().to_owned(),
                page,
            })?;
        Ok(Some(page_ref))
    }

    /// Writes one sibling level and returns the ids of its first and last entries.
    fn write_level(
        &self,
        document: &mut Document,
        parent: ObjectId,
        items: &[OutlineItem],
    ) -> Result<(ObjectId, ObjectId), BookmarkError> {
        let ids: Vec<ObjectId> = items.iter().map(|_| document.new_object_id()).collect();

        for (index, item) in items.iter().enumerate() {
            let mut dictionary = Dictionary::new();
            dictionary.set("Title", encode_title(item.title()));
            dictionary.set("Parent", Object::Reference(parent));

            if let Some(page_ref) = self.page_ref(item)? {
                dictionary.set(
                    "Dest",
                    Object::Array(vec![
                        Object::Reference(page_ref),
                        Object::Name(b"Fit".to_vec()),
                    ]),
                );
            }
            if index > 0 {
                dictionary.set("Prev", Object::Reference(ids[index - 1]));
            }
            if let Some(next) = ids.get(index + 1) {
                dictionary.set("Next", Object::Reference(*next));
            }

            if !item.children().is_empty() {
                let (first, last) = self.write_level(document, ids[index], item.children())?;
                dictionary.set("First", Object::Reference(first));
                dictionary.set("Last", Object::Reference(last));
            }
            if let Some(count) = item_count(item) {
                dictionary.set("Count", Object::Integer(count));
            }

            document
                .objects
                .insert(ids[index], Object::Dictionary(dictionary));
        }

        match (ids.first(), ids.last()) {
            (Some(first), Some(last)) => Ok((*first, *last)),
            _ => Err(BookmarkError::InvalidOutline(
                "an outline level has no entries".to_owned(),
            )),
        }
    }
}

/// Reads the outline of a PDF back into a tree.
pub fn read_outline(pdf_bytes: &[u8]) -> Result<Vec<OutlineNode>, BookmarkError> {
    let document = Document::load_mem(pdf_bytes)?;
    let page_numbers: HashMap<ObjectId, u32> = document
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect();

    let catalog = document.catalog().map_err(|_| BookmarkError::MissingCatalog)?;
    let Ok(outlines_id) = catalog.get(b"Outlines").and_then(Object::as_reference) else {
        return Ok(Vec::new());
    };
    let outlines = document.get_dictionary(outlines_id)?;
    read_level(&document, &page_numbers, outlines)
}

fn read_level(
    document: &Document,
    page_numbers: &HashMap<ObjectId, u32>,
    parent: &Dictionary,
) -> Result<Vec<OutlineNode>, BookmarkError> {
    let mut nodes = Vec::new();
    let Ok(mut current) = parent.get(b"First").and_then(Object::as_reference) else {
        return Ok(nodes);
    };

    loop {
        let dictionary = document.get_dictionary(current)?;
        let title = dictionary
            .get(b"Title")
            .and_then(Object::as_str)
            .map(decode_title)
            .map_err(|_| BookmarkError::InvalidOutline("bookmark without a title".to_owned()))?;
        let page = dictionary
            .get(b"Dest")
            .and_then(Object::as_array)
            .ok()
            .and_then(|dest| dest.first())
            .and_then(|target| target.as_reference().ok())
            .and_then(|id| page_numbers.get(&id).copied());
        let count = dictionary.get(b"Count").and_then(Object::as_i64).ok();

        nodes.push(OutlineNode {
            title,
            page,
            count,
            children: read_level(document, page_numbers, dictionary)?,
        });

        match dictionary.get(b"Next").and_then(Object::as_reference) {
            Ok(next) => current = next,
            Err(_) => break,
        }
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::AnchorId;

    fn dest(index: usize) -> Destination {
        Destination {
            anchor: AnchorId::new(index),
            page: index,
        }
    }

    fn sample() -> Outline {
        let mut outline = Outline::new();
        outline.define(OutlineItem::page("Intro", dest(1)));
        outline.define(OutlineItem::section("Graphics").with_destination(dest(2)).closed());
        outline
            .add_subsection_to(&["Graphics"], OutlineItem::section("Basics").closed())
            .unwrap();
        outline
            .add_subsection_to(&["Graphics", "Basics"], OutlineItem::page("Lines", dest(3)))
            .unwrap();
        outline
            .add_subsection_to(&["Graphics", "Basics"], OutlineItem::page("Polygons", dest(4)))
            .unwrap();
        outline
            .add_subsection_to(&["Graphics"], OutlineItem::page("Colors", dest(5)))
            .unwrap();
        outline
    }

    #[test]
    fn counts_follow_open_state() {
        let outline = sample();
        let graphics = outline.find(&["Graphics"]).unwrap();
        let basics = outline.find(&["Graphics", "Basics"]).unwrap();

        // Basics (closed) hides its two children, so Graphics shows Basics and Colors.
        assert_eq!(item_count(basics), Some(-2));
        assert_eq!(item_count(graphics), Some(-2));
        assert_eq!(item_count(outline.find(&["Intro"]).unwrap()), None);
        // Both top-level items are visible; Graphics is closed.
        assert_eq!(visible_count(outline.items()), 2);
    }

    #[test]
    fn open_items_count_visible_descendants() {
        let mut outline = Outline::new();
        outline.define(OutlineItem::section("A"));
        outline.add_subsection_to(&["A"], OutlineItem::section("B")).unwrap();
        outline.add_subsection_to(&["A", "B"], OutlineItem::section("C")).unwrap();
        outline.add_subsection_to(&["A"], OutlineItem::section("D").closed()).unwrap();
        outline.add_subsection_to(&["A", "D"], OutlineItem::section("E")).unwrap();

        assert_eq!(item_count(outline.find(&["A"]).unwrap()), Some(3));
        assert_eq!(item_count(outline.find(&["A", "D"]).unwrap()), Some(-1));
        assert_eq!(visible_count(outline.items()), 4);
    }

    #[test]
    fn non_ascii_titles_use_utf16() {
        let Object::String(bytes, _) = encode_title("Grafik für Anfänger") else {
            panic!("expected a string object");
        };
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_title(&bytes), "Grafik für Anfänger");

        let Object::String(plain, _) = encode_title("Graphics") else {
            panic!("expected a string object");
        };
        assert_eq!(plain, b"Graphics");
    }

    #[test]
    fn invalid_pdf_is_a_parse_error() {
        let err = apply_outline(b"not a pdf", &sample(), |d| Some(d.page)).unwrap_err();
        assert!(matches!(err, BookmarkError::Parse(_)));
    }

    #[test]
    fn empty_outline_leaves_bytes_untouched() {
        let bytes = b"%PDF-1.3 whatever".to_vec();
        let result = apply_outline(&bytes, &Outline::new(), |_| None).unwrap();
        assert_eq!(result, bytes);
    }
}
