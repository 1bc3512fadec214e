//! Hierarchical bookmark tree assembled while the manual is laid out.
//!
//! Items point at [`Destination`]s.  A destination pairs an anchor placed in the content with
//! the number of pages the manual had explicitly started when the item was registered; the
//! physical page is only known once the builder has paginated the document.

use std::fmt;

use thiserror::Error;

/// Identifier of an anchor block in the laid-out content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(usize);

impl AnchorId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Target of an outline item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Destination {
    pub anchor: AnchorId,
    /// Page number at registration time, counting explicitly started pages only.
    pub page: usize,
}

/// A single outline entry and its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineItem {
    title: String,
    destination: Option<Destination>,
    closed: bool,
    children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// Creates a section entry that can hold children.
    pub fn section(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            destination: None,
            closed: false,
            children: Vec::new(),
        }
    }

    /// Creates a leaf entry pointing at a page.
    pub fn page(title: impl Into<String>, destination: Destination) -> Self {
        Self::section(title).with_destination(destination)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Marks the entry as collapsed in the viewer's bookmark panel.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn destination(&self) -> Option<Destination> {
        self.destination
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn children(&self) -> &[OutlineItem] {
        &self.children
    }

    /// Destination of the entry itself or, failing that, of its first descendant that has one.
    pub fn effective_destination(&self) -> Option<Destination> {
        self.destination.or_else(|| {
            self.children
                .iter()
                .find_map(OutlineItem::effective_destination)
        })
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineItem::count).sum::<usize>()
    }
}

/// Raised when an item is added below a parent that does not exist.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("outline has no entry at `{}`", .path.join(" > "))]
pub struct OutlineError {
    pub path: Vec<String>,
}

/// The document outline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outline {
    items: Vec<OutlineItem>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level items in registration order.
    pub fn items(&self) -> &[OutlineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of items at every depth.
    pub fn len(&self) -> usize {
        self.items.iter().map(OutlineItem::count).sum()
    }

    /// Appends a top-level item.
    pub fn define(&mut self, item: OutlineItem) {
        self.items.push(item);
    }

    /// Appends `item` below the entry reached by following `path` title by title.
    ///
    /// An empty path appends a top-level item.  When several siblings share a title, the one
    /// registered last wins, so a package can reuse the title of an earlier standalone page and a
    /// section the title of an earlier example.
    pub fn add_subsection_to<S: AsRef<str>>(
        &mut self,
        path: &[S],
        item: OutlineItem,
    ) -> Result<(), OutlineError> {
        if path.is_empty() {
            self.define(item);
            return Ok(());
        }

        let mut siblings = &mut self.items;
        for title in path {
            let title = title.as_ref();
            let Some(parent) = siblings.iter_mut().rev().find(|entry| entry.title == title) else {
                return Err(OutlineError {
                    path: path.iter().map(|segment| segment.as_ref().to_owned()).collect(),
                });
            };
            siblings = &mut parent.children;
        }
        siblings.push(item);
        Ok(())
    }

    /// Looks an entry up by its title path, resolving shared titles like
    /// [`add_subsection_to`](Self::add_subsection_to).
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&OutlineItem> {
        let (last, parents) = path.split_last()?;
        let mut siblings = &self.items;
        for title in parents {
            siblings = &siblings
                .iter()
                .rev()
                .find(|entry| entry.title == title.as_ref())?
                .children;
        }
        siblings.iter().rev().find(|entry| entry.title == last.as_ref())
    }

    /// Depth-first walk yielding each item with its depth (top level is 0).
    pub fn walk(&self) -> Vec<(usize, &OutlineItem)> {
        fn visit<'a>(items: &'a [OutlineItem], depth: usize, out: &mut Vec<(usize, &'a OutlineItem)>) {
            for item in items {
                out.push((depth, item));
                visit(&item.children, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        visit(&self.items, 0, &mut out);
        out
    }
}
