//! Turns a laid-out manual into PDF bytes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::{self, elements, style, Element, Margins, Mm, PageDecorator, Position, Size};
use log::{debug, info};

use crate::elements::{
    paragraph_from, pt, BulletParagraph, CaptionedImage, DrawingArea, HorizontalRule, PageAnchor,
    PageTracker, SourceListing, VerticalSpace,
};
use crate::error::ManualError;
use crate::fonts::{FontSet, InstalledFonts};
use crate::manual::ManualContent;
use crate::model::Block;
use crate::outline::{AnchorId, Destination, Outline};
use crate::style::BASELINE_FONT_SIZE;

/// Margin applied on every side when none is configured.
pub const DEFAULT_MARGIN: f64 = 36.0;

type FooterFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<FooterFactory>,
}

impl FooterSpec {
    /// Creates a new footer specification.
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

/// Renders [`ManualContent`] with `genpdf`.
#[derive(Default)]
pub struct ManualBuilder {
    paper_size: Option<Size>,
    margins: Option<Margins>,
    footer: Option<FooterSpec>,
    font_directory: Option<PathBuf>,
}

impl ManualBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size; A4 by default.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the page margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Configures a footer callback with a fixed height that is invoked for every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    /// Centered page numbers in the bottom margin area.
    pub fn with_page_numbers(self) -> Self {
        self.with_footer(pt(20.0), |page| {
            let mut paragraph = elements::Paragraph::new(page.to_string());
            paragraph.set_alignment(genpdf::Alignment::Center);
            paragraph.styled(style::Style::new().with_font_size(9))
        })
    }

    /// Reads fonts from `directory` instead of searching the default locations.
    pub fn with_font_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.font_directory = Some(directory.into());
        self
    }

    fn load_fonts(&self) -> Result<FontSet, ManualError> {
        let fonts = match &self.font_directory {
            Some(directory) => FontSet::load_from(directory),
            None => FontSet::load(),
        }
        .map_err(ManualError::FontLoad)?;
        debug!(
            "Loaded fonts from {} (fallbacks: {:?})",
            fonts.directory().display(),
            fonts.fallback_names()
        );
        Ok(fonts)
    }

    /// Renders the content without bookmarks.
    pub fn render(self, content: ManualContent) -> Result<RenderedManual, ManualError> {
        let fonts = self.load_fonts()?;
        let (mut document, installed) = fonts.into_document();
        let tracker = PageTracker::new();

        if let Some(title) = &content.title {
            document.set_title(title.clone());
        }
        document.set_font_size(BASELINE_FONT_SIZE);
        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }

        let margins = self.margins.unwrap_or_else(|| {
            let margin = pt(DEFAULT_MARGIN);
            Margins::trbl(margin, margin, margin, margin)
        });
        document.set_page_decorator(ManualPageDecorator {
            tracker: tracker.clone(),
            margins,
            footer: self.footer,
        });

        let block_count = content.blocks.len();
        for block in content.blocks {
            document.push(element_for(block, &installed, &tracker).map_err(ManualError::Render)?);
        }
        debug!("Rendering {block_count} blocks");

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ManualError::Render)?;

        let destinations = collect_destinations(&content.outline, &tracker);
        let page_count = tracker.current_page();
        info!("Rendered {page_count} pages ({} bytes)", bytes.len());

        Ok(RenderedManual {
            bytes,
            page_count,
            destinations,
            outline: content.outline,
        })
    }

    /// Renders the content and embeds its outline as PDF bookmarks.
    #[cfg(feature = "bookmarks")]
    pub fn render_with_bookmarks(
        self,
        content: ManualContent,
    ) -> Result<RenderedManual, ManualError> {
        let mut rendered = self.render(content)?;
        let destinations = &rendered.destinations;
        rendered.bytes =
            crate::bookmarks::apply_outline(&rendered.bytes, &rendered.outline, |destination| {
                destinations.get(&destination.anchor).copied()
            })?;
        debug!("Embedded {} bookmarks", rendered.outline.len());
        Ok(rendered)
    }
}

/// A rendered [`Block`].  `genpdf` only accepts sized elements, so the boxed element is wrapped.
struct BlockElement(Box<dyn Element>);

impl Element for BlockElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: genpdf::render::Area<'_>,
        style: style::Style,
    ) -> Result<genpdf::RenderResult, Error> {
        self.0.render(context, area, style)
    }
}

fn element_for(
    block: Block,
    fonts: &InstalledFonts,
    tracker: &PageTracker,
) -> Result<BlockElement, Error> {
    let element: Box<dyn Element> = match block {
        Block::Paragraph(paragraph) => Box::new(paragraph_from(&paragraph, fonts)),
        Block::Bullet(paragraph) => Box::new(BulletParagraph::new(&paragraph, fonts)),
        Block::Listing(listing) => Box::new(SourceListing::new(listing, fonts)),
        Block::Rule(rule) => Box::new(HorizontalRule::new(rule)),
        Block::Spacer(points) => Box::new(VerticalSpace::new(points)),
        Block::Drawing(drawing) => Box::new(DrawingArea::new(drawing, fonts)),
        Block::Image(image) => Box::new(CaptionedImage::from_block(&image, fonts)?),
        Block::Anchor(anchor) => Box::new(PageAnchor::new(anchor, tracker.clone())),
        Block::PageBreak => Box::new(elements::PageBreak::new()),
    };
    Ok(BlockElement(element))
}

fn collect_destinations(outline: &Outline, tracker: &PageTracker) -> BTreeMap<AnchorId, usize> {
    outline
        .walk()
        .into_iter()
        .filter_map(|(_, item)| item.destination())
        .filter_map(|destination| {
            tracker
                .page_of(destination.anchor)
                .map(|page| (destination.anchor, page))
        })
        .collect()
}

/// A rendered manual.
#[derive(Clone, Debug)]
pub struct RenderedManual {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Physical page of every outline destination.
    pub destinations: BTreeMap<AnchorId, usize>,
    pub outline: Outline,
}

impl RenderedManual {
    /// Physical page `destination` ended up on.
    pub fn page_of(&self, destination: Destination) -> Option<usize> {
        self.destinations.get(&destination.anchor).copied()
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ManualError> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

struct ManualPageDecorator {
    tracker: PageTracker,
    margins: Margins,
    footer: Option<FooterSpec>,
}

impl PageDecorator for ManualPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.tracker.start_page();
        area.add_margins(self.margins);

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.tracker.current_page());
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}
