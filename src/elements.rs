//! `genpdf` elements used to render a laid-out manual.
//!
//! Besides the image helpers, this module holds the elements `genpdf` does not ship with: page
//! anchors that record where outline destinations land, rules that may reach into the margins,
//! bullets, source listings with per-character font fallback, and free-form drawings.

use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;
use std::rc::Rc;

use image::GenericImageView;

use genpdf::elements::{Image, Paragraph};
use genpdf::error::{Context as _, Error};
use genpdf::fonts::{Font, FontFamily};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Alignment, Element, Margins, Mm, Position, RenderResult, Scale, Size};

use crate::fonts::{split_by_coverage, GlyphCoverage, InstalledFonts};
use crate::model::{
    AxisSpec, Drawing, HorizontalAlignment, ImageBlock, ImageSource, Listing, Paint, Point,
    RichParagraph, Rule, Shape,
};
use crate::outline::AnchorId;
use crate::style::{CapStyle, FontRole, JoinStyle, Stroke};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;
const DEFAULT_CAPTION_SPACING_MM: f64 = 2.0;

/// Drawings move to the next page when less than this many points remain.
pub const MIN_DRAWING_HEIGHT: f64 = 60.0;

const BULLET: &str = "•";
const BULLET_GAP: f64 = 5.0;
const CIRCLE_SEGMENTS: usize = 72;
const FILL_STEP: f64 = 0.5;
/// `genpdf` strokes every line with the PDF default width of one point.
const HAIRLINE_WIDTH: f64 = 1.0;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts PostScript points to `genpdf` millimeters.
pub fn pt(points: f64) -> Mm {
    mm_from_f64(points * MM_PER_INCH / POINTS_PER_INCH)
}

/// Converts `genpdf` millimeters to PostScript points.
pub fn to_pt(value: Mm) -> f64 {
    mm_to_f64(value) * POINTS_PER_INCH / MM_PER_INCH
}

pub(crate) fn alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    current_page: usize,
    anchors: HashMap<AnchorId, usize>,
}

/// Shared record of the page being rendered and the page every anchor landed on.
///
/// The page decorator advances the page counter; [`PageAnchor`] elements read it.
#[derive(Clone, Debug, Default)]
pub struct PageTracker {
    state: Rc<RefCell<TrackerState>>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the page decorator whenever a page is started.
    pub fn start_page(&self) {
        self.state.borrow_mut().current_page += 1;
    }

    /// 1-based number of the page being rendered; 0 before the first page.
    pub fn current_page(&self) -> usize {
        self.state.borrow().current_page
    }

    pub fn record(&self, anchor: AnchorId) {
        let mut state = self.state.borrow_mut();
        let page = state.current_page;
        state.anchors.insert(anchor, page);
    }

    /// Physical page of `anchor`, once it has been rendered.
    pub fn page_of(&self, anchor: AnchorId) -> Option<usize> {
        self.state.borrow().anchors.get(&anchor).copied()
    }
}

/// Zero-size element recording the page it is rendered on.
pub struct PageAnchor {
    anchor: AnchorId,
    tracker: PageTracker,
}

impl PageAnchor {
    pub fn new(anchor: AnchorId, tracker: PageTracker) -> Self {
        Self { anchor, tracker }
    }
}

impl Element for PageAnchor {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        _area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        self.tracker.record(self.anchor);
        Ok(RenderResult::default())
    }
}

/// Vertical gap that never spills over to the next page.
pub struct VerticalSpace {
    height: Mm,
}

impl VerticalSpace {
    pub fn new(points: f64) -> Self {
        Self {
            height: pt(points.max(0.0)),
        }
    }
}

impl Element for VerticalSpace {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let available = area.size().height;
        let height = if self.height > available {
            available
        } else {
            self.height
        };
        let mut result = RenderResult::default();
        result.size = Size::new(0, height);
        Ok(result)
    }
}

/// Offsets, in points, of the hairlines that together paint a stroke of `width` points.
///
/// Strokes up to one point wide are a single hairline.  Wider strokes are painted with parallel
/// hairlines at most one point apart, the outer ones touching the edges of the stroke.
fn hairline_offsets(width: f64) -> Vec<f64> {
    if !width.is_finite() || width <= HAIRLINE_WIDTH {
        return vec![0.0];
    }
    let spread = width - HAIRLINE_WIDTH;
    let count = width.ceil() as usize;
    (0..count)
        .map(|index| -spread / 2.0 + spread * index as f64 / (count - 1) as f64)
        .collect()
}

/// Unit normal of the segment `from -> to`, or `None` when the segment is degenerate.
fn segment_normal(from: Position, to: Position) -> Option<(f64, f64)> {
    let dx = mm_to_f64(to.x - from.x);
    let dy = mm_to_f64(to.y - from.y);
    let length = dx.hypot(dy);
    (length > f64::EPSILON).then(|| (-dy / length, dx / length))
}

/// Shifts every vertex of the polyline by `offset` millimeters along its averaged normal.
fn offset_polyline(points: &[Position], offset: f64) -> Vec<Position> {
    if offset == 0.0 {
        return points.to_vec();
    }
    let normals: Vec<Option<(f64, f64)>> = points
        .windows(2)
        .map(|pair| segment_normal(pair[0], pair[1]))
        .collect();

    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let before = index.checked_sub(1).and_then(|i| normals[i]);
            let after = normals.get(index).copied().flatten();
            let (nx, ny) = match (before, after) {
                (Some(a), Some(b)) => (a.0 + b.0, a.1 + b.1),
                (Some(n), None) | (None, Some(n)) => n,
                (None, None) => (0.0, 0.0),
            };
            let length = nx.hypot(ny);
            if length <= f64::EPSILON {
                return *point;
            }
            Position::new(
                point.x + mm_from_f64(nx / length * offset),
                point.y + mm_from_f64(ny / length * offset),
            )
        })
        .collect()
}

/// Strokes an open polyline, splitting it into dashes when the stroke has a dash pattern.
fn stroke_polyline(area: &render::Area<'_>, points: &[Position], stroke: &Stroke) {
    if points.len() < 2 {
        return;
    }

    let pieces = match stroke.dash {
        None => vec![points.to_vec()],
        Some(dash) => {
            let lengths: Vec<f64> = points
                .windows(2)
                .map(|pair| distance(pair[0], pair[1]))
                .collect();
            let total: f64 = lengths.iter().sum();

            dash.segments(to_pt(mm_from_f64(total)))
                .into_iter()
                .map(|(start, end)| {
                    let start = mm_to_f64(pt(start));
                    let end = mm_to_f64(pt(end));
                    let mut dash_points = vec![point_along(points, &lengths, start)];
                    let mut walked = 0.0;
                    for (index, length) in lengths.iter().enumerate() {
                        walked += length;
                        if walked > start && walked < end {
                            dash_points.push(points[index + 1]);
                        }
                    }
                    dash_points.push(point_along(points, &lengths, end));
                    dash_points
                })
                .collect()
        }
    };

    let style = Style::new().with_color(stroke.color);
    for offset in hairline_offsets(stroke.width) {
        let offset = mm_to_f64(pt(offset));
        for piece in &pieces {
            area.draw_line(offset_polyline(piece, offset), style);
        }
    }
}

fn distance(a: Position, b: Position) -> f64 {
    let dx = mm_to_f64(b.x - a.x);
    let dy = mm_to_f64(b.y - a.y);
    dx.hypot(dy)
}

/// Point at `offset` millimeters along the polyline.
fn point_along(points: &[Position], lengths: &[f64], offset: f64) -> Position {
    let mut remaining = offset;
    for (index, length) in lengths.iter().enumerate() {
        if remaining <= *length {
            let ratio = if *length > 0.0 { remaining / length } else { 0.0 };
            let from = points[index];
            let to = points[index + 1];
            return Position::new(
                from.x + (to.x - from.x) * ratio,
                from.y + (to.y - from.y) * ratio,
            );
        }
        remaining -= length;
    }
    points[points.len() - 1]
}

/// Horizontal line across the content width, optionally reaching into the margins.
pub struct HorizontalRule {
    rule: Rule,
}

impl HorizontalRule {
    pub fn new(rule: Rule) -> Self {
        Self { rule }
    }
}

impl Element for HorizontalRule {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let thickness = pt(self.rule.stroke.width);
        let mut result = RenderResult::default();
        if thickness > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let overhang = pt(self.rule.overhang);
        let y = thickness / 2.0;
        stroke_polyline(
            &area,
            &[
                Position::new(Mm::default() - overhang, y),
                Position::new(area.size().width + overhang, y),
            ],
            &self.rule.stroke,
        );

        result.size = Size::new(area.size().width, thickness);
        Ok(result)
    }
}

fn role_family(role: FontRole, fonts: &InstalledFonts) -> Option<FontFamily<Font>> {
    match role {
        FontRole::Body => None,
        FontRole::Monospace => Some(fonts.monospace),
    }
}

/// Builds a `genpdf` paragraph from rich text.
pub fn paragraph_from(rich: &RichParagraph, fonts: &InstalledFonts) -> Paragraph {
    let text_style = rich.style();
    let mut base = Style::new()
        .with_font_size(text_style.font.size)
        .with_color(text_style.color)
        .with_line_spacing(1.0 + text_style.leading / f64::from(text_style.font.size.max(1)));
    if let Some(family) = role_family(text_style.font.role, fonts) {
        base = base.with_font_family(family);
    }
    if text_style.bold {
        base.set_bold();
    }

    let mut paragraph = Paragraph::default();
    for span in rich.spans() {
        let mut style = base.and(span.to_style());
        if span.is_monospace() {
            style = style.with_font_family(fonts.monospace);
        }
        paragraph.push(StyledString::new(span.text().to_owned(), style));
    }
    paragraph.set_alignment(alignment(rich.alignment()));
    paragraph
}

/// Paragraph introduced by a bullet hanging in its indentation.
pub struct BulletParagraph {
    paragraph: Paragraph,
    indent: Mm,
    style: Style,
    bullet_drawn: bool,
}

impl BulletParagraph {
    pub fn new(rich: &RichParagraph, fonts: &InstalledFonts) -> Self {
        let text_style = rich.style();
        Self {
            paragraph: paragraph_from(rich, fonts),
            indent: pt(rich.indent()),
            style: Style::new()
                .with_font_size(text_style.font.size)
                .with_color(text_style.color),
            bullet_drawn: false,
        }
    }
}

impl Element for BulletParagraph {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let bullet_style = style.and(self.style);
        area.add_margins(Margins::trbl(0, 0, 0, self.indent));

        if !self.bullet_drawn {
            if !area.print_str(&context.font_cache, Position::default(), bullet_style, BULLET)? {
                let mut result = RenderResult::default();
                result.has_more = true;
                return Ok(result);
            }
            self.bullet_drawn = true;
        }

        let bullet_width = bullet_style.str_width(&context.font_cache, BULLET) + pt(BULLET_GAP);
        area.add_margins(Margins::trbl(0, 0, 0, bullet_width));
        let mut result = self.paragraph.render(context, area, style)?;
        result.size.width += self.indent + bullet_width;
        Ok(result)
    }
}

/// Monospace listing laid out line by line.
///
/// Lines are never re-flowed; only lines wider than the area are broken.  Each character is set
/// in the first font of the chain whose glyph table covers it.
pub struct SourceListing {
    listing: Listing,
    chain: Vec<FontFamily<Font>>,
    lines: Option<Vec<Vec<(usize, String)>>>,
    next_line: usize,
}

impl SourceListing {
    pub fn new(listing: Listing, fonts: &InstalledFonts) -> Self {
        let chain = fonts.listing_chain(&listing.fallbacks);
        Self {
            listing,
            chain,
            lines: None,
            next_line: 0,
        }
    }

    fn style(&self, index: usize) -> Style {
        let family = self.chain.get(index).or(self.chain.first()).copied();
        let mut style = Style::new()
            .with_font_size(self.listing.size)
            .with_color(self.listing.color);
        if let Some(family) = family {
            style = style.with_font_family(family);
        }
        style
    }

    fn layout(&self, context: &genpdf::Context, width: Mm) -> Vec<Vec<(usize, String)>> {
        let coverages: Vec<GlyphCoverage<'_>> = self
            .chain
            .iter()
            .map(|family| GlyphCoverage::of(&context.font_cache, family.regular))
            .collect();
        let mut lines = Vec::new();

        for source_line in self.listing.text.split('\n') {
            let mut line: Vec<(usize, String)> = Vec::new();
            let mut line_width = Mm::default();

            for (index, run) in split_by_coverage(source_line, &coverages) {
                let style = self.style(index);
                for c in run.chars() {
                    let char_width = style.char_width(&context.font_cache, c);
                    if line_width + char_width > width && !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                        line_width = Mm::default();
                    }
                    match line.last_mut() {
                        Some((current, text)) if *current == index => text.push(c),
                        _ => line.push((index, c.to_string())),
                    }
                    line_width += char_width;
                }
            }
            lines.push(line);
        }
        lines
    }
}

impl Element for SourceListing {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        if self.lines.is_none() {
            self.lines = Some(self.layout(context, area.size().width));
        }
        let line_height = style.and(self.style(0)).line_height(&context.font_cache);

        let mut result = RenderResult::default();
        let mut y = Mm::default();
        let lines = self.lines.as_deref().unwrap_or_default();

        while let Some(line) = lines.get(self.next_line) {
            if y + line_height > area.size().height {
                result.has_more = true;
                break;
            }

            let mut x = Mm::default();
            for (index, run) in line {
                let run_style = style.and(self.style(*index));
                area.print_str(&context.font_cache, Position::new(x, y), run_style, run)?;
                x += run_style.str_width(&context.font_cache, run);
            }

            y += line_height;
            self.next_line += 1;
        }

        result.size = Size::new(area.size().width, y);
        Ok(result)
    }
}

/// Free-form drawing occupying the rest of the page.
///
/// Shapes use points with the origin at the bottom-left corner of the area and y growing
/// upwards.  Dashes are split into segments and fills are painted with dense strokes.
pub struct DrawingArea {
    drawing: Drawing,
    monospace: FontFamily<Font>,
    deferred: bool,
}

impl DrawingArea {
    pub fn new(drawing: Drawing, fonts: &InstalledFonts) -> Self {
        Self {
            drawing,
            monospace: fonts.monospace,
            deferred: false,
        }
    }
}

struct Canvas<'c, 'a> {
    context: &'c genpdf::Context,
    area: &'c render::Area<'a>,
    style: Style,
    monospace: FontFamily<Font>,
    width: f64,
    height: f64,
}

impl Canvas<'_, '_> {
    fn position(&self, point: Point) -> Position {
        Position::new(pt(point.x), pt(self.height - point.y))
    }

    fn polyline(&self, points: &[Point], stroke: &Stroke) {
        let positions: Vec<Position> = points.iter().map(|point| self.position(*point)).collect();
        stroke_polyline(self.area, &positions, stroke);
    }

    fn circle_points(center: Point, radius: f64) -> Vec<Point> {
        (0..=CIRCLE_SEGMENTS)
            .map(|step| {
                let angle = 2.0 * PI * step as f64 / CIRCLE_SEGMENTS as f64;
                Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
            })
            .collect()
    }

    fn fill_stroke(color: Color) -> Stroke {
        Stroke {
            width: HAIRLINE_WIDTH,
            dash: None,
            color,
            cap: CapStyle::default(),
            join: JoinStyle::default(),
        }
    }

    fn draw(&self, shape: &Shape) -> Result<(), Error> {
        match shape {
            Shape::Line { from, to, stroke } => self.polyline(&[*from, *to], stroke),
            Shape::Polygon { points, stroke } => {
                let mut closed = points.clone();
                if let Some(first) = points.first() {
                    closed.push(*first);
                }
                self.polyline(&closed, stroke);
            }
            Shape::Circle {
                center,
                radius,
                paint,
            } => match paint {
                Paint::Stroke(stroke) => {
                    self.polyline(&Self::circle_points(*center, *radius), stroke)
                }
                Paint::Fill(color) => {
                    let stroke = Self::fill_stroke(*color);
                    let mut ring = *radius - HAIRLINE_WIDTH / 2.0;
                    while ring > 0.0 {
                        self.polyline(&Self::circle_points(*center, ring), &stroke);
                        ring -= FILL_STEP;
                    }
                    self.polyline(&Self::circle_points(*center, FILL_STEP / 2.0), &stroke);
                }
            },
            Shape::Rectangle {
                top_left,
                width,
                height,
                paint,
            } => {
                let (left, top) = (top_left.x, top_left.y);
                match paint {
                    Paint::Stroke(stroke) => self.polyline(
                        &[
                            Point::new(left, top),
                            Point::new(left + width, top),
                            Point::new(left + width, top - height),
                            Point::new(left, top - height),
                            Point::new(left, top),
                        ],
                        stroke,
                    ),
                    Paint::Fill(color) => {
                        let stroke = Self::fill_stroke(*color);
                        let mut y = top - HAIRLINE_WIDTH / 2.0;
                        while y > top - height {
                            self.polyline(&[Point::new(left, y), Point::new(left + width, y)], &stroke);
                            y -= FILL_STEP;
                        }
                    }
                }
            }
            Shape::Text {
                text,
                at,
                size,
                role,
                color,
            } => {
                let mut style = self.style.and(Style::new().with_font_size(*size).with_color(*color));
                if *role == FontRole::Monospace {
                    style = style.with_font_family(self.monospace);
                }
                let ascent = style.font(&self.context.font_cache).glyph_height(*size);
                let baseline = self.position(*at);
                let top = Position::new(baseline.x, baseline.y - ascent);
                self.area.print_str(&self.context.font_cache, top, style, text)?;
            }
            Shape::Axis(axis) => self.axis(axis)?,
        }
        Ok(())
    }

    fn axis(&self, axis: &AxisSpec) -> Result<(), Error> {
        for shape in axis.expand(self.width, self.height) {
            self.draw(&shape)?;
        }
        Ok(())
    }
}

impl Element for DrawingArea {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let size = area.size();
        let height = to_pt(size.height);

        if height < MIN_DRAWING_HEIGHT && !self.deferred {
            self.deferred = true;
            // Same footprint as `PageBreak` so the page is not considered empty.
            let mut result = RenderResult::default();
            result.size = Size::new(1, 0);
            result.has_more = true;
            return Ok(result);
        }

        let canvas = Canvas {
            context,
            area: &area,
            style,
            monospace: self.monospace,
            width: to_pt(size.width),
            height,
        };
        for shape in self.drawing.shapes() {
            canvas.draw(shape)?;
        }

        let mut result = RenderResult::default();
        result.size = size;
        Ok(result)
    }
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// An image with an optional caption stacked underneath.
///
/// The image and the caption share the same alignment and the image can be rescaled to a specific
/// width while keeping the aspect ratio.
pub struct CaptionedImage {
    image: Image,
    caption: Option<Paragraph>,
    natural_size: Size,
    spacing: Mm,
}

impl CaptionedImage {
    /// Decodes the image of `block` and prepares its caption.
    pub fn from_block(block: &ImageBlock, fonts: &InstalledFonts) -> Result<Self, Error> {
        let dynamic = match block.source() {
            ImageSource::Bytes(bytes) => decode_image_from_bytes(bytes)?,
            ImageSource::Path(path) => decode_image_from_path(path)?,
        };
        let natural_size = estimated_image_size(&dynamic, DEFAULT_IMAGE_DPI);
        let mut image = Image::from_dynamic_image(dynamic)?;
        let mut caption = block.caption().map(|caption| paragraph_from(caption, fonts));

        let align = alignment(block.alignment());
        image.set_alignment(align);
        if let Some(caption) = caption.as_mut() {
            caption.set_alignment(align);
        }

        if let Some(width) = block.width() {
            let natural = mm_to_f64(natural_size.width);
            if natural > f64::EPSILON {
                let scale = mm_to_f64(pt(width)) / natural;
                image.set_scale(Scale::new(scale, scale));
            }
        }

        Ok(Self {
            image,
            caption,
            natural_size,
            spacing: mm_from_f64(DEFAULT_CAPTION_SPACING_MM),
        })
    }

    /// Size of the image at its nominal resolution, before scaling.
    pub fn natural_size(&self) -> Size {
        self.natural_size
    }
}

impl Element for CaptionedImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let image_result = self.image.render(context, area.clone(), style)?;
        result.size = result.size.stack_vertical(image_result.size);
        result.has_more |= image_result.has_more;

        let Some(caption) = self.caption.as_mut() else {
            return Ok(result);
        };

        let spacing = self.spacing;
        area.add_offset(Position::new(0, image_result.size.height + spacing));
        result.size = result.size.stack_vertical(Size::new(0, spacing));

        let caption_result = caption.render(context, area, style)?;
        result.size = result.size.stack_vertical(caption_result.size);
        result.has_more |= caption_result.has_more;

        Ok(result)
    }
}
