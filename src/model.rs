//! Laid-out content of a manual.
//!
//! A [`Manual`](crate::manual::Manual) does not talk to `genpdf` directly.  It appends
//! [`Block`]s to a flat list which [`ManualBuilder`](crate::builder::ManualBuilder) converts
//! into elements afterwards.  Outline destinations are resolved to physical pages only once the
//! document has been paginated.
//!
//! All lengths in this module are PostScript points.

use genpdf::style::Color;

use crate::outline::AnchorId;
use crate::richtext::Span;
use crate::style::{Dash, FontRole, FontSpec, Stroke, BLACK};

/// Horizontal alignment of paragraphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Font and spacing attributes of a paragraph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: FontSpec,
    pub bold: bool,
    pub color: Color,
    /// Extra space between lines.
    pub leading: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            bold: false,
            color: BLACK,
            leading: 0.0,
        }
    }
}

/// Rich text paragraph carrying inline styling information.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
    style: TextStyle,
    indent: f64,
}

impl RichParagraph {
    /// Creates a left-aligned paragraph in the baseline text style.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Concatenated text of all spans.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Left indentation of the paragraph.
    pub fn indent(&self) -> f64 {
        self.indent
    }

    /// Sets the alignment and returns the updated paragraph.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the text style and returns the updated paragraph.
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the left indentation and returns the updated paragraph.
    pub fn with_indent(mut self, indent: f64) -> Self {
        self.indent = indent;
        self
    }
}

/// Verbatim source text set in the monospace family.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    /// Source text with spaces already replaced by non-breaking spaces.
    pub text: String,
    pub size: u8,
    pub color: Color,
    /// Names of the fallback families consulted for glyphs the monospace font lacks.
    pub fallbacks: Vec<String>,
}

/// Full-width horizontal line in the text flow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rule {
    /// How far the line extends past the content edges on both sides.
    pub overhang: f64,
    pub stroke: Stroke,
}

impl Rule {
    /// Returns whether the rule is drawn with a dash pattern.
    pub fn is_dashed(&self) -> bool {
        self.stroke.dash.is_some()
    }
}

/// A point in drawing coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// How a closed shape is painted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Stroke(Stroke),
    Fill(Color),
}

/// Coordinate rulers drawn by `stroke_axis`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisSpec {
    /// Length of the x axis; the drawing width when unset.
    pub width: Option<f64>,
    /// Length of the y axis; the drawing height minus [`AxisSpec::TOP_CLEARANCE`] when unset.
    pub height: Option<f64>,
    /// Stroke of the rulers, which are always dotted.  The default stroke when unset.
    pub stroke: Option<Stroke>,
}

impl AxisSpec {
    /// Distance between two ticks.
    pub const TICK_SPACING: f64 = 100.0;
    /// How far the axes reach behind the origin.
    pub const OVERSHOOT: f64 = 21.0;
    /// Space kept free above the y axis when its height is derived from the drawing.
    pub const TOP_CLEARANCE: f64 = 20.0;
    /// Font size of the tick labels.
    pub const LABEL_SIZE: u8 = 7;
    /// Longest axis drawn; PDF pages are at most 14 400 points wide or high.
    pub const MAX_LENGTH: f64 = 14_400.0;

    /// Sets the x axis length and returns the updated spec.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the y axis length and returns the updated spec.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    /// Length of one axis.  Overrides that are negative or not finite fall back to the length
    /// derived from the drawing; the result lies in `0..=MAX_LENGTH`.
    fn length(requested: Option<f64>, derived: f64) -> f64 {
        let length = requested
            .filter(|length| length.is_finite() && *length >= 0.0)
            .unwrap_or(derived);
        if length.is_finite() {
            length.clamp(0.0, Self::MAX_LENGTH).trunc()
        } else {
            0.0
        }
    }

    /// Resolves the rulers into plain shapes for a drawing of the given size.
    pub fn expand(&self, drawing_width: f64, drawing_height: f64) -> Vec<Shape> {
        let width = Self::length(self.width, drawing_width);
        let height = Self::length(self.height, drawing_height - Self::TOP_CLEARANCE);

        let axis_stroke = Stroke {
            dash: Some(Dash::new(1.0).with_space(4.0)),
            ..self
                .stroke
                .unwrap_or_else(|| crate::style::StyleContext::default().stroke())
        };

        let mut shapes = vec![
            Shape::Line {
                from: Point::new(-Self::OVERSHOOT, 0.0),
                to: Point::new(width, 0.0),
                stroke: axis_stroke,
            },
            Shape::Line {
                from: Point::new(0.0, -Self::OVERSHOOT),
                to: Point::new(0.0, height),
                stroke: axis_stroke,
            },
            marker(Point::new(0.0, 0.0)),
        ];

        for tick in ticks(width) {
            shapes.push(marker(Point::new(tick, 0.0)));
            shapes.push(label(tick, Point::new(tick - 5.0, -10.0)));
        }

        for tick in ticks(height) {
            shapes.push(marker(Point::new(0.0, tick)));
            shapes.push(label(tick, Point::new(-17.0, tick - 2.0)));
        }

        shapes
    }
}

fn ticks(limit: f64) -> impl Iterator<Item = f64> {
    // Saturating cast: NaN and negative limits give no ticks.
    let count = (limit / AxisSpec::TICK_SPACING).floor() as u32;
    (1..=count).map(|step| f64::from(step) * AxisSpec::TICK_SPACING)
}

fn marker(center: Point) -> Shape {
    Shape::Circle {
        center,
        radius: 1.0,
        paint: Paint::Fill(BLACK),
    }
}

fn label(value: f64, at: Point) -> Shape {
    Shape::Text {
        text: format!("{value}"),
        at,
        size: AxisSpec::LABEL_SIZE,
        role: FontRole::Body,
        color: BLACK,
    }
}

/// Vector content of a drawing.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f64,
        paint: Paint,
    },
    /// Axis-aligned rectangle anchored at its top-left corner.
    Rectangle {
        top_left: Point,
        width: f64,
        height: f64,
        paint: Paint,
    },
    /// Single line of text whose baseline starts at `at`.
    Text {
        text: String,
        at: Point,
        size: u8,
        role: FontRole,
        color: Color,
    },
    Axis(AxisSpec),
}

/// A group of shapes occupying the rest of the page below the text flow.
///
/// The origin sits at the bottom-left corner of the area the drawing receives, x grows to the
/// right and y grows upwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Drawing {
    shapes: Vec<Shape>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

/// Representation of image sources supported by the content model.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Image loaded from raw bytes.
    Bytes(Vec<u8>),
    /// Image referenced by a file path.
    Path(String),
}

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

/// Image placed in the text flow, optionally captioned.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlock {
    source: ImageSource,
    caption: Option<RichParagraph>,
    alignment: HorizontalAlignment,
    width: Option<f64>,
}

impl ImageBlock {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            caption: None,
            alignment: HorizontalAlignment::Left,
            width: None,
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn caption(&self) -> Option<&RichParagraph> {
        self.caption.as_ref()
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Requested rendered width, if any.
    pub fn width(&self) -> Option<f64> {
        self.width
    }

    pub fn with_caption(mut self, caption: impl Into<Option<RichParagraph>>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Constrains the rendered width while keeping the aspect ratio.
    pub fn with_width(mut self, width: impl Into<Option<f64>>) -> Self {
        self.width = width.into();
        self
    }
}

/// Individual units of laid-out content.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(RichParagraph),
    /// Paragraph preceded by a bullet, indented by the paragraph indent.
    Bullet(RichParagraph),
    Listing(Listing),
    Rule(Rule),
    /// Vertical gap.
    Spacer(f64),
    Drawing(Drawing),
    Image(ImageBlock),
    /// Zero-size marker recording the page it ends up on.
    Anchor(AnchorId),
    PageBreak,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(shapes: &[Shape]) -> Vec<String> {
        shapes
            .iter()
            .filter_map(|shape| match shape {
                Shape::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn axis_fills_drawing_by_default() {
        let shapes = AxisSpec::default().expand(450.5, 300.0);
        // 100..=400 on x, 100..=200 on y (300 - 20 clearance).
        assert_eq!(labels(&shapes), vec!["100", "200", "300", "400", "100", "200"]);

        match &shapes[0] {
            Shape::Line { from, to, stroke } => {
                assert_eq!(*from, Point::new(-21.0, 0.0));
                assert_eq!(*to, Point::new(450.0, 0.0));
                assert_eq!(stroke.dash, Some(Dash::new(1.0).with_space(4.0)));
            }
            other => panic!("expected x axis, got {other:?}"),
        }
    }

    #[test]
    fn axis_respects_overrides() {
        let shapes = AxisSpec::default()
            .with_width(150.0)
            .with_height(99.0)
            .expand(500.0, 500.0);
        assert_eq!(labels(&shapes), vec!["100"]);
    }

    #[test]
    fn axis_keeps_the_stroke_but_forces_dots() {
        let stroke = Stroke {
            width: 3.0,
            color: Color::Rgb(200, 0, 0),
            ..crate::style::StyleContext::default().stroke()
        };
        let shapes = AxisSpec::default().with_stroke(stroke).expand(200.0, 200.0);
        for axis in &shapes[..2] {
            match axis {
                Shape::Line { stroke: drawn, .. } => {
                    assert_eq!(drawn.width, 3.0);
                    assert_eq!(drawn.color, Color::Rgb(200, 0, 0));
                    assert_eq!(drawn.dash, Some(Dash::new(1.0).with_space(4.0)));
                }
                other => panic!("expected an axis line, got {other:?}"),
            }
        }
    }

    #[test]
    fn unusable_axis_lengths_fall_back_to_the_drawing() {
        let shapes = AxisSpec::default()
            .with_width(f64::INFINITY)
            .with_height(f64::NAN)
            .expand(250.0, 220.0);
        assert_eq!(labels(&shapes), vec!["100", "200", "100", "200"]);

        let shapes = AxisSpec::default().with_width(-50.0).expand(120.0, 10.0);
        assert_eq!(labels(&shapes), vec!["100"]);
        match &shapes[1] {
            Shape::Line { to, .. } => assert_eq!(*to, Point::new(0.0, 0.0)),
            other => panic!("expected y axis, got {other:?}"),
        }

        let shapes = AxisSpec::default().with_width(1e300).expand(0.0, 0.0);
        assert_eq!(labels(&shapes).len(), 144);
    }

    #[test]
    fn axis_label_positions() {
        let shapes = AxisSpec::default().with_width(100.0).with_height(100.0).expand(0.0, 0.0);
        let positions: Vec<Point> = shapes
            .iter()
            .filter_map(|shape| match shape {
                Shape::Text { at, .. } => Some(*at),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![Point::new(95.0, -10.0), Point::new(-17.0, 98.0)]);
    }

    #[test]
    fn paragraph_plain_text_joins_spans() {
        let paragraph = RichParagraph::new(vec![Span::new("a "), Span::new("b").bold()]);
        assert_eq!(paragraph.plain_text(), "a b");
    }
}
