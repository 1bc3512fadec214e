//! Text and graphics state carried by a [`Manual`](crate::manual::Manual) while it lays out
//! content.
//!
//! Every block and shape captures the relevant part of the [`StyleContext`] at the moment it is
//! created, so later changes never leak backwards.  [`StyleContext::reset`] restores the fixed
//! baseline the manual returns to after each example.

use genpdf::style::Color;

/// Pure black, the baseline fill and stroke color.
pub const BLACK: Color = Color::Rgb(0, 0, 0);

/// Grey used for the folder part of example header lines.
pub const FOLDER_GREY: Color = Color::Rgb(0x99, 0x99, 0x99);

/// Font size of the baseline body text.
pub const BASELINE_FONT_SIZE: u8 = 12;

/// Line width (in points) of the baseline stroke.
pub const BASELINE_LINE_WIDTH: f64 = 1.0;

/// The font families known to the manual.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontRole {
    /// Proportional body font.
    #[default]
    Body,
    /// Fixed-width font used for listings.
    Monospace,
}

/// Font selection: a family role and a size in points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSpec {
    /// Family used for new text.
    pub role: FontRole,
    /// Size in points.
    pub size: u8,
}

impl FontSpec {
    /// Creates a font selection.
    pub fn new(role: FontRole, size: u8) -> Self {
        Self { role, size }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(FontRole::Body, BASELINE_FONT_SIZE)
    }
}

/// Shape drawn at the open ends of stroked lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CapStyle {
    #[default]
    Butt,
    Round,
    ProjectingSquare,
}

/// Shape drawn where two stroked segments meet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinStyle {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// A dash pattern in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dash {
    /// Length of each painted dash.
    pub length: f64,
    /// Gap between two dashes.
    pub space: f64,
    /// Offset into the pattern at which the line starts.
    pub phase: f64,
}

impl Dash {
    /// Creates a pattern whose gaps are as long as its dashes.
    pub fn new(length: f64) -> Self {
        Self {
            length,
            space: length,
            phase: 0.0,
        }
    }

    /// Sets the gap length and returns the updated pattern.
    pub fn with_space(mut self, space: f64) -> Self {
        self.space = space;
        self
    }

    /// Sets the phase and returns the updated pattern.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Splits a line of the given length into the painted `(start, end)` intervals.
    ///
    /// A non-positive dash length degenerates into a solid line.
    pub fn segments(&self, length: f64) -> Vec<(f64, f64)> {
        if length <= 0.0 {
            return Vec::new();
        }
        if self.length <= 0.0 {
            return vec![(0.0, length)];
        }

        let period = self.length + self.space.max(0.0);
        let mut segments = Vec::new();
        let mut start = -(self.phase.rem_euclid(period));
        while start < length {
            let end = (start + self.length).min(length);
            if end > 0.0 {
                segments.push((start.max(0.0), end));
            }
            start += period;
        }
        segments
    }
}

/// Stroke attributes captured by lines, rules and outlined shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub dash: Option<Dash>,
    pub color: Color,
    pub cap: CapStyle,
    pub join: JoinStyle,
}

/// The mutable drawing state of a manual.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleContext {
    font: FontSpec,
    line_width: f64,
    cap_style: CapStyle,
    join_style: JoinStyle,
    dash: Option<Dash>,
    fill_color: Color,
    stroke_color: Color,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            line_width: BASELINE_LINE_WIDTH,
            cap_style: CapStyle::Butt,
            join_style: JoinStyle::Miter,
            dash: None,
            fill_color: BLACK,
            stroke_color: BLACK,
        }
    }
}

impl StyleContext {
    /// Creates a context holding the baseline settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the baseline settings.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns whether every setting equals the baseline.
    pub fn is_baseline(&self) -> bool {
        *self == Self::default()
    }

    pub fn font(&self) -> FontSpec {
        self.font
    }

    pub fn set_font(&mut self, font: FontSpec) {
        self.font = font;
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    pub fn cap_style(&self) -> CapStyle {
        self.cap_style
    }

    pub fn set_cap_style(&mut self, cap: CapStyle) {
        self.cap_style = cap;
    }

    pub fn join_style(&self) -> JoinStyle {
        self.join_style
    }

    pub fn set_join_style(&mut self, join: JoinStyle) {
        self.join_style = join;
    }

    pub fn dash(&self) -> Option<Dash> {
        self.dash
    }

    pub fn set_dash(&mut self, dash: Option<Dash>) {
        self.dash = dash;
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
    }

    /// Snapshot of the current stroke attributes.
    pub fn stroke(&self) -> Stroke {
        Stroke {
            width: self.line_width,
            dash: self.dash,
            color: self.stroke_color,
            cap: self.cap_style,
            join: self.join_style,
        }
    }
}

/// Parses a `RRGGBB` hexadecimal color, with or without a leading `#`.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
