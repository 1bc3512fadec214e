//! Inline markup used by introduction texts, package intros and list items.
//!
//! The markup is deliberately small:
//!
//! - `**bold**` for bold text
//! - `*italic*` for italic text
//! - `` `code` `` for text set in the monospace family
//! - `[color=#RRGGBB]{text}` for colored text
//!
//! Parsing produces [`Span`]s, which the rendering layer turns into `genpdf` styled strings once
//! the font families are known.

use genpdf::style::{Color, Style};
use log::warn;
use thiserror::Error;

use crate::style::parse_hex_color;

const COLOR_OPEN: &str = "[color=#";
const COLOR_BODY: &str = "]{";

/// Inline attributes of a span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub bold: bool,
    pub italic: bool,
    pub monospace: bool,
    pub color: Option<Color>,
}

/// A run of text sharing one [`Emphasis`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    emphasis: Emphasis,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_emphasis(text, Emphasis::default())
    }

    pub fn with_emphasis(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn emphasis(&self) -> Emphasis {
        self.emphasis
    }

    pub fn is_bold(&self) -> bool {
        self.emphasis.bold
    }

    pub fn is_italic(&self) -> bool {
        self.emphasis.italic
    }

    /// Whether the span is set in the monospace family.
    pub fn is_monospace(&self) -> bool {
        self.emphasis.monospace
    }

    pub fn color(&self) -> Option<Color> {
        self.emphasis.color
    }

    pub fn bold(mut self) -> Self {
        self.emphasis.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.emphasis.italic = true;
        self
    }

    pub fn monospace(mut self) -> Self {
        self.emphasis.monospace = true;
        self
    }

    pub fn colored(mut self, color: Color) -> Self {
        self.emphasis.color = Some(color);
        self
    }

    /// `genpdf` style of the span.  The font family is left to the caller.
    pub fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.emphasis.color {
            style.set_color(color);
        }
        if self.emphasis.bold {
            style.set_bold();
        }
        if self.emphasis.italic {
            style.set_italic();
        }
        style
    }
}

/// Malformed markup, with the byte offset where it was detected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message} (at byte {offset})")]
pub struct MarkupError {
    offset: usize,
    message: String,
}

impl MarkupError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A marker that has been opened and not closed yet.
#[derive(Clone, Copy, Debug)]
enum Open {
    Bold,
    Italic,
    Color(Color),
}

impl Open {
    fn name(self) -> &'static str {
        match self {
            Open::Bold => "bold span",
            Open::Italic => "italic span",
            Open::Color(_) => "color span",
        }
    }
}

struct Scanner<'a> {
    input: &'a str,
    offset: usize,
    open: Vec<Open>,
    pending: String,
    spans: Vec<Span>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            open: Vec::new(),
            pending: String::new(),
            spans: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        let input = self.input;
        &input[self.offset..]
    }

    fn emphasis(&self) -> Emphasis {
        let mut emphasis = Emphasis::default();
        for marker in &self.open {
            match marker {
                Open::Bold => emphasis.bold = true,
                Open::Italic => emphasis.italic = true,
                Open::Color(color) => emphasis.color = Some(*color),
            }
        }
        emphasis
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.spans.push(Span::with_emphasis(text, self.emphasis()));
        }
    }

    /// Closes the innermost marker if `rest` starts with its closing token.
    fn try_close(&mut self) -> bool {
        let token = match self.open.last() {
            Some(Open::Bold) => "**",
            Some(Open::Italic) => "*",
            Some(Open::Color(_)) => "}",
            None => return false,
        };
        if !self.rest().starts_with(token) {
            return false;
        }
        self.flush();
        self.open.pop();
        self.offset += token.len();
        true
    }

    fn open(&mut self, marker: Open, token_len: usize) {
        self.flush();
        self.open.push(marker);
        self.offset += token_len;
    }

    fn code(&mut self) -> Result<(), MarkupError> {
        let start = self.offset + 1;
        let Some(len) = self.input[start..].find('`') else {
            return Err(MarkupError::new(self.offset, "unterminated code span"));
        };
        self.flush();
        let emphasis = Emphasis {
            monospace: true,
            ..self.emphasis()
        };
        self.spans
            .push(Span::with_emphasis(&self.input[start..start + len], emphasis));
        self.offset = start + len + 1;
        Ok(())
    }

    fn color(&mut self) -> Result<(), MarkupError> {
        let hex_start = self.offset + COLOR_OPEN.len();
        let hex = self.input.get(hex_start..hex_start + 6).ok_or_else(|| {
            MarkupError::new(hex_start, "incomplete color; expected 6 hexadecimal digits")
        })?;
        let color = parse_hex_color(hex).ok_or_else(|| {
            MarkupError::new(hex_start, "invalid RGB value; use hexadecimal digits only")
        })?;
        if !self.input[hex_start + 6..].starts_with(COLOR_BODY) {
            return Err(MarkupError::new(
                hex_start + 6,
                "expected `]{` to start the colored text",
            ));
        }
        self.open(Open::Color(color), COLOR_OPEN.len() + 6 + COLOR_BODY.len());
        Ok(())
    }

    fn run(mut self) -> Result<Vec<Span>, MarkupError> {
        while let Some(c) = self.rest().chars().next() {
            if self.try_close() {
                continue;
            }
            let rest = self.rest();
            if c == '`' {
                self.code()?;
            } else if rest.starts_with("**") {
                self.open(Open::Bold, 2);
            } else if c == '*' {
                self.open(Open::Italic, 1);
            } else if rest.starts_with("[color=") {
                if !rest.starts_with(COLOR_OPEN) {
                    return Err(MarkupError::new(
                        self.offset + "[color=".len(),
                        "expected `#` followed by a hexadecimal RGB value",
                    ));
                }
                self.color()?;
            } else if c == '}' {
                return Err(MarkupError::new(
                    self.offset,
                    "unexpected `}` without a matching `[color=...]`",
                ));
            } else {
                self.pending.push(c);
                self.offset += c.len_utf8();
            }
        }

        if let Some(marker) = self.open.last() {
            return Err(MarkupError::new(
                self.offset,
                format!("unterminated {}", marker.name()),
            ));
        }
        self.flush();
        Ok(self.spans)
    }
}

/// Parses inline markup into [`Span`]s.
pub fn parse_markup(input: &str) -> Result<Vec<Span>, MarkupError> {
    Scanner::new(input).run()
}

/// Parses the markup, or returns the input as one plain span and logs a warning when it is
/// malformed.
pub fn parse_markup_lossy(input: &str) -> Vec<Span> {
    parse_markup(input).unwrap_or_else(|err| {
        warn!("Rendering text as plain text, markup is invalid: {err}");
        vec![Span::new(input)]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_to_style_reflects_emphasis() {
        let style = Span::new("Hello")
            .bold()
            .italic()
            .colored(Color::Rgb(10, 20, 30))
            .to_style();
        assert!(style.is_bold());
        assert!(style.is_italic());
        assert_eq!(style.color(), Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn plain_text_is_one_span() {
        assert_eq!(parse_markup("Hello world").unwrap(), vec![Span::new("Hello world")]);
    }

    #[test]
    fn nested_markers_close_innermost_first() {
        let spans = parse_markup("This is **very *cool***!").unwrap();
        assert_eq!(
            spans,
            vec![
                Span::new("This is "),
                Span::new("very ").bold(),
                Span::new("cool").bold().italic(),
                Span::new("!"),
            ]
        );
    }

    #[test]
    fn code_spans_keep_markup_literal() {
        let spans = parse_markup("call `fill_circle(**x**)` now").unwrap();
        assert_eq!(
            spans,
            vec![
                Span::new("call "),
                Span::new("fill_circle(**x**)").monospace(),
                Span::new(" now"),
            ]
        );
    }

    #[test]
    fn code_inside_bold_stays_bold() {
        let spans = parse_markup("**use `x`**").unwrap();
        assert_eq!(spans[1], Span::new("x").bold().monospace());
    }

    #[test]
    fn color_applies_to_its_body_only() {
        let spans = parse_markup("[color=#999999]{folder/}file.rs").unwrap();
        assert_eq!(
            spans,
            vec![
                Span::new("folder/").colored(Color::Rgb(0x99, 0x99, 0x99)),
                Span::new("file.rs"),
            ]
        );
    }

    #[test]
    fn unterminated_bold_is_reported() {
        let err = parse_markup("**oops").unwrap_err();
        assert!(err.message().contains("unterminated bold"));
        assert_eq!(err.offset(), 6);
    }

    #[test]
    fn unterminated_code_points_at_backtick() {
        assert_eq!(parse_markup("see `this").unwrap_err().offset(), 4);
    }

    #[test]
    fn invalid_color_is_reported() {
        let err = parse_markup("[color=#12FG34]{x}").unwrap_err();
        assert!(err.message().contains("invalid RGB"));

        let err = parse_markup("[color=red]{x}").unwrap_err();
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn stray_closing_brace_is_reported() {
        assert!(parse_markup("a } b").is_err());
    }

    #[test]
    fn lossy_parse_keeps_text() {
        assert_eq!(parse_markup_lossy("2 * 3 = 6"), vec![Span::new("2 * 3 = 6")]);
    }
}
