//! Glyph coverage queries used to pick a font per character.

use std::fmt;

use genpdf::fonts::{Font, FontCache};

/// Answers whether a font has a glyph for a character.
pub trait Coverage {
    fn covers(&self, c: char) -> bool;
}

impl<C: Coverage + ?Sized> Coverage for &C {
    fn covers(&self, c: char) -> bool {
        (**self).covers(c)
    }
}

/// Character map of a font registered with a document.
///
/// Borrows the `rusttype` face `genpdf` parsed when the font was added, so each font file is
/// parsed once.
#[derive(Clone, Copy)]
pub struct GlyphCoverage<'f> {
    font: &'f rusttype::Font<'static>,
}

impl<'f> GlyphCoverage<'f> {
    pub fn new(font: &'f rusttype::Font<'static>) -> Self {
        Self { font }
    }

    /// Coverage of `font` as loaded in the rendering context's font cache.
    pub fn of(cache: &'f FontCache, font: Font) -> Self {
        Self::new(cache.get_rt_font(font))
    }
}

impl Coverage for GlyphCoverage<'_> {
    fn covers(&self, c: char) -> bool {
        // Glyph 0 is `.notdef`.
        self.font.glyph(c).id().0 != 0
    }
}

impl fmt::Debug for GlyphCoverage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphCoverage")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

/// Splits `text` into runs that can each be set in one font of `chain`.
///
/// Each character goes to the first font covering it, or to the first font when none does.
/// Whitespace stays in the current run.  Returns `(index into chain, text)` pairs.
pub fn split_by_coverage<C: Coverage>(text: &str, chain: &[C]) -> Vec<(usize, String)> {
    let mut runs: Vec<(usize, String)> = Vec::new();

    for c in text.chars() {
        let index = match runs.last() {
            Some((current, _)) if c.is_whitespace() => *current,
            _ => chain
                .iter()
                .position(|font| font.covers(c))
                .unwrap_or(0),
        };

        match runs.last_mut() {
            Some((current, run)) if *current == index => run.push(c),
            _ => runs.push((index, c.to_string())),
        }
    }

    runs
}
