//! Font loading for manual rendering.
//!
//! A manual needs three kinds of fonts: the Roboto body family, a fixed-width font for listings
//! and, optionally, fallback fonts that supply glyphs the fixed-width font lacks (DejaVu Sans for
//! most scripts and AR PL KaitiM GB for CJK).  All of them are looked up in a single font
//! directory.

mod coverage;

pub use coverage::{split_by_coverage, Coverage, GlyphCoverage};

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{Font, FontData, FontFamily};
use genpdf::Document;
use log::{debug, warn};

/// Environment variable overriding the font directory.
pub const FONTS_DIR_ENV: &str = "PDF_MANUAL_FONTS_DIR";

/// Name of the body font family.
pub const BODY_FONT_FAMILY_NAME: &str = "Roboto";

/// File of the fixed-width listing font.
pub const MONOSPACE_FONT_FILE: &str = "DejaVuSansMono.ttf";

const BODY_FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// A font consulted for glyphs the listing font does not cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackFont {
    pub name: &'static str,
    pub file: &'static str,
}

/// Fallback fonts in the order they are consulted.
pub const FALLBACK_FONTS: [FallbackFont; 2] = [
    FallbackFont {
        name: "DejaVu",
        file: "DejaVuSans.ttf",
    },
    FallbackFont {
        name: "Kai",
        file: "gkai00mp.ttf",
    },
];

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn missing_font_files(path: &Path) -> Vec<&'static str> {
    BODY_FONT_FILES
        .iter()
        .chain(std::iter::once(&MONOSPACE_FONT_FILE))
        .copied()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

/// Finds the first candidate directory holding every required font.
pub fn resolve_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!(
                "{} (directory missing)",
                candidate.display()
            ));
            continue;
        }

        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate the manual fonts. Checked: {}. See assets/fonts/README.md or set {}.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

/// Indicates whether the required fonts can be found.
pub fn fonts_available() -> bool {
    resolve_font_directory().is_ok()
}

fn read_font(path: &Path) -> Result<FontData, Error> {
    let bytes = fs::read(path).map_err(|err| {
        Error::new(format!("Failed to read font file {}", path.display()), err)
    })?;
    FontData::new(bytes, None).map_err(|err| {
        Error::new(
            format!("Font file {} is not a valid TrueType font: {}", path.display(), err),
            io::Error::new(io::ErrorKind::InvalidData, "invalid font data"),
        )
    })
}

fn single_face_family(data: FontData) -> FontFamily<FontData> {
    FontFamily {
        regular: data.clone(),
        bold: data.clone(),
        italic: data.clone(),
        bold_italic: data,
    }
}

struct LoadedFallback {
    name: &'static str,
    family: FontFamily<FontData>,
}

/// Font data read from disk, not yet attached to a document.
pub struct FontSet {
    directory: PathBuf,
    body: FontFamily<FontData>,
    monospace: FontFamily<FontData>,
    fallbacks: Vec<LoadedFallback>,
}

impl FontSet {
    /// Loads the fonts from the resolved font directory.
    pub fn load() -> Result<Self, Error> {
        let directory = resolve_font_directory()?;
        Self::load_from(&directory)
    }

    /// Loads the fonts from `directory`.  Missing fallback fonts are skipped with a warning.
    pub fn load_from(directory: &Path) -> Result<Self, Error> {
        let body = genpdf::fonts::from_files(directory, BODY_FONT_FAMILY_NAME, None).map_err(
            |err| {
                Error::new(
                    format!(
                        "Failed to load font family '{}' from {}: {}",
                        BODY_FONT_FAMILY_NAME,
                        directory.display(),
                        err
                    ),
                    io::Error::new(io::ErrorKind::Other, err.to_string()),
                )
            },
        )?;

        let monospace = read_font(&directory.join(MONOSPACE_FONT_FILE))?;

        let mut fallbacks = Vec::new();
        for fallback in FALLBACK_FONTS {
            let path = directory.join(fallback.file);
            if !path.is_file() {
                warn!(
                    "Fallback font {} not found at {}; listings may miss glyphs",
                    fallback.name,
                    path.display()
                );
                continue;
            }
            match read_font(&path) {
                Ok(data) => fallbacks.push(LoadedFallback {
                    name: fallback.name,
                    family: single_face_family(data),
                }),
                Err(err) => warn!("Skipping fallback font {}: {}", fallback.name, err),
            }
        }

        debug!(
            "Loaded fonts from {} ({} fallbacks)",
            directory.display(),
            fallbacks.len()
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            body,
            monospace: single_face_family(monospace),
            fallbacks,
        })
    }

    /// Directory the fonts were read from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Names of the fallback fonts that were found, in lookup order.
    pub fn fallback_names(&self) -> Vec<&'static str> {
        self.fallbacks.iter().map(|fallback| fallback.name).collect()
    }

    /// Creates a document using the body family as its default and registers the other fonts.
    pub fn into_document(self) -> (Document, InstalledFonts) {
        let mut document = Document::new(self.body);
        let monospace = document.add_font_family(self.monospace);
        let fallbacks = self
            .fallbacks
            .into_iter()
            .map(|fallback| InstalledFallback {
                name: fallback.name,
                family: document.add_font_family(fallback.family),
            })
            .collect();

        (
            document,
            InstalledFonts {
                monospace,
                fallbacks,
            },
        )
    }
}

/// A fallback font registered with a document.
#[derive(Clone, Debug)]
pub struct InstalledFallback {
    pub name: &'static str,
    pub family: FontFamily<Font>,
}

/// Fonts registered with a document beyond its default body family.
#[derive(Clone, Debug)]
pub struct InstalledFonts {
    pub monospace: FontFamily<Font>,
    pub fallbacks: Vec<InstalledFallback>,
}

impl InstalledFonts {
    /// Font chain for a listing: the monospace family followed by the named fallbacks that are
    /// installed, in the order given.
    pub fn listing_chain<S: AsRef<str>>(&self, fallbacks: &[S]) -> Vec<FontFamily<Font>> {
        let mut chain = vec![self.monospace];
        for name in fallbacks {
            if let Some(fallback) = self
                .fallbacks
                .iter()
                .find(|fallback| fallback.name == name.as_ref())
            {
                chain.push(fallback.family);
            }
        }
        chain
    }
}
