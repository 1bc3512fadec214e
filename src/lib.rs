//! Builds a "by example" PDF manual from a tree of example sources.
//!
//! A [`Manual`] walks packages, sections and example files in document order and lays out one
//! page per example: a header line, the introduction text, the source listing and, for examples
//! that opt in, the output of the example's demonstration.  [`ManualBuilder`] then renders the
//! result with `genpdf` and embeds the outline as PDF bookmarks.
//!
//! ```no_run
//! use pdf_manual::{Manual, ManualBuilder};
//!
//! # fn main() -> Result<(), pdf_manual::ManualError> {
//! let mut manual = Manual::new("sources").with_demos(pdf_manual::showcase::demos());
//! manual.build_from_sources()?;
//! let rendered = ManualBuilder::new().render(manual.into_content())?;
//! rendered.write_to("manual.pdf")?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod manual;
pub mod model;
pub mod outline;
pub mod package;
pub mod richtext;
pub mod showcase;
pub mod source;
pub mod style;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use builder::{ManualBuilder, RenderedManual};
pub use error::{LoadError, ManualError};
pub use genpdf::style::Color;
pub use manual::{DemoRegistry, EvaluationFailure, Manual, ManualContent};
pub use package::{ContentItem, ExamplePackage, ExampleSection, ManualPlan};
pub use source::ExampleFile;
