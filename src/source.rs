//! Example source artifacts.
//!
//! An example lives at `<root>/<package>/<stem>.rs`.  Its header carries the introduction text
//! in `//!` lines and directives in `//@ key: value` lines; the rest of the file is the listing
//! printed in the manual.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::LoadError;

const EXTENSION: &str = "rs";
const INTRO_PREFIX: &str = "//!";
const DIRECTIVE_PREFIX: &str = "//@";

/// One example's listing, introduction text and evaluation flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleFile {
    package: String,
    filename: String,
    source: String,
    introduction: String,
    eval: bool,
    parents: Vec<String>,
}

impl ExampleFile {
    /// Reads `<root>/<package>/<file>.rs`.
    ///
    /// `file` may be given with or without the `.rs` extension.
    pub fn load(root: &Path, package: &str, file: &str) -> Result<Self, LoadError> {
        let path = source_path(root, package, file);
        let contents = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(package, file, &contents)
    }

    /// Parses the contents of an example artifact.
    pub fn parse(package: &str, file: &str, contents: &str) -> Result<Self, LoadError> {
        let filename = with_extension(file);
        let mut introduction = Vec::new();
        let mut eval = true;
        let mut lines = contents.lines().peekable();

        while let Some(&line) = lines.peek() {
            let trimmed = line.trim_start();
            if let Some(text) = trimmed.strip_prefix(INTRO_PREFIX) {
                introduction.push(text.strip_prefix(' ').unwrap_or(text).trim_end());
            } else if let Some(directive) = trimmed.strip_prefix(DIRECTIVE_PREFIX) {
                if let Some(value) = parse_directive(&filename, directive.trim())? {
                    eval = value;
                }
            } else {
                break;
            }
            lines.next();
        }

        let body: Vec<&str> = lines.collect();
        let source = trim_blank_lines(&body).join("\n");

        Ok(Self {
            package: package.to_owned(),
            filename,
            source,
            introduction: introduction.join("\n").trim().to_owned(),
            eval,
            parents: Vec::new(),
        })
    }

    /// Overrides the evaluation flag with the one given next to the declaration, if any.
    pub fn with_eval_override(mut self, eval: Option<bool>) -> Self {
        if let Some(eval) = eval {
            self.eval = eval;
        }
        self
    }

    /// Sets the outline path the example is nested under (package title, then section name).
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Folder the example was loaded from.
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// File name without the extension; the key demonstrations are registered under.
    pub fn stem(&self) -> &str {
        self.filename
            .strip_suffix(&format!(".{EXTENSION}"))
            .unwrap_or(&self.filename)
    }

    /// Title used in the outline.
    pub fn name(&self) -> String {
        humanize(self.stem())
    }

    /// The listing, without header lines.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Introduction text; may be empty.
    pub fn introduction_text(&self) -> &str {
        &self.introduction
    }

    /// Whether the example's demonstration runs below its listing.
    pub fn eval(&self) -> bool {
        self.eval
    }

    /// Outline path of the entry this example is nested under.
    pub fn parents(&self) -> &[String] {
        &self.parents
    }
}

/// Location of an example artifact below the sources root.
pub fn source_path(root: &Path, package: &str, file: &str) -> PathBuf {
    root.join(package).join(with_extension(file))
}

/// Turns an identifier into a title: underscores become spaces, the first letter is upper case
/// and the rest lower case.
pub fn humanize(identifier: &str) -> String {
    let spaced = identifier.replace('_', " ").to_lowercase();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn with_extension(file: &str) -> String {
    if Path::new(file).extension().is_some_and(|ext| ext == EXTENSION) {
        file.to_owned()
    } else {
        format!("{file}.{EXTENSION}")
    }
}

fn parse_directive(file: &str, directive: &str) -> Result<Option<bool>, LoadError> {
    let invalid = |reason: &str| LoadError::InvalidDirective {
        file: file.to_owned(),
        directive: directive.to_owned(),
        reason: reason.to_owned(),
    };

    let (key, value) = directive
        .split_once(':')
        .ok_or_else(|| invalid("expected `key: value`"))?;

    match key.trim() {
        "eval" => match value.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(invalid("expected `true` or `false`")),
        },
        other => {
            warn!("Ignoring unknown directive `{other}` in {file}");
            Ok(None)
        }
    }
}

fn trim_blank_lines<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let start = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |index| index + 1);
    &lines[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "//! The origin is the bottom-left corner.\n\
                          //! It is marked with a dot.\n\
                          //@ eval: true\n\
                          \n\
                          manual.stroke_axis();\n\
                          \n\
                          manual.fill_circle([0.0, 0.0], 3.0);\n\
                          \n";

    #[test]
    fn splits_header_and_listing() {
        let example = ExampleFile::parse("basic_concepts", "origin", ORIGIN).unwrap();
        assert_eq!(example.filename(), "origin.rs");
        assert_eq!(example.stem(), "origin");
        assert_eq!(
            example.introduction_text(),
            "The origin is the bottom-left corner.\nIt is marked with a dot."
        );
        assert_eq!(
            example.source(),
            "manual.stroke_axis();\n\nmanual.fill_circle([0.0, 0.0], 3.0);"
        );
        assert!(example.eval());
    }

    #[test]
    fn listing_keeps_indentation() {
        let example =
            ExampleFile::parse("p", "nested.rs", "for i in 0..3 {\n    manual.text(\"x\");\n}\n")
                .unwrap();
        assert_eq!(example.filename(), "nested.rs");
        assert_eq!(example.introduction_text(), "");
        assert_eq!(example.source(), "for i in 0..3 {\n    manual.text(\"x\");\n}");
    }

    #[test]
    fn eval_directive_and_override() {
        let example = ExampleFile::parse("p", "f", "//@ eval: false\nlet x = 1;").unwrap();
        assert!(!example.eval());
        assert!(example.clone().with_eval_override(Some(true)).eval());
        assert!(!example.with_eval_override(None).eval());
    }

    #[test]
    fn malformed_directive_is_rejected() {
        let err = ExampleFile::parse("p", "f", "//@ eval: maybe\n").unwrap_err();
        assert!(matches!(err, LoadError::InvalidDirective { .. }));

        let err = ExampleFile::parse("p", "f", "//@ eval\n").unwrap_err();
        assert!(err.to_string().contains("expected `key: value`"));
    }

    #[test]
    fn unknown_directive_is_ignored() {
        let example = ExampleFile::parse("p", "f", "//@ full_source: true\nx").unwrap();
        assert!(example.eval());
        assert_eq!(example.source(), "x");
    }

    #[test]
    fn missing_artifact_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExampleFile::load(dir.path(), "basic_concepts", "nowhere").unwrap_err();
        match err {
            LoadError::Io { path, .. } => {
                assert!(path.ends_with("basic_concepts/nowhere.rs"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn humanizes_identifiers() {
        assert_eq!(humanize("intro"), "Intro");
        assert_eq!(humanize("stroke_axis"), "Stroke axis");
        assert_eq!(humanize("HOW_TO_read"), "How to read");
        assert_eq!(humanize(""), "");
    }
}
