//! Descriptors for packages, sections and standalone pages.
//!
//! These form the first phase of a manual build: an immutable tree describing *what* goes into
//! the manual.  They can be declared in Rust or read from TOML definitions next to the example
//! sources.  [`Manual`](crate::manual::Manual) walks them afterwards and decides *how* they are
//! drawn.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{LoadError, ManualError};
use crate::manual::Manual;
use crate::source::humanize;

/// Folder holding the definitions of standalone pages.
pub const PAGES_FOLDER: &str = "manual";

/// Data-driven content used by package intros and standalone pages.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ContentItem {
    /// Page header: bold title followed by a rule.
    Header { title: String },
    /// Paragraph with inline markup.
    Text { body: String },
    /// Bulleted list.
    List { items: Vec<String> },
    /// Vertical gap in points.
    Space { points: f64 },
}

/// Content produced by Rust code at render time.
#[derive(Clone)]
pub struct ContentFn(Rc<dyn Fn(&mut Manual) -> anyhow::Result<()>>);

impl ContentFn {
    pub fn new<F>(content: F) -> Self
    where
        F: Fn(&mut Manual) -> anyhow::Result<()> + 'static,
    {
        Self(Rc::new(content))
    }

    pub fn call(&self, manual: &mut Manual) -> anyhow::Result<()> {
        (*self.0)(manual)
    }
}

impl fmt::Debug for ContentFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentFn(..)")
    }
}

/// One step of a package introduction.
#[derive(Clone, Debug)]
pub enum IntroStep {
    Item(ContentItem),
    Custom(ContentFn),
}

/// An example declared in a package or section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "EntryDefinition")]
pub struct ExampleEntry {
    file: String,
    eval: Option<bool>,
}

impl ExampleEntry {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            eval: None,
        }
    }

    /// Forces the evaluation flag regardless of the source directive.
    pub fn with_eval(mut self, eval: bool) -> Self {
        self.eval = Some(eval);
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Evaluation flag given next to the declaration, if any.
    pub fn eval(&self) -> Option<bool> {
        self.eval
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryDefinition {
    File(String),
    Detailed {
        file: String,
        #[serde(default)]
        eval: Option<bool>,
    },
}

impl From<EntryDefinition> for ExampleEntry {
    fn from(definition: EntryDefinition) -> Self {
        match definition {
            EntryDefinition::File(file) => Self::new(file),
            EntryDefinition::Detailed { file, eval } => Self { file, eval },
        }
    }
}

/// A named, ordered group of examples inside a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleSection {
    name: String,
    package_name: String,
    examples: Vec<ExampleEntry>,
}

impl ExampleSection {
    pub fn new(package_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_name: package_name.into(),
            examples: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name of the owning package.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Declares an example.  Declaring the same file twice lists it twice.
    pub fn example(&mut self, file: impl Into<String>) -> &mut Self {
        self.examples.push(ExampleEntry::new(file));
        self
    }

    /// Declares an example whose evaluation flag is fixed here.
    pub fn example_with_eval(&mut self, file: impl Into<String>, eval: bool) -> &mut Self {
        self.examples.push(ExampleEntry::new(file).with_eval(eval));
        self
    }

    pub fn examples(&self) -> &[ExampleEntry] {
        &self.examples
    }
}

/// Something declared directly inside a package, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageMember {
    Example(ExampleEntry),
    Section(ExampleSection),
}

/// A named collection of sections plus an introduction block.
#[derive(Clone, Debug)]
pub struct ExamplePackage {
    id: String,
    name: Option<String>,
    intro: Vec<IntroStep>,
    members: Vec<PackageMember>,
}

impl ExamplePackage {
    /// Creates a package whose examples live in the `id` folder.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            intro: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Sets the display name and returns the updated package.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        for member in &mut self.members {
            if let PackageMember::Section(section) = member {
                section.package_name = name.clone();
            }
        }
        self.name = Some(name);
        self
    }

    /// Appends a data-driven intro step.
    pub fn intro(mut self, item: ContentItem) -> Self {
        self.intro.push(IntroStep::Item(item));
        self
    }

    /// Appends an intro step produced by Rust code when the cover is drawn.
    pub fn intro_with<F>(mut self, content: F) -> Self
    where
        F: Fn(&mut Manual) -> anyhow::Result<()> + 'static,
    {
        self.intro.push(IntroStep::Custom(ContentFn::new(content)));
        self
    }

    /// Declares a section; `declare` registers its examples.
    pub fn section<F>(mut self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(&mut ExampleSection),
    {
        let mut section = ExampleSection::new(self.name(), name);
        declare(&mut section);
        self.members.push(PackageMember::Section(section));
        self
    }

    /// Declares an example directly below the package.
    pub fn example(mut self, file: impl Into<String>) -> Self {
        self.members
            .push(PackageMember::Example(ExampleEntry::new(file)));
        self
    }

    /// Declares a package-level example whose evaluation flag is fixed here.
    pub fn example_with_eval(mut self, file: impl Into<String>, eval: bool) -> Self {
        self.members
            .push(PackageMember::Example(ExampleEntry::new(file).with_eval(eval)));
        self
    }

    /// Folder holding the package's examples.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name; the humanized id unless set explicitly.
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| humanize(&self.id))
    }

    pub fn intro_steps(&self) -> &[IntroStep] {
        &self.intro
    }

    pub fn members(&self) -> &[PackageMember] {
        &self.members
    }

    pub fn sections(&self) -> impl Iterator<Item = &ExampleSection> {
        self.members.iter().filter_map(|member| match member {
            PackageMember::Section(section) => Some(section),
            PackageMember::Example(_) => None,
        })
    }

    /// Checks that section names are unique.
    pub fn validate(&self) -> Result<(), ManualError> {
        let mut seen = Vec::new();
        for section in self.sections() {
            if seen.contains(&section.name()) {
                return Err(ManualError::DuplicateSection {
                    package: self.name(),
                    section: section.name().to_owned(),
                });
            }
            seen.push(section.name());
        }
        Ok(())
    }

    /// Location of the definition of package `id`.
    pub fn definition_path(root: &Path, id: &str) -> PathBuf {
        root.join(id).join(format!("{id}.toml"))
    }

    /// Reads `<root>/<id>/<id>.toml`.
    pub fn load(root: &Path, id: &str) -> Result<Self, LoadError> {
        let path = Self::definition_path(root, id);
        let definition: PackageDefinition = read_definition(&path)?;
        Ok(definition.into_package(id))
    }

    /// Parses a TOML package definition.
    pub fn from_toml_str(id: &str, contents: &str) -> Result<Self, LoadError> {
        let definition: PackageDefinition =
            toml::from_str(contents).map_err(|source| LoadError::Definition {
                path: PathBuf::from(format!("<{id}>")),
                source,
            })?;
        Ok(definition.into_package(id))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageDefinition {
    name: Option<String>,
    #[serde(default)]
    intro: Vec<ContentItem>,
    #[serde(default)]
    examples: Vec<ExampleEntry>,
    #[serde(default, rename = "section")]
    sections: Vec<SectionDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionDefinition {
    name: String,
    #[serde(default)]
    examples: Vec<ExampleEntry>,
}

impl PackageDefinition {
    fn into_package(self, id: &str) -> ExamplePackage {
        let mut package = ExamplePackage::new(id);
        package.name = self.name;
        package.intro = self.intro.into_iter().map(IntroStep::Item).collect();

        let package_name = package.name();
        package.members.extend(self.examples.into_iter().map(PackageMember::Example));
        package
            .members
            .extend(self.sections.into_iter().map(|section| {
                PackageMember::Section(ExampleSection {
                    name: section.name,
                    package_name: package_name.clone(),
                    examples: section.examples,
                })
            }));
        package
    }
}

/// A standalone page such as a cover or a foreword.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageDefinition {
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

impl PageDefinition {
    /// Reads `<root>/<folder>/<page>.toml`.
    pub fn load(root: &Path, folder: &str, page: &str) -> Result<Self, LoadError> {
        read_definition(&root.join(folder).join(format!("{page}.toml")))
    }
}

/// One entry of the manual's table of contents.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Page { page: String },
    Package { package: String },
}

/// Order in which pages and packages make up the manual (`manual.toml`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualPlan {
    pub title: Option<String>,
    #[serde(default, rename = "part")]
    pub parts: Vec<Part>,
}

impl ManualPlan {
    pub const FILE_NAME: &'static str = "manual.toml";

    /// Reads `<root>/manual.toml`.
    pub fn load(root: &Path) -> Result<Self, LoadError> {
        read_definition(&root.join(Self::FILE_NAME))
    }
}

fn read_definition<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| LoadError::Definition {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_CONCEPTS: &str = r#"
name = "Basic Concepts"
examples = ["creation"]

[[intro]]
kind = "text"
body = "This chapter covers the minimum."

[[intro]]
kind = "list"
items = ["origin", "cursor"]

[[section]]
name = "Coordinates"
examples = ["origin", { file = "measurement", eval = false }, "origin"]

[[section]]
name = "Flow"
"#;

    #[test]
    fn parses_definition_in_declaration_order() {
        let package = ExamplePackage::from_toml_str("basic_concepts", BASIC_CONCEPTS).unwrap();
        assert_eq!(package.id(), "basic_concepts");
        assert_eq!(package.name(), "Basic Concepts");
        assert_eq!(package.intro_steps().len(), 2);

        assert_eq!(
            package.members()[0],
            PackageMember::Example(ExampleEntry::new("creation"))
        );
        let sections: Vec<_> = package.sections().collect();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name(), "Coordinates");
        assert_eq!(sections[0].package_name(), "Basic Concepts");
        assert_eq!(
            sections[0].examples(),
            &[
                ExampleEntry::new("origin"),
                ExampleEntry::new("measurement").with_eval(false),
                ExampleEntry::new("origin"),
            ]
        );
        assert!(sections[1].examples().is_empty());
    }

    #[test]
    fn builder_keeps_duplicates_and_order() {
        let package = ExamplePackage::new("graphics")
            .section("Lines", |section| {
                section.example("line").example("polygon").example("line");
            })
            .example("helper");

        assert_eq!(package.name(), "Graphics");
        match &package.members()[0] {
            PackageMember::Section(section) => {
                let files: Vec<_> = section.examples().iter().map(ExampleEntry::file).collect();
                assert_eq!(files, vec!["line", "polygon", "line"]);
                assert_eq!(section.package_name(), "Graphics");
            }
            other => panic!("expected a section, got {other:?}"),
        }
        assert!(matches!(package.members()[1], PackageMember::Example(_)));
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let package = ExamplePackage::new("graphics")
            .section("Lines", |_| {})
            .section("Lines", |_| {});
        let err = package.validate().unwrap_err();
        assert!(matches!(
            err,
            ManualError::DuplicateSection { ref section, .. } if section == "Lines"
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ExamplePackage::from_toml_str("p", "nmae = \"typo\"").unwrap_err();
        assert!(matches!(err, LoadError::Definition { .. }));
    }

    #[test]
    fn parses_manual_plan() {
        let plan: ManualPlan = toml::from_str(
            r#"
title = "Manual"

[[part]]
page = "cover"

[[part]]
package = "basic_concepts"
"#,
        )
        .unwrap();
        assert_eq!(plan.title.as_deref(), Some("Manual"));
        assert_eq!(
            plan.parts,
            vec![
                Part::Page {
                    page: "cover".into()
                },
                Part::Package {
                    package: "basic_concepts".into()
                },
            ]
        );
    }

    #[test]
    fn parses_page_content() {
        let page: PageDefinition = toml::from_str(
            r#"
[[content]]
kind = "header"
title = "How to read this manual"

[[content]]
kind = "space"
points = 12.5
"#,
        )
        .unwrap();
        assert_eq!(
            page.content,
            vec![
                ContentItem::Header {
                    title: "How to read this manual".into()
                },
                ContentItem::Space { points: 12.5 },
            ]
        );
    }
}
