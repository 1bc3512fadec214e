//! The manual orchestrator.
//!
//! [`Manual`] is a single-writer layout session.  It walks packages, sections and example files
//! in document order, appends [`Block`]s for everything that should appear on paper, records
//! outline entries, and runs each example's demonstration against itself so the drawing lands
//! right below the listing.  Pagination and PDF output happen later in
//! [`ManualBuilder`](crate::builder::ManualBuilder).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use genpdf::style::Color;
use log::{debug, error, info, warn};

use crate::error::ManualError;
use crate::fonts::FALLBACK_FONTS;
use crate::model::{
    AxisSpec, Block, Drawing, ImageBlock, Listing, Paint, Point, RichParagraph, Rule, Shape,
    TextStyle,
};
use crate::outline::{AnchorId, Destination, Outline, OutlineItem};
use crate::package::{
    ContentItem, ExampleEntry, ExamplePackage, ExampleSection, IntroStep, ManualPlan,
    PackageMember, PageDefinition, Part, PAGES_FOLDER,
};
use crate::richtext::{parse_markup_lossy, Span};
use crate::source::{humanize, ExampleFile};
use crate::style::{
    CapStyle, Dash, FontRole, FontSpec, JoinStyle, StyleContext, FOLDER_GREY,
};

/// Non-breaking space substituted for spaces in listings.
pub const NBSP: char = '\u{a0}';

const HEADER_LINE_SIZE: u8 = 20;
const HEADER_TITLE_SIZE: u8 = 25;
const LISTING_SIZE: u8 = 11;
const SEPARATOR_OVERHANG: f64 = 36.0;
const SEPARATOR_DASH: f64 = 3.0;
const LIST_INDENT: f64 = 10.0;
const LIST_LEADING: f64 = 2.0;

/// Demonstration run in place of evaluating an example's source.
pub type DemoFn = Rc<dyn Fn(&mut Manual) -> anyhow::Result<()>>;

/// Demonstrations keyed by package folder and example stem.
#[derive(Clone, Default)]
pub struct DemoRegistry {
    demos: HashMap<String, DemoFn>,
}

impl DemoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the demonstration of `<package>/<stem>.rs`, replacing any previous one.
    pub fn register<F>(&mut self, package: &str, stem: &str, demo: F) -> &mut Self
    where
        F: Fn(&mut Manual) -> anyhow::Result<()> + 'static,
    {
        self.demos.insert(registry_key(package, stem), Rc::new(demo));
        self
    }

    /// Builder-style variant of [`DemoRegistry::register`].
    pub fn with<F>(mut self, package: &str, stem: &str, demo: F) -> Self
    where
        F: Fn(&mut Manual) -> anyhow::Result<()> + 'static,
    {
        self.register(package, stem, demo);
        self
    }

    pub fn get(&self, package: &str, stem: &str) -> Option<DemoFn> {
        self.demos.get(&registry_key(package, stem)).cloned()
    }

    pub fn contains(&self, package: &str, stem: &str) -> bool {
        self.demos.contains_key(&registry_key(package, stem))
    }

    pub fn len(&self) -> usize {
        self.demos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demos.is_empty()
    }

    /// Registered `package/stem` keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.demos.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for DemoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoRegistry")
            .field("demos", &self.keys())
            .finish()
    }
}

fn registry_key(package: &str, stem: &str) -> String {
    format!("{package}/{stem}")
}

/// A demonstration that failed while the manual was being laid out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluationFailure {
    pub package: String,
    pub filename: String,
    pub message: String,
    pub source: String,
}

/// Everything a finished layout session hands to the renderer.
#[derive(Clone, Debug)]
pub struct ManualContent {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    pub outline: Outline,
}

/// A manual being laid out.
pub struct Manual {
    source_root: PathBuf,
    title: Option<String>,
    demos: DemoRegistry,
    blocks: Vec<Block>,
    outline: Outline,
    style: StyleContext,
    page_number: usize,
    next_anchor: usize,
    rendered_packages: Vec<String>,
    diagnostics: Box<dyn Write>,
    failures: Vec<EvaluationFailure>,
}

impl Manual {
    /// Creates an empty manual reading its sources below `source_root`.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            title: None,
            demos: DemoRegistry::new(),
            blocks: Vec::new(),
            outline: Outline::new(),
            style: StyleContext::new(),
            page_number: 0,
            next_anchor: 0,
            rendered_packages: Vec::new(),
            diagnostics: Box::new(io::stderr()),
            failures: Vec::new(),
        }
    }

    /// Sets the demonstrations run for evaluated examples.
    pub fn with_demos(mut self, demos: DemoRegistry) -> Self {
        self.demos = demos;
        self
    }

    /// Redirects evaluation failure reports, which go to stderr by default.
    pub fn with_diagnostics<W: Write + 'static>(mut self, diagnostics: W) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Current text and graphics state.
    pub fn style(&self) -> &StyleContext {
        &self.style
    }

    /// Number of pages started so far; overflowing content may add more when rendered.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Demonstrations that failed so far, in order.
    pub fn failures(&self) -> &[EvaluationFailure] {
        &self.failures
    }

    /// Ends the layout session.
    pub fn into_content(self) -> ManualContent {
        ManualContent {
            title: self.title,
            blocks: self.blocks,
            outline: self.outline,
        }
    }

    /// Lays out every part of `plan` in order.
    pub fn build(&mut self, plan: &ManualPlan) -> Result<(), ManualError> {
        if self.title.is_none() {
            self.title = plan.title.clone();
        }

        for part in &plan.parts {
            match part {
                Part::Page { page } => self.load_page(page)?,
                Part::Package { package } => self.load_package(package)?,
            }
        }

        info!(
            "Laid out {} pages with {} outline entries ({} failed examples)",
            self.page_number,
            self.outline.len(),
            self.failures.len()
        );
        Ok(())
    }

    /// Lays out the manual described by `manual.toml` in the source root.
    pub fn build_from_sources(&mut self) -> Result<(), ManualError> {
        let plan = ManualPlan::load(&self.source_root)?;
        self.build(&plan)
    }

    /// Lays out a whole package: cover first, then its members in declaration order.
    pub fn package(&mut self, package: &ExamplePackage) -> Result<(), ManualError> {
        package.validate()?;
        let name = package.name();
        if self.rendered_packages.contains(&name) {
            return Err(ManualError::DuplicatePackage(name));
        }
        self.rendered_packages.push(name.clone());
        info!("Rendering package {name}");

        self.render_package_cover(package)?;

        for member in package.members() {
            match member {
                PackageMember::Example(entry) => {
                    let example = self.load_example(package.id(), entry, [name.as_str()])?;
                    self.render_example(&example)?;
                }
                PackageMember::Section(section) => {
                    self.render_section(section)?;
                    for entry in section.examples() {
                        let example = self.load_example(
                            package.id(),
                            entry,
                            [name.as_str(), section.name()],
                        )?;
                        self.render_example(&example)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn load_example<const N: usize>(
        &self,
        package: &str,
        entry: &ExampleEntry,
        parents: [&str; N],
    ) -> Result<ExampleFile, ManualError> {
        Ok(ExampleFile::load(&self.source_root, package, entry.file())?
            .with_eval_override(entry.eval())
            .with_parents(parents))
    }

    /// Starts the package's cover page, draws its header and intro, and registers a closed
    /// top-level outline section for it.
    pub fn render_package_cover(&mut self, package: &ExamplePackage) -> Result<(), ManualError> {
        self.start_new_page();
        let destination = self.anchor();
        let name = package.name();
        self.header(&name);

        for step in package.intro_steps() {
            match step {
                IntroStep::Item(item) => self.render_content(item),
                IntroStep::Custom(content) => {
                    content
                        .call(self)
                        .map_err(|err| ManualError::Content {
                            context: format!("intro of package `{name}`"),
                            message: format!("{err:#}"),
                        })?;
                }
            }
        }

        self.outline
            .define(OutlineItem::section(name).with_destination(destination).closed());
        Ok(())
    }

    /// Registers a closed outline subsection below the section's package.
    pub fn render_section(&mut self, section: &ExampleSection) -> Result<(), ManualError> {
        self.outline.add_subsection_to(
            &[section.package_name()],
            OutlineItem::section(section.name()).closed(),
        )?;
        Ok(())
    }

    /// Lays out one example page.
    ///
    /// Demonstration failures are reported to the diagnostic stream and never returned; the
    /// only errors are outline registration problems.
    pub fn render_example(&mut self, example: &ExampleFile) -> Result<(), ManualError> {
        debug!("Rendering example {}/{}", example.package(), example.filename());
        self.start_new_page();
        let destination = self.anchor();
        self.outline.add_subsection_to(
            example.parents(),
            OutlineItem::page(example.name(), destination),
        )?;

        self.formatted_text(
            vec![
                Span::new(format!("{}/", example.package())).colored(FOLDER_GREY),
                Span::new(example.filename()),
            ],
            TextStyle {
                font: FontSpec::new(FontRole::Body, HEADER_LINE_SIZE),
                ..self.current_text_style()
            },
        );
        self.move_down(10.0);

        if !example.introduction_text().is_empty() {
            self.text(example.introduction_text());
        }

        let previous_font = self.style.font();
        self.font(FontRole::Monospace, LISTING_SIZE);
        self.push(Block::Listing(Listing {
            text: example.source().replace(' ', &NBSP.to_string()),
            size: self.style.font().size,
            color: self.style.fill_color(),
            fallbacks: FALLBACK_FONTS.iter().map(|font| font.name.to_owned()).collect(),
        }));
        self.style.set_font(previous_font);

        if example.eval() {
            self.move_down(10.0);
            self.dash(SEPARATOR_DASH);
            self.push(Block::Rule(Rule {
                overhang: SEPARATOR_OVERHANG,
                stroke: self.style.stroke(),
            }));
            self.undash();
            self.move_down(10.0);
            self.evaluate(example);
        }

        self.reset_settings();
        Ok(())
    }

    fn evaluate(&mut self, example: &ExampleFile) {
        let outcome = match self.demos.get(example.package(), example.stem()) {
            Some(demo) => match panic::catch_unwind(AssertUnwindSafe(|| (*demo)(self))) {
                Ok(result) => result.map_err(|err| format!("{err:#}")),
                Err(payload) => Err(panic_message(payload.as_ref())),
            },
            None => Err(format!(
                "no demonstration registered for {}/{}",
                example.package(),
                example.stem()
            )),
        };

        if let Err(message) = outcome {
            self.report_failure(example, message);
        }
    }

    fn report_failure(&mut self, example: &ExampleFile, message: String) {
        error!(
            "Error evaluating example {}/{}: {message}",
            example.package(),
            example.filename()
        );

        let report = write!(
            self.diagnostics,
            "Error evaluating example: {message}\n\n---- Source: ----\n{}\n",
            example.source()
        )
        .and_then(|()| self.diagnostics.flush());
        if let Err(err) = report {
            warn!("Failed to write to the diagnostic stream: {err}");
        }

        self.failures.push(EvaluationFailure {
            package: example.package().to_owned(),
            filename: example.filename().to_owned(),
            message,
            source: example.source().to_owned(),
        });
    }

    /// Reads `<root>/<id>/<id>.toml` and lays the package out.
    pub fn load_package(&mut self, id: &str) -> Result<(), ManualError> {
        let package = ExamplePackage::load(&self.source_root, id)?;
        self.package(&package)
    }

    /// Lays out the standalone page `<root>/manual/<page>.toml` and registers a flat outline
    /// entry titled after the page id.
    pub fn load_page(&mut self, page: &str) -> Result<(), ManualError> {
        let destination = self.load_file(PAGES_FOLDER, page)?;
        self.outline
            .define(OutlineItem::page(humanize(page), destination));
        Ok(())
    }

    /// Starts a new page and lays out the content of `<root>/<folder>/<file>.toml`.
    pub fn load_file(&mut self, folder: &str, file: &str) -> Result<Destination, ManualError> {
        let page = PageDefinition::load(&self.source_root, folder, file)?;
        self.start_new_page();
        let destination = self.anchor();
        for item in &page.content {
            self.render_content(item);
        }
        Ok(destination)
    }

    /// Lays out one data-driven content item.
    pub fn render_content(&mut self, item: &ContentItem) {
        match item {
            ContentItem::Header { title } => self.header(title),
            ContentItem::Text { body } => self.text(body),
            ContentItem::List { items } => self.list(items),
            ContentItem::Space { points } => self.move_down(*points),
        }
    }

    /// Page header used by package covers and standalone pages.
    pub fn header(&mut self, title: &str) {
        self.move_down(40.0);
        self.formatted_text(
            vec![Span::new(title)],
            TextStyle {
                font: FontSpec::new(FontRole::Body, HEADER_TITLE_SIZE),
                bold: true,
                ..self.current_text_style()
            },
        );
        self.stroke_horizontal_rule();
        self.move_down(30.0);
    }

    /// Bulleted list; runs of whitespace inside each item collapse to a single space.
    pub fn list<S: AsRef<str>>(&mut self, items: &[S]) {
        self.move_down(20.0);
        for item in items {
            let spans = parse_markup_lossy(&collapse_whitespace(item.as_ref()));
            let style = TextStyle {
                leading: LIST_LEADING,
                ..self.current_text_style()
            };
            self.push(Block::Bullet(
                RichParagraph::new(spans)
                    .with_style(style)
                    .with_indent(LIST_INDENT),
            ));
            self.move_down(10.0);
        }
    }

    /// Paragraph with inline markup in the current font and fill color.
    pub fn text(&mut self, markup: &str) {
        let spans = parse_markup_lossy(markup);
        let style = self.current_text_style();
        self.formatted_text(spans, style);
    }

    /// Paragraph made of pre-styled spans.
    pub fn formatted_text(&mut self, spans: Vec<Span>, style: TextStyle) {
        self.push(Block::Paragraph(RichParagraph::new(spans).with_style(style)));
    }

    /// Vertical gap in the text flow.
    pub fn move_down(&mut self, points: f64) {
        self.push(Block::Spacer(points));
    }

    pub fn image(&mut self, image: ImageBlock) {
        self.push(Block::Image(image));
    }

    /// Starts a new page.  The very first page is implicit and does not need a break.
    pub fn start_new_page(&mut self) {
        if self.page_number > 0 {
            self.blocks.push(Block::PageBreak);
        }
        self.page_number += 1;
    }

    /// Rule across the full content width in the current stroke style.
    pub fn stroke_horizontal_rule(&mut self) {
        self.push(Block::Rule(Rule {
            overhang: 0.0,
            stroke: self.style.stroke(),
        }));
    }

    pub fn stroke_horizontal_line(&mut self, x1: f64, x2: f64, y: f64) {
        self.stroke_line([x1, y], [x2, y]);
    }

    pub fn stroke_vertical_line(&mut self, y1: f64, y2: f64, x: f64) {
        self.stroke_line([x, y1], [x, y2]);
    }

    pub fn stroke_line(&mut self, from: impl Into<Point>, to: impl Into<Point>) {
        let stroke = self.style.stroke();
        self.draw(Shape::Line {
            from: from.into(),
            to: to.into(),
            stroke,
        });
    }

    /// Closed outline through `points`.
    pub fn stroke_polygon<P: Into<Point> + Copy>(&mut self, points: &[P]) {
        let stroke = self.style.stroke();
        self.draw(Shape::Polygon {
            points: points.iter().map(|point| (*point).into()).collect(),
            stroke,
        });
    }

    pub fn stroke_circle(&mut self, center: impl Into<Point>, radius: f64) {
        let paint = Paint::Stroke(self.style.stroke());
        self.draw(Shape::Circle {
            center: center.into(),
            radius,
            paint,
        });
    }

    pub fn fill_circle(&mut self, center: impl Into<Point>, radius: f64) {
        let paint = Paint::Fill(self.style.fill_color());
        self.draw(Shape::Circle {
            center: center.into(),
            radius,
            paint,
        });
    }

    pub fn stroke_rectangle(&mut self, top_left: impl Into<Point>, width: f64, height: f64) {
        let paint = Paint::Stroke(self.style.stroke());
        self.draw(Shape::Rectangle {
            top_left: top_left.into(),
            width,
            height,
            paint,
        });
    }

    pub fn fill_rectangle(&mut self, top_left: impl Into<Point>, width: f64, height: f64) {
        let paint = Paint::Fill(self.style.fill_color());
        self.draw(Shape::Rectangle {
            top_left: top_left.into(),
            width,
            height,
            paint,
        });
    }

    /// Single line of text positioned by its baseline, outside the text flow.
    pub fn draw_text(&mut self, text: impl Into<String>, at: impl Into<Point>, size: u8) {
        let shape = Shape::Text {
            text: text.into(),
            at: at.into(),
            size,
            role: self.style.font().role,
            color: self.style.fill_color(),
        };
        self.draw(shape);
    }

    /// Coordinate rulers sized to the drawing area.
    pub fn stroke_axis(&mut self) {
        self.stroke_axis_with(AxisSpec::default());
    }

    /// Coordinate rulers with explicit lengths.  Unless `axis` carries its own stroke, the
    /// rulers take the current line width, color, cap and join; they are always dotted.
    pub fn stroke_axis_with(&mut self, axis: AxisSpec) {
        let stroke = axis.stroke.unwrap_or_else(|| self.style.stroke());
        self.draw(Shape::Axis(axis.with_stroke(stroke)));
    }

    /// Dashes with gaps as long as the dashes.
    pub fn dash(&mut self, length: f64) {
        self.dash_with(Dash::new(length));
    }

    pub fn dash_with(&mut self, dash: Dash) {
        self.style.set_dash(Some(dash));
    }

    pub fn undash(&mut self) {
        self.style.set_dash(None);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.style.set_line_width(width);
    }

    pub fn set_cap_style(&mut self, cap: CapStyle) {
        self.style.set_cap_style(cap);
    }

    pub fn set_join_style(&mut self, join: JoinStyle) {
        self.style.set_join_style(join);
    }

    pub fn fill_color(&mut self, color: Color) {
        self.style.set_fill_color(color);
    }

    pub fn stroke_color(&mut self, color: Color) {
        self.style.set_stroke_color(color);
    }

    pub fn font(&mut self, role: FontRole, size: u8) {
        self.style.set_font(FontSpec::new(role, size));
    }

    /// Restores font, line and color settings to the baseline.
    pub fn reset_settings(&mut self) {
        self.style.reset();
    }

    fn current_text_style(&self) -> TextStyle {
        TextStyle {
            font: self.style.font(),
            bold: false,
            color: self.style.fill_color(),
            leading: 0.0,
        }
    }

    fn anchor(&mut self) -> Destination {
        let anchor = AnchorId::new(self.next_anchor);
        self.next_anchor += 1;
        self.push(Block::Anchor(anchor));
        Destination {
            anchor,
            page: self.page_number,
        }
    }

    fn draw(&mut self, shape: Shape) {
        if let Some(Block::Drawing(drawing)) = self.blocks.last_mut() {
            drawing.push(shape);
            return;
        }

        let mut drawing = Drawing::new();
        drawing.push(shape);
        self.push(Block::Drawing(drawing));
    }

    fn push(&mut self, block: Block) {
        if self.page_number == 0 {
            self.page_number = 1;
        }
        self.blocks.push(block);
    }
}

/// Collapses every run of whitespace into one space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_owned()
    }
}
