use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{info, warn, LevelFilter};
use pdf_manual::outline::Outline;
use pdf_manual::{showcase, Manual, ManualBuilder, RenderedManual};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Builds the example manual from the command line.
///
/// Fonts must be present under `assets/fonts` next to the binary or the `pdf_manual` crate,
/// or provided via the `PDF_MANUAL_FONTS_DIR` environment variable.
#[derive(Parser)]
#[command(author, version, about = "Builds a by-example PDF manual")]
struct Cli {
    /// Log more; repeat for trace output.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every part listed in `manual.toml`.
    Build(RenderArgs),

    /// Render a single package.
    Package {
        /// Folder name of the package below the sources root.
        id: String,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print the outline of the manual without rendering it.
    Outline {
        #[arg(long, default_value = "sources")]
        sources: PathBuf,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Root of the example sources.
    #[arg(long, default_value = "sources")]
    sources: PathBuf,

    #[arg(short, long, default_value = "manual.pdf")]
    output: PathBuf,

    /// Directory holding the fonts; overrides the default search.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Leave the outline out of the PDF.
    #[arg(long)]
    no_bookmarks: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build(args) => build(&args, None),
        Commands::Package { id, render } => build(&render, Some(&id)),
        Commands::Outline { sources } => print_outline(&sources),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Logging disabled: {}", err);
    }
}

fn lay_out(sources: &Path, package: Option<&str>) -> Result<Manual, Box<dyn Error>> {
    let mut manual = Manual::new(sources).with_demos(showcase::demos());
    match package {
        Some(id) => manual.load_package(id)?,
        None => manual.build_from_sources()?,
    }

    let failures = manual.failures().len();
    if failures > 0 {
        warn!("{failures} examples failed to evaluate");
    }
    Ok(manual)
}

fn build(args: &RenderArgs, package: Option<&str>) -> Result<(), Box<dyn Error>> {
    let manual = lay_out(&args.sources, package)?;

    let mut builder = ManualBuilder::new().with_page_numbers();
    if let Some(fonts) = &args.fonts {
        builder = builder.with_font_directory(fonts.clone());
    }

    let rendered = render(builder, manual, !args.no_bookmarks)?;
    rendered.write_to(&args.output)?;
    info!(
        "Wrote {} pages to {}",
        rendered.page_count,
        args.output.display()
    );
    Ok(())
}

#[cfg(feature = "bookmarks")]
fn render(
    builder: ManualBuilder,
    manual: Manual,
    bookmarks: bool,
) -> Result<RenderedManual, Box<dyn Error>> {
    let content = manual.into_content();
    let rendered = if bookmarks {
        builder.render_with_bookmarks(content)?
    } else {
        builder.render(content)?
    };
    Ok(rendered)
}

#[cfg(not(feature = "bookmarks"))]
fn render(
    builder: ManualBuilder,
    manual: Manual,
    bookmarks: bool,
) -> Result<RenderedManual, Box<dyn Error>> {
    if bookmarks {
        warn!("Built without the `bookmarks` feature; the outline is not embedded");
    }
    Ok(builder.render(manual.into_content())?)
}

fn print_outline(sources: &Path) -> Result<(), Box<dyn Error>> {
    let manual = lay_out(sources, None)?;
    print_items(manual.outline());
    Ok(())
}

fn print_items(outline: &Outline) {
    for (depth, item) in outline.walk() {
        let page = item
            .effective_destination()
            .map(|destination| destination.page.to_string())
            .unwrap_or_default();
        println!("{:indent$}{} {}", "", item.title(), page, indent = depth * 2);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
