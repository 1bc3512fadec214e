//! A manual reads its sources from a directory, lays the pages out and hands the result to
//! `ManualBuilder`, which renders the PDF.
//@ eval: false

let mut manual = Manual::new("sources").with_demos(showcase::demos());
manual.build_from_sources()?;

ManualBuilder::new()
    .with_page_numbers()
    .render_with_bookmarks(manual.into_content())?
    .write_to("manual.pdf")?;
