//! Demonstrations for the example sources bundled under `sources/`.
//!
//! Each demonstration mirrors the listing of its example file, so the drawing printed below the
//! listing is exactly what the listing describes.

mod basic_concepts;
mod graphics;
mod images;

pub use images::gradient_png;

use crate::manual::DemoRegistry;

/// Every demonstration of the bundled manual.
pub fn demos() -> DemoRegistry {
    let mut registry = DemoRegistry::new();
    basic_concepts::register(&mut registry);
    graphics::register(&mut registry);
    images::register(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::package::{ExamplePackage, PackageMember};
    use crate::source::ExampleFile;

    const PACKAGES: [&str; 3] = ["basic_concepts", "graphics", "images"];

    fn sources_root() -> &'static Path {
        Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/sources"))
    }

    #[test]
    fn every_evaluated_example_has_a_demonstration() {
        let registry = demos();
        for id in PACKAGES {
            let package = ExamplePackage::load(sources_root(), id).unwrap();
            let entries = package.members().iter().flat_map(|member| match member {
                PackageMember::Example(entry) => vec![entry.clone()],
                PackageMember::Section(section) => section.examples().to_vec(),
            });
            for entry in entries {
                let example = ExampleFile::load(sources_root(), id, entry.file())
                    .unwrap()
                    .with_eval_override(entry.eval());
                if example.eval() {
                    assert!(
                        registry.contains(id, example.stem()),
                        "{id}/{} has no demonstration",
                        example.filename()
                    );
                }
            }
        }
    }

    #[test]
    fn every_demonstration_has_a_source() {
        for key in demos().keys() {
            let (package, stem) = key.split_once('/').unwrap();
            let path = crate::source::source_path(sources_root(), package, stem);
            assert!(path.is_file(), "{} is missing", path.display());
        }
    }
}
