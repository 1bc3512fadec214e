//! Error types shared across the crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::outline::OutlineError;

/// Failures while reading a source artifact.  Always fatal to a manual build.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid directive `{directive}` in {file}: {reason}")]
    InvalidDirective {
        file: String,
        directive: String,
        reason: String,
    },

    #[error("invalid definition {}: {source}", .path.display())]
    Definition {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors produced while laying out or rendering a manual.
#[derive(Debug, Error)]
pub enum ManualError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("package `{0}` has already been rendered")]
    DuplicatePackage(String),

    #[error("package `{package}` declares section `{section}` more than once")]
    DuplicateSection { package: String, section: String },

    #[error(transparent)]
    Outline(#[from] OutlineError),

    #[error("failed to lay out the {context}: {message}")]
    Content { context: String, message: String },

    #[error("failed to load fonts")]
    FontLoad(#[source] genpdf::error::Error),

    #[error("failed to render the manual")]
    Render(#[source] genpdf::error::Error),

    #[cfg(feature = "bookmarks")]
    #[error("failed to embed the outline")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
