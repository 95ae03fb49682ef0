//! # Notes Site
//!
//! Turns a directory of Markdown notes into a static HTML site. The notes
//! directory is the data source: directories are mirrored, each `.md` note
//! becomes an `.html` page in the same place, and a small viewer renders a
//! table of contents from the scanned tree.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Scan      notes/  →  notesTree.json   (filesystem → tree with inherited template/style)
//! 2. Convert   tree    →  docs/**.html     (renderer per note, stylesheet inlined)
//! 3. Toc       viewer  →  docs/index.html  (copied assets or the built-in viewer)
//! ```
//!
//! The tree JSON is both the hand-off between stages and the data the viewer
//! fetches at runtime, so it is written before conversion starts.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tree`] | Stage 1: walks the notes directory, resolves template/style inheritance, (de)serializes the tree |
//! | [`convert`] | Stage 2: mirrors directories and renders notes on a bounded worker pool |
//! | [`rendering`] | Renderer backends (pandoc subprocess, in-process pulldown-cmark) and stylesheet inlining |
//! | [`toc`] | Stage 3: installs the table-of-contents viewer |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## Inheritance Is Resolved Once
//!
//! A directory's `template.html` and `style.css` apply to everything below it
//! until a deeper directory defines its own. The scan records the resolved
//! paths on every node, so conversion never looks upward and the JSON shows
//! exactly which template and stylesheet each note got.
//!
//! ## Pandoc As A Subprocess
//!
//! Pandoc templates are the input format users already have, so the default
//! backend runs `pandoc` per note with the Markdown on stdin. The
//! [`rendering::Renderer`] trait keeps conversion testable without it, and the
//! built-in pulldown-cmark backend covers machines where pandoc is missing.
//!
//! ## One Failure Is Not Fatal
//!
//! A note that fails to render or style is recorded in the
//! [`convert::ConvertReport`] and the walk continues. Only an unusable output
//! directory aborts the run.

pub mod config;
pub mod convert;
pub mod output;
pub mod rendering;
pub mod toc;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
