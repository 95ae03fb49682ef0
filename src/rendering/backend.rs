//! Renderer trait and shared types.
//!
//! A [`Renderer`] turns one Markdown document into a standalone HTML file.
//! The call is synchronous: it returns once the HTML has been written (or the
//! backend has failed), so the caller can post-process the file immediately.
//!
//! The production implementations are
//! [`PandocRenderer`](super::pandoc::PandocRenderer), which runs an external
//! `pandoc` process, and [`BuiltinRenderer`](super::builtin::BuiltinRenderer),
//! which converts in process with pulldown-cmark.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to start renderer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Renderer exited with {}: {}", exit_label(.code), .stderr.trim())]
    Failed { code: Option<i32>, stderr: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

/// One Markdown-to-HTML conversion.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Markdown source, streamed to the backend as-is.
    pub markdown: &'a [u8],
    /// Inherited template, if any directory up the chain defines one.
    pub template: Option<&'a Path>,
    /// Where the standalone HTML document must be written.
    pub output: &'a Path,
    /// Fallback document title (the note's file stem).
    pub title: &'a str,
}

/// Trait for Markdown rendering backends.
///
/// `Sync` so one renderer can serve every worker of the conversion pool.
pub trait Renderer: Sync {
    /// Render `request.markdown` into a standalone HTML file at `request.output`.
    fn render(&self, request: &RenderRequest) -> Result<(), RenderError>;
}
