//! Markdown rendering: backends plus stylesheet inlining.
//!
//! | Backend | How |
//! |---|---|
//! | [`PandocRenderer`] | one external `pandoc` process per note, Markdown on stdin |
//! | [`BuiltinRenderer`] | pulldown-cmark in process, `$body$`/`$title$` templates |
//!
//! The module is split into:
//! - **Backend**: [`Renderer`] trait, [`RenderRequest`], [`RenderError`]
//! - **Pandoc** / **Builtin**: the two implementations
//! - **Style**: `<style></style>` marker filling, applied after any backend

pub mod backend;
pub mod builtin;
pub mod pandoc;
pub mod style;

pub use backend::{RenderError, RenderRequest, Renderer};
pub use builtin::BuiltinRenderer;
pub use pandoc::PandocRenderer;
pub use style::{STYLE_MARKER, StyleError, inject_style, inline_stylesheet};

use crate::config::{RendererBackend, RendererConfig};

/// Build the renderer selected by the config.
pub fn renderer_from_config(config: &RendererConfig) -> Box<dyn Renderer> {
    match config.backend {
        RendererBackend::Pandoc => Box::new(PandocRenderer::from_config(config)),
        RendererBackend::Builtin => Box::new(BuiltinRenderer),
    }
}
