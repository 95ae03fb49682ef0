//! Stylesheet inlining.
//!
//! Templates mark where the stylesheet goes with a literal empty
//! `<style></style>` element. After rendering, the inherited `style.css` is
//! read and written between those tags. Matching is textual and
//! ASCII-case-insensitive; only the first marker is filled.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The injection point a template must contain exactly once.
pub const STYLE_MARKER: &str = "<style></style>";

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read stylesheet {path}: {source}")]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Rendered HTML has no empty <style></style> marker")]
    MarkerMissing,
}

/// Replace the first empty style element in `html` with one holding `css`.
pub fn inject_style(html: &str, css: &str) -> Result<String, StyleError> {
    // ASCII lowercasing keeps byte offsets identical to the input
    let start = html
        .to_ascii_lowercase()
        .find(STYLE_MARKER)
        .ok_or(StyleError::MarkerMissing)?;
    let end = start + STYLE_MARKER.len();

    let mut out = String::with_capacity(html.len() + css.len());
    out.push_str(&html[..start]);
    out.push_str("<style>");
    out.push_str(css);
    out.push_str("</style>");
    out.push_str(&html[end..]);
    Ok(out)
}

/// Inline the stylesheet at `style_path` into the HTML file at `html_path`.
///
/// The HTML file is left untouched when the stylesheet cannot be read or the
/// marker is missing.
pub fn inline_stylesheet(html_path: &Path, style_path: &Path) -> Result<(), StyleError> {
    let css = fs::read_to_string(style_path).map_err(|source| StyleError::Stylesheet {
        path: style_path.to_path_buf(),
        source,
    })?;
    let html = fs::read_to_string(html_path)?;
    let styled = inject_style(&html, &css)?;
    fs::write(html_path, styled)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn inject_fills_marker() {
        let html = "<html><head><style></style></head><body></body></html>";
        let css = "body { color: red; }\nh1 { margin: 0; }\n";
        let out = inject_style(html, css).unwrap();

        assert_eq!(
            out,
            "<html><head><style>body { color: red; }\nh1 { margin: 0; }\n</style></head><body></body></html>"
        );
        assert_eq!(out.matches("<style>").count(), 1);
        assert_eq!(out.matches("</style>").count(), 1);
    }

    #[test]
    fn inject_is_case_insensitive() {
        let out = inject_style("<HEAD><STYLE></STYLE></HEAD>", "p{}").unwrap();
        assert_eq!(out, "<HEAD><style>p{}</style></HEAD>");
    }

    #[test]
    fn inject_only_first_marker() {
        let out = inject_style("<style></style><style></style>", "a").unwrap();
        assert_eq!(out, "<style>a</style><style></style>");
    }

    #[test]
    fn inject_without_marker_is_error() {
        let result = inject_style("<style>p{}</style>", "a");
        assert!(matches!(result, Err(StyleError::MarkerMissing)));
    }

    #[test]
    fn inject_handles_multibyte_text() {
        let out = inject_style("<title>Заметки</title><style></style>", "/* ü */").unwrap();
        assert_eq!(out, "<title>Заметки</title><style>/* ü */</style>");
    }

    #[test]
    fn inline_stylesheet_rewrites_file() {
        let tmp = TempDir::new().unwrap();
        let html_path = tmp.path().join("a.html");
        let style_path = tmp.path().join("style.css");
        fs::write(&html_path, "<style></style><p>hi</p>").unwrap();
        fs::write(&style_path, "p { color: blue; }").unwrap();

        inline_stylesheet(&html_path, &style_path).unwrap();

        assert_eq!(
            fs::read_to_string(&html_path).unwrap(),
            "<style>p { color: blue; }</style><p>hi</p>"
        );
    }

    #[test]
    fn inline_stylesheet_missing_css_leaves_html() {
        let tmp = TempDir::new().unwrap();
        let html_path = tmp.path().join("a.html");
        fs::write(&html_path, "<style></style>").unwrap();

        let result = inline_stylesheet(&html_path, &tmp.path().join("style.css"));

        assert!(matches!(result, Err(StyleError::Stylesheet { .. })));
        assert_eq!(fs::read_to_string(&html_path).unwrap(), "<style></style>");
    }

    #[test]
    fn inline_stylesheet_twice_needs_fresh_marker() {
        let tmp = TempDir::new().unwrap();
        let html_path = tmp.path().join("a.html");
        let style_path = tmp.path().join("style.css");
        fs::write(&html_path, "<style></style>").unwrap();
        fs::write(&style_path, "x").unwrap();

        inline_stylesheet(&html_path, &style_path).unwrap();
        let second = inline_stylesheet(&html_path, &style_path);

        assert!(matches!(second, Err(StyleError::MarkerMissing)));
        assert_eq!(fs::read_to_string(&html_path).unwrap(), "<style>x</style>");
    }
}
