//! In-process Markdown backend.
//!
//! Converts notes with pulldown-cmark instead of spawning pandoc. Templates
//! are filled with a small subset of pandoc's variable syntax:
//!
//! | Variable | Value |
//! |---|---|
//! | `$body$` | the rendered note |
//! | `$title$`, `$pagetitle$` | first `# ` heading, else the file stem (escaped) |
//! | `$$` | a literal `$` |
//!
//! Other `$name$` variables render as nothing, like unset variables in pandoc.
//! Without a template the note is wrapped in a minimal document that carries
//! the empty `<style></style>` marker, so style inlining still applies.

use super::backend::{RenderError, RenderRequest, Renderer};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use std::fs;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRenderer;

impl Renderer for BuiltinRenderer {
    fn render(&self, request: &RenderRequest) -> Result<(), RenderError> {
        let markdown = String::from_utf8_lossy(request.markdown);
        let body = markdown_to_html(&markdown);
        let title = first_heading(&markdown).unwrap_or(request.title);

        let document = match request.template {
            Some(template_path) => {
                let template = fs::read_to_string(template_path)?;
                let escaped_title = html! { (title) }.into_string();
                fill_template(
                    &template,
                    &[
                        ("body", &body),
                        ("title", &escaped_title),
                        ("pagetitle", &escaped_title),
                    ],
                )
            }
            None => default_document(title, &body).into_string(),
        };

        fs::write(request.output, document)?;
        Ok(())
    }
}

/// Render Markdown with the extensions pandoc's markdown reader enables by default.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut body = String::new();
    md_html::push_html(&mut body, parser);
    body
}

/// Text of the first level-one ATX heading.
fn first_heading(markdown: &str) -> Option<&str> {
    markdown
        .lines()
        .find(|line| line.starts_with("# "))
        .map(|line| line.trim_start_matches("# ").trim())
        .filter(|title| !title.is_empty())
}

/// Substitute `$name$` variables in a single pass over the template.
///
/// Values are inserted verbatim and never rescanned.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('$') else {
            out.push('$');
            rest = after;
            continue;
        };

        let name = &after[..end];
        if name.is_empty() {
            out.push('$');
        } else if let Some((_, value)) = vars.iter().find(|(key, _)| *key == name) {
            out.push_str(value);
        } else if !is_variable_name(name) {
            // Not a variable, e.g. "$5 and $6": keep the first dollar and rescan
            out.push('$');
            rest = after;
            continue;
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn is_variable_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn default_document(title: &str, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style {}
            }
            body {
                main {
                    (PreEscaped(body))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn render_to_string(markdown: &str, template: Option<&Path>) -> String {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out.html");
        BuiltinRenderer
            .render(&RenderRequest {
                markdown: markdown.as_bytes(),
                template,
                output: &output,
                title: "fallback",
            })
            .unwrap();
        fs::read_to_string(&output).unwrap()
    }

    #[test]
    fn default_document_has_style_marker() {
        let html = render_to_string("# Hello\n\nworld", None);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(html.matches("<style></style>").count(), 1);
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<title>Hello</title>"));
    }

    #[test]
    fn title_falls_back_to_request_title() {
        let html = render_to_string("no heading here", None);
        assert!(html.contains("<title>fallback</title>"));
    }

    #[test]
    fn template_variables_filled() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("template.html");
        fs::write(
            &template,
            "<html><head><title>$pagetitle$</title><style></style></head><body>$body$</body></html>",
        )
        .unwrap();

        let html = render_to_string("# Notes & Ideas\n\ntext", Some(&template));
        assert!(html.contains("<title>Notes &amp; Ideas</title>"));
        assert!(html.contains("<p>text</p>"));
        assert!(html.contains("<style></style>"));
    }

    #[test]
    fn missing_template_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out.html");
        let result = BuiltinRenderer.render(&RenderRequest {
            markdown: b"# A",
            template: Some(&tmp.path().join("missing.html")),
            output: &output,
            title: "a",
        });
        assert!(matches!(result, Err(RenderError::Io(_))));
    }

    #[test]
    fn tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    // =========================================================================
    // fill_template tests
    // =========================================================================

    #[test]
    fn fill_template_replaces_known_variables() {
        assert_eq!(fill_template("<b>$body$</b>", &[("body", "x")]), "<b>x</b>");
    }

    #[test]
    fn fill_template_unknown_variable_is_empty() {
        assert_eq!(fill_template("a$author$b", &[]), "ab");
    }

    #[test]
    fn fill_template_double_dollar_is_literal() {
        assert_eq!(fill_template("cost: $$5", &[]), "cost: $5");
    }

    #[test]
    fn fill_template_keeps_non_variable_dollars() {
        assert_eq!(fill_template("from $5 to $6", &[]), "from $5 to $6");
        assert_eq!(fill_template("$ alone", &[]), "$ alone");
    }

    #[test]
    fn fill_template_does_not_rescan_values() {
        assert_eq!(
            fill_template("$body$", &[("body", "$title$"), ("title", "nope")]),
            "$title$"
        );
    }
}
