//! CLI output formatting for all pipeline stages.
//!
//! Output is **content-centric**: every note and directory is shown by its
//! position and name, with template/style provenance and conversion status as
//! indented context lines. Diagnostics (renderer stderr, IO errors) go through
//! `tracing` to stderr; this module only formats what goes to stdout.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Notes (1 directories, 3 files, 2 notes)
//!     Template: template.html
//!     Style: style.css
//! 001 Rust/
//!     Style: Rust/style.css
//!     001 ownership.md
//! 002 diagram.png
//! 003 index.md
//! ```
//!
//! ## Convert
//!
//! ```text
//! Rust/
//! Rust/ownership.md → ownership.html
//!     style: inlined
//! index.md → index.html
//!     FAILED: Renderer exited with code 1: ...
//!
//! Converted 1 notes, 1 failed, 1 directories
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::convert::{ConvertEvent, ConvertReport, FileOutcome};
use crate::tree::TreeNode;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Show `path` relative to `root` when possible.
fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn outcome_line(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::StyleInjected => "style: inlined".to_string(),
        FileOutcome::Unstyled => "style: none inherited".to_string(),
        FileOutcome::MarkerMissing => "style: no <style></style> marker".to_string(),
        FileOutcome::StyleInjectFailed(msg) | FileOutcome::RendererFailed(msg) => {
            format!("FAILED: {}", msg.trim())
        }
    }
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format the scanned tree: one line per entry, plus the template and style
/// lines wherever a directory defines its own.
pub fn format_tree_output(tree: &TreeNode) -> Vec<String> {
    let stats = tree.stats();
    let mut lines = vec![format!(
        "Notes ({} directories, {} files, {} notes)",
        stats.directories, stats.files, stats.markdown
    )];
    push_definitions(tree, None, &tree.source_path, 1, &mut lines);
    format_children(tree, &tree.source_path, 0, &mut lines);
    lines
}

fn format_children(node: &TreeNode, root: &Path, depth: usize, lines: &mut Vec<String>) {
    for (i, child) in node.children().iter().enumerate() {
        let base_indent = indent(depth);
        if child.is_dir() {
            lines.push(format!("{}{} {}/", base_indent, format_index(i + 1), child.name));
            push_definitions(child, Some(node), root, depth + 1, lines);
            format_children(child, root, depth + 1, lines);
        } else {
            lines.push(format!("{}{} {}", base_indent, format_index(i + 1), child.name));
        }
    }
}

/// Template/style lines for a directory that overrides what it inherited.
fn push_definitions(
    dir: &TreeNode,
    parent: Option<&TreeNode>,
    root: &Path,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let inherited_template = parent.and_then(|p| p.template.as_ref());
    let inherited_style = parent.and_then(|p| p.style.as_ref());

    if let Some(template) = &dir.template
        && Some(template) != inherited_template
    {
        lines.push(format!(
            "{}Template: {}",
            indent(depth),
            display_relative(template, root)
        ));
    }
    if let Some(style) = &dir.style
        && Some(style) != inherited_style
    {
        lines.push(format!(
            "{}Style: {}",
            indent(depth),
            display_relative(style, root)
        ));
    }
}

/// Print scan output to stdout.
pub fn print_tree_output(tree: &TreeNode) {
    for line in format_tree_output(tree) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Convert output
// ============================================================================

/// Format a single conversion progress event as display lines.
pub fn format_convert_event(event: &ConvertEvent) -> Vec<String> {
    match event {
        ConvertEvent::DirectoryCreated { relative_path } => vec![format!("{}/", relative_path)],
        ConvertEvent::AssetCopied { relative_path } => {
            vec![format!("{} (copied)", relative_path)]
        }
        ConvertEvent::FileConverted {
            relative_path,
            output_name,
            outcome,
        } => {
            let arrow = match outcome {
                FileOutcome::RendererFailed(_) => "\u{2717}",
                _ => "\u{2192}",
            };
            vec![
                format!("{} {} {}", relative_path, arrow, output_name),
                format!("    {}", outcome_line(outcome)),
            ]
        }
    }
}

/// Format the end-of-run summary, listing every failed note and asset.
pub fn format_convert_summary(report: &ConvertReport) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Converted {} notes, {} failed, {} directories",
            report.converted(),
            report.failed(),
            report.directories
        ),
    ];
    if report.assets_copied() > 0 {
        lines.push(format!("Copied {} assets", report.assets_copied()));
    }
    for failure in report.failures() {
        lines.push(format!(
            "    {}: {}",
            failure.relative_path,
            outcome_line(&failure.outcome)
        ));
    }
    for asset in &report.failed_assets {
        lines.push(format!("    {}: FAILED to copy: {}", asset.relative_path, asset.error));
    }
    lines
}

/// Print the conversion summary to stdout.
pub fn print_convert_summary(report: &ConvertReport) {
    for line in format_convert_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConvertedFile, FailedAsset};
    use crate::test_helpers::*;
    use crate::tree::build_tree;
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn tree_output_lists_entries_in_order() {
        let tmp = notes_fixture(&[
            ("template.html", ""),
            ("style.css", ""),
            ("index.md", ""),
            ("diagram.png", ""),
            ("Rust/style.css", ""),
            ("Rust/ownership.md", ""),
        ]);
        let tree = build_tree(tmp.path()).unwrap();

        let lines = format_tree_output(&tree);
        assert_eq!(
            lines,
            vec![
                "Notes (1 directories, 3 files, 2 notes)",
                "    Template: template.html",
                "    Style: style.css",
                "001 Rust/",
                "    Style: Rust/style.css",
                "    001 ownership.md",
                "002 diagram.png",
                "003 index.md",
            ]
        );
    }

    #[test]
    fn tree_output_skips_inherited_definitions() {
        let tmp = notes_fixture(&[("style.css", ""), ("sub/deeper/a.md", "")]);
        let tree = build_tree(tmp.path()).unwrap();

        let lines = format_tree_output(&tree);
        assert_eq!(lines.iter().filter(|l| l.contains("Style:")).count(), 1);
    }

    #[test]
    fn convert_event_directory() {
        let event = ConvertEvent::DirectoryCreated {
            relative_path: "Rust/async".to_string(),
        };
        assert_eq!(format_convert_event(&event), vec!["Rust/async/"]);
    }

    #[test]
    fn convert_event_success() {
        let event = ConvertEvent::FileConverted {
            relative_path: "Rust/ownership.md".to_string(),
            output_name: "ownership.html".to_string(),
            outcome: FileOutcome::StyleInjected,
        };
        assert_eq!(
            format_convert_event(&event),
            vec!["Rust/ownership.md \u{2192} ownership.html", "    style: inlined"]
        );
    }

    #[test]
    fn convert_event_failure() {
        let event = ConvertEvent::FileConverted {
            relative_path: "c.md".to_string(),
            output_name: "c.html".to_string(),
            outcome: FileOutcome::RendererFailed("Renderer exited with code 1: boom\n".to_string()),
        };
        let lines = format_convert_event(&event);
        assert_eq!(lines[0], "c.md \u{2717} c.html");
        assert_eq!(lines[1], "    FAILED: Renderer exited with code 1: boom");
    }

    #[test]
    fn summary_lists_failures() {
        let report = ConvertReport {
            directories: 1,
            assets: vec![PathBuf::from("img/a.png"), PathBuf::from("img/b.png")],
            failed_assets: vec![FailedAsset {
                relative_path: "img/c.png".to_string(),
                error: "permission denied".to_string(),
            }],
            files: vec![
                ConvertedFile {
                    relative_path: "a.md".to_string(),
                    output: PathBuf::from("a.html"),
                    outcome: FileOutcome::Unstyled,
                },
                ConvertedFile {
                    relative_path: "c.md".to_string(),
                    output: PathBuf::from("c.html"),
                    outcome: FileOutcome::RendererFailed("exit 1".to_string()),
                },
            ],
        };
        let lines = format_convert_summary(&report);
        assert_eq!(
            lines,
            vec![
                "",
                "Converted 1 notes, 1 failed, 1 directories",
                "Copied 2 assets",
                "    c.md: FAILED: exit 1",
                "    img/c.png: FAILED to copy: permission denied",
            ]
        );
    }
}
