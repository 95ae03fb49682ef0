//! Tree conversion into the output site.
//!
//! Stage 2 of the build pipeline. Walks a [`TreeNode`] and recreates its
//! directories under the output root, rendering every `.md` note into a
//! sibling `.html` file with the note's inherited template, then inlining its
//! inherited stylesheet.
//!
//! ## Output Structure
//!
//! ```text
//! notes/                       docs/
//! ├── template.html            ├── notesTree.json
//! ├── style.css                ├── index.md → index.html
//! ├── index.md          ──▶    ├── Rust/
//! ├── Rust/                    │   └── ownership.html
//! │   └── ownership.md         └── empty/
//! ├── empty/
//! └── diagram.png              (not mirrored unless copy_assets is set)
//! ```
//!
//! The root directory maps onto the output root itself.
//!
//! ## Per-file outcome
//!
//! ```text
//! Pending → Rendering → RendererFailed
//!                     → Succeeded → StyleInjected
//!                                 → StyleInjectFailed   (style.css unreadable)
//!                                 → MarkerMissing       (no <style></style>)
//!                                 → Unstyled            (no style.css inherited)
//! ```
//!
//! Failures are logged and recorded for that note only; the walk always
//! finishes. Only an unusable output directory aborts the conversion.
//!
//! ## Parallel Rendering
//!
//! Directories are created sequentially in tree order. Notes are then rendered
//! on a dedicated [rayon](https://docs.rs/rayon) pool of `max_processes`
//! workers; each worker waits for its renderer to finish before inlining the
//! style, so at most `max_processes` renderer processes run at once. Results
//! come back in tree order regardless of completion order.

use crate::config::{self, SiteConfig};
use crate::rendering::{RenderRequest, Renderer, StyleError, inline_stylesheet};
use crate::tree::TreeNode;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Renderer jobs in flight at once. `1` renders strictly one after another.
    pub max_processes: usize,
    /// Copy non-Markdown files into the mirrored directories.
    pub copy_assets: bool,
}

impl ConvertOptions {
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            max_processes: config::effective_threads(&config.processing),
            copy_assets: config.output.copy_assets,
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// Terminal state of one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Rendered, stylesheet inlined.
    StyleInjected,
    /// Rendered; no stylesheet is inherited anywhere up the tree.
    Unstyled,
    /// Rendered; the output has no `<style></style>` marker to fill.
    MarkerMissing,
    /// Rendered; the inherited stylesheet could not be inlined.
    StyleInjectFailed(String),
    /// The renderer failed; no HTML was produced.
    RendererFailed(String),
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FileOutcome::StyleInjectFailed(_) | FileOutcome::RendererFailed(_)
        )
    }
}

/// A note after conversion.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    /// Relative path of the source note.
    pub relative_path: String,
    /// Generated HTML file.
    pub output: PathBuf,
    pub outcome: FileOutcome,
}

/// Progress events, sent as the conversion advances.
#[derive(Debug, Clone)]
pub enum ConvertEvent {
    DirectoryCreated {
        relative_path: String,
    },
    AssetCopied {
        relative_path: String,
    },
    FileConverted {
        relative_path: String,
        output_name: String,
        outcome: FileOutcome,
    },
}

/// A non-Markdown file that could not be copied.
#[derive(Debug, Clone)]
pub struct FailedAsset {
    pub relative_path: String,
    pub error: String,
}

/// Summary of a conversion run.
#[derive(Debug, Default)]
pub struct ConvertReport {
    /// Directories created below the output root.
    pub directories: usize,
    /// Non-Markdown files copied, as their paths in the output.
    pub assets: Vec<PathBuf>,
    /// Non-Markdown files whose copy failed.
    pub failed_assets: Vec<FailedAsset>,
    /// Every note, in tree order.
    pub files: Vec<ConvertedFile>,
}

impl ConvertReport {
    pub fn converted(&self) -> usize {
        self.files.iter().filter(|f| !f.outcome.is_failure()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConvertedFile> {
        self.files.iter().filter(|f| f.outcome.is_failure())
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn assets_copied(&self) -> usize {
        self.assets.len()
    }

    /// True when any note or asset failed.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || !self.failed_assets.is_empty()
    }

    /// Every path the run claimed in the output: note pages and copied assets.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .map(|f| f.output.as_path())
            .chain(self.assets.iter().map(PathBuf::as_path))
    }
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} converted, {} failed, {} directories",
            self.converted(),
            self.failed(),
            self.directories
        )?;
        if self.assets_copied() > 0 {
            write!(f, ", {} assets copied", self.assets_copied())?;
        }
        if !self.failed_assets.is_empty() {
            write!(f, ", {} assets failed", self.failed_assets.len())?;
        }
        Ok(())
    }
}

/// A note waiting to be rendered.
struct Job<'a> {
    node: &'a TreeNode,
    output: PathBuf,
}

/// Convert `tree` into `output_root`.
pub fn convert_tree<R: Renderer + ?Sized>(
    tree: &TreeNode,
    output_root: &Path,
    renderer: &R,
    options: &ConvertOptions,
    events: Option<Sender<ConvertEvent>>,
) -> Result<ConvertReport, ConvertError> {
    create_dir(output_root)?;

    let mut report = ConvertReport::default();
    let mut jobs = Vec::new();
    plan_node(
        tree,
        output_root,
        true,
        options,
        &mut jobs,
        &mut report,
        events.as_ref(),
    )?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_processes.max(1))
        .build()?;

    report.files = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let outcome = convert_file(renderer, job.node, &job.output);
                if let Some(tx) = &events {
                    let _ = tx.send(ConvertEvent::FileConverted {
                        relative_path: job.node.relative_path.clone(),
                        output_name: output_name(&job.output),
                        outcome: outcome.clone(),
                    });
                }
                ConvertedFile {
                    relative_path: job.node.relative_path.clone(),
                    output: job.output.clone(),
                    outcome,
                }
            })
            .collect()
    });

    info!(output = %output_root.display(), "{}", report);
    Ok(report)
}

/// Mirror directories and collect rendering jobs, depth-first in tree order.
fn plan_node<'a>(
    node: &'a TreeNode,
    out_dir: &Path,
    is_root: bool,
    options: &ConvertOptions,
    jobs: &mut Vec<Job<'a>>,
    report: &mut ConvertReport,
    events: Option<&Sender<ConvertEvent>>,
) -> Result<(), ConvertError> {
    if node.is_dir() {
        let dir = if is_root {
            out_dir.to_path_buf()
        } else {
            let dir = out_dir.join(&node.name);
            create_dir(&dir)?;
            debug!(dir = %dir.display(), "created directory");
            report.directories += 1;
            if let Some(tx) = events {
                let _ = tx.send(ConvertEvent::DirectoryCreated {
                    relative_path: node.relative_path.clone(),
                });
            }
            dir
        };
        for child in node.children() {
            plan_node(child, &dir, false, options, jobs, report, events)?;
        }
    } else if node.is_markdown() {
        jobs.push(Job {
            node,
            output: out_dir.join(html_file_name(&node.name)),
        });
    } else if options.copy_assets {
        let target = out_dir.join(&node.name);
        match fs::copy(&node.source_path, &target) {
            Ok(_) => {
                report.assets.push(target);
                if let Some(tx) = events {
                    let _ = tx.send(ConvertEvent::AssetCopied {
                        relative_path: node.relative_path.clone(),
                    });
                }
            }
            Err(e) => {
                error!(source = %node.source_path.display(), error = %e, "asset copy failed");
                report.failed_assets.push(FailedAsset {
                    relative_path: node.relative_path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Render one note and inline its stylesheet.
fn convert_file<R: Renderer + ?Sized>(renderer: &R, node: &TreeNode, output: &Path) -> FileOutcome {
    let markdown = match fs::read(&node.source_path) {
        Ok(markdown) => markdown,
        Err(e) => {
            error!(source = %node.source_path.display(), error = %e, "cannot read note");
            return FileOutcome::RendererFailed(format!("cannot read note: {e}"));
        }
    };

    let title = Path::new(&node.name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let request = RenderRequest {
        markdown: &markdown,
        template: node.template.as_deref(),
        output,
        title: &title,
    };

    if let Err(e) = renderer.render(&request) {
        error!(source = %node.source_path.display(), error = %e, "conversion failed");
        remove_stale_output(output);
        return FileOutcome::RendererFailed(e.to_string());
    }

    let Some(style) = node.style.as_deref() else {
        warn!(source = %node.source_path.display(), "no style.css inherited, left unstyled");
        return FileOutcome::Unstyled;
    };

    match inline_stylesheet(output, style) {
        Ok(()) => {
            info!(source = %node.source_path.display(), "converted");
            FileOutcome::StyleInjected
        }
        Err(StyleError::MarkerMissing) => {
            warn!(
                output = %output.display(),
                "no <style></style> marker in rendered HTML, stylesheet not inlined"
            );
            FileOutcome::MarkerMissing
        }
        Err(e) => {
            error!(source = %node.source_path.display(), error = %e, "stylesheet inlining failed");
            FileOutcome::StyleInjectFailed(e.to_string())
        }
    }
}

/// Drop a page left by an earlier run or a partial write, so a failed note
/// never links to outdated HTML.
fn remove_stale_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!(output = %output.display(), "removed stale page"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(output = %output.display(), error = %e, "cannot remove stale page"),
    }
}

/// `notes.md` → `notes.html`; only the final extension is replaced.
pub fn html_file_name(name: &str) -> PathBuf {
    Path::new(name).with_extension("html")
}

fn output_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn create_dir(path: &Path) -> Result<(), ConvertError> {
    fs::create_dir_all(path).map_err(|source| ConvertError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
