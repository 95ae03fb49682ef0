//! Filesystem scanning and the note tree.
//!
//! Stage 1 of the build pipeline. Walks the notes directory depth-first and
//! produces a [`TreeNode`] mirroring it, with every node annotated by the
//! template and stylesheet it inherits.
//!
//! ## Directory Structure
//!
//! ```text
//! notes/                           # Notes root
//! ├── config.toml                  # Site configuration (root only, optional)
//! ├── template.html                # Template for everything below (optional)
//! ├── style.css                    # Stylesheet for everything below (optional)
//! ├── index.md
//! ├── Rust/
//! │   ├── ownership.md             # Uses the root template and style
//! │   └── async/
//! │       ├── style.css            # Overrides the style for async/ only
//! │       └── pinning.md
//! └── diagram.png                  # Listed in the tree, not converted
//! ```
//!
//! ## Inheritance
//!
//! A directory containing `template.html` or `style.css` uses its own file
//! and hands it down to every descendant; otherwise it passes on whatever it
//! inherited. The closest definition wins. The special files are metadata
//! and never appear as children.
//!
//! ## Ordering
//!
//! Children list directories before files. Within each group names ascend
//! case-insensitively. Names that differ only in case put lowercase first
//! (`alpha.md` before `Alpha.md`), so the order is the same on every
//! filesystem.

use crate::config::CONFIG_FILE;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Per-directory template, inherited by the whole subtree.
pub const TEMPLATE_FILE: &str = "template.html";
/// Per-directory stylesheet, inherited by the whole subtree.
pub const STYLE_FILE: &str = "style.css";
/// Default name of the serialized tree in the output root.
pub const TREE_FILE: &str = "notesTree.json";

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Notes root not found: {0}")]
    RootNotFound(PathBuf),
}

/// One filesystem entry plus the template and style it inherits.
///
/// The serde field names are the ones the table-of-contents viewer reads
/// from `notesTree.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "path")]
    pub source_path: PathBuf,
    /// Path relative to the notes root, `/`-separated. Empty for the root.
    #[serde(rename = "relativePath")]
    pub relative_path: String,
    pub template: Option<PathBuf>,
    pub style: Option<PathBuf>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Directory {
        children: Vec<TreeNode>,
    },
    File {
        /// Lowercased extension including the dot (`".md"`), empty when none.
        extension: String,
        size: u64,
    },
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Children of a directory; empty for files.
    pub fn children(&self) -> &[TreeNode] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    /// Lowercased extension of a file node.
    pub fn extension(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { extension, .. } => Some(extension),
            NodeKind::Directory { .. } => None,
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.extension() == Some(".md")
    }

    /// Every node of the tree in depth-first pre-order, root included.
    pub fn walk(&self) -> Vec<&TreeNode> {
        let mut nodes = Vec::new();
        walk_recursive(self, &mut nodes);
        nodes
    }

    /// Count directories (root excluded), files, and Markdown files.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for node in self.walk().into_iter().skip(1) {
            if node.is_dir() {
                stats.directories += 1;
            } else {
                stats.files += 1;
                if node.is_markdown() {
                    stats.markdown += 1;
                }
            }
        }
        stats
    }
}

fn walk_recursive<'a>(node: &'a TreeNode, nodes: &mut Vec<&'a TreeNode>) {
    nodes.push(node);
    for child in node.children() {
        walk_recursive(child, nodes);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub directories: usize,
    pub files: usize,
    pub markdown: usize,
}

/// Template and style handed down from the enclosing directories.
#[derive(Debug, Clone, Default)]
struct Inherited {
    template: Option<PathBuf>,
    style: Option<PathBuf>,
}

impl Inherited {
    /// Apply a directory's own special files on top of what it inherited.
    fn resolve(&self, dir: &Path, entries: &[OsString]) -> Self {
        let has = |file: &str| entries.iter().any(|e| e == file);
        Self {
            template: if has(TEMPLATE_FILE) {
                Some(dir.join(TEMPLATE_FILE))
            } else {
                self.template.clone()
            },
            style: if has(STYLE_FILE) {
                Some(dir.join(STYLE_FILE))
            } else {
                self.style.clone()
            },
        }
    }
}

/// Scan `root` into a tree.
///
/// The root is made absolute (without resolving symlinks) so every
/// `source_path`, `template`, and `style` in the result is absolute.
pub fn build_tree(root: &Path) -> Result<TreeNode, TreeError> {
    build_tree_excluding(root, &[])
}

/// Scan `root` into a tree, leaving out the entries at `excluded` and
/// everything below them.
///
/// Used to keep a table-of-contents assets directory that lives inside the
/// notes root out of the notes. Relative exclusions resolve against the
/// working directory, like `root` itself.
pub fn build_tree_excluding(root: &Path, excluded: &[PathBuf]) -> Result<TreeNode, TreeError> {
    if !root.exists() {
        return Err(TreeError::RootNotFound(root.to_path_buf()));
    }
    let root = std::path::absolute(root)?;
    let excluded = excluded
        .iter()
        .map(std::path::absolute)
        .collect::<Result<Vec<_>, _>>()?;
    let scan = Scan {
        root: &root,
        excluded: &excluded,
    };
    let tree = scan.node(&root, &Inherited::default())?;

    let stats = tree.stats();
    debug!(
        root = %root.display(),
        directories = stats.directories,
        files = stats.files,
        markdown = stats.markdown,
        excluded = excluded.len(),
        "scanned notes tree"
    );
    Ok(tree)
}

struct Scan<'a> {
    root: &'a Path,
    excluded: &'a [PathBuf],
}

impl Scan<'_> {
    fn node(&self, path: &Path, inherited: &Inherited) -> Result<TreeNode, TreeError> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative_path = relative_path(path, self.root);

        if metadata.is_dir() {
            let entries = collect_entries(path)?;
            let own = inherited.resolve(path, &entries);
            let is_root = path == self.root;

            let mut children = Vec::new();
            for entry in &entries {
                if is_metadata_file(entry, is_root) {
                    continue;
                }
                let child = path.join(entry);
                if self.excluded.contains(&child) {
                    debug!(path = %child.display(), "excluded from notes tree");
                    continue;
                }
                children.push(self.node(&child, &own)?);
            }
            children.sort_by(compare_siblings);

            Ok(TreeNode {
                name,
                source_path: path.to_path_buf(),
                relative_path,
                template: own.template,
                style: own.style,
                kind: NodeKind::Directory { children },
            })
        } else {
            let extension = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();

            Ok(TreeNode {
                name,
                source_path: path.to_path_buf(),
                relative_path,
                template: inherited.template.clone(),
                style: inherited.style.clone(),
                kind: NodeKind::File {
                    extension,
                    size: metadata.len(),
                },
            })
        }
    }
}

fn collect_entries(path: &Path) -> Result<Vec<OsString>, TreeError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
        entries.push(entry?.file_name());
    }
    Ok(entries)
}

/// Files consumed as directory metadata instead of listed as content.
fn is_metadata_file(entry: &OsString, is_root: bool) -> bool {
    entry == TEMPLATE_FILE || entry == STYLE_FILE || (is_root && entry == CONFIG_FILE)
}

/// Directories first, then case-insensitive name order, lowercase first on ties.
fn compare_siblings(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        // Reversed byte order: lowercase letters have the higher code points
        .then_with(|| b.name.cmp(&a.name))
}

fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

/// Write the tree as pretty JSON to `dir/file_name`, returning the written path.
pub fn save_tree(tree: &TreeNode, dir: &Path, file_name: &str) -> Result<PathBuf, TreeError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(tree)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Read a tree previously written by [`save_tree`].
pub fn load_tree(path: &Path) -> Result<TreeNode, TreeError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
