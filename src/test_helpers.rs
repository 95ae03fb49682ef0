//! Shared test utilities for the notes-site test suite.
//!
//! Provides fixture builders for throwaway notes directories and lookup
//! helpers over [`TreeNode`] that panic with a readable message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = notes_fixture(&[("style.css", "body {}"), ("sub/b.md", "# B")]);
//! let tree = build_tree(tmp.path()).unwrap();
//!
//! let b = find_node(&tree, "sub/b.md");
//! assert_eq!(child_names(&tree), vec!["sub"]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::tree::TreeNode;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, contents)` pairs under `root`, creating parents.
pub fn write_notes(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
    }
}

/// A fresh temp directory populated with the given notes.
pub fn notes_fixture(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_notes(tmp.path(), files);
    tmp
}

// =========================================================================
// Tree lookups: panic with a clear message on miss
// =========================================================================

/// Find a node by its relative path. Panics if not found.
pub fn find_node<'a>(tree: &'a TreeNode, relative_path: &str) -> &'a TreeNode {
    tree.walk()
        .into_iter()
        .find(|n| n.relative_path == relative_path)
        .unwrap_or_else(|| {
            panic!(
                "node '{relative_path}' not found. Available: {:?}",
                relative_paths(tree)
            )
        })
}

/// Names of a directory's children, in tree order.
pub fn child_names(node: &TreeNode) -> Vec<&str> {
    node.children().iter().map(|c| c.name.as_str()).collect()
}

/// Relative paths of every node in depth-first pre-order.
pub fn relative_paths(tree: &TreeNode) -> Vec<String> {
    tree.walk()
        .into_iter()
        .map(|n| n.relative_path.clone())
        .collect()
}

/// Read a generated file as a string. Panics with the path on failure.
pub fn read_output(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}
