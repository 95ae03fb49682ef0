//! Table-of-contents viewer assets.
//!
//! Stage 3 of the build pipeline. The viewer is a static page that fetches
//! `notesTree.json` from the output root and renders it as nested lists:
//! directories as labels, Markdown notes as links to their `.html` pages.
//!
//! Two sources are supported:
//! - a user directory of assets, copied verbatim with [`insert_toc`]
//! - the built-in viewer, written with [`write_builtin_toc`]
//!
//! ```text
//! docs/
//! ├── index.html       # shell with <div id="root" data-tree="notesTree.json">
//! ├── toc.js
//! ├── toc.css
//! └── notesTree.json
//! ```
//!
//! The built-in viewer never replaces a converted page: when a root
//! `index.md` already produced `index.html`, the shell is written as
//! `toc.html` instead.

use maud::{DOCTYPE, Markup, html};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

const TOC_JS: &str = include_str!("../static/toc.js");
const TOC_CSS: &str = include_str!("../static/toc.css");

/// Names for the viewer page, in order of preference.
const SHELL_NAMES: [&str; 2] = ["index.html", "toc.html"];

#[derive(Error, Debug)]
pub enum TocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot walk TOC assets: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("TOC assets directory not found: {0}")]
    MissingAssets(PathBuf),
    #[error("Built-in viewer would overwrite converted output: {0}")]
    Collision(PathBuf),
}

/// Recursively copy the viewer assets in `assets_dir` into `target`.
///
/// Existing files are overwritten. Returns the number of files copied.
pub fn insert_toc(assets_dir: &Path, target: &Path) -> Result<usize, TocError> {
    if !assets_dir.is_dir() {
        return Err(TocError::MissingAssets(assets_dir.to_path_buf()));
    }
    fs::create_dir_all(target)?;

    let mut copied = 0;
    for entry in WalkDir::new(assets_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(assets_dir) else {
            continue;
        };
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Write the built-in viewer into `target`, returning the files written with
/// the page shell first.
///
/// `taken` lists paths already produced by the conversion. The shell falls
/// back to `toc.html` when `index.html` is taken; any other clash is an error
/// and nothing is written.
pub fn write_builtin_toc<'a>(
    target: &Path,
    tree_file: &str,
    taken: impl IntoIterator<Item = &'a Path>,
) -> Result<Vec<PathBuf>, TocError> {
    let taken: HashSet<&Path> = taken.into_iter().collect();

    let shell = SHELL_NAMES
        .iter()
        .map(|name| target.join(name))
        .find(|path| !taken.contains(path.as_path()))
        .ok_or_else(|| TocError::Collision(target.join(SHELL_NAMES[0])))?;
    if !shell.ends_with(SHELL_NAMES[0]) {
        warn!(
            shell = %shell.display(),
            "index.html is a converted note, writing the viewer page under another name"
        );
    }

    let files = [
        (shell, toc_shell(tree_file).into_string()),
        (target.join("toc.js"), TOC_JS.to_string()),
        (target.join("toc.css"), TOC_CSS.to_string()),
    ];
    if let Some((path, _)) = files.iter().find(|(path, _)| taken.contains(path.as_path())) {
        return Err(TocError::Collision(path.clone()));
    }

    fs::create_dir_all(target)?;
    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        fs::write(&path, content)?;
        written.push(path);
    }
    Ok(written)
}

/// The viewer's HTML shell.
fn toc_shell(tree_file: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Contents" }
                link rel="stylesheet" href="toc.css";
                script src="toc.js" defer {}
            }
            body {
                h1 { "Contents" }
                div #root data-tree=(tree_file) {}
            }
        }
    }
}
