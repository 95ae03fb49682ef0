use clap::{Parser, Subcommand};
use notes_site::config::{self, RendererBackend, SiteConfig};
use notes_site::convert::{self, ConvertOptions, ConvertReport};
use notes_site::rendering::renderer_from_config;
use notes_site::tree::{self, TreeNode};
use notes_site::{output, toc};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notes-site")]
#[command(about = "Convert a directory of Markdown notes into a static HTML site")]
#[command(long_about = "\
Convert a directory of Markdown notes into a static HTML site

Your filesystem is the data source. Directories are mirrored into the output,
every .md note becomes an .html page next to where it was, and a table of
contents viewer reads the generated notesTree.json.

Notes structure:

  notes/
  ├── config.toml          # Site config (optional, root only)
  ├── template.html        # Pandoc template (inherited by every subdirectory)
  ├── style.css            # Stylesheet inlined at <style></style>
  ├── index.md             # → index.html
  └── Rust/
      ├── style.css        # Overrides the root stylesheet for this subtree
      └── ownership.md     # → Rust/ownership.html

Diagnostics go to stderr; set RUST_LOG (e.g. RUST_LOG=debug) for more detail.

Run 'notes-site gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Notes directory
    #[arg(long, default_value = "notes", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "docs", global = true)]
    output: PathBuf,

    /// Directory of table-of-contents viewer assets (overrides toc.assets_dir)
    #[arg(long, global = true)]
    toc: Option<PathBuf>,

    /// Markdown renderer (overrides renderer.backend)
    #[arg(long, value_enum, global = true)]
    renderer: Option<RendererBackend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the notes directory and save the tree JSON
    Scan,
    /// Convert notes using the previously saved tree JSON
    Convert,
    /// Run the full pipeline: scan → convert → table of contents
    Build,
    /// Validate the notes directory without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Scan => {
            let site_config = load_site_config(&cli)?;
            let tree = scan_notes(&cli.source, &site_config)?;
            let tree_path = tree::save_tree(&tree, &cli.output, &site_config.output.tree_file)?;
            output::print_tree_output(&tree);
            println!("Tree: {}", tree_path.display());
        }
        Command::Convert => {
            let site_config = load_site_config(&cli)?;
            let tree_path = cli.output.join(&site_config.output.tree_file);
            let tree = tree::load_tree(&tree_path)?;
            let report = run_convert(&tree, &cli.output, &site_config)?;
            fail_on_errors(&report)?;
        }
        Command::Build => {
            let site_config = load_site_config(&cli)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let tree = scan_notes(&cli.source, &site_config)?;
            let tree_path = tree::save_tree(&tree, &cli.output, &site_config.output.tree_file)?;
            output::print_tree_output(&tree);

            println!("==> Stage 2: Converting notes → {}", cli.output.display());
            let report = run_convert(&tree, &cli.output, &site_config)?;

            println!("==> Stage 3: Table of contents");
            match &site_config.toc.assets_dir {
                Some(assets_dir) => {
                    let copied = toc::insert_toc(assets_dir, &cli.output)?;
                    println!("Copied {} viewer files from {}", copied, assets_dir.display());
                }
                None => {
                    let written = toc::write_builtin_toc(
                        &cli.output,
                        &site_config.output.tree_file,
                        report.outputs(),
                    )?;
                    println!(
                        "Wrote {} built-in viewer files, page: {}",
                        written.len(),
                        written[0].display()
                    );
                }
            }

            info!(tree = %tree_path.display(), "build finished");
            println!("==> Build complete: {}", cli.output.display());
            fail_on_errors(&report)?;
        }
        Command::Check => {
            let site_config = load_site_config(&cli)?;
            println!("==> Checking {}", cli.source.display());
            let tree = scan_notes(&cli.source, &site_config)?;
            output::print_tree_output(&tree);
            if let Some(assets_dir) = &site_config.toc.assets_dir
                && !assets_dir.is_dir()
            {
                return Err(toc::TocError::MissingAssets(assets_dir.clone()).into());
            }
            println!("==> Notes are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` wins over the `info` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load `config.toml` from the notes root and apply CLI overrides.
fn load_site_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.source)?;
    if let Some(backend) = cli.renderer {
        site_config.renderer.backend = backend;
    }
    site_config.toc.assets_dir = match &cli.toc {
        Some(dir) => Some(dir.clone()),
        None => site_config
            .toc
            .assets_dir
            .map(|dir| resolve_in_root(&cli.source, dir)),
    };
    Ok(site_config)
}

/// Scan the notes, keeping the viewer assets directory out of the tree.
fn scan_notes(source: &Path, site_config: &SiteConfig) -> Result<TreeNode, tree::TreeError> {
    let excluded: Vec<PathBuf> = site_config.toc.assets_dir.iter().cloned().collect();
    tree::build_tree_excluding(source, &excluded)
}

/// Paths in `config.toml` are relative to the notes root.
fn resolve_in_root(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

/// Convert the tree, printing progress events as they arrive.
fn run_convert(
    tree: &TreeNode,
    output_root: &Path,
    site_config: &SiteConfig,
) -> Result<ConvertReport, convert::ConvertError> {
    let renderer = renderer_from_config(&site_config.renderer);
    let options = ConvertOptions::from_site_config(site_config);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_convert_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = convert::convert_tree(tree, output_root, renderer.as_ref(), &options, Some(tx));
    // The sender is dropped with convert_tree, so the printer drains and exits.
    let _ = printer.join();

    let report = result?;
    output::print_convert_summary(&report);
    Ok(report)
}

/// Turn per-note and per-asset failures into a non-zero exit.
fn fail_on_errors(report: &ConvertReport) -> Result<(), Box<dyn std::error::Error>> {
    if !report.has_failures() {
        return Ok(());
    }
    let mut problems = Vec::new();
    if report.failed() > 0 {
        problems.push(format!(
            "{} of {} notes failed to convert",
            report.failed(),
            report.files.len()
        ));
    }
    if !report.failed_assets.is_empty() {
        problems.push(format!("{} assets failed to copy", report.failed_assets.len()));
    }
    Err(problems.join(", ").into())
}
