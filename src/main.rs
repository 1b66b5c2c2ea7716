mod cli;
mod config;
mod cycles;
mod fs;
mod graph;
mod output;
mod parser;
mod report;
mod resolver;
mod session;
mod walker;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use config::{CycleGuardConfig, IgnoreMatcher};
use fs::OsFileSystem;
use resolver::{TsconfigPaths, normalize_path, project_aliases};
use session::AnalysisSession;
use walker::walk_project;

/// Exit status when the run itself fails (bad root, bad configuration).
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Returns status 1 when `check` reports any cycle.
fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Check {
            path,
            files,
            max_depth,
            all_cycles,
            strategy,
            format,
        } => {
            let root = project_root(&path)?;
            let mut config = load_config(&root)?;
            if let Some(depth) = max_depth {
                config.max_depth = depth;
            }
            if all_cycles {
                config.report_all_cycles = true;
            }
            if let Some(strategy) = strategy {
                config.fix_strategy = strategy;
            }

            let mut session = new_session(&root, &config)?;
            let walked = walk_project(&root, &IgnoreMatcher::new(&root, &config.ignore_patterns)?)?;
            let targets: Vec<PathBuf> = if files.is_empty() {
                walked.clone()
            } else {
                files.iter().map(|f| normalize_path(&root.join(f))).collect()
            };

            info!(root = %root.display(), files = walked.len(), "checking project");
            session.graph().preload(&walked);
            let diagnostics = session.lint_files(&targets);

            output::print_diagnostics(&diagnostics, &format, session.root());
            if diagnostics.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }

        Commands::Components { path, format } => {
            let root = project_root(&path)?;
            let config = load_config(&root)?;
            let mut session = new_session(&root, &config)?;
            let files = walk_project(&root, &IgnoreMatcher::new(&root, &config.ignore_patterns)?)?;

            session.graph().preload(&files);
            let components = graph::components::find_components(session.graph(), &files);
            output::print_components(&components, &format, &root);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Imports { file, path, format } => {
            let root = project_root(&path)?;
            let config = load_config(&root)?;
            let mut session = new_session(&root, &config)?;

            let file = normalize_path(&root.join(&file));
            if !file.is_file() {
                anyhow::bail!("{} is not a file", file.display());
            }
            let imports = session.graph().imports(&file);
            output::print_imports(&imports, &format, &root);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// stderr only; stdout carries results. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "cycle_guard=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

fn project_root(path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("cannot open project root {}", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }
    Ok(root)
}

fn load_config(root: &Path) -> Result<CycleGuardConfig> {
    CycleGuardConfig::load(root).with_context(|| format!("invalid configuration in {}", root.display()))
}

fn new_session(root: &Path, config: &CycleGuardConfig) -> Result<AnalysisSession<OsFileSystem>> {
    let aliases = project_aliases(root, &config.aliases, config.workspace_aliases);
    let tsconfig = if config.workspace_aliases {
        TsconfigPaths::load(root, &config.extensions)
    } else {
        None
    };
    let session = AnalysisSession::new(OsFileSystem, root, config, aliases).context("invalid configuration")?;
    Ok(session.with_tsconfig(tsconfig))
}
