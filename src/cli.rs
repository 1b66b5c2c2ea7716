use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cycles::strategy::StrategyChoice;

/// Circular import detection for TypeScript/JavaScript projects.
///
/// cycle-guard follows static imports from each file, reports every loop once at
/// the import that closes it, and suggests a mechanical way to break it.
#[derive(Parser, Debug)]
#[command(
    name = "cycle-guard",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log analysis details to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results.
#[derive(Clone, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Compact one-line-per-result format (default).
    #[default]
    Compact,
    /// Human-readable layout with optional ANSI color when stdout is a terminal.
    Table,
    /// Structured JSON array suitable for programmatic consumption.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lint files for circular imports. Exits with status 1 when any cycle is reported.
    Check {
        /// Path to the project root.
        path: PathBuf,

        /// Lint only these files (relative to the project root). Defaults to every source file.
        #[arg(long = "file")]
        files: Vec<PathBuf>,

        /// Longest import chain to follow (overrides max_depth).
        #[arg(long)]
        max_depth: Option<usize>,

        /// Report every cycle found from each file, not just the first.
        #[arg(long)]
        all_cycles: bool,

        /// Fix strategy to suggest (overrides fix_strategy).
        #[arg(long, value_enum)]
        strategy: Option<StrategyChoice>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// List strongly connected components of the project's static import graph.
    ///
    /// Uses Kosaraju's SCC algorithm. Each component is a set of files that import
    /// each other directly or transitively, regardless of max_depth.
    Components {
        /// Path to the project root.
        path: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Show how each import of one file resolves.
    Imports {
        /// File to inspect (relative to the project root).
        file: PathBuf,

        /// Path to the project root.
        path: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_flags() {
        let cli = Cli::try_parse_from([
            "cycle-guard",
            "check",
            "proj",
            "--file",
            "src/a.ts",
            "--file",
            "src/b.ts",
            "--max-depth",
            "3",
            "--all-cycles",
            "--strategy",
            "direct-import",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Check {
                path,
                files,
                max_depth,
                all_cycles,
                strategy,
                format,
            } => {
                assert_eq!(path, PathBuf::from("proj"));
                assert_eq!(files.len(), 2);
                assert_eq!(max_depth, Some(3));
                assert!(all_cycles);
                assert_eq!(strategy, Some(StrategyChoice::DirectImport));
                assert!(matches!(format, OutputFormat::Json));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_imports_takes_file_then_root() {
        let cli = Cli::try_parse_from(["cycle-guard", "imports", "src/a.ts", "."]).unwrap();
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Imports { ref file, .. } if file == &PathBuf::from("src/a.ts")
        ));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["cycle-guard", "check", ".", "--strategy", "magic"]).is_err());
    }
}
