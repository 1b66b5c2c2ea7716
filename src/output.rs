use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::cycles::relative_display;
use crate::graph::FileImports;
use crate::graph::components::ImportComponent;
use crate::report::Diagnostic;

fn header(s: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[1m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

fn to_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Print diagnostics from `check` to stdout.
pub fn print_diagnostics(diagnostics: &[Diagnostic], format: &OutputFormat, project_root: &Path) {
    let use_color = std::io::stdout().is_terminal();
    print!("{}", render_diagnostics(diagnostics, format, project_root, use_color));
}

pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    format: &OutputFormat,
    project_root: &Path,
    use_color: bool,
) -> String {
    let mut out = String::new();
    match format {
        OutputFormat::Compact => {
            for d in diagnostics {
                let _ = writeln!(
                    out,
                    "{}:{}:{} {} [{}] {}",
                    relative_display(&d.location.file, project_root),
                    d.location.line,
                    d.location.column,
                    d.message,
                    d.strategy,
                    d.suggested_fix,
                );
            }
            let _ = writeln!(out, "{} cycles found", diagnostics.len());
        }

        OutputFormat::Table => {
            for (i, d) in diagnostics.iter().enumerate() {
                let _ = writeln!(out, "{}", header(&format!("=== Cycle {} ===", i + 1), use_color));
                let _ = writeln!(
                    out,
                    "  at        {}:{}:{}",
                    relative_display(&d.location.file, project_root),
                    d.location.line,
                    d.location.column,
                );
                let _ = writeln!(out, "  import    {}", d.specifier);
                let _ = writeln!(out, "  cycle     {}", d.cycle_display);
                let _ = writeln!(out, "  strategy  {}", d.strategy);
                let _ = writeln!(out, "  fix       {}", d.suggested_fix);
                let _ = writeln!(out);
            }
            let _ = writeln!(out, "{} cycles found", diagnostics.len());
        }

        OutputFormat::Json => {
            let json_results: Vec<serde_json::Value> = diagnostics
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "location": {
                            "file": relative_display(&d.location.file, project_root),
                            "line": d.location.line,
                            "column": d.location.column,
                        },
                        "strategy": d.strategy,
                        "cycle_display": d.cycle_display,
                        "suggested_fix": d.suggested_fix,
                        "message": d.message,
                        "specifier": d.specifier,
                        "signature": d.signature,
                    })
                })
                .collect();
            let _ = writeln!(out, "{}", to_json(&serde_json::Value::Array(json_results)));
        }
    }
    out
}

/// Print strongly connected components from `components` to stdout.
pub fn print_components(components: &[ImportComponent], format: &OutputFormat, project_root: &Path) {
    let use_color = std::io::stdout().is_terminal();
    print!("{}", render_components(components, format, project_root, use_color));
}

pub fn render_components(
    components: &[ImportComponent],
    format: &OutputFormat,
    project_root: &Path,
    use_color: bool,
) -> String {
    let mut out = String::new();
    let rel = |files: &[std::path::PathBuf]| -> Vec<String> {
        files.iter().map(|p| relative_display(p, project_root)).collect()
    };

    match format {
        OutputFormat::Compact => {
            for c in components {
                let _ = writeln!(out, "cycle {}", rel(&c.files).join(" -> "));
            }
            let _ = writeln!(out, "{} cycles found", components.len());
        }

        OutputFormat::Table => {
            for (i, c) in components.iter().enumerate() {
                let _ = writeln!(out, "{}", header(&format!("=== Cycle {} ({} files) ===", i + 1, c.len()), use_color));
                // Show all but the last entry (which is the repeated first file).
                let unique_files = &c.files[..c.files.len().saturating_sub(1)];
                for path in rel(unique_files) {
                    let _ = writeln!(out, "  {path}");
                }
                let _ = writeln!(out);
            }
            let _ = writeln!(out, "{} cycles found", components.len());
        }

        OutputFormat::Json => {
            let json_results: Vec<serde_json::Value> = components
                .iter()
                .map(|c| serde_json::json!({ "files": rel(&c.files) }))
                .collect();
            let _ = writeln!(out, "{}", to_json(&serde_json::Value::Array(json_results)));
        }
    }
    out
}

/// Print one file's imports from `imports` to stdout.
pub fn print_imports(imports: &FileImports, format: &OutputFormat, project_root: &Path) {
    let use_color = std::io::stdout().is_terminal();
    print!("{}", render_imports(imports, format, project_root, use_color));
}

pub fn render_imports(imports: &FileImports, format: &OutputFormat, project_root: &Path, use_color: bool) -> String {
    struct Row {
        line: usize,
        column: usize,
        kind: &'static str,
        type_only: bool,
        specifier: String,
        target: Option<String>,
    }

    let mut rows: Vec<Row> = imports
        .edges
        .iter()
        .map(|e| Row {
            line: e.line,
            column: e.column,
            kind: e.kind.as_str(),
            type_only: e.type_only,
            specifier: e.specifier.clone(),
            target: Some(relative_display(&e.to_file, project_root)),
        })
        .chain(imports.unresolved.iter().map(|i| Row {
            line: i.line,
            column: i.column,
            kind: i.kind.as_str(),
            type_only: i.type_only,
            specifier: i.specifier.clone(),
            target: None,
        }))
        .collect();
    rows.sort_by_key(|r| (r.line, r.column));

    let mut out = String::new();
    match format {
        OutputFormat::Compact => {
            for r in &rows {
                let kind = if r.type_only {
                    format!("{} type", r.kind)
                } else {
                    r.kind.to_string()
                };
                let target = r.target.as_deref().unwrap_or("unresolved");
                let _ = writeln!(out, "{}:{} {kind} {} -> {target}", r.line, r.column, r.specifier);
            }
            let _ = writeln!(out, "{} imports found", rows.len());
        }

        OutputFormat::Table => {
            let spec_w = rows.iter().map(|r| r.specifier.len()).max().unwrap_or(9).max(9);
            let title = format!("{:>4}  {:<10}  {:<4}  {:<spec_w$}  TARGET", "LINE", "KIND", "TYPE", "SPECIFIER");
            let _ = writeln!(out, "{}", header(&title, use_color));
            let _ = writeln!(out, "{}", "-".repeat(spec_w + 34));
            for r in &rows {
                let _ = writeln!(
                    out,
                    "{:>4}  {:<10}  {:<4}  {:<spec_w$}  {}",
                    r.line,
                    r.kind,
                    if r.type_only { "yes" } else { "" },
                    r.specifier,
                    r.target.as_deref().unwrap_or("unresolved"),
                );
            }
        }

        OutputFormat::Json => {
            let json_results: Vec<serde_json::Value> = rows
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "line": r.line,
                        "column": r.column,
                        "kind": r.kind,
                        "type_only": r.type_only,
                        "specifier": r.specifier,
                        "target": r.target,
                    })
                })
                .collect();
            let _ = writeln!(out, "{}", to_json(&serde_json::Value::Array(json_results)));
        }
    }
    out
}
