pub mod imports;
pub mod languages;

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Parser, Tree};

use imports::{ImportInfo, extract_imports};
use languages::Grammar;

// Thread-local Parser instances: one per rayon worker thread, no locking.
// Each Parser is created lazily the first time its grammar is needed on that thread.
thread_local! {
    static PARSERS: RefCell<HashMap<Grammar, Parser>> = RefCell::new(HashMap::new());
}

fn parse_tree(grammar: Grammar, source: &[u8], path: &Path) -> Result<Tree> {
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(grammar) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser
                    .set_language(&grammar.language())
                    .with_context(|| format!("failed to set tree-sitter language {grammar:?}"))?;
                entry.insert(parser)
            }
        };
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow!("tree-sitter returned None for {:?}", path))
    })
}

/// Parse a source file and extract every module reference it makes.
///
/// Safe to call from rayon workers: each thread reuses its own parsers.
///
/// # Errors
/// Returns an error if:
/// - The file extension is unsupported
/// - `tree-sitter` returns `None` (malformed / truncated source)
pub fn parse_imports(path: &Path, source: &str) -> Result<Vec<ImportInfo>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let grammar =
        Grammar::for_extension(ext).ok_or_else(|| anyhow!("unsupported file extension: {:?}", ext))?;

    let tree = parse_tree(grammar, source.as_bytes(), path)?;
    Ok(extract_imports(&tree, source.as_bytes(), grammar))
}
