use std::io;
use std::path::Path;

/// Read-only filesystem access used by the analysis session.
///
/// The session never touches `std::fs` directly, so tests can run the whole
/// pipeline against an in-memory tree.
pub trait FileSystem {
    /// Returns `true` if `path` names an existing regular file.
    fn exists(&self, path: &Path) -> bool;

    /// Read the whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
pub use memory::MemoryFileSystem;
