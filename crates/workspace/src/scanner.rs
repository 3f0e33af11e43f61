use crate::{Result, WorkspaceError};
use codedesk_protocol::Entry;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Number of directory levels listed below the root. Folders at the last level are
    /// reported with empty children.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Builds the ordered entry tree of a directory.
pub struct TreeScanner {
    root: PathBuf,
    options: ScanOptions,
}

struct RawEntry {
    name: String,
    rel_path: String,
    abs_path: PathBuf,
    is_dir: bool,
}

struct PendingDir {
    // None for the root frame.
    folder: Option<(String, String)>,
    depth: usize,
    queue: std::vec::IntoIter<RawEntry>,
    children: Vec<Entry>,
}

impl TreeScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_options(root, ScanOptions::default())
    }

    pub fn with_options(root: impl AsRef<Path>, options: ScanOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    /// Walk the root with an explicit stack of pending directories.
    ///
    /// Folders come before files, names compare case-insensitively, and hidden entries are
    /// dropped at every level. Unreadable subdirectories end up with empty children; only an
    /// unreadable root is an error.
    pub fn scan(&self) -> Result<Vec<Entry>> {
        let meta = fs::metadata(&self.root).map_err(root_error)?;
        if !meta.is_dir() {
            return Err(WorkspaceError::RootNotFound);
        }
        let canonical_root = self.root.canonicalize().map_err(root_error)?;
        let root_entries = list_dir(&self.root, "").map_err(root_error)?;

        let mut visited = HashSet::new();
        visited.insert(canonical_root.clone());

        let mut stack = vec![PendingDir {
            folder: None,
            depth: 1,
            queue: root_entries.into_iter(),
            children: Vec::new(),
        }];
        let mut total = 0usize;

        loop {
            let Some(top) = stack.last_mut() else {
                break;
            };
            let depth = top.depth;
            match top.queue.next() {
                Some(raw) if raw.is_dir => {
                    total += 1;
                    match self.expand(&raw, depth, &canonical_root, &mut visited) {
                        Some(entries) => stack.push(PendingDir {
                            folder: Some((raw.name, raw.rel_path)),
                            depth: depth + 1,
                            queue: entries.into_iter(),
                            children: Vec::new(),
                        }),
                        None => push_child(
                            &mut stack,
                            Entry::folder(raw.name, raw.rel_path, Vec::new()),
                        ),
                    }
                }
                Some(raw) => {
                    total += 1;
                    push_child(&mut stack, Entry::file(raw.name, raw.rel_path));
                }
                None => {
                    let Some(done) = stack.pop() else {
                        break;
                    };
                    match done.folder {
                        Some((name, path)) => {
                            push_child(&mut stack, Entry::folder(name, path, done.children))
                        }
                        None => {
                            log::debug!("Scanned {total} entries under {}", self.root.display());
                            return Ok(done.children);
                        }
                    }
                }
            }
        }

        Ok(Vec::new())
    }

    // Returns the sorted listing of a folder, or None when it must stay collapsed.
    fn expand(
        &self,
        raw: &RawEntry,
        depth: usize,
        canonical_root: &Path,
        visited: &mut HashSet<PathBuf>,
    ) -> Option<Vec<RawEntry>> {
        if depth >= self.options.max_depth {
            log::debug!("Depth limit reached at {}", raw.rel_path);
            return None;
        }

        let canonical = match raw.abs_path.canonicalize() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Failed to resolve {}: {e}", raw.rel_path);
                return None;
            }
        };
        if !canonical.starts_with(canonical_root) {
            log::debug!("Not expanding {}: resolves outside root", raw.rel_path);
            return None;
        }
        if !visited.insert(canonical) {
            log::debug!("Not expanding {}: already visited", raw.rel_path);
            return None;
        }

        match list_dir(&raw.abs_path, &raw.rel_path) {
            Ok(entries) => Some(entries),
            Err(e) => {
                log::warn!("Failed to list {}: {e}", raw.rel_path);
                Some(Vec::new())
            }
        }
    }
}

fn push_child(stack: &mut [PendingDir], entry: Entry) {
    if let Some(top) = stack.last_mut() {
        top.children.push(entry);
    }
}

fn root_error(err: io::Error) -> WorkspaceError {
    match err.kind() {
        io::ErrorKind::NotFound => WorkspaceError::RootNotFound,
        io::ErrorKind::PermissionDenied => WorkspaceError::PermissionDenied,
        _ => WorkspaceError::Io(err),
    }
}

fn list_dir(dir: &Path, rel_prefix: &str) -> io::Result<Vec<RawEntry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                log::warn!("Failed to read entry in {}: {e}", dir.display());
                continue;
            }
        };

        let name = item.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }

        let abs_path = item.path();
        // Follows symlinks; a dangling link is listed as a file.
        let is_dir = fs::metadata(&abs_path)
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        let rel_path = if rel_prefix.is_empty() {
            name.clone()
        } else {
            format!("{rel_prefix}/{name}")
        };

        entries.push(RawEntry {
            name,
            rel_path,
            abs_path,
            is_dir,
        });
    }

    entries.sort_by_cached_key(|entry| {
        (
            !entry.is_dir,
            entry.name.to_lowercase(),
            entry.name.clone(),
        )
    });
    Ok(entries)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
