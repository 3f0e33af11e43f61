use crate::{Result, WorkspaceError};
use std::path::{Component, Path, PathBuf};

/// Outcome of resolving a caller-supplied path against the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub absolute: PathBuf,
    pub contained: bool,
}

/// Resolves relative paths against a fixed root and proves containment.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let absolute = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root: canonicalize_lenient(&lexical_normalize(&absolute)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `relative` onto the root, resolve `.`/`..` and symlinks, and report containment.
    ///
    /// Containment is decided on the resolved form, never on the naive join, so `..` segments
    /// and absolute overrides cannot escape.
    pub fn resolve(&self, relative: &str) -> ResolvedPath {
        let joined = if relative.trim().is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        };
        let absolute = canonicalize_lenient(&lexical_normalize(&joined));
        let contained = absolute.starts_with(&self.root);
        ResolvedPath {
            absolute,
            contained,
        }
    }

    pub fn resolve_contained(&self, relative: &str) -> Result<PathBuf> {
        let resolved = self.resolve(relative);
        if !resolved.contained {
            log::warn!("Refusing path outside root: {relative:?}");
            return Err(WorkspaceError::AccessDenied);
        }
        Ok(resolved.absolute)
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    out
}

// Canonicalize the deepest existing ancestor and re-append the missing tail, so paths that
// are about to be created still get symlink resolution on their parents.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for name in tail.iter().rev() {
                out.push(name);
            }
            return out;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
