//! # Codedesk Workspace
//!
//! Sandboxed access to a single local directory.
//!
//! ## Pipeline
//!
//! ```text
//! relative path
//!     │
//!     ├──> PathResolver (join + canonicalize + containment)
//!     │      └─> absolute path inside root, or AccessDenied
//!     │
//!     ├──> TreeScanner (stack walk, hidden entries dropped)
//!     │      └─> ordered Entry tree
//!     │
//!     └──> FileStore (read lossy text / write via temp + rename)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use codedesk_workspace::{LocalWorkspace, ScanOptions};
//!
//! fn main() -> codedesk_workspace::Result<()> {
//!     let workspace = LocalWorkspace::new("/path/to/code", ScanOptions::default());
//!     let tree = workspace.tree()?;
//!     let source = workspace.read("lab1/main.cpp")?;
//!
//!     println!("{} top-level entries, {} chars", tree.len(), source.len());
//!     Ok(())
//! }
//! ```

mod error;
mod local;
mod resolver;
mod scanner;
mod store;

pub use error::{Result, WorkspaceError};
pub use local::LocalWorkspace;
pub use resolver::{PathResolver, ResolvedPath};
pub use scanner::{ScanOptions, TreeScanner, DEFAULT_MAX_DEPTH};
pub use store::FileStore;
