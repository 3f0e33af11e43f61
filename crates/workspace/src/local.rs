use crate::{FileStore, PathResolver, Result, ScanOptions, TreeScanner};
use codedesk_protocol::Entry;
use std::path::Path;

/// The root directory together with the operations allowed on it.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    store: FileStore,
    scan: ScanOptions,
}

impl LocalWorkspace {
    pub fn new(root: impl AsRef<Path>, scan: ScanOptions) -> Self {
        Self {
            store: FileStore::new(PathResolver::new(root)),
            scan,
        }
    }

    pub fn root(&self) -> &Path {
        self.store.resolver().root()
    }

    pub fn root_exists(&self) -> bool {
        self.root().is_dir()
    }

    pub fn tree(&self) -> Result<Vec<Entry>> {
        TreeScanner::with_options(self.root(), self.scan.clone()).scan()
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        self.store.read(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        self.store.write(relative, content)
    }
}
