use crate::{PathResolver, Result, WorkspaceError};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read/write access to files under the root, gated by [`PathResolver`].
#[derive(Debug, Clone)]
pub struct FileStore {
    resolver: PathResolver,
}

impl FileStore {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Read a file as text. Invalid UTF-8 is replaced rather than rejected.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.resolver.resolve_contained(relative)?;
        let bytes = fs::read(&path).map_err(WorkspaceError::from_read)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Create or replace a file with `content`.
    ///
    /// Parent directories must already exist. The content lands in a temporary sibling first
    /// and is persisted over the target, keeping the target's permission bits. Read-only
    /// targets are refused.
    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.resolver.resolve_contained(relative)?;
        if path == self.resolver.root() || path.is_dir() {
            let err = io::Error::new(io::ErrorKind::InvalidInput, "target is a directory");
            return Err(err.into());
        }

        let permissions = match fs::metadata(&path) {
            Ok(meta) if meta.permissions().readonly() => {
                log::warn!("Refusing to overwrite read-only file {relative}");
                return Err(WorkspaceError::PermissionDenied);
            }
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(content.as_bytes())?;
        if let Some(permissions) = permissions {
            tmp.as_file().set_permissions(permissions)?;
        }
        tmp.persist(&path).map_err(|e| e.error)?;

        log::debug!("Wrote {} bytes to {relative}", content.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileStore;
    use crate::{PathResolver, WorkspaceError};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn store_at(root: &std::path::Path) -> FileStore {
        FileStore::new(PathResolver::new(root))
    }

    #[test]
    fn write_then_read_round_trips() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("folder")).unwrap();
        let store = store_at(temp.path());

        let content = "int main() {\n    return 0; // ünïcode ✓\n}\n";
        store.write("folder/bai1.cpp", content).unwrap();
        assert_eq!(store.read("folder/bai1.cpp").unwrap(), content);

        store.write("folder/bai1.cpp", "short").unwrap();
        assert_eq!(store.read("folder/bai1.cpp").unwrap(), "short");

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("folder"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("bai1.cpp")]);
    }

    #[test]
    fn escaping_paths_are_denied_without_io() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("ws");
        fs::create_dir_all(&root).unwrap();
        fs::write(temp.path().join("secret.txt"), b"secret").unwrap();
        let store = store_at(&root);

        assert!(matches!(
            store.read("../secret.txt"),
            Err(WorkspaceError::AccessDenied)
        ));
        assert!(matches!(
            store.write("../planted.txt", "x"),
            Err(WorkspaceError::AccessDenied)
        ));
        assert!(!temp.path().join("planted.txt").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("secret.txt")).unwrap(),
            "secret"
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = tempdir().unwrap();
        let store = store_at(temp.path());
        assert!(matches!(
            store.read("nope.txt"),
            Err(WorkspaceError::NotFound)
        ));
    }

    #[test]
    fn invalid_utf8_is_tolerated() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("bin.dat"), [b'o', b'k', 0xff, 0xfe, b'!']).unwrap();
        let store = store_at(temp.path());

        assert_eq!(store.read("bin.dat").unwrap(), "ok\u{fffd}\u{fffd}!");
    }

    #[test]
    fn write_does_not_create_parents() {
        let temp = tempdir().unwrap();
        let store = store_at(temp.path());

        let err = store.write("missing/dir/file.txt", "x").unwrap_err();
        assert!(matches!(err, WorkspaceError::Io(_)), "got {err:?}");
        assert!(!temp.path().join("missing").exists());
    }

    #[test]
    fn writing_a_directory_fails() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("dir")).unwrap();
        let store = store_at(temp.path());

        assert!(matches!(store.write("", "x"), Err(WorkspaceError::Io(_))));
        assert!(matches!(store.write("dir", "x"), Err(WorkspaceError::Io(_))));
        assert!(temp.path().join("dir").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let script = temp.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\necho v1\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let store = store_at(temp.path());

        store.write("run.sh", "#!/bin/sh\necho v2\n").unwrap();

        let mode = fs::metadata(&script).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
        assert_eq!(fs::read_to_string(&script).unwrap(), "#!/bin/sh\necho v2\n");
    }

    #[cfg(unix)]
    #[test]
    fn read_only_target_is_refused() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let locked = temp.path().join("locked.txt");
        fs::write(&locked, "v1").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o444)).unwrap();
        let store = store_at(temp.path());

        assert!(matches!(
            store.write("locked.txt", "v2"),
            Err(WorkspaceError::PermissionDenied)
        ));
        assert_eq!(fs::read_to_string(&locked).unwrap(), "v1");
        let mode = fs::metadata(&locked).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o444);
    }
}
