use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// The requested path resolves outside the root. Never carries the resolved path.
    #[error("Access Denied")]
    AccessDenied,

    #[error("File not found")]
    NotFound,

    #[error("Directory not found")]
    RootNotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkspaceError {
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(err),
        }
    }
}
