use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error raised while provisioning a pipe endpoint.
///
/// Every variant carries the resolved filesystem path, the raw platform
/// error code and the translated error message, so callers can log or
/// match without reaching back into OS state.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The pipe object could not be created (already exists, permission
    /// denied, bad path).
    #[error("Failed to create pipe at {path:?}: {message} (os error {code})")]
    CreateFailed {
        path: PathBuf,
        code: i32,
        message: String,
    },

    /// The pipe exists but could not be opened in duplex non-blocking
    /// mode.
    #[error("Failed to open pipe at {path:?}: {message} (os error {code})")]
    OpenFailed {
        path: PathBuf,
        code: i32,
        message: String,
    },

    /// The handle was opened but could not be adapted to the async
    /// duplex stream. The handle is closed before this is returned.
    #[error("Failed to wrap pipe handle for {path:?}: {message}")]
    WrapFailed {
        path: PathBuf,
        code: i32,
        message: String,
    },
}

impl ProvisionError {
    #[cfg(unix)]
    pub(crate) fn create_failed(path: PathBuf, errno: nix::errno::Errno) -> Self {
        ProvisionError::CreateFailed {
            path,
            code: errno as i32,
            message: errno.desc().to_string(),
        }
    }

    #[cfg(unix)]
    pub(crate) fn open_failed(path: PathBuf, errno: nix::errno::Errno) -> Self {
        ProvisionError::OpenFailed {
            path,
            code: errno as i32,
            message: errno.desc().to_string(),
        }
    }

    #[cfg(windows)]
    pub(crate) fn create_failed_io(path: PathBuf, err: io::Error) -> Self {
        ProvisionError::CreateFailed {
            path,
            code: err.raw_os_error().unwrap_or(0),
            message: err.to_string(),
        }
    }

    pub(crate) fn wrap_failed(path: PathBuf, err: io::Error) -> Self {
        ProvisionError::WrapFailed {
            path,
            code: err.raw_os_error().unwrap_or(0),
            message: err.to_string(),
        }
    }

    /// The resolved path the failed attempt was addressing.
    pub fn path(&self) -> &Path {
        match self {
            ProvisionError::CreateFailed { path, .. } => path,
            ProvisionError::OpenFailed { path, .. } => path,
            ProvisionError::WrapFailed { path, .. } => path,
        }
    }

    /// The raw platform error code, untranslated.
    pub fn code(&self) -> i32 {
        match self {
            ProvisionError::CreateFailed { code, .. } => *code,
            ProvisionError::OpenFailed { code, .. } => *code,
            ProvisionError::WrapFailed { code, .. } => *code,
        }
    }
}
