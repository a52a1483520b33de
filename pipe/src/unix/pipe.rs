use std::env;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::ready;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::error::ProvisionError;

/// Bare pipe names are resolved under the system temp directory with
/// this prefix, the same location the native branch addresses, so a
/// logical name means the same endpoint on every platform path.
pub const PIPE_NAME_PREFIX: &str = "pipehost-";

/// Resolve a logical pipe name to a filesystem path.
///
/// Absolute names are used verbatim.  Anything else lands under the
/// temp directory as `pipehost-<name>`.
pub fn resolve_path(name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::temp_dir().join(format!("{}{}", PIPE_NAME_PREFIX, name))
}

/// Create a FIFO at the resolved path for `name` and open it as a duplex
/// endpoint.
///
/// `mode` is the POSIX permission bits for the new FIFO, forwarded to
/// `mkfifo` unmodified (0o666 is rw-rw-rw-).  The FIFO is opened
/// read+write and non-blocking so a server can sit on the endpoint
/// without a peer present.  The filesystem entry is never removed by
/// this crate, on failure or on endpoint shutdown; unlinking is the
/// caller's policy.  Provisioning a name whose FIFO already exists fails
/// with `CreateFailed`.
///
/// Must be called from within a tokio runtime, the handle is registered
/// with the reactor as part of the wrap step.
pub fn provision(name: &str, mode: u32) -> Result<PipeEndpoint, ProvisionError> {
    let path = resolve_path(name);

    if let Err(errno) = nix::unistd::mkfifo(&path, Mode::from_bits_truncate(mode as nix::sys::stat::mode_t)) {
        return Err(ProvisionError::create_failed(path, errno));
    }

    let flags = OFlag::O_RDWR | OFlag::O_NONBLOCK | OFlag::O_ASYNC;
    let fd = match nix::fcntl::open(&path, flags, Mode::empty()) {
        // The fifo is left on disk when open fails; a retry will see
        // already-exists at the create step instead of re-creating.
        Ok(fd) => unsafe { OwnedFd::from_raw_fd(fd) },
        Err(errno) => return Err(ProvisionError::open_failed(path, errno)),
    };

    log::debug!("Created fifo at {:?}", path);
    wrap(path, fd)
}

fn wrap(path: PathBuf, fd: OwnedFd) -> Result<PipeEndpoint, ProvisionError> {
    match AsyncFd::new(fd) {
        Ok(fd) => Ok(PipeEndpoint { fd, path }),
        Err(e) => {
            // AsyncFd::new consumed the descriptor, so it is closed by
            // the time the error is surfaced.
            log::warn!("Failed to register pipe fd for {:?}. {}", path, e);
            Err(ProvisionError::wrap_failed(path, e))
        }
    }
}

/// Duplex stream over a provisioned FIFO.
///
/// Owns the file descriptor for its whole lifetime; dropping the
/// endpoint closes it.  The filesystem entry stays behind.
#[derive(Debug)]
pub struct PipeEndpoint {
    fd: AsyncFd<OwnedFd>,
    path: PathBuf,
}

impl PipeEndpoint {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRawFd for PipeEndpoint {
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

impl AsyncRead for PipeEndpoint {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            let mut guard = ready!(this.fd.poll_read_ready(cx))?;
            match guard.try_io(|fd| {
                nix::unistd::read(fd.get_ref().as_raw_fd(), buf.initialize_unfilled())
                    .map_err(io::Error::from)
            }) {
                Ok(Ok(n)) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Ok(Err(e)) => return Poll::Ready(Err(e)),
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsyncWrite for PipeEndpoint {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        loop {
            let mut guard = ready!(this.fd.poll_write_ready(cx))?;
            match guard.try_io(|fd| {
                nix::unistd::write(fd.get_ref().as_raw_fd(), buf).map_err(io::Error::from)
            }) {
                Ok(result) => return Poll::Ready(result),
                Err(_would_block) => continue,
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // Writes go straight to the fifo, nothing buffered here.
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
