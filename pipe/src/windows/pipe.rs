use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::windows::named_pipe::{NamedPipeServer, ServerOptions};

use crate::error::ProvisionError;

/// Bare pipe names are resolved into the named pipe filesystem.
pub const PIPE_NAME_PREFIX: &str = r"\\.\pipe\";

/// Resolve a logical pipe name to a named pipe path.
///
/// Names already rooted in the pipe namespace are used verbatim.
pub fn resolve_path(name: &str) -> PathBuf {
    if name.starts_with(PIPE_NAME_PREFIX) {
        return PathBuf::from(name);
    }
    PathBuf::from(format!("{}{}", PIPE_NAME_PREFIX, name))
}

/// Create the named pipe for `name` and return it as a duplex endpoint.
///
/// `mode` carries POSIX permission bits and has no meaning here; it is
/// accepted for signature parity with the fifo branch and ignored.
pub fn provision(name: &str, _mode: u32) -> Result<PipeEndpoint, ProvisionError> {
    let path = resolve_path(name);
    let server = match ServerOptions::new()
        .first_pipe_instance(true)
        .create(&path)
    {
        Ok(server) => server,
        Err(e) => return Err(ProvisionError::create_failed_io(path, e)),
    };

    log::debug!("Created named pipe at {:?}", path);
    Ok(PipeEndpoint { pipe: server, path })
}

/// Duplex stream over a native named pipe instance.
pub struct PipeEndpoint {
    pipe: NamedPipeServer,
    path: PathBuf,
}

impl PipeEndpoint {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for a client to connect to this pipe instance.
    pub async fn connect(&self) -> io::Result<()> {
        self.pipe.connect().await
    }
}

impl AsyncRead for PipeEndpoint {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.pipe).poll_read(cx, buf)
    }
}

impl AsyncWrite for PipeEndpoint {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.pipe).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.pipe).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.pipe).poll_shutdown(cx)
    }
}
