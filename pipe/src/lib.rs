//! Duplex pipe endpoint provisioning.
//!
//! - Unix: FIFO special file created with `mkfifo` and opened read+write
//! - Windows: native named pipe
//!
//! Both variants expose the same `provision` operation returning a
//! `PipeEndpoint` that implements `AsyncRead` + `AsyncWrite`, so callers
//! do not care which platform branch produced it.

#[cfg(unix)]
pub use unix::pipe;
#[cfg(windows)]
pub use windows::pipe;

pub use error::ProvisionError;

mod error;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;
