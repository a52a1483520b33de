//! Integration tests for fifo endpoint provisioning.
//!
//! These run against the real filesystem under the temp directory and
//! clean up the fifos they create; the provisioner itself never does.

#![cfg(unix)]

use std::fs;
use std::io::{Read, Write};
use std::os::unix::fs::FileTypeExt;

use nix::errno::Errno;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use pipehost_pipe::pipe;
use pipehost_pipe::ProvisionError;

fn unique_name(tag: &str) -> String {
    format!("{}-{}", tag, std::process::id())
}

/// Provisioning a live name a second time reports already-exists from
/// the create step and leaves the entry alone.
#[tokio::test]
async fn test_provision_twice_fails_with_create_failed() {
    let name = unique_name("twice");
    let path = pipe::resolve_path(&name);
    let _ = fs::remove_file(&path);

    let endpoint = pipe::provision(&name, 0o666).unwrap();
    assert!(fs::metadata(&path).unwrap().file_type().is_fifo());

    match pipe::provision(&name, 0o666) {
        Err(ProvisionError::CreateFailed { code, .. }) => {
            assert_eq!(Errno::EEXIST as i32, code);
        }
        Ok(_) => panic!("Expected CreateFailed, got an endpoint"),
        Err(other) => panic!("Expected CreateFailed, got {:?}", other),
    }

    // first endpoint unaffected, entry still present
    assert!(fs::metadata(&path).unwrap().file_type().is_fifo());
    drop(endpoint);
    fs::remove_file(&path).unwrap();
}

/// A failed create attempts no open or wrap and reports the platform
/// error code verbatim.
#[test]
fn test_create_failure_short_circuits() {
    let err = pipe::provision("/nonexistent-pipehost-dir/endpoint", 0o666).unwrap_err();
    match err {
        ProvisionError::CreateFailed { code, ref path, .. } => {
            assert_eq!(Errno::ENOENT as i32, code);
            assert_eq!("/nonexistent-pipehost-dir/endpoint", path.to_str().unwrap());
        }
        other => panic!("Expected CreateFailed, got {:?}", other),
    }
}

/// When the open step fails the fifo is left on the filesystem for
/// inspection or retry.
#[tokio::test]
async fn test_open_failure_leaves_fifo_in_place() {
    let name = unique_name("unopenable");
    let path = pipe::resolve_path(&name);
    let _ = fs::remove_file(&path);

    match pipe::provision(&name, 0o000) {
        Err(ProvisionError::OpenFailed { code, .. }) => {
            assert_eq!(Errno::EACCES as i32, code);
            assert!(fs::metadata(&path).unwrap().file_type().is_fifo());
        }
        Ok(_) => {
            // root ignores permission bits and the open goes through
            assert!(nix::unistd::Uid::effective().is_root());
        }
        Err(other) => panic!("Expected OpenFailed, got {:?}", other),
    }

    fs::remove_file(&path).unwrap();
}

/// Bytes written through one reference to the fifo come back out of
/// another reference to the same file, in both directions.
#[tokio::test]
async fn test_end_to_end_duplex() {
    let path = pipe::resolve_path("test-channel");
    let _ = fs::remove_file(&path);

    let mut endpoint = pipe::provision("test-channel", 0o666).unwrap();
    assert_eq!(&path, endpoint.path());

    // Second reference to the same underlying file.  The endpoint holds
    // the fifo open read+write, so this open does not block.
    let mut peer = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();

    peer.write_all(&[1, 2, 3]).unwrap();
    let mut buf = [0u8; 8];
    let n = endpoint.read(&mut buf).await.unwrap();
    assert_eq!(&[1, 2, 3], &buf[..n]);

    endpoint.write_all(&[4, 5, 6]).await.unwrap();
    let mut reply = [0u8; 3];
    peer.read_exact(&mut reply).unwrap();
    assert_eq!([4, 5, 6], reply);

    fs::remove_file(&path).unwrap();
}

/// Absolute names bypass the temp-directory prefix entirely.
#[tokio::test]
async fn test_absolute_name_used_verbatim() {
    let raw = format!("/tmp/pipehost-abs-{}", std::process::id());
    let _ = fs::remove_file(&raw);

    let endpoint = pipe::provision(&raw, 0o666).unwrap();
    assert_eq!(raw.as_str(), endpoint.path().to_str().unwrap());

    drop(endpoint);
    fs::remove_file(&raw).unwrap();
}
