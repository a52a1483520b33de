use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use pipehost_config::Config;
use pipehost_pipe::pipe;

#[tokio::main]
async fn main() {
    env_logger::init();
    let config = Config::read();

    let endpoint = pipe::provision(&config.pipe_name, config.pipe_mode_bits())
        .expect("Failed to provision pipe endpoint");
    log::info!("Hosting pipe at {:?}", endpoint.path());

    #[cfg(windows)]
    endpoint.connect().await.expect("Failed to accept pipe client");

    // The fifo stays on disk after we exit; remove it by hand to reuse
    // the name.
    mirror(endpoint).await;
}

/// Copy everything arriving on the pipe to stdout.
async fn mirror<T: AsyncRead + Unpin>(mut endpoint: T) {
    let mut stdout = tokio::io::stdout();
    let mut buf = [0u8; 4096];
    loop {
        match endpoint.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = stdout.write_all(&buf[..n]).await {
                    panic!("Failed to write to stdout {}", e);
                }
                let _ = stdout.flush().await;
            }
            Err(e) => {
                log::warn!("Failed to read from pipe {}", e);
                break;
            }
        }
    }
}
