use crate::broadcast::Broadcaster;
use std::io::Read;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// Spawns a background thread that pumps PTY output into `broadcaster`.
///
/// The broadcaster is closed once the reader hits EOF or an error, which fails
/// any command still waiting for its sentinel.
pub fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    broadcaster: Broadcaster,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break, // EOF
                Ok(n) => {
                    trace!(bytes = n, "shell output");
                    broadcaster.publish(&buffer[..n]);
                }
                Err(e) => {
                    debug!(error = %e, "PTY read ended");
                    break;
                }
            }
        }
        broadcaster.close();
    })
}
