use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

/// One in-flight command waiting for its completion sentinel.
///
/// Output chunks are appended with [`feed`](Self::feed). The first time the
/// sentinel shows up, the buffer is cut at the sentinel's position and sent
/// through the result slot; later chunks are ignored.
///
/// Resolving does not remove the listener feeding this command. The engine
/// drops the subscription once it wakes up on the result, so chunks that
/// arrive in between still reach `feed` and are discarded.
pub(crate) struct PendingCommand {
    sentinel: Vec<u8>,
    state: Mutex<State>,
}

struct State {
    buffer: Vec<u8>,
    slot: Option<oneshot::Sender<String>>,
}

impl PendingCommand {
    pub(crate) fn new(sentinel: &str) -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let pending = Self {
            sentinel: sentinel.as_bytes().to_vec(),
            state: Mutex::new(State {
                buffer: Vec::new(),
                slot: Some(tx),
            }),
        };
        (pending, rx)
    }

    pub(crate) fn feed(&self, chunk: &[u8]) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.slot.is_none() {
            return;
        }

        // Only rescan the tail that could hold a sentinel split across chunks.
        let from = state
            .buffer
            .len()
            .saturating_sub(self.sentinel.len().saturating_sub(1));
        state.buffer.extend_from_slice(chunk);

        if let Some(pos) = find(&state.buffer[from..], &self.sentinel) {
            let mut buffer = std::mem::take(&mut state.buffer);
            buffer.truncate(from + pos);
            let output = String::from_utf8_lossy(&buffer).into_owned();
            if let Some(tx) = state.slot.take() {
                // The receiver is gone when the command was abandoned.
                let _ = tx.send(output);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_resolved(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slot
            .is_none()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
