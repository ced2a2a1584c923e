//! Background STL decoding.
//!
//! Each request runs on its own thread and reports back over a channel,
//! tagged with the generation it was issued in. `cancel` (or dropping the
//! loader) starts a new generation, so results that arrive for a view that
//! has since gone away are discarded instead of applied.

use std::sync::mpsc;

use crate::error::{DecodeError, LoadError};
use crate::geometry::TriangleMesh;
use crate::stl;

/// Result of one request: the caller's slot and the decoded mesh
pub type LoadResult = (usize, Result<TriangleMesh, DecodeError>);

struct Completed {
    generation: u64,
    slot: usize,
    mesh: Result<TriangleMesh, DecodeError>,
}

/// Owns the receiving end of every decode started through it
pub struct MeshLoader {
    result_tx: mpsc::Sender<Completed>,
    result_rx: mpsc::Receiver<Completed>,
    generation: u64,
    pending: usize,
}

impl MeshLoader {
    pub fn new() -> Self {
        let (result_tx, result_rx) = mpsc::channel();
        Self {
            result_tx,
            result_rx,
            generation: 0,
            pending: 0,
        }
    }

    /// Decode `bytes` in the background; the result is reported by `poll` under `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Spawn`] if the decode thread fails to spawn.
    pub fn request(&mut self, slot: usize, bytes: Vec<u8>) -> Result<(), LoadError> {
        let tx = self.result_tx.clone();
        let generation = self.generation;

        std::thread::Builder::new()
            .name(format!("stl-decode-{slot}"))
            .spawn(move || {
                let mesh = stl::decode(&bytes);
                // Receiver gone means the loader was dropped
                let _ = tx.send(Completed {
                    generation,
                    slot,
                    mesh,
                });
            })
            .map_err(LoadError::Spawn)?;

        self.pending += 1;
        Ok(())
    }

    /// Non-blocking drain of finished decodes for the current generation
    pub fn poll(&mut self) -> Vec<LoadResult> {
        let mut ready = Vec::new();

        while let Ok(completed) = self.result_rx.try_recv() {
            if completed.generation != self.generation {
                log::debug!(
                    "discarding stale mesh for slot {} (generation {}, now {})",
                    completed.slot,
                    completed.generation,
                    self.generation
                );
                continue;
            }

            self.pending = self.pending.saturating_sub(1);
            ready.push((completed.slot, completed.mesh));
        }

        ready
    }

    /// Block until every request of the current generation has reported
    pub fn wait_all(&mut self) -> Vec<LoadResult> {
        let mut ready = self.poll();

        while self.pending > 0 {
            let Ok(completed) = self.result_rx.recv() else {
                break;
            };
            if completed.generation != self.generation {
                log::debug!("discarding stale mesh for slot {}", completed.slot);
                continue;
            }

            self.pending -= 1;
            ready.push((completed.slot, completed.mesh));
        }

        ready
    }

    /// Number of current-generation requests not yet returned by `poll`
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Invalidate every in-flight request
    pub fn cancel(&mut self) {
        if self.pending > 0 {
            log::debug!("cancelling {} in-flight mesh loads", self.pending);
        }
        self.generation += 1;
        self.pending = 0;
    }
}

impl Default for MeshLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MeshLoader {
    fn drop(&mut self) {
        self.cancel();
    }
}
