use std::sync::{Arc, Mutex, MutexGuard, mpsc};

use image::RgbaImage;

use crate::foundation::error::{ReelError, ReelResult};

struct SeekState {
    time: f64,
    frame: Option<RgbaImage>,
    generation: u64,
}

/// Background seek bookkeeping for decoders that block while producing a frame.
///
/// Each [`AsyncSeeker::begin_seek`] runs the decode on a worker thread and
/// stamps it with a generation. Only the newest seek may publish its frame, so
/// a worker whose caller already timed out can never overwrite a later seek.
pub struct AsyncSeeker {
    state: Arc<Mutex<SeekState>>,
}

impl Default for AsyncSeeker {
    fn default() -> Self {
        // No frame yet: any target is out of tolerance, so the first call seeks.
        Self {
            state: Arc::new(Mutex::new(SeekState {
                time: f64::NEG_INFINITY,
                frame: None,
                generation: 0,
            })),
        }
    }
}

fn lock(state: &Mutex<SeekState>) -> MutexGuard<'_, SeekState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn superseded(target_secs: f64) -> ReelError {
    ReelError::decode(format!("seek to {target_secs:.3}s superseded by a newer seek"))
}

impl AsyncSeeker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the published frame; `-inf` before the first one.
    pub fn current_time(&self) -> f64 {
        lock(&self.state).time
    }

    pub fn frame(&self) -> Option<RgbaImage> {
        lock(&self.state).frame.clone()
    }

    /// Decode `target_secs` on a worker thread and publish it if still current.
    ///
    /// A worker that is superseded before it starts skips the decode entirely.
    pub fn begin_seek<F>(&self, target_secs: f64, decode: F) -> mpsc::Receiver<ReelResult<()>>
    where
        F: FnOnce(f64) -> ReelResult<RgbaImage> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let generation = {
            let mut st = lock(&self.state);
            st.generation += 1;
            st.generation
        };
        let state = Arc::clone(&self.state);
        std::thread::spawn(move || {
            let res = if lock(&state).generation != generation {
                Err(superseded(target_secs))
            } else {
                decode(target_secs).and_then(|img| {
                    let mut st = lock(&state);
                    if st.generation != generation {
                        tracing::debug!(target_secs, "discarding stale seek result");
                        return Err(superseded(target_secs));
                    }
                    st.time = target_secs;
                    st.frame = Some(img);
                    Ok(())
                })
            };
            // The receiver may have timed out and gone away.
            let _ = tx.send(res);
        });
        rx
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/seek.rs"]
mod tests;
