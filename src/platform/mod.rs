//! Platform audio layer
//!
//! The engine renders whole kicks on its worker thread; this module owns
//! the handoff to whatever drives the speakers. [`PlaybackShared`] is the
//! cross-thread state, [`PlaybackSource`] the pull side living inside the
//! audio callback, and [`AudioOutput`] the interface a backend implements.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;

use crate::engine::EngineEvent;

/// Trait for platform-specific audio output implementations
pub trait AudioOutput {
    /// Initialize the audio output with the given sample rate
    fn initialize(&mut self, sample_rate: f32) -> Result<(), anyhow::Error>;

    /// Start the audio stream
    fn start(&mut self) -> Result<(), anyhow::Error>;

    /// Stop the audio stream
    fn stop(&mut self) -> Result<(), anyhow::Error>;

    /// Get the current sample rate
    fn sample_rate(&self) -> f32;

    /// Check if the audio output is active
    fn is_active(&self) -> bool;
}

/// Kick buffer and playback state shared between the engine threads and
/// the audio callback.
///
/// The buffer slot holds a complete, immutable render; publishing swaps
/// the `Arc` under a short lock, so a reader either sees the old buffer
/// or the new one, never a partial write.
pub struct PlaybackShared {
    buffer: Mutex<Arc<[f32]>>,
    position: AtomicUsize,
    playing: AtomicBool,
    trigger: AtomicBool,
}

impl PlaybackShared {
    pub(crate) fn new() -> Self {
        Self {
            buffer: Mutex::new(Arc::from(Vec::new())),
            position: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            trigger: AtomicBool::new(false),
        }
    }

    pub(crate) fn publish(&self, buffer: Arc<[f32]>) {
        *self.buffer.lock().unwrap() = buffer;
    }

    /// Current preview buffer. Read-only once published.
    pub fn snapshot(&self) -> Arc<[f32]> {
        self.buffer.lock().unwrap().clone()
    }

    /// Request playback from the top on the next callback.
    pub(crate) fn trigger_playback(&self) {
        self.trigger.store(true, Ordering::Release);
    }

    pub fn playing_frame(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    fn try_refresh(&self, local: &mut Arc<[f32]>) {
        // Never block the audio thread: on contention keep the buffer
        // from the previous callback.
        if let Ok(guard) = self.buffer.try_lock() {
            if !Arc::ptr_eq(local, &guard) {
                *local = Arc::clone(&guard);
            }
        }
    }
}

/// The pull side of playback, owned by the audio callback.
pub struct PlaybackSource {
    shared: Arc<PlaybackShared>,
    local: Arc<[f32]>,
    events: Sender<EngineEvent>,
}

impl PlaybackSource {
    pub(crate) fn new(shared: Arc<PlaybackShared>, events: Sender<EngineEvent>) -> Self {
        let local = shared.snapshot();
        Self {
            shared,
            local,
            events,
        }
    }

    /// Fill `output` with exactly `output.len()` samples, silencing past
    /// the kick end. Lock-free apart from a `try_lock` buffer refresh;
    /// allocates nothing.
    pub fn fill(&mut self, output: &mut [f32]) {
        self.shared.try_refresh(&mut self.local);

        if self.shared.trigger.swap(false, Ordering::AcqRel) {
            self.shared.position.store(0, Ordering::Relaxed);
            self.shared.playing.store(true, Ordering::Relaxed);
        }

        if !self.shared.playing.load(Ordering::Relaxed) {
            output.fill(0.0);
            return;
        }

        let mut position = self.shared.position.load(Ordering::Relaxed);
        for sample in output.iter_mut() {
            *sample = if position < self.local.len() {
                let value = self.local[position];
                position += 1;
                value
            } else {
                0.0
            };
        }
        if position >= self.local.len() {
            self.shared.playing.store(false, Ordering::Relaxed);
        }
        self.shared.position.store(position, Ordering::Relaxed);
        let _ = self
            .events
            .try_send(EngineEvent::CurrentPlayingFrame(position));
    }
}

#[cfg(feature = "native")]
pub mod cpal_output;

#[cfg(feature = "native")]
pub use self::cpal_output::CpalOutput;
