//! The synthesis engine behind the GUI's parameter surface
//!
//! [`KickEngine`] owns the percussion state, a background render worker
//! and the playback handoff. Parameter setters mutate the state under a
//! short lock, bump a generation counter and wake the worker; the worker
//! snapshots the state, renders the whole kick without holding any lock
//! and publishes the finished buffer. A change arriving mid-render
//! supersedes the pass: the worker re-renders once with the final state
//! instead of queueing stale renders.

mod events;

pub use self::events::EngineEvent;
use self::events::EventHub;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use log::{error, info};

use crate::envelope::{EnvelopeKind, EnvelopePoint};
use crate::error::EngineError;
use crate::filters::FilterKind;
use crate::gen::{noise, Waveform};
use crate::platform::{PlaybackShared, PlaybackSource};
use crate::renderer;
use crate::state::{PercussionState, MAX_KICK_LENGTH};

/// Render scheduling state shared with the worker thread.
struct RenderSync {
    /// Bumped on every audible change; the worker chases it.
    generation: Mutex<u64>,
    condvar: Condvar,
    /// Last generation the worker finished rendering.
    rendered: AtomicU64,
    render_count: AtomicU64,
    shutdown: AtomicBool,
}

pub struct KickEngine {
    sample_rate: u32,
    state: Arc<Mutex<PercussionState>>,
    sync: Arc<RenderSync>,
    shared: Arc<PlaybackShared>,
    events: EventHub,
    working_paths: Mutex<HashMap<String, PathBuf>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl KickEngine {
    pub fn new(sample_rate: u32) -> Self {
        let state = Arc::new(Mutex::new(PercussionState::default()));
        let sync = Arc::new(RenderSync {
            // Start one generation ahead so the factory kick renders
            // as soon as the worker comes up.
            generation: Mutex::new(1),
            condvar: Condvar::new(),
            rendered: AtomicU64::new(0),
            render_count: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        });
        let shared = Arc::new(PlaybackShared::new());
        let events = EventHub::new();

        let worker = {
            let state = Arc::clone(&state);
            let sync = Arc::clone(&sync);
            let shared = Arc::clone(&shared);
            let events = events.sender();
            thread::Builder::new()
                .name("kick-render".into())
                .spawn(move || render_worker(state, sync, shared, events, sample_rate))
                .expect("failed to spawn render worker")
        };

        Self {
            sample_rate,
            state,
            sync,
            shared,
            events,
            working_paths: Mutex::new(HashMap::new()),
            worker: Some(worker),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn nyquist(&self) -> f32 {
        self.sample_rate as f32 * 0.5
    }

    // --- internal plumbing ---------------------------------------------

    fn with_state<R>(&self, f: impl FnOnce(&PercussionState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }

    /// Apply a mutation; on change, schedule a render and notify the GUI.
    /// Returns whether anything actually changed.
    fn change(&self, f: impl FnOnce(&mut PercussionState) -> bool) -> bool {
        let changed = f(&mut self.state.lock().unwrap());
        if changed {
            self.schedule_render();
            self.events.publish(EngineEvent::StateChanged);
        }
        changed
    }

    fn schedule_render(&self) {
        let mut generation = self.sync.generation.lock().unwrap();
        *generation += 1;
        self.sync.condvar.notify_one();
    }

    // --- oscillator parameters -----------------------------------------

    pub fn oscillator_function(&self, index: usize) -> Waveform {
        self.with_state(|s| {
            s.oscillators
                .get(index)
                .map(|o| o.function)
                .unwrap_or(Waveform::Sine)
        })
    }

    pub fn set_oscillator_function(&self, index: usize, function: Waveform) -> bool {
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.function != function => {
                osc.function = function;
                true
            }
            _ => false,
        })
    }

    pub fn oscillator_amplitude(&self, index: usize) -> f32 {
        self.with_state(|s| s.oscillators.get(index).map(|o| o.amplitude).unwrap_or(0.0))
    }

    pub fn set_oscillator_amplitude(&self, index: usize, amplitude: f32) -> bool {
        if !amplitude.is_finite() || amplitude < 0.0 {
            return false;
        }
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.amplitude != amplitude => {
                osc.amplitude = amplitude;
                true
            }
            _ => false,
        })
    }

    pub fn oscillator_frequency(&self, index: usize) -> f32 {
        self.with_state(|s| s.oscillators.get(index).map(|o| o.frequency).unwrap_or(0.0))
    }

    pub fn set_oscillator_frequency(&self, index: usize, frequency: f32) -> bool {
        if !frequency.is_finite() || frequency <= 0.0 || frequency > self.nyquist() {
            return false;
        }
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.frequency != frequency => {
                osc.frequency = frequency;
                true
            }
            _ => false,
        })
    }

    pub fn is_oscillator_enabled(&self, index: usize) -> bool {
        self.with_state(|s| s.oscillators.get(index).map(|o| o.enabled).unwrap_or(false))
    }

    pub fn enable_oscillator(&self, index: usize, enabled: bool) -> bool {
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.enabled != enabled => {
                osc.enabled = enabled;
                true
            }
            _ => false,
        })
    }

    /// Draw a fresh noise seed for the oscillator, the one way the
    /// rendered kick changes without a parameter edit.
    pub fn regenerate_noise(&self, index: usize) -> bool {
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) => {
                osc.noise_seed = noise::fresh_seed();
                true
            }
            None => false,
        })
    }

    // --- per-oscillator filter -----------------------------------------

    pub fn oscillator_filter_kind(&self, index: usize) -> FilterKind {
        self.with_state(|s| {
            s.oscillators
                .get(index)
                .map(|o| o.filter.kind)
                .unwrap_or(FilterKind::LowPass)
        })
    }

    pub fn set_oscillator_filter_kind(&self, index: usize, kind: FilterKind) -> bool {
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.filter.kind != kind => {
                osc.filter.kind = kind;
                true
            }
            _ => false,
        })
    }

    pub fn is_oscillator_filter_enabled(&self, index: usize) -> bool {
        self.with_state(|s| {
            s.oscillators
                .get(index)
                .map(|o| o.filter.enabled)
                .unwrap_or(false)
        })
    }

    pub fn enable_oscillator_filter(&self, index: usize, enabled: bool) -> bool {
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.filter.enabled != enabled => {
                osc.filter.enabled = enabled;
                true
            }
            _ => false,
        })
    }

    pub fn oscillator_filter_cutoff(&self, index: usize) -> f32 {
        self.with_state(|s| {
            s.oscillators
                .get(index)
                .map(|o| o.filter.cutoff_hz)
                .unwrap_or(0.0)
        })
    }

    pub fn set_oscillator_filter_cutoff(&self, index: usize, cutoff_hz: f32) -> bool {
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= self.nyquist() {
            return false;
        }
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.filter.cutoff_hz != cutoff_hz => {
                osc.filter.cutoff_hz = cutoff_hz;
                true
            }
            _ => false,
        })
    }

    pub fn oscillator_filter_q(&self, index: usize) -> f32 {
        self.with_state(|s| s.oscillators.get(index).map(|o| o.filter.q).unwrap_or(0.0))
    }

    pub fn set_oscillator_filter_q(&self, index: usize, q: f32) -> bool {
        if !q.is_finite() || q <= 0.0 || q > 100.0 {
            return false;
        }
        self.change(|s| match s.oscillators.get_mut(index) {
            Some(osc) if osc.filter.q != q => {
                osc.filter.q = q;
                true
            }
            _ => false,
        })
    }

    // --- envelopes ------------------------------------------------------

    pub fn oscillator_envelope_points(&self, index: usize, kind: EnvelopeKind) -> Vec<EnvelopePoint> {
        self.with_state(|s| {
            s.oscillators
                .get(index)
                .map(|o| o.envelope(kind).points().to_vec())
                .unwrap_or_default()
        })
    }

    pub fn add_oscillator_envelope_point(
        &self,
        index: usize,
        kind: EnvelopeKind,
        time: f32,
        value: f32,
    ) -> Result<usize, EngineError> {
        self.edit_envelope(index, kind, |env| env.add_point(time, value))
    }

    pub fn remove_oscillator_envelope_point(
        &self,
        index: usize,
        kind: EnvelopeKind,
        point_index: usize,
    ) -> Result<EnvelopePoint, EngineError> {
        self.edit_envelope(index, kind, |env| env.remove_point(point_index))
    }

    pub fn update_oscillator_envelope_point(
        &self,
        index: usize,
        kind: EnvelopeKind,
        point_index: usize,
        time: f32,
        value: f32,
    ) -> Result<(), EngineError> {
        self.edit_envelope(index, kind, |env| env.update_point(point_index, time, value))
    }

    fn edit_envelope<R>(
        &self,
        index: usize,
        kind: EnvelopeKind,
        f: impl FnOnce(&mut crate::envelope::Envelope) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let result = {
            let mut state = self.state.lock().unwrap();
            let osc = state
                .oscillators
                .get_mut(index)
                .ok_or(EngineError::InvalidIndex(index))?;
            f(osc.envelope_mut(kind))
        };
        if result.is_ok() {
            self.schedule_render();
            self.events.publish(EngineEvent::StateChanged);
        }
        result
    }

    // --- general settings ----------------------------------------------

    pub fn kick_length(&self) -> f32 {
        self.with_state(|s| s.kick_length)
    }

    pub fn set_kick_length(&self, seconds: f32) -> bool {
        if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_KICK_LENGTH {
            return false;
        }
        self.change(|s| {
            if s.kick_length == seconds {
                return false;
            }
            s.kick_length = seconds;
            true
        })
    }

    pub fn limiter_value(&self) -> f32 {
        self.with_state(|s| s.limiter)
    }

    pub fn set_limiter_value(&self, value: f32) -> bool {
        if !value.is_finite() || !(0.0..=2.0).contains(&value) {
            return false;
        }
        self.change(|s| {
            if s.limiter == value {
                return false;
            }
            s.limiter = value;
            true
        })
    }

    pub fn is_saturation_enabled(&self) -> bool {
        self.with_state(|s| s.saturation.enabled)
    }

    pub fn enable_saturation(&self, enabled: bool) -> bool {
        self.change(|s| {
            if s.saturation.enabled == enabled {
                return false;
            }
            s.saturation.enabled = enabled;
            true
        })
    }

    pub fn saturation_drive(&self) -> f32 {
        self.with_state(|s| s.saturation.drive)
    }

    pub fn set_saturation_drive(&self, drive: f32) -> bool {
        if !drive.is_finite() || !(0.0..=1.0).contains(&drive) {
            return false;
        }
        self.change(|s| {
            if s.saturation.drive == drive {
                return false;
            }
            s.saturation.drive = drive;
            true
        })
    }

    // --- identity metadata (no re-render: sound is unaffected) ----------

    pub fn percussion_id(&self) -> usize {
        self.with_state(|s| s.id)
    }

    pub fn set_percussion_id(&self, id: usize) {
        self.state.lock().unwrap().set_id(id);
    }

    pub fn percussion_name(&self) -> String {
        self.with_state(|s| s.name.clone())
    }

    pub fn set_percussion_name(&self, name: &str) {
        self.state.lock().unwrap().set_name(name);
    }

    pub fn playing_key(&self) -> i32 {
        self.with_state(|s| s.playing_key)
    }

    pub fn set_playing_key(&self, key: i32) {
        self.state.lock().unwrap().set_playing_key(key);
    }

    pub fn channel(&self) -> usize {
        self.with_state(|s| s.channel)
    }

    pub fn set_channel(&self, channel: usize) {
        self.state.lock().unwrap().set_channel(channel);
    }

    // --- percussion state ----------------------------------------------

    pub fn percussion_state(&self) -> PercussionState {
        self.with_state(|s| s.clone())
    }

    /// Replace the whole state. Rejects invalid states without touching
    /// the current one.
    pub fn set_percussion_state(&self, next: &PercussionState) -> Result<(), EngineError> {
        next.validate()?;
        *self.state.lock().unwrap() = next.clone();
        self.schedule_render();
        self.events.publish(EngineEvent::StateChanged);
        Ok(())
    }

    /// The factory kick, for reset-to-default.
    pub fn default_percussion_state() -> PercussionState {
        PercussionState::default()
    }

    // --- preset files ---------------------------------------------------

    /// Save the current kick as a `.gkick` preset. Failures are logged;
    /// the return value tells the GUI whether to refresh.
    pub fn save_preset(&self, path: &Path) -> bool {
        let state = self.percussion_state();
        match state.save(path) {
            Ok(()) => {
                info!("saved preset {:?}", path);
                true
            }
            Err(e) => {
                error!("failed to save preset {:?}: {}", path, e);
                false
            }
        }
    }

    /// Load a `.gkick` preset into this percussion slot.
    ///
    /// The file's sound parameters are applied, but the slot keeps its
    /// own id, name, playing key and channel: presets travel between
    /// sessions, slot identity does not. On any failure the current
    /// state is left untouched.
    pub fn load_preset(&self, path: &Path) -> bool {
        let mut next = match PercussionState::load(path) {
            Ok(state) => state,
            Err(e) => {
                error!("failed to load preset {:?}: {}", path, e);
                return false;
            }
        };
        {
            let mut state = self.state.lock().unwrap();
            next.set_id(state.id);
            next.set_name(state.name.clone());
            next.set_playing_key(state.playing_key);
            next.set_channel(state.channel);
            *state = next;
        }
        self.schedule_render();
        self.events.publish(EngineEvent::StateChanged);
        info!("loaded preset {:?}", path);
        true
    }

    /// Last-used directory for a GUI operation ("OpenPreset", "SavePreset", ...).
    pub fn current_working_path(&self, tag: &str) -> Option<PathBuf> {
        self.working_paths.lock().unwrap().get(tag).cloned()
    }

    pub fn set_current_working_path(&self, tag: &str, path: PathBuf) {
        self.working_paths
            .lock()
            .unwrap()
            .insert(tag.to_string(), path);
    }

    // --- playback & preview ---------------------------------------------

    /// Trigger playback of the rendered kick from the top.
    pub fn play_kick(&self) {
        self.shared.trigger_playback();
    }

    pub fn current_playing_frame(&self) -> usize {
        self.shared.playing_frame()
    }

    /// Latest rendered kick for the waveform preview. Read-only.
    pub fn kick_buffer(&self) -> Arc<[f32]> {
        self.shared.snapshot()
    }

    /// Build the pull side for an audio backend's callback.
    pub fn playback_source(&self) -> PlaybackSource {
        PlaybackSource::new(Arc::clone(&self.shared), self.events.sender())
    }

    /// Receiver for GUI notifications. One logical consumer.
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.events.receiver()
    }

    /// True while a scheduled render has not yet been published.
    pub fn render_pending(&self) -> bool {
        let generation = *self.sync.generation.lock().unwrap();
        self.sync.rendered.load(Ordering::Acquire) < generation
    }

    /// Number of render passes completed since startup.
    pub fn render_count(&self) -> u64 {
        self.sync.render_count.load(Ordering::Relaxed)
    }

    // --- export ---------------------------------------------------------

    /// Bounce the current kick buffer to a 16-bit mono WAV file.
    #[cfg(feature = "bounce")]
    pub fn export_wav(&self, path: &Path) -> anyhow::Result<()> {
        use hound::{SampleFormat, WavSpec, WavWriter};

        let buffer = self.kick_buffer();
        anyhow::ensure!(!buffer.is_empty(), "no rendered kick to export");

        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &sample in buffer.iter() {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        info!("exported kick to {:?}", path);
        Ok(())
    }
}

impl Drop for KickEngine {
    fn drop(&mut self) {
        self.sync.shutdown.store(true, Ordering::Relaxed);
        self.sync.condvar.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Body of the render worker thread.
///
/// Chases the generation counter: waits until it moves, snapshots the
/// state under a short lock, renders with no locks held, publishes and
/// notifies. If the counter moved again during the pass the loop simply
/// renders once more, so N rapid edits collapse into at most one extra
/// render reflecting the final state.
fn render_worker(
    state: Arc<Mutex<PercussionState>>,
    sync: Arc<RenderSync>,
    shared: Arc<PlaybackShared>,
    events: Sender<EngineEvent>,
    sample_rate: u32,
) {
    let mut last_rendered = 0u64;
    loop {
        let target = {
            let mut generation = sync.generation.lock().unwrap();
            while *generation == last_rendered && !sync.shutdown.load(Ordering::Relaxed) {
                generation = sync.condvar.wait(generation).unwrap();
            }
            if sync.shutdown.load(Ordering::Relaxed) {
                return;
            }
            *generation
        };

        let snapshot = state.lock().unwrap().clone();
        let buffer = renderer::render(&snapshot, sample_rate);
        shared.publish(Arc::from(buffer));

        // Queue the notifications before marking the pass finished, so a
        // consumer that waited for idle sees them on the next drain.
        let _ = events.try_send(EngineEvent::KickUpdated);
        let _ = events.try_send(EngineEvent::NewKickBuffer);
        sync.render_count.fetch_add(1, Ordering::Relaxed);
        last_rendered = target;
        sync.rendered.store(target, Ordering::Release);
    }
}
