//! Integration tests for the preset boundary: `.gkick` save/load through
//! the engine, identity override on load, and failure isolation.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use kickforge::envelope::EnvelopeKind;
use kickforge::filters::FilterKind;
use kickforge::gen::Waveform;
use kickforge::state::PercussionState;
use kickforge::KickEngine;

const SAMPLE_RATE: u32 = 44100;

fn wait_idle(engine: &KickEngine) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.render_pending() {
        assert!(Instant::now() < deadline, "render worker never caught up");
        thread::sleep(Duration::from_millis(1));
    }
}

fn temp_preset(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("kickforge-{}-{}.gkick", std::process::id(), name));
    path
}

/// Dial in a kick that differs from the factory state in every section.
fn sculpt(engine: &KickEngine) {
    assert!(engine.set_oscillator_function(0, Waveform::Triangle));
    assert!(engine.set_oscillator_frequency(0, 82.0));
    assert!(engine.set_oscillator_amplitude(0, 0.77));
    assert!(engine.enable_oscillator(1, true));
    assert!(engine.enable_oscillator(2, true));
    assert!(engine.set_oscillator_filter_kind(2, FilterKind::HighPass));
    assert!(engine.enable_oscillator_filter(2, true));
    assert!(engine.set_oscillator_filter_cutoff(2, 2500.0));
    assert!(engine.set_oscillator_filter_q(2, 1.4));
    engine
        .add_oscillator_envelope_point(0, EnvelopeKind::Frequency, 0.5, 0.25)
        .unwrap();
    assert!(engine.set_kick_length(0.42));
    assert!(engine.set_limiter_value(1.3));
    assert!(engine.enable_saturation(true));
    assert!(engine.set_saturation_drive(0.35));
}

#[test]
fn preset_round_trips_through_a_file() {
    let path = temp_preset("roundtrip");
    let engine = KickEngine::new(SAMPLE_RATE);
    sculpt(&engine);
    wait_idle(&engine);
    let saved = engine.percussion_state();
    assert!(engine.save_preset(&path));

    let restored = KickEngine::new(SAMPLE_RATE);
    assert!(restored.load_preset(&path));
    let state = restored.percussion_state();

    // Sound parameters match exactly ...
    assert_eq!(state.oscillators, saved.oscillators);
    assert_eq!(state.kick_length, saved.kick_length);
    assert_eq!(state.limiter, saved.limiter);
    assert_eq!(state.saturation, saved.saturation);

    // ... and both engines render the identical kick.
    wait_idle(&restored);
    assert_eq!(&engine.kick_buffer()[..], &restored.kick_buffer()[..]);

    let _ = fs::remove_file(&path);
}

#[test]
fn loading_keeps_the_target_slot_identity() {
    let path = temp_preset("identity");
    let engine = KickEngine::new(SAMPLE_RATE);
    engine.set_percussion_id(3);
    engine.set_percussion_name("studio kick");
    engine.set_playing_key(36);
    engine.set_channel(9);
    assert!(engine.save_preset(&path));

    let target = KickEngine::new(SAMPLE_RATE);
    target.set_percussion_id(11);
    target.set_percussion_name("live kick");
    target.set_playing_key(38);
    target.set_channel(2);
    assert!(target.load_preset(&path));

    // The file's identity is discarded; the slot keeps its own.
    assert_eq!(target.percussion_id(), 11);
    assert_eq!(target.percussion_name(), "live kick");
    assert_eq!(target.playing_key(), 38);
    assert_eq!(target.channel(), 2);

    let _ = fs::remove_file(&path);
}

#[test]
fn wrong_extension_is_rejected() {
    let engine = KickEngine::new(SAMPLE_RATE);
    let mut path = std::env::temp_dir();
    path.push(format!("kickforge-{}-bad.json", std::process::id()));
    assert!(!engine.save_preset(&path));
    assert!(!path.exists());
    assert!(!engine.load_preset(&path));
}

#[test]
fn unreadable_file_leaves_state_untouched() {
    let engine = KickEngine::new(SAMPLE_RATE);
    wait_idle(&engine);
    let before = engine.percussion_state();

    let path = temp_preset("does-not-exist");
    assert!(!engine.load_preset(&path));
    assert_eq!(engine.percussion_state(), before);
}

#[test]
fn malformed_preset_leaves_state_untouched() {
    let path = temp_preset("malformed");
    // Strip a required field from an otherwise valid document.
    let mut doc: serde_json::Value =
        serde_json::from_str(&PercussionState::default().to_json().unwrap()).unwrap();
    doc.as_object_mut().unwrap().remove("oscillators");
    fs::write(&path, doc.to_string()).unwrap();

    let engine = KickEngine::new(SAMPLE_RATE);
    wait_idle(&engine);
    let before = engine.percussion_state();
    assert!(!engine.load_preset(&path));
    assert_eq!(engine.percussion_state(), before);

    let _ = fs::remove_file(&path);
}

#[test]
fn set_percussion_state_validates_before_applying() {
    let engine = KickEngine::new(SAMPLE_RATE);
    wait_idle(&engine);
    let before = engine.percussion_state();

    let mut broken = before.clone();
    broken.kick_length = -1.0;
    assert!(engine.set_percussion_state(&broken).is_err());
    assert_eq!(engine.percussion_state(), before);

    let mut louder = before.clone();
    louder.limiter = 1.5;
    engine.set_percussion_state(&louder).unwrap();
    assert_eq!(engine.limiter_value(), 1.5);
}

#[test]
fn reset_to_factory_state() {
    let engine = KickEngine::new(SAMPLE_RATE);
    sculpt(&engine);
    engine
        .set_percussion_state(&KickEngine::default_percussion_state())
        .unwrap();
    wait_idle(&engine);
    assert_eq!(engine.percussion_state(), PercussionState::default());
}

#[test]
fn working_paths_are_remembered_per_tag() {
    let engine = KickEngine::new(SAMPLE_RATE);
    assert_eq!(engine.current_working_path("OpenPreset"), None);

    engine.set_current_working_path("OpenPreset", PathBuf::from("/tmp/presets"));
    engine.set_current_working_path("SavePreset", PathBuf::from("/tmp/out"));
    assert_eq!(
        engine.current_working_path("OpenPreset"),
        Some(PathBuf::from("/tmp/presets"))
    );
    assert_eq!(
        engine.current_working_path("SavePreset"),
        Some(PathBuf::from("/tmp/out"))
    );
}
