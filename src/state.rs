//! Percussion state: the serializable snapshot of one kick preset
//!
//! The engine's live parameters and the `.gkick` preset document are the
//! same shape, so a state is both the render snapshot handed to the
//! renderer and the value that round-trips through serde. Unknown fields
//! in a preset document are ignored for forward compatibility; missing
//! required fields fail the load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::envelope::{Envelope, EnvelopeKind, EnvelopePoint};
use crate::error::EngineError;
use crate::filters::FilterParams;
use crate::gen::Waveform;

/// Fixed oscillator line-up: two tonal oscillators plus a noise layer.
pub const OSCILLATOR_COUNT: usize = 3;

/// Longest supported kick, in seconds.
pub const MAX_KICK_LENGTH: f32 = 4.0;

/// Preset file extension, matched case-insensitively.
pub const PRESET_EXTENSION: &str = "gkick";

/// Stable identity of each oscillator slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorId {
    Oscillator1 = 0,
    Oscillator2 = 1,
    Noise = 2,
}

impl OscillatorId {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// All sound parameters of one oscillator slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub function: Waveform,
    pub amplitude: f32,
    pub frequency: f32,
    pub enabled: bool,
    pub filter: FilterParams,
    pub amplitude_envelope: Envelope,
    pub frequency_envelope: Envelope,
    /// Seed of the noise generator; part of the state so previews repeat.
    #[serde(default)]
    pub noise_seed: u64,
}

impl OscillatorParams {
    pub fn envelope(&self, kind: EnvelopeKind) -> &Envelope {
        match kind {
            EnvelopeKind::Amplitude => &self.amplitude_envelope,
            EnvelopeKind::Frequency => &self.frequency_envelope,
        }
    }

    pub fn envelope_mut(&mut self, kind: EnvelopeKind) -> &mut Envelope {
        match kind {
            EnvelopeKind::Amplitude => &mut self.amplitude_envelope,
            EnvelopeKind::Frequency => &mut self.frequency_envelope,
        }
    }
}

/// Output saturation settings, stored with the preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SaturationParams {
    pub enabled: bool,
    pub drive: f32,
}

/// Snapshot of everything that defines one kick
///
/// Identity metadata (`id`, `name`, `playing_key`, `channel`) travels with
/// the preset but is overridden from the session context on load, so the
/// fields default instead of being required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercussionState {
    #[serde(default)]
    pub id: usize,
    #[serde(default = "default_name")]
    pub name: String,
    /// MIDI key the kick answers to; -1 means any.
    #[serde(default = "default_playing_key")]
    pub playing_key: i32,
    #[serde(default)]
    pub channel: usize,

    /// Kick duration in seconds.
    pub kick_length: f32,
    /// Output gain ahead of the soft clipper.
    pub limiter: f32,
    #[serde(default)]
    pub saturation: SaturationParams,
    pub oscillators: [OscillatorParams; OSCILLATOR_COUNT],
}

fn default_name() -> String {
    "Default".to_string()
}

fn default_playing_key() -> i32 {
    -1
}

impl PercussionState {
    /// Parse a preset document, rejecting malformed or out-of-range data.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let state: Self =
            serde_json::from_str(text).map_err(|e| EngineError::Parse(e.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Parse(e.to_string()))
    }

    /// Load a preset file. The extension must be `.gkick` in any case.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        check_extension(path)?;
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write the preset file. The extension must be `.gkick` in any case.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        check_extension(path)?;
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_playing_key(&mut self, key: i32) {
        self.playing_key = key;
    }

    pub fn set_channel(&mut self, channel: usize) {
        self.channel = channel;
    }

    /// Range-check every numeric field.
    pub fn validate(&self) -> Result<(), EngineError> {
        fn check(ok: bool, what: &str) -> Result<(), EngineError> {
            if ok {
                Ok(())
            } else {
                Err(EngineError::Configuration(what.to_string()))
            }
        }

        check(
            self.kick_length.is_finite()
                && self.kick_length > 0.0
                && self.kick_length <= MAX_KICK_LENGTH,
            "kick length out of range",
        )?;
        check(
            self.limiter.is_finite() && (0.0..=2.0).contains(&self.limiter),
            "limiter value out of range",
        )?;
        check(
            self.saturation.drive.is_finite() && (0.0..=1.0).contains(&self.saturation.drive),
            "saturation drive out of range",
        )?;
        for osc in &self.oscillators {
            check(
                osc.amplitude.is_finite() && osc.amplitude >= 0.0,
                "oscillator amplitude out of range",
            )?;
            check(
                osc.frequency.is_finite() && osc.frequency > 0.0,
                "oscillator frequency out of range",
            )?;
            check(
                osc.filter.cutoff_hz.is_finite() && osc.filter.cutoff_hz > 0.0,
                "filter cutoff out of range",
            )?;
            check(
                osc.filter.q.is_finite() && osc.filter.q > 0.0,
                "filter q factor out of range",
            )?;
        }
        Ok(())
    }
}

impl Default for PercussionState {
    /// The factory kick: a pitched sine drop, a second tonal oscillator
    /// and the noise layer both parked until enabled.
    fn default() -> Self {
        let osc1 = OscillatorParams {
            function: Waveform::Sine,
            amplitude: 0.8,
            frequency: 150.0,
            enabled: true,
            filter: FilterParams::default(),
            amplitude_envelope: Envelope::from_points(vec![
                EnvelopePoint::new(0.0, 1.0),
                EnvelopePoint::new(0.25, 0.6),
                EnvelopePoint::new(1.0, 0.0),
            ])
            .expect("factory envelope"),
            frequency_envelope: Envelope::from_points(vec![
                EnvelopePoint::new(0.0, 1.0),
                EnvelopePoint::new(0.12, 0.35),
                EnvelopePoint::new(1.0, 0.18),
            ])
            .expect("factory envelope"),
            noise_seed: 0,
        };
        let osc2 = OscillatorParams {
            function: Waveform::Sine,
            amplitude: 0.5,
            frequency: 60.0,
            enabled: false,
            filter: FilterParams::default(),
            amplitude_envelope: Envelope::from_points(vec![
                EnvelopePoint::new(0.0, 1.0),
                EnvelopePoint::new(1.0, 0.0),
            ])
            .expect("factory envelope"),
            frequency_envelope: Envelope::flat(1.0),
            noise_seed: 0,
        };
        let noise = OscillatorParams {
            function: Waveform::Noise,
            amplitude: 0.25,
            frequency: 1000.0,
            enabled: false,
            filter: FilterParams::default(),
            amplitude_envelope: Envelope::from_points(vec![
                EnvelopePoint::new(0.0, 1.0),
                EnvelopePoint::new(0.3, 0.2),
                EnvelopePoint::new(1.0, 0.0),
            ])
            .expect("factory envelope"),
            frequency_envelope: Envelope::flat(1.0),
            noise_seed: 0xD1CE,
        };

        Self {
            id: 0,
            name: default_name(),
            playing_key: default_playing_key(),
            channel: 0,
            kick_length: 0.3,
            limiter: 1.0,
            saturation: SaturationParams::default(),
            oscillators: [osc1, osc2, noise],
        }
    }
}

fn check_extension(path: &Path) -> Result<(), EngineError> {
    let valid = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(PRESET_EXTENSION))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(EngineError::Configuration(format!(
            "preset path {:?} must end in .{}",
            path, PRESET_EXTENSION
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_preserves_every_field() {
        let mut state = PercussionState::default();
        state.oscillators[OscillatorId::Noise.index()].enabled = true;
        state.oscillators[0].filter.enabled = true;
        state.oscillators[0].filter.cutoff_hz = 900.0;
        state.saturation = SaturationParams {
            enabled: true,
            drive: 0.4,
        };

        let text = state.to_json().unwrap();
        let restored = PercussionState::from_json(&text).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let mut doc: serde_json::Value =
            serde_json::from_str(&PercussionState::default().to_json().unwrap()).unwrap();
        doc.as_object_mut().unwrap().remove("kick_length");
        let text = doc.to_string();
        assert!(matches!(
            PercussionState::from_json(&text),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut doc: serde_json::Value =
            serde_json::from_str(&PercussionState::default().to_json().unwrap()).unwrap();
        doc.as_object_mut()
            .unwrap()
            .insert("future_field".into(), serde_json::json!({ "x": 1 }));
        assert!(PercussionState::from_json(&doc.to_string()).is_ok());
    }

    #[test]
    fn wrong_oscillator_count_is_a_parse_error() {
        let mut doc: serde_json::Value =
            serde_json::from_str(&PercussionState::default().to_json().unwrap()).unwrap();
        doc["oscillators"].as_array_mut().unwrap().pop();
        assert!(matches!(
            PercussionState::from_json(&doc.to_string()),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut doc: serde_json::Value =
            serde_json::from_str(&PercussionState::default().to_json().unwrap()).unwrap();
        doc["oscillators"][0]["frequency"] = serde_json::json!(-5.0);
        assert!(matches!(
            PercussionState::from_json(&doc.to_string()),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn unordered_envelope_is_rejected() {
        let mut doc: serde_json::Value =
            serde_json::from_str(&PercussionState::default().to_json().unwrap()).unwrap();
        doc["oscillators"][0]["amplitude_envelope"] = serde_json::json!([
            { "time": 0.0, "value": 1.0 },
            { "time": 0.5, "value": 0.5 },
            { "time": 0.5, "value": 0.2 }
        ]);
        assert!(matches!(
            PercussionState::from_json(&doc.to_string()),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert!(check_extension(Path::new("/tmp/a.gkick")).is_ok());
        assert!(check_extension(Path::new("/tmp/a.GKICK")).is_ok());
        assert!(check_extension(Path::new("/tmp/a.GkIcK")).is_ok());
        assert!(check_extension(Path::new("/tmp/a.json")).is_err());
        assert!(check_extension(Path::new("/tmp/a")).is_err());
    }

    #[test]
    fn identity_setters_leave_sound_parameters_alone() {
        let mut state = PercussionState::default();
        let sound = state.oscillators.clone();
        state.set_id(7);
        state.set_name("club kick");
        state.set_playing_key(36);
        state.set_channel(9);
        assert_eq!(state.oscillators, sound);
        assert_eq!(state.id, 7);
        assert_eq!(state.name, "club kick");
        assert_eq!(state.playing_key, 36);
        assert_eq!(state.channel, 9);
    }
}
