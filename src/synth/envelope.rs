// ADSR Envelope parameters
//
// Shared by synth voices, sampler slices, drum pads and instrument samples.
// Envelopes are rendered by the audio engine; the core only keeps validated
// parameters and pushes them to live nodes.

use crate::audio::parameters::{ParamValue, Params};
use serde::{Deserialize, Serialize};

/// Shortest allowed attack/decay/release time
pub const MIN_ENVELOPE_TIME: f32 = 0.001;

/// Longest allowed attack/decay/release time
pub const MAX_ENVELOPE_TIME: f32 = 5.0;

/// ADSR Envelope parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsrParams {
    /// Attack time in seconds (0.001 to 5.0)
    pub attack: f32,
    /// Decay time in seconds (0.001 to 5.0)
    pub decay: f32,
    /// Sustain level (0.0 to 1.0)
    pub sustain: f32,
    /// Release time in seconds (0.001 to 5.0)
    pub release: f32,
}

impl AdsrParams {
    /// Create ADSR parameters with validation
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let defaults = Self::default();
        Self {
            attack: clamp_time(attack, defaults.attack),
            decay: clamp_time(decay, defaults.decay),
            sustain: clamp_level(sustain, defaults.sustain),
            release: clamp_time(release, defaults.release),
        }
    }

    /// Re-apply the valid ranges (used after deserialization)
    pub fn sanitized(self) -> Self {
        Self::new(self.attack, self.decay, self.sustain, self.release)
    }

    /// Set one stage by name; invalid values keep the previous setting
    ///
    /// Returns false for an unknown stage name.
    pub fn set(&mut self, stage: &str, value: f64) -> bool {
        let value = value as f32;
        match stage {
            "attack" => self.attack = clamp_time(value, self.attack),
            "decay" => self.decay = clamp_time(value, self.decay),
            "sustain" => self.sustain = clamp_level(value, self.sustain),
            "release" => self.release = clamp_time(value, self.release),
            _ => return false,
        }
        true
    }

    /// Parameter group pushed to a live node
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("attack".into(), ParamValue::Number(self.attack as f64));
        params.insert("decay".into(), ParamValue::Number(self.decay as f64));
        params.insert("sustain".into(), ParamValue::Number(self.sustain as f64));
        params.insert("release".into(), ParamValue::Number(self.release as f64));
        params
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.01, // 10ms attack
            decay: 0.1,   // 100ms decay
            sustain: 0.7, // 70% sustain level
            release: 0.2, // 200ms release
        }
    }
}

fn clamp_time(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(MIN_ENVELOPE_TIME, MAX_ENVELOPE_TIME)
    } else {
        fallback
    }
}

fn clamp_level(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adsr_params_clamping() {
        let params = AdsrParams::new(-1.0, 10.0, 1.5, 0.0);
        assert_eq!(params.attack, 0.001);
        assert_eq!(params.decay, 5.0);
        assert_eq!(params.sustain, 1.0);
        assert_eq!(params.release, 0.001);
    }

    #[test]
    fn test_set_stage_by_name() {
        let mut params = AdsrParams::default();
        assert!(params.set("attack", 0.5));
        assert_eq!(params.attack, 0.5);

        // non-finite keeps previous value
        assert!(params.set("release", f64::NAN));
        assert_eq!(params.release, 0.2);

        assert!(!params.set("hold", 1.0));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let params: AdsrParams = serde_json::from_str(r#"{"attack":0.3}"#).unwrap();
        assert_eq!(params.attack, 0.3);
        assert_eq!(params.sustain, 0.7);
    }
}
