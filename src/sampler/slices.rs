// Slices - Region playback settings for slicer slices and drum pads
//
// A slice plays `duration` seconds of a buffer starting at `offset`, shifted
// by `pitch_shift` semitones, optionally looped or reversed, shaped by its
// own envelope.

use crate::audio::BufferPlayback;
use crate::audio::parameters::{ParamValue, Params};
use crate::sampler::loader::AudioBuffer;
use crate::synth::envelope::AdsrParams;
use crate::synth::params::{coerce, finite_or};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pitch shift range in semitones
pub const MAX_PITCH_SHIFT: f32 = 24.0;

/// Playback settings of one slice or pad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SliceSettings {
    /// Start within the buffer, seconds
    pub offset: f64,
    /// Length in seconds; 0 plays to the end of the buffer
    pub duration: f64,
    pub volume: f32,
    /// Semitones
    pub pitch_shift: f32,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub reverse: bool,
    pub envelope: AdsrParams,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            offset: 0.0,
            duration: 0.0,
            volume: 0.8,
            pitch_shift: 0.0,
            looped: false,
            reverse: false,
            envelope: AdsrParams::new(0.001, 0.1, 1.0, 0.05),
        }
    }
}

impl SliceSettings {
    /// Apply a setting by name; returns the stored value, None if unknown
    ///
    /// Names: volume, pitchShift, loop, reverse, offset, duration,
    /// envelope.attack|decay|sustain|release.
    pub fn set(&mut self, name: &str, value: &ParamValue) -> Option<ParamValue> {
        match name {
            "volume" => {
                self.volume = coerce(value, self.volume).clamp(0.0, 1.0);
                Some(ParamValue::Number(self.volume as f64))
            }
            "pitchShift" => {
                self.pitch_shift =
                    coerce(value, self.pitch_shift).clamp(-MAX_PITCH_SHIFT, MAX_PITCH_SHIFT);
                Some(ParamValue::Number(self.pitch_shift as f64))
            }
            "loop" => {
                self.looped = value.as_flag().unwrap_or(self.looped);
                Some(ParamValue::from(self.looped))
            }
            "reverse" => {
                self.reverse = value.as_flag().unwrap_or(self.reverse);
                Some(ParamValue::from(self.reverse))
            }
            "offset" => {
                self.offset = value.as_number().unwrap_or(self.offset).max(0.0);
                Some(ParamValue::Number(self.offset))
            }
            "duration" => {
                self.duration = value.as_number().unwrap_or(self.duration).max(0.0);
                Some(ParamValue::Number(self.duration))
            }
            _ => {
                let stage = name.strip_prefix("envelope.")?;
                if let Some(number) = value.as_number() {
                    if !self.envelope.set(stage, number) {
                        return None;
                    }
                }
                let stored = match stage {
                    "attack" => self.envelope.attack,
                    "decay" => self.envelope.decay,
                    "sustain" => self.envelope.sustain,
                    "release" => self.envelope.release,
                    _ => return None,
                };
                Some(ParamValue::Number(stored as f64))
            }
        }
    }

    /// Settings as node parameters, keyed like `set`
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("offset".into(), ParamValue::Number(self.offset));
        params.insert("duration".into(), ParamValue::Number(self.duration));
        params.insert("volume".into(), ParamValue::Number(self.volume as f64));
        params.insert("pitchShift".into(), ParamValue::Number(self.pitch_shift as f64));
        params.insert("loop".into(), ParamValue::from(self.looped));
        params.insert("reverse".into(), ParamValue::from(self.reverse));
        params.insert("envelope".into(), ParamValue::Group(self.envelope.to_params()));
        params
    }

    /// Playback rate from the pitch shift
    pub fn playback_rate(&self) -> f64 {
        2.0_f64.powf(self.pitch_shift as f64 / 12.0)
    }

    /// Buffer region to play, clamped to the buffer
    pub fn playback(&self, buffer: &Arc<AudioBuffer>) -> BufferPlayback {
        let total = buffer.duration_seconds();
        let offset = self.offset.clamp(0.0, total);
        let remaining = total - offset;
        let length = if self.duration > 0.0 {
            self.duration.min(remaining)
        } else {
            remaining
        };

        BufferPlayback {
            buffer: Arc::clone(buffer),
            offset_seconds: offset,
            length_seconds: length,
            playback_rate: self.playback_rate(),
            gain: self.volume,
            reverse: self.reverse,
            looped: self.looped,
        }
    }

    /// Re-apply valid ranges after deserialization
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.offset = if self.offset.is_finite() { self.offset.max(0.0) } else { 0.0 };
        self.duration = if self.duration.is_finite() { self.duration.max(0.0) } else { 0.0 };
        self.volume = finite_or(self.volume, defaults.volume).clamp(0.0, 1.0);
        self.pitch_shift =
            finite_or(self.pitch_shift, 0.0).clamp(-MAX_PITCH_SHIFT, MAX_PITCH_SHIFT);
        self.envelope = self.envelope.sanitized();
        self
    }
}

/// Divide a buffer into `count` equal slices
pub fn auto_slice(total_seconds: f64, count: usize) -> Vec<SliceSettings> {
    let count = count.max(1);
    let length = total_seconds.max(0.0) / count as f64;
    (0..count)
        .map(|i| SliceSettings {
            offset: i as f64 * length,
            duration: length,
            ..SliceSettings::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_second_buffer() -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::new(1000, 1, vec![0.0; 2000]))
    }

    #[test]
    fn test_auto_slice_divides_evenly() {
        let slices = auto_slice(2.0, 16);
        assert_eq!(slices.len(), 16);
        assert_eq!(slices[0].offset, 0.0);
        assert_eq!(slices[1].offset, 0.125);
        assert_eq!(slices[15].duration, 0.125);
    }

    #[test]
    fn test_playback_is_clamped_to_buffer() {
        let buffer = two_second_buffer();
        let slice = SliceSettings {
            offset: 1.5,
            duration: 1.0,
            ..SliceSettings::default()
        };

        let playback = slice.playback(&buffer);
        assert_eq!(playback.offset_seconds, 1.5);
        assert_eq!(playback.length_seconds, 0.5);

        let whole = SliceSettings::default().playback(&buffer);
        assert_eq!(whole.length_seconds, 2.0);
    }

    #[test]
    fn test_pitch_shift_sets_rate() {
        let mut slice = SliceSettings::default();
        slice.set("pitchShift", &ParamValue::Number(12.0));
        assert!((slice.playback_rate() - 2.0).abs() < 1e-9);

        slice.set("pitchShift", &ParamValue::Number(100.0));
        assert_eq!(slice.pitch_shift, MAX_PITCH_SHIFT);
    }

    #[test]
    fn test_setters_coerce_and_fall_back() {
        let mut slice = SliceSettings::default();
        assert_eq!(slice.set("volume", &"0.5".into()), Some(ParamValue::Number(0.5)));
        slice.set("volume", &"loud".into());
        assert_eq!(slice.volume, 0.5);

        slice.set("loop", &true.into());
        assert!(slice.looped);
        slice.set("envelope.release", &ParamValue::Number(1.0));
        assert_eq!(slice.envelope.release, 1.0);

        assert_eq!(slice.set("envelope.hold", &ParamValue::Number(1.0)), None);
        assert_eq!(slice.set("pan", &ParamValue::Number(1.0)), None);
    }

    #[test]
    fn test_params_round_trip_through_set() {
        let mut slice = SliceSettings::default();
        slice.set("volume", &ParamValue::Number(0.25));
        slice.set("envelope.attack", &ParamValue::Number(0.5));

        let mut copy = SliceSettings::default();
        for (path, value) in crate::audio::parameters::leaf_paths(&slice.to_params()) {
            assert!(copy.set(&path, &value).is_some(), "unknown name {}", path);
        }
        assert_eq!(copy, slice);
    }

    #[test]
    fn test_loop_field_name_in_json() {
        let json = serde_json::to_value(SliceSettings::default()).unwrap();
        assert_eq!(json["loop"], false);
        assert!(json.get("pitchShift").is_some());
    }
}
