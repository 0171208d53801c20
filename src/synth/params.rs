// Synth parameters - Oscillator, envelope, filter and voice settings
//
// Parameters are addressed by dotted paths so that commands and the live
// node share one vocabulary:
// - oscillator.type       sine | square | sawtooth | triangle
// - envelope.attack/decay/sustain/release
// - filter.frequency      20 Hz .. 20 kHz
// - filter.Q              0.1 .. 20
// - detune                cents, -1200 .. 1200
// - portamento            seconds, 0 .. 2
// - mono                  flag
// - volume                0 .. 1

use super::envelope::AdsrParams;
use crate::audio::parameters::{ParamValue, Params};
use serde::{Deserialize, Serialize};

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformType {
    Sine,
    Square,
    #[default]
    #[serde(rename = "sawtooth")]
    Saw,
    Triangle,
}

impl WaveformType {
    pub fn as_str(self) -> &'static str {
        match self {
            WaveformType::Sine => "sine",
            WaveformType::Square => "square",
            WaveformType::Saw => "sawtooth",
            WaveformType::Triangle => "triangle",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sine" => Some(WaveformType::Sine),
            "square" => Some(WaveformType::Square),
            "saw" | "sawtooth" => Some(WaveformType::Saw),
            "triangle" => Some(WaveformType::Triangle),
            _ => None,
        }
    }
}

/// Low-pass filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Cutoff frequency in Hz
    pub frequency: f32,
    /// Resonance
    #[serde(rename = "Q")]
    pub q: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            frequency: 20000.0,
            q: 1.0,
        }
    }
}

/// Complete synth settings as stored in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthSettings {
    pub oscillator: WaveformType,
    pub envelope: AdsrParams,
    pub filter: FilterSettings,
    pub detune: f32,
    pub portamento: f32,
    pub mono: bool,
    pub volume: f32,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            oscillator: WaveformType::default(),
            envelope: AdsrParams::new(0.01, 0.2, 0.5, 0.5),
            filter: FilterSettings::default(),
            detune: 0.0,
            portamento: 0.0,
            mono: false,
            volume: 0.8,
        }
    }
}

impl SynthSettings {
    /// Apply a parameter by path
    ///
    /// Returns the value actually stored (after coercion and clamping) so the
    /// caller can forward it to the live node. Unknown paths return None.
    /// Values that cannot be coerced keep the previous setting.
    pub fn apply(&mut self, path: &str, value: &ParamValue) -> Option<ParamValue> {
        match path {
            "oscillator.type" => {
                if let Some(waveform) = value.as_text().and_then(WaveformType::parse) {
                    self.oscillator = waveform;
                }
                Some(ParamValue::from(self.oscillator.as_str()))
            }
            "envelope.attack" | "envelope.decay" | "envelope.sustain" | "envelope.release" => {
                let stage = &path["envelope.".len()..];
                if let Some(number) = value.as_number() {
                    self.envelope.set(stage, number);
                }
                let stored = match stage {
                    "attack" => self.envelope.attack,
                    "decay" => self.envelope.decay,
                    "sustain" => self.envelope.sustain,
                    _ => self.envelope.release,
                };
                Some(ParamValue::Number(stored as f64))
            }
            "filter.frequency" => {
                self.filter.frequency =
                    coerce(value, self.filter.frequency).clamp(20.0, 20000.0);
                Some(ParamValue::Number(self.filter.frequency as f64))
            }
            "filter.Q" => {
                self.filter.q = coerce(value, self.filter.q).clamp(0.1, 20.0);
                Some(ParamValue::Number(self.filter.q as f64))
            }
            "detune" => {
                self.detune = coerce(value, self.detune).clamp(-1200.0, 1200.0);
                Some(ParamValue::Number(self.detune as f64))
            }
            "portamento" => {
                self.portamento = coerce(value, self.portamento).clamp(0.0, 2.0);
                Some(ParamValue::Number(self.portamento as f64))
            }
            "mono" => {
                self.mono = value.as_flag().unwrap_or(self.mono);
                Some(ParamValue::from(self.mono))
            }
            "volume" => {
                self.volume = coerce(value, self.volume).clamp(0.0, 1.0);
                Some(ParamValue::Number(self.volume as f64))
            }
            _ => None,
        }
    }

    /// Full parameter tree pushed to a freshly created node
    pub fn to_params(&self) -> Params {
        let mut oscillator = Params::new();
        oscillator.insert("type".into(), ParamValue::from(self.oscillator.as_str()));

        let mut filter = Params::new();
        filter.insert("frequency".into(), ParamValue::Number(self.filter.frequency as f64));
        filter.insert("Q".into(), ParamValue::Number(self.filter.q as f64));

        let mut params = Params::new();
        params.insert("oscillator".into(), ParamValue::Group(oscillator));
        params.insert("envelope".into(), ParamValue::Group(self.envelope.to_params()));
        params.insert("filter".into(), ParamValue::Group(filter));
        params.insert("detune".into(), ParamValue::Number(self.detune as f64));
        params.insert("portamento".into(), ParamValue::Number(self.portamento as f64));
        params.insert("mono".into(), ParamValue::from(self.mono));
        params.insert("volume".into(), ParamValue::Number(self.volume as f64));
        params
    }

    /// Re-apply valid ranges after deserialization
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.envelope = self.envelope.sanitized();
        self.filter.frequency = finite_or(self.filter.frequency, defaults.filter.frequency)
            .clamp(20.0, 20000.0);
        self.filter.q = finite_or(self.filter.q, defaults.filter.q).clamp(0.1, 20.0);
        self.detune = finite_or(self.detune, 0.0).clamp(-1200.0, 1200.0);
        self.portamento = finite_or(self.portamento, 0.0).clamp(0.0, 2.0);
        self.volume = finite_or(self.volume, defaults.volume).clamp(0.0, 1.0);
        self
    }
}

/// Finite numeric coercion with fallback to the previous value
pub(crate) fn coerce(value: &ParamValue, previous: f32) -> f32 {
    value
        .as_number()
        .map(|n| n as f32)
        .filter(|n| n.is_finite())
        .unwrap_or(previous)
}

pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
