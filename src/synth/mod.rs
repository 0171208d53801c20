// Synth - Instrument and effect parameters

pub mod effect;
pub mod envelope;
pub mod params;

pub use effect::{Effect, EffectChain, EffectData, EffectId, EffectKind};
pub use envelope::AdsrParams;
pub use params::{SynthSettings, WaveformType};
