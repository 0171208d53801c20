// Instrument - The sound source of a track
//
// Each track type carries its own payload: synth settings, a sliced sample,
// a kit of drum pads, a pitched instrument sample, or an audio input. The
// payload decides the track's row space, the node it asks the engine for and
// how a scheduled event turns into a voice.

use crate::audio::parameters::{ParamValue, Params};
use crate::audio::{NodeKind, VoiceSource, VoiceTrigger};
use crate::constants::{DEFAULT_ROOT_NOTE, NUM_PADS, NUM_SLICES};
use crate::project::types::{
    AudioInputData, DrumPadData, InstrumentData, InstrumentSamplerData, SlicerData,
};
use crate::sampler::loader::SampleError;
use crate::sampler::slices::{SliceSettings, auto_slice};
use crate::sampler::slot::BufferSlot;
use crate::sampler::store::SampleStore;
use crate::sequencer::schedule::{EventTarget, RowSpace};
use crate::synth::envelope::AdsrParams;
use crate::synth::params::{SynthSettings, coerce, finite_or};
use serde::{Deserialize, Serialize};

/// Track type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackKind {
    Synth,
    Sampler,
    DrumSampler,
    InstrumentSampler,
    Audio,
}

impl TrackKind {
    pub fn row_space(self) -> RowSpace {
        match self {
            TrackKind::Synth | TrackKind::InstrumentSampler => RowSpace::Pitched,
            TrackKind::Sampler => RowSpace::Slices,
            TrackKind::DrumSampler => RowSpace::Pads,
            TrackKind::Audio => RowSpace::Empty,
        }
    }

    /// Default display name
    pub fn default_name(self) -> &'static str {
        match self {
            TrackKind::Synth => "Synth",
            TrackKind::Sampler => "Sampler",
            TrackKind::DrumSampler => "Drums",
            TrackKind::InstrumentSampler => "Instrument",
            TrackKind::Audio => "Audio",
        }
    }
}

/// Slicer sampler: one sample cut into slices
#[derive(Debug, Clone)]
pub struct Slicer {
    pub slot: BufferSlot,
    pub slices: Vec<SliceSettings>,
    pub polyphonic: bool,
}

/// One drum pad
#[derive(Debug, Clone, Default)]
pub struct Pad {
    pub slot: BufferSlot,
    pub settings: SliceSettings,
}

/// Pitched instrument sample
#[derive(Debug, Clone)]
pub struct InstrumentSample {
    pub slot: BufferSlot,
    pub root_note: u8,
    pub looped: bool,
    pub envelope: AdsrParams,
    pub polyphonic: bool,
    pub volume: f32,
}

impl InstrumentSample {
    /// Apply a setting by name; returns the stored value, None if unknown
    ///
    /// Names: rootNote, loop, polyphonic, volume, envelope.attack|decay|sustain|release.
    pub fn set(&mut self, name: &str, value: &ParamValue) -> Option<ParamValue> {
        match name {
            "rootNote" => {
                let note = coerce(value, self.root_note as f32).round().clamp(0.0, 127.0);
                self.root_note = note as u8;
                Some(ParamValue::Number(self.root_note as f64))
            }
            "loop" => {
                self.looped = value.as_flag().unwrap_or(self.looped);
                Some(ParamValue::from(self.looped))
            }
            "polyphonic" => {
                self.polyphonic = value.as_flag().unwrap_or(self.polyphonic);
                Some(ParamValue::from(self.polyphonic))
            }
            "volume" => {
                self.volume = coerce(value, self.volume).clamp(0.0, 1.0);
                Some(ParamValue::Number(self.volume as f64))
            }
            _ => {
                let stage = name.strip_prefix("envelope.")?;
                if let Some(number) = value.as_number() {
                    if !self.envelope.set(stage, number) {
                        return None;
                    }
                }
                let params = self.envelope.to_params();
                params.get(stage).cloned()
            }
        }
    }
}

/// Track sound source
#[derive(Debug, Clone)]
pub enum Instrument {
    Synth(SynthSettings),
    Sampler(Slicer),
    DrumSampler(Vec<Pad>),
    InstrumentSampler(InstrumentSample),
    Audio { monitoring: bool },
}

/// Slice settings keyed by index, matching `slices.{i}` / `pads.{i}` paths
fn indexed_group<'a>(settings: impl Iterator<Item = &'a SliceSettings>) -> ParamValue {
    ParamValue::Group(
        settings
            .enumerate()
            .map(|(index, slice)| (index.to_string(), ParamValue::Group(slice.to_params())))
            .collect(),
    )
}

/// A sample that failed to load, with a label for the notification
#[derive(Debug)]
pub struct LoadFailure {
    pub label: String,
    pub error: SampleError,
}

impl Instrument {
    /// Default payload for a track type
    pub fn new(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Synth => Instrument::Synth(SynthSettings::default()),
            TrackKind::Sampler => Instrument::Sampler(Slicer {
                slot: BufferSlot::new(),
                slices: vec![SliceSettings::default(); NUM_SLICES],
                polyphonic: false,
            }),
            TrackKind::DrumSampler => Instrument::DrumSampler(vec![Pad::default(); NUM_PADS]),
            TrackKind::InstrumentSampler => Instrument::InstrumentSampler(InstrumentSample {
                slot: BufferSlot::new(),
                root_note: DEFAULT_ROOT_NOTE,
                looped: false,
                envelope: AdsrParams::default(),
                polyphonic: true,
                volume: 0.8,
            }),
            TrackKind::Audio => Instrument::Audio { monitoring: false },
        }
    }

    pub fn kind(&self) -> TrackKind {
        match self {
            Instrument::Synth(_) => TrackKind::Synth,
            Instrument::Sampler(_) => TrackKind::Sampler,
            Instrument::DrumSampler(_) => TrackKind::DrumSampler,
            Instrument::InstrumentSampler(_) => TrackKind::InstrumentSampler,
            Instrument::Audio { .. } => TrackKind::Audio,
        }
    }

    pub fn row_space(&self) -> RowSpace {
        self.kind().row_space()
    }

    /// Node the engine allocates for this instrument
    pub fn node_kind(&self) -> NodeKind {
        match self {
            Instrument::Synth(settings) => NodeKind::Synth { mono: settings.mono },
            Instrument::Sampler(slicer) => NodeKind::Sampler {
                polyphonic: slicer.polyphonic,
            },
            Instrument::DrumSampler(_) => NodeKind::Sampler { polyphonic: true },
            Instrument::InstrumentSampler(sample) => NodeKind::Sampler {
                polyphonic: sample.polyphonic,
            },
            Instrument::Audio { .. } => NodeKind::Sampler { polyphonic: true },
        }
    }

    /// Parameters pushed to a freshly created node
    pub fn node_params(&self) -> Params {
        match self {
            Instrument::Synth(settings) => settings.to_params(),
            Instrument::InstrumentSampler(sample) => {
                let mut params = Params::new();
                params.insert("rootNote".into(), ParamValue::Number(sample.root_note as f64));
                params.insert("loop".into(), ParamValue::from(sample.looped));
                params.insert("envelope".into(), ParamValue::Group(sample.envelope.to_params()));
                params.insert("volume".into(), ParamValue::Number(sample.volume as f64));
                params
            }
            Instrument::Sampler(slicer) => {
                let mut params = Params::new();
                params.insert("polyphonic".into(), ParamValue::from(slicer.polyphonic));
                params.insert("slices".into(), indexed_group(slicer.slices.iter()));
                params
            }
            Instrument::DrumSampler(pads) => {
                let mut params = Params::new();
                params.insert("pads".into(), indexed_group(pads.iter().map(|pad| &pad.settings)));
                params
            }
            Instrument::Audio { .. } => Params::new(),
        }
    }

    /// Fetch and decode every referenced sample
    ///
    /// Failures leave the slot in `Error` and are collected; loading goes on.
    pub fn load_buffers(&mut self, store: &dyn SampleStore) -> Vec<LoadFailure> {
        let mut failures = Vec::new();
        let mut load = |slot: &mut BufferSlot, label: String| {
            if let Err(error) = slot.load(store) {
                let label = match slot.sample_ref() {
                    Some(sample) if !sample.file_name.is_empty() => {
                        format!("{} '{}'", label, sample.file_name)
                    }
                    _ => label,
                };
                failures.push(LoadFailure { label, error });
            }
        };

        match self {
            Instrument::Sampler(slicer) => load(&mut slicer.slot, "slicer sample".into()),
            Instrument::DrumSampler(pads) => {
                for (index, pad) in pads.iter_mut().enumerate() {
                    load(&mut pad.slot, format!("pad {}", index + 1));
                }
            }
            Instrument::InstrumentSampler(sample) => {
                load(&mut sample.slot, "instrument sample".into())
            }
            Instrument::Synth(_) | Instrument::Audio { .. } => {}
        }
        failures
    }

    /// Release tail of voices from this instrument
    pub fn release_seconds(&self, target: EventTarget) -> f64 {
        let release = match (self, target) {
            (Instrument::Synth(settings), _) => settings.envelope.release,
            (Instrument::Sampler(slicer), EventTarget::Slice(index)) => {
                slicer.slices.get(index).map_or(0.0, |s| s.envelope.release)
            }
            (Instrument::DrumSampler(pads), EventTarget::Pad(index)) => {
                pads.get(index).map_or(0.0, |p| p.settings.envelope.release)
            }
            (Instrument::InstrumentSampler(sample), _) => sample.envelope.release,
            _ => 0.0,
        };
        release as f64
    }

    /// Longest release tail among the instrument's sounds
    pub fn max_release_seconds(&self) -> f64 {
        match self {
            Instrument::Sampler(slicer) => (0..slicer.slices.len())
                .map(|i| self.release_seconds(EventTarget::Slice(i)))
                .fold(0.0, f64::max),
            Instrument::DrumSampler(pads) => (0..pads.len())
                .map(|i| self.release_seconds(EventTarget::Pad(i)))
                .fold(0.0, f64::max),
            _ => self.release_seconds(EventTarget::Pitch(DEFAULT_ROOT_NOTE)),
        }
    }

    /// Build the voice for an event, None when it cannot sound
    ///
    /// Unloaded slots, targets of the wrong kind and out-of-range indices
    /// all yield None.
    pub fn voice_for(
        &self,
        target: EventTarget,
        velocity: f32,
        at_seconds: f64,
        gate_seconds: f64,
    ) -> Option<VoiceTrigger> {
        let release_seconds = self.release_seconds(target);
        let (source, duration_seconds) = match (self, target) {
            (Instrument::Synth(_), EventTarget::Pitch(pitch)) => {
                (VoiceSource::Pitch(pitch), gate_seconds)
            }
            (Instrument::Sampler(slicer), EventTarget::Slice(index)) => {
                let settings = slicer.slices.get(index)?;
                let playback = settings.playback(slicer.slot.buffer()?);
                let natural = playback.length_seconds / playback.playback_rate;
                let duration = if settings.looped {
                    gate_seconds
                } else {
                    gate_seconds.min(natural)
                };
                (VoiceSource::Buffer(playback), duration)
            }
            (Instrument::DrumSampler(pads), EventTarget::Pad(index)) => {
                let pad = pads.get(index)?;
                let playback = pad.settings.playback(pad.slot.buffer()?);
                // one-shot: pads ring out regardless of the note length
                let duration = if pad.settings.looped {
                    gate_seconds
                } else {
                    playback.length_seconds / playback.playback_rate
                };
                (VoiceSource::Buffer(playback), duration)
            }
            (Instrument::InstrumentSampler(sample), EventTarget::Pitch(pitch)) => {
                let buffer = sample.slot.buffer()?;
                let settings = SliceSettings {
                    pitch_shift: pitch as f32 - sample.root_note as f32,
                    looped: sample.looped,
                    volume: sample.volume,
                    envelope: sample.envelope,
                    ..SliceSettings::default()
                };
                let playback = settings.playback(buffer);
                let natural = playback.length_seconds / playback.playback_rate;
                let duration = if sample.looped { gate_seconds } else { gate_seconds.min(natural) };
                (VoiceSource::Buffer(playback), duration)
            }
            _ => return None,
        };

        Some(VoiceTrigger {
            at_seconds,
            velocity,
            duration_seconds: duration_seconds.max(0.0),
            release_seconds,
            source,
        })
    }

    /// Load a new slicer sample and divide it into equal slices
    pub fn load_slicer_sample(
        &mut self,
        store: &mut dyn SampleStore,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Option<Result<(), SampleError>> {
        let Instrument::Sampler(slicer) = self else {
            return None;
        };
        Some(slicer.slot.store_and_load(store, bytes, file_name).map(|_| {
            slicer.slices = auto_slice(slicer.slot.duration_seconds(), NUM_SLICES);
        }))
    }

    pub fn to_data(&self) -> InstrumentData {
        match self {
            Instrument::Synth(settings) => InstrumentData::Synth(settings.clone()),
            Instrument::Sampler(slicer) => InstrumentData::Sampler(SlicerData {
                sample: slicer.slot.sample_ref().cloned(),
                slices: slicer.slices.clone(),
                polyphonic: slicer.polyphonic,
            }),
            Instrument::DrumSampler(pads) => InstrumentData::DrumSampler(
                pads.iter()
                    .map(|pad| DrumPadData {
                        sample: pad.slot.sample_ref().cloned(),
                        settings: pad.settings.clone(),
                    })
                    .collect(),
            ),
            Instrument::InstrumentSampler(sample) => {
                InstrumentData::InstrumentSampler(InstrumentSamplerData {
                    sample: sample.slot.sample_ref().cloned(),
                    root_note: sample.root_note,
                    looped: sample.looped,
                    envelope: sample.envelope,
                    polyphonic: sample.polyphonic,
                    volume: sample.volume,
                })
            }
            Instrument::Audio { monitoring } => InstrumentData::Audio(AudioInputData {
                monitoring: *monitoring,
            }),
        }
    }

    /// Rebuild from data; slots are left unloaded
    ///
    /// Slice and pad lists are padded or truncated to their fixed counts.
    pub fn from_data(data: &InstrumentData) -> Self {
        match data {
            InstrumentData::Synth(settings) => Instrument::Synth(settings.clone().sanitized()),
            InstrumentData::Sampler(slicer) => {
                let mut slices: Vec<SliceSettings> =
                    slicer.slices.iter().cloned().map(SliceSettings::sanitized).collect();
                slices.resize(NUM_SLICES, SliceSettings::default());
                Instrument::Sampler(Slicer {
                    slot: BufferSlot::from_ref(slicer.sample.clone()),
                    slices,
                    polyphonic: slicer.polyphonic,
                })
            }
            InstrumentData::DrumSampler(pads) => {
                let mut pads: Vec<Pad> = pads
                    .iter()
                    .map(|pad| Pad {
                        slot: BufferSlot::from_ref(pad.sample.clone()),
                        settings: pad.settings.clone().sanitized(),
                    })
                    .collect();
                pads.resize_with(NUM_PADS, Pad::default);
                Instrument::DrumSampler(pads)
            }
            InstrumentData::InstrumentSampler(sample) => {
                Instrument::InstrumentSampler(InstrumentSample {
                    slot: BufferSlot::from_ref(sample.sample.clone()),
                    root_note: sample.root_note.min(127),
                    looped: sample.looped,
                    envelope: sample.envelope.sanitized(),
                    polyphonic: sample.polyphonic,
                    volume: finite_or(sample.volume, 0.8).clamp(0.0, 1.0),
                })
            }
            InstrumentData::Audio(input) => Instrument::Audio {
                monitoring: input.monitoring,
            },
        }
    }
}
