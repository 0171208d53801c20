// Types for project persistence
//
// The saved form of a project. Everything here is plain data: samples are
// referenced by store key and never inlined, so a snapshot is cheap to clone.

use crate::constants::{DEFAULT_BPM, DEFAULT_TRACK_VOLUME};
use crate::project::layout::WindowState;
use crate::sampler::slices::SliceSettings;
use crate::sampler::slot::SampleRef;
use crate::sequencer::clip::ClipData;
use crate::sequencer::sequence::{Sequence, SequenceId};
use crate::synth::effect::EffectData;
use crate::synth::envelope::AdsrParams;
use crate::synth::params::SynthSettings;
use crate::track::{TrackId, TrackKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project version information
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ProjectVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn current() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Default for ProjectVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Whole project as saved and snapshotted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    #[serde(default)]
    pub version: ProjectVersion,
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    #[serde(default = "default_volume")]
    pub master_volume: f32,
    #[serde(default)]
    pub master_effects: Vec<EffectData>,
    #[serde(default)]
    pub tracks: Vec<TrackData>,
    /// Open windows; absent means every window is closed on restore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_windows: Option<Vec<WindowState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soloed_track_id: Option<TrackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armed_track_id: Option<TrackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for ProjectData {
    fn default() -> Self {
        Self {
            version: ProjectVersion::current(),
            tempo: DEFAULT_BPM,
            master_volume: DEFAULT_TRACK_VOLUME,
            master_effects: Vec::new(),
            tracks: Vec::new(),
            open_windows: None,
            soloed_track_id: None,
            armed_track_id: None,
            saved_at: None,
        }
    }
}

impl ProjectData {
    pub fn track(&self, id: TrackId) -> Option<&TrackData> {
        self.tracks.iter().find(|t| t.id == id)
    }
}

/// One saved track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub muted: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub effects: Vec<EffectData>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub active_sequence_id: Option<SequenceId>,
    #[serde(default)]
    pub clips: Vec<ClipData>,
    pub instrument: InstrumentData,
}

/// Instrument payload, tagged by track type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "settings", rename_all = "camelCase")]
pub enum InstrumentData {
    Synth(SynthSettings),
    Sampler(SlicerData),
    DrumSampler(Vec<DrumPadData>),
    InstrumentSampler(InstrumentSamplerData),
    Audio(AudioInputData),
}

impl InstrumentData {
    pub fn kind(&self) -> TrackKind {
        match self {
            InstrumentData::Synth(_) => TrackKind::Synth,
            InstrumentData::Sampler(_) => TrackKind::Sampler,
            InstrumentData::DrumSampler(_) => TrackKind::DrumSampler,
            InstrumentData::InstrumentSampler(_) => TrackKind::InstrumentSampler,
            InstrumentData::Audio(_) => TrackKind::Audio,
        }
    }
}

/// Slicer sample and its slices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlicerData {
    #[serde(default)]
    pub sample: Option<SampleRef>,
    #[serde(default)]
    pub slices: Vec<SliceSettings>,
    #[serde(default)]
    pub polyphonic: bool,
}

/// One drum pad; the slice settings are stored inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrumPadData {
    #[serde(default)]
    pub sample: Option<SampleRef>,
    #[serde(flatten)]
    pub settings: SliceSettings,
}

/// Pitched instrument sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSamplerData {
    #[serde(default)]
    pub sample: Option<SampleRef>,
    #[serde(default = "default_root_note")]
    pub root_note: u8,
    #[serde(default, rename = "loop")]
    pub looped: bool,
    #[serde(default)]
    pub envelope: AdsrParams,
    #[serde(default = "default_true")]
    pub polyphonic: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

/// Audio input track settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInputData {
    #[serde(default)]
    pub monitoring: bool,
}

fn default_tempo() -> f64 {
    DEFAULT_BPM
}

fn default_volume() -> f32 {
    DEFAULT_TRACK_VOLUME
}

fn default_root_note() -> u8 {
    crate::constants::DEFAULT_ROOT_NOTE
}

fn default_true() -> bool {
    true
}
