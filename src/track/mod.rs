// Track - One instrument with its sequences, clips and effect chain
//
// A track owns its sound source, its step sequences, its arrangement clips
// and an effect chain. Once connected it holds three engine nodes:
//
//   instrument -> effects... -> output gain -> master input
//                                           \-> meter

pub mod instrument;
pub mod mix;

pub use instrument::{Instrument, InstrumentSample, LoadFailure, Pad, Slicer, TrackKind};
pub use mix::{MixState, Recording};

use crate::audio::parameters::{ParamValue, Params, leaf_paths};
use crate::audio::{
    AudioEngine, BufferPlayback, EngineError, NodeId, NodeKind, VoiceId, VoiceSource, VoiceTrigger,
};
use crate::constants::DEFAULT_TRACK_VOLUME;
use crate::project::types::TrackData;
use crate::sampler::loader::SampleError;
use crate::sampler::slot::BufferSlot;
use crate::sampler::store::SampleStore;
use crate::sequencer::clip::{ClipId, ClipManager, ClipPayload};
use crate::sequencer::manager::SequenceManager;
use crate::sequencer::schedule::{EventTarget, FiredEvent};
use crate::sequencer::sequence::SequenceId;
use crate::sequencer::transport::Transport;
use crate::synth::effect::{EffectChain, EffectId, EffectKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Track identifier, unique within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Track operation errors
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Audio engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Sample error: {0}")]
    Sample(#[from] SampleError),

    #[error("'{operation}' is not available on {kind:?} tracks")]
    WrongInstrument {
        operation: &'static str,
        kind: TrackKind,
    },

    #[error("Index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("Sequence not found")]
    SequenceNotFound,
}

/// Engine nodes of a connected track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackNodes {
    pub instrument: NodeId,
    pub output: NodeId,
    pub meter: NodeId,
    pub master: NodeId,
}

/// A track of the project
#[derive(Debug)]
pub struct Track {
    id: TrackId,
    name: String,
    instrument: Instrument,
    muted: bool,
    volume: f32,
    effects: EffectChain,
    sequences: SequenceManager,
    clips: ClipManager,
    nodes: Option<TrackNodes>,
}

impl Track {
    /// Create a track with the default payload for `kind`
    pub fn new(id: TrackId, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id,
            name: name.into(),
            instrument: Instrument::new(kind),
            muted: false,
            volume: DEFAULT_TRACK_VOLUME,
            effects: EffectChain::new(),
            sequences: SequenceManager::new(id, kind.row_space()),
            clips: ClipManager::new(),
            nodes: None,
        }
    }

    /// Rebuild a track from saved data; nothing is connected or loaded yet
    pub fn from_data(data: &TrackData) -> Self {
        let instrument = Instrument::from_data(&data.instrument);
        let space = instrument.row_space();

        let sequences: Vec<_> = data
            .sequences
            .iter()
            .filter(|s| s.is_well_formed(space.row_count()))
            .cloned()
            .collect();
        if sequences.len() < data.sequences.len() {
            log::warn!(
                "Track {}: dropped {} malformed sequence(s)",
                data.id,
                data.sequences.len() - sequences.len()
            );
        }

        Self {
            id: data.id,
            name: data.name.clone(),
            muted: data.muted,
            volume: sanitize_volume(data.volume, DEFAULT_TRACK_VOLUME),
            effects: EffectChain::from_data(&data.effects),
            sequences: SequenceManager::from_data(
                data.id,
                space,
                sequences,
                data.active_sequence_id,
            ),
            clips: ClipManager::from_data(&data.clips),
            instrument,
            nodes: None,
        }
    }

    pub fn to_data(&self) -> TrackData {
        TrackData {
            id: self.id,
            name: self.name.clone(),
            muted: self.muted,
            volume: self.volume,
            effects: self.effects.to_data(),
            sequences: self.sequences.sequences().to_vec(),
            active_sequence_id: self.sequences.active_id(),
            clips: self.clips.to_data(),
            instrument: self.instrument.to_data(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> TrackKind {
        self.instrument.kind()
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    pub fn sequences(&self) -> &SequenceManager {
        &self.sequences
    }

    pub fn sequences_mut(&mut self) -> &mut SequenceManager {
        &mut self.sequences
    }

    pub fn clips(&self) -> &ClipManager {
        &self.clips
    }

    pub fn clips_mut(&mut self) -> &mut ClipManager {
        &mut self.clips
    }

    pub fn nodes(&self) -> Option<TrackNodes> {
        self.nodes
    }

    pub fn is_connected(&self) -> bool {
        self.nodes.is_some()
    }

    /// Fetch and decode every referenced sample
    ///
    /// A missing or undecodable sample leaves its slot in `Error`; the
    /// failures are returned so the caller can report them.
    pub fn load_buffers(&mut self, store: &dyn SampleStore) -> Vec<LoadFailure> {
        let mut failures = self.instrument.load_buffers(store);
        for (clip_id, error) in self.clips.load_buffers(store) {
            let label = self
                .clips
                .get(clip_id)
                .map_or_else(|| "clip".to_string(), |c| format!("clip '{}'", c.name));
            failures.push(LoadFailure { label, error });
        }
        for failure in &failures {
            log::warn!("Track {}: {} failed to load: {}", self.id, failure.label, failure.error);
        }
        failures
    }

    /// Allocate the track nodes and wire them to `master_input`
    ///
    /// Connecting an already connected track does nothing.
    pub fn connect(
        &mut self,
        engine: &mut dyn AudioEngine,
        master_input: NodeId,
        silenced: bool,
    ) -> Result<(), TrackError> {
        if self.nodes.is_some() {
            return Ok(());
        }

        let instrument = engine.create_node(self.instrument.node_kind());
        for (path, value) in leaf_paths(&self.instrument.node_params()) {
            engine.set_param(instrument, &path, &value)?;
        }
        let output = engine.create_node(NodeKind::Gain {
            level: self.target_gain(silenced),
        });
        let meter = engine.create_node(NodeKind::Meter);

        self.nodes = Some(TrackNodes {
            instrument,
            output,
            meter,
            master: master_input,
        });

        self.effects.attach(engine, instrument, output)?;
        engine.connect(output, master_input)?;
        engine.connect(output, meter)?;
        Ok(())
    }

    /// Release every node and cancel scheduled parts
    ///
    /// Safe to call repeatedly and on tracks that were never connected.
    pub fn dispose(&mut self, engine: &mut dyn AudioEngine, transport: &mut dyn Transport) {
        self.sequences.stop(transport);
        self.clips.stop(transport);
        self.effects.dispose(engine);

        if let Some(nodes) = self.nodes.take() {
            engine.release_all(nodes.instrument);
            engine.disconnect(nodes.output, nodes.master);
            engine.disconnect(nodes.output, nodes.meter);
            engine.dispose(nodes.instrument);
            engine.dispose(nodes.output);
            engine.dispose(nodes.meter);
        }
    }

    fn target_gain(&self, silenced: bool) -> f32 {
        if silenced { 0.0 } else { self.volume }
    }

    /// Ramp the output gain to the volume, or to zero when silenced
    pub fn apply_gain(
        &self,
        engine: &mut dyn AudioEngine,
        silenced: bool,
        ramp_seconds: f64,
    ) -> Result<(), TrackError> {
        if let Some(nodes) = self.nodes {
            engine.ramp_gain(nodes.output, self.target_gain(silenced), ramp_seconds)?;
        }
        Ok(())
    }

    /// Set the track volume; kept while muted
    ///
    /// Non-finite values keep the previous volume. Returns the stored value.
    pub fn set_volume(
        &mut self,
        engine: &mut dyn AudioEngine,
        volume: f32,
        silenced: bool,
    ) -> Result<f32, TrackError> {
        self.volume = sanitize_volume(volume, self.volume);
        self.apply_gain(engine, silenced, 0.0)?;
        Ok(self.volume)
    }

    /// Synth parameter by dotted path (e.g. `filter.frequency`)
    pub fn set_synth_param(
        &mut self,
        engine: &mut dyn AudioEngine,
        path: &str,
        value: &ParamValue,
    ) -> Result<ParamValue, TrackError> {
        let kind = self.kind();
        let Instrument::Synth(settings) = &mut self.instrument else {
            return Err(TrackError::WrongInstrument {
                operation: "set_synth_param",
                kind,
            });
        };
        let applied = settings
            .apply(path, value)
            .ok_or_else(|| TrackError::UnknownParam(path.to_string()))?;
        self.push_param(engine, path, &applied)?;
        Ok(applied)
    }

    /// Slicer slice setting (volume, pitchShift, loop, reverse, offset, duration, envelope.*)
    pub fn set_slice_param(
        &mut self,
        engine: &mut dyn AudioEngine,
        index: usize,
        name: &str,
        value: &ParamValue,
    ) -> Result<ParamValue, TrackError> {
        let kind = self.kind();
        let Instrument::Sampler(slicer) = &mut self.instrument else {
            return Err(TrackError::WrongInstrument {
                operation: "set_slice_param",
                kind,
            });
        };
        let len = slicer.slices.len();
        let slice = slicer
            .slices
            .get_mut(index)
            .ok_or(TrackError::IndexOutOfRange { index, len })?;
        let applied = slice
            .set(name, value)
            .ok_or_else(|| TrackError::UnknownParam(name.to_string()))?;
        self.push_param(engine, &format!("slices.{}.{}", index, name), &applied)?;
        Ok(applied)
    }

    /// Slicer voice mode
    pub fn set_slicer_polyphonic(
        &mut self,
        engine: &mut dyn AudioEngine,
        polyphonic: bool,
    ) -> Result<(), TrackError> {
        let kind = self.kind();
        let Instrument::Sampler(slicer) = &mut self.instrument else {
            return Err(TrackError::WrongInstrument {
                operation: "set_slicer_polyphonic",
                kind,
            });
        };
        slicer.polyphonic = polyphonic;
        self.push_param(engine, "polyphonic", &ParamValue::from(polyphonic))
    }

    /// Drum pad setting (volume, pitchShift, loop, reverse, offset, duration, envelope.*)
    pub fn set_pad_param(
        &mut self,
        engine: &mut dyn AudioEngine,
        index: usize,
        name: &str,
        value: &ParamValue,
    ) -> Result<ParamValue, TrackError> {
        let kind = self.kind();
        let Instrument::DrumSampler(pads) = &mut self.instrument else {
            return Err(TrackError::WrongInstrument {
                operation: "set_pad_param",
                kind,
            });
        };
        let len = pads.len();
        let pad = pads
            .get_mut(index)
            .ok_or(TrackError::IndexOutOfRange { index, len })?;
        let applied = pad
            .settings
            .set(name, value)
            .ok_or_else(|| TrackError::UnknownParam(name.to_string()))?;
        self.push_param(engine, &format!("pads.{}.{}", index, name), &applied)?;
        Ok(applied)
    }

    /// Instrument sampler setting (rootNote, loop, polyphonic, volume, envelope.*)
    pub fn set_instrument_sampler_param(
        &mut self,
        engine: &mut dyn AudioEngine,
        name: &str,
        value: &ParamValue,
    ) -> Result<ParamValue, TrackError> {
        let kind = self.kind();
        let Instrument::InstrumentSampler(sample) = &mut self.instrument else {
            return Err(TrackError::WrongInstrument {
                operation: "set_instrument_sampler_param",
                kind,
            });
        };
        let applied = sample
            .set(name, value)
            .ok_or_else(|| TrackError::UnknownParam(name.to_string()))?;
        self.push_param(engine, name, &applied)?;
        Ok(applied)
    }

    /// Audio input monitoring flag
    pub fn set_monitoring(&mut self, monitoring: bool) -> Result<(), TrackError> {
        let kind = self.kind();
        match &mut self.instrument {
            Instrument::Audio { monitoring: current } => {
                *current = monitoring;
                Ok(())
            }
            _ => Err(TrackError::WrongInstrument {
                operation: "set_monitoring",
                kind,
            }),
        }
    }

    fn push_param(
        &self,
        engine: &mut dyn AudioEngine,
        path: &str,
        value: &ParamValue,
    ) -> Result<(), TrackError> {
        if let Some(nodes) = self.nodes {
            engine.set_param(nodes.instrument, path, value)?;
        }
        Ok(())
    }

    pub fn add_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        kind: EffectKind,
        params: Option<&Params>,
    ) -> Result<EffectId, TrackError> {
        Ok(self.effects.add_effect(engine, kind, params)?)
    }

    pub fn remove_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
    ) -> Result<bool, TrackError> {
        Ok(self.effects.remove_effect(engine, id)?)
    }

    pub fn update_effect_param(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
        path: &str,
        value: ParamValue,
    ) -> Result<bool, TrackError> {
        Ok(self.effects.update_param(engine, id, path, value)?)
    }

    pub fn reorder_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
        new_index: usize,
    ) -> Result<bool, TrackError> {
        Ok(self.effects.reorder(engine, id, new_index)?)
    }

    /// Store a sample and cut it into equal slices
    ///
    /// The new slice regions are pushed to the live node.
    pub fn load_slicer_sample(
        &mut self,
        engine: &mut dyn AudioEngine,
        store: &mut dyn SampleStore,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), TrackError> {
        let kind = self.kind();
        match self.instrument.load_slicer_sample(store, bytes, file_name) {
            Some(result) => result?,
            None => {
                return Err(TrackError::WrongInstrument {
                    operation: "load_slicer_sample",
                    kind,
                });
            }
        }

        let params = self.instrument.node_params();
        if let Some(ParamValue::Group(slices)) = params.get("slices") {
            for (path, value) in leaf_paths(slices) {
                self.push_param(engine, &format!("slices.{}", path), &value)?;
            }
        }
        Ok(())
    }

    /// Store a sample on a drum pad
    pub fn load_pad_sample(
        &mut self,
        store: &mut dyn SampleStore,
        index: usize,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), TrackError> {
        let kind = self.kind();
        let Instrument::DrumSampler(pads) = &mut self.instrument else {
            return Err(TrackError::WrongInstrument {
                operation: "load_pad_sample",
                kind,
            });
        };
        let len = pads.len();
        let pad = pads
            .get_mut(index)
            .ok_or(TrackError::IndexOutOfRange { index, len })?;
        pad.slot.store_and_load(store, bytes, file_name)?;
        Ok(())
    }

    /// Store the pitched sample of an instrument sampler
    pub fn load_instrument_sample(
        &mut self,
        store: &mut dyn SampleStore,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), TrackError> {
        let kind = self.kind();
        let Instrument::InstrumentSampler(sample) = &mut self.instrument else {
            return Err(TrackError::WrongInstrument {
                operation: "load_instrument_sample",
                kind,
            });
        };
        sample.slot.store_and_load(store, bytes, file_name)?;
        Ok(())
    }

    /// Store audio and place it as a clip at `start_time`
    pub fn add_audio_clip(
        &mut self,
        store: &mut dyn SampleStore,
        bytes: Vec<u8>,
        file_name: &str,
        start_time: f64,
    ) -> Result<ClipId, TrackError> {
        if self.kind() != TrackKind::Audio {
            return Err(TrackError::WrongInstrument {
                operation: "add_audio_clip",
                kind: self.kind(),
            });
        }
        let mut slot = BufferSlot::new();
        let sample = slot.store_and_load(store, bytes, file_name)?;
        Ok(self.clips.add_audio_clip(slot, start_time, sample.file_name))
    }

    /// Copy a sequence into a clip at `start_time`
    pub fn add_midi_clip(
        &mut self,
        sequence: SequenceId,
        start_time: f64,
        seconds_per_step: f64,
    ) -> Result<ClipId, TrackError> {
        let source = self
            .sequences
            .get(sequence)
            .ok_or(TrackError::SequenceNotFound)?;
        Ok(self.clips.add_midi_clip(source, start_time, seconds_per_step))
    }

    /// Reschedule the active sequence loop
    pub fn recompile(&mut self, transport: &mut dyn Transport) {
        self.sequences.recompile(transport);
    }

    /// Schedule the arrangement clips as one-shot parts
    pub fn schedule_clips(&mut self, transport: &mut dyn Transport) -> usize {
        let playable = self.sequences.is_playable() || self.kind() == TrackKind::Audio;
        let tail = self.instrument.max_release_seconds();
        self.clips
            .schedule(transport, self.id, self.instrument.row_space(), playable, tail)
    }

    /// Cancel every scheduled part of the track
    pub fn stop(&mut self, transport: &mut dyn Transport) {
        self.sequences.stop(transport);
        self.clips.stop(transport);
    }

    /// Start the voice for a fired event
    ///
    /// Returns None without touching the engine when the track is not
    /// connected or the target has nothing loaded.
    pub fn handle_event(
        &self,
        engine: &mut dyn AudioEngine,
        fired: &FiredEvent,
        seconds_per_beat: f64,
    ) -> Result<Option<VoiceId>, TrackError> {
        let gate_seconds = fired.event.duration_beats * seconds_per_beat;
        let voice = match fired.event.target {
            EventTarget::AudioClip(clip) => self.clip_voice(clip, fired.at_seconds),
            target => self.instrument.voice_for(
                target,
                fired.event.velocity,
                fired.at_seconds,
                gate_seconds,
            ),
        };
        self.start_voice(engine, voice)
    }

    /// Play one row immediately (live input, previews)
    pub fn audition(
        &self,
        engine: &mut dyn AudioEngine,
        row: usize,
        velocity: f32,
        at_seconds: f64,
        gate_seconds: f64,
    ) -> Result<Option<VoiceId>, TrackError> {
        let Some(target) = self.instrument.row_space().target(row) else {
            return Ok(None);
        };
        let voice = self
            .instrument
            .voice_for(target, velocity, at_seconds, gate_seconds);
        self.start_voice(engine, voice)
    }

    fn start_voice(
        &self,
        engine: &mut dyn AudioEngine,
        voice: Option<VoiceTrigger>,
    ) -> Result<Option<VoiceId>, TrackError> {
        match (self.nodes, voice) {
            (Some(nodes), Some(voice)) => Ok(Some(engine.trigger(nodes.instrument, voice)?)),
            _ => Ok(None),
        }
    }

    fn clip_voice(&self, clip: ClipId, at_seconds: f64) -> Option<VoiceTrigger> {
        let clip = self.clips.get(clip)?;
        let ClipPayload::Audio { slot, offset } = &clip.payload else {
            return None;
        };
        let buffer = slot.buffer()?;
        let offset = offset.clamp(0.0, buffer.duration_seconds());
        let length = clip.duration.min(buffer.duration_seconds() - offset).max(0.0);

        Some(VoiceTrigger {
            at_seconds,
            velocity: 1.0,
            duration_seconds: length,
            release_seconds: 0.0,
            source: VoiceSource::Buffer(BufferPlayback {
                buffer: Arc::clone(buffer),
                offset_seconds: offset,
                length_seconds: length,
                playback_rate: 1.0,
                gain: 1.0,
                reverse: false,
                looped: false,
            }),
        })
    }
}

fn sanitize_volume(volume: f32, fallback: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{GraphEngine, TriggerSource};
    use crate::constants::{PITCH_HIGHEST, row_for_pitch};
    use crate::sampler::loader::{AudioBuffer, encode_wav};
    use crate::sampler::slot::SlotStatus;
    use crate::sampler::store::MemoryStore;
    use crate::sequencer::sequence::StepNote;
    use crate::sequencer::transport::OfflineTransport;

    fn wav(seconds: f64) -> Vec<u8> {
        let frames = (seconds * 1000.0) as usize;
        encode_wav(&AudioBuffer::new(1000, 1, vec![0.3; frames])).unwrap()
    }

    fn connected(kind: TrackKind) -> (Track, GraphEngine, OfflineTransport) {
        let mut engine = GraphEngine::new();
        let transport = OfflineTransport::new(120.0);
        let mut track = Track::new(TrackId(1), kind.default_name(), kind);
        let master = engine.destination();
        track.connect(&mut engine, master, false).unwrap();
        (track, engine, transport)
    }

    #[test]
    fn test_connect_wires_output_and_meter() {
        let (track, engine, _) = connected(TrackKind::Synth);
        let nodes = track.nodes().unwrap();

        assert_eq!(engine.outputs(nodes.instrument), vec![nodes.output]);
        let outputs = engine.outputs(nodes.output);
        assert!(outputs.contains(&engine.destination()));
        assert!(outputs.contains(&nodes.meter));
        assert_eq!(engine.gain(nodes.output), Some(DEFAULT_TRACK_VOLUME));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut track, mut engine, mut transport) = connected(TrackKind::Synth);
        track
            .effects
            .add_effect(&mut engine, EffectKind::Reverb, None)
            .unwrap();
        assert!(engine.node_count() > 0);

        track.dispose(&mut engine, &mut transport);
        assert_eq!(engine.node_count(), 0);
        assert_eq!(engine.connection_count(), 0);

        track.dispose(&mut engine, &mut transport);
        assert!(!track.is_connected());

        let mut never_connected = Track::new(TrackId(2), "Spare", TrackKind::DrumSampler);
        never_connected.dispose(&mut engine, &mut transport);
    }

    #[test]
    fn test_volume_survives_mute() {
        let (mut track, mut engine, _) = connected(TrackKind::Synth);
        let output = track.nodes().unwrap().output;

        track.set_volume(&mut engine, 0.5, false).unwrap();
        track.apply_gain(&mut engine, true, 0.02).unwrap();
        assert_eq!(engine.gain(output), Some(0.0));
        assert_eq!(track.volume(), 0.5);

        track.apply_gain(&mut engine, false, 0.02).unwrap();
        assert_eq!(engine.gain(output), Some(0.5));

        track.set_volume(&mut engine, f32::NAN, false).unwrap();
        assert_eq!(track.volume(), 0.5);
    }

    #[test]
    fn test_synth_param_reaches_live_node() {
        let (mut track, mut engine, _) = connected(TrackKind::Synth);
        let node = track.nodes().unwrap().instrument;

        let applied = track
            .set_synth_param(&mut engine, "filter.frequency", &ParamValue::Number(50_000.0))
            .unwrap();
        assert_eq!(applied, ParamValue::Number(20_000.0));
        assert_eq!(engine.param(node, "filter.frequency"), Some(&applied));

        assert!(matches!(
            track.set_synth_param(&mut engine, "nope", &ParamValue::Number(1.0)),
            Err(TrackError::UnknownParam(_))
        ));
    }

    #[test]
    fn test_setter_on_wrong_track_type() {
        let (mut track, mut engine, _) = connected(TrackKind::Synth);
        let result = track.set_pad_param(&mut engine, 0, "volume", &ParamValue::Number(0.5));
        assert!(matches!(result, Err(TrackError::WrongInstrument { .. })));
    }

    #[test]
    fn test_pad_param_index_checked() {
        let (mut track, mut engine, _) = connected(TrackKind::DrumSampler);
        let result = track.set_pad_param(&mut engine, 16, "volume", &ParamValue::Number(0.5));
        assert!(matches!(result, Err(TrackError::IndexOutOfRange { index: 16, len: 16 })));

        let applied = track
            .set_pad_param(&mut engine, 3, "envelope.release", &ParamValue::Number(0.4))
            .unwrap();
        assert_eq!(applied, ParamValue::Number(0.4f32 as f64));
        let node = track.nodes().unwrap().instrument;
        assert!(engine.param(node, "pads.3.envelope.release").is_some());
    }

    #[test]
    fn test_instrument_sampler_root_note() {
        let (mut track, mut engine, _) = connected(TrackKind::InstrumentSampler);
        let applied = track
            .set_instrument_sampler_param(&mut engine, "rootNote", &ParamValue::Number(200.0))
            .unwrap();
        assert_eq!(applied, ParamValue::Number(127.0));

        track
            .set_instrument_sampler_param(&mut engine, "polyphonic", &ParamValue::from(false))
            .unwrap();
        let node = track.nodes().unwrap().instrument;
        assert_eq!(engine.kind(node), Some(&NodeKind::Sampler { polyphonic: false }));
    }

    #[test]
    fn test_fired_event_triggers_voice() {
        let (mut track, mut engine, mut transport) = connected(TrackKind::Synth);
        let row = row_for_pitch(PITCH_HIGHEST).unwrap();
        let id = track.sequences().active_id();
        assert!(id.is_none());

        let seq = track.sequences_mut().create_sequence(&mut transport, "A", 16);
        track
            .sequences_mut()
            .add_note(&mut transport, seq, row, 0, StepNote::new(0.5, 2));

        transport.play();
        let fired = transport.advance(0.1);
        assert_eq!(fired.len(), 1);

        let voice = track
            .handle_event(&mut engine, &fired[0], transport.seconds_per_beat())
            .unwrap();
        assert!(voice.is_some());
        let record = &engine.triggers()[0];
        assert_eq!(record.source, TriggerSource::Pitch(PITCH_HIGHEST));
        assert!((record.duration_seconds - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_unloaded_pad_event_is_silent() {
        let (track, mut engine, _) = connected(TrackKind::DrumSampler);
        let voice = track.audition(&mut engine, 0, 1.0, 0.0, 0.1).unwrap();
        assert!(voice.is_none());
        assert!(engine.triggers().is_empty());
    }

    #[test]
    fn test_loaded_pad_plays() {
        let (mut track, mut engine, _) = connected(TrackKind::DrumSampler);
        let mut store = MemoryStore::new();
        track.load_pad_sample(&mut store, 2, wav(0.5), "kick.wav").unwrap();

        let voice = track.audition(&mut engine, 2, 1.0, 0.0, 0.1).unwrap();
        assert!(voice.is_some());
    }

    #[test]
    fn test_audio_clip_from_bytes() {
        let (mut track, mut engine, mut transport) = connected(TrackKind::Audio);
        let mut store = MemoryStore::new();
        let clip = track
            .add_audio_clip(&mut store, wav(0.5), "take.wav", 1.0)
            .unwrap();
        assert_eq!(track.clips().get(clip).unwrap().duration, 0.5);

        assert_eq!(track.schedule_clips(&mut transport), 1);
        transport.play();
        let fired = transport.advance(1.5);
        assert_eq!(fired.len(), 1);
        assert!((fired[0].at_seconds - 1.0).abs() < 1e-9);

        track
            .handle_event(&mut engine, &fired[0], transport.seconds_per_beat())
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_roundtrip_keeps_sample_reference_not_audio() {
        let mut store = MemoryStore::new();
        let mut track = Track::new(TrackId(4), "Kit", TrackKind::DrumSampler);
        track.load_pad_sample(&mut store, 0, wav(0.2), "hat.wav").unwrap();
        track.set_muted(true);

        let data = track.to_data();
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"dbKey\""));
        assert!(json.contains("\"type\":\"drumSampler\""));

        let mut restored = Track::from_data(&data);
        assert_eq!(restored.to_data(), data);
        assert!(restored.load_buffers(&store).is_empty());
        if let Instrument::DrumSampler(pads) = restored.instrument() {
            assert_eq!(pads[0].slot.status(), SlotStatus::Loaded);
            assert_eq!(pads[1].slot.status(), SlotStatus::Empty);
        }
    }
}
