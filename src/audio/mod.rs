// Audio node engine - The collaborator the core wires nodes into
//
// The core never renders audio itself. It creates instrument, effect and gain
// nodes on an `AudioEngine`, connects them into per-track chains that fan into
// the master bus, and triggers voices on instrument nodes when the transport
// fires scheduled events.
//
// `GraphEngine` is an in-process implementation that keeps the node graph,
// parameters and voice bookkeeping, used for offline rendering and tests.

pub mod graph;
pub mod parameters;

use crate::sampler::loader::AudioBuffer;
use crate::synth::effect::EffectKind;
use parameters::{ParamValue, Params};
use std::sync::Arc;

pub use graph::{GraphEngine, TriggerRecord, TriggerSource};

/// Unique node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Unique voice identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// Kinds of nodes the core asks the engine for
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Oscillator instrument; a mono synth keeps at most one voice
    Synth { mono: bool },
    /// Buffer player instrument (slices, pads, instrument samples, clips)
    Sampler { polyphonic: bool },
    /// Gain stage
    Gain { level: f32 },
    /// Level meter tap
    Meter,
    /// Effect processor
    Effect { kind: EffectKind, params: Params },
    /// Hardware output
    Destination,
}

impl NodeKind {
    pub fn is_instrument(&self) -> bool {
        matches!(self, NodeKind::Synth { .. } | NodeKind::Sampler { .. })
    }

    /// Whether a new voice cuts the previous one
    pub fn is_monophonic(&self) -> bool {
        matches!(
            self,
            NodeKind::Synth { mono: true } | NodeKind::Sampler { polyphonic: false }
        )
    }
}

/// What a voice plays
#[derive(Debug, Clone)]
pub enum VoiceSource {
    /// Pitched oscillator note (MIDI number)
    Pitch(u8),
    /// Region of a decoded buffer
    Buffer(BufferPlayback),
}

/// Buffer region playback settings
#[derive(Debug, Clone)]
pub struct BufferPlayback {
    pub buffer: Arc<AudioBuffer>,
    pub offset_seconds: f64,
    pub length_seconds: f64,
    pub playback_rate: f64,
    pub gain: f32,
    pub reverse: bool,
    pub looped: bool,
}

/// A voice to start on an instrument node
#[derive(Debug, Clone)]
pub struct VoiceTrigger {
    pub at_seconds: f64,
    pub velocity: f32,
    pub duration_seconds: f64,
    /// Tail after `duration_seconds` before the voice is disposed
    pub release_seconds: f64,
    pub source: VoiceSource,
}

impl VoiceTrigger {
    /// Time after which the voice is silent and can be disposed
    pub fn expires_at(&self) -> f64 {
        self.at_seconds + self.duration_seconds.max(0.0) + self.release_seconds.max(0.0)
    }
}

/// Errors reported by an audio engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Audio node {0:?} does not exist")]
    NodeNotFound(NodeId),

    #[error("Connecting {from:?} -> {to:?} would create a cycle")]
    WouldCycle { from: NodeId, to: NodeId },

    #[error("Audio node {0:?} cannot play voices")]
    NotAnInstrument(NodeId),

    #[error("Invalid parameter '{path}' on node {node:?}")]
    InvalidParam { node: NodeId, path: String },
}

/// Audio node engine interface
pub trait AudioEngine {
    /// Allocate a node
    fn create_node(&mut self, kind: NodeKind) -> NodeId;

    /// Connect the output of `from` into `to`
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError>;

    /// Remove a connection (no-op if absent)
    fn disconnect(&mut self, from: NodeId, to: NodeId);

    /// Set a parameter on a live node without touching topology
    fn set_param(&mut self, node: NodeId, path: &str, value: &ParamValue)
        -> Result<(), EngineError>;

    /// Move a gain node to `target` over `ramp_seconds`
    fn ramp_gain(&mut self, node: NodeId, target: f32, ramp_seconds: f64)
        -> Result<(), EngineError>;

    /// Start a voice on an instrument node
    fn trigger(&mut self, node: NodeId, voice: VoiceTrigger) -> Result<VoiceId, EngineError>;

    /// Stop every voice of a node
    fn release_all(&mut self, node: NodeId);

    /// Dispose voices that finished before `now_seconds`; returns how many
    fn release_expired(&mut self, now_seconds: f64) -> usize;

    /// Free a node and its connections (no-op if already gone)
    fn dispose(&mut self, node: NodeId);

    /// The hardware output node
    fn destination(&self) -> NodeId;
}
