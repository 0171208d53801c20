// GraphEngine - In-process node graph implementing AudioEngine
//
// Keeps nodes, ordered connections, parameters, gains and active voices.
// No samples are rendered; the graph is what the core is responsible for
// getting right (topology, parameters, voice lifetimes).
//
// Architecture:
// - Nodes: HashMap keyed by NodeId, node 0 is the destination
// - Connections: ordered list of (from, to) pairs, cycle-checked on insert
// - Voices: active voices with an expiry time, monophonic nodes keep one
// - Trigger log: most recent started voices, capped at MAX_TRIGGER_LOG

use super::parameters::{self, ParamValue, Params};
use super::{AudioEngine, EngineError, NodeId, NodeKind, VoiceId, VoiceSource, VoiceTrigger};
use crate::constants::MAX_TRIGGER_LOG;
use std::collections::{HashMap, HashSet};

/// Summary of a started voice
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerRecord {
    pub voice: VoiceId,
    pub node: NodeId,
    pub at_seconds: f64,
    pub velocity: f32,
    pub duration_seconds: f64,
    pub source: TriggerSource,
}

/// What a recorded voice played
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerSource {
    Pitch(u8),
    Buffer {
        offset_seconds: f64,
        length_seconds: f64,
        playback_rate: f64,
        gain: f32,
        reverse: bool,
    },
}

#[derive(Debug, Clone)]
struct GraphNode {
    kind: NodeKind,
    params: Params,
    gain: f32,
}

#[derive(Debug, Clone)]
struct ActiveVoice {
    id: VoiceId,
    node: NodeId,
    expires_at: f64,
}

/// Inspectable audio graph
pub struct GraphEngine {
    nodes: HashMap<NodeId, GraphNode>,
    connections: Vec<(NodeId, NodeId)>,
    voices: Vec<ActiveVoice>,
    triggers: Vec<TriggerRecord>,
    next_node_id: u64,
    next_voice_id: u64,
    destination: NodeId,
}

impl GraphEngine {
    /// Create a graph holding only the destination node
    pub fn new() -> Self {
        let destination = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            destination,
            GraphNode {
                kind: NodeKind::Destination,
                params: Params::new(),
                gain: 1.0,
            },
        );

        Self {
            nodes,
            connections: Vec::new(),
            voices: Vec::new(),
            triggers: Vec::new(),
            next_node_id: 1, // 0 is the destination
            next_voice_id: 1,
            destination,
        }
    }

    /// Number of live nodes, destination excluded
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|n| &n.kind)
    }

    /// Current gain of a node
    pub fn gain(&self, node: NodeId) -> Option<f32> {
        self.nodes.get(&node).map(|n| n.gain)
    }

    /// Parameter of a node by dotted path
    pub fn param(&self, node: NodeId, path: &str) -> Option<&ParamValue> {
        self.nodes
            .get(&node)
            .and_then(|n| parameters::get_path(&n.params, path))
    }

    /// Nodes fed by `node`, in connection order
    pub fn outputs(&self, node: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter(|(from, _)| *from == node)
            .map(|(_, to)| *to)
            .collect()
    }

    /// Nodes feeding `node`, in connection order
    pub fn inputs(&self, node: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter(|(_, to)| *to == node)
            .map(|(from, _)| *from)
            .collect()
    }

    /// Follow single outputs from `start` until a node with no or several outputs
    pub fn signal_path(&self, start: NodeId) -> Vec<NodeId> {
        let mut path = vec![start];
        let mut seen = HashSet::from([start]);
        let mut current = start;

        loop {
            let outputs = self.outputs(current);
            if outputs.len() != 1 || !seen.insert(outputs[0]) {
                break;
            }
            current = outputs[0];
            path.push(current);
        }

        path
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Voices currently alive on a node
    pub fn active_voices(&self, node: NodeId) -> usize {
        self.voices.iter().filter(|v| v.node == node).count()
    }

    pub fn total_active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Voices started since the last `clear_triggers`, oldest dropped past the cap
    pub fn triggers(&self) -> &[TriggerRecord] {
        &self.triggers
    }

    pub fn clear_triggers(&mut self) {
        self.triggers.clear();
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut GraphNode, EngineError> {
        self.nodes
            .get_mut(&node)
            .ok_or(EngineError::NodeNotFound(node))
    }

    /// Check whether connecting `from -> to` would close a loop
    fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = HashSet::new();
        self.has_path_dfs(to, from, &mut visited)
    }

    /// Depth-first search for a path between two nodes
    fn has_path_dfs(&self, current: NodeId, target: NodeId, visited: &mut HashSet<NodeId>) -> bool {
        if current == target {
            return true;
        }

        if !visited.insert(current) {
            return false;
        }

        self.connections
            .iter()
            .filter(|(from, _)| *from == current)
            .any(|(_, to)| self.has_path_dfs(*to, target, visited))
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for GraphEngine {
    fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let (params, gain) = match &kind {
            NodeKind::Effect { params, .. } => (params.clone(), 1.0),
            NodeKind::Gain { level } => (Params::new(), *level),
            _ => (Params::new(), 1.0),
        };

        self.nodes.insert(id, GraphNode { kind, params, gain });
        id
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        if !self.nodes.contains_key(&from) {
            return Err(EngineError::NodeNotFound(from));
        }
        if !self.nodes.contains_key(&to) {
            return Err(EngineError::NodeNotFound(to));
        }
        if self.connections.contains(&(from, to)) {
            return Ok(());
        }
        if self.would_create_cycle(from, to) {
            return Err(EngineError::WouldCycle { from, to });
        }

        self.connections.push((from, to));
        Ok(())
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) {
        self.connections.retain(|c| *c != (from, to));
    }

    fn set_param(
        &mut self,
        node: NodeId,
        path: &str,
        value: &ParamValue,
    ) -> Result<(), EngineError> {
        let graph_node = self.node_mut(node)?;

        match (&mut graph_node.kind, path) {
            (NodeKind::Gain { level }, "gain") => {
                let target = value.as_number().ok_or_else(|| EngineError::InvalidParam {
                    node,
                    path: path.to_string(),
                })? as f32;
                *level = target;
                graph_node.gain = target;
                return Ok(());
            }
            (NodeKind::Synth { mono }, "mono") => {
                *mono = value.as_flag().unwrap_or(*mono);
            }
            (NodeKind::Sampler { polyphonic }, "polyphonic") => {
                *polyphonic = value.as_flag().unwrap_or(*polyphonic);
            }
            _ => {}
        }

        if parameters::set_path(&mut graph_node.params, path, value.clone()) {
            Ok(())
        } else {
            Err(EngineError::InvalidParam {
                node,
                path: path.to_string(),
            })
        }
    }

    fn ramp_gain(
        &mut self,
        node: NodeId,
        target: f32,
        _ramp_seconds: f64,
    ) -> Result<(), EngineError> {
        // Ramps complete instantly here; only the end value is observable
        let graph_node = self.node_mut(node)?;
        graph_node.gain = target;
        if let NodeKind::Gain { level } = &mut graph_node.kind {
            *level = target;
        }
        Ok(())
    }

    fn trigger(&mut self, node: NodeId, voice: VoiceTrigger) -> Result<VoiceId, EngineError> {
        let graph_node = self
            .nodes
            .get(&node)
            .ok_or(EngineError::NodeNotFound(node))?;

        if !graph_node.kind.is_instrument() {
            return Err(EngineError::NotAnInstrument(node));
        }

        if graph_node.kind.is_monophonic() {
            self.voices.retain(|v| v.node != node);
        }

        let id = VoiceId(self.next_voice_id);
        self.next_voice_id += 1;

        self.voices.push(ActiveVoice {
            id,
            node,
            expires_at: voice.expires_at(),
        });

        let source = match &voice.source {
            VoiceSource::Pitch(pitch) => TriggerSource::Pitch(*pitch),
            VoiceSource::Buffer(playback) => TriggerSource::Buffer {
                offset_seconds: playback.offset_seconds,
                length_seconds: playback.length_seconds,
                playback_rate: playback.playback_rate,
                gain: playback.gain,
                reverse: playback.reverse,
            },
        };

        if self.triggers.len() >= MAX_TRIGGER_LOG {
            let excess = self.triggers.len() + 1 - MAX_TRIGGER_LOG;
            self.triggers.drain(..excess);
        }
        self.triggers.push(TriggerRecord {
            voice: id,
            node,
            at_seconds: voice.at_seconds,
            velocity: voice.velocity,
            duration_seconds: voice.duration_seconds,
            source,
        });

        Ok(id)
    }

    fn release_all(&mut self, node: NodeId) {
        self.voices.retain(|v| v.node != node);
    }

    fn release_expired(&mut self, now_seconds: f64) -> usize {
        let before = self.voices.len();
        self.voices.retain(|v| v.expires_at > now_seconds);
        before - self.voices.len()
    }

    fn dispose(&mut self, node: NodeId) {
        if node == self.destination {
            return;
        }
        if self.nodes.remove(&node).is_some() {
            self.connections.retain(|(from, to)| *from != node && *to != node);
            self.voices.retain(|v| v.node != node);
        }
    }

    fn destination(&self) -> NodeId {
        self.destination
    }
}
