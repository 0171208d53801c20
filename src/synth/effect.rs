// Effect - Effect chains wired into the audio graph
//
// An EffectChain owns an ordered list of effects and the nodes they were
// given on the audio engine. List order is signal order: the chain is always
// wired as `input -> e1 -> e2 -> ... -> output`, or `input -> output` when
// empty.
//
// Architecture:
// - Effect: id, kind and a nested parameter map (stored data)
// - EffectChain: effects plus live node ids and the connections it made
// - Rewiring always tears down every connection the chain made before
//   reconnecting
//
// A chain can exist without endpoints (freshly deserialized). Nodes are
// created when it is attached, and every operation tolerates missing nodes.

use crate::audio::parameters::{self, ParamValue, Params};
use crate::audio::{AudioEngine, EngineError, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// Unique effect identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(pub uuid::Uuid);

impl EffectId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Available effect processors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Reverb,
    Delay,
    PingPongDelay,
    Chorus,
    Distortion,
    Filter,
    Compressor,
    Eq3,
    Phaser,
    BitCrusher,
}

impl EffectKind {
    pub const ALL: [EffectKind; 10] = [
        EffectKind::Reverb,
        EffectKind::Delay,
        EffectKind::PingPongDelay,
        EffectKind::Chorus,
        EffectKind::Distortion,
        EffectKind::Filter,
        EffectKind::Compressor,
        EffectKind::Eq3,
        EffectKind::Phaser,
        EffectKind::BitCrusher,
    ];

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Reverb => "Reverb",
            EffectKind::Delay => "Delay",
            EffectKind::PingPongDelay => "Ping Pong Delay",
            EffectKind::Chorus => "Chorus",
            EffectKind::Distortion => "Distortion",
            EffectKind::Filter => "Filter",
            EffectKind::Compressor => "Compressor",
            EffectKind::Eq3 => "EQ3",
            EffectKind::Phaser => "Phaser",
            EffectKind::BitCrusher => "Bit Crusher",
        }
    }

    /// Default parameter tree
    pub fn default_params(self) -> Params {
        let leaves: Vec<(&str, ParamValue)> = match self {
            EffectKind::Reverb => vec![
                ("decay", ParamValue::Number(1.5)),
                ("preDelay", ParamValue::Number(0.01)),
                ("wet", ParamValue::Number(0.3)),
            ],
            EffectKind::Delay | EffectKind::PingPongDelay => vec![
                ("delayTime", ParamValue::Number(0.25)),
                ("feedback", ParamValue::Number(0.3)),
                ("wet", ParamValue::Number(0.3)),
            ],
            EffectKind::Chorus => vec![
                ("frequency", ParamValue::Number(1.5)),
                ("delayTime", ParamValue::Number(3.5)),
                ("depth", ParamValue::Number(0.7)),
                ("wet", ParamValue::Number(0.5)),
            ],
            EffectKind::Distortion => vec![
                ("distortion", ParamValue::Number(0.4)),
                ("wet", ParamValue::Number(1.0)),
            ],
            EffectKind::Filter => vec![
                ("frequency", ParamValue::Number(1000.0)),
                ("Q", ParamValue::Number(1.0)),
                ("type", ParamValue::from("lowpass")),
            ],
            EffectKind::Compressor => vec![
                ("threshold", ParamValue::Number(-24.0)),
                ("ratio", ParamValue::Number(4.0)),
                ("attack", ParamValue::Number(0.003)),
                ("release", ParamValue::Number(0.25)),
            ],
            EffectKind::Eq3 => vec![
                ("low", ParamValue::Number(0.0)),
                ("mid", ParamValue::Number(0.0)),
                ("high", ParamValue::Number(0.0)),
            ],
            EffectKind::Phaser => vec![
                ("frequency", ParamValue::Number(0.5)),
                ("octaves", ParamValue::Number(3.0)),
                ("baseFrequency", ParamValue::Number(350.0)),
                ("wet", ParamValue::Number(0.5)),
            ],
            EffectKind::BitCrusher => vec![
                ("bits", ParamValue::Number(4.0)),
                ("wet", ParamValue::Number(1.0)),
            ],
        };

        leaves
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

/// Serialized form of an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectData {
    pub id: EffectId,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default)]
    pub params: Params,
}

/// An effect in a chain
#[derive(Debug, Clone)]
pub struct Effect {
    pub id: EffectId,
    pub kind: EffectKind,
    pub params: Params,
    node: Option<NodeId>,
}

impl Effect {
    /// Live node, if the chain is attached
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn param(&self, path: &str) -> Option<&ParamValue> {
        parameters::get_path(&self.params, path)
    }

    pub fn to_data(&self) -> EffectData {
        EffectData {
            id: self.id,
            kind: self.kind,
            params: self.params.clone(),
        }
    }
}

/// Ordered effect chain between an input and an output node
#[derive(Debug, Default)]
pub struct EffectChain {
    effects: Vec<Effect>,
    input: Option<NodeId>,
    output: Option<NodeId>,
    /// Connections made by the last rewire
    connections: Vec<(NodeId, NodeId)>,
}

impl EffectChain {
    /// Create an empty, unattached chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a chain from serialized effects (unattached)
    pub fn from_data(data: &[EffectData]) -> Self {
        let effects = data
            .iter()
            .map(|effect| {
                let mut params = effect.kind.default_params();
                parameters::merge(&mut params, &effect.params);
                Effect {
                    id: effect.id,
                    kind: effect.kind,
                    params,
                    node: None,
                }
            })
            .collect();

        Self {
            effects,
            ..Self::default()
        }
    }

    pub fn to_data(&self) -> Vec<EffectData> {
        self.effects.iter().map(Effect::to_data).collect()
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn index_of(&self, id: EffectId) -> Option<usize> {
        self.effects.iter().position(|e| e.id == id)
    }

    pub fn is_attached(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    /// Connections currently made by the chain, in signal order
    pub fn connections(&self) -> &[(NodeId, NodeId)] {
        &self.connections
    }

    /// Place the chain between `input` and `output`, creating effect nodes
    pub fn attach(
        &mut self,
        engine: &mut dyn AudioEngine,
        input: NodeId,
        output: NodeId,
    ) -> Result<(), EngineError> {
        self.input = Some(input);
        self.output = Some(output);
        for effect in &mut self.effects {
            if effect.node.is_none() {
                effect.node = Some(create_effect_node(engine, effect.kind, &effect.params));
            }
        }
        self.rewire(engine)
    }

    /// Append an effect; `params` are merged over the kind defaults
    pub fn add_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        kind: EffectKind,
        params: Option<&Params>,
    ) -> Result<EffectId, EngineError> {
        let mut merged = kind.default_params();
        if let Some(overrides) = params {
            parameters::merge(&mut merged, overrides);
        }

        let node = self
            .is_attached()
            .then(|| create_effect_node(engine, kind, &merged));

        let id = EffectId::new();
        self.effects.push(Effect {
            id,
            kind,
            params: merged,
            node,
        });
        self.rewire(engine)?;
        Ok(id)
    }

    /// Remove an effect and close the gap; false if unknown
    pub fn remove_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
    ) -> Result<bool, EngineError> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };

        self.disconnect_all(engine);
        let removed = self.effects.remove(index);
        if let Some(node) = removed.node {
            engine.dispose(node);
        }
        self.rewire(engine)?;
        Ok(true)
    }

    /// Update one parameter on the stored data and the live node
    ///
    /// Topology is left untouched. Returns false for an unknown effect or a
    /// path that walks through an existing leaf.
    pub fn update_param(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
        path: &str,
        value: ParamValue,
    ) -> Result<bool, EngineError> {
        let Some(effect) = self.effects.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };

        if !parameters::set_path(&mut effect.params, path, value.clone()) {
            return Ok(false);
        }
        if let Some(node) = effect.node {
            engine.set_param(node, path, &value)?;
        }
        Ok(true)
    }

    /// Move an effect to `new_index` (clamped) and rewire
    pub fn reorder(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
        new_index: usize,
    ) -> Result<bool, EngineError> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };

        let effect = self.effects.remove(index);
        let target = new_index.min(self.effects.len());
        self.effects.insert(target, effect);
        self.rewire(engine)?;
        Ok(true)
    }

    /// Reconnect `input -> e1 -> ... -> output`
    ///
    /// Every connection made by a previous rewire is removed first. Does
    /// nothing while the chain has no endpoints.
    pub fn rewire(&mut self, engine: &mut dyn AudioEngine) -> Result<(), EngineError> {
        self.disconnect_all(engine);

        let (Some(input), Some(output)) = (self.input, self.output) else {
            return Ok(());
        };

        let mut path = Vec::with_capacity(self.effects.len() + 2);
        path.push(input);
        path.extend(self.effects.iter().filter_map(|e| e.node));
        path.push(output);

        for pair in path.windows(2) {
            engine.connect(pair[0], pair[1])?;
            self.connections.push((pair[0], pair[1]));
        }

        log::debug!("Effect chain rewired through {} effect(s)", self.effects.len());
        Ok(())
    }

    /// Dispose every effect node and drop the endpoints
    ///
    /// Safe to call repeatedly and on a chain that was never attached.
    pub fn dispose(&mut self, engine: &mut dyn AudioEngine) {
        self.disconnect_all(engine);
        for effect in &mut self.effects {
            if let Some(node) = effect.node.take() {
                engine.dispose(node);
            }
        }
        self.input = None;
        self.output = None;
    }

    fn disconnect_all(&mut self, engine: &mut dyn AudioEngine) {
        for (from, to) in self.connections.drain(..) {
            engine.disconnect(from, to);
        }
    }
}

fn create_effect_node(engine: &mut dyn AudioEngine, kind: EffectKind, params: &Params) -> NodeId {
    engine.create_node(NodeKind::Effect {
        kind,
        params: params.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::GraphEngine;

    fn attached_chain(engine: &mut GraphEngine) -> (EffectChain, NodeId, NodeId) {
        let input = engine.create_node(NodeKind::Gain { level: 1.0 });
        let output = engine.create_node(NodeKind::Gain { level: 1.0 });
        let mut chain = EffectChain::new();
        chain.attach(engine, input, output).unwrap();
        (chain, input, output)
    }

    fn effect_node(chain: &EffectChain, id: EffectId) -> NodeId {
        chain.get(id).and_then(Effect::node).unwrap()
    }

    #[test]
    fn test_empty_chain_connects_input_to_output() {
        let mut engine = GraphEngine::new();
        let (chain, input, output) = attached_chain(&mut engine);

        assert!(chain.is_empty());
        assert_eq!(engine.signal_path(input), vec![input, output]);
    }

    #[test]
    fn test_add_effects_in_signal_order() {
        let mut engine = GraphEngine::new();
        let (mut chain, input, output) = attached_chain(&mut engine);

        let reverb = chain.add_effect(&mut engine, EffectKind::Reverb, None).unwrap();
        let delay = chain.add_effect(&mut engine, EffectKind::Delay, None).unwrap();

        assert_eq!(
            engine.signal_path(input),
            vec![input, effect_node(&chain, reverb), effect_node(&chain, delay), output]
        );
        assert_eq!(engine.connection_count(), 3);
    }

    #[test]
    fn test_params_merge_over_defaults() {
        let mut engine = GraphEngine::new();
        let (mut chain, _, _) = attached_chain(&mut engine);

        let mut overrides = Params::new();
        parameters::set_path(&mut overrides, "wet", ParamValue::Number(0.9));
        let id = chain
            .add_effect(&mut engine, EffectKind::Reverb, Some(&overrides))
            .unwrap();

        let effect = chain.get(id).unwrap();
        assert_eq!(effect.param("wet"), Some(&ParamValue::Number(0.9)));
        assert_eq!(effect.param("decay"), Some(&ParamValue::Number(1.5)));
    }

    #[test]
    fn test_remove_effect_closes_gap() {
        let mut engine = GraphEngine::new();
        let (mut chain, input, output) = attached_chain(&mut engine);

        let a = chain.add_effect(&mut engine, EffectKind::Chorus, None).unwrap();
        let b = chain.add_effect(&mut engine, EffectKind::Distortion, None).unwrap();
        let c = chain.add_effect(&mut engine, EffectKind::Phaser, None).unwrap();
        let b_node = effect_node(&chain, b);

        assert!(chain.remove_effect(&mut engine, b).unwrap());
        assert!(!engine.contains(b_node));
        assert_eq!(
            engine.signal_path(input),
            vec![input, effect_node(&chain, a), effect_node(&chain, c), output]
        );
        assert!(!chain.remove_effect(&mut engine, b).unwrap());
    }

    #[test]
    fn test_reorder_clamps_index() {
        let mut engine = GraphEngine::new();
        let (mut chain, input, output) = attached_chain(&mut engine);

        let a = chain.add_effect(&mut engine, EffectKind::Eq3, None).unwrap();
        let b = chain.add_effect(&mut engine, EffectKind::Compressor, None).unwrap();

        assert!(chain.reorder(&mut engine, a, 99).unwrap());
        assert_eq!(chain.index_of(a), Some(1));
        assert_eq!(
            engine.signal_path(input),
            vec![input, effect_node(&chain, b), effect_node(&chain, a), output]
        );
        // stale edges are gone
        assert_eq!(engine.connection_count(), 3);
    }

    #[test]
    fn test_update_param_keeps_topology() {
        let mut engine = GraphEngine::new();
        let (mut chain, _, _) = attached_chain(&mut engine);
        let id = chain.add_effect(&mut engine, EffectKind::Filter, None).unwrap();
        let before = chain.connections().to_vec();

        assert!(chain
            .update_param(&mut engine, id, "frequency", ParamValue::Number(440.0))
            .unwrap());

        assert_eq!(chain.connections(), before.as_slice());
        assert_eq!(
            engine.param(effect_node(&chain, id), "frequency"),
            Some(&ParamValue::Number(440.0))
        );
        assert_eq!(chain.get(id).unwrap().param("frequency"), Some(&ParamValue::Number(440.0)));
    }

    #[test]
    fn test_unattached_chain_keeps_data_only() {
        let mut engine = GraphEngine::new();
        let mut chain = EffectChain::new();
        let id = chain.add_effect(&mut engine, EffectKind::BitCrusher, None).unwrap();

        assert!(chain.get(id).unwrap().node().is_none());
        assert_eq!(engine.node_count(), 0);
        chain.dispose(&mut engine);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut engine = GraphEngine::new();
        let (mut chain, input, output) = attached_chain(&mut engine);
        chain.add_effect(&mut engine, EffectKind::Reverb, None).unwrap();

        chain.dispose(&mut engine);
        chain.dispose(&mut engine);

        assert_eq!(engine.connection_count(), 0);
        // endpoints belong to the owner, effect nodes are gone
        assert_eq!(engine.node_count(), 2);
        assert!(engine.contains(input) && engine.contains(output));
    }

    #[test]
    fn test_data_roundtrip_preserves_order_and_ids() {
        let mut engine = GraphEngine::new();
        let (mut chain, _, _) = attached_chain(&mut engine);
        chain.add_effect(&mut engine, EffectKind::Delay, None).unwrap();
        chain.add_effect(&mut engine, EffectKind::Reverb, None).unwrap();

        let data = chain.to_data();
        let json = serde_json::to_string(&data).unwrap();
        let parsed: Vec<EffectData> = serde_json::from_str(&json).unwrap();
        let restored = EffectChain::from_data(&parsed);

        assert_eq!(restored.to_data(), data);
        assert!(json.contains(r#""type":"delay""#));
    }
}
