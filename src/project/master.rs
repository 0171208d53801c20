// Master bus - Summing input, master effects and output volume
//
//   tracks -> input -> effects... -> output gain -> destination

use crate::audio::parameters::{ParamValue, Params};
use crate::audio::{AudioEngine, EngineError, NodeId, NodeKind};
use crate::constants::DEFAULT_TRACK_VOLUME;
use crate::synth::effect::{EffectChain, EffectData, EffectId, EffectKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MasterNodes {
    input: NodeId,
    output: NodeId,
}

/// Master bus of a project
#[derive(Debug)]
pub struct MasterBus {
    volume: f32,
    effects: EffectChain,
    nodes: Option<MasterNodes>,
}

impl MasterBus {
    pub fn new() -> Self {
        Self {
            volume: DEFAULT_TRACK_VOLUME,
            effects: EffectChain::new(),
            nodes: None,
        }
    }

    /// Create the bus nodes and wire them to the destination
    ///
    /// Returns the input node tracks connect to.
    pub fn connect(&mut self, engine: &mut dyn AudioEngine) -> Result<NodeId, EngineError> {
        if let Some(nodes) = self.nodes {
            return Ok(nodes.input);
        }

        let input = engine.create_node(NodeKind::Gain { level: 1.0 });
        let output = engine.create_node(NodeKind::Gain { level: self.volume });
        self.nodes = Some(MasterNodes { input, output });

        self.effects.attach(engine, input, output)?;
        let destination = engine.destination();
        engine.connect(output, destination)?;
        Ok(input)
    }

    /// Node tracks connect their output to
    pub fn input(&self) -> Option<NodeId> {
        self.nodes.map(|n| n.input)
    }

    pub fn output(&self) -> Option<NodeId> {
        self.nodes.map(|n| n.output)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the master volume; non-finite values are ignored
    pub fn set_volume(
        &mut self,
        engine: &mut dyn AudioEngine,
        volume: f32,
    ) -> Result<f32, EngineError> {
        if volume.is_finite() {
            self.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(nodes) = self.nodes {
            engine.set_param(nodes.output, "gain", &ParamValue::Number(self.volume as f64))?;
        }
        Ok(self.volume)
    }

    pub fn effects(&self) -> &EffectChain {
        &self.effects
    }

    pub fn add_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        kind: EffectKind,
        params: Option<&Params>,
    ) -> Result<EffectId, EngineError> {
        self.effects.add_effect(engine, kind, params)
    }

    pub fn remove_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
    ) -> Result<bool, EngineError> {
        self.effects.remove_effect(engine, id)
    }

    pub fn update_effect_param(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
        path: &str,
        value: ParamValue,
    ) -> Result<bool, EngineError> {
        self.effects.update_param(engine, id, path, value)
    }

    pub fn reorder_effect(
        &mut self,
        engine: &mut dyn AudioEngine,
        id: EffectId,
        new_index: usize,
    ) -> Result<bool, EngineError> {
        self.effects.reorder(engine, id, new_index)
    }

    /// Replace volume and effects with saved ones
    pub fn restore(
        &mut self,
        engine: &mut dyn AudioEngine,
        volume: f32,
        effects: &[EffectData],
    ) -> Result<(), EngineError> {
        self.effects.dispose(engine);
        self.effects = EffectChain::from_data(effects);
        if let Some(nodes) = self.nodes {
            self.effects.attach(engine, nodes.input, nodes.output)?;
        }
        self.set_volume(engine, volume)?;
        Ok(())
    }

    pub fn effects_data(&self) -> Vec<EffectData> {
        self.effects.to_data()
    }

    pub fn dispose(&mut self, engine: &mut dyn AudioEngine) {
        self.effects.dispose(engine);
        if let Some(nodes) = self.nodes.take() {
            let destination = engine.destination();
            engine.disconnect(nodes.output, destination);
            engine.dispose(nodes.input);
            engine.dispose(nodes.output);
        }
    }
}

impl Default for MasterBus {
    fn default() -> Self {
        Self::new()
    }
}
