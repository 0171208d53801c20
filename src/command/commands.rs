// Concrete command implementations
//
// Each command names one user action. Commands only forward to `Daw`;
// undo state is the snapshot `Daw::execute` takes before `apply`.

use crate::audio::parameters::{ParamValue, Params};
use crate::command::trait_def::{CommandError, CommandResult, DawCommand};
use crate::project::state::{Daw, EffectTarget};
use crate::sequencer::clip::ClipId;
use crate::sequencer::manager::Cell;
use crate::sequencer::sequence::{SequenceId, StepNote};
use crate::synth::effect::{EffectId, EffectKind};
use crate::track::{TrackId, TrackKind};

/// Add a track of the given kind
pub struct AddTrack {
    pub kind: TrackKind,
    pub name: Option<String>,
}

impl AddTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self { kind, name: None }
    }

    pub fn named(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
        }
    }
}

impl DawCommand for AddTrack {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        daw.add_track(self.kind, self.name.as_deref())?;
        Ok(true)
    }

    fn description(&self) -> String {
        format!("Add {} track", self.kind.default_name())
    }
}

pub struct RemoveTrack(pub TrackId);

impl DawCommand for RemoveTrack {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        if !daw.remove_track(self.0)? {
            return Err(CommandError::track_not_found(self.0));
        }
        Ok(true)
    }

    fn description(&self) -> String {
        "Remove track".into()
    }
}

pub struct RenameTrack {
    pub track: TrackId,
    pub name: String,
}

impl DawCommand for RenameTrack {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let current = daw
            .track(self.track)
            .ok_or_else(|| CommandError::track_not_found(self.track))?;
        if current.name() == self.name {
            return Ok(false);
        }
        daw.rename_track(self.track, &self.name)?;
        Ok(true)
    }

    fn description(&self) -> String {
        format!("Rename track to '{}'", self.name)
    }
}

/// Set a track fader; the volume is clamped to [0, 1]
pub struct SetTrackVolume {
    pub track: TrackId,
    pub volume: f32,
}

impl DawCommand for SetTrackVolume {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        if !self.volume.is_finite() {
            return Err(CommandError::InvalidState(format!(
                "Volume must be a finite number, got {}",
                self.volume
            )));
        }
        let before = daw
            .track(self.track)
            .ok_or_else(|| CommandError::track_not_found(self.track))?
            .volume();
        let after = daw.set_track_volume(self.track, self.volume)?;
        Ok(before != after)
    }

    fn description(&self) -> String {
        format!("Set track volume to {:.2}", self.volume.clamp(0.0, 1.0))
    }
}

pub struct ToggleMute(pub TrackId);

impl DawCommand for ToggleMute {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        daw.toggle_mute(self.0)?;
        Ok(true)
    }

    fn description(&self) -> String {
        "Toggle mute".into()
    }
}

pub struct ToggleSolo(pub TrackId);

impl DawCommand for ToggleSolo {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        daw.toggle_solo(self.0)?;
        Ok(true)
    }

    fn description(&self) -> String {
        "Toggle solo".into()
    }
}

pub struct ToggleArm(pub TrackId);

impl DawCommand for ToggleArm {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        daw.toggle_arm(self.0)?;
        Ok(true)
    }

    fn description(&self) -> String {
        "Toggle record arm".into()
    }
}

pub struct SetTempo(pub f64);

impl DawCommand for SetTempo {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        if !self.0.is_finite() {
            return Err(CommandError::InvalidState(format!("Invalid tempo {}", self.0)));
        }
        let before = daw.tempo();
        Ok(daw.set_tempo(self.0) != before)
    }

    fn description(&self) -> String {
        format!("Set tempo to {:.0} BPM", self.0)
    }
}

pub struct SetMasterVolume(pub f32);

impl DawCommand for SetMasterVolume {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        if !self.0.is_finite() {
            return Err(CommandError::InvalidState(format!("Invalid volume {}", self.0)));
        }
        let before = daw.master().volume();
        Ok(daw.set_master_volume(self.0)? != before)
    }

    fn description(&self) -> String {
        format!("Set master volume to {:.2}", self.0.clamp(0.0, 1.0))
    }
}

// ---- sequences ----

/// Create an empty sequence and make it active
pub struct CreateSequence {
    pub track: TrackId,
    pub name: String,
    pub length: usize,
}

impl DawCommand for CreateSequence {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        if daw.track(self.track).is_some_and(|t| t.kind() == TrackKind::Audio) {
            return Err(CommandError::InvalidState(
                "Audio tracks have no sequences".into(),
            ));
        }
        daw.edit_sequences(self.track, |seqs, transport| {
            seqs.create_sequence(transport, self.name.as_str(), self.length)
        })?;
        Ok(true)
    }

    fn description(&self) -> String {
        format!("Create sequence '{}'", self.name)
    }
}

/// Write one note; out-of-grid cells change nothing
pub struct AddNote {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub row: usize,
    pub step: usize,
    pub note: StepNote,
}

impl DawCommand for AddNote {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let (sequence, row, step, note) = (self.sequence, self.row, self.step, self.note);
        Ok(daw.edit_sequences(self.track, |seqs, transport| {
            seqs.add_note(transport, sequence, row, step, note)
        })?)
    }

    fn description(&self) -> String {
        "Add note".into()
    }
}

pub struct RemoveNotes {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub cells: Vec<Cell>,
}

impl DawCommand for RemoveNotes {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let sequence = self.sequence;
        let removed = daw.edit_sequences(self.track, |seqs, transport| {
            seqs.remove_notes(transport, sequence, &self.cells)
        })?;
        Ok(removed > 0)
    }

    fn description(&self) -> String {
        if self.cells.len() == 1 {
            "Remove note".into()
        } else {
            format!("Remove {} notes", self.cells.len())
        }
    }
}

/// Shift a selection; nothing moves if any note would leave the grid
pub struct MoveNotes {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub cells: Vec<Cell>,
    pub row_offset: isize,
    pub step_offset: isize,
}

impl DawCommand for MoveNotes {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        if self.row_offset == 0 && self.step_offset == 0 {
            return Ok(false);
        }
        let (sequence, rows, steps) = (self.sequence, self.row_offset, self.step_offset);
        Ok(daw.edit_sequences(self.track, |seqs, transport| {
            seqs.move_notes(transport, sequence, &self.cells, rows, steps)
        })?)
    }

    fn description(&self) -> String {
        "Move notes".into()
    }
}

/// Paste the clipboard with its top-left at `(row, step)`
pub struct PasteNotes {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub row: usize,
    pub step: usize,
}

impl DawCommand for PasteNotes {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let Some(clipboard) = daw.clipboard().cloned() else {
            return Ok(false);
        };
        let (sequence, row, step) = (self.sequence, self.row, self.step);
        let pasted = daw.edit_sequences(self.track, |seqs, transport| {
            seqs.paste_notes(transport, sequence, &clipboard, row, step)
        })?;
        Ok(pasted > 0)
    }

    fn description(&self) -> String {
        "Paste notes".into()
    }
}

pub struct SetSequenceLength {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub length: usize,
}

impl DawCommand for SetSequenceLength {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let (sequence, length) = (self.sequence, self.length);
        Ok(daw.edit_sequences(self.track, |seqs, transport| {
            let before = seqs.get(sequence).map(|s| s.length);
            seqs.set_sequence_length(transport, sequence, length)
                && seqs.get(sequence).map(|s| s.length) != before
        })?)
    }

    fn description(&self) -> String {
        format!("Set sequence length to {}", self.length)
    }
}

pub struct DuplicateSequence {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub activate: bool,
}

impl DawCommand for DuplicateSequence {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let (sequence, activate) = (self.sequence, self.activate);
        let copy = daw.edit_sequences(self.track, |seqs, transport| {
            seqs.duplicate_sequence(transport, sequence, activate)
        })?;
        Ok(copy.is_some())
    }

    fn description(&self) -> String {
        "Duplicate sequence".into()
    }
}

pub struct DeleteSequence {
    pub track: TrackId,
    pub sequence: SequenceId,
}

impl DawCommand for DeleteSequence {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let sequence = self.sequence;
        Ok(daw.edit_sequences(self.track, |seqs, transport| {
            seqs.delete_sequence(transport, sequence)
        })?)
    }

    fn description(&self) -> String {
        "Delete sequence".into()
    }
}

pub struct ClearSequence {
    pub track: TrackId,
    pub sequence: SequenceId,
}

impl DawCommand for ClearSequence {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let sequence = self.sequence;
        Ok(daw.edit_sequences(self.track, |seqs, transport| {
            seqs.clear_sequence(transport, sequence)
        })?)
    }

    fn description(&self) -> String {
        "Clear sequence".into()
    }
}

pub struct RenameSequence {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub name: String,
}

impl DawCommand for RenameSequence {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let sequence = self.sequence;
        Ok(daw.edit_sequences(self.track, |seqs, _| {
            seqs.rename_sequence(sequence, self.name.as_str())
        })?)
    }

    fn description(&self) -> String {
        format!("Rename sequence to '{}'", self.name)
    }
}

pub struct SetActiveSequence {
    pub track: TrackId,
    pub sequence: SequenceId,
}

impl DawCommand for SetActiveSequence {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let sequence = self.sequence;
        Ok(daw.edit_sequences(self.track, |seqs, transport| {
            seqs.active_id() != Some(sequence) && seqs.set_active_sequence(transport, sequence)
        })?)
    }

    fn description(&self) -> String {
        "Switch sequence".into()
    }
}

// ---- instruments ----

/// Addressable instrument parameter
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentParam {
    /// Dotted path into the synth settings, e.g. `envelope.attack`
    Synth { path: String },
    Slice { index: usize, name: String },
    Pad { index: usize, name: String },
    InstrumentSampler { name: String },
}

pub struct SetInstrumentParam {
    pub track: TrackId,
    pub param: InstrumentParam,
    pub value: ParamValue,
}

impl DawCommand for SetInstrumentParam {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let value = &self.value;
        daw.with_track(self.track, |track, ctx| match &self.param {
            InstrumentParam::Synth { path } => track.set_synth_param(ctx.engine, path, value),
            InstrumentParam::Slice { index, name } => {
                track.set_slice_param(ctx.engine, *index, name, value)
            }
            InstrumentParam::Pad { index, name } => {
                track.set_pad_param(ctx.engine, *index, name, value)
            }
            InstrumentParam::InstrumentSampler { name } => {
                track.set_instrument_sampler_param(ctx.engine, name, value)
            }
        })??;
        Ok(true)
    }

    fn description(&self) -> String {
        let name = match &self.param {
            InstrumentParam::Synth { path } => path.clone(),
            InstrumentParam::Slice { index, name } => format!("slice {} {}", index + 1, name),
            InstrumentParam::Pad { index, name } => format!("pad {} {}", index + 1, name),
            InstrumentParam::InstrumentSampler { name } => name.clone(),
        };
        format!("Set {}", name)
    }
}

pub struct SetSlicerPolyphonic {
    pub track: TrackId,
    pub polyphonic: bool,
}

impl DawCommand for SetSlicerPolyphonic {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let polyphonic = self.polyphonic;
        daw.with_track(self.track, |track, ctx| {
            track.set_slicer_polyphonic(ctx.engine, polyphonic)
        })??;
        Ok(true)
    }

    fn description(&self) -> String {
        if self.polyphonic {
            "Slicer polyphonic".into()
        } else {
            "Slicer monophonic".into()
        }
    }
}

pub struct SetMonitoring {
    pub track: TrackId,
    pub monitoring: bool,
}

impl DawCommand for SetMonitoring {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let monitoring = self.monitoring;
        daw.with_track(self.track, |track, _| track.set_monitoring(monitoring))??;
        Ok(true)
    }

    fn description(&self) -> String {
        "Toggle input monitoring".into()
    }
}

/// Where a loaded sample goes on a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleTarget {
    Slicer,
    Pad(usize),
    Instrument,
}

/// Store a sample and load it into a slot
pub struct LoadSample {
    pub track: TrackId,
    pub target: SampleTarget,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl DawCommand for LoadSample {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        let bytes = std::mem::take(&mut self.bytes);
        let (target, file_name) = (self.target, self.file_name.as_str());
        daw.with_track(self.track, |track, ctx| match target {
            SampleTarget::Slicer => {
                track.load_slicer_sample(ctx.engine, ctx.store, bytes, file_name)
            }
            SampleTarget::Pad(index) => track.load_pad_sample(ctx.store, index, bytes, file_name),
            SampleTarget::Instrument => track.load_instrument_sample(ctx.store, bytes, file_name),
        })??;
        Ok(true)
    }

    fn description(&self) -> String {
        format!("Load {}", self.file_name)
    }
}

// ---- effects ----

pub struct AddEffect {
    pub target: EffectTarget,
    pub kind: EffectKind,
    pub params: Option<Params>,
}

impl DawCommand for AddEffect {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        daw.add_effect(self.target, self.kind, self.params.as_ref())?;
        Ok(true)
    }

    fn description(&self) -> String {
        format!("Add {:?}", self.kind)
    }
}

pub struct RemoveEffect {
    pub target: EffectTarget,
    pub effect: EffectId,
}

impl DawCommand for RemoveEffect {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        Ok(daw.remove_effect(self.target, self.effect)?)
    }

    fn description(&self) -> String {
        "Remove effect".into()
    }
}

pub struct ReorderEffect {
    pub target: EffectTarget,
    pub effect: EffectId,
    pub new_index: usize,
}

impl DawCommand for ReorderEffect {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        Ok(daw.reorder_effect(self.target, self.effect, self.new_index)?)
    }

    fn description(&self) -> String {
        "Reorder effects".into()
    }
}

pub struct UpdateEffectParam {
    pub target: EffectTarget,
    pub effect: EffectId,
    pub path: String,
    pub value: ParamValue,
}

impl DawCommand for UpdateEffectParam {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        Ok(daw.update_effect_param(self.target, self.effect, &self.path, self.value.clone())?)
    }

    fn description(&self) -> String {
        format!("Set effect {}", self.path)
    }
}

// ---- clips ----

/// Place a copy of a sequence on the arrangement
pub struct AddMidiClip {
    pub track: TrackId,
    pub sequence: SequenceId,
    pub start_time: f64,
}

impl DawCommand for AddMidiClip {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        daw.add_midi_clip(self.track, self.sequence, self.start_time.max(0.0))?;
        Ok(true)
    }

    fn description(&self) -> String {
        "Add clip".into()
    }
}

pub struct MoveClip {
    pub track: TrackId,
    pub clip: ClipId,
    pub start_time: f64,
}

impl DawCommand for MoveClip {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        Ok(daw.move_clip(self.track, self.clip, self.start_time)?)
    }

    fn description(&self) -> String {
        "Move clip".into()
    }
}

pub struct DeleteClip {
    pub track: TrackId,
    pub clip: ClipId,
}

impl DawCommand for DeleteClip {
    fn apply(&mut self, daw: &mut Daw) -> CommandResult<bool> {
        Ok(daw.delete_clip(self.track, self.clip)?)
    }

    fn description(&self) -> String {
        "Delete clip".into()
    }
}
