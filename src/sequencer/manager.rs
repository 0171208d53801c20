// Sequence manager - Sequences of one track and their compiled loop
//
// Every mutation recompiles the active sequence: the previous part is
// cancelled and a fresh looping part is scheduled at the transport loop
// start. Edits outside the grid are ignored.

use super::schedule::{Part, PartId, PartOwner, PartSource, RowSpace, compile_grid};
use super::sequence::{Sequence, SequenceId, StepNote, clamp_length};
use super::transport::Transport;
use crate::constants::steps_to_beats;
use crate::track::TrackId;

/// A grid cell `(row, step)`
pub type Cell = (usize, usize);

/// A copied note, relative to the top-left of the selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipboardNote {
    pub row_offset: usize,
    pub step_offset: usize,
    pub note: StepNote,
}

/// Notes copied from a sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteClipboard {
    pub notes: Vec<ClipboardNote>,
}

impl NoteClipboard {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }
}

/// Sequences of a track
#[derive(Debug)]
pub struct SequenceManager {
    track: TrackId,
    space: RowSpace,
    sequences: Vec<Sequence>,
    active: Option<SequenceId>,
    playable: bool,
    part: Option<PartId>,
}

impl SequenceManager {
    pub fn new(track: TrackId, space: RowSpace) -> Self {
        Self {
            track,
            space,
            sequences: Vec::new(),
            active: None,
            playable: space != RowSpace::Empty,
            part: None,
        }
    }

    /// Rebuild from saved sequences (nothing scheduled yet)
    ///
    /// An active id that does not match any sequence falls back to the first.
    pub fn from_data(
        track: TrackId,
        space: RowSpace,
        sequences: Vec<Sequence>,
        active: Option<SequenceId>,
    ) -> Self {
        let mut sequences = sequences;
        for sequence in &mut sequences {
            for cell in sequence.data.iter_mut().flatten() {
                if let Some(note) = cell {
                    *note = note.sanitized();
                }
            }
        }

        let active = active
            .filter(|id| sequences.iter().any(|s| s.id == *id))
            .or_else(|| sequences.first().map(|s| s.id));

        Self {
            sequences,
            active,
            ..Self::new(track, space)
        }
    }

    pub fn track(&self) -> TrackId {
        self.track
    }

    pub fn set_track(&mut self, track: TrackId) {
        self.track = track;
    }

    pub fn row_space(&self) -> RowSpace {
        self.space
    }

    pub fn row_count(&self) -> usize {
        self.space.row_count()
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn get(&self, id: SequenceId) -> Option<&Sequence> {
        self.sequences.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SequenceId) -> Option<&mut Sequence> {
        self.sequences.iter_mut().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> Option<SequenceId> {
        self.active
    }

    pub fn active(&self) -> Option<&Sequence> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn note_at(&self, id: SequenceId, row: usize, step: usize) -> Option<&StepNote> {
        self.get(id)?.get(row, step)
    }

    /// Currently scheduled loop
    pub fn part(&self) -> Option<PartId> {
        self.part
    }

    pub fn is_playable(&self) -> bool {
        self.playable
    }

    /// Enable or disable scheduling; recompiles
    pub fn set_playable(&mut self, transport: &mut dyn Transport, playable: bool) {
        self.playable = playable && self.space != RowSpace::Empty;
        self.recompile(transport);
    }

    /// Create an empty sequence and make it active
    pub fn create_sequence(
        &mut self,
        transport: &mut dyn Transport,
        name: impl Into<String>,
        length: usize,
    ) -> SequenceId {
        let sequence = Sequence::new(name, self.row_count(), clamp_length(length));
        let id = sequence.id;
        self.sequences.push(sequence);
        self.active = Some(id);
        self.recompile(transport);
        id
    }

    /// Write a note; false on unknown sequence or out-of-bounds cell
    pub fn add_note(
        &mut self,
        transport: &mut dyn Transport,
        id: SequenceId,
        row: usize,
        step: usize,
        note: StepNote,
    ) -> bool {
        let Some(sequence) = self.get_mut(id) else {
            return false;
        };
        if !sequence.set(row, step, Some(note.sanitized())) {
            return false;
        }
        self.recompile(transport);
        true
    }

    pub fn remove_note(
        &mut self,
        transport: &mut dyn Transport,
        id: SequenceId,
        row: usize,
        step: usize,
    ) -> bool {
        self.remove_notes(transport, id, &[(row, step)]) > 0
    }

    /// Clear a batch of cells; returns how many notes were removed
    pub fn remove_notes(
        &mut self,
        transport: &mut dyn Transport,
        id: SequenceId,
        cells: &[Cell],
    ) -> usize {
        let Some(sequence) = self.get_mut(id) else {
            return 0;
        };

        let mut removed = 0;
        for &(row, step) in cells {
            if sequence.get(row, step).is_some() {
                sequence.set(row, step, None);
                removed += 1;
            }
        }

        if removed > 0 {
            self.recompile(transport);
        }
        removed
    }

    /// Shift the notes at `cells` by the given offsets
    ///
    /// All-or-nothing: if any moved note would leave the grid nothing
    /// changes. Empty cells in the selection are ignored.
    pub fn move_notes(
        &mut self,
        transport: &mut dyn Transport,
        id: SequenceId,
        cells: &[Cell],
        row_offset: isize,
        step_offset: isize,
    ) -> bool {
        let Some(sequence) = self.get_mut(id) else {
            return false;
        };

        let mut moves = Vec::with_capacity(cells.len());
        for &(row, step) in cells {
            let Some(note) = sequence.get(row, step).copied() else {
                continue;
            };
            let target = row
                .checked_add_signed(row_offset)
                .zip(step.checked_add_signed(step_offset));
            match target {
                Some((new_row, new_step)) if sequence.in_bounds(new_row, new_step) => {
                    moves.push(((row, step), (new_row, new_step), note));
                }
                _ => return false,
            }
        }

        if moves.is_empty() {
            return false;
        }

        // Clear all sources, then write all targets
        for ((row, step), _, _) in &moves {
            sequence.set(*row, *step, None);
        }
        for (_, (row, step), note) in &moves {
            sequence.set(*row, *step, Some(*note));
        }

        self.recompile(transport);
        true
    }

    /// Truncate or pad the sequence to `length` steps
    pub fn set_sequence_length(
        &mut self,
        transport: &mut dyn Transport,
        id: SequenceId,
        length: usize,
    ) -> bool {
        let Some(sequence) = self.get_mut(id) else {
            return false;
        };
        sequence.resize(length);
        self.recompile(transport);
        true
    }

    /// Copy the notes at `cells`, relative to the selection's top-left
    pub fn copy_notes(&self, id: SequenceId, cells: &[Cell]) -> NoteClipboard {
        let Some(sequence) = self.get(id) else {
            return NoteClipboard::default();
        };

        let selected: Vec<(usize, usize, StepNote)> = cells
            .iter()
            .filter_map(|&(row, step)| sequence.get(row, step).map(|note| (row, step, *note)))
            .collect();

        let min_row = selected.iter().map(|(row, _, _)| *row).min().unwrap_or(0);
        let min_step = selected.iter().map(|(_, step, _)| *step).min().unwrap_or(0);

        NoteClipboard {
            notes: selected
                .into_iter()
                .map(|(row, step, note)| ClipboardNote {
                    row_offset: row - min_row,
                    step_offset: step - min_step,
                    note,
                })
                .collect(),
        }
    }

    /// Paste with the clipboard's top-left at `(target_row, target_step)`
    ///
    /// Notes landing outside the grid are dropped; returns how many were
    /// written.
    pub fn paste_notes(
        &mut self,
        transport: &mut dyn Transport,
        id: SequenceId,
        clipboard: &NoteClipboard,
        target_row: usize,
        target_step: usize,
    ) -> usize {
        let Some(sequence) = self.get_mut(id) else {
            return 0;
        };

        let mut written = 0;
        for copied in &clipboard.notes {
            let row = target_row.saturating_add(copied.row_offset);
            let step = target_step.saturating_add(copied.step_offset);
            if sequence.set(row, step, Some(copied.note)) {
                written += 1;
            }
        }

        if written > 0 {
            self.recompile(transport);
        }
        written
    }

    /// Append a copy of a sequence, optionally making it active
    pub fn duplicate_sequence(
        &mut self,
        transport: &mut dyn Transport,
        id: SequenceId,
        activate: bool,
    ) -> Option<SequenceId> {
        let source = self.get(id)?;
        let copy = source.duplicate(format!("{} (copy)", source.name));
        let new_id = copy.id;
        self.sequences.push(copy);

        if activate {
            self.active = Some(new_id);
            self.recompile(transport);
        }
        Some(new_id)
    }

    pub fn set_active_sequence(&mut self, transport: &mut dyn Transport, id: SequenceId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active = Some(id);
        self.recompile(transport);
        true
    }

    pub fn rename_sequence(&mut self, id: SequenceId, name: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(sequence) => {
                sequence.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Remove a sequence; the first remaining one becomes active if needed
    pub fn delete_sequence(&mut self, transport: &mut dyn Transport, id: SequenceId) -> bool {
        let before = self.sequences.len();
        self.sequences.retain(|s| s.id != id);
        if self.sequences.len() == before {
            return false;
        }

        if self.active == Some(id) {
            self.active = self.sequences.first().map(|s| s.id);
        }
        self.recompile(transport);
        true
    }

    pub fn clear_sequence(&mut self, transport: &mut dyn Transport, id: SequenceId) -> bool {
        let Some(sequence) = self.get_mut(id) else {
            return false;
        };
        sequence.clear();
        self.recompile(transport);
        true
    }

    /// Clear every row at `step` of the active sequence
    pub(crate) fn clear_active_step(&mut self, step: usize) {
        if let Some(id) = self.active {
            if let Some(sequence) = self.get_mut(id) {
                sequence.clear_step(step);
            }
        }
    }

    /// Write into the active sequence without recompiling
    pub(crate) fn write_active(&mut self, row: usize, step: usize, note: StepNote) -> bool {
        match self.active {
            Some(id) => self
                .get_mut(id)
                .is_some_and(|sequence| sequence.set(row, step, Some(note))),
            None => false,
        }
    }

    /// Reschedule the active sequence as a loop
    ///
    /// The previous part is always cancelled first. Nothing is scheduled
    /// without an active sequence or while the track is not playable.
    pub fn recompile(&mut self, transport: &mut dyn Transport) {
        self.stop(transport);

        if !self.playable {
            return;
        }
        let Some(sequence) = self.active() else {
            return;
        };

        let events = compile_grid(&sequence.data, self.space);
        let loop_beats = steps_to_beats(sequence.length);
        let owner = PartOwner {
            track: self.track,
            source: PartSource::Sequence(sequence.id),
        };
        let event_count = events.len();

        let part = Part::looping(owner, transport.loop_start_beats(), loop_beats, events);
        self.part = Some(transport.schedule(part));

        log::debug!(
            "Recompiled sequence on track {}: {} event(s), {} beat loop",
            self.track.0,
            event_count,
            loop_beats
        );
    }

    /// Cancel the scheduled loop
    pub fn stop(&mut self, transport: &mut dyn Transport) {
        if let Some(part) = self.part.take() {
            transport.cancel(part);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NUM_PADS, pitch_for_row};
    use crate::sequencer::schedule::EventTarget;
    use crate::sequencer::transport::OfflineTransport;

    fn manager(space: RowSpace) -> (SequenceManager, OfflineTransport, SequenceId) {
        let mut transport = OfflineTransport::new(120.0);
        let mut manager = SequenceManager::new(TrackId(1), space);
        let id = manager.create_sequence(&mut transport, "Pattern 1", 16);
        (manager, transport, id)
    }

    #[test]
    fn test_create_sequence_shape_and_activation() {
        let (manager, transport, id) = manager(RowSpace::Pads);
        let seq = manager.get(id).unwrap();
        assert!(seq.is_well_formed(NUM_PADS));
        assert_eq!(manager.active_id(), Some(id));
        assert_eq!(transport.part_count(), 1);
    }

    #[test]
    fn test_add_note_bounds_are_checked() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pads);

        assert!(manager.add_note(&mut transport, id, 0, 15, StepNote::default()));
        assert!(!manager.add_note(&mut transport, id, NUM_PADS, 0, StepNote::default()));
        assert!(!manager.add_note(&mut transport, id, 0, 16, StepNote::default()));
        assert!(!manager.add_note(&mut transport, SequenceId::new(), 0, 0, StepNote::default()));
        assert_eq!(manager.get(id).unwrap().note_count(), 1);
    }

    #[test]
    fn test_recompile_schedules_single_part() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pitched);
        for step in 0..4 {
            manager.add_note(&mut transport, id, 5, step, StepNote::default());
        }
        assert_eq!(transport.part_count(), 1);

        manager.stop(&mut transport);
        assert_eq!(transport.part_count(), 0);
        assert!(manager.part().is_none());
    }

    #[test]
    fn test_synth_row_five_step_three() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pitched);
        manager.add_note(&mut transport, id, 5, 3, StepNote::new(0.8, 1));

        let part = transport.part(manager.part().unwrap()).unwrap();
        assert_eq!(part.loop_beats, Some(4.0));
        assert_eq!(part.events.len(), 1);

        let event = part.events[0];
        assert_eq!(event.offset_beats, 0.75);
        assert_eq!(event.target, EventTarget::Pitch(pitch_for_row(5).unwrap()));
        assert_eq!(event.velocity, 0.8);
    }

    #[test]
    fn test_move_is_all_or_nothing() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pads);
        manager.add_note(&mut transport, id, 0, 0, StepNote::default());
        manager.add_note(&mut transport, id, 0, 14, StepNote::default());

        // second note would land on step 16
        assert!(!manager.move_notes(&mut transport, id, &[(0, 0), (0, 14)], 0, 2));
        assert!(manager.note_at(id, 0, 0).is_some());
        assert!(manager.note_at(id, 0, 14).is_some());

        assert!(!manager.move_notes(&mut transport, id, &[(0, 0)], -1, 0));
    }

    #[test]
    fn test_move_overlapping_selection() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pads);
        manager.add_note(&mut transport, id, 0, 0, StepNote::new(0.1, 1));
        manager.add_note(&mut transport, id, 0, 1, StepNote::new(0.2, 1));

        assert!(manager.move_notes(&mut transport, id, &[(0, 0), (0, 1)], 0, 1));
        assert!(manager.note_at(id, 0, 0).is_none());
        assert_eq!(manager.note_at(id, 0, 1).unwrap().velocity, 0.1);
        assert_eq!(manager.note_at(id, 0, 2).unwrap().velocity, 0.2);
    }

    #[test]
    fn test_copy_uses_relative_offsets() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pads);
        manager.add_note(&mut transport, id, 3, 4, StepNote::default());
        manager.add_note(&mut transport, id, 5, 6, StepNote::default());

        let clipboard = manager.copy_notes(id, &[(3, 4), (5, 6), (7, 7)]);
        assert_eq!(clipboard.len(), 2);
        assert_eq!((clipboard.notes[0].row_offset, clipboard.notes[0].step_offset), (0, 0));
        assert_eq!((clipboard.notes[1].row_offset, clipboard.notes[1].step_offset), (2, 2));
    }

    #[test]
    fn test_paste_drops_out_of_bounds_notes() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pads);
        manager.add_note(&mut transport, id, 0, 0, StepNote::default());
        manager.add_note(&mut transport, id, 1, 0, StepNote::default());
        let clipboard = manager.copy_notes(id, &[(0, 0), (1, 0)]);

        // rows 15 and 16: only the first fits a 16-row grid
        assert_eq!(manager.paste_notes(&mut transport, id, &clipboard, 15, 8), 1);
        assert!(manager.note_at(id, 15, 8).is_some());
    }

    #[test]
    fn test_set_length_and_duplicate() {
        let (mut manager, mut transport, id) = manager(RowSpace::Pads);
        manager.add_note(&mut transport, id, 2, 12, StepNote::default());
        assert!(manager.set_sequence_length(&mut transport, id, 8));
        assert_eq!(manager.get(id).unwrap().note_count(), 0);

        manager.add_note(&mut transport, id, 2, 2, StepNote::default());
        let copy = manager.duplicate_sequence(&mut transport, id, true).unwrap();
        assert_ne!(copy, id);
        assert_eq!(manager.active_id(), Some(copy));
        assert_eq!(manager.get(copy).unwrap().name, "Pattern 1 (copy)");

        // copies are independent
        manager.clear_sequence(&mut transport, copy);
        assert_eq!(manager.get(id).unwrap().note_count(), 1);
    }

    #[test]
    fn test_delete_active_falls_back_to_first() {
        let (mut manager, mut transport, first) = manager(RowSpace::Pads);
        let second = manager.create_sequence(&mut transport, "Pattern 2", 16);
        assert_eq!(manager.active_id(), Some(second));

        assert!(manager.delete_sequence(&mut transport, second));
        assert_eq!(manager.active_id(), Some(first));

        assert!(manager.delete_sequence(&mut transport, first));
        assert_eq!(manager.active_id(), None);
        assert_eq!(transport.part_count(), 0);
    }

    #[test]
    fn test_audio_row_space_never_schedules() {
        let (manager, transport, id) = manager(RowSpace::Empty);
        assert_eq!(manager.get(id).unwrap().row_count(), 0);
        assert!(!manager.is_playable());
        assert_eq!(transport.part_count(), 0);
    }
}
