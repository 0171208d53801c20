// Schedule - Compiled events and the parts handed to the transport
//
// Sequences and clips compile into `Part`s: a list of events with offsets in
// beats, anchored either at a beat position (looping sequences) or at an
// absolute time in seconds (clips). The transport fires parts; the fired
// events are dispatched back to the owning track.

use super::clip::ClipId;
use super::sequence::{Grid, SequenceId};
use crate::constants::{NUM_PADS, NUM_SLICES, PITCH_ROW_COUNT, pitch_for_row, steps_to_beats};
use crate::track::TrackId;

/// Identifier returned by `Transport::schedule`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub u64);

/// What a scheduled event plays on its track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    /// MIDI note on a synth or instrument sampler
    Pitch(u8),
    /// Slicer slice index
    Slice(usize),
    /// Drum pad index
    Pad(usize),
    /// Whole audio clip
    AudioClip(ClipId),
}

/// Row space of a track type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSpace {
    Pitched,
    Slices,
    Pads,
    /// Audio tracks have no grid
    Empty,
}

impl RowSpace {
    pub fn row_count(self) -> usize {
        match self {
            RowSpace::Pitched => PITCH_ROW_COUNT,
            RowSpace::Slices => NUM_SLICES,
            RowSpace::Pads => NUM_PADS,
            RowSpace::Empty => 0,
        }
    }

    /// Event target of a row
    pub fn target(self, row: usize) -> Option<EventTarget> {
        match self {
            RowSpace::Pitched => pitch_for_row(row).map(EventTarget::Pitch),
            RowSpace::Slices if row < NUM_SLICES => Some(EventTarget::Slice(row)),
            RowSpace::Pads if row < NUM_PADS => Some(EventTarget::Pad(row)),
            _ => None,
        }
    }
}

/// One event of a part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Offset from the part anchor, beats
    pub offset_beats: f64,
    pub row: usize,
    pub step: usize,
    pub target: EventTarget,
    pub duration_beats: f64,
    pub velocity: f32,
}

/// Where a part starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Beat position on the transport timeline
    Beats(f64),
    /// Absolute transport time
    Seconds(f64),
}

/// Source of a part within its track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartSource {
    Sequence(SequenceId),
    Clip(ClipId),
}

/// Track and source a part belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartOwner {
    pub track: TrackId,
    pub source: PartSource,
}

/// A schedulable block of events
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub owner: PartOwner,
    pub anchor: Anchor,
    pub events: Vec<ScheduledEvent>,
    /// Loop length in beats; None plays once
    pub loop_beats: Option<f64>,
    /// Extra seconds a one-shot part stays alive after its last event
    pub tail_seconds: f64,
}

impl Part {
    /// Looping part anchored at a beat position
    pub fn looping(
        owner: PartOwner,
        start_beats: f64,
        loop_beats: f64,
        events: Vec<ScheduledEvent>,
    ) -> Self {
        Self {
            owner,
            anchor: Anchor::Beats(start_beats),
            events,
            loop_beats: Some(loop_beats),
            tail_seconds: 0.0,
        }
    }

    /// One-shot part at an absolute time
    pub fn one_shot(owner: PartOwner, start_seconds: f64, events: Vec<ScheduledEvent>) -> Self {
        Self {
            owner,
            anchor: Anchor::Seconds(start_seconds),
            events,
            loop_beats: None,
            tail_seconds: 0.0,
        }
    }

    pub fn with_tail(mut self, tail_seconds: f64) -> Self {
        self.tail_seconds = tail_seconds.max(0.0);
        self
    }

    /// End of the last event, beats from the anchor
    pub fn span_beats(&self) -> f64 {
        self.events
            .iter()
            .map(|e| e.offset_beats + e.duration_beats)
            .fold(0.0, f64::max)
    }
}

/// An event fired by the transport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiredEvent {
    pub part: PartId,
    pub owner: PartOwner,
    pub at_seconds: f64,
    pub event: ScheduledEvent,
}

/// Compile a grid into events, row-major then step order
///
/// Rows without a target in `space` are skipped.
pub fn compile_grid(grid: &Grid, space: RowSpace) -> Vec<ScheduledEvent> {
    let mut events = Vec::new();
    for (row, cells) in grid.iter().enumerate() {
        let Some(target) = space.target(row) else {
            continue;
        };
        for (step, cell) in cells.iter().enumerate() {
            if let Some(note) = cell {
                events.push(ScheduledEvent {
                    offset_beats: steps_to_beats(step),
                    row,
                    step,
                    target,
                    duration_beats: steps_to_beats(note.duration),
                    velocity: note.velocity,
                });
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::sequence::{StepNote, empty_grid};

    #[test]
    fn test_row_space_targets() {
        assert_eq!(RowSpace::Pitched.target(0), Some(EventTarget::Pitch(96)));
        assert_eq!(RowSpace::Slices.target(3), Some(EventTarget::Slice(3)));
        assert_eq!(RowSpace::Pads.target(NUM_PADS), None);
        assert_eq!(RowSpace::Empty.target(0), None);
        assert_eq!(RowSpace::Empty.row_count(), 0);
    }

    #[test]
    fn test_compile_grid_offsets_in_beats() {
        let mut grid = empty_grid(PITCH_ROW_COUNT, 16);
        grid[5][3] = Some(StepNote::new(0.8, 2));
        grid[1][8] = Some(StepNote::new(0.5, 1));

        let events = compile_grid(&grid, RowSpace::Pitched);
        assert_eq!(events.len(), 2);

        // row-major: row 1 first
        assert_eq!(events[0].row, 1);
        assert_eq!(events[0].offset_beats, 2.0);

        let event = events[1];
        assert_eq!(event.offset_beats, 0.75);
        assert_eq!(event.target, EventTarget::Pitch(pitch_for_row(5).unwrap()));
        assert_eq!(event.duration_beats, 0.5);
        assert_eq!(event.velocity, 0.8);
    }

    #[test]
    fn test_span_beats() {
        let mut grid = empty_grid(NUM_PADS, 16);
        grid[0][12] = Some(StepNote::new(1.0, 4));
        let events = compile_grid(&grid, RowSpace::Pads);
        let owner = PartOwner {
            track: TrackId(1),
            source: PartSource::Sequence(SequenceId::new()),
        };
        let part = Part::one_shot(owner, 0.0, events);
        assert_eq!(part.span_beats(), 4.0);
    }
}
