// Sequence - Step grid of notes addressed by (row, step)
//
// A sequence is a dense grid `data[row][step]`. The row space is fixed by the
// owning track (pitches, slices or pads); a step is a sixteenth note.

use crate::constants::{DEFAULT_VELOCITY, MAX_SEQUENCE_LENGTH};
use serde::{Deserialize, Serialize};

/// Unique sequence identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(pub uuid::Uuid);

impl SequenceId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A note occupying one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepNote {
    /// Velocity (0.0 to 1.0)
    pub velocity: f32,
    /// Length in steps (at least 1)
    pub duration: usize,
}

impl StepNote {
    /// Create a note with validated velocity and duration
    ///
    /// Non-finite velocity falls back to the default velocity.
    pub fn new(velocity: f32, duration: usize) -> Self {
        let velocity = if velocity.is_finite() {
            velocity.clamp(0.0, 1.0)
        } else {
            DEFAULT_VELOCITY
        };
        Self {
            velocity,
            duration: duration.max(1),
        }
    }

    /// Re-apply validation (after deserialization)
    pub fn sanitized(self) -> Self {
        Self::new(self.velocity, self.duration)
    }
}

impl Default for StepNote {
    fn default() -> Self {
        Self::new(DEFAULT_VELOCITY, 1)
    }
}

/// Grid cells, `[row][step]`
pub type Grid = Vec<Vec<Option<StepNote>>>;

/// All-empty grid of the given shape
pub fn empty_grid(rows: usize, length: usize) -> Grid {
    vec![vec![None; length]; rows]
}

/// Clamp a requested length to the allowed range
pub fn clamp_length(length: usize) -> usize {
    length.clamp(1, MAX_SEQUENCE_LENGTH)
}

/// A named step sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: SequenceId,
    pub name: String,
    /// Length in steps
    pub length: usize,
    pub data: Grid,
}

impl Sequence {
    /// Create an empty sequence of `rows` rows
    pub fn new(name: impl Into<String>, rows: usize, length: usize) -> Self {
        let length = clamp_length(length);
        Self {
            id: SequenceId::new(),
            name: name.into(),
            length,
            data: empty_grid(rows, length),
        }
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn in_bounds(&self, row: usize, step: usize) -> bool {
        row < self.data.len() && step < self.length
    }

    pub fn get(&self, row: usize, step: usize) -> Option<&StepNote> {
        self.data.get(row)?.get(step)?.as_ref()
    }

    /// Write a cell; false when out of bounds
    pub fn set(&mut self, row: usize, step: usize, note: Option<StepNote>) -> bool {
        match self.data.get_mut(row).and_then(|cells| cells.get_mut(step)) {
            Some(cell) => {
                *cell = note;
                true
            }
            None => false,
        }
    }

    /// Truncate or pad every row to `new_length` (clamped)
    pub fn resize(&mut self, new_length: usize) {
        let new_length = clamp_length(new_length);
        for row in &mut self.data {
            row.resize(new_length, None);
        }
        self.length = new_length;
    }

    /// Clear every cell of one step
    pub fn clear_step(&mut self, step: usize) {
        for row in &mut self.data {
            if let Some(cell) = row.get_mut(step) {
                *cell = None;
            }
        }
    }

    pub fn clear(&mut self) {
        for row in &mut self.data {
            row.fill(None);
        }
    }

    /// Notes in row-major then step order
    pub fn notes(&self) -> impl Iterator<Item = (usize, usize, &StepNote)> + '_ {
        self.data.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(step, cell)| cell.as_ref().map(|note| (row, step, note)))
        })
    }

    pub fn note_count(&self) -> usize {
        self.notes().count()
    }

    /// Whether the grid has exactly `rows` rows of `length` cells
    pub fn is_well_formed(&self, rows: usize) -> bool {
        self.length >= 1
            && self.length <= MAX_SEQUENCE_LENGTH
            && self.data.len() == rows
            && self.data.iter().all(|row| row.len() == self.length)
    }

    /// Copy under a new id and name
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        Self {
            id: SequenceId::new(),
            name: name.into(),
            length: self.length,
            data: self.data.clone(),
        }
    }
}
