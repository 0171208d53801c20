// Live recorder - Captures incoming notes into the active sequence
//
// While recording, a note-on is quantized to the nearest step of the
// transport position and written into the active sequence, wrapping at the
// sequence length.

use super::manager::SequenceManager;
use super::sequence::StepNote;
use super::transport::Transport;
use crate::constants::TICKS_PER_STEP;
use serde::{Deserialize, Serialize};

/// How captured notes combine with existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    /// Clear every row at the captured step first
    #[default]
    Replace,
    /// Write on top of existing notes
    Overdub,
}

/// Step for a transport tick position, wrapped to `length`
pub fn step_for_ticks(ticks: u64, length: usize) -> usize {
    let step = (ticks as f64 / TICKS_PER_STEP as f64).round() as usize;
    step % length.max(1)
}

/// Write a live note into the active sequence at the current position
///
/// Returns the step written, or None when there is no active sequence or
/// the row is outside the grid. Recompiles on success.
pub fn capture_note(
    manager: &mut SequenceManager,
    transport: &mut dyn Transport,
    row: usize,
    velocity: f32,
    mode: RecordMode,
) -> Option<usize> {
    let length = manager.active()?.length;
    if row >= manager.row_count() {
        return None;
    }

    let step = step_for_ticks(transport.position_ticks(), length);
    if mode == RecordMode::Replace {
        manager.clear_active_step(step);
    }
    manager.write_active(row, step, StepNote::new(velocity, 1));
    manager.recompile(transport);
    Some(step)
}
