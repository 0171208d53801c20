// Constants - Static tables for step sizing, pad/slice counts and the pitch map

/// Steps per quarter-note beat (a step is a sixteenth note)
pub const STEPS_PER_BEAT: usize = 4;

/// Steps per 4/4 bar
pub const STEPS_PER_BAR: usize = 16;

/// Length of a freshly created sequence
pub const DEFAULT_SEQUENCE_LENGTH: usize = 64;

/// Upper bound for sequence length (64 bars)
pub const MAX_SEQUENCE_LENGTH: usize = 1024;

/// Slices in a slicer sampler track
pub const NUM_SLICES: usize = 16;

/// Pads in a drum sampler track
pub const NUM_PADS: usize = 16;

/// Transport resolution (pulses per quarter note)
pub const TICKS_PER_BEAT: u64 = 192;

/// Transport ticks in one step
pub const TICKS_PER_STEP: u64 = TICKS_PER_BEAT / STEPS_PER_BEAT as u64;

/// Highest MIDI note of the pitched row space (C7), row 0
pub const PITCH_HIGHEST: u8 = 96;

/// Lowest MIDI note of the pitched row space (C1), last row
pub const PITCH_LOWEST: u8 = 24;

/// Rows in a pitched sequence grid
pub const PITCH_ROW_COUNT: usize = (PITCH_HIGHEST - PITCH_LOWEST) as usize + 1;

/// Velocity used when a note arrives without a usable one
pub const DEFAULT_VELOCITY: f32 = 0.7;

/// Root note assumed for instrument samples (C4)
pub const DEFAULT_ROOT_NOTE: u8 = 60;

/// Volume of a new track and of the master bus
pub const DEFAULT_TRACK_VOLUME: f32 = 0.8;

/// Undo history depth
pub const DEFAULT_HISTORY_DEPTH: usize = 40;

/// Gain ramp used for mute/solo transitions
pub const MUTE_RAMP_SECONDS: f64 = 0.02;

/// Extra time a one-shot part is kept after its last note ends
pub const PART_CLEANUP_GRACE_SECONDS: f64 = 0.1;

/// Most recent voice starts kept in the engine's trigger log
pub const MAX_TRIGGER_LOG: usize = 4096;

/// Default project tempo
pub const DEFAULT_BPM: f64 = 120.0;

/// Allowed tempo range
pub const MIN_BPM: f64 = 30.0;
pub const MAX_BPM: f64 = 300.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI note for a pitched grid row (row 0 = highest)
pub fn pitch_for_row(row: usize) -> Option<u8> {
    if row < PITCH_ROW_COUNT {
        Some(PITCH_HIGHEST - row as u8)
    } else {
        None
    }
}

/// Pitched grid row for a MIDI note
pub fn row_for_pitch(pitch: u8) -> Option<usize> {
    if (PITCH_LOWEST..=PITCH_HIGHEST).contains(&pitch) {
        Some((PITCH_HIGHEST - pitch) as usize)
    } else {
        None
    }
}

/// Note name with octave, e.g. 60 -> "C4"
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

/// Names of every pitched row, highest first
pub fn pitch_names() -> Vec<String> {
    (0..PITCH_ROW_COUNT)
        .filter_map(pitch_for_row)
        .map(pitch_name)
        .collect()
}

/// Beats covered by a number of steps
pub fn steps_to_beats(steps: usize) -> f64 {
    steps as f64 / STEPS_PER_BEAT as f64
}
