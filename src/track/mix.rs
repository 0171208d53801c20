// Mix state - Solo, record arm and recording flags shared by all tracks

use super::{Track, TrackError, TrackId};
use crate::audio::AudioEngine;
use crate::sequencer::recorder::RecordMode;

/// An active recording take
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recording {
    pub track: TrackId,
    /// Transport position when recording started
    pub start_seconds: f64,
}

/// Global mixer flags
///
/// At most one track is soloed and at most one is armed. While a track is
/// soloed every other track is silent, whatever its own mute flag says.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixState {
    soloed: Option<TrackId>,
    armed: Option<TrackId>,
    recording: Option<Recording>,
    pub record_mode: RecordMode,
}

impl MixState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn soloed(&self) -> Option<TrackId> {
        self.soloed
    }

    pub fn armed(&self) -> Option<TrackId> {
        self.armed
    }

    pub fn recording(&self) -> Option<Recording> {
        self.recording
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Effective silence of a track
    pub fn is_silenced(&self, track: TrackId, muted: bool) -> bool {
        muted || self.soloed.is_some_and(|soloed| soloed != track)
    }

    /// Solo `track`, or clear the solo if it already is soloed
    pub fn toggle_solo(&mut self, track: TrackId) -> Option<TrackId> {
        self.soloed = if self.soloed == Some(track) {
            None
        } else {
            Some(track)
        };
        self.soloed
    }

    /// Arm `track`, or disarm it if it already is armed
    pub fn toggle_arm(&mut self, track: TrackId) -> Option<TrackId> {
        self.armed = if self.armed == Some(track) {
            None
        } else {
            Some(track)
        };
        self.armed
    }

    /// Restore solo and arm, e.g. from a snapshot
    pub fn restore(&mut self, soloed: Option<TrackId>, armed: Option<TrackId>) {
        self.soloed = soloed;
        self.armed = armed;
    }

    /// Begin recording on the armed track; None without an armed track
    pub fn start_recording(&mut self, position_seconds: f64) -> Option<Recording> {
        let track = self.armed?;
        let recording = Recording {
            track,
            start_seconds: position_seconds.max(0.0),
        };
        self.recording = Some(recording);
        Some(recording)
    }

    pub fn stop_recording(&mut self) -> Option<Recording> {
        self.recording.take()
    }

    /// Drop every reference to a removed track
    pub fn forget(&mut self, track: TrackId) {
        if self.soloed == Some(track) {
            self.soloed = None;
        }
        if self.armed == Some(track) {
            self.armed = None;
        }
        if self.recording.is_some_and(|r| r.track == track) {
            self.recording = None;
        }
    }

    /// Ramp every track's output to its effective gain
    pub fn apply(
        &self,
        tracks: &[Track],
        engine: &mut dyn AudioEngine,
        ramp_seconds: f64,
    ) -> Result<(), TrackError> {
        for track in tracks {
            let silenced = self.is_silenced(track.id(), track.is_muted());
            track.apply_gain(engine, silenced, ramp_seconds)?;
        }
        Ok(())
    }
}
