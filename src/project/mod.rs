// Project - Saved project format, validation and the live project state

pub mod layout;
pub mod master;
pub mod migration;
pub mod state;
pub mod types;

pub use layout::{WindowLayout, WindowState};
pub use master::MasterBus;
pub use migration::{CompatibilityInfo, MigrationResult, ProjectMigrator};
pub use state::{Daw, EffectTarget, RenderReport, TrackContext};
pub use types::{InstrumentData, ProjectData, ProjectVersion, TrackData};

use crate::audio::EngineError;
use crate::constants::{MAX_BPM, MAX_SEQUENCE_LENGTH, MIN_BPM};
use crate::track::{TrackError, TrackId};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project version v{found} is not supported (current v{supported})")]
    IncompatibleVersion {
        found: ProjectVersion,
        supported: ProjectVersion,
    },

    #[error("Track {0} not found")]
    TrackNotFound(TrackId),

    #[error("No recording in progress")]
    NotRecording,

    #[error("Invalid project structure: {0}")]
    InvalidStructure(String),

    #[error("Audio engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Track error: {0}")]
    Track(#[from] TrackError),
}

/// Check a project before anything is rebuilt from it
pub fn validate_project(project: &ProjectData) -> Result<(), ProjectError> {
    if !project.tempo.is_finite() || project.tempo < MIN_BPM || project.tempo > MAX_BPM {
        return Err(ProjectError::InvalidStructure(format!(
            "Tempo must be between {} and {} BPM",
            MIN_BPM, MAX_BPM
        )));
    }

    if !project.master_volume.is_finite() {
        return Err(ProjectError::InvalidStructure(
            "Master volume must be a number".to_string(),
        ));
    }

    let mut track_ids = HashSet::new();
    for track in &project.tracks {
        if !track_ids.insert(track.id) {
            return Err(ProjectError::InvalidStructure(format!(
                "Duplicate track ID: {}",
                track.id
            )));
        }

        if track.name.len() > 255 {
            return Err(ProjectError::InvalidStructure(format!(
                "Track {} name cannot exceed 255 characters",
                track.id
            )));
        }

        let rows = track.instrument.kind().row_space().row_count();
        let mut sequence_ids = HashSet::new();
        for sequence in &track.sequences {
            if !sequence_ids.insert(sequence.id) {
                return Err(ProjectError::InvalidStructure(format!(
                    "Duplicate sequence ID in track {}",
                    track.id
                )));
            }

            if sequence.length == 0 || sequence.length > MAX_SEQUENCE_LENGTH {
                return Err(ProjectError::InvalidStructure(format!(
                    "Sequence '{}' in track {} must be between 1 and {} steps",
                    sequence.name, track.id, MAX_SEQUENCE_LENGTH
                )));
            }

            if !sequence.is_well_formed(rows) {
                return Err(ProjectError::InvalidStructure(format!(
                    "Sequence '{}' in track {} must have {} rows of {} steps",
                    sequence.name, track.id, rows, sequence.length
                )));
            }
        }

        if let Some(active) = track.active_sequence_id
            && !sequence_ids.contains(&active)
        {
            return Err(ProjectError::InvalidStructure(format!(
                "Track {} references a missing active sequence",
                track.id
            )));
        }
    }

    for (label, id) in [
        ("Soloed", project.soloed_track_id),
        ("Armed", project.armed_track_id),
    ] {
        if let Some(id) = id
            && !track_ids.contains(&id)
        {
            return Err(ProjectError::InvalidStructure(format!(
                "{} track {} does not exist",
                label, id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::types::AudioInputData;
    use crate::sequencer::sequence::Sequence;
    use crate::track::{Track, TrackKind};

    fn project_with(tracks: Vec<TrackData>) -> ProjectData {
        ProjectData {
            tracks,
            ..ProjectData::default()
        }
    }

    #[test]
    fn test_default_project_is_valid() {
        assert!(validate_project(&ProjectData::default()).is_ok());
    }

    #[test]
    fn test_invalid_tempo() {
        let mut project = ProjectData::default();
        project.tempo = 10.0;
        let result = validate_project(&project);
        assert!(result.unwrap_err().to_string().contains("Tempo must be between"));
    }

    #[test]
    fn test_duplicate_track_ids() {
        let track = Track::new(TrackId(1), "A", TrackKind::Synth).to_data();
        let result = validate_project(&project_with(vec![track.clone(), track]));
        assert!(result.unwrap_err().to_string().contains("Duplicate track ID"));
    }

    #[test]
    fn test_grid_shape_must_match_track_type() {
        let mut track = Track::new(TrackId(1), "Drums", TrackKind::DrumSampler).to_data();
        // a pitched grid on a drum track
        track.sequences.push(Sequence::new("Wrong", 73, 16));
        let result = validate_project(&project_with(vec![track]));
        assert!(result.unwrap_err().to_string().contains("must have 16 rows"));
    }

    #[test]
    fn test_missing_solo_target() {
        let mut project = project_with(vec![TrackData {
            instrument: InstrumentData::Audio(AudioInputData::default()),
            ..Track::new(TrackId(2), "Vox", TrackKind::Audio).to_data()
        }]);
        project.soloed_track_id = Some(TrackId(9));
        assert!(validate_project(&project).is_err());
    }
}
