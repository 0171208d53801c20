// Project format migration system
// Handles version checks and upgrades of older project files

use crate::project::ProjectError;
use crate::project::types::{ProjectData, ProjectVersion};

/// Migration result
#[derive(Debug, Clone)]
pub struct MigrationResult {
    /// Migrated project
    pub project: ProjectData,
    /// Whether migration was performed
    pub migrated: bool,
    /// Migration messages/warnings
    pub messages: Vec<String>,
}

/// Compatibility information for project versions
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityInfo {
    /// Whether the project can be loaded
    pub can_load: bool,
    /// Whether migration is needed
    pub needs_migration: bool,
    /// Optional warning message
    pub warning: Option<String>,
}

/// Project format migrator
pub struct ProjectMigrator;

impl ProjectMigrator {
    /// Check if a project version can be loaded
    pub fn check_compatibility(version: ProjectVersion) -> CompatibilityInfo {
        let current = ProjectVersion::current();

        if version.major > current.major || version.major < 1 {
            return CompatibilityInfo {
                can_load: false,
                needs_migration: false,
                warning: Some(format!(
                    "Project version v{} is not supported (current v{})",
                    version, current
                )),
            };
        }

        if version == current {
            return CompatibilityInfo {
                can_load: true,
                needs_migration: false,
                warning: None,
            };
        }

        CompatibilityInfo {
            can_load: true,
            needs_migration: true,
            warning: Some(format!(
                "Project version v{} will be migrated to v{}",
                version, current
            )),
        }
    }

    /// Bring a project to the current version
    pub fn migrate_to_current(mut project: ProjectData) -> Result<MigrationResult, ProjectError> {
        let current = ProjectVersion::current();
        let version = project.version;

        let info = Self::check_compatibility(version);
        if !info.can_load {
            return Err(ProjectError::IncompatibleVersion {
                found: version,
                supported: current,
            });
        }
        if !info.needs_migration {
            return Ok(MigrationResult {
                project,
                migrated: false,
                messages: Vec::new(),
            });
        }

        let mut messages = Vec::new();
        if version.major == 1 && version.minor < 1 {
            messages.push("Migrating from v1.0 to v1.1...".to_string());
            project = Self::migrate_1_0_to_1_1(project);
        }

        project.version = current;
        messages.push(format!("Successfully migrated to v{}", current));
        for message in &messages {
            log::info!("{}", message);
        }

        Ok(MigrationResult {
            project,
            migrated: true,
            messages,
        })
    }

    /// v1.0 files did not store the active sequence; the first one was used
    fn migrate_1_0_to_1_1(mut project: ProjectData) -> ProjectData {
        for track in &mut project.tracks {
            if track.active_sequence_id.is_none() {
                track.active_sequence_id = track.sequences.first().map(|s| s.id);
            }
        }
        project
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::types::{AudioInputData, InstrumentData, TrackData};
    use crate::sequencer::sequence::Sequence;
    use crate::track::TrackId;

    #[test]
    fn test_version_compatibility_check() {
        let current = ProjectVersion::current();
        assert!(!ProjectMigrator::check_compatibility(current).needs_migration);

        let newer = ProjectVersion::new(current.major + 1, 0, 0);
        assert!(!ProjectMigrator::check_compatibility(newer).can_load);

        let older = ProjectVersion::new(1, 0, 0);
        let info = ProjectMigrator::check_compatibility(older);
        assert!(info.can_load && info.needs_migration);

        assert!(!ProjectMigrator::check_compatibility(ProjectVersion::new(0, 9, 0)).can_load);
    }

    #[test]
    fn test_migration_1_0_to_1_1() {
        let sequence = Sequence::new("Intro", 0, 16);
        let project = ProjectData {
            version: ProjectVersion::new(1, 0, 0),
            tracks: vec![TrackData {
                id: TrackId(1),
                name: "Take".into(),
                muted: false,
                volume: 0.8,
                effects: Vec::new(),
                sequences: vec![sequence.clone()],
                active_sequence_id: None,
                clips: Vec::new(),
                instrument: InstrumentData::Audio(AudioInputData::default()),
            }],
            ..ProjectData::default()
        };

        let result = ProjectMigrator::migrate_to_current(project).unwrap();
        assert!(result.migrated);
        assert_eq!(result.project.version, ProjectVersion::current());
        assert_eq!(result.project.tracks[0].active_sequence_id, Some(sequence.id));
    }

    #[test]
    fn test_newer_major_is_rejected() {
        let project = ProjectData {
            version: ProjectVersion::new(9, 0, 0),
            ..ProjectData::default()
        };
        assert!(matches!(
            ProjectMigrator::migrate_to_current(project),
            Err(ProjectError::IncompatibleVersion { .. })
        ));
    }
}
