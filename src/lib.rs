// StepDAW - Library exports for tests and benchmarks

pub mod audio;
pub mod command;
pub mod config;
pub mod constants;
pub mod messaging;
pub mod project;
pub mod sampler;
pub mod sequencer;
pub mod synth;
pub mod track;

// Re-export commonly used types for convenience
pub use audio::{AudioEngine, GraphEngine};
pub use command::{CommandError, CommandResult, DawCommand, History};
pub use config::DawConfig;
pub use messaging::{Notification, NotificationLevel, Notifier, create_notification_channel};
pub use project::{Daw, EffectTarget, ProjectData, ProjectError, RenderReport};
pub use sampler::{DirStore, MemoryStore, SampleStore};
pub use sequencer::{
    OfflineTransport, RecordMode, Sequence, SequenceId, StepNote, Transport, TransportState,
};
pub use track::{Track, TrackId, TrackKind};
