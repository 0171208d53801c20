// Sequencer - Step sequences, clips and their scheduling on the transport

pub mod clip;
pub mod manager;
pub mod recorder;
pub mod schedule;
pub mod sequence;
pub mod transport;

pub use clip::{Clip, ClipData, ClipId, ClipManager, ClipPayload};
pub use manager::{Cell, NoteClipboard, SequenceManager};
pub use recorder::RecordMode;
pub use schedule::{EventTarget, FiredEvent, Part, PartId, RowSpace, ScheduledEvent};
pub use sequence::{Grid, Sequence, SequenceId, StepNote};
pub use transport::{OfflineTransport, Tempo, Transport, TransportState};
