// Commands - Undoable user actions and the snapshot history
//
// Every state-changing action is a DawCommand run through `Daw::execute`,
// which records a full project snapshot first. Undo and redo swap the
// current project with a snapshot and rebuild it.
//
// - DawCommand trait: apply() and description()
// - History: bounded undo/redo stacks of snapshots
// - Concrete commands: AddTrack, AddNote, SetTempo, ...

pub mod commands;
pub mod history;
pub mod trait_def;

pub use history::{History, Snapshot};
pub use trait_def::{CommandError, CommandResult, DawCommand};
