// Sampler - Sample storage, decoding and slice playback settings

pub mod loader;
pub mod slices;
pub mod slot;
pub mod store;

pub use loader::{AudioBuffer, SampleError, decode_audio, encode_wav};
pub use slices::{SliceSettings, auto_slice};
pub use slot::{BufferSlot, SampleRef, SlotStatus};
pub use store::{DirStore, MemoryStore, SampleStore};
