// Buffer slot - A sample reference and its decoded buffer
//
// Slots are loaded synchronously from the sample store. A slot that could not
// be loaded stays in the `Error` state; triggers check `buffer()` and skip
// anything that is not loaded.

use super::loader::{AudioBuffer, SampleError, decode_audio};
use super::store::{SampleStore, new_key};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Store reference to a sample, as saved in projects
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRef {
    pub db_key: String,
    #[serde(default)]
    pub file_name: String,
}

impl SampleRef {
    pub fn new(db_key: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            db_key: db_key.into(),
            file_name: file_name.into(),
        }
    }
}

/// Load state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[default]
    Empty,
    Loaded,
    Error,
}

/// A sample slot (slicer sample, drum pad, instrument sample, audio clip)
#[derive(Debug, Clone, Default)]
pub struct BufferSlot {
    sample: Option<SampleRef>,
    status: SlotStatus,
    buffer: Option<Arc<AudioBuffer>>,
}

impl BufferSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pointing at a stored sample, not yet loaded
    pub fn from_ref(sample: Option<SampleRef>) -> Self {
        Self {
            sample,
            status: SlotStatus::Empty,
            buffer: None,
        }
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.status == SlotStatus::Loaded
    }

    pub fn sample_ref(&self) -> Option<&SampleRef> {
        self.sample.as_ref()
    }

    /// Decoded buffer, only while loaded
    pub fn buffer(&self) -> Option<&Arc<AudioBuffer>> {
        match self.status {
            SlotStatus::Loaded => self.buffer.as_ref(),
            _ => None,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.buffer().map_or(0.0, |b| b.duration_seconds())
    }

    /// Fetch and decode the referenced sample
    ///
    /// A slot without a reference stays `Empty`. Any failure leaves the slot
    /// in `Error` and is returned so the caller can report it once.
    pub fn load(&mut self, store: &dyn SampleStore) -> Result<(), SampleError> {
        self.buffer = None;
        let Some(sample) = &self.sample else {
            self.status = SlotStatus::Empty;
            return Ok(());
        };

        let result = store
            .get(&sample.db_key)
            .ok_or_else(|| SampleError::NotFound(sample.db_key.clone()))
            .and_then(|bytes| decode_audio(&bytes));

        match result {
            Ok(buffer) => {
                self.buffer = Some(Arc::new(buffer));
                self.status = SlotStatus::Loaded;
                Ok(())
            }
            Err(e) => {
                self.status = SlotStatus::Error;
                Err(e)
            }
        }
    }

    /// Decode `bytes`, store them under a fresh key and load the slot
    ///
    /// Undecodable data is rejected before anything is stored and the slot
    /// is left as it was.
    pub fn store_and_load(
        &mut self,
        store: &mut dyn SampleStore,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<SampleRef, SampleError> {
        let buffer = decode_audio(&bytes)?;
        let key = store.put(&new_key(), bytes)?;
        let sample = SampleRef::new(key, file_name);

        self.sample = Some(sample.clone());
        self.buffer = Some(Arc::new(buffer));
        self.status = SlotStatus::Loaded;
        Ok(sample)
    }

    /// Drop the reference and buffer
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
