// Clip - Timeline clips and their scheduling
//
// Clips sit at an absolute start time on a track's timeline. An audio clip
// plays a stored sample; a MIDI clip carries its own copy of a sequence grid
// and plays it once from its start time. Clips may overlap.

use super::schedule::{
    EventTarget, Part, PartId, PartOwner, PartSource, RowSpace, ScheduledEvent, compile_grid,
};
use super::sequence::{Grid, Sequence};
use super::transport::Transport;
use crate::sampler::loader::SampleError;
use crate::sampler::slot::{BufferSlot, SampleRef};
use crate::sampler::store::SampleStore;
use crate::track::TrackId;
use serde::{Deserialize, Serialize};

/// Unique clip identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub uuid::Uuid);

impl ClipId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Clip content
#[derive(Debug, Clone)]
pub enum ClipPayload {
    Audio { slot: BufferSlot, offset: f64 },
    Midi { length: usize, data: Grid },
}

/// A clip on a track timeline
#[derive(Debug, Clone)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    /// Seconds, never negative
    pub start_time: f64,
    /// Seconds
    pub duration: f64,
    pub payload: ClipPayload,
}

impl Clip {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.payload, ClipPayload::Audio { .. })
    }

    pub fn to_data(&self) -> ClipData {
        let content = match &self.payload {
            ClipPayload::Audio { slot, offset } => ClipContentData::Audio {
                sample: slot.sample_ref().cloned(),
                offset: *offset,
            },
            ClipPayload::Midi { length, data } => ClipContentData::Midi {
                length: *length,
                data: data.clone(),
            },
        };

        ClipData {
            id: self.id,
            name: self.name.clone(),
            start_time: self.start_time,
            duration: self.duration,
            content,
        }
    }

    /// Rebuild from data; audio slots are left unloaded
    pub fn from_data(data: &ClipData) -> Self {
        let payload = match &data.content {
            ClipContentData::Audio { sample, offset } => ClipPayload::Audio {
                slot: BufferSlot::from_ref(sample.clone()),
                offset: offset.max(0.0),
            },
            ClipContentData::Midi { length, data } => ClipPayload::Midi {
                length: *length,
                data: data.clone(),
            },
        };

        Self {
            id: data.id,
            name: data.name.clone(),
            start_time: data.start_time.max(0.0),
            duration: data.duration.max(0.0),
            payload,
        }
    }
}

/// Serialized clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipData {
    pub id: ClipId,
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    #[serde(flatten)]
    pub content: ClipContentData,
}

/// Serialized clip content, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClipContentData {
    Audio {
        #[serde(default)]
        sample: Option<SampleRef>,
        #[serde(default)]
        offset: f64,
    },
    Midi {
        length: usize,
        data: Grid,
    },
}

/// Clips of one track
#[derive(Debug, Default)]
pub struct ClipManager {
    clips: Vec<Clip>,
    parts: Vec<PartId>,
}

impl ClipManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: &[ClipData]) -> Self {
        Self {
            clips: data.iter().map(Clip::from_data).collect(),
            parts: Vec::new(),
        }
    }

    pub fn to_data(&self) -> Vec<ClipData> {
        self.clips.iter().map(Clip::to_data).collect()
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Load every audio clip buffer; failures are returned, not fatal
    pub fn load_buffers(&mut self, store: &dyn SampleStore) -> Vec<(ClipId, SampleError)> {
        let mut failures = Vec::new();
        for clip in &mut self.clips {
            if let ClipPayload::Audio { slot, .. } = &mut clip.payload {
                if let Err(e) = slot.load(store) {
                    failures.push((clip.id, e));
                }
            }
        }
        failures
    }

    /// Place a copy of `source` at `start_time`
    ///
    /// The clip's grid is independent of the sequence afterwards.
    pub fn add_midi_clip(
        &mut self,
        source: &Sequence,
        start_time: f64,
        seconds_per_step: f64,
    ) -> ClipId {
        let id = ClipId::new();
        self.clips.push(Clip {
            id,
            name: source.name.clone(),
            start_time: non_negative(start_time),
            duration: source.length as f64 * seconds_per_step.max(0.0),
            payload: ClipPayload::Midi {
                length: source.length,
                data: source.data.clone(),
            },
        });
        id
    }

    /// Place a loaded sample slot at `start_time`
    pub fn add_audio_clip(
        &mut self,
        slot: BufferSlot,
        start_time: f64,
        name: impl Into<String>,
    ) -> ClipId {
        let id = ClipId::new();
        self.clips.push(Clip {
            id,
            name: name.into(),
            start_time: non_negative(start_time),
            duration: slot.duration_seconds(),
            payload: ClipPayload::Audio { slot, offset: 0.0 },
        });
        id
    }

    /// Recompute MIDI clip durations from their step length
    ///
    /// Audio clips keep their buffer duration. Returns the clips changed.
    pub fn retime(&mut self, seconds_per_step: f64) -> usize {
        let seconds_per_step = seconds_per_step.max(0.0);
        let mut changed = 0;
        for clip in &mut self.clips {
            if let ClipPayload::Midi { length, .. } = &clip.payload {
                let duration = *length as f64 * seconds_per_step;
                if duration != clip.duration {
                    clip.duration = duration;
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn delete_clip(&mut self, id: ClipId) -> bool {
        let before = self.clips.len();
        self.clips.retain(|c| c.id != id);
        self.clips.len() < before
    }

    /// Move a clip; negative times clamp to 0
    pub fn move_clip(&mut self, id: ClipId, start_time: f64) -> bool {
        match self.clips.iter_mut().find(|c| c.id == id) {
            Some(clip) => {
                clip.start_time = non_negative(start_time);
                true
            }
            None => false,
        }
    }

    /// Schedule every clip as a one-shot part
    ///
    /// Previously scheduled clip parts are cancelled first. Nothing is
    /// scheduled when the track is not playable.
    pub fn schedule(
        &mut self,
        transport: &mut dyn Transport,
        track: TrackId,
        space: RowSpace,
        playable: bool,
        release_seconds: f64,
    ) -> usize {
        self.stop(transport);
        if !playable {
            return 0;
        }

        let spb = transport.seconds_per_beat();
        for clip in &self.clips {
            let events = match &clip.payload {
                ClipPayload::Midi { data, .. } => compile_grid(data, space),
                ClipPayload::Audio { .. } => vec![ScheduledEvent {
                    offset_beats: 0.0,
                    row: 0,
                    step: 0,
                    target: EventTarget::AudioClip(clip.id),
                    duration_beats: clip.duration / spb,
                    velocity: 1.0,
                }],
            };
            if events.is_empty() {
                continue;
            }

            let owner = PartOwner {
                track,
                source: PartSource::Clip(clip.id),
            };
            let part = Part::one_shot(owner, clip.start_time, events).with_tail(release_seconds);
            self.parts.push(transport.schedule(part));
        }

        log::debug!("Scheduled {} clip part(s) on track {}", self.parts.len(), track.0);
        self.parts.len()
    }

    /// Cancel all scheduled clip parts
    pub fn stop(&mut self, transport: &mut dyn Transport) {
        for part in self.parts.drain(..) {
            transport.cancel(part);
        }
    }

    pub fn scheduled_parts(&self) -> &[PartId] {
        &self.parts
    }
}

fn non_negative(seconds: f64) -> f64 {
    if seconds.is_finite() { seconds.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::loader::{AudioBuffer, encode_wav};
    use crate::sampler::store::MemoryStore;
    use crate::sequencer::sequence::StepNote;
    use crate::sequencer::transport::OfflineTransport;

    fn loaded_slot(seconds: f64) -> (BufferSlot, MemoryStore) {
        let mut store = MemoryStore::new();
        let frames = (seconds * 1000.0) as usize;
        let bytes = encode_wav(&AudioBuffer::new(1000, 1, vec![0.1; frames])).unwrap();
        let mut slot = BufferSlot::new();
        slot.store_and_load(&mut store, bytes, "take.wav").unwrap();
        (slot, store)
    }

    #[test]
    fn test_midi_clip_is_a_deep_copy() {
        let mut seq = Sequence::new("Verse", 16, 16);
        seq.set(0, 0, Some(StepNote::default()));

        let mut clips = ClipManager::new();
        let id = clips.add_midi_clip(&seq, 2.0, 0.125);
        seq.set(0, 1, Some(StepNote::default()));

        let clip = clips.get(id).unwrap();
        assert_eq!(clip.duration, 2.0);
        match &clip.payload {
            ClipPayload::Midi { data, .. } => {
                assert!(data[0][0].is_some());
                assert!(data[0][1].is_none());
            }
            ClipPayload::Audio { .. } => panic!("expected midi clip"),
        }
    }

    #[test]
    fn test_audio_clip_takes_buffer_duration() {
        let (slot, _store) = loaded_slot(1.5);
        let mut clips = ClipManager::new();
        let id = clips.add_audio_clip(slot, -3.0, "Take 1");

        let clip = clips.get(id).unwrap();
        assert_eq!(clip.start_time, 0.0);
        assert!((clip.duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_retime_follows_tempo_for_midi_only() {
        let (slot, _store) = loaded_slot(1.5);
        let mut clips = ClipManager::new();
        let midi = clips.add_midi_clip(&Sequence::new("A", 4, 16), 0.0, 0.125);
        let audio = clips.add_audio_clip(slot, 0.0, "Take");

        // 120 -> 60 bpm doubles the step length
        assert_eq!(clips.retime(0.25), 1);
        assert_eq!(clips.get(midi).unwrap().duration, 4.0);
        assert!((clips.get(audio).unwrap().duration - 1.5).abs() < 1e-9);
        assert_eq!(clips.retime(0.25), 0);
    }

    #[test]
    fn test_move_and_delete() {
        let seq = Sequence::new("A", 4, 4);
        let mut clips = ClipManager::new();
        let id = clips.add_midi_clip(&seq, 0.0, 0.125);

        assert!(clips.move_clip(id, 4.0));
        assert_eq!(clips.get(id).unwrap().start_time, 4.0);
        assert!(clips.delete_clip(id));
        assert!(!clips.delete_clip(id));
        assert!(!clips.move_clip(id, 1.0));
    }

    #[test]
    fn test_schedule_replaces_previous_parts() {
        let mut seq = Sequence::new("A", 16, 4);
        seq.set(2, 1, Some(StepNote::default()));
        let mut clips = ClipManager::new();
        clips.add_midi_clip(&seq, 1.0, 0.125);
        clips.add_midi_clip(&seq, 3.0, 0.125);

        let mut transport = OfflineTransport::new(120.0);
        assert_eq!(clips.schedule(&mut transport, TrackId(1), RowSpace::Pads, true, 0.1), 2);
        assert_eq!(clips.schedule(&mut transport, TrackId(1), RowSpace::Pads, true, 0.1), 2);
        assert_eq!(transport.part_count(), 2);

        transport.play();
        let fired = transport.advance(4.0);
        let times: Vec<f64> = fired.iter().map(|f| f.at_seconds).collect();
        // step 1 = 0.25 beats = 0.125 s after each clip start
        assert_eq!(times, vec![1.125, 3.125]);

        clips.stop(&mut transport);
        assert_eq!(transport.part_count(), 0);
    }

    #[test]
    fn test_unplayable_track_schedules_nothing() {
        let seq = Sequence::new("A", 16, 4);
        let mut clips = ClipManager::new();
        clips.add_midi_clip(&seq, 0.0, 0.125);
        let mut transport = OfflineTransport::new(120.0);
        assert_eq!(clips.schedule(&mut transport, TrackId(1), RowSpace::Pads, false, 0.0), 0);
        assert_eq!(transport.part_count(), 0);
    }

    #[test]
    fn test_clip_data_roundtrip() {
        let (slot, store) = loaded_slot(0.5);
        let mut clips = ClipManager::new();
        clips.add_audio_clip(slot, 1.0, "Take");
        clips.add_midi_clip(&Sequence::new("M", 2, 2), 0.0, 0.1);

        let json = serde_json::to_string(&clips.to_data()).unwrap();
        assert!(json.contains(r#""type":"audio""#));
        assert!(json.contains(r#""startTime":1.0"#));

        let data: Vec<ClipData> = serde_json::from_str(&json).unwrap();
        let mut restored = ClipManager::from_data(&data);
        assert!(restored.load_buffers(&store).is_empty());
        assert_eq!(restored.to_data(), clips.to_data());
    }
}
