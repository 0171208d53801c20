// Transport - Playback clock and part scheduler
//
// The `Transport` trait is what sequences and clips schedule against: tempo,
// position, loop start and a part scheduler. `OfflineTransport` is a
// deterministic implementation driven by `advance`, which returns the events
// that fall inside the advanced window.

use super::schedule::{Anchor, FiredEvent, Part, PartId};
use crate::constants::{DEFAULT_BPM, MAX_BPM, MIN_BPM, PART_CLEANUP_GRACE_SECONDS, TICKS_PER_BEAT};
use std::collections::BTreeMap;

/// Transport state (play/stop/record)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Recording,
    Paused,
}

impl TransportState {
    /// Check if transport is in a playing state (Playing or Recording)
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Recording)
    }

    /// Check if transport is recording
    pub fn is_recording(&self) -> bool {
        matches!(self, TransportState::Recording)
    }

    /// Check if transport is stopped or paused
    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped | TransportState::Paused)
    }
}

/// Tempo in beats per minute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo, clamped to the supported range
    ///
    /// Non-finite input falls back to the default tempo.
    pub fn new(bpm: f64) -> Self {
        Self { bpm: clamp_bpm(bpm) }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set BPM value (clamped)
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = clamp_bpm(bpm);
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: DEFAULT_BPM }
    }
}

fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        DEFAULT_BPM
    }
}

/// Clock and scheduler the sequencer runs against
pub trait Transport {
    fn bpm(&self) -> f64;

    fn set_bpm(&mut self, bpm: f64);

    /// Playhead, seconds
    fn position_seconds(&self) -> f64;

    /// Beat position loops are anchored at
    fn loop_start_beats(&self) -> f64;

    /// Register a part; it fires until cancelled (or until it ends, for
    /// one-shot parts)
    fn schedule(&mut self, part: Part) -> PartId;

    /// Remove a part; false if it was not scheduled
    fn cancel(&mut self, part: PartId) -> bool;

    fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm()
    }

    /// Playhead in transport ticks
    fn position_ticks(&self) -> u64 {
        let beats = self.position_seconds() / self.seconds_per_beat();
        (beats.max(0.0) * TICKS_PER_BEAT as f64).round() as u64
    }
}

/// Deterministic transport advanced by hand
#[derive(Debug, Default)]
pub struct OfflineTransport {
    tempo: Tempo,
    state: TransportState,
    position: f64,
    loop_start_beats: f64,
    parts: BTreeMap<PartId, Part>,
    next_part_id: u64,
}

impl OfflineTransport {
    pub fn new(bpm: f64) -> Self {
        Self {
            tempo: Tempo::new(bpm),
            ..Self::default()
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn play(&mut self) {
        if self.state != TransportState::Recording {
            self.state = TransportState::Playing;
        }
    }

    pub fn record(&mut self) {
        self.state = TransportState::Recording;
    }

    /// Leave recording but keep playing
    pub fn stop_recording(&mut self) {
        if self.state == TransportState::Recording {
            self.state = TransportState::Playing;
        }
    }

    pub fn pause(&mut self) {
        self.state = TransportState::Paused;
    }

    /// Stop and rewind to the start
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.position = 0.0;
    }

    pub fn set_position(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.position = seconds.max(0.0);
        }
    }

    pub fn set_loop_start_beats(&mut self, beats: f64) {
        if beats.is_finite() {
            self.loop_start_beats = beats.max(0.0);
        }
    }

    /// Scheduled parts
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(&id)
    }

    /// Move the playhead forward by `seconds` and collect the fired events
    ///
    /// Events in `[position, position + seconds)` fire in time order. One-shot
    /// parts are dropped once their last event has ended plus the cleanup
    /// grace period. Does nothing while stopped or paused.
    pub fn advance(&mut self, seconds: f64) -> Vec<FiredEvent> {
        if !self.state.is_playing() || !seconds.is_finite() || seconds <= 0.0 {
            return Vec::new();
        }

        let from = self.position;
        let to = from + seconds;
        let spb = self.tempo.beat_duration_seconds();

        let mut fired = Vec::new();
        for (&id, part) in &self.parts {
            let start = anchor_seconds(part.anchor, spb);
            match part.loop_beats {
                Some(loop_beats) if loop_beats > 0.0 => {
                    let period = loop_beats * spb;
                    for event in &part.events {
                        let first = start + event.offset_beats * spb;
                        let mut k = first_occurrence(first, period, from);
                        loop {
                            let at = first + k as f64 * period;
                            if at >= to {
                                break;
                            }
                            fired.push(FiredEvent {
                                part: id,
                                owner: part.owner,
                                at_seconds: at,
                                event: *event,
                            });
                            k += 1;
                        }
                    }
                }
                Some(_) => {}
                None => {
                    for event in &part.events {
                        let at = start + event.offset_beats * spb;
                        if at >= from && at < to {
                            fired.push(FiredEvent {
                                part: id,
                                owner: part.owner,
                                at_seconds: at,
                                event: *event,
                            });
                        }
                    }
                }
            }
        }

        fired.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));

        self.parts.retain(|_, part| {
            if part.loop_beats.is_some() {
                return true;
            }
            let end = anchor_seconds(part.anchor, spb)
                + part.span_beats() * spb
                + part.tail_seconds
                + PART_CLEANUP_GRACE_SECONDS;
            end > to
        });

        self.position = to;
        fired
    }
}

impl Transport for OfflineTransport {
    fn bpm(&self) -> f64 {
        self.tempo.bpm()
    }

    fn set_bpm(&mut self, bpm: f64) {
        self.tempo.set_bpm(bpm);
    }

    fn position_seconds(&self) -> f64 {
        self.position
    }

    fn loop_start_beats(&self) -> f64 {
        self.loop_start_beats
    }

    fn schedule(&mut self, part: Part) -> PartId {
        let id = PartId(self.next_part_id);
        self.next_part_id += 1;
        self.parts.insert(id, part);
        id
    }

    fn cancel(&mut self, part: PartId) -> bool {
        self.parts.remove(&part).is_some()
    }
}

fn anchor_seconds(anchor: Anchor, seconds_per_beat: f64) -> f64 {
    match anchor {
        Anchor::Beats(beats) => beats * seconds_per_beat,
        Anchor::Seconds(seconds) => seconds,
    }
}

/// Index of the first loop occurrence at or after `from`
fn first_occurrence(first: f64, period: f64, from: f64) -> u64 {
    if first >= from {
        return 0;
    }
    let mut k = ((from - first) / period).ceil().max(0.0) as u64;
    // Correct for rounding in the division
    while first + (k as f64) * period < from {
        k += 1;
    }
    while k > 0 && first + ((k - 1) as f64) * period >= from {
        k -= 1;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::clip::ClipId;
    use crate::sequencer::schedule::{EventTarget, PartOwner, PartSource, ScheduledEvent};
    use crate::sequencer::sequence::SequenceId;
    use crate::track::TrackId;

    fn event(offset_beats: f64) -> ScheduledEvent {
        ScheduledEvent {
            offset_beats,
            row: 0,
            step: (offset_beats * 4.0) as usize,
            target: EventTarget::Pad(0),
            duration_beats: 0.25,
            velocity: 1.0,
        }
    }

    fn sequence_owner() -> PartOwner {
        PartOwner {
            track: TrackId(1),
            source: PartSource::Sequence(SequenceId::new()),
        }
    }

    #[test]
    fn test_transport_state() {
        let mut transport = OfflineTransport::new(120.0);
        assert!(transport.state().is_stopped());

        transport.play();
        assert!(transport.state().is_playing());

        transport.record();
        assert!(transport.state().is_recording());

        transport.stop();
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position_seconds(), 0.0);
    }

    #[test]
    fn test_tempo_is_clamped() {
        assert_eq!(Tempo::new(1000.0).bpm(), MAX_BPM);
        assert_eq!(Tempo::new(1.0).bpm(), MIN_BPM);
        assert_eq!(Tempo::new(f64::NAN).bpm(), DEFAULT_BPM);
        assert_eq!(Tempo::new(120.0).beat_duration_seconds(), 0.5);
    }

    #[test]
    fn test_stopped_transport_fires_nothing() {
        let mut transport = OfflineTransport::new(120.0);
        transport.schedule(Part::looping(sequence_owner(), 0.0, 4.0, vec![event(0.0)]));
        assert!(transport.advance(1.0).is_empty());
        assert_eq!(transport.position_seconds(), 0.0);
    }

    #[test]
    fn test_loop_fires_every_period() {
        // 120 bpm: 1 beat = 0.5 s, 4-beat loop = 2 s
        let mut transport = OfflineTransport::new(120.0);
        transport.schedule(Part::looping(sequence_owner(), 0.0, 4.0, vec![event(0.75)]));
        transport.play();

        let fired = transport.advance(5.0);
        let times: Vec<f64> = fired.iter().map(|f| f.at_seconds).collect();
        assert_eq!(times, vec![0.375, 2.375, 4.375]);
    }

    #[test]
    fn test_blocks_do_not_double_fire() {
        let mut transport = OfflineTransport::new(120.0);
        transport.schedule(Part::looping(sequence_owner(), 0.0, 1.0, vec![event(0.0)]));
        transport.play();

        // block edges land exactly on loop boundaries
        let mut total = 0;
        for _ in 0..16 {
            total += transport.advance(0.125).len();
        }
        // 2 seconds at 0.5 s per loop
        assert_eq!(total, 4);
    }

    #[test]
    fn test_loop_anchored_at_loop_start() {
        let mut transport = OfflineTransport::new(120.0);
        transport.set_loop_start_beats(2.0);
        let start = transport.loop_start_beats();
        transport.schedule(Part::looping(sequence_owner(), start, 4.0, vec![event(0.0)]));
        transport.play();

        // 2 beats at 120 bpm = 1 s
        assert!(transport.advance(0.9).is_empty());
        let fired = transport.advance(0.2);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].at_seconds, 1.0);
    }

    #[test]
    fn test_one_shot_part_is_dropped_after_end() {
        let mut transport = OfflineTransport::new(120.0);
        let owner = PartOwner {
            track: TrackId(1),
            source: PartSource::Clip(ClipId::new()),
        };
        transport.schedule(Part::one_shot(owner, 1.0, vec![event(0.0)]));
        transport.play();

        assert_eq!(transport.advance(1.1).len(), 1);
        assert_eq!(transport.part_count(), 1);

        // ends at 1.125 + grace
        transport.advance(0.2);
        assert_eq!(transport.part_count(), 0);
    }

    #[test]
    fn test_cancel_stops_firing() {
        let mut transport = OfflineTransport::new(120.0);
        let id = transport.schedule(Part::looping(sequence_owner(), 0.0, 1.0, vec![event(0.0)]));
        transport.play();

        assert!(transport.cancel(id));
        assert!(!transport.cancel(id));
        assert!(transport.advance(2.0).is_empty());
    }

    #[test]
    fn test_position_ticks() {
        let mut transport = OfflineTransport::new(120.0);
        transport.set_position(0.5);
        assert_eq!(transport.position_ticks(), TICKS_PER_BEAT);
    }
}
