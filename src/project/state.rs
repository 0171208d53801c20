// Project state - The live project and its undo history
//
// `Daw` owns the audio engine, the transport, the sample store and every
// track. All edits go through it so that each user action can be
// snapshotted first; undo and redo rebuild the whole project from a
// snapshot.

use crate::audio::parameters::{ParamValue, Params};
use crate::audio::{AudioEngine, GraphEngine, NodeId};
use crate::command::history::{History, Snapshot};
use crate::command::trait_def::{CommandError, CommandResult, DawCommand};
use crate::config::DawConfig;
use crate::constants::STEPS_PER_BEAT;
use crate::messaging::{Notification, Notifier};
use crate::project::layout::{WindowLayout, WindowState};
use crate::project::master::MasterBus;
use crate::project::migration::ProjectMigrator;
use crate::project::types::{ProjectData, ProjectVersion};
use crate::project::{ProjectError, validate_project};
use crate::sampler::store::SampleStore;
use crate::sequencer::clip::ClipId;
use crate::sequencer::manager::{Cell, NoteClipboard, SequenceManager};
use crate::sequencer::recorder::capture_note;
use crate::sequencer::sequence::SequenceId;
use crate::sequencer::transport::{OfflineTransport, Transport};
use crate::synth::effect::{EffectId, EffectKind};
use crate::track::{LoadFailure, MixState, Recording, Track, TrackId, TrackKind};
use chrono::Utc;
use std::fs;
use std::path::Path;

/// Collaborators lent to a track while it is edited
pub struct TrackContext<'a> {
    pub engine: &'a mut dyn AudioEngine,
    pub transport: &'a mut dyn Transport,
    pub store: &'a mut dyn SampleStore,
    /// Whether mute or solo currently silences the track
    pub silenced: bool,
}

/// Effect chain an effect edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    Master,
    Track(TrackId),
}

/// Outcome of an offline render
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderReport {
    pub seconds: f64,
    pub events_fired: usize,
    pub voices_started: usize,
    /// Events with nothing to play (unloaded sample, removed track)
    pub silent_events: usize,
    /// Events whose trigger failed; playback carried on
    pub failed_events: usize,
    pub voices_released: usize,
}

/// The live project
pub struct Daw {
    config: DawConfig,
    engine: GraphEngine,
    transport: OfflineTransport,
    store: Box<dyn SampleStore>,
    notifier: Box<dyn Notifier>,
    master: MasterBus,
    master_input: NodeId,
    tracks: Vec<Track>,
    mix: MixState,
    layout: WindowLayout,
    history: History,
    clipboard: Option<NoteClipboard>,
    next_track_id: u32,
    reconstructing: bool,
}

impl Daw {
    pub fn new(
        store: Box<dyn SampleStore>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, ProjectError> {
        Self::with_config(DawConfig::default(), store, notifier)
    }

    pub fn with_config(
        config: DawConfig,
        store: Box<dyn SampleStore>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, ProjectError> {
        let config = config.sanitized();
        let mut engine = GraphEngine::new();
        let mut master = MasterBus::new();
        let master_input = master.connect(&mut engine)?;

        let mut mix = MixState::new();
        mix.record_mode = config.record_mode;

        Ok(Self {
            transport: OfflineTransport::new(config.default_bpm),
            history: History::with_capacity(config.history_depth),
            config,
            engine,
            store,
            notifier,
            master,
            master_input,
            tracks: Vec::new(),
            mix,
            layout: WindowLayout::new(),
            clipboard: None,
            next_track_id: 1,
            reconstructing: false,
        })
    }

    pub fn config(&self) -> &DawConfig {
        &self.config
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    pub fn transport(&self) -> &OfflineTransport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut OfflineTransport {
        &mut self.transport
    }

    pub fn store(&self) -> &dyn SampleStore {
        self.store.as_ref()
    }

    pub fn master(&self) -> &MasterBus {
        &self.master
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn mix(&self) -> &MixState {
        &self.mix
    }

    pub fn layout(&self) -> &WindowLayout {
        &self.layout
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clipboard(&self) -> Option<&NoteClipboard> {
        self.clipboard.as_ref()
    }

    pub fn is_reconstructing(&self) -> bool {
        self.reconstructing
    }

    fn notify(&mut self, notification: Notification) {
        let notification = notification.with_duration(self.config.notification_ms);
        self.notifier.notify(notification);
    }

    // ---- snapshots and history ----

    /// Structural copy of the project; never contains decoded audio
    pub fn to_data(&self) -> ProjectData {
        ProjectData {
            version: ProjectVersion::current(),
            tempo: self.transport.bpm(),
            master_volume: self.master.volume(),
            master_effects: self.master.effects_data(),
            tracks: self.tracks.iter().map(Track::to_data).collect(),
            open_windows: Some(self.layout.to_data()),
            soloed_track_id: self.mix.soloed(),
            armed_track_id: self.mix.armed(),
            saved_at: None,
        }
    }

    fn snapshot(&self, description: &str) -> Option<Snapshot> {
        if self.reconstructing {
            log::debug!("Snapshot '{}' suppressed during reconstruction", description);
            return None;
        }
        Some(Snapshot::new(self.to_data(), description))
    }

    /// Push the current state onto the undo stack
    ///
    /// Does nothing while a snapshot is being restored. Clears redo.
    pub fn capture_state_for_undo(&mut self, description: &str) {
        if let Some(snapshot) = self.snapshot(description) {
            self.history.push(snapshot);
        }
    }

    /// Snapshot the project, then run the command
    ///
    /// The snapshot is kept only if the command succeeds and reports a
    /// change. Failures are also sent as a notification.
    pub fn execute(&mut self, mut command: Box<dyn DawCommand>) -> CommandResult<()> {
        let description = command.description();
        let snapshot = self.snapshot(&description);

        match command.apply(self) {
            Ok(true) => {
                if let Some(snapshot) = snapshot {
                    self.history.push(snapshot);
                }
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                self.notify(Notification::error(format!("{} failed: {}", description, e)));
                Err(e)
            }
        }
    }

    /// Restore the state before the last action
    pub fn undo(&mut self) -> CommandResult<String> {
        let Some(snapshot) = self.history.pop_undo() else {
            self.notify(Notification::info("Nothing to undo"));
            return Err(CommandError::UndoFailed("Nothing to undo".into()));
        };

        let current = Snapshot::new(self.to_data(), snapshot.description.clone());
        self.history.push_redo(current);
        self.reconstruct(&snapshot.state)
            .map_err(|e| CommandError::UndoFailed(e.to_string()))?;

        self.notify(Notification::info(format!("Undo: {}", snapshot.description)));
        Ok(snapshot.description)
    }

    /// Re-apply the last undone action
    pub fn redo(&mut self) -> CommandResult<String> {
        let Some(snapshot) = self.history.pop_redo() else {
            self.notify(Notification::info("Nothing to redo"));
            return Err(CommandError::RedoFailed("Nothing to redo".into()));
        };

        let current = Snapshot::new(self.to_data(), snapshot.description.clone());
        self.history.push_undo(current);
        self.reconstruct(&snapshot.state)
            .map_err(|e| CommandError::RedoFailed(e.to_string()))?;

        self.notify(Notification::info(format!("Redo: {}", snapshot.description)));
        Ok(snapshot.description)
    }

    /// Tear down every track and rebuild the project from `data`
    ///
    /// Tracks are rebuilt one after another in saved order, keeping their
    /// ids. Samples that fail to load leave their slot in `Error` and are
    /// reported in a single notification; they do not abort the rebuild.
    pub fn reconstruct(&mut self, data: &ProjectData) -> Result<(), ProjectError> {
        self.reconstructing = true;
        let result = self.rebuild(data);
        self.reconstructing = false;

        let failures = result?;
        if !failures.is_empty() {
            let labels: Vec<_> = failures.iter().map(|f| f.label.as_str()).collect();
            self.notify(Notification::warning(format!(
                "{} sample(s) could not be loaded: {}",
                failures.len(),
                labels.join(", ")
            )));
        }
        Ok(())
    }

    fn rebuild(&mut self, data: &ProjectData) -> Result<Vec<LoadFailure>, ProjectError> {
        log::info!("Reconstructing project with {} track(s)", data.tracks.len());

        for mut track in self.tracks.drain(..) {
            track.dispose(&mut self.engine, &mut self.transport);
        }

        self.transport.set_bpm(data.tempo);
        self.master
            .restore(&mut self.engine, data.master_volume, &data.master_effects)?;
        self.mix.restore(data.soloed_track_id, data.armed_track_id);

        let playing = self.transport.state().is_playing();
        let seconds_per_step = self.seconds_per_step();
        let mut failures = Vec::new();
        for track_data in &data.tracks {
            let mut track = Track::from_data(track_data);
            track.clips_mut().retime(seconds_per_step);
            failures.extend(track.load_buffers(self.store.as_ref()));

            let silenced = self.mix.is_silenced(track.id(), track.is_muted());
            track.connect(&mut self.engine, self.master_input, silenced)?;
            track.recompile(&mut self.transport);
            if playing {
                track.schedule_clips(&mut self.transport);
            }
            self.tracks.push(track);
        }

        self.next_track_id = self
            .tracks
            .iter()
            .map(|t| t.id().0)
            .max()
            .map_or(1, |max| max + 1);

        if let Some(recording) = self.mix.recording()
            && self.track(recording.track).is_none()
        {
            self.mix.stop_recording();
            self.transport.stop_recording();
        }

        self.layout.restore(data.open_windows.as_deref());
        log::info!("Project reconstructed");
        Ok(failures)
    }

    // ---- persistence ----

    /// Project as pretty JSON, stamped with the save time
    pub fn to_json(&self) -> Result<String, ProjectError> {
        let mut data = self.to_data();
        data.saved_at = Some(Utc::now());
        Ok(serde_json::to_string_pretty(&data)?)
    }

    fn parse_project(text: &str) -> Result<ProjectData, ProjectError> {
        let data: ProjectData = serde_json::from_str(text)?;
        let migrated = ProjectMigrator::migrate_to_current(data)?;
        validate_project(&migrated.project)?;
        Ok(migrated.project)
    }

    /// Replace the project with a JSON document
    ///
    /// A malformed or incompatible document leaves the current project
    /// untouched. A successful load clears the undo history.
    pub fn load_json(&mut self, text: &str) -> Result<(), ProjectError> {
        let data = match Self::parse_project(text) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Rejected project: {}", e);
                self.notify(Notification::error(format!("Could not load project: {}", e)));
                return Err(e);
            }
        };

        self.stop();
        if let Err(e) = self.reconstruct(&data) {
            self.notify(Notification::error(format!("Could not load project: {}", e)));
            return Err(e);
        }
        self.history.clear();
        self.clipboard = None;
        self.notify(Notification::info("Project loaded"));
        Ok(())
    }

    pub fn save_project<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ProjectError> {
        let path = path.as_ref();
        let result = self
            .to_json()
            .and_then(|json| fs::write(path, json).map_err(ProjectError::from));
        match &result {
            Ok(()) => {
                log::info!("Project saved to {}", path.display());
                self.notify(Notification::info("Project saved"));
            }
            Err(e) => self.notify(Notification::error(format!("Could not save project: {}", e))),
        }
        result
    }

    pub fn load_project<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ProjectError> {
        let text = match fs::read_to_string(path.as_ref()) {
            Ok(text) => text,
            Err(e) => {
                self.notify(Notification::error(format!("Could not open project: {}", e)));
                return Err(e.into());
            }
        };
        self.load_json(&text)
    }

    // ---- transport and playback ----

    /// Start playback; arrangement clips are scheduled now
    pub fn play(&mut self) {
        for track in &mut self.tracks {
            track.schedule_clips(&mut self.transport);
        }
        self.transport.play();
    }

    pub fn pause(&mut self) {
        self.transport.pause();
    }

    /// Stop, rewind and silence every voice; an active take is dropped
    pub fn stop(&mut self) {
        self.mix.stop_recording();
        self.transport.stop();
        for track in &mut self.tracks {
            track.clips_mut().stop(&mut self.transport);
            if let Some(nodes) = track.nodes() {
                self.engine.release_all(nodes.instrument);
            }
        }
    }

    pub fn tempo(&self) -> f64 {
        self.transport.bpm()
    }

    /// Change the tempo (clamped); returns the tempo in effect
    ///
    /// MIDI clips keep their length in steps, so their durations follow.
    pub fn set_tempo(&mut self, bpm: f64) -> f64 {
        self.transport.set_bpm(bpm);
        let seconds_per_step = self.seconds_per_step();
        for track in &mut self.tracks {
            track.clips_mut().retime(seconds_per_step);
        }
        self.refresh_clips();
        self.transport.bpm()
    }

    fn seconds_per_step(&self) -> f64 {
        self.transport.seconds_per_beat() / STEPS_PER_BEAT as f64
    }

    fn refresh_clips(&mut self) {
        if !self.transport.state().is_playing() {
            return;
        }
        for track in &mut self.tracks {
            track.schedule_clips(&mut self.transport);
        }
    }

    /// Run the transport for `seconds`, dispatching every fired event
    ///
    /// Starts playback if needed. A failed trigger is logged and counted;
    /// it never stops the render. The engine's trigger log holds this
    /// render's voices only.
    pub fn render(&mut self, seconds: f64) -> RenderReport {
        let mut report = RenderReport::default();
        if !seconds.is_finite() || seconds <= 0.0 {
            return report;
        }
        if !self.transport.state().is_playing() {
            self.play();
        }
        self.engine.clear_triggers();

        let block = self.config.render_block_seconds;
        let blocks = (seconds / block).ceil() as usize;
        for index in 0..blocks {
            let step = block.min(seconds - index as f64 * block);
            if step <= 0.0 {
                break;
            }
            let fired = self.transport.advance(step);
            let spb = self.transport.seconds_per_beat();
            report.events_fired += fired.len();

            for event in &fired {
                let Some(track) = self.tracks.iter().find(|t| t.id() == event.owner.track) else {
                    report.silent_events += 1;
                    continue;
                };
                match track.handle_event(&mut self.engine, event, spb) {
                    Ok(Some(_)) => report.voices_started += 1,
                    Ok(None) => report.silent_events += 1,
                    Err(e) => {
                        log::warn!("Track {}: trigger failed: {}", track.id(), e);
                        report.failed_events += 1;
                    }
                }
            }

            let now = self.transport.position_seconds();
            report.voices_released += self.engine.release_expired(now);
            report.seconds += step;
        }

        log::debug!(
            "Rendered {:.3}s: {} event(s), {} voice(s)",
            report.seconds,
            report.events_fired,
            report.voices_started
        );
        report
    }

    // ---- tracks ----

    /// Lend a track and the collaborators it needs
    pub fn with_track<R>(
        &mut self,
        id: TrackId,
        f: impl FnOnce(&mut Track, TrackContext<'_>) -> R,
    ) -> Result<R, ProjectError> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(ProjectError::TrackNotFound(id))?;
        let silenced = self.mix.is_silenced(id, track.is_muted());
        let ctx = TrackContext {
            engine: &mut self.engine,
            transport: &mut self.transport,
            store: self.store.as_mut(),
            silenced,
        };
        Ok(f(track, ctx))
    }

    /// Edit the sequences of a track
    pub fn edit_sequences<R>(
        &mut self,
        id: TrackId,
        f: impl FnOnce(&mut SequenceManager, &mut dyn Transport) -> R,
    ) -> Result<R, ProjectError> {
        self.with_track(id, |track, ctx| f(track.sequences_mut(), ctx.transport))
    }

    /// Create and connect a track; non-audio tracks start with one sequence
    pub fn add_track(
        &mut self,
        kind: TrackKind,
        name: Option<&str>,
    ) -> Result<TrackId, ProjectError> {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", kind.default_name(), id));
        let mut track = Track::new(id, name, kind);

        let silenced = self.mix.is_silenced(id, false);
        track.connect(&mut self.engine, self.master_input, silenced)?;
        if kind.row_space().row_count() > 0 {
            track.sequences_mut().create_sequence(
                &mut self.transport,
                "Sequence 1",
                self.config.default_sequence_length,
            );
        }

        log::info!("Added {:?} track {}", kind, id);
        self.tracks.push(track);
        Ok(id)
    }

    /// Dispose and remove a track; false if unknown
    pub fn remove_track(&mut self, id: TrackId) -> Result<bool, ProjectError> {
        let Some(index) = self.tracks.iter().position(|t| t.id() == id) else {
            return Ok(false);
        };
        let mut track = self.tracks.remove(index);
        track.dispose(&mut self.engine, &mut self.transport);

        let was_soloed = self.mix.soloed() == Some(id);
        self.mix.forget(id);
        if was_soloed {
            self.apply_mix()?;
        }
        Ok(true)
    }

    pub fn rename_track(&mut self, id: TrackId, name: &str) -> Result<(), ProjectError> {
        self.with_track(id, |track, _| track.set_name(name))
    }

    pub fn set_track_volume(&mut self, id: TrackId, volume: f32) -> Result<f32, ProjectError> {
        Ok(self.with_track(id, |track, ctx| {
            track.set_volume(ctx.engine, volume, ctx.silenced)
        })??)
    }

    fn apply_mix(&mut self) -> Result<(), ProjectError> {
        self.mix
            .apply(&self.tracks, &mut self.engine, self.config.mute_ramp_seconds)?;
        Ok(())
    }

    /// Flip a track's mute flag and ramp every track to its new gain
    pub fn toggle_mute(&mut self, id: TrackId) -> Result<bool, ProjectError> {
        let muted = self.with_track(id, |track, _| {
            track.set_muted(!track.is_muted());
            track.is_muted()
        })?;
        self.apply_mix()?;
        Ok(muted)
    }

    /// Solo a track, or clear the solo if it is the soloed one
    pub fn toggle_solo(&mut self, id: TrackId) -> Result<Option<TrackId>, ProjectError> {
        if self.track(id).is_none() {
            return Err(ProjectError::TrackNotFound(id));
        }
        let soloed = self.mix.toggle_solo(id);
        self.apply_mix()?;
        Ok(soloed)
    }

    /// Arm a track for recording, or disarm it if it is the armed one
    pub fn toggle_arm(&mut self, id: TrackId) -> Result<Option<TrackId>, ProjectError> {
        if self.track(id).is_none() {
            return Err(ProjectError::TrackNotFound(id));
        }
        Ok(self.mix.toggle_arm(id))
    }

    pub fn set_master_volume(&mut self, volume: f32) -> Result<f32, ProjectError> {
        Ok(self.master.set_volume(&mut self.engine, volume)?)
    }

    // ---- effects ----

    pub fn add_effect(
        &mut self,
        target: EffectTarget,
        kind: EffectKind,
        params: Option<&Params>,
    ) -> Result<EffectId, ProjectError> {
        match target {
            EffectTarget::Master => Ok(self.master.add_effect(&mut self.engine, kind, params)?),
            EffectTarget::Track(id) => {
                Ok(self.with_track(id, |track, ctx| track.add_effect(ctx.engine, kind, params))??)
            }
        }
    }

    pub fn remove_effect(
        &mut self,
        target: EffectTarget,
        effect: EffectId,
    ) -> Result<bool, ProjectError> {
        match target {
            EffectTarget::Master => Ok(self.master.remove_effect(&mut self.engine, effect)?),
            EffectTarget::Track(id) => {
                Ok(self.with_track(id, |track, ctx| track.remove_effect(ctx.engine, effect))??)
            }
        }
    }

    pub fn update_effect_param(
        &mut self,
        target: EffectTarget,
        effect: EffectId,
        path: &str,
        value: ParamValue,
    ) -> Result<bool, ProjectError> {
        match target {
            EffectTarget::Master => {
                Ok(self.master.update_effect_param(&mut self.engine, effect, path, value)?)
            }
            EffectTarget::Track(id) => Ok(self.with_track(id, |track, ctx| {
                track.update_effect_param(ctx.engine, effect, path, value)
            })??),
        }
    }

    pub fn reorder_effect(
        &mut self,
        target: EffectTarget,
        effect: EffectId,
        new_index: usize,
    ) -> Result<bool, ProjectError> {
        match target {
            EffectTarget::Master => {
                Ok(self.master.reorder_effect(&mut self.engine, effect, new_index)?)
            }
            EffectTarget::Track(id) => Ok(self.with_track(id, |track, ctx| {
                track.reorder_effect(ctx.engine, effect, new_index)
            })??),
        }
    }

    // ---- notes and clips ----

    /// Copy cells of a sequence to the clipboard; returns the note count
    pub fn copy_notes(
        &mut self,
        id: TrackId,
        sequence: SequenceId,
        cells: &[Cell],
    ) -> Result<usize, ProjectError> {
        let track = self.track(id).ok_or(ProjectError::TrackNotFound(id))?;
        let clipboard = track.sequences().copy_notes(sequence, cells);
        let count = clipboard.len();
        self.clipboard = Some(clipboard);
        Ok(count)
    }

    /// Place a copy of a sequence on the arrangement
    pub fn add_midi_clip(
        &mut self,
        id: TrackId,
        sequence: SequenceId,
        start_time: f64,
    ) -> Result<ClipId, ProjectError> {
        let seconds_per_step = self.seconds_per_step();
        let clip = self.with_track(id, |track, _| {
            track.add_midi_clip(sequence, start_time, seconds_per_step)
        })??;
        self.refresh_clips();
        Ok(clip)
    }

    pub fn move_clip(
        &mut self,
        id: TrackId,
        clip: ClipId,
        start_time: f64,
    ) -> Result<bool, ProjectError> {
        let moved = self.with_track(id, |track, _| track.clips_mut().move_clip(clip, start_time))?;
        self.refresh_clips();
        Ok(moved)
    }

    pub fn delete_clip(&mut self, id: TrackId, clip: ClipId) -> Result<bool, ProjectError> {
        let deleted = self.with_track(id, |track, _| track.clips_mut().delete_clip(clip))?;
        self.refresh_clips();
        Ok(deleted)
    }

    // ---- recording ----

    /// Start recording on the armed track
    ///
    /// Without an armed track nothing happens and a warning is shown.
    pub fn start_recording(&mut self) -> Option<Recording> {
        if self.mix.armed().is_none() {
            self.notify(Notification::warning("Arm a track before recording"));
            return None;
        }

        self.capture_state_for_undo("Record");
        let recording = self.mix.start_recording(self.transport.position_seconds())?;
        for track in &mut self.tracks {
            track.schedule_clips(&mut self.transport);
        }
        self.transport.record();
        log::info!("Recording on track {} from {:.3}s", recording.track, recording.start_seconds);
        Some(recording)
    }

    /// Stop recording and keep playing
    pub fn stop_recording(&mut self) -> Option<Recording> {
        self.transport.stop_recording();
        self.mix.stop_recording()
    }

    /// Live note from an input device, played on the armed track
    ///
    /// While recording on a non-audio track the note is also written into
    /// the active sequence; returns the step written.
    pub fn note_on(&mut self, row: usize, velocity: f32) -> Result<Option<usize>, ProjectError> {
        let Some(armed) = self.mix.armed() else {
            return Ok(None);
        };
        let recording = self.mix.recording().is_some_and(|r| r.track == armed);
        let mode = self.mix.record_mode;
        let at = self.transport.position_seconds();
        let gate = self.transport.seconds_per_beat() / STEPS_PER_BEAT as f64;

        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id() == armed)
            .ok_or(ProjectError::TrackNotFound(armed))?;

        let step = if recording && track.kind() != TrackKind::Audio {
            capture_note(track.sequences_mut(), &mut self.transport, row, velocity, mode)
        } else {
            None
        };
        track.audition(&mut self.engine, row, velocity, at, gate)?;
        Ok(step)
    }

    /// Store a recorded take and place it where recording started
    pub fn finish_audio_recording(&mut self, wav_bytes: Vec<u8>) -> Result<ClipId, ProjectError> {
        let recording = self.mix.recording().ok_or(ProjectError::NotRecording)?;
        let take = self
            .track(recording.track)
            .map_or(0, |t| t.clips().len())
            + 1;
        let file_name = format!("Recording {}.wav", take);

        let clip = self.with_track(recording.track, |track, ctx| {
            track.add_audio_clip(ctx.store, wav_bytes, &file_name, recording.start_seconds)
        })??;

        self.stop_recording();
        self.refresh_clips();
        self.notify(Notification::info(format!("Saved {}", file_name)));
        Ok(clip)
    }

    // ---- windows ----

    pub fn open_window(&mut self, window: WindowState) {
        self.layout.open(window);
    }

    pub fn close_window(&mut self, id: &str) -> bool {
        self.layout.close(id)
    }
}
