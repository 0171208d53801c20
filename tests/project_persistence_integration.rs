// Integration test for project persistence
// Save/load cycles through JSON, rejected documents and missing samples

use ringbuf::traits::Consumer;
use stepdaw::AudioEngine;
use stepdaw::command::commands::{
    AddEffect, AddNote, LoadSample, SampleTarget, SetTempo, ToggleArm, ToggleSolo,
};
use stepdaw::messaging::{NotificationConsumer, NotificationLevel};
use stepdaw::project::WindowState;
use stepdaw::sampler::{AudioBuffer, SlotStatus, encode_wav};
use stepdaw::synth::EffectKind;
use stepdaw::track::Instrument;
use stepdaw::{
    Daw, DirStore, EffectTarget, MemoryStore, Notification, SampleStore, StepNote, TrackKind,
    create_notification_channel,
};
use tempfile::TempDir;

fn daw_with(store: Box<dyn SampleStore>) -> (Daw, NotificationConsumer) {
    let (tx, rx) = create_notification_channel(64);
    let daw = Daw::new(store, Box::new(tx)).unwrap();
    (daw, rx)
}

fn drain(rx: &mut NotificationConsumer) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Some(n) = rx.try_pop() {
        out.push(n);
    }
    out
}

fn wav_bytes() -> Vec<u8> {
    let buffer = AudioBuffer::new(44_100, 1, vec![0.25; 4_410]);
    encode_wav(&buffer).unwrap()
}

/// One track of every kind, with notes, effects and mixer state
fn populated(daw: &mut Daw) {
    for kind in [
        TrackKind::Synth,
        TrackKind::Sampler,
        TrackKind::DrumSampler,
        TrackKind::InstrumentSampler,
        TrackKind::Audio,
    ] {
        daw.add_track(kind, None).unwrap();
    }
    let synth = daw.tracks()[0].id();
    let drums = daw.tracks()[2].id();
    let synth_seq = daw.tracks()[0].sequences().active_id().unwrap();

    daw.execute(Box::new(AddNote {
        track: synth,
        sequence: synth_seq,
        row: 5,
        step: 3,
        note: StepNote::new(0.8, 2),
    }))
    .unwrap();
    daw.execute(Box::new(LoadSample {
        track: drums,
        target: SampleTarget::Pad(1),
        bytes: wav_bytes(),
        file_name: "kick.wav".into(),
    }))
    .unwrap();
    daw.execute(Box::new(AddEffect {
        target: EffectTarget::Track(drums),
        kind: EffectKind::Delay,
        params: None,
    }))
    .unwrap();
    daw.execute(Box::new(AddEffect {
        target: EffectTarget::Master,
        kind: EffectKind::Compressor,
        params: None,
    }))
    .unwrap();
    daw.execute(Box::new(SetTempo(96.0))).unwrap();
    daw.execute(Box::new(ToggleSolo(drums))).unwrap();
    daw.execute(Box::new(ToggleArm(synth))).unwrap();
    daw.open_window(WindowState::new("mixer").at(40.0, 60.0));
}

#[test]
fn test_save_and_load_every_track_kind() {
    let samples = TempDir::new().unwrap();
    let project_dir = TempDir::new().unwrap();
    let path = project_dir.path().join("song.json");

    let (mut original, _rx) = daw_with(Box::new(DirStore::open(samples.path()).unwrap()));
    populated(&mut original);
    original.save_project(&path).unwrap();

    let (mut loaded, mut rx) = daw_with(Box::new(DirStore::open(samples.path()).unwrap()));
    loaded.load_project(&path).unwrap();

    let before = original.to_data();
    let after = loaded.to_data();
    assert_eq!(after.tracks.len(), 5);
    assert_eq!(after.tempo, 96.0);
    assert_eq!(after.soloed_track_id, before.soloed_track_id);
    assert_eq!(after.armed_track_id, before.armed_track_id);
    assert_eq!(after.master_effects.len(), 1);
    assert_eq!(after.open_windows, before.open_windows);

    for (a, b) in before.tracks.iter().zip(&after.tracks) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.instrument.kind(), b.instrument.kind());
        assert_eq!(a.sequences.len(), b.sequences.len());
        assert_eq!(a.active_sequence_id, b.active_sequence_id);
        assert_eq!(a.effects.len(), b.effects.len());
    }

    let synth = &loaded.tracks()[0];
    let seq = synth.sequences().active_id().unwrap();
    let note = synth.sequences().note_at(seq, 5, 3).unwrap();
    assert_eq!(note.velocity, 0.8);
    assert_eq!(note.duration, 2);

    let Instrument::DrumSampler(pads) = loaded.tracks()[2].instrument() else {
        panic!("expected a drum sampler");
    };
    assert_eq!(pads[1].slot.status(), SlotStatus::Loaded);
    assert_eq!(pads[0].slot.status(), SlotStatus::Empty);

    let messages = drain(&mut rx);
    assert!(messages.iter().any(|n| n.message == "Project loaded"));
    assert!(messages.iter().all(|n| n.level != NotificationLevel::Error));
    assert_eq!(loaded.history().undo_count(), 0);
}

#[test]
fn test_every_track_is_connected_after_load() {
    let (mut original, _rx) = daw_with(Box::new(MemoryStore::new()));
    populated(&mut original);
    let json = original.to_json().unwrap();

    let (mut loaded, _rx) = daw_with(Box::new(MemoryStore::new()));
    loaded.load_json(&json).unwrap();

    for track in loaded.tracks() {
        let nodes = track.nodes().unwrap();
        let path = loaded.engine().signal_path(nodes.instrument);
        assert_eq!(path.last(), Some(&loaded.engine().destination()));
    }
}

#[test]
fn test_malformed_json_leaves_project_untouched() {
    let (mut daw, mut rx) = daw_with(Box::new(MemoryStore::new()));
    populated(&mut daw);
    let before = daw.to_data();
    let undo_before = daw.history().undo_count();
    drain(&mut rx);

    assert!(daw.load_json("{ \"tracks\": [ {").is_err());

    assert_eq!(daw.to_data(), before);
    assert_eq!(daw.history().undo_count(), undo_before);
    let messages = drain(&mut rx);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, NotificationLevel::Error);
    assert!(messages[0].message.starts_with("Could not load project"));
}

#[test]
fn test_invalid_structure_is_rejected() {
    let (mut daw, _rx) = daw_with(Box::new(MemoryStore::new()));
    daw.add_track(TrackKind::Synth, None).unwrap();
    let mut data = daw.to_data();
    let duplicate = data.tracks[0].clone();
    data.tracks.push(duplicate);
    let json = serde_json::to_string(&data).unwrap();

    assert!(daw.load_json(&json).is_err());
    assert_eq!(daw.tracks().len(), 1);
}

#[test]
fn test_newer_major_version_is_rejected() {
    let (mut daw, mut rx) = daw_with(Box::new(MemoryStore::new()));
    let json = r#"{ "version": { "major": 2, "minor": 0, "patch": 0 }, "tempo": 120.0 }"#;

    assert!(daw.load_json(json).is_err());
    let messages = drain(&mut rx);
    assert!(messages[0].message.contains("not supported") || messages[0].message.contains("2.0.0"));
}

#[test]
fn test_missing_sample_marks_slot_and_notifies_once() {
    let (mut original, _rx) = daw_with(Box::new(MemoryStore::new()));
    populated(&mut original);
    let json = original.to_json().unwrap();

    // a fresh store does not hold the pad sample
    let (mut loaded, mut rx) = daw_with(Box::new(MemoryStore::new()));
    loaded.load_json(&json).unwrap();

    let Instrument::DrumSampler(pads) = loaded.tracks()[2].instrument() else {
        panic!("expected a drum sampler");
    };
    assert_eq!(pads[1].slot.status(), SlotStatus::Error);
    assert!(pads[1].slot.sample_ref().is_some());

    let warnings: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|n| n.level == NotificationLevel::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("kick.wav"));

    // the reference survives another save
    let resaved = loaded.to_data();
    assert_eq!(resaved.tracks[2], original.to_data().tracks[2]);
}

#[test]
fn test_older_version_is_migrated() {
    let (mut original, _rx) = daw_with(Box::new(MemoryStore::new()));
    original.add_track(TrackKind::DrumSampler, None).unwrap();
    let mut data = original.to_data();
    data.version.minor = 0;
    data.tracks[0].active_sequence_id = None;
    let json = serde_json::to_string(&data).unwrap();

    let (mut loaded, _rx) = daw_with(Box::new(MemoryStore::new()));
    loaded.load_json(&json).unwrap();
    assert!(loaded.tracks()[0].sequences().active_id().is_some());
}
