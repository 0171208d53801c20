use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use stepdaw::constants::PITCH_ROW_COUNT;
use stepdaw::sequencer::schedule::{RowSpace, compile_grid};
use stepdaw::sequencer::{Sequence, SequenceManager, StepNote};
use stepdaw::{Daw, MemoryStore, Notification, OfflineTransport, TrackId, TrackKind};

/// Pitched sequence with a note every `spacing` steps
fn dense_sequence(length: usize, spacing: usize) -> Sequence {
    let mut sequence = Sequence::new("Bench", PITCH_ROW_COUNT, length);
    for step in (0..length).step_by(spacing.max(1)) {
        sequence.set(step % PITCH_ROW_COUNT, step, Some(StepNote::default()));
    }
    sequence
}

/// Grid compilation (runs on every edit)
fn bench_compile_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_grid");

    for length in [16, 64, 256, 1024] {
        let sequence = dense_sequence(length, 2);
        group.bench_with_input(BenchmarkId::from_parameter(length), &sequence, |b, seq| {
            b.iter(|| black_box(compile_grid(&seq.data, RowSpace::Pitched)));
        });
    }
    group.finish();
}

/// Add a note and recompile the loop
fn bench_recompile(c: &mut Criterion) {
    c.bench_function("add_note_recompile", |b| {
        let mut transport = OfflineTransport::new(120.0);
        let mut manager = SequenceManager::new(TrackId(1), RowSpace::Pitched);
        let id = manager.create_sequence(&mut transport, "Bench", 64);
        let mut step = 0;

        b.iter(|| {
            step = (step + 1) % 64;
            let row = step % PITCH_ROW_COUNT;
            black_box(manager.add_note(&mut transport, id, row, step, StepNote::default()));
        });
    });
}

/// Full snapshot reconstruction (undo cost)
fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");

    for tracks in [1, 8, 32] {
        let mut daw =
            Daw::new(Box::new(MemoryStore::new()), Box::new(Vec::<Notification>::new())).unwrap();
        for i in 0..tracks {
            let kind = if i % 2 == 0 {
                TrackKind::Synth
            } else {
                TrackKind::DrumSampler
            };
            daw.add_track(kind, None).unwrap();
        }
        let snapshot = daw.to_data();

        group.bench_with_input(BenchmarkId::from_parameter(tracks), &snapshot, |b, data| {
            b.iter(|| daw.reconstruct(black_box(data)).unwrap());
        });
    }
    group.finish();
}

/// Offline rendering of a busy sequence
fn bench_render(c: &mut Criterion) {
    c.bench_function("render_one_second", |b| {
        let mut daw =
            Daw::new(Box::new(MemoryStore::new()), Box::new(Vec::<Notification>::new())).unwrap();
        let track = daw.add_track(TrackKind::Synth, None).unwrap();
        let sequence = daw.track(track).unwrap().sequences().active_id().unwrap();
        daw.edit_sequences(track, |seqs, transport| {
            for step in 0..64 {
                seqs.add_note(transport, sequence, step % 8, step, StepNote::default());
            }
        })
        .unwrap();

        b.iter(|| black_box(daw.render(1.0)));
    });
}

criterion_group!(
    benches,
    bench_compile_grid,
    bench_recompile,
    bench_reconstruct,
    bench_render
);
criterion_main!(benches);
