// StepDAW - Headless project renderer
//
// Usage: stepdaw <project.json> [seconds] [samples-dir]
//
// Loads a project, plays it offline for the given duration and prints what
// was triggered. Samples are read from `samples-dir` when given.

use ringbuf::traits::Consumer;
use std::env;
use std::process::ExitCode;
use stepdaw::sampler::SampleStore;
use stepdaw::{Daw, DawConfig, DirStore, MemoryStore, create_notification_channel};

const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 256;
const DEFAULT_RENDER_SECONDS: f64 = 8.0;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(project_path) = args.first() else {
        eprintln!("Usage: stepdaw <project.json> [seconds] [samples-dir]");
        return ExitCode::from(2);
    };
    let seconds = match args.get(1).map(|s| s.parse::<f64>()) {
        None => DEFAULT_RENDER_SECONDS,
        Some(Ok(seconds)) if seconds.is_finite() && seconds > 0.0 => seconds,
        Some(_) => {
            eprintln!("ERROR: seconds must be a positive number");
            return ExitCode::from(2);
        }
    };

    let store: Box<dyn SampleStore> = match args.get(2) {
        Some(dir) => match DirStore::open(dir) {
            Ok(store) => Box::new(store),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(MemoryStore::new()),
    };

    let config = match DawConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Using default settings: {}", e);
            DawConfig::default()
        }
    };

    let (notification_tx, mut notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let mut daw = match Daw::with_config(config, store, Box::new(notification_tx)) {
        Ok(daw) => daw,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let loaded = daw.load_project(project_path);
    while let Some(notification) = notification_rx.try_pop() {
        println!("[{:?}] {}", notification.level, notification.message);
    }
    if let Err(e) = loaded {
        eprintln!("ERROR: {}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "=== {} track(s) at {:.1} BPM ===",
        daw.tracks().len(),
        daw.tempo()
    );
    let report = daw.render(seconds);
    daw.stop();

    println!("Rendered      {:.2}s", report.seconds);
    println!("Events fired  {}", report.events_fired);
    println!("Voices        {}", report.voices_started);
    println!("Silent        {}", report.silent_events);
    println!("Failed        {}", report.failed_events);

    while let Some(notification) = notification_rx.try_pop() {
        println!("[{:?}] {}", notification.level, notification.message);
    }
    ExitCode::SUCCESS
}
