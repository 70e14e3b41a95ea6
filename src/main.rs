//! Application entry point and thread bootstrapper.

use beatrush::analysis::BeatDetector;
use beatrush::database::{BeatMapCache, BeatMapStore, Catalog, MemoryStore, open_store};
use beatrush::logic::{
    AudioDecoder, Collaborators, ControllerOptions, GameController, RodioDecoder, RodioTransport,
    TrackLoader,
};
use beatrush::models::settings::SETTINGS_FILE;
use beatrush::models::{Difficulty, GameState, Settings};
use beatrush::shared::SessionSnapshot;
use beatrush::system::{MonotonicClock, SessionBus, SessionCommand};
use crossbeam_channel::RecvTimeoutError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// The bot taps this early to absorb snapshot latency.
const BOT_LEAD: f64 = 0.01;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("MAIN: Booting beatrush...");

    let settings = Settings::load_or_default(Path::new(SETTINGS_FILE));
    let catalog = Catalog::scan(&settings.paths.songs);

    let store: Arc<dyn BeatMapStore> = match open_store(&settings) {
        Ok(store) => store,
        Err(e) => {
            log::error!("MAIN: Cannot open cache ({}), falling back to memory", e);
            Arc::new(MemoryStore::new())
        }
    };
    let cache = BeatMapCache::new(store);
    let decoder: Arc<dyn AudioDecoder> = Arc::new(RodioDecoder);
    let options = ControllerOptions::from_settings(&settings);

    let loader = TrackLoader::new(
        Arc::clone(&decoder),
        cache.clone(),
        BeatDetector::new(options.policy),
        options.lane_seed,
    );
    warm_cache(&loader, &catalog);

    let Some(track) = catalog.tracks().first().cloned() else {
        log::warn!("MAIN: No tracks in {:?}, nothing to play", settings.paths.songs);
        cache.shutdown();
        return;
    };

    let controller = GameController::new(
        Collaborators {
            decoder,
            cache,
            transport: Box::new(RodioTransport::start(options.volume)),
            clock: Arc::new(MonotonicClock::new()),
        },
        options,
    );

    let bus = SessionBus::new();
    let handle = beatrush::logic::start_thread(bus.clone(), controller, settings.tick_rate());

    bus.send(SessionCommand::SelectTrack(track));
    bus.send(SessionCommand::StartGame(settings.gameplay.default_difficulty));

    match play(&bus, settings.gameplay.autoplay, &handle) {
        Some(result) => log::info!(
            "MAIN: Final score {} (max combo {}, {:.2}%, {} perfect / {} good / {} miss)",
            result.score,
            result.max_combo,
            result.accuracy,
            result.hit_stats.perfect,
            result.hit_stats.good,
            result.hit_stats.miss
        ),
        None => log::warn!("MAIN: Session ended without a result"),
    }

    bus.send(SessionCommand::Quit);
    if handle.join().is_err() {
        log::error!("MAIN: Logic thread panicked");
    }
}

/// Resolves every catalog track once so later plays hit the cache.
fn warm_cache(loader: &TrackLoader, catalog: &Catalog) {
    let mut detected = 0;
    let mut cached = 0;
    for track in catalog.tracks() {
        match loader.resolve(track, || false) {
            Some(Ok(resolved)) => {
                if resolved.from_cache {
                    cached += 1;
                } else {
                    detected += 1;
                }
                let counts: Vec<String> = Difficulty::ALL
                    .iter()
                    .map(|&d| format!("{} {}", d.name(), resolved.beat_map.beats(d).len()))
                    .collect();
                log::info!("MAIN: '{}': {}", track.title, counts.join(", "));
            }
            Some(Err(e)) => log::warn!("MAIN: Skipping '{}': {}", track.title, e),
            None => {}
        }
    }
    log::info!("MAIN: Cache warm ({} cached, {} detected)", cached, detected);
}

/// Follows snapshots until the session finishes, tapping every tile when
/// `autoplay` is on.
fn play(bus: &SessionBus, autoplay: bool, logic: &JoinHandle<()>) -> Option<SessionSnapshot> {
    let mut tapped: HashSet<u64> = HashSet::new();
    let mut seen_playing = false;

    loop {
        let snapshot = match bus.snapshot_rx.recv_timeout(Duration::from_secs(1)) {
            Ok(snapshot) => snapshot,
            Err(RecvTimeoutError::Timeout) if logic.is_finished() => return None,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return None,
        };

        if let Some(message) = &snapshot.message
            && !seen_playing
            && snapshot.state == GameState::Selecting
        {
            log::error!("MAIN: {}", message);
            return None;
        }

        match snapshot.state {
            GameState::Finished => return Some(snapshot),
            GameState::Playing => seen_playing = true,
            _ => {}
        }

        if !autoplay {
            continue;
        }
        for tile in &snapshot.tiles {
            if tile.is_hit || tile.is_missed || snapshot.elapsed < tile.beat_time - BOT_LEAD {
                continue;
            }
            if tapped.insert(tile.beat_time.to_bits()) {
                bus.send(SessionCommand::Tap(tile.lane));
            }
        }
    }
}
