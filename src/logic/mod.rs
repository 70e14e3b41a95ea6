//! Logic thread module for controller updates.
//!
//! This module contains the main loop that runs the game controller at a
//! fixed tick rate, plus the collaborators it drives (decoding, the audio
//! thread and background track loading).

pub mod audio;
pub mod audio_thread;
pub mod controller;
pub mod decode;
pub mod loader;

pub use audio::{PlaybackTransport, RodioTransport};
pub use controller::{Collaborators, ControllerOptions, GameController};
pub use decode::{AudioDecoder, DecodedAudio, RodioDecoder};
pub use loader::{LoadOutcome, Resolved, TrackLoader};

use crate::system::bus::SessionBus;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Spawns the logic thread that owns `controller`.
///
/// The thread runs a fixed-timestep loop that:
/// 1. Applies queued session commands
/// 2. Ticks the controller at `tick_rate` Hz
/// 3. Publishes a snapshot after each batch of ticks
///
/// It exits on `SessionCommand::Quit` or when every command sender is gone.
pub fn start_thread(bus: SessionBus, mut controller: GameController, tick_rate: u32) -> JoinHandle<()> {
    thread::Builder::new()
        .name("Logic Thread".to_string())
        .spawn(move || {
            log::info!("LOGIC: Thread started at {} Hz", tick_rate);

            let mut accumulator = Duration::new(0, 0);
            let mut last_time = Instant::now();
            let target_dt = Duration::from_secs_f64(1.0 / tick_rate.max(1) as f64);

            'outer: loop {
                // 1. Process session commands
                loop {
                    match bus.command_rx.try_recv() {
                        Ok(command) => {
                            if !controller.handle_command(command) {
                                log::info!("LOGIC: Quit received...");
                                break 'outer;
                            }
                        }
                        Err(crossbeam_channel::TryRecvError::Empty) => break,
                        Err(crossbeam_channel::TryRecvError::Disconnected) => {
                            log::info!("LOGIC: Bus closed");
                            controller.exit();
                            break 'outer;
                        }
                    }
                }

                // 2. Fixed-timestep update loop
                let current_time = Instant::now();
                let delta = current_time - last_time;
                last_time = current_time;
                accumulator += delta;

                let mut updated = false;
                let mut loops = 0;
                while accumulator >= target_dt && loops < 10 {
                    controller.tick();
                    accumulator -= target_dt;
                    loops += 1;
                    updated = true;
                }
                // Drop backlog we could not catch up on
                if loops == 10 {
                    accumulator = Duration::ZERO;
                }

                // 3. Send snapshot only if we updated
                if updated {
                    let _ = bus.snapshot_tx.try_send(controller.snapshot());
                }

                if loops == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }

            controller.cache().shutdown();
            log::info!("LOGIC: Thread stopped");
        })
        .expect("Failed to spawn Logic thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{BeatMapCache, BeatMapStore, CacheEntry, MemoryStore};
    use crate::error::GameError;
    use crate::models::{Beat, BeatMap, GameState, Track, TrackId};
    use crate::system::bus::SessionCommand;
    use crate::system::clock::MonotonicClock;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct SilentTransport;

    impl PlaybackTransport for SilentTransport {
        fn prepare(&mut self, _: &Track) -> Result<(), GameError> {
            Ok(())
        }
        fn schedule_start(&mut self, _: Duration) -> Result<(), GameError> {
            Ok(())
        }
        fn is_playing(&self) -> bool {
            false
        }
        fn pause(&mut self) {}
        fn resume(&mut self) {}
        fn stop(&mut self) {}
    }

    #[test]
    fn loop_applies_commands_and_publishes_snapshots() {
        let store = Arc::new(MemoryStore::new());
        let beats = vec![Beat::new(0.5, 0, 1.0)];
        let map = BeatMap::new(beats.clone(), beats.clone(), beats);
        store
            .save(&TrackId::new("t"), &CacheEntry::new(map, Some(1.0)))
            .unwrap();

        let controller = GameController::new(
            Collaborators {
                decoder: Arc::new(RodioDecoder),
                cache: BeatMapCache::new(store),
                transport: Box::new(SilentTransport),
                clock: Arc::new(MonotonicClock::new()),
            },
            ControllerOptions::default(),
        );
        let bus = SessionBus::new();
        let handle = start_thread(bus.clone(), controller, 120);

        let track = Track::new(TrackId::new("t"), PathBuf::from("t.wav"), "t", None);
        assert!(bus.send(SessionCommand::SelectTrack(track)));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut playing = false;
        while Instant::now() < deadline {
            if let Ok(snapshot) = bus.snapshot_rx.recv_timeout(Duration::from_millis(50))
                && snapshot.state == GameState::Playing
            {
                assert!(snapshot.elapsed < 0.0);
                playing = true;
                break;
            }
        }
        assert!(playing);

        assert!(bus.send(SessionCommand::Quit));
        handle.join().unwrap();
    }
}
