//! Background beat map resolution: cache first, detection on a miss.
//!
//! Every load carries the generation it was started under. The worker checks
//! it between stages and stops early once a newer selection has been made;
//! the controller checks it again before applying the outcome.

use super::decode::AudioDecoder;
use crate::analysis::BeatDetector;
use crate::database::BeatMapCache;
use crate::error::GameError;
use crate::models::{BeatMap, Difficulty, Track, TrackId};
use crossbeam_channel::Sender;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

/// A beat map ready to be played.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub beat_map: Arc<BeatMap>,
    /// Track length in seconds, when known.
    pub duration: Option<f64>,
    pub from_cache: bool,
}

/// Result of one background load, tagged with the generation that started it.
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub track_id: TrackId,
    pub result: Result<Resolved, GameError>,
}

/// Resolves beat maps for tracks. Cheap to clone.
#[derive(Clone)]
pub struct TrackLoader {
    decoder: Arc<dyn AudioDecoder>,
    cache: BeatMapCache,
    detector: BeatDetector,
    lane_seed: Option<u64>,
    /// Worker stack size; the platform default when `None`.
    stack_size: Option<usize>,
}

impl TrackLoader {
    pub fn new(
        decoder: Arc<dyn AudioDecoder>,
        cache: BeatMapCache,
        detector: BeatDetector,
        lane_seed: Option<u64>,
    ) -> Self {
        Self {
            decoder,
            cache,
            detector,
            lane_seed,
            stack_size: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn cache(&self) -> &BeatMapCache {
        &self.cache
    }

    /// Resolves `track` on a worker thread and reports on `outcome_tx`.
    ///
    /// Nothing is sent when the load is cancelled, i.e. when `current` no
    /// longer equals `generation`. The caller never joins the worker. Fails
    /// only when the worker cannot be started.
    pub fn spawn(
        &self,
        track: Track,
        generation: u64,
        current: Arc<AtomicU64>,
        outcome_tx: Sender<LoadOutcome>,
    ) -> Result<(), GameError> {
        let loader = self.clone();
        let mut builder = thread::Builder::new().name("Loader Thread".to_string());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder
            .spawn(move || {
                let is_cancelled = || current.load(Ordering::Acquire) != generation;
                let Some(result) = loader.resolve(&track, is_cancelled) else {
                    log::info!("LOADER: Load of '{}' cancelled", track.title);
                    return;
                };
                let _ = outcome_tx.send(LoadOutcome {
                    generation,
                    track_id: track.id.clone(),
                    result,
                });
            })
            .map(|_| ())
            .map_err(|e| GameError::Scheduling(format!("cannot start loader thread: {}", e)))
    }

    /// Cache lookup, then decode and detect on a miss. Blocking.
    ///
    /// Returns `None` if `is_cancelled` fires before a result exists.
    pub fn resolve<F>(&self, track: &Track, is_cancelled: F) -> Option<Result<Resolved, GameError>>
    where
        F: Fn() -> bool,
    {
        if is_cancelled() {
            return None;
        }

        if let Some(entry) = self.cache.load(&track.id) {
            log::info!("LOADER: Cache hit for '{}'", track.title);
            return Some(Ok(Resolved {
                beat_map: Arc::new(entry.beat_map),
                duration: entry.duration.or(track.duration),
                from_cache: true,
            }));
        }

        let started = Instant::now();
        let audio = match self.decoder.decode(track) {
            Ok(audio) => audio,
            Err(e) => return Some(Err(e)),
        };
        if is_cancelled() {
            return None;
        }

        let mut rng = match self.lane_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let beat_map =
            self.detector
                .detect_cancellable(&audio.samples, audio.sample_rate, &mut rng, &is_cancelled)?;
        let duration = Some(audio.duration());

        log::info!(
            "LOADER: Detected {} beats for '{}' in {:.1?}",
            beat_map.beats(Difficulty::Medium).len(),
            track.title,
            started.elapsed()
        );

        // Detached; gameplay never waits on the write.
        let _ = self.cache.save(&track.id, &beat_map, duration);

        Some(Ok(Resolved {
            beat_map: Arc::new(beat_map),
            duration,
            from_cache: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_signals::pulse_train;
    use crate::database::MemoryStore;
    use crate::logic::decode::DecodedAudio;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct CountingDecoder {
        calls: AtomicUsize,
        audio: Option<DecodedAudio>,
    }

    impl AudioDecoder for CountingDecoder {
        fn decode(&self, _: &Track) -> Result<DecodedAudio, GameError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.audio
                .clone()
                .ok_or_else(|| GameError::Decode("unsupported".to_string()))
        }
    }

    fn loader_with(audio: Option<DecodedAudio>) -> (TrackLoader, Arc<CountingDecoder>) {
        let decoder = Arc::new(CountingDecoder {
            calls: AtomicUsize::new(0),
            audio,
        });
        let cache = BeatMapCache::new(Arc::new(MemoryStore::new()));
        let loader = TrackLoader::new(decoder.clone(), cache, BeatDetector::default(), Some(3));
        (loader, decoder)
    }

    fn track() -> Track {
        Track::new(TrackId::new("pulse"), PathBuf::from("pulse.wav"), "pulse", None)
    }

    #[test]
    fn miss_detects_then_hit_skips_decoding() {
        let audio = DecodedAudio::new(pulse_train(8000, 6.0, 0.5), 8000);
        let (loader, decoder) = loader_with(Some(audio));

        let first = loader.resolve(&track(), || false).unwrap().unwrap();
        assert!(!first.from_cache);
        assert!(!first.beat_map.is_empty());
        assert_eq!(first.duration, Some(6.0));

        // Wait for the detached write to land.
        let deadline = Instant::now() + Duration::from_secs(5);
        while loader.cache().load(&track().id).is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let second = loader.resolve(&track(), || false).unwrap().unwrap();
        assert!(second.from_cache);
        assert_eq!(second.beat_map, first.beat_map);
        assert_eq!(second.duration, Some(6.0));
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
        loader.cache().shutdown();
    }

    #[test]
    fn decode_failure_is_reported() {
        let (loader, _) = loader_with(None);
        let result = loader.resolve(&track(), || false).unwrap();
        assert!(matches!(result, Err(GameError::Decode(_))));
        loader.cache().shutdown();
    }

    #[test]
    fn cancelled_load_yields_nothing() {
        let audio = DecodedAudio::new(pulse_train(8000, 2.0, 0.5), 8000);
        let (loader, decoder) = loader_with(Some(audio));
        assert!(loader.resolve(&track(), || true).is_none());
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
        loader.cache().shutdown();
    }

    #[test]
    fn stale_generation_sends_nothing() {
        let audio = DecodedAudio::new(pulse_train(8000, 2.0, 0.5), 8000);
        let (loader, _) = loader_with(Some(audio));
        let current = Arc::new(AtomicU64::new(2));
        let (tx, rx) = crossbeam_channel::unbounded();

        loader.spawn(track(), 1, Arc::clone(&current), tx.clone()).unwrap();
        loader.spawn(track(), 2, current, tx).unwrap();

        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.generation, 2);
        assert!(outcome.result.is_ok());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        loader.cache().shutdown();
    }

    #[test]
    fn unstartable_worker_is_an_error() {
        let (loader, decoder) = loader_with(None);
        // No address space can back this stack.
        let loader = loader.with_stack_size(usize::MAX / 2);
        let (tx, rx) = crossbeam_channel::unbounded();

        let result = loader.spawn(track(), 1, Arc::new(AtomicU64::new(1)), tx);
        assert!(matches!(result, Err(GameError::Scheduling(_))));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
        loader.cache().shutdown();
    }
}
