//! The rhythm game controller.
//!
//! Owns the state machine (`Selecting → Loading → Playing ⇄ Paused →
//! Finished`) and everything time-related around a [`GameSession`]: the
//! reference instant music time is measured from, the lead-in, pausing and
//! end-of-track detection. All mutation happens on the caller's timeline;
//! background loads come back through a channel and are applied in
//! [`tick`](GameController::tick).

use super::audio::PlaybackTransport;
use super::decode::AudioDecoder;
use super::loader::{LoadOutcome, Resolved, TrackLoader};
use crate::analysis::{BeatDetector, DifficultyPolicy};
use crate::database::BeatMapCache;
use crate::error::GameError;
use crate::models::{Difficulty, GameState, HitAccuracy, HitStats, HitWindow, Settings, Track};
use crate::shared::snapshot::SessionSnapshot;
use crate::state::GameSession;
use crate::system::bus::SessionCommand;
use crate::system::clock::Clock;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Silence between pressing start and the first audio sample.
pub const LEAD_IN: Duration = Duration::from_secs(3);

/// How long the transport must report stopped before the track counts as over.
pub const END_SUSTAIN: Duration = Duration::from_millis(250);

/// Seconds after the last beat a track of unknown length is considered over.
pub const UNKNOWN_DURATION_TAIL: f64 = 2.0;

/// External services the controller drives.
pub struct Collaborators {
    pub decoder: Arc<dyn AudioDecoder>,
    pub cache: BeatMapCache,
    pub transport: Box<dyn PlaybackTransport>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerOptions {
    pub default_difficulty: Difficulty,
    pub lane_seed: Option<u64>,
    pub policy: DifficultyPolicy,
    pub volume: f32,
}

impl ControllerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            default_difficulty: settings.gameplay.default_difficulty,
            lane_seed: settings.gameplay.lane_seed,
            policy: settings.analysis.difficulty,
            volume: settings.gameplay.volume,
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

pub struct GameController {
    state: GameState,
    loader: TrackLoader,
    transport: Box<dyn PlaybackTransport>,
    clock: Arc<dyn Clock>,

    /// Bumped on every selection and exit; loads from older generations are
    /// stale.
    generation: Arc<AtomicU64>,
    outcome_tx: Sender<LoadOutcome>,
    outcome_rx: Receiver<LoadOutcome>,

    track: Option<Track>,
    /// Difficulty for the next start.
    difficulty: Difficulty,
    resolved: Option<Resolved>,
    session: Option<GameSession>,

    /// Clock time at which music time is zero.
    reference: Duration,
    paused_at: Option<Duration>,
    /// Music time frozen when the session finished.
    final_elapsed: f64,
    /// Clock time since which the end-of-track condition has held.
    stopped_since: Option<Duration>,

    message: Option<String>,
}

impl GameController {
    pub fn new(collaborators: Collaborators, options: ControllerOptions) -> Self {
        let Collaborators {
            decoder,
            cache,
            mut transport,
            clock,
        } = collaborators;

        let loader = TrackLoader::new(
            decoder,
            cache,
            BeatDetector::new(options.policy),
            options.lane_seed,
        );
        transport.set_volume(options.volume);
        let (outcome_tx, outcome_rx) = unbounded();

        Self {
            state: GameState::Selecting,
            loader,
            transport,
            clock,
            generation: Arc::new(AtomicU64::new(0)),
            outcome_tx,
            outcome_rx,
            track: None,
            difficulty: options.default_difficulty,
            resolved: None,
            session: None,
            reference: Duration::ZERO,
            paused_at: None,
            final_elapsed: 0.0,
            stopped_since: None,
            message: None,
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Applies a bus command. Returns `false` on [`SessionCommand::Quit`].
    pub fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::SelectTrack(track) => self.select_track(track),
            SessionCommand::StartGame(difficulty) => self.start_game(difficulty),
            SessionCommand::Tap(lane) => {
                self.tap_lane(lane);
            }
            SessionCommand::Pause => self.pause(),
            SessionCommand::Resume => self.resume(),
            SessionCommand::Retry => self.retry(),
            SessionCommand::End => self.end(),
            SessionCommand::Exit => self.exit(),
            SessionCommand::Quit => {
                self.exit();
                return false;
            }
        }
        true
    }

    /// Starts resolving `track` in the background.
    ///
    /// A selection made while another track is loading supersedes it.
    pub fn select_track(&mut self, track: Track) {
        if !matches!(self.state, GameState::Selecting | GameState::Loading) {
            log::warn!(
                "LOGIC: Ignoring track selection while {:?}, exit first",
                self.state
            );
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.message = None;
        self.resolved = None;
        self.session = None;

        self.transport.stop();
        // Failures from the previous track's start are no longer relevant.
        while self.transport.take_error().is_some() {}
        if let Err(e) = self.transport.prepare(&track) {
            log::warn!("LOGIC: {}", e);
            self.message = Some(e.to_string());
        }

        log::info!("LOGIC: Loading '{}' (generation {})", track.title, generation);
        self.track = Some(track.clone());
        self.state = GameState::Loading;
        if let Err(e) = self.loader.spawn(
            track,
            generation,
            Arc::clone(&self.generation),
            self.outcome_tx.clone(),
        ) {
            log::error!("LOGIC: {}", e);
            self.abort_load(e);
        }
    }

    /// Restarts with `difficulty`. While loading, only records the choice.
    pub fn start_game(&mut self, difficulty: Difficulty) {
        match self.state {
            GameState::Selecting => {
                log::warn!("LOGIC: No track selected");
            }
            GameState::Loading => {
                self.difficulty = difficulty;
            }
            GameState::Playing | GameState::Paused | GameState::Finished => {
                self.difficulty = difficulty;
                self.begin_play();
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.paused_at = Some(self.clock.now());
        self.transport.pause();
        self.state = GameState::Paused;
        log::info!("LOGIC: Paused at {:.2}s", self.elapsed());
    }

    pub fn resume(&mut self) {
        if self.state != GameState::Paused {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.reference += self.clock.now().saturating_sub(paused_at);
        }
        self.stopped_since = None;
        self.transport.resume();
        self.state = GameState::Playing;
        log::info!("LOGIC: Resumed at {:.2}s", self.elapsed());
    }

    /// Replays the loaded beat map from the top with the same difficulty.
    pub fn retry(&mut self) {
        if matches!(
            self.state,
            GameState::Finished | GameState::Playing | GameState::Paused
        ) {
            self.begin_play();
        }
    }

    /// Finishes the current session early.
    pub fn end(&mut self) {
        if matches!(self.state, GameState::Playing | GameState::Paused) {
            self.finish();
        }
    }

    /// Back to track selection, dropping everything about the current track.
    ///
    /// An in-flight load is cancelled without waiting for it.
    pub fn exit(&mut self) {
        if self.state == GameState::Selecting {
            return;
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.transport.stop();
        self.clear_track();
        self.state = GameState::Selecting;
        log::info!("LOGIC: Back to track selection");
    }

    /// Judges a tap in `lane` at the current music time.
    pub fn tap_lane(&mut self, lane: u8) -> Option<HitAccuracy> {
        if self.state != GameState::Playing {
            return None;
        }
        let elapsed = self.elapsed();
        self.session.as_mut()?.tap_lane(lane, elapsed)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// One step of the update loop.
    pub fn tick(&mut self) {
        self.apply_load_outcomes();
        self.poll_transport();

        if self.state != GameState::Playing {
            return;
        }
        let elapsed = self.elapsed();
        if let Some(session) = &mut self.session {
            session.update(elapsed);
        }
        self.check_end_of_track(elapsed);
    }

    fn apply_load_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            let current = self.generation.load(Ordering::Acquire);
            if outcome.generation != current || self.state != GameState::Loading {
                log::debug!(
                    "LOGIC: Discarding stale load of {} (generation {}, current {})",
                    outcome.track_id,
                    outcome.generation,
                    current
                );
                continue;
            }

            match outcome.result {
                Ok(resolved) => {
                    self.resolved = Some(resolved);
                    self.begin_play();
                }
                Err(e) => {
                    if e.aborts_session() {
                        log::error!("LOGIC: Cannot play {}: {}", outcome.track_id, e);
                    } else {
                        log::warn!("LOGIC: Load of {} failed: {}", outcome.track_id, e);
                    }
                    self.abort_load(e);
                }
            }
        }
    }

    /// Back to selection after a load that cannot produce a beat map.
    fn abort_load(&mut self, error: GameError) {
        self.transport.stop();
        self.clear_track();
        self.message = Some(error.to_string());
        self.state = GameState::Selecting;
    }

    /// Surfaces start failures the transport reported after the fact.
    fn poll_transport(&mut self) {
        while let Some(e) = self.transport.take_error() {
            log::warn!("LOGIC: {}", e);
            self.message = Some(e.to_string());
        }
    }

    /// Fresh session on the resolved beat map, audio scheduled after the
    /// lead-in.
    fn begin_play(&mut self) {
        let Some(resolved) = &self.resolved else {
            return;
        };
        let session = GameSession::new(Arc::clone(&resolved.beat_map), self.difficulty);
        let beats = session.beats().len();

        self.reference = self.clock.now() + LEAD_IN;
        self.paused_at = None;
        self.stopped_since = None;
        self.final_elapsed = 0.0;
        self.session = Some(session);
        self.state = GameState::Playing;

        if let Err(e) = self.transport.schedule_start(LEAD_IN) {
            log::warn!("LOGIC: {}", e);
            self.message = Some(e.to_string());
        }

        log::info!(
            "LOGIC: Playing {} ({} beats, {})",
            self.track.as_ref().map_or("?", |t| t.title.as_str()),
            beats,
            self.difficulty.name()
        );
    }

    /// Music time at which the track is expected to be over.
    fn end_time(&self) -> f64 {
        let duration = self
            .resolved
            .as_ref()
            .and_then(|r| r.duration)
            .or_else(|| self.track.as_ref().and_then(|t| t.duration));
        match duration {
            Some(duration) => duration - HitWindow::new().good_s,
            None => {
                let last_beat = self
                    .resolved
                    .as_ref()
                    .and_then(|r| r.beat_map.last_beat_time())
                    .unwrap_or(0.0);
                last_beat + UNKNOWN_DURATION_TAIL
            }
        }
    }

    fn check_end_of_track(&mut self, elapsed: f64) {
        if elapsed < self.end_time() || self.transport.is_playing() {
            self.stopped_since = None;
            return;
        }
        let now = self.clock.now();
        let since = *self.stopped_since.get_or_insert(now);
        if now.saturating_sub(since) >= END_SUSTAIN {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.final_elapsed = self.elapsed();
        self.transport.stop();
        self.paused_at = None;
        self.stopped_since = None;
        self.state = GameState::Finished;
        if let Some(session) = &self.session {
            log::info!(
                "LOGIC: Finished with {} points, max combo {}, {:.2}% ({} perfect, {} good, {} miss)",
                session.score,
                session.max_combo,
                session.accuracy(),
                session.hit_stats.perfect,
                session.hit_stats.good,
                session.hit_stats.miss
            );
        }
    }

    fn clear_track(&mut self) {
        self.track = None;
        self.resolved = None;
        self.session = None;
        self.paused_at = None;
        self.stopped_since = None;
        self.final_elapsed = 0.0;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Music time in seconds; negative during the lead-in.
    pub fn elapsed(&self) -> f64 {
        match self.state {
            GameState::Playing => self.music_time_at(self.clock.now()),
            GameState::Paused => self
                .paused_at
                .map_or(0.0, |paused_at| self.music_time_at(paused_at)),
            GameState::Finished => self.final_elapsed,
            GameState::Selecting | GameState::Loading => 0.0,
        }
    }

    fn music_time_at(&self, now: Duration) -> f64 {
        now.as_secs_f64() - self.reference.as_secs_f64()
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn score(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.score)
    }

    pub fn combo(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.combo)
    }

    pub fn max_combo(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.max_combo)
    }

    pub fn hit_stats(&self) -> HitStats {
        self.session
            .as_ref()
            .map(|s| s.hit_stats.clone())
            .unwrap_or_default()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn take_message(&mut self) -> Option<String> {
        self.message.take()
    }

    pub fn cache(&self) -> &BeatMapCache {
        self.loader.cache()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            state: self.state,
            elapsed: self.elapsed(),
            track_title: self.track.as_ref().map(|t| t.title.clone()),
            difficulty: self.difficulty,
            message: self.message.clone(),
            ..SessionSnapshot::default()
        };
        if let Some(session) = &self.session {
            snapshot.tiles = session.tile_views();
            snapshot.score = session.score;
            snapshot.combo = session.combo;
            snapshot.max_combo = session.max_combo;
            snapshot.hit_stats = session.hit_stats.clone();
            snapshot.accuracy = session.accuracy();
            snapshot.last_accuracy = session.last_accuracy();
        }
        snapshot
    }
}
