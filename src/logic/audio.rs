//! Playback transport that sends commands to the dedicated audio thread.
//!
//! The controller only sees [`PlaybackTransport`]; the rodio implementation
//! forwards every call through a channel so gameplay never blocks on the
//! audio device.

use super::audio_thread;
use crate::error::GameError;
use crate::models::Track;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Commands sent to the dedicated audio thread.
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Remember a file for the next scheduled start.
    Load { path: PathBuf },
    /// Start the loaded file after `delay` of silence.
    ScheduleStart { delay: Duration },
    Pause,
    Resume,
    /// Stop and forget the current sink.
    Stop,
    /// 0.0 to 1.0
    SetVolume { volume: f32 },
    Shutdown,
}

/// Audio output as the controller drives it.
pub trait PlaybackTransport: Send {
    /// Readies `track` for a later [`schedule_start`](Self::schedule_start).
    fn prepare(&mut self, track: &Track) -> Result<(), GameError>;

    /// Begins playback `after` from now.
    fn schedule_start(&mut self, after: Duration) -> Result<(), GameError>;

    /// Whether audio is currently coming out.
    fn is_playing(&self) -> bool;

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    fn set_volume(&mut self, _volume: f32) {}

    /// A failure the output reported after a call had already returned,
    /// such as a scheduled start whose file could not be opened.
    fn take_error(&mut self) -> Option<GameError> {
        None
    }
}

/// Wrapper for sending commands to the audio thread.
///
/// The `RodioTransport` does not perform audio operations directly; the audio
/// thread owns the output stream, publishes whether the sink is playing and
/// reports start failures back on `failure_rx`.
pub struct RodioTransport {
    cmd_tx: Sender<AudioCommand>,
    playing: Arc<AtomicBool>,
    failure_rx: Receiver<String>,
}

impl RodioTransport {
    /// Starts the audio thread and returns a handle to it.
    pub fn start(volume: f32) -> Self {
        let playing = Arc::new(AtomicBool::new(false));
        let (failure_tx, failure_rx) = unbounded();
        let cmd_tx = audio_thread::start_audio_thread(Arc::clone(&playing), failure_tx);
        let _ = cmd_tx.send(AudioCommand::SetVolume { volume });
        Self {
            cmd_tx,
            playing,
            failure_rx,
        }
    }

    fn send(&self, cmd: AudioCommand) -> Result<(), GameError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| GameError::Scheduling("audio thread is not running".to_string()))
    }
}

impl PlaybackTransport for RodioTransport {
    fn prepare(&mut self, track: &Track) -> Result<(), GameError> {
        self.send(AudioCommand::Load {
            path: track.path.clone(),
        })
    }

    fn schedule_start(&mut self, after: Duration) -> Result<(), GameError> {
        self.send(AudioCommand::ScheduleStart { delay: after })
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn pause(&mut self) {
        let _ = self.send(AudioCommand::Pause);
    }

    fn resume(&mut self) {
        let _ = self.send(AudioCommand::Resume);
    }

    fn stop(&mut self) {
        let _ = self.send(AudioCommand::Stop);
    }

    fn set_volume(&mut self, volume: f32) {
        let _ = self.send(AudioCommand::SetVolume {
            volume: volume.clamp(0.0, 1.0),
        });
    }

    fn take_error(&mut self) -> Option<GameError> {
        self.failure_rx.try_recv().ok().map(GameError::Scheduling)
    }
}

impl Drop for RodioTransport {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
    }
}
