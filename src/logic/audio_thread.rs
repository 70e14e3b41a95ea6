//! Dedicated audio thread that handles all audio operations.
//!
//! This prevents file decoding and device calls from blocking the logic thread.

use super::audio::AudioCommand;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// How often the playing flag is refreshed while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

struct AudioWorker {
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    sink: Option<Sink>,
    current_path: Option<PathBuf>,
    volume: f32,
    playing: Arc<AtomicBool>,
    failures: Sender<String>,
}

impl AudioWorker {
    fn new(playing: Arc<AtomicBool>, failures: Sender<String>) -> Self {
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok((stream, handle)) => {
                log::info!("AUDIO: Device found, audio enabled");
                (Some(stream), Some(handle))
            }
            Err(e) => {
                log::warn!(
                    "AUDIO: No audio device found ({}), running in silent mode",
                    e
                );
                (None, None)
            }
        };
        Self {
            _stream: stream,
            stream_handle,
            sink: None,
            current_path: None,
            volume: 1.0,
            playing,
            failures,
        }
    }

    /// Returns `false` when the thread should stop.
    fn handle_command(&mut self, cmd: AudioCommand) -> bool {
        match cmd {
            AudioCommand::Load { path } => {
                self.stop_sink();
                self.current_path = Some(path);
            }
            AudioCommand::ScheduleStart { delay } => {
                if let Err(reason) = self.start_after(delay) {
                    log::error!("AUDIO: {}", reason);
                    let _ = self.failures.send(reason);
                }
            }
            AudioCommand::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
            }
            AudioCommand::Resume => {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
            }
            AudioCommand::Stop => {
                self.stop_sink();
            }
            AudioCommand::SetVolume { volume } => {
                self.volume = volume;
                if let Some(sink) = &self.sink {
                    sink.set_volume(volume);
                }
            }
            AudioCommand::Shutdown => {
                self.stop_sink();
                return false;
            }
        }
        true
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Opens and decodes the loaded file even without a device, so a bad
    /// file is reported in silent mode too.
    fn start_after(&mut self, delay: Duration) -> Result<(), String> {
        self.stop_sink();

        let Some(path) = &self.current_path else {
            return Err("start requested with nothing loaded".to_string());
        };
        let file = File::open(path).map_err(|e| format!("cannot open {:?}: {}", path, e))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("cannot decode {:?}: {}", path, e))?;

        // Skip if no audio device available
        let Some(stream_handle) = &self.stream_handle else {
            return Ok(());
        };
        let sink =
            Sink::try_new(stream_handle).map_err(|e| format!("failed to create sink: {}", e))?;

        sink.set_volume(self.volume);
        sink.append(source.delay(delay));
        sink.play();
        self.sink = Some(sink);
        log::info!("AUDIO: Playback starts in {:.2}s", delay.as_secs_f64());
        Ok(())
    }

    fn refresh_playing(&self) {
        let playing = self
            .sink
            .as_ref()
            .is_some_and(|sink| !sink.empty() && !sink.is_paused());
        self.playing.store(playing, Ordering::Release);
    }
}

fn run(rx: Receiver<AudioCommand>, playing: Arc<AtomicBool>, failures: Sender<String>) {
    log::info!("AUDIO: Thread started");
    let mut worker = AudioWorker::new(playing, failures);

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(cmd) => {
                if !worker.handle_command(cmd) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        worker.refresh_playing();
    }

    worker.playing.store(false, Ordering::Release);
    log::info!("AUDIO: Thread stopped");
}

/// Starts the dedicated audio thread and returns its command channel.
///
/// Failed scheduled starts are reported on `failures`.
pub fn start_audio_thread(playing: Arc<AtomicBool>, failures: Sender<String>) -> Sender<AudioCommand> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("Audio Thread".to_string())
        .spawn(move || run(rx, playing, failures))
        .expect("Failed to spawn Audio thread");
    tx
}
