//! Channels between the logic thread and whoever drives it.
//!
//! Front-ends (the binary's bot, a UI, tests) push [`SessionCommand`]s in and
//! read [`SessionSnapshot`]s out; they never touch the controller directly.

use crate::models::{Difficulty, Track};
use crate::shared::snapshot::SessionSnapshot;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

/// Requests handled on the logic thread, in arrival order.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    SelectTrack(Track),
    StartGame(Difficulty),
    Tap(u8),
    Pause,
    Resume,
    Retry,
    End,
    Exit,
    /// Stops the logic thread.
    Quit,
}

#[derive(Clone)]
pub struct SessionBus {
    /// Front-end → Logic.
    pub command_tx: Sender<SessionCommand>,
    pub command_rx: Receiver<SessionCommand>,

    /// Logic → Front-end.
    pub snapshot_tx: Sender<SessionSnapshot>,
    pub snapshot_rx: Receiver<SessionSnapshot>,
}

impl SessionBus {
    pub fn new() -> Self {
        let (command_tx, command_rx) = unbounded();

        // Bounded snapshot channel: max 2 queued to limit latency
        let (snapshot_tx, snapshot_rx) = bounded(2);

        Self {
            command_tx,
            command_rx,
            snapshot_tx,
            snapshot_rx,
        }
    }

    /// Queues a command; `false` once the logic thread is gone.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.command_tx.send(command).is_ok()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}
