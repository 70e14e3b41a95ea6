//! Thread plumbing: the session bus and time sources.

pub mod bus;
pub mod clock;

pub use bus::{SessionBus, SessionCommand};
pub use clock::{Clock, ManualClock, MonotonicClock};
