//! Gameplay state.
//!
//! `GameSession` holds the tiles and counters of one play-through. It has no
//! notion of wall time or audio; the controller feeds it music time.

pub mod game;

pub use game::{GameSession, LAST_ACCURACY_SECONDS};
