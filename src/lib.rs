//! Beat detection and a four-lane tap rhythm game mode for an offline music
//! player.
//!
//! Tracks are analysed once into a [`models::BeatMap`] (see [`analysis`]),
//! cached per track (see [`database`]) and played by the
//! [`logic::GameController`] on its own thread.

pub mod analysis;
pub mod database;
pub mod error;
pub mod logic;
pub mod models;
pub mod shared;
pub mod state;
pub mod system;
