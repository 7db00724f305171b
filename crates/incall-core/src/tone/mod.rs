//! Tone playback: selector resolution and the per-kind player

pub mod player;
pub mod resolver;

pub use player::{ToneCompleted, ToneCompletedSender, TonePlayer};
pub use resolver::ToneResolver;
