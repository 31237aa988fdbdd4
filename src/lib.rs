//! sfx-forge - Derived Sound Asset Builder
//!
//! sfx-forge turns existing clips into the sound assets a game ships with:
//! 1. Sequences: clips joined with silences of chosen lengths
//! 2. Boosts: clips re-exported with a uniform gain change
//!
//! # Pipeline
//!
//! Every job is a single pass: decode (WAV or MP3) into an [`AudioBuffer`],
//! join segments with [`sequence::Sequence`], apply [`dsp`] gain, then
//! encode back to disk. [`recipe::Recipe`] describes a
//! job declaratively and is what the CLI runs.

pub mod audio;
pub mod cli;
pub mod dsp;
pub mod error;
pub mod recipe;
pub mod sequence;

// Re-export commonly used types
pub use audio::AudioBuffer;
pub use error::{ForgeError, Result};
pub use recipe::Recipe;
