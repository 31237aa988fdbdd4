//! DSP
//!
//! Processing applied to a rendered asset before export. Only uniform gain
//! is provided.

pub mod gain;

pub use gain::{GainEffect, MAX_GAIN_DB, MIN_GAIN_DB};
