//! Audio buffer and I/O utilities
//!
//! This module provides the core audio data structures and file I/O.

mod buffer;
mod io;
pub mod verification;

pub use buffer::{AudioBuffer, FULL_SCALE};
pub use io::{
    bitrate_from_kbps, load_audio, load_mp3, load_wav, save_audio, save_mp3, save_wav,
    save_wav_with_depth, AudioFormat, ExportOptions, DEFAULT_BITRATE_KBPS, DEFAULT_WAV_BITS,
    SUPPORTED_BITRATES,
};
pub use verification::AudioAnalysis;
