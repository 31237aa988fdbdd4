//! Measurements for exported assets
//!
//! Levels, clipping and timing of a decoded buffer, plus a checksum of the
//! file it came from. Used by `inspect` and by recipe reports.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::audio::{AudioBuffer, FULL_SCALE};
use crate::error::Result;

/// Samples at or above this magnitude count as clipped
const CLIP_THRESHOLD: f32 = FULL_SCALE * 0.9999;

/// Level below which a sample is treated as silence when locating onset
pub const ONSET_THRESHOLD_DB: f32 = -60.0;

/// Convert linear amplitude to decibels
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Level, clipping and timing of one buffer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAnalysis {
    pub duration: f32,
    pub channels: u16,
    pub sample_rate: u32,
    /// RMS over all channels, dBFS
    pub rms_db: f32,
    pub peak_linear: f32,
    pub peak_db: f32,
    pub clipped_samples: usize,
    /// Time of the first sample above [`ONSET_THRESHOLD_DB`]; `None` if silent
    pub onset_ms: Option<u64>,
}

impl AudioAnalysis {
    pub fn analyze(buffer: &AudioBuffer) -> Self {
        let samples = buffer.samples();
        let peak_linear = calculate_peak(samples);

        Self {
            duration: buffer.duration(),
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
            rms_db: calculate_rms_db(samples),
            peak_linear,
            peak_db: linear_to_db(peak_linear),
            clipped_samples: count_clipped_samples(samples),
            onset_ms: onset_ms(buffer, ONSET_THRESHOLD_DB),
        }
    }

    /// Any sample sits at full scale
    pub fn is_clipping(&self) -> bool {
        self.clipped_samples > 0
    }
}

impl fmt::Display for AudioAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Duration: {:.3}s | {} ch @ {} Hz",
            self.duration, self.channels, self.sample_rate
        )?;
        write!(f, "RMS: {:.1} dBFS | Peak: {:.1} dBFS", self.rms_db, self.peak_db)?;
        match self.onset_ms {
            Some(ms) => write!(f, "\nOnset: {} ms", ms)?,
            None => write!(f, "\nOnset: silent")?,
        }
        if self.is_clipping() {
            write!(f, "\nClipping: {} samples", self.clipped_samples)?;
        }
        Ok(())
    }
}

/// Root mean square of samples
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

pub fn calculate_rms_db(samples: &[f32]) -> f32 {
    linear_to_db(calculate_rms(samples))
}

/// Largest absolute sample value
pub fn calculate_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

pub fn count_clipped_samples(samples: &[f32]) -> usize {
    samples.iter().filter(|s| s.abs() >= CLIP_THRESHOLD).count()
}

/// Time of the first frame where any channel exceeds `threshold_db`
pub fn onset_ms(buffer: &AudioBuffer, threshold_db: f32) -> Option<u64> {
    let threshold = 10.0_f32.powf(threshold_db / 20.0);
    let index = buffer.samples().iter().position(|s| s.abs() > threshold)?;
    let frame = (index / buffer.channels() as usize) as u64;
    Some(frame * 1000 / buffer.sample_rate() as u64)
}

/// Interleaved samples between two points in time (milliseconds)
///
/// The range is clamped to the buffer.
pub fn samples_between(buffer: &AudioBuffer, start_ms: u64, end_ms: u64) -> &[f32] {
    let channels = buffer.channels() as usize;
    let frame_at = |ms: u64| {
        let frame = (ms * buffer.sample_rate() as u64 / 1000) as usize;
        frame.min(buffer.num_frames())
    };
    let start = frame_at(start_ms);
    let end = frame_at(end_ms).max(start);
    &buffer.samples()[start * channels..end * channels]
}

/// SHA-256 of a file as lowercase hex
pub fn file_checksum<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut file = fs::File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
