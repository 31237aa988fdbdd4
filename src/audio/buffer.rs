//! Audio buffer implementation
//!
//! AudioBuffer is the core data structure for holding audio samples.

use crate::error::{ForgeError, Result};

/// Full-scale sample magnitude; gain results are saturated to this
pub const FULL_SCALE: f32 = 1.0;

/// Audio sample data with metadata
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Interleaved audio samples normalized to -1.0..1.0
    samples: Vec<f32>,
    /// Number of audio channels (1 = mono, 2 = stereo)
    channels: u16,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new audio buffer with the given parameters
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(ForgeError::EmptyBuffer);
        }
        if channels == 0 || sample_rate == 0 {
            return Err(ForgeError::UnsupportedFormat {
                details: format!("{} channels @ {} Hz", channels, sample_rate),
            });
        }
        if samples.len() % channels as usize != 0 {
            return Err(ForgeError::UnsupportedFormat {
                details: format!(
                    "Sample count {} is not divisible by channel count {}",
                    samples.len(),
                    channels
                ),
            });
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Create a silent buffer lasting `duration_ms` milliseconds
    ///
    /// The frame count is rounded to the nearest whole frame, so a
    /// zero-length silence is a valid, empty buffer.
    pub fn silence(duration_ms: u32, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(ForgeError::UnsupportedFormat {
                details: format!("silence at {} channels @ {} Hz", channels, sample_rate),
            });
        }
        Ok(Self::zeros(duration_ms, channels, sample_rate))
    }

    /// Create a silent buffer with the same layout as `other`
    pub fn silence_like(other: &AudioBuffer, duration_ms: u32) -> Self {
        Self::zeros(duration_ms, other.channels, other.sample_rate)
    }

    fn zeros(duration_ms: u32, channels: u16, sample_rate: u32) -> Self {
        let frames = (duration_ms as u64 * sample_rate as u64 + 500) / 1000;
        Self {
            samples: vec![0.0; frames as usize * channels as usize],
            channels,
            sample_rate,
        }
    }

    /// Create a sine wave test tone
    pub fn sine_wave(frequency: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let mut samples = Vec::with_capacity(num_samples);

        for i in 0..num_samples {
            let t = i as f32 / sample_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * frequency * t).sin();
            samples.push(sample);
        }

        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get a mutable reference to the samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Get the number of channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Get the duration in seconds
    pub fn duration(&self) -> f32 {
        self.num_frames() as f32 / self.sample_rate as f32
    }

    /// Get the duration in whole milliseconds (rounded)
    pub fn duration_ms(&self) -> u64 {
        (self.num_frames() as u64 * 1000 + self.sample_rate as u64 / 2) / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get samples for a specific channel (0-indexed)
    pub fn channel_samples(&self, channel: u16) -> Vec<f32> {
        if channel >= self.channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(channel as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Apply gain in linear scale
    ///
    /// Results are saturated to full scale. Returns the number of
    /// samples that had to be clipped.
    pub fn apply_gain(&mut self, gain: f32) -> usize {
        let mut clipped = 0;
        for sample in &mut self.samples {
            let scaled = *sample * gain;
            if scaled.abs() > FULL_SCALE {
                clipped += 1;
            }
            *sample = scaled.clamp(-FULL_SCALE, FULL_SCALE);
        }
        clipped
    }

    /// Apply gain in decibels
    pub fn apply_gain_db(&mut self, gain_db: f32) -> usize {
        let gain_linear = 10.0_f32.powf(gain_db / 20.0);
        self.apply_gain(gain_linear)
    }

    /// Append another buffer with the same layout to the end of this one
    pub fn append(&mut self, other: &AudioBuffer) -> Result<()> {
        if self.channels != other.channels {
            return Err(ForgeError::ChannelMismatch {
                expected: self.channels,
                actual: other.channels,
            });
        }
        if self.sample_rate != other.sample_rate {
            return Err(ForgeError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: other.sample_rate,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Convert to a different channel count
    ///
    /// Mono is duplicated into every output channel; any layout folds down
    /// to mono by averaging. Other conversions are not supported.
    pub fn with_channels(&self, channels: u16) -> Result<AudioBuffer> {
        if channels == self.channels {
            return Ok(self.clone());
        }

        let samples = if self.channels == 1 && channels > 1 {
            self.samples
                .iter()
                .flat_map(|&s| std::iter::repeat(s).take(channels as usize))
                .collect()
        } else if channels == 1 {
            self.samples
                .chunks(self.channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect()
        } else {
            return Err(ForgeError::UnsupportedFormat {
                details: format!(
                    "cannot convert {} channels to {} channels",
                    self.channels, channels
                ),
            });
        };

        Ok(Self {
            samples,
            channels,
            sample_rate: self.sample_rate,
        })
    }

    /// Resample to `target_rate` using linear interpolation
    pub fn resample(&self, target_rate: u32) -> Result<AudioBuffer> {
        if target_rate == 0 {
            return Err(ForgeError::UnsupportedFormat {
                details: "target sample rate of 0 Hz".to_string(),
            });
        }
        if target_rate == self.sample_rate || self.is_empty() {
            return Ok(Self {
                samples: self.samples.clone(),
                channels: self.channels,
                sample_rate: target_rate,
            });
        }

        let channels = self.channels as usize;
        let input_frames = self.num_frames();
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let output_frames = (input_frames as f64 / ratio).round() as usize;

        let mut samples = Vec::with_capacity(output_frames * channels);
        for i in 0..output_frames {
            let src_pos = i as f64 * ratio;
            let idx0 = (src_pos.floor() as usize).min(input_frames - 1);
            let idx1 = (idx0 + 1).min(input_frames - 1);
            let t = (src_pos - src_pos.floor()) as f32;

            for ch in 0..channels {
                let s0 = self.samples[idx0 * channels + ch];
                let s1 = self.samples[idx1 * channels + ch];
                samples.push(s0 + (s1 - s0) * t);
            }
        }

        Ok(Self {
            samples,
            channels: self.channels,
            sample_rate: target_rate,
        })
    }

    /// Check if buffers are identical (bit-perfect comparison)
    pub fn is_identical_to(&self, other: &AudioBuffer) -> bool {
        self.channels == other.channels
            && self.sample_rate == other.sample_rate
            && self.samples == other.samples
    }

    /// Check if buffers are approximately equal within tolerance
    pub fn is_approx_equal(&self, other: &AudioBuffer, tolerance: f32) -> bool {
        if self.channels != other.channels || self.sample_rate != other.sample_rate {
            return false;
        }
        if self.samples.len() != other.samples.len() {
            return false;
        }
        self.samples
            .iter()
            .zip(other.samples.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}
