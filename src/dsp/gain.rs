//! Uniform gain
//!
//! The one adjustment an asset gets after its segments are joined.

use log::{debug, warn};

use crate::audio::AudioBuffer;
use crate::error::{ForgeError, Result};

/// Minimum gain in dB (-96 dB = effectively silent)
pub const MIN_GAIN_DB: f32 = -96.0;

/// Maximum gain in dB (+24 dB)
pub const MAX_GAIN_DB: f32 = 24.0;

/// Range-checked gain in decibels
///
/// Every sample is scaled by the same factor; results beyond full scale
/// are clipped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GainEffect {
    gain_db: f32,
}

impl GainEffect {
    /// Create a gain, rejecting values outside -96..+24 dB
    pub fn new(gain_db: f32) -> Result<Self> {
        if !gain_db.is_finite() || !(MIN_GAIN_DB..=MAX_GAIN_DB).contains(&gain_db) {
            return Err(ForgeError::InvalidParameter {
                param: "gain_db".to_string(),
                value: gain_db,
                min: MIN_GAIN_DB,
                max: MAX_GAIN_DB,
            });
        }
        Ok(Self { gain_db })
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Apply the gain in place, returning how many samples clipped
    pub fn process(&self, buffer: &mut AudioBuffer) -> usize {
        // Unity gain leaves the buffer untouched
        if self.gain_db == 0.0 {
            return 0;
        }

        let clipped = buffer.apply_gain_db(self.gain_db);
        debug!("Applied {:+.1} dB gain", self.gain_db);
        if clipped > 0 {
            warn!(
                "Gain of {:+.1} dB clipped {} of {} samples",
                self.gain_db,
                clipped,
                buffer.samples().len()
            );
        }
        clipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::verification::calculate_rms_db;
    use test_case::test_case;

    #[test_case(-12.0, -6.0 ; "cut")]
    #[test_case(-20.0, 10.0 ; "boost")]
    fn test_gain_changes_rms(level_db: f32, gain_db: f32) {
        let mut buffer = AudioBuffer::sine_wave(440.0, 1.0, 44100);
        buffer.apply_gain_db(level_db);
        let original_rms = calculate_rms_db(buffer.samples());

        let clipped = GainEffect::new(gain_db).unwrap().process(&mut buffer);

        assert_eq!(clipped, 0);
        let new_rms = calculate_rms_db(buffer.samples());
        assert!((new_rms - (original_rms + gain_db)).abs() < 0.1);
    }

    #[test]
    fn test_unity_gain_is_bit_exact() {
        let mut buffer = AudioBuffer::sine_wave(440.0, 0.2, 44100);
        let original = buffer.clone();

        assert_eq!(GainEffect::default().process(&mut buffer), 0);
        assert!(buffer.is_identical_to(&original));
    }

    #[test]
    fn test_gain_reports_clipping() {
        let mut buffer = AudioBuffer::sine_wave(440.0, 0.2, 44100);
        let clipped = GainEffect::new(MAX_GAIN_DB).unwrap().process(&mut buffer);

        assert!(clipped > 0);
        assert!(buffer.samples().iter().all(|s| s.abs() <= 1.0));
    }

    #[test_case(30.0 ; "above range")]
    #[test_case(-200.0 ; "below range")]
    #[test_case(f32::NAN ; "not a number")]
    fn test_gain_out_of_range(gain_db: f32) {
        assert!(matches!(
            GainEffect::new(gain_db),
            Err(ForgeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_gain_range_is_inclusive() {
        assert_eq!(GainEffect::new(MIN_GAIN_DB).unwrap().gain_db(), MIN_GAIN_DB);
        assert_eq!(GainEffect::new(MAX_GAIN_DB).unwrap().gain_db(), MAX_GAIN_DB);
    }
}
