//! Clip sequences
//!
//! A sequence places clips and silences one after another and renders
//! them into a single buffer. Clips with different layouts are converted
//! to the widest channel count and highest sample rate present before
//! they are joined; silences are synthesized directly in that layout.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::error::{ForgeError, Result};

/// Prefix marking a silence in the textual segment syntax (`silence:500`)
const SILENCE_PREFIX: &str = "silence:";

/// One placed element of a sequence
#[derive(Debug, Clone, Copy)]
pub enum Segment<'a> {
    /// A decoded clip, placed as-is
    Clip(&'a AudioBuffer),
    /// All-zero spacer of the given length
    Silence { duration_ms: u32 },
}

/// Ordered list of clips and silences
#[derive(Debug, Default, Clone)]
pub struct Sequence<'a> {
    segments: Vec<Segment<'a>>,
    layout: Option<(u16, u32)>,
}

impl<'a> Sequence<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the output channel count and sample rate instead of deriving
    /// them from the clips
    ///
    /// Both must be non-zero; `render` rejects the layout otherwise.
    pub fn with_layout(mut self, channels: u16, sample_rate: u32) -> Self {
        self.layout = Some((channels, sample_rate));
        self
    }

    /// Append a clip
    pub fn clip(mut self, buffer: &'a AudioBuffer) -> Self {
        self.segments.push(Segment::Clip(buffer));
        self
    }

    /// Append a silence of `duration_ms` milliseconds
    pub fn silence(mut self, duration_ms: u32) -> Self {
        self.segments.push(Segment::Silence { duration_ms });
        self
    }

    pub fn push(&mut self, segment: Segment<'a>) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Channel count and sample rate the rendered sequence will have
    pub fn layout(&self) -> Result<(u16, u32)> {
        if let Some(layout) = self.layout {
            return Ok(layout);
        }

        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Clip(buffer) => Some((buffer.channels(), buffer.sample_rate())),
                Segment::Silence { .. } => None,
            })
            .reduce(|(ch, rate), (c, r)| (ch.max(c), rate.max(r)))
            .ok_or(ForgeError::EmptySequence)
    }

    /// Render all segments, in order, into a single buffer
    pub fn render(&self) -> Result<AudioBuffer> {
        let (channels, sample_rate) = self.layout()?;
        let mut output = AudioBuffer::silence(0, channels, sample_rate)?;

        for segment in &self.segments {
            match segment {
                Segment::Clip(buffer) => {
                    if buffer.channels() == channels && buffer.sample_rate() == sample_rate {
                        output.append(buffer)?;
                    } else {
                        debug!(
                            "Converting clip from {} ch @ {} Hz to {} ch @ {} Hz",
                            buffer.channels(),
                            buffer.sample_rate(),
                            channels,
                            sample_rate
                        );
                        let converted = buffer.with_channels(channels)?.resample(sample_rate)?;
                        output.append(&converted)?;
                    }
                }
                Segment::Silence { duration_ms } => {
                    output.append(&AudioBuffer::silence(*duration_ms, channels, sample_rate)?)?;
                }
            }
        }

        debug!(
            "Rendered {} segments into {:.3}s",
            self.segments.len(),
            output.duration()
        );
        Ok(output)
    }
}

/// Join buffers end to end, harmonizing their layouts first
pub fn concatenate(buffers: &[AudioBuffer]) -> Result<AudioBuffer> {
    buffers
        .iter()
        .fold(Sequence::new(), |sequence, buffer| sequence.clip(buffer))
        .render()
}

/// Serializable description of a segment, before any audio is loaded
///
/// In JSON a segment is either `{"clip": "path"}` or `{"silence_ms": 500}`.
/// On the command line it is either a path or `silence:<ms>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentSpec {
    Clip { clip: PathBuf },
    Silence { silence_ms: u32 },
}

impl SegmentSpec {
    pub fn clip<P: Into<PathBuf>>(path: P) -> Self {
        Self::Clip { clip: path.into() }
    }

    pub fn silence(duration_ms: u32) -> Self {
        Self::Silence {
            silence_ms: duration_ms,
        }
    }
}

impl FromStr for SegmentSpec {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ForgeError::InvalidRecipe {
                details: "empty segment".to_string(),
            });
        }

        match s.strip_prefix(SILENCE_PREFIX) {
            Some(ms) => {
                let duration_ms = ms.trim().parse::<u32>().map_err(|_| ForgeError::InvalidRecipe {
                    details: format!("invalid silence duration '{}' (expected milliseconds)", ms),
                })?;
                Ok(Self::silence(duration_ms))
            }
            None => Ok(Self::clip(s)),
        }
    }
}

impl fmt::Display for SegmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clip { clip } => write!(f, "{}", clip.display()),
            Self::Silence { silence_ms } => write!(f, "{}{}", SILENCE_PREFIX, silence_ms),
        }
    }
}
