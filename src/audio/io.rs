//! Audio file I/O operations
//!
//! WAV files are read and written with the hound crate. MP3 files are
//! decoded with symphonia and encoded with LAME.

use std::fs::File;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, warn};
use mp3lame_encoder::{Bitrate, Builder, FlushGap, InterleavedPcm, MonoPcm, Quality};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::AudioBuffer;
use crate::error::{ForgeError, Result};

/// MP3 bitrates accepted for export, in kbps
pub const SUPPORTED_BITRATES: [u32; 7] = [64, 96, 128, 160, 192, 256, 320];

/// Default MP3 bitrate (kbps)
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Default WAV bit depth
pub const DEFAULT_WAV_BITS: u16 = 16;

/// Space LAME asks for when flushing its last frames
const LAME_FLUSH_RESERVE: usize = 7200;

/// Container/codec of an audio file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    /// Determine the format from a file extension (case-insensitive)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("wav") => Ok(Self::Wav),
            Some("mp3") => Ok(Self::Mp3),
            _ => Err(ForgeError::UnsupportedFormat {
                details: format!("{} (expected .wav or .mp3)", path.display()),
            }),
        }
    }
}

/// Encoder settings for exported files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output format; inferred from the output extension when unset
    pub format: Option<AudioFormat>,
    /// MP3 constant bitrate in kbps
    pub bitrate_kbps: u32,
    /// WAV bit depth (16, 24 or 32; 32 writes IEEE float)
    pub wav_bits: u16,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: None,
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            wav_bits: DEFAULT_WAV_BITS,
        }
    }
}

impl ExportOptions {
    /// Resolve the format to write `path` with
    pub fn format_for<P: AsRef<Path>>(&self, path: P) -> Result<AudioFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => AudioFormat::from_path(path),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load an audio file, choosing the decoder from its extension
pub fn load_audio<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let buffer = match AudioFormat::from_path(path)? {
        AudioFormat::Wav => load_wav(path)?,
        AudioFormat::Mp3 => load_mp3(path)?,
    };
    debug!(
        "Loaded {} ({} ch @ {} Hz, {:.3}s)",
        path.display(),
        buffer.channels(),
        buffer.sample_rate(),
        buffer.duration()
    );
    Ok(buffer)
}

/// Load a WAV file into an AudioBuffer
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|e| ForgeError::AudioReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let spec = reader.spec();
    let channels = spec.channels;
    let sample_rate = spec.sample_rate;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| {
                s.map_err(|e| ForgeError::AudioReadError {
                    path: path.display().to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<f32>>>()?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1u32 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| {
                    s.map(|v| v as f32 / max_val)
                        .map_err(|e| ForgeError::AudioReadError {
                            path: path.display().to_string(),
                            source: e,
                        })
                })
                .collect::<Result<Vec<f32>>>()?
        }
    };

    AudioBuffer::new(samples, channels, sample_rate)
}

/// Decode an MP3 file into an AudioBuffer
pub fn load_mp3<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let decode_err = |reason: String| ForgeError::DecodeError {
        path: path.display().to_string(),
        reason,
    };

    let file = File::open(path).map_err(|e| decode_err(e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let format_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;
    let mut format = probed.format;

    let (track_id, codec_params) = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| decode_err("no supported audio track found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut signal: Option<SignalSpec> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if let Some(first) = signal {
                    if first.rate != spec.rate || first.channels.count() != spec.channels.count() {
                        return Err(decode_err(
                            "stream changes sample rate or channel layout mid-file".to_string(),
                        ));
                    }
                }
                signal.get_or_insert(spec);

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(sample_buf.samples());
            }
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!("Skipping corrupt packet in {}: {}", path.display(), reason);
            }
            Err(e) => return Err(decode_err(e.to_string())),
        }
    }

    let spec = signal.ok_or(ForgeError::EmptyBuffer)?;
    AudioBuffer::new(samples, spec.channels.count() as u16, spec.rate)
}

// ============================================================================
// Saving
// ============================================================================

/// Save a buffer, choosing the encoder from the options or the extension
///
/// Missing parent directories are created.
pub fn save_audio<P: AsRef<Path>>(
    buffer: &AudioBuffer,
    path: P,
    options: &ExportOptions,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let written = match options.format_for(path)? {
        AudioFormat::Wav => save_wav_with_depth(buffer, path, options.wav_bits),
        AudioFormat::Mp3 => save_mp3(buffer, path, options.bitrate_kbps),
    };
    written?;

    debug!("Wrote {} ({:.3}s)", path.display(), buffer.duration());
    Ok(())
}

/// Save an AudioBuffer to a WAV file (32-bit float)
pub fn save_wav<P: AsRef<Path>>(buffer: &AudioBuffer, path: P) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| ForgeError::AudioWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    for &sample in buffer.samples() {
        writer
            .write_sample(sample)
            .map_err(|e| ForgeError::AudioWriteError {
                path: path.display().to_string(),
                source: e,
            })?;
    }

    writer.finalize().map_err(|e| ForgeError::AudioWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Save an AudioBuffer to a WAV file with specific bit depth
pub fn save_wav_with_depth<P: AsRef<Path>>(
    buffer: &AudioBuffer,
    path: P,
    bits: u16,
) -> Result<()> {
    let path = path.as_ref();

    if bits == 32 {
        return save_wav(buffer, path);
    }
    if bits != 16 && bits != 24 {
        return Err(ForgeError::InvalidParameter {
            param: "wav_bits".to_string(),
            value: bits as f32,
            min: 16.0,
            max: 32.0,
        });
    }

    let spec = WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bits,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| ForgeError::AudioWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    let max_val = ((1u32 << (bits - 1)) - 1) as f32;

    for &sample in buffer.samples() {
        let clamped = sample.clamp(-1.0, 1.0);
        let int_sample = (clamped * max_val) as i32;
        writer
            .write_sample(int_sample)
            .map_err(|e| ForgeError::AudioWriteError {
                path: path.display().to_string(),
                source: e,
            })?;
    }

    writer.finalize().map_err(|e| ForgeError::AudioWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Map a kbps value onto a LAME bitrate
pub fn bitrate_from_kbps(kbps: u32) -> Result<Bitrate> {
    let bitrate = match kbps {
        64 => Bitrate::Kbps64,
        96 => Bitrate::Kbps96,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => {
            return Err(ForgeError::InvalidParameter {
                param: "bitrate_kbps".to_string(),
                value: kbps as f32,
                min: SUPPORTED_BITRATES[0] as f32,
                max: SUPPORTED_BITRATES[SUPPORTED_BITRATES.len() - 1] as f32,
            })
        }
    };
    Ok(bitrate)
}

/// Encode an AudioBuffer to a constant-bitrate MP3 file
///
/// Only mono and stereo buffers can be encoded.
pub fn save_mp3<P: AsRef<Path>>(buffer: &AudioBuffer, path: P, bitrate_kbps: u32) -> Result<()> {
    let path = path.as_ref();
    let encode_err = |reason: String| ForgeError::EncodeError {
        path: path.display().to_string(),
        reason,
    };

    let channels = buffer.channels();
    if channels > 2 {
        return Err(ForgeError::UnsupportedFormat {
            details: format!("MP3 export needs mono or stereo audio, got {} channels", channels),
        });
    }
    let bitrate = bitrate_from_kbps(bitrate_kbps)?;

    let mut builder =
        Builder::new().ok_or_else(|| encode_err("LAME failed to initialize".to_string()))?;
    builder
        .set_num_channels(channels as u8)
        .map_err(|e| encode_err(format!("{:?}", e)))?;
    builder
        .set_sample_rate(buffer.sample_rate())
        .map_err(|e| encode_err(format!("{:?}", e)))?;
    builder
        .set_brate(bitrate)
        .map_err(|e| encode_err(format!("{:?}", e)))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| encode_err(format!("{:?}", e)))?;
    // Reserves the first frame for the Info/LAME tag carrying delay and padding
    builder
        .set_to_write_vbr_tag(true)
        .map_err(|e| encode_err(format!("{:?}", e)))?;
    let mut encoder = builder.build().map_err(|e| encode_err(format!("{:?}", e)))?;

    let pcm: Vec<i16> = buffer.samples().iter().map(|&s| to_pcm16(s)).collect();

    let mut mp3 = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(
        buffer.num_frames(),
    ));
    let encoded = if channels == 1 {
        encoder.encode_to_vec(MonoPcm(pcm.as_slice()), &mut mp3)
    } else {
        encoder.encode_to_vec(InterleavedPcm(pcm.as_slice()), &mut mp3)
    };
    encoded.map_err(|e| encode_err(format!("{:?}", e)))?;

    mp3.reserve(LAME_FLUSH_RESERVE);
    encoder
        .flush_to_vec::<FlushGap>(&mut mp3)
        .map_err(|e| encode_err(format!("{:?}", e)))?;

    // The tag is only complete once the whole stream is encoded
    let mut tag = Vec::with_capacity(encoder.lame_tag_size());
    match encoder.lame_tag_encode_to_vec(&mut tag) {
        Some(size) if size.get() <= mp3.len() => mp3[..size.get()].copy_from_slice(&tag),
        _ => return Err(encode_err("LAME did not produce an info tag".to_string())),
    }

    std::fs::write(path, &mp3)?;
    Ok(())
}

/// Convert a float sample to 16-bit PCM, saturating at full scale
fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
