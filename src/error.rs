//! Error types for sfx-forge
//!
//! All errors use the ForgeError type, providing consistent error
//! handling with a recovery hint for the CLI.

use thiserror::Error;

/// Result type alias using ForgeError
pub type Result<T> = std::result::Result<T, ForgeError>;

/// All possible errors in sfx-forge
#[derive(Error, Debug)]
pub enum ForgeError {
    // Audio I/O errors
    #[error("Failed to read audio file: {path}")]
    AudioReadError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWriteError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to decode {path}: {reason}")]
    DecodeError { path: String, reason: String },

    #[error("Failed to encode {path}: {reason}")]
    EncodeError { path: String, reason: String },

    #[error("Unsupported audio format: {details}")]
    UnsupportedFormat { details: String },

    // Processing errors
    #[error("Audio buffer is empty")]
    EmptyBuffer,

    #[error("Sequence has no clip to take a sample rate and channel layout from")]
    EmptySequence,

    #[error("Sample rate mismatch: expected {expected}, got {actual}")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: u16, actual: u16 },

    #[error("Invalid parameter: {param} = {value} (valid range: {min}..{max})")]
    InvalidParameter {
        param: String,
        value: f32,
        min: f32,
        max: f32,
    },

    // Recipe errors
    #[error("Invalid recipe: {details}")]
    InvalidRecipe { details: String },

    // Generic I/O
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForgeError {
    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::AudioReadError { .. } | Self::DecodeError { .. } => {
                "Check that the file exists and is a valid WAV or MP3 file"
            }
            Self::AudioWriteError { .. } | Self::EncodeError { .. } => {
                "Check that the output directory is writable"
            }
            Self::UnsupportedFormat { .. } => "Use a .wav or .mp3 file with mono or stereo audio",
            Self::EmptyBuffer => "Provide a clip that contains audio",
            Self::EmptySequence => "Add at least one clip segment to the sequence",
            Self::SampleRateMismatch { .. } | Self::ChannelMismatch { .. } => {
                "Convert the buffers to a common layout before joining them"
            }
            Self::InvalidParameter { .. } => "Adjust the parameter to be within valid range",
            Self::InvalidRecipe { .. } => "Fix the recipe file and run it again",
            Self::Serialization(_) => "Check the recipe file for JSON syntax errors",
            _ => "Check the error details and try again",
        }
    }
}
