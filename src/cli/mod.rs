//! CLI Module
//!
//! Command-line interface for building sound assets.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::audio::DEFAULT_BITRATE_KBPS;
use crate::recipe::{DEFAULT_ASSET_DIR, DEFAULT_WATER_BOOST_DB};
use crate::sequence::SegmentSpec;

/// sfx-forge - build derived sound assets from existing clips
#[derive(Parser, Debug)]
#[command(name = "sfx-forge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the dog bark sequence (three barks with 500/1600/800 ms gaps)
    #[command(name = "bark-sequence")]
    BarkSequence {
        /// Directory holding dog.mp3
        #[arg(short, long, default_value = DEFAULT_ASSET_DIR)]
        dir: PathBuf,

        /// Output file (default: dog_bark.mp3 in the asset directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// MP3 bitrate in kbps
        #[arg(short, long, default_value_t = DEFAULT_BITRATE_KBPS)]
        bitrate: u32,
    },

    /// Boost the water clip and re-export it
    #[command(name = "water-boost")]
    WaterBoost {
        /// Directory holding water.mp3
        #[arg(short, long, default_value = DEFAULT_ASSET_DIR)]
        dir: PathBuf,

        /// Gain in decibels
        #[arg(short, long, default_value_t = DEFAULT_WATER_BOOST_DB, allow_negative_numbers = true)]
        gain_db: f32,

        /// Output file (default: overwrite water.mp3)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// MP3 bitrate in kbps
        #[arg(short, long, default_value_t = DEFAULT_BITRATE_KBPS)]
        bitrate: u32,
    },

    /// Join clips and silences into one file
    #[command(name = "concat")]
    Concat {
        /// Base directory for relative segment and output paths
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Output file (.wav or .mp3)
        #[arg(short, long)]
        output: PathBuf,

        /// Segments in order: a file path or silence:<ms>
        #[arg(required = true, num_args = 1..)]
        segments: Vec<SegmentSpec>,

        /// MP3 bitrate in kbps
        #[arg(short, long, default_value_t = DEFAULT_BITRATE_KBPS)]
        bitrate: u32,
    },

    /// Apply a uniform gain to a clip
    #[command(name = "gain")]
    Gain {
        /// Base directory for relative input and output paths
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Gain in decibels (-96 to +24)
        #[arg(long, allow_negative_numbers = true)]
        db: f32,

        /// MP3 bitrate in kbps
        #[arg(short, long, default_value_t = DEFAULT_BITRATE_KBPS)]
        bitrate: u32,
    },

    /// Run a recipe file, or every recipe under a directory
    #[command(name = "run")]
    Run {
        /// Recipe file or directory
        path: PathBuf,

        /// Base directory for relative paths (default: the recipe's directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Print measurements and checksum of an audio file
    #[command(name = "inspect")]
    Inspect {
        /// Audio file to inspect
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_concat_segments() {
        let cli = Cli::parse_from([
            "sfx-forge", "concat", "-o", "out.mp3", "dog.mp3", "silence:500", "dog.mp3",
        ]);
        match cli.command {
            Some(Commands::Concat {
                output, segments, ..
            }) => {
                assert_eq!(output, PathBuf::from("out.mp3"));
                assert_eq!(
                    segments,
                    vec![
                        SegmentSpec::clip("dog.mp3"),
                        SegmentSpec::silence(500),
                        SegmentSpec::clip("dog.mp3"),
                    ]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_negative_gain() {
        let cli = Cli::parse_from(["sfx-forge", "gain", "-i", "a.wav", "-o", "b.wav", "--db", "-6"]);
        match cli.command {
            Some(Commands::Gain { db, .. }) => assert_eq!(db, -6.0),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_water_boost_defaults() {
        let cli = Cli::parse_from(["sfx-forge", "water-boost"]);
        match cli.command {
            Some(Commands::WaterBoost {
                dir,
                gain_db,
                output,
                bitrate,
            }) => {
                assert_eq!(dir, PathBuf::from("public/audio"));
                assert_eq!(gain_db, 10.0);
                assert!(output.is_none());
                assert_eq!(bitrate, 128);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_concat_and_gain_base_dir() {
        let cli = Cli::parse_from(["sfx-forge", "concat", "-o", "o.wav", "a.wav"]);
        match cli.command {
            Some(Commands::Concat { dir, .. }) => assert_eq!(dir, PathBuf::from(".")),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from([
            "sfx-forge", "gain", "-d", "public/audio", "-i", "a.wav", "-o", "b.wav", "--db", "3",
        ]);
        match cli.command {
            Some(Commands::Gain { dir, .. }) => assert_eq!(dir, PathBuf::from("public/audio")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_silence_is_rejected() {
        let result = Cli::try_parse_from(["sfx-forge", "concat", "-o", "o.wav", "silence:x"]);
        assert!(result.is_err());
    }
}
