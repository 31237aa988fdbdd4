//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::audio::verification::file_checksum;
use crate::audio::{load_audio, AudioAnalysis, ExportOptions};
use crate::error::{ForgeError, Result};
use crate::recipe::{Recipe, RecipeReport, DOG_BARK_OUTPUT, WATER_CLIP};
use crate::sequence::SegmentSpec;

/// Build the dog bark sequence from `dir/dog.mp3`.
pub fn bark_sequence(dir: &Path, output: Option<&Path>, bitrate_kbps: u32) -> Result<()> {
    let output = output.map_or_else(|| PathBuf::from(DOG_BARK_OUTPUT), Path::to_path_buf);
    let recipe = Recipe::dog_bark_sequence()
        .with_output(output)
        .with_export(mp3_export(bitrate_kbps));

    let report = recipe.run(dir)?;
    print_report(&report);
    Ok(())
}

/// Boost `dir/water.mp3` and re-export it.
pub fn water_boost(dir: &Path, gain_db: f32, output: Option<&Path>, bitrate_kbps: u32) -> Result<()> {
    let output = output.map_or_else(|| PathBuf::from(WATER_CLIP), Path::to_path_buf);
    let recipe = Recipe::water_boost(gain_db)
        .with_output(output)
        .with_export(mp3_export(bitrate_kbps));

    let report = recipe.run(dir)?;
    print_report(&report);
    Ok(())
}

/// Join arbitrary clips and silences; relative paths resolve against `dir`.
pub fn concat(dir: &Path, output: &Path, segments: &[SegmentSpec], bitrate_kbps: u32) -> Result<()> {
    info!("Joining {} segments into {}", segments.len(), output.display());

    let recipe = Recipe::new(output, segments.to_vec()).with_export(mp3_export(bitrate_kbps));
    let report = recipe.run(dir)?;
    print_report(&report);
    Ok(())
}

/// Apply a uniform gain to one clip; relative paths resolve against `dir`.
pub fn gain(dir: &Path, input: &Path, output: &Path, gain_db: f32, bitrate_kbps: u32) -> Result<()> {
    info!("Applying {:+.1} dB to {}", gain_db, input.display());

    let recipe = Recipe::new(output, vec![SegmentSpec::clip(input)])
        .with_gain(gain_db)
        .with_export(mp3_export(bitrate_kbps));
    let report = recipe.run(dir)?;
    print_report(&report);
    Ok(())
}

/// Run a recipe file, or every recipe file under a directory.
pub fn run(path: &Path, dir: Option<&Path>) -> Result<()> {
    let files = if path.is_dir() {
        Recipe::discover(path)?
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        return Err(ForgeError::InvalidRecipe {
            details: format!("no recipe files found in {}", path.display()),
        });
    }

    let mut completed = 0;
    for file in &files {
        let base_dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => file.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        for recipe in Recipe::load(file)? {
            let report = recipe.run(&base_dir)?;
            print_report(&report);
            completed += 1;
        }
    }

    println!("Completed {} recipe(s)", completed);
    Ok(())
}

/// Print measurements and checksum of an audio file.
pub fn inspect(file: &Path) -> Result<()> {
    info!("Inspecting: {}", file.display());

    let buffer = load_audio(file)?;
    let analysis = AudioAnalysis::analyze(&buffer);

    println!("File: {}", file.display());
    println!("{:-<60}", "");
    println!("{}", analysis);
    println!("SHA-256: {}", file_checksum(file)?);

    Ok(())
}

fn mp3_export(bitrate_kbps: u32) -> ExportOptions {
    ExportOptions {
        bitrate_kbps,
        ..Default::default()
    }
}

fn print_report(report: &RecipeReport) {
    if report.clipped_samples > 0 {
        warn!(
            "{}: {} samples at full scale",
            report.name, report.clipped_samples
        );
    }
    println!(
        "Created {} ({:.2}s, peak {:.1} dBFS)",
        report.output.display(),
        report.duration_secs,
        report.peak_db
    );
}
