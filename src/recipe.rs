//! Asset recipes
//!
//! A recipe describes one asset job: which clips and silences to join,
//! what gain to apply, and where and how to export the result. Recipes
//! are plain JSON so new assets can be produced without code changes;
//! the two assets the game ships with are available as built-ins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::audio::{load_audio, save_audio, AudioAnalysis, AudioBuffer, ExportOptions};
use crate::dsp::GainEffect;
use crate::error::{ForgeError, Result};
use crate::sequence::{Segment, SegmentSpec, Sequence};

/// Directory the game serves its audio from
pub const DEFAULT_ASSET_DIR: &str = "public/audio";

/// Source clip of the bark sequence
pub const DOG_CLIP: &str = "dog.mp3";

/// Output of the bark sequence
pub const DOG_BARK_OUTPUT: &str = "dog_bark.mp3";

/// Silence after each of the three barks, in milliseconds
pub const BARK_GAPS_MS: [u32; 3] = [500, 1600, 800];

/// Water clip, boosted and re-exported in place
pub const WATER_CLIP: &str = "water.mp3";

/// Default boost applied to the water clip
pub const DEFAULT_WATER_BOOST_DB: f32 = 10.0;

/// One asset job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Label used in logs and reports
    #[serde(default)]
    pub name: Option<String>,
    /// Output file, relative to the base directory unless absolute
    pub output: PathBuf,
    /// Clips and silences, in playback order
    pub segments: Vec<SegmentSpec>,
    /// Uniform gain applied after the segments are joined
    #[serde(default)]
    pub gain_db: Option<f32>,
    #[serde(default)]
    pub export: ExportOptions,
}

/// What a recipe run produced
#[derive(Debug, Clone)]
pub struct RecipeReport {
    pub name: String,
    pub output: PathBuf,
    pub duration_secs: f32,
    pub peak_db: f32,
    pub clipped_samples: usize,
}

impl Recipe {
    pub fn new<P: Into<PathBuf>>(output: P, segments: Vec<SegmentSpec>) -> Self {
        Self {
            name: None,
            output: output.into(),
            segments,
            gain_db: None,
            export: ExportOptions::default(),
        }
    }

    /// Three barks, each followed by a silence of 500, 1600 and 800 ms
    pub fn dog_bark_sequence() -> Self {
        let segments = BARK_GAPS_MS
            .iter()
            .flat_map(|&gap| [SegmentSpec::clip(DOG_CLIP), SegmentSpec::silence(gap)])
            .collect();

        Self::new(DOG_BARK_OUTPUT, segments).with_name("dog-bark-sequence")
    }

    /// The water clip boosted by `gain_db` and written back over itself
    pub fn water_boost(gain_db: f32) -> Self {
        Self::new(WATER_CLIP, vec![SegmentSpec::clip(WATER_CLIP)])
            .with_name("water-boost")
            .with_gain(gain_db)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_gain(mut self, gain_db: f32) -> Self {
        self.gain_db = Some(gain_db);
        self
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_export(mut self, export: ExportOptions) -> Self {
        self.export = export;
        self
    }

    /// Name for logs; falls back to the output file name
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.output.display().to_string(),
        }
    }

    /// Load every recipe from a JSON file
    ///
    /// The file holds either one recipe object or an array of them.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Recipe>> {
        let contents = fs::read_to_string(path.as_ref())?;
        let recipes = if contents.trim_start().starts_with('[') {
            serde_json::from_str::<Vec<Recipe>>(&contents)?
        } else {
            vec![serde_json::from_str::<Recipe>(&contents)?]
        };

        for recipe in &recipes {
            recipe.validate()?;
        }
        debug!(
            "Loaded {} recipe(s) from {}",
            recipes.len(),
            path.as_ref().display()
        );
        Ok(recipes)
    }

    /// Write this recipe as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Find all `*.json` recipe files under `dir`, sorted by path
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir.as_ref()) {
            let entry = entry.map_err(|e| {
                ForgeError::IoError(
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory loop")),
                )
            })?;
            let is_json = entry
                .path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_json {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Check the recipe before any audio is touched
    pub fn validate(&self) -> Result<()> {
        let invalid = |details: String| ForgeError::InvalidRecipe { details };

        if self.output.as_os_str().is_empty() {
            return Err(invalid(format!("{}: output path is empty", self.display_name())));
        }
        if self.segments.is_empty() {
            return Err(invalid(format!("{}: no segments", self.display_name())));
        }
        if !self
            .segments
            .iter()
            .any(|s| matches!(s, SegmentSpec::Clip { .. }))
        {
            return Err(invalid(format!(
                "{}: needs at least one clip segment",
                self.display_name()
            )));
        }
        if let Some(gain_db) = self.gain_db {
            GainEffect::new(gain_db)?;
        }
        Ok(())
    }

    /// Load the clips, join the segments and apply gain
    pub fn render<P: AsRef<Path>>(&self, base_dir: P) -> Result<AudioBuffer> {
        let base_dir = base_dir.as_ref();
        self.validate()?;

        // Each distinct clip is decoded once, however often it repeats
        let mut clips: HashMap<PathBuf, AudioBuffer> = HashMap::new();
        for spec in &self.segments {
            if let SegmentSpec::Clip { clip } = spec {
                let path = resolve(base_dir, clip);
                if !clips.contains_key(&path) {
                    info!("Loading {}", path.display());
                    let buffer = load_audio(&path)?;
                    clips.insert(path, buffer);
                }
            }
        }

        let mut sequence = Sequence::new();
        for spec in &self.segments {
            let segment = match spec {
                SegmentSpec::Clip { clip } => {
                    let path = resolve(base_dir, clip);
                    let buffer = clips.get(&path).ok_or_else(|| ForgeError::InvalidRecipe {
                        details: format!("clip {} was not loaded", path.display()),
                    })?;
                    Segment::Clip(buffer)
                }
                SegmentSpec::Silence { silence_ms } => Segment::Silence {
                    duration_ms: *silence_ms,
                },
            };
            sequence.push(segment);
        }
        let mut output = sequence.render()?;

        if let Some(gain_db) = self.gain_db {
            GainEffect::new(gain_db)?.process(&mut output);
        }

        Ok(output)
    }

    /// Render the recipe and export it
    pub fn run<P: AsRef<Path>>(&self, base_dir: P) -> Result<RecipeReport> {
        let base_dir = base_dir.as_ref();
        let name = self.display_name();
        info!("Running recipe {}", name);

        let buffer = self.render(base_dir)?;
        let output = resolve(base_dir, &self.output);
        save_audio(&buffer, &output, &self.export)?;

        let analysis = AudioAnalysis::analyze(&buffer);
        info!(
            "Exported {} ({:.3}s, peak {:.1} dBFS)",
            output.display(),
            analysis.duration,
            analysis.peak_db
        );

        Ok(RecipeReport {
            name,
            output,
            duration_secs: analysis.duration,
            peak_db: analysis.peak_db,
            clipped_samples: analysis.clipped_samples,
        })
    }
}

/// Resolve `path` against `base_dir` unless it is absolute
fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
