//! Integration Tests
//!
//! End-to-end tests for the asset pipelines: decode, join, gain, encode.

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use sfx_forge::audio::verification::{
    calculate_peak, calculate_rms_db, onset_ms, samples_between, ONSET_THRESHOLD_DB,
};
use sfx_forge::audio::{load_audio, load_wav, save_mp3, save_wav, AudioAnalysis, AudioBuffer};
use sfx_forge::cli::commands;
use sfx_forge::recipe::{Recipe, BARK_GAPS_MS, DEFAULT_WATER_BOOST_DB};
use sfx_forge::sequence::SegmentSpec;
use sfx_forge::ForgeError;

/// Short decaying tone standing in for a bark
fn bark(sample_rate: u32) -> AudioBuffer {
    let mut buffer = AudioBuffer::sine_wave(600.0, 0.3, sample_rate);
    let frames = buffer.num_frames() as f32;
    for (i, sample) in buffer.samples_mut().iter_mut().enumerate() {
        *sample *= 0.8 * (1.0 - i as f32 / frames);
    }
    buffer.with_channels(2).unwrap()
}

/// Steady tone standing in for running water
fn water(level_db: f32) -> AudioBuffer {
    let mut buffer = AudioBuffer::sine_wave(220.0, 1.0, 44100);
    buffer.apply_gain_db(level_db);
    buffer
}

fn write_mp3(buffer: &AudioBuffer, path: &Path) {
    save_mp3(buffer, path, 192).unwrap();
}

/// One MPEG-1 layer III frame at 44.1 kHz, in seconds
const MP3_FRAME_SECS: f32 = 1152.0 / 44100.0;

// === Built-in Assets ===

#[test]
fn test_bark_sequence_from_mp3() {
    let dir = tempdir().unwrap();
    write_mp3(&bark(44100), &dir.path().join("dog.mp3"));

    let report = Recipe::dog_bark_sequence().run(dir.path()).unwrap();
    assert_eq!(report.output, dir.path().join("dog_bark.mp3"));
    assert!(report.output.exists());

    let dog = load_audio(dir.path().join("dog.mp3")).unwrap();
    let sequence = load_audio(&report.output).unwrap();
    let gaps: u32 = BARK_GAPS_MS.iter().sum();
    let expected = 3.0 * dog.duration() + gaps as f32 / 1000.0;

    assert_eq!(sequence.channels(), 2);
    assert_eq!(sequence.sample_rate(), 44100);
    assert!(
        (sequence.duration() - expected).abs() < MP3_FRAME_SECS,
        "Expected ~{:.3}s, got {:.3}s",
        expected,
        sequence.duration()
    );

    // Middle of the first gap is silent
    let gap_start = (dog.duration() * 1000.0) as u64;
    let gap = samples_between(&sequence, gap_start + 100, gap_start + 400);
    assert!(!gap.is_empty());
    assert!(calculate_peak(gap) < 0.01);

    // The bark itself survives the round trip
    assert!(calculate_peak(samples_between(&sequence, 0, gap_start)) > 0.3);
}

#[test]
fn test_bark_sequence_exact_in_wav() {
    let dir = tempdir().unwrap();
    let dog = bark(22050);
    save_wav(&dog, dir.path().join("dog.wav")).unwrap();

    let segments = Recipe::dog_bark_sequence()
        .segments
        .into_iter()
        .map(|s| match s {
            SegmentSpec::Clip { .. } => SegmentSpec::clip("dog.wav"),
            silence => silence,
        })
        .collect();
    let recipe = Recipe::new("dog_bark.wav", segments);
    recipe.run(dir.path()).unwrap();

    let sequence = load_wav(dir.path().join("dog_bark.wav")).unwrap();
    let expected_frames = 3 * dog.num_frames() + (500 + 1600 + 800) * 22050 / 1000;
    assert_eq!(sequence.num_frames(), expected_frames);

    // Each gap holds only zeros, each bark starts where expected
    let bark_ms = dog.duration_ms();
    let mut cursor = 0;
    for gap in BARK_GAPS_MS {
        let bark_end = cursor + bark_ms;
        assert!(calculate_peak(samples_between(&sequence, cursor, bark_end)) > 0.3);
        assert_eq!(
            calculate_peak(samples_between(&sequence, bark_end + 1, bark_end + gap as u64 - 1)),
            0.0
        );
        cursor = bark_end + gap as u64;
    }
}

#[test]
fn test_water_boost_raises_level() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("water.mp3");
    write_mp3(&water(-20.0), &path);
    let before = load_audio(&path).unwrap();

    let report = Recipe::water_boost(DEFAULT_WATER_BOOST_DB)
        .run(dir.path())
        .unwrap();
    assert_eq!(report.output, path);
    assert_eq!(report.clipped_samples, 0);

    let after = load_audio(&path).unwrap();
    let boost = calculate_rms_db(after.samples()) - calculate_rms_db(before.samples());
    assert!(
        (boost - DEFAULT_WATER_BOOST_DB).abs() < 0.5,
        "Expected ~{} dB boost, got {:.2} dB",
        DEFAULT_WATER_BOOST_DB,
        boost
    );
    assert!((after.duration() - before.duration()).abs() < MP3_FRAME_SECS);
}

#[test]
fn test_repeated_water_boost_keeps_timing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("water.mp3");

    let mut source = AudioBuffer::silence(300, 1, 44100).unwrap();
    source.append(&water(-30.0)).unwrap();
    write_mp3(&source, &path);
    let before = load_audio(&path).unwrap();

    for _ in 0..2 {
        Recipe::water_boost(6.0).run(dir.path()).unwrap();
    }
    let after = load_audio(&path).unwrap();

    let onset_before = onset_ms(&before, ONSET_THRESHOLD_DB).unwrap();
    let onset_after = onset_ms(&after, ONSET_THRESHOLD_DB).unwrap();
    assert!(
        onset_after.abs_diff(onset_before) as f32 / 1000.0 < MP3_FRAME_SECS,
        "Onset moved from {} ms to {} ms",
        onset_before,
        onset_after
    );
    assert!((after.duration() - before.duration()).abs() < MP3_FRAME_SECS);
    assert_relative_eq!(
        calculate_rms_db(after.samples()) - calculate_rms_db(before.samples()),
        12.0,
        epsilon = 0.5
    );
}

#[test]
fn test_gain_saturates_at_full_scale() {
    let dir = tempdir().unwrap();
    save_wav(&water(-3.0), dir.path().join("loud.wav")).unwrap();

    let report = Recipe::new("louder.wav", vec![SegmentSpec::clip("loud.wav")])
        .with_gain(DEFAULT_WATER_BOOST_DB)
        .run(dir.path())
        .unwrap();
    assert!(report.clipped_samples > 0);

    let output = load_wav(dir.path().join("louder.wav")).unwrap();
    let analysis = AudioAnalysis::analyze(&output);
    assert!(analysis.peak_linear <= 1.0);
    assert!(analysis.is_clipping());
}

// === Layout Handling ===

#[test]
fn test_mixed_layouts_are_harmonized() {
    let dir = tempdir().unwrap();
    save_wav(&AudioBuffer::sine_wave(440.0, 0.5, 22050), dir.path().join("mono.wav")).unwrap();
    save_wav(&bark(44100), dir.path().join("stereo.wav")).unwrap();

    let output = Recipe::new(
        "mixed.wav",
        vec![
            SegmentSpec::clip("mono.wav"),
            SegmentSpec::silence(200),
            SegmentSpec::clip("stereo.wav"),
        ],
    )
    .render(dir.path())
    .unwrap();

    assert_eq!(output.channels(), 2);
    assert_eq!(output.sample_rate(), 44100);
    assert_relative_eq!(output.duration(), 0.5 + 0.2 + 0.3, epsilon = 0.001);
}

// === Recipe Files ===

#[test]
fn test_run_recipe_directory() {
    let dir = tempdir().unwrap();
    let assets = dir.path().join("assets");
    fs::create_dir_all(&assets).unwrap();
    save_wav(&bark(44100), assets.join("dog.wav")).unwrap();

    fs::write(
        dir.path().join("recipes.json"),
        r#"[
            {"name": "double", "output": "out/double.wav",
             "segments": [{"clip": "dog.wav"}, {"silence_ms": 250}, {"clip": "dog.wav"}]},
            {"name": "quiet", "output": "out/quiet.mp3",
             "segments": [{"clip": "dog.wav"}], "gain_db": -12.0,
             "export": {"bitrate_kbps": 96}}
        ]"#,
    )
    .unwrap();

    commands::run(dir.path(), Some(assets.as_path())).unwrap();

    let double = load_audio(assets.join("out/double.wav")).unwrap();
    assert_relative_eq!(double.duration(), 0.85, epsilon = 0.001);

    let quiet = load_audio(assets.join("out/quiet.mp3")).unwrap();
    let original = load_audio(assets.join("dog.wav")).unwrap();
    assert!(calculate_peak(quiet.samples()) < calculate_peak(original.samples()) * 0.5);
}

#[test]
fn test_concat_and_gain_resolve_against_dir() {
    let dir = tempdir().unwrap();
    save_wav(&bark(22050), dir.path().join("dog.wav")).unwrap();

    let segments = vec![
        SegmentSpec::clip("dog.wav"),
        SegmentSpec::silence(200),
        SegmentSpec::clip("dog.wav"),
    ];
    commands::concat(dir.path(), Path::new("pair.wav"), &segments, 128).unwrap();
    let pair = load_wav(dir.path().join("pair.wav")).unwrap();
    assert_relative_eq!(pair.duration(), 0.8, epsilon = 0.001);

    commands::gain(dir.path(), Path::new("pair.wav"), Path::new("quiet.wav"), -6.0, 128).unwrap();
    let quiet = load_wav(dir.path().join("quiet.wav")).unwrap();
    assert_relative_eq!(
        calculate_rms_db(quiet.samples()) - calculate_rms_db(pair.samples()),
        -6.0,
        epsilon = 0.1
    );
}

#[test]
fn test_run_rejects_bad_recipe_before_decoding() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{"output": "out.wav", "segments": [{"silence_ms": 100}]}"#,
    )
    .unwrap();

    assert!(matches!(
        commands::run(&path, None),
        Err(ForgeError::InvalidRecipe { .. })
    ));
}

#[test]
fn test_run_empty_directory() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        commands::run(dir.path(), None),
        Err(ForgeError::InvalidRecipe { .. })
    ));
}

#[test]
fn test_unsupported_output_format() {
    let dir = tempdir().unwrap();
    save_wav(&bark(44100), dir.path().join("dog.wav")).unwrap();

    let result = Recipe::new("dog.ogg", vec![SegmentSpec::clip("dog.wav")]).run(dir.path());
    assert!(matches!(result, Err(ForgeError::UnsupportedFormat { .. })));
}

#[test]
fn test_inspect_reports_on_exported_asset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.mp3");
    write_mp3(&water(-6.0), &path);

    commands::inspect(&path).unwrap();
    assert!(commands::inspect(&dir.path().join("missing.mp3")).is_err());
}
