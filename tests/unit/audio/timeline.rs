use super::*;

fn secs(t: &AudioTimeline) -> f64 {
    t.duration_secs()
}

#[test]
fn starts_empty_without_sound() {
    let t = AudioTimeline::new();
    assert!(!t.includes_sound());
    assert_eq!(t.frames(), 0);
}

#[test]
fn negative_start_is_invalid_and_changes_nothing() {
    let mut t = AudioTimeline::new();
    let clip = AudioClip::silence(1.0, MIX_SAMPLE_RATE, 2).unwrap();
    let err = t.overlay(&clip, -0.1, None).unwrap_err();
    assert!(matches!(err, WeaveError::InvalidArgument(_)));
    assert!(t.overlay(&clip, f64::NAN, None).is_err());
    assert!(!t.includes_sound());
    assert_eq!(t.frames(), 0);
}

#[test]
fn gap_between_clips_is_silence() {
    let mut t = AudioTimeline::new();
    let c1 = AudioClip::new(MIX_SAMPLE_RATE, 2, vec![0.25; 2 * 2 * 48_000]).unwrap();
    let c2 = AudioClip::new(MIX_SAMPLE_RATE, 2, vec![0.5; 2 * 48_000]).unwrap();
    t.overlay(&c1, 0.0, None).unwrap();
    t.overlay(&c2, 5.0, None).unwrap();

    assert!(secs(&t) >= 5.0 + c2.duration_secs() - 1e-9);
    let s = t.samples();
    assert_eq!(s[0], 0.25);
    let gap = &s[2 * 2 * 48_000..2 * 5 * 48_000];
    assert!(gap.iter().all(|v| *v == 0.0));
    assert_eq!(s[2 * 5 * 48_000], 0.5);
}

#[test]
fn overlapping_clips_mix_additively() {
    let mut t = AudioTimeline::new();
    let c = AudioClip::new(MIX_SAMPLE_RATE, 2, vec![0.25; 2 * 4_800]).unwrap();
    t.overlay(&c, 0.0, None).unwrap();
    t.overlay(&c, 0.05, None).unwrap();
    // 0.05s = 2400 frames in: overlap region sums.
    assert_eq!(t.samples()[2 * 100], 0.25);
    assert_eq!(t.samples()[2 * 3_000], 0.5);
    assert_eq!(t.frames(), 2_400 + 4_800);
    assert_eq!(t.placements(), 2);
}

#[test]
fn gain_and_background_ducking() {
    let mut t = AudioTimeline::new();
    let bed = AudioClip::new(MIX_SAMPLE_RATE, 2, vec![0.5; 2 * 1_000]).unwrap();
    let hit = AudioClip::new(MIX_SAMPLE_RATE, 2, vec![0.5; 2 * 100]).unwrap();
    t.overlay(&bed, 0.0, None).unwrap();
    t.overlay_ducked(&hit, 0.0, Some(-20.0), Some(-6.0)).unwrap();
    let v = t.samples()[0];
    let expected = 0.5 * db_to_amplitude(-6.0) + 0.5 * db_to_amplitude(-20.0);
    assert!((v - expected).abs() < 1e-6);
    // Outside the hit the bed is untouched.
    assert_eq!(t.samples()[2 * 500], 0.5);
}

#[test]
fn export_pads_to_final_duration() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = AudioTimeline::new();
    let c = AudioClip::tone(220.0, 1.0, 22_050, 0.3).unwrap();
    t.overlay(&c, 0.5, None).unwrap();

    let path = dir.path().join("mix.wav");
    t.export_wav(&path, 3.0).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let data_len = u32::from_le_bytes(bytes[40..44].try_into().unwrap()) as usize;
    assert_eq!(data_len, 3 * 48_000 * 2 * 2);
    // The timeline itself is not padded by exporting.
    assert!((t.duration_secs() - 1.5).abs() < 1e-3);

    // Shorter final duration never truncates.
    t.export_wav(&path, 0.1).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let data_len = u32::from_le_bytes(bytes[40..44].try_into().unwrap()) as usize;
    assert_eq!(data_len, t.frames() * 2 * 2);
}

#[test]
fn starting_at_rebases_the_track() {
    let mut t = AudioTimeline::new();
    let c = AudioClip::new(MIX_SAMPLE_RATE, 2, vec![0.5; 2 * 4_800]).unwrap();
    t.overlay(&c, 2.0, None).unwrap();

    let cut = t.starting_at(1.5);
    assert!(cut.includes_sound());
    assert!((cut.duration_secs() - 0.6).abs() < 1e-9);
    let onset = cut.samples().iter().position(|&s| s != 0.0).unwrap();
    assert_eq!(onset, 2 * 24_000);

    // Cutting past the end leaves no samples.
    assert_eq!(t.starting_at(10.0).frames(), 0);
}
