use super::*;

#[test]
fn rejects_bad_layouts() {
    assert!(AudioClip::new(0, 1, vec![]).is_err());
    assert!(AudioClip::new(48_000, 0, vec![]).is_err());
    assert!(AudioClip::new(48_000, 2, vec![0.0; 3]).is_err());
}

#[test]
fn duration_from_frames() {
    let c = AudioClip::silence(2.0, 48_000, 2).unwrap();
    assert_eq!(c.frames(), 96_000);
    assert_eq!(c.samples.len(), 192_000);
    assert!((c.duration_secs() - 2.0).abs() < 1e-12);
}

#[test]
fn gain_scales_samples() {
    let c = AudioClip::new(10, 1, vec![0.5, -0.5]).unwrap();
    let quiet = c.with_gain_db(-20.0);
    assert!((quiet.samples[0] - 0.05).abs() < 1e-6);
    assert!((quiet.samples[1] + 0.05).abs() < 1e-6);
}

#[test]
fn mono_to_stereo_duplicates() {
    let c = AudioClip::new(10, 1, vec![0.1, 0.2, 0.3]).unwrap();
    let s = c.to_layout(10, 2).unwrap();
    assert_eq!(*s.samples, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
}

#[test]
fn stereo_to_mono_averages() {
    let c = AudioClip::new(10, 2, vec![1.0, 0.0, 0.5, 0.5]).unwrap();
    let m = c.to_layout(10, 1).unwrap();
    assert_eq!(*m.samples, vec![0.5, 0.5]);
}

#[test]
fn upsampling_keeps_duration() {
    let c = AudioClip::tone(440.0, 0.5, 24_000, 0.5).unwrap();
    let up = c.to_layout(48_000, 2).unwrap();
    assert_eq!(up.frames(), 24_000);
    assert!((up.duration_secs() - c.duration_secs()).abs() < 1e-9);
}
