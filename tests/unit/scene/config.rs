use super::*;

#[test]
fn defaults_validate() {
    SceneConfig::default().validate().unwrap();
    WriterConfig::default().validate().unwrap();
    assert_eq!(SceneConfig::default().random_seed, Some(0));
}

#[test]
fn partial_json_fills_defaults() {
    let cfg: SceneConfig =
        serde_json::from_str(r#"{ "name": "Intro", "fps": { "num": 24, "den": 1 } }"#).unwrap();
    assert_eq!(cfg.name, "Intro");
    assert_eq!(cfg.fps, Fps { num: 24, den: 1 });
    assert_eq!(cfg.canvas, Quality::Low.canvas());
    assert!(!cfg.skip_animations);
}

#[test]
fn invalid_settings_are_rejected() {
    let odd = SceneConfig {
        canvas: Canvas {
            width: 101,
            height: 100,
        },
        ..SceneConfig::default()
    };
    assert!(odd.validate().is_err());

    let zero_fps = SceneConfig {
        fps: Fps { num: 0, den: 1 },
        ..SceneConfig::default()
    };
    assert!(zero_fps.validate().is_err());

    let bad_range = SceneConfig {
        start_at_animation: Some(3),
        end_at_animation: Some(3),
        ..SceneConfig::default()
    };
    assert!(bad_range.validate().is_err());

    let bad_name = SceneConfig {
        name: "a/b".to_owned(),
        ..SceneConfig::default()
    };
    assert!(bad_name.validate().is_err());

    let bad_ext = WriterConfig {
        movie_extension: ".avi".to_owned(),
        ..WriterConfig::default()
    };
    assert!(matches!(
        bad_ext.validate(),
        Err(WeaveError::InvalidArgument(_))
    ));
}

#[test]
fn quality_preset_sets_canvas_and_fps() {
    let cfg = SceneConfig::default().with_quality(Quality::High);
    assert_eq!(cfg.canvas, Canvas { width: 1920, height: 1080 });
    assert_eq!(cfg.fps, Fps { num: 60, den: 1 });
    assert!(WriterConfig {
        movie_extension: ".mov".to_owned(),
        ..WriterConfig::default()
    }
    .keeps_alpha());
}
