use super::*;
use crate::foundation::core::{Canvas, Rgba8};

fn spec(dir: &Path, name: &str) -> EncodeSpec {
    EncodeSpec {
        canvas: Canvas {
            width: 16,
            height: 16,
        },
        fps: Fps::integer(10).unwrap(),
        out_path: dir.join(name),
        keep_alpha: false,
        background: Rgba8::BLACK,
    }
}

#[test]
fn missing_program_fails_to_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let tool = FfmpegTool::with_program("sceneweave-no-such-ffmpeg");
    assert!(tool.spawn_encoder(&spec(dir.path(), "a.mp4")).is_err());
    assert!(matches!(
        tool.concat(&dir.path().join("list.txt"), &dir.path().join("out.mp4")),
        Err(WeaveError::Assembly(_))
    ));
}

#[test]
fn ensure_parent_dir_creates_nested_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a/b/c/out.mp4");
    ensure_parent_dir(&target).unwrap();
    assert!(dir.path().join("a/b/c").is_dir());
}

#[test]
fn encodes_frames_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let s = spec(dir.path(), "clip.mp4");
    let mut pipe = FfmpegTool::new().spawn_encoder(&s).unwrap();
    let frame = Frame::solid(s.canvas, Rgba8::rgb(200, 10, 10));
    for _ in 0..5 {
        pipe.write_frame(&frame).unwrap();
    }
    let exit = pipe.close().unwrap();
    assert!(exit.success, "{}", exit.detail);
    assert!(s.out_path.metadata().unwrap().len() > 0);
}

#[test]
fn wrong_frame_size_is_rejected() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let s = spec(dir.path(), "clip.mp4");
    let mut pipe = FfmpegTool::new().spawn_encoder(&s).unwrap();
    let small = Frame::solid(
        Canvas {
            width: 2,
            height: 2,
        },
        Rgba8::BLACK,
    );
    assert!(matches!(
        pipe.write_frame(&small),
        Err(WeaveError::InvalidArgument(_))
    ));
    // No frames: the encoder may succeed or fail, but closing must not hang.
    let _ = pipe.close().unwrap();
}
