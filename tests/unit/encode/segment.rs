use super::*;
use crate::encode::tool::PipeExit;
use std::io::Write as _;

#[derive(Default)]
struct FakeTool {
    exit_ok: bool,
    fail_write_at: Option<u64>,
}

struct FakePipe {
    file: std::fs::File,
    written: u64,
    exit_ok: bool,
    fail_write_at: Option<u64>,
}

impl EncoderPipe for FakePipe {
    fn write_frame(&mut self, frame: &Frame) -> WeaveResult<()> {
        if self.fail_write_at == Some(self.written) {
            return Err(WeaveError::render("broken pipe"));
        }
        self.file.write_all(&frame.data).unwrap();
        self.written += 1;
        Ok(())
    }

    fn close(self: Box<Self>) -> WeaveResult<PipeExit> {
        Ok(if self.exit_ok {
            PipeExit::ok()
        } else {
            PipeExit::failed("exit status 1: boom")
        })
    }
}

impl MediaTool for FakeTool {
    fn spawn_encoder(&self, spec: &EncodeSpec) -> WeaveResult<Box<dyn EncoderPipe>> {
        Ok(Box::new(FakePipe {
            file: std::fs::File::create(&spec.out_path).unwrap(),
            written: 0,
            exit_ok: self.exit_ok,
            fail_write_at: self.fail_write_at,
        }))
    }

    fn concat(&self, _manifest: &Path, _out: &Path) -> WeaveResult<PipeExit> {
        unreachable!()
    }

    fn mux_audio(&self, _: &Path, _: &Path, _: &Path, _: &str) -> WeaveResult<PipeExit> {
        unreachable!()
    }
}

fn format() -> SegmentFormat {
    SegmentFormat {
        canvas: Canvas {
            width: 2,
            height: 2,
        },
        fps: Fps::integer(30).unwrap(),
        extension: ".mp4".to_owned(),
        keep_alpha: false,
        background: Rgba8::BLACK,
    }
}

fn frame() -> Frame {
    Frame::solid(format().canvas, Rgba8::WHITE)
}

#[test]
fn paths_are_five_digit() {
    let (f, t) = segment_paths(Path::new("/x"), 7, ".mp4");
    assert_eq!(f, PathBuf::from("/x/00007.mp4"));
    assert_eq!(t, PathBuf::from("/x/00007_temp.mp4"));
}

#[test]
fn clean_close_renames_into_place() {
    let dir = tempfile::tempdir().unwrap();
    let tool = FakeTool {
        exit_ok: true,
        ..FakeTool::default()
    };
    let mut enc = SegmentEncoder::open(&tool, dir.path(), 3, &format()).unwrap();
    enc.write(&frame()).unwrap();
    enc.write(&frame()).unwrap();
    let seg = enc.close().unwrap();
    assert_eq!(seg.index, 3);
    assert_eq!(seg.frames, 2);
    assert_eq!(seg.path, dir.path().join("00003.mp4"));
    assert_eq!(std::fs::metadata(&seg.path).unwrap().len(), 32);
    assert!(!dir.path().join("00003_temp.mp4").exists());
}

#[test]
fn nonzero_exit_leaves_no_final_file() {
    let dir = tempfile::tempdir().unwrap();
    let tool = FakeTool::default();
    let mut enc = SegmentEncoder::open(&tool, dir.path(), 0, &format()).unwrap();
    enc.write(&frame()).unwrap();
    let err = enc.close().unwrap_err();
    assert!(matches!(err, WeaveError::Encoding { index: 0, .. }));
    assert!(!dir.path().join("00000.mp4").exists());
    assert!(!dir.path().join("00000_temp.mp4").exists());
}

#[test]
fn mid_stream_crash_is_detected_even_if_exit_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let tool = FakeTool {
        exit_ok: true,
        fail_write_at: Some(1),
    };
    let mut enc = SegmentEncoder::open(&tool, dir.path(), 1, &format()).unwrap();
    enc.write(&frame()).unwrap();
    enc.write(&frame()).unwrap();
    assert!(enc.is_broken());
    enc.write(&frame()).unwrap();
    assert_eq!(enc.frames(), 1);
    let err = enc.close().unwrap_err();
    assert!(err.to_string().contains("broken pipe"));
    assert!(!dir.path().join("00001.mp4").exists());
}

#[test]
fn stale_final_file_is_replaced_on_open() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("00002.mp4"), b"stale").unwrap();
    let tool = FakeTool::default();
    let enc = SegmentEncoder::open(&tool, dir.path(), 2, &format()).unwrap();
    assert!(!dir.path().join("00002.mp4").exists());
    enc.abort();
    assert!(!dir.path().join("00002_temp.mp4").exists());
}

#[test]
fn unremovable_stale_path_fails_only_this_segment() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("00003.mp4")).unwrap();
    let tool = FakeTool::default();
    let Err(err) = SegmentEncoder::open(&tool, dir.path(), 3, &format()) else {
        panic!("open should fail while a directory occupies the segment path");
    };
    assert!(matches!(err, WeaveError::Encoding { index: 3, .. }), "{err}");
    assert!(!dir.path().join("00003_temp.mp4").exists());
}
