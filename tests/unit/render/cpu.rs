use super::*;
use crate::foundation::core::Transform2D;

fn renderer(bg: Rgba8) -> CpuRenderer {
    CpuRenderer::new(CpuRendererOpts {
        canvas: Canvas {
            width: 32,
            height: 16,
        },
        background: bg,
    })
    .unwrap()
}

fn red_square_at(x: f64, y: f64) -> Item {
    let it = Item::rect("sq", 8.0, 8.0, Rgba8::rgb(255, 0, 0));
    it.update_state(|s| s.transform = Transform2D::at(x, y));
    it
}

#[test]
fn empty_scene_is_background() {
    let mut r = renderer(Rgba8::rgb(0, 0, 255));
    let f = r.render(&[], None).unwrap();
    assert_eq!(f.data.len(), 32 * 16 * 4);
    assert_eq!(f.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(f.pixel(31, 15), Some([0, 0, 255, 255]));
}

#[test]
fn rect_is_centred_on_origin() {
    let mut r = renderer(Rgba8::BLACK);
    let f = r.render(&[red_square_at(8.0, 8.0)], None).unwrap();
    assert_eq!(f.pixel(8, 8), Some([255, 0, 0, 255]));
    assert_eq!(f.pixel(20, 8), Some([0, 0, 0, 255]));
}

#[test]
fn zero_opacity_items_are_skipped() {
    let mut r = renderer(Rgba8::BLACK);
    let sq = red_square_at(8.0, 8.0);
    sq.update_state(|s| s.opacity = 0.0);
    let f = r.render(&[sq], None).unwrap();
    assert_eq!(f.pixel(8, 8), Some([0, 0, 0, 255]));
}

#[test]
fn composites_over_cached_background() {
    let mut r = renderer(Rgba8::BLACK);
    let left = red_square_at(8.0, 8.0);
    let bg = r.render(&[left], None).unwrap();

    let right = Item::ellipse("dot", 4.0, 4.0, Rgba8::rgb(0, 255, 0));
    right.update_state(|s| s.transform = Transform2D::at(24.0, 8.0));
    let f = r.render(&[right], Some(&bg)).unwrap();
    assert_eq!(f.pixel(8, 8), Some([255, 0, 0, 255]));
    assert_eq!(f.pixel(24, 8), Some([0, 255, 0, 255]));
    assert_eq!(f.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn background_size_mismatch_is_render_error() {
    let mut r = renderer(Rgba8::BLACK);
    let wrong = Frame::solid(
        Canvas {
            width: 2,
            height: 2,
        },
        Rgba8::BLACK,
    );
    assert!(matches!(
        r.render(&[], Some(&wrong)),
        Err(WeaveError::Render(_))
    ));
}

#[test]
fn rejects_odd_canvas() {
    let err = CpuRenderer::new(CpuRendererOpts {
        canvas: Canvas {
            width: 3,
            height: 2,
        },
        background: Rgba8::BLACK,
    });
    assert!(err.is_err());
}
