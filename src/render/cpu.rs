use crate::foundation::core::{Affine, Canvas, Rgba8};
use crate::foundation::error::{WeaveError, WeaveResult};
use crate::render::backend::{Frame, Renderer};
use crate::render::composite::over_in_place;
use crate::scene::item::{Item, ItemState, Shape};

/// Options for [`CpuRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CpuRendererOpts {
    /// Output resolution.
    pub canvas: Canvas,
    /// Scene background painted under the items (straight alpha). Use alpha 0 for transparent
    /// output.
    pub background: Rgba8,
}

impl Default for CpuRendererOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 854,
                height: 480,
            },
            background: Rgba8::BLACK,
        }
    }
}

/// Renderer powered by `vello_cpu`.
///
/// Item positions are canvas pixels, origin top-left, y down. Shapes are centred on the item
/// origin.
pub struct CpuRenderer {
    opts: CpuRendererOpts,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuRenderer {
    pub fn new(opts: CpuRendererOpts) -> WeaveResult<Self> {
        opts.canvas.validate()?;
        Ok(Self { opts, ctx: None })
    }

    pub fn opts(&self) -> CpuRendererOpts {
        self.opts
    }

    fn size_u16(&self) -> WeaveResult<(u16, u16)> {
        let w = u16::try_from(self.opts.canvas.width)
            .map_err(|_| WeaveError::render("canvas width exceeds u16"))?;
        let h = u16::try_from(self.opts.canvas.height)
            .map_err(|_| WeaveError::render("canvas height exceeds u16"))?;
        Ok((w, h))
    }

    fn rasterize(&mut self, items: &[Item], paint_background: bool) -> WeaveResult<Vec<u8>> {
        let (width, height) = self.size_u16()?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        if paint_background && self.opts.background.a > 0 {
            let bg = self.opts.background;
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            ));
        }

        for item in items {
            draw_item(&mut ctx, &item.state());
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        let data = pixmap.data_as_u8_slice().to_vec();
        self.ctx = Some(ctx);
        Ok(data)
    }
}

impl Renderer for CpuRenderer {
    fn canvas(&self) -> Canvas {
        self.opts.canvas
    }

    fn render(&mut self, items: &[Item], background: Option<&Frame>) -> WeaveResult<Frame> {
        let canvas = self.opts.canvas;
        let data = match background {
            None => self.rasterize(items, true)?,
            Some(bg) => {
                if bg.canvas() != canvas || !bg.premultiplied {
                    return Err(WeaveError::render(format!(
                        "background frame must be premultiplied {}x{}",
                        canvas.width, canvas.height
                    )));
                }
                let mut out = bg.data.clone();
                if !items.is_empty() {
                    let layer = self.rasterize(items, false)?;
                    over_in_place(&mut out, &layer, 1.0)?;
                }
                out
            }
        };
        if data.len() != canvas.frame_byte_len() {
            return Err(WeaveError::render("rendered buffer size mismatch"));
        }
        Ok(Frame {
            width: canvas.width,
            height: canvas.height,
            data,
            premultiplied: true,
        })
    }
}

fn draw_item(ctx: &mut vello_cpu::RenderContext, state: &ItemState) {
    let opacity = state.opacity.clamp(0.0, 1.0) as f32;
    if opacity <= 0.0 || state.fill.a == 0 {
        return;
    }
    let fill = state.fill;
    let tr = state.transform.to_affine();
    ctx.set_transform(affine_to_cpu(tr));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        fill.r, fill.g, fill.b, fill.a,
    ));
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    match state.shape {
        Shape::None => {}
        Shape::Rect { width, height } => {
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                -width / 2.0,
                -height / 2.0,
                width / 2.0,
                height / 2.0,
            ));
        }
        Shape::Ellipse { rx, ry } => {
            use kurbo::Shape as _;
            let e = kurbo::Ellipse::new((0.0, 0.0), (rx, ry), 0.0);
            ctx.fill_path(&bezpath_to_cpu(e.path_elements(0.1)));
        }
    }
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(elements: impl IntoIterator<Item = kurbo::PathEl>) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in elements {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
