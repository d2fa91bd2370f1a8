use crate::{
    animation::ease::RateFunc,
    foundation::core::{Rgba8, Transform2D, Vec2},
    scene::item::{Item, ItemState, Shape},
};

/// Interpolation contract for animated state types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Transform2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            translate: <Vec2 as Lerp>::lerp(&a.translate, &b.translate, t),
            rotation_rad: a.rotation_rad + (b.rotation_rad - a.rotation_rad) * t,
            scale: <Vec2 as Lerp>::lerp(&a.scale, &b.scale, t),
            anchor: <Vec2 as Lerp>::lerp(&a.anchor, &b.anchor, t),
        }
    }
}

impl Lerp for Rgba8 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }
}

impl Lerp for Shape {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (
                Shape::Rect {
                    width: w0,
                    height: h0,
                },
                Shape::Rect {
                    width: w1,
                    height: h1,
                },
            ) => Shape::Rect {
                width: f64::lerp(w0, w1, t),
                height: f64::lerp(h0, h1, t),
            },
            (Shape::Ellipse { rx: x0, ry: y0 }, Shape::Ellipse { rx: x1, ry: y1 }) => {
                Shape::Ellipse {
                    rx: f64::lerp(x0, x1, t),
                    ry: f64::lerp(y0, y1, t),
                }
            }
            // Different kinds cannot blend; switch halfway.
            _ => {
                if t < 0.5 {
                    *a
                } else {
                    *b
                }
            }
        }
    }
}

impl Lerp for ItemState {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            shape: Shape::lerp(&a.shape, &b.shape, t),
            transform: Transform2D::lerp(&a.transform, &b.transform, t),
            fill: Rgba8::lerp(&a.fill, &b.fill, t),
            opacity: f64::lerp(&a.opacity, &b.opacity, t),
        }
    }
}

/// A change applied to one target item over a fixed run time.
///
/// The scheduler owns the lifecycle: `begin` once, then any number of `update(dt)` +
/// `interpolate(alpha)` steps with `alpha` already clamped to `[0, 1]`, then `finish` once.
/// Implementations apply their own [`RateFunc`] to `alpha`.
pub trait Animation {
    /// Short label used in progress messages and logs.
    fn name(&self) -> String;

    /// Item whose state this animation drives.
    fn target(&self) -> &Item;

    /// Duration in seconds. Must be finite and positive.
    fn run_time(&self) -> f64;

    fn rate_func(&self) -> RateFunc {
        RateFunc::Smooth
    }

    /// Capture start/end states. Called once before any step.
    fn begin(&mut self);

    /// Per-step hook receiving the elapsed time since the previous step.
    fn update(&mut self, _dt: f64) {}

    /// Apply the state at normalized progress `alpha`.
    fn interpolate(&mut self, alpha: f64);

    /// Settle on the final state. Called exactly once.
    fn finish(&mut self) {
        self.interpolate(1.0);
    }

    /// `true` when the target should leave the scene once the animation finishes.
    fn is_remover(&self) -> bool {
        false
    }

    fn boxed(self) -> Box<dyn Animation>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl std::fmt::Debug for dyn Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.name())
            .field("target", &self.target().id())
            .field("run_time", &self.run_time())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
