use crate::{
    animation::anim::{Animation, Lerp},
    animation::ease::RateFunc,
    foundation::core::{Rgba8, Vec2},
    scene::item::{Item, ItemState, Shape},
};

/// Reference points of the target's family, measured when the animation begins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FamilyFrame {
    /// Origin of the target item itself.
    pub origin: Vec2,
    /// Mean origin of every drawable family member (the target origin if none draw).
    pub centre: Vec2,
}

impl FamilyFrame {
    fn measure(family: &[Item]) -> Self {
        let origin = family
            .first()
            .map(|m| m.state().position())
            .unwrap_or(Vec2::ZERO);
        let drawn: Vec<Vec2> = family
            .iter()
            .map(Item::state)
            .filter(|s| s.shape != Shape::None)
            .map(|s| s.position())
            .collect();
        let centre = if drawn.is_empty() {
            origin
        } else {
            drawn.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / drawn.len() as f64
        };
        Self { origin, centre }
    }
}

type StateMap = Box<dyn FnMut(&ItemState, &FamilyFrame) -> ItemState>;

/// Whether the mapped state is where the family ends up or where it starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Current state → mapped state.
    To,
    /// Mapped state → current state. The family jumps to the mapped state on `begin`.
    From,
}

struct Track {
    member: Item,
    start: ItemState,
    end: ItemState,
}

/// Family-wide state transition: every member of the target's family moves from a start state
/// to an end state derived by a per-member mapping.
pub struct Transform {
    name: String,
    target: Item,
    run_time: f64,
    rate: RateFunc,
    direction: Direction,
    map: StateMap,
    arc: Option<f64>,
    remover: bool,
    frame: Option<FamilyFrame>,
    tracks: Vec<Track>,
}

impl Transform {
    pub const DEFAULT_RUN_TIME: f64 = 1.0;

    pub fn new(
        name: impl Into<String>,
        target: &Item,
        direction: Direction,
        map: impl FnMut(&ItemState, &FamilyFrame) -> ItemState + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.clone(),
            run_time: Self::DEFAULT_RUN_TIME,
            rate: RateFunc::default(),
            direction,
            map: Box::new(map),
            arc: None,
            remover: false,
            frame: None,
            tracks: Vec::new(),
        }
    }

    pub fn with_run_time(mut self, run_time: f64) -> Self {
        self.run_time = run_time;
        self
    }

    pub fn with_rate(mut self, rate: RateFunc) -> Self {
        self.rate = rate;
        self
    }

    /// Move members along an arc of `angle` radians about the family centre instead of a line.
    pub fn with_arc(mut self, angle: f64) -> Self {
        self.arc = Some(angle);
        self
    }

    pub fn removing(mut self) -> Self {
        self.remover = true;
        self
    }
}

impl Animation for Transform {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn target(&self) -> &Item {
        &self.target
    }

    fn run_time(&self) -> f64 {
        self.run_time
    }

    fn rate_func(&self) -> RateFunc {
        self.rate
    }

    fn begin(&mut self) {
        let family = self.target.family();
        let frame = FamilyFrame::measure(&family);
        self.tracks = family
            .into_iter()
            .map(|member| {
                let current = member.state();
                let mapped = (self.map)(&current, &frame);
                let (start, end) = match self.direction {
                    Direction::To => (current, mapped),
                    Direction::From => {
                        member.set_state(mapped);
                        (mapped, current)
                    }
                };
                Track { member, start, end }
            })
            .collect();
        self.frame = Some(frame);
    }

    fn interpolate(&mut self, alpha: f64) {
        let a = self.rate.apply(alpha);
        for track in &self.tracks {
            let mut state = ItemState::lerp(&track.start, &track.end, a);
            if let (Some(angle), Some(frame)) = (self.arc, self.frame) {
                let from = track.start.position() - frame.centre;
                let rotated = rotate(from, angle * a);
                // Keep any translation the mapping adds on top of the rotation.
                let drift = track.end.position() - (frame.centre + rotate(from, angle));
                state.transform.translate = frame.centre + rotated + drift * a;
            }
            track.member.set_state(state);
        }
    }

    fn is_remover(&self) -> bool {
        self.remover
    }
}

fn rotate(v: Vec2, angle: f64) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Fade the family in from fully transparent.
pub fn fade_in(target: &Item) -> Transform {
    Transform::new("FadeIn", target, Direction::From, |s, _| ItemState {
        opacity: 0.0,
        ..*s
    })
}

/// Fade in while sliding by `shift` into place.
pub fn fade_in_from(target: &Item, shift: Vec2) -> Transform {
    Transform::new("FadeIn", target, Direction::From, move |s, _| {
        let mut out = ItemState { opacity: 0.0, ..*s };
        out.transform.translate -= shift;
        out
    })
}

/// Fade the family out; the target leaves the scene when finished.
pub fn fade_out(target: &Item) -> Transform {
    Transform::new("FadeOut", target, Direction::To, |s, _| ItemState {
        opacity: 0.0,
        ..*s
    })
    .removing()
}

pub fn shift(target: &Item, delta: Vec2) -> Transform {
    Transform::new("Shift", target, Direction::To, move |s, _| {
        let mut out = *s;
        out.transform.translate += delta;
        out
    })
}

/// Move the family so the target's origin lands on `pos`.
pub fn move_to(target: &Item, pos: Vec2) -> Transform {
    Transform::new("MoveTo", target, Direction::To, move |s, f| {
        let mut out = *s;
        out.transform.translate += pos - f.origin;
        out
    })
}

/// Scale the family by `factor` about its centre.
pub fn scale(target: &Item, factor: f64) -> Transform {
    Transform::new("Scale", target, Direction::To, move |s, f| {
        let mut out = *s;
        out.transform.translate = f.centre + (s.position() - f.centre) * factor;
        out.transform.scale = s.transform.scale * factor;
        out
    })
}

/// Rotate the family by `angle` radians about its centre.
pub fn rotate_by(target: &Item, angle: f64) -> Transform {
    Transform::new("Rotate", target, Direction::To, move |s, f| {
        let mut out = *s;
        out.transform.translate = f.centre + rotate(s.position() - f.centre, angle);
        out.transform.rotation_rad += angle;
        out
    })
    .with_arc(angle)
}

/// Change the fill of every drawable member.
pub fn recolor(target: &Item, fill: Rgba8) -> Transform {
    Transform::new("Recolor", target, Direction::To, move |s, _| {
        if s.shape == Shape::None {
            *s
        } else {
            ItemState { fill, ..*s }
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/animation/transform.rs"]
mod tests;
