use std::collections::HashSet;

use crate::{
    animation::anim::Animation,
    foundation::error::{WeaveError, WeaveResult},
    scene::item::{Item, ItemId},
};

/// Lifecycle position of one animation inside a [`Batch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Created,
    Begun,
    Updating,
    /// Terminal.
    Finished,
}

struct Tracked {
    anim: Box<dyn Animation>,
    phase: Phase,
}

/// Animations played together on one shared clock.
///
/// The batch runs for the longest member's run time; shorter members hold their final value
/// (alpha clamped to 1) but keep receiving `update(dt)` until the batch ends.
pub struct Batch {
    tracked: Vec<Tracked>,
    run_time: f64,
}

impl Batch {
    /// Validate and wrap `anims`. Nothing is begun yet.
    pub fn new(anims: Vec<Box<dyn Animation>>) -> WeaveResult<Self> {
        if anims.is_empty() {
            return Err(WeaveError::invalid_argument(
                "an animation batch needs at least one animation",
            ));
        }
        let mut run_time: f64 = 0.0;
        for anim in &anims {
            let rt = anim.run_time();
            if !rt.is_finite() || rt <= 0.0 {
                return Err(WeaveError::invalid_argument(format!(
                    "animation '{}' has invalid run_time {rt} (must be finite and > 0)",
                    anim.name()
                )));
            }
            run_time = run_time.max(rt);
        }
        Ok(Self {
            tracked: anims
                .into_iter()
                .map(|anim| Tracked {
                    anim,
                    phase: Phase::Created,
                })
                .collect(),
            run_time,
        })
    }

    pub fn run_time(&self) -> f64 {
        self.run_time
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.tracked.iter().map(|t| t.phase).collect()
    }

    /// Target items in batch order, without repeats.
    pub fn targets(&self) -> Vec<Item> {
        let mut seen = HashSet::new();
        self.tracked
            .iter()
            .map(|t| t.anim.target().clone())
            .filter(|m| seen.insert(m.id()))
            .collect()
    }

    /// Progress-bar label: the first animation's name, plus "etc." for batches.
    pub fn label(&self) -> String {
        let first = self
            .tracked
            .first()
            .map(|t| t.anim.name())
            .unwrap_or_default();
        if self.tracked.len() > 1 {
            format!("{first}, etc.")
        } else {
            first
        }
    }

    pub fn begin_all(&mut self) -> WeaveResult<()> {
        for t in &mut self.tracked {
            if t.phase != Phase::Created {
                return Err(WeaveError::animation(format!(
                    "'{}' cannot begin from {:?}",
                    t.anim.name(),
                    t.phase
                )));
            }
            t.anim.begin();
            t.phase = Phase::Begun;
        }
        Ok(())
    }

    /// Advance every animation to batch time `t`, `dt` seconds after the previous step.
    pub fn step(&mut self, t: f64, dt: f64) -> WeaveResult<()> {
        for tr in &mut self.tracked {
            if !matches!(tr.phase, Phase::Begun | Phase::Updating) {
                return Err(WeaveError::animation(format!(
                    "'{}' cannot step from {:?}",
                    tr.anim.name(),
                    tr.phase
                )));
            }
            let alpha = (t / tr.anim.run_time()).clamp(0.0, 1.0);
            tr.anim.update(dt);
            tr.anim.interpolate(alpha);
            tr.phase = Phase::Updating;
        }
        Ok(())
    }

    /// Finish every animation and return the targets that should leave the scene.
    pub fn finish_all(&mut self) -> WeaveResult<Vec<Item>> {
        let mut removed = Vec::new();
        for tr in &mut self.tracked {
            if !matches!(tr.phase, Phase::Begun | Phase::Updating) {
                return Err(WeaveError::animation(format!(
                    "'{}' cannot finish from {:?}",
                    tr.anim.name(),
                    tr.phase
                )));
            }
            tr.anim.finish();
            tr.phase = Phase::Finished;
            if tr.anim.is_remover() {
                removed.push(tr.anim.target().clone());
            }
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("len", &self.tracked.len())
            .field("run_time", &self.run_time)
            .field("phases", &self.phases())
            .finish()
    }
}

/// Split draw-ordered `members` into a static prefix and a moving suffix.
///
/// The suffix starts at the first member that is an animation target or whose family carries an
/// updater; everything after it is treated as moving too, so draw order is preserved.
pub fn partition_moving(members: &[Item], targets: &[Item]) -> (Vec<Item>, Vec<Item>) {
    let target_ids: HashSet<ItemId> = targets.iter().map(Item::id).collect();
    let split = members
        .iter()
        .position(|m| {
            target_ids.contains(&m.id()) || m.family().iter().any(Item::has_updaters)
        })
        .unwrap_or(members.len());
    let (fixed, moving) = members.split_at(split);
    (fixed.to_vec(), moving.to_vec())
}

#[cfg(test)]
#[path = "../../tests/unit/animation/scheduler.rs"]
mod tests;
