use std::collections::BTreeMap;

use crate::{
    animation::anim::Animation,
    animation::transform::{
        Transform, fade_in, fade_in_from, fade_out, move_to, recolor, rotate_by, scale, shift,
    },
    foundation::core::{Rgba8, Transform2D, Vec2},
    foundation::error::{WeaveError, WeaveResult},
    scene::driver::{RenderReport, Scene},
    scene::item::{Item, ItemState, Shape, Updater},
    script::model::{AnimDecl, AnimKind, Axis, Op, Script},
};

/// Items built from a script's declarations, keyed by id.
#[derive(Debug, Default)]
pub struct ItemTable {
    items: BTreeMap<String, Item>,
}

impl ItemTable {
    /// Build every declared item and wire up group children.
    pub fn build(script: &Script) -> WeaveResult<Self> {
        let mut items = BTreeMap::new();
        for decl in &script.items {
            let state = ItemState {
                shape: decl.shape.unwrap_or(Shape::None),
                transform: Transform2D::at(decl.position[0], decl.position[1]),
                fill: decl.fill.unwrap_or(Rgba8::WHITE),
                opacity: decl.opacity.unwrap_or(1.0),
            };
            items.insert(decl.id.clone(), Item::new(decl.id.clone(), state));
        }
        let table = Self { items };
        for decl in &script.items {
            let parent = table.get(&decl.id)?;
            for child in &decl.children {
                parent.add(table.get(child)?)?;
            }
        }
        Ok(table)
    }

    pub fn get(&self, id: &str) -> WeaveResult<&Item> {
        self.items
            .get(id)
            .ok_or_else(|| WeaveError::invalid_argument(format!("unknown item '{id}'")))
    }

    pub fn many(&self, ids: &[String]) -> WeaveResult<Vec<Item>> {
        ids.iter().map(|id| self.get(id).cloned()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn vec2(v: [f64; 2]) -> Vec2 {
    Vec2::new(v[0], v[1])
}

fn build_animation(table: &ItemTable, decl: &AnimDecl) -> WeaveResult<Box<dyn Animation>> {
    let target = table.get(&decl.target)?;
    let anim: Transform = match &decl.kind {
        AnimKind::FadeIn => fade_in(target),
        AnimKind::FadeInFrom { shift: v } => fade_in_from(target, vec2(*v)),
        AnimKind::FadeOut => fade_out(target),
        AnimKind::Shift { by } => shift(target, vec2(*by)),
        AnimKind::MoveTo { to } => move_to(target, vec2(*to)),
        AnimKind::Scale { factor } => scale(target, *factor),
        AnimKind::Rotate { angle } => rotate_by(target, *angle),
        AnimKind::Recolor { fill } => recolor(target, *fill),
    };
    let anim = match decl.run_time {
        Some(rt) => anim.with_run_time(rt),
        None => anim,
    };
    let anim = match decl.rate {
        Some(rate) => anim.with_rate(rate),
        None => anim,
    };
    Ok(anim.boxed())
}

/// Apply one op to `scene`.
pub fn apply_op(scene: &mut Scene, table: &ItemTable, op: &Op) -> WeaveResult<()> {
    match op {
        Op::Add { items } => scene.add(&table.many(items)?),
        Op::Remove { items } => scene.remove(&table.many(items)?),
        Op::BringToFront { items } => scene.bring_to_front(&table.many(items)?),
        Op::BringToBack { items } => scene.bring_to_back(&table.many(items)?),
        Op::Clear => scene.clear(),
        Op::Play { animations } => {
            let anims = animations
                .iter()
                .map(|a| build_animation(table, a))
                .collect::<WeaveResult<Vec<_>>>()?;
            scene.play(anims)?;
        }
        Op::Wait { duration } => scene.wait(*duration)?,
        Op::WaitUntil {
            item,
            axis,
            at_least,
            max_time,
        } => {
            let item = table.get(item)?.clone();
            let (axis, at_least) = (*axis, *at_least);
            scene.wait_until(
                move |_| {
                    let p = item.state().position();
                    match axis {
                        Axis::X => p.x >= at_least,
                        Axis::Y => p.y >= at_least,
                    }
                },
                *max_time,
            )?;
        }
        Op::Sound {
            name,
            offset,
            gain,
            gain_to_background,
        } => scene.add_sound_file(name, *offset, *gain, *gain_to_background)?,
        Op::Spin { item, rate } => {
            let rate = *rate;
            table
                .get(item)?
                .add_updater(Updater::timed(move |s, dt| s.transform.rotation_rad += rate * dt));
        }
        Op::Drift {
            item,
            velocity,
            jitter,
        } => {
            let [jx, jy] = *jitter;
            let rng = scene.rng();
            let v = vec2(*velocity) + Vec2::new(rng.range_f64(-jx, jx), rng.range_f64(-jy, jy));
            table
                .get(item)?
                .add_updater(Updater::timed(move |s, dt| s.transform.translate += v * dt));
        }
        Op::Follow {
            item,
            source,
            offset,
        } => {
            let offset = vec2(*offset);
            let source = table.get(source)?;
            table.get(item)?.add_updater(Updater::follow(source, move |s, src| {
                s.transform.translate = src.position() + offset;
            }));
        }
        Op::ClearUpdaters { item } => table.get(item)?.clear_updaters(),
    }
    Ok(())
}

/// Validate `script`, then play all of its ops on `scene` and finish it.
#[tracing::instrument(skip_all, fields(scene = %script.config.name, ops = script.ops.len()))]
pub fn run_script(scene: &mut Scene, script: &Script) -> WeaveResult<RenderReport> {
    script.validate()?;
    let table = ItemTable::build(script)?;
    tracing::debug!(items = table.len(), "script items built");
    scene.run(|scene| {
        for op in &script.ops {
            apply_op(scene, &table, op)?;
        }
        Ok(())
    })
}

#[cfg(test)]
#[path = "../../tests/unit/script/run.rs"]
mod tests;
