use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::{
    animation::ease::RateFunc,
    foundation::core::Rgba8,
    foundation::error::{WeaveError, WeaveResult},
    scene::config::{SceneConfig, WriterConfig},
    scene::item::Shape,
};

/// A complete scene description.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: SceneConfig,
    #[serde(default)]
    pub writer: WriterConfig,
    #[serde(default)]
    pub items: Vec<ItemDecl>,
    #[serde(default)]
    pub ops: Vec<Op>,
}

/// One item. Groups list their children by id; positions are absolute scene coordinates.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ItemDecl {
    pub id: String,
    /// Omitted for pure groups.
    #[serde(default)]
    pub shape: Option<Shape>,
    #[serde(default)]
    pub position: [f64; 2],
    #[serde(default)]
    pub fill: Option<Rgba8>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

/// One scene operation, applied in order.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Add { items: Vec<String> },
    Remove { items: Vec<String> },
    BringToFront { items: Vec<String> },
    BringToBack { items: Vec<String> },
    Clear,
    Play { animations: Vec<AnimDecl> },
    Wait { duration: f64 },
    /// Wait until `item`'s position on `axis` reaches `at_least`, for at most `max_time`.
    WaitUntil {
        item: String,
        axis: Axis,
        at_least: f64,
        max_time: f64,
    },
    /// Place a sound file (resolved under the sounds root) at the current time.
    Sound {
        name: String,
        #[serde(default)]
        offset: f64,
        #[serde(default)]
        gain: Option<f64>,
        #[serde(default)]
        gain_to_background: Option<f64>,
    },
    /// Rotate `item` continuously at `rate` radians per second.
    Spin { item: String, rate: f64 },
    /// Move `item` continuously at `velocity` units per second. Each velocity component is
    /// offset once by a draw from the scene's seeded generator in `[-jitter, jitter)`.
    Drift {
        item: String,
        velocity: [f64; 2],
        #[serde(default)]
        jitter: [f64; 2],
    },
    /// Keep `item` at `source`'s position plus `offset`.
    Follow {
        item: String,
        source: String,
        #[serde(default)]
        offset: [f64; 2],
    },
    ClearUpdaters { item: String },
}

/// One animation inside a `play` op.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimDecl {
    pub target: String,
    #[serde(flatten)]
    pub kind: AnimKind,
    #[serde(default)]
    pub run_time: Option<f64>,
    #[serde(default)]
    pub rate: Option<RateFunc>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimKind {
    FadeIn,
    FadeInFrom { shift: [f64; 2] },
    FadeOut,
    Shift { by: [f64; 2] },
    MoveTo { to: [f64; 2] },
    Scale { factor: f64 },
    Rotate { angle: f64 },
    Recolor { fill: Rgba8 },
}

impl Script {
    pub fn from_json_str(s: &str) -> WeaveResult<Self> {
        serde_json::from_str(s).map_err(|e| WeaveError::serde(e.to_string()))
    }

    pub fn load(path: &Path) -> WeaveResult<Self> {
        use anyhow::Context as _;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> WeaveResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| WeaveError::serde(e.to_string()))
    }

    /// Check the whole script so that running it cannot fail on a malformed reference.
    pub fn validate(&self) -> WeaveResult<()> {
        self.config.validate()?;
        self.writer.validate()?;

        let mut decls: BTreeMap<&str, &ItemDecl> = BTreeMap::new();
        for decl in &self.items {
            if decl.id.trim().is_empty() {
                return Err(WeaveError::invalid_argument("item id must be non-empty"));
            }
            if decls.insert(decl.id.as_str(), decl).is_some() {
                return Err(WeaveError::invalid_argument(format!(
                    "duplicate item id '{}'",
                    decl.id
                )));
            }
            finite_all(&format!("item '{}' position", decl.id), &decl.position)?;
            if let Some(op) = decl.opacity
                && !(0.0..=1.0).contains(&op)
            {
                return Err(WeaveError::invalid_argument(format!(
                    "item '{}' opacity must be in [0, 1], got {op}",
                    decl.id
                )));
            }
            match decl.shape {
                Some(Shape::Rect { width, height }) => {
                    non_negative(&format!("item '{}' width", decl.id), width)?;
                    non_negative(&format!("item '{}' height", decl.id), height)?;
                }
                Some(Shape::Ellipse { rx, ry }) => {
                    non_negative(&format!("item '{}' rx", decl.id), rx)?;
                    non_negative(&format!("item '{}' ry", decl.id), ry)?;
                }
                Some(Shape::None) | None => {}
            }
        }

        for decl in &self.items {
            for child in &decl.children {
                if !decls.contains_key(child.as_str()) {
                    return Err(WeaveError::invalid_argument(format!(
                        "item '{}' references unknown child '{child}'",
                        decl.id
                    )));
                }
            }
        }
        for decl in &self.items {
            check_acyclic(&decls, decl.id.as_str(), &mut Vec::new())?;
        }

        let known = |id: &str| -> WeaveResult<()> {
            if decls.contains_key(id) {
                Ok(())
            } else {
                Err(WeaveError::invalid_argument(format!("unknown item '{id}'")))
            }
        };

        for (i, op) in self.ops.iter().enumerate() {
            let at = |e: WeaveError| match e {
                WeaveError::InvalidArgument(msg) => {
                    WeaveError::invalid_argument(format!("op {i}: {msg}"))
                }
                other => other,
            };
            match op {
                Op::Add { items }
                | Op::Remove { items }
                | Op::BringToFront { items }
                | Op::BringToBack { items } => {
                    for id in items {
                        known(id).map_err(at)?;
                    }
                }
                Op::Clear => {}
                Op::Play { animations } => {
                    for anim in animations {
                        known(&anim.target).map_err(at)?;
                        anim.validate().map_err(at)?;
                    }
                }
                Op::Wait { duration } => non_negative("wait duration", *duration).map_err(at)?,
                Op::WaitUntil {
                    item,
                    at_least,
                    max_time,
                    ..
                } => {
                    known(item).map_err(at)?;
                    finite_all("wait_until threshold", &[*at_least]).map_err(at)?;
                    non_negative("wait_until max_time", *max_time).map_err(at)?;
                }
                Op::Sound {
                    name,
                    offset,
                    gain,
                    gain_to_background,
                } => {
                    if name.trim().is_empty() {
                        return Err(at(WeaveError::invalid_argument(
                            "sound name must be non-empty",
                        )));
                    }
                    let params = [
                        *offset,
                        gain.unwrap_or(0.0),
                        gain_to_background.unwrap_or(0.0),
                    ];
                    finite_all("sound parameters", &params).map_err(at)?;
                }
                Op::Spin { item, rate } => {
                    known(item).map_err(at)?;
                    finite_all("spin rate", &[*rate]).map_err(at)?;
                }
                Op::Drift {
                    item,
                    velocity,
                    jitter,
                } => {
                    known(item).map_err(at)?;
                    finite_all("drift velocity", velocity).map_err(at)?;
                    for j in jitter {
                        non_negative("drift jitter", *j).map_err(at)?;
                    }
                }
                Op::Follow {
                    item,
                    source,
                    offset,
                } => {
                    known(item).map_err(at)?;
                    known(source).map_err(at)?;
                    if item == source {
                        return Err(at(WeaveError::invalid_argument(format!(
                            "item '{item}' cannot follow itself"
                        ))));
                    }
                    finite_all("follow offset", offset).map_err(at)?;
                }
                Op::ClearUpdaters { item } => known(item).map_err(at)?,
            }
        }
        Ok(())
    }
}

impl AnimDecl {
    fn validate(&self) -> WeaveResult<()> {
        if let Some(rt) = self.run_time
            && (!rt.is_finite() || rt <= 0.0)
        {
            return Err(WeaveError::invalid_argument(format!(
                "animation on '{}' has invalid run_time {rt}",
                self.target
            )));
        }
        match &self.kind {
            AnimKind::FadeIn | AnimKind::FadeOut | AnimKind::Recolor { .. } => Ok(()),
            AnimKind::FadeInFrom { shift: v }
            | AnimKind::Shift { by: v }
            | AnimKind::MoveTo { to: v } => finite_all("animation vector", v),
            AnimKind::Scale { factor } => finite_all("scale factor", &[*factor]),
            AnimKind::Rotate { angle } => finite_all("rotation angle", &[*angle]),
        }
    }
}

fn check_acyclic<'a>(
    decls: &BTreeMap<&'a str, &'a ItemDecl>,
    id: &'a str,
    path: &mut Vec<&'a str>,
) -> WeaveResult<()> {
    if path.contains(&id) {
        path.push(id);
        return Err(WeaveError::invalid_argument(format!(
            "item groups form a cycle: {}",
            path.join(" -> ")
        )));
    }
    let Some(&decl) = decls.get(id) else {
        return Ok(());
    };
    path.push(id);
    let mut seen = HashSet::new();
    for child in &decl.children {
        if seen.insert(child.as_str()) {
            check_acyclic(decls, child.as_str(), path)?;
        }
    }
    path.pop();
    Ok(())
}

fn finite_all(what: &str, values: &[f64]) -> WeaveResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(WeaveError::invalid_argument(format!(
            "{what} must be finite, got {values:?}"
        )))
    }
}

fn non_negative(what: &str, v: f64) -> WeaveResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(WeaveError::invalid_argument(format!(
            "{what} must be finite and >= 0, got {v}"
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/model.rs"]
mod tests;
