use super::*;
use crate::animation::time::TimeProgression;
use crate::foundation::core::{Fps, Rgba8};
use crate::scene::item::Updater;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Begin,
    Update(f64),
    Interp(f64),
    Finish,
}

struct Probe {
    target: Item,
    run_time: f64,
    log: Rc<RefCell<Vec<Event>>>,
    remover: bool,
}

impl Probe {
    fn new(run_time: f64) -> (Self, Rc<RefCell<Vec<Event>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe = Self {
            target: Item::rect("probe", 1.0, 1.0, Rgba8::WHITE),
            run_time,
            log: log.clone(),
            remover: false,
        };
        (probe, log)
    }
}

impl Animation for Probe {
    fn name(&self) -> String {
        "Probe".to_owned()
    }
    fn target(&self) -> &Item {
        &self.target
    }
    fn run_time(&self) -> f64 {
        self.run_time
    }
    fn begin(&mut self) {
        self.log.borrow_mut().push(Event::Begin);
    }
    fn update(&mut self, dt: f64) {
        self.log.borrow_mut().push(Event::Update(dt));
    }
    fn interpolate(&mut self, alpha: f64) {
        self.log.borrow_mut().push(Event::Interp(alpha));
    }
    fn finish(&mut self) {
        self.log.borrow_mut().push(Event::Finish);
    }
    fn is_remover(&self) -> bool {
        self.remover
    }
}

fn alphas(log: &[Event]) -> Vec<f64> {
    log.iter()
        .filter_map(|e| match e {
            Event::Interp(a) => Some(*a),
            _ => None,
        })
        .collect()
}

fn drive(batch: &mut Batch, fps: Fps) {
    batch.begin_all().unwrap();
    let mut last = 0.0;
    for t in TimeProgression::new(batch.run_time(), fps) {
        batch.step(t, t - last).unwrap();
        last = t;
    }
    batch.finish_all().unwrap();
}

#[test]
fn run_time_is_batch_maximum() {
    let (a, _) = Probe::new(1.0);
    let (b, _) = Probe::new(3.0);
    let batch = Batch::new(vec![a.boxed(), b.boxed()]).unwrap();
    assert_eq!(batch.run_time(), 3.0);
    assert_eq!(batch.label(), "Probe, etc.");
}

#[test]
fn invalid_run_time_rejected_before_begin() {
    let (good, good_log) = Probe::new(1.0);
    let (bad, _) = Probe::new(0.0);
    let err = Batch::new(vec![good.boxed(), bad.boxed()]).unwrap_err();
    assert!(matches!(err, WeaveError::InvalidArgument(_)));
    assert!(good_log.borrow().is_empty());

    let (nan, _) = Probe::new(f64::NAN);
    assert!(Batch::new(vec![nan.boxed()]).is_err());
    assert!(Batch::new(Vec::new()).is_err());
}

#[test]
fn short_animation_clamps_while_long_continues() {
    let fps = Fps::integer(30).unwrap();
    let (short, short_log) = Probe::new(1.0);
    let (long, long_log) = Probe::new(3.0);
    let mut batch = Batch::new(vec![short.boxed(), long.boxed()]).unwrap();
    drive(&mut batch, fps);

    let s = alphas(&short_log.borrow());
    let l = alphas(&long_log.borrow());
    assert_eq!(s.len(), 90);
    assert_eq!(l.len(), 90);

    // Frame 30 is t = 1.0s.
    assert!((s[29] - 1.0).abs() < 1e-12);
    assert!((l[29] - 1.0 / 3.0).abs() < 1e-9);
    assert!(s[29..].iter().all(|a| *a == 1.0));
    assert_eq!(*l.last().unwrap(), 1.0);

    // The short one still receives every update.
    let updates = short_log
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Update(_)))
        .count();
    assert_eq!(updates, 90);
}

#[test]
fn lifecycle_order_and_monotone_alpha() {
    let fps = Fps::new(24000, 1001).unwrap();
    let (a, log) = Probe::new(1.7);
    let mut batch = Batch::new(vec![a.boxed()]).unwrap();
    drive(&mut batch, fps);

    let log = log.borrow();
    assert_eq!(log.first(), Some(&Event::Begin));
    assert_eq!(log.last(), Some(&Event::Finish));
    assert_eq!(log.iter().filter(|e| **e == Event::Finish).count(), 1);
    let al = alphas(&log);
    assert!(al.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*al.last().unwrap(), 1.0);
    assert_eq!(batch.phases(), vec![Phase::Finished]);
}

#[test]
fn finished_batch_cannot_step_or_finish_again() {
    let (a, _) = Probe::new(1.0);
    let mut batch = Batch::new(vec![a.boxed()]).unwrap();
    assert!(batch.step(0.1, 0.1).is_err());
    batch.begin_all().unwrap();
    assert!(batch.begin_all().is_err());
    batch.finish_all().unwrap();
    assert!(matches!(
        batch.step(0.1, 0.1),
        Err(WeaveError::Animation(_))
    ));
    assert!(batch.finish_all().is_err());
}

#[test]
fn finish_reports_removers() {
    let (mut a, _) = Probe::new(1.0);
    a.remover = true;
    let target = a.target.clone();
    let (b, _) = Probe::new(1.0);
    let mut batch = Batch::new(vec![a.boxed(), b.boxed()]).unwrap();
    batch.begin_all().unwrap();
    let removed = batch.finish_all().unwrap();
    assert_eq!(removed, vec![target]);
}

#[test]
fn partition_splits_at_first_target() {
    let items: Vec<Item> = (0..4)
        .map(|i| Item::rect(format!("i{i}"), 1.0, 1.0, Rgba8::WHITE))
        .collect();
    let (fixed, moving) = partition_moving(&items, &[items[2].clone()]);
    assert_eq!(fixed, items[..2].to_vec());
    assert_eq!(moving, items[2..].to_vec());
}

#[test]
fn partition_counts_family_updaters() {
    let a = Item::rect("a", 1.0, 1.0, Rgba8::WHITE);
    let child = Item::rect("c", 1.0, 1.0, Rgba8::WHITE);
    let g = Item::group("g", &[child.clone()]);
    let z = Item::rect("z", 1.0, 1.0, Rgba8::WHITE);
    child.add_updater(Updater::timed(|_, _| {}));

    let members = vec![a.clone(), g.clone(), child, z];
    let (fixed, moving) = partition_moving(&members, &[]);
    assert_eq!(fixed, vec![a]);
    assert_eq!(moving.first(), Some(&g));
    assert_eq!(moving.len(), 3);
}

#[test]
fn partition_without_movers_is_all_static() {
    let a = Item::rect("a", 1.0, 1.0, Rgba8::WHITE);
    let (fixed, moving) = partition_moving(std::slice::from_ref(&a), &[]);
    assert_eq!(fixed.len(), 1);
    assert!(moving.is_empty());
}
