use super::*;

#[test]
fn same_seed_same_sequence() {
    let mut a = Rng64::new(42);
    let mut b = Rng64::new(42);
    for _ in 0..16 {
        assert_eq!(a.next_u64(), b.next_u64());
    }
}

#[test]
fn unit_interval_is_half_open() {
    let mut r = Rng64::new(0);
    for _ in 0..1000 {
        let v = r.next_f64_01();
        assert!((0.0..1.0).contains(&v));
    }
}

#[test]
fn range_stays_within_bounds() {
    let mut r = Rng64::new(9);
    for _ in 0..1000 {
        let v = r.range_f64(-2.0, 3.0);
        assert!((-2.0..3.0).contains(&v));
    }
    assert_eq!(Rng64::new(9).range_f64(1.0, 1.0), 1.0);
}
