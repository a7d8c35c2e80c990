use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tripcanvas::config::CanvasConfig;
use tripcanvas::conflict::*;
use tripcanvas::model::{Block, SnapPosition};
use tripcanvas::time::DateRange;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 15, 0, 0, 0).unwrap()
}

fn at_minutes(m: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(m)
}

fn timed(id: &str, start_min: i64, end_min: i64) -> Block {
    let range = if start_min == end_min {
        DateRange::instant(at_minutes(start_min))
    } else {
        DateRange::new(at_minutes(start_min), at_minutes(end_min)).unwrap()
    };
    Block::with_id(id, tripcanvas::BlockKind::Generic, id, 0.0, 0.0, 10.0, 10.0).timed(range, t0())
}

fn untimed(id: &str) -> Block {
    Block::with_id(id, tripcanvas::BlockKind::Generic, id, 0.0, 0.0, 10.0, 10.0)
}

#[test]
fn overlapping_ranges_are_overlap() {
    // A: 0–2h, B: 1–3h
    let a = timed("a", 0, 120);
    let b = timed("b", 60, 180);
    assert_eq!(classify(&a, &b), ConflictKind::Overlap);
}

#[test]
fn fifteen_minute_gap_is_insufficient() {
    // A ends at 5h00, B starts at 5h15
    let a = timed("a", 240, 300);
    let b = timed("b", 315, 400);
    assert_eq!(classify(&a, &b), ConflictKind::InsufficientGap);
    assert_eq!(classify(&b, &a), ConflictKind::InsufficientGap);
}

#[test]
fn gap_boundaries() {
    let a = timed("a", 0, 60);
    // Touching: zero gap is fine.
    assert_eq!(classify(&a, &timed("b", 60, 90)), ConflictKind::None);
    // Exactly the threshold is fine.
    assert_eq!(classify(&a, &timed("b", 90, 120)), ConflictKind::None);
    assert_eq!(classify(&a, &timed("b", 89, 120)), ConflictKind::InsufficientGap);
    assert_eq!(classify_with_gap(&a, &timed("b", 89, 120), 10.0), ConflictKind::None);
}

#[test]
fn zero_duration_boundary_behaviour() {
    let instant = timed("i", 120, 120);
    // Same instant twice: strict inequalities never fire.
    assert_eq!(classify(&instant, &timed("j", 120, 120)), ConflictKind::None);
    // An instant at the end of a range only touches it.
    assert_eq!(classify(&instant, &timed("r", 60, 120)), ConflictKind::None);
    assert_eq!(classify(&instant, &timed("r", 120, 180)), ConflictKind::None);
    // Strictly inside a range it does overlap.
    assert_eq!(classify(&instant, &timed("r", 60, 180)), ConflictKind::Overlap);
}

#[test]
fn untimed_blocks_never_conflict() {
    let a = untimed("a");
    let b = untimed("b");
    assert_eq!(classify(&a, &b), ConflictKind::None);
    assert_eq!(classify(&a, &timed("c", 0, 60)), ConflictKind::None);
    assert!(fits_within(&a, &timed("c", 0, 60)));
    assert!(fits_within(&timed("c", 0, 60), &b));
}

#[test]
fn containment_requires_subset() {
    let parent = timed("p", 0, 600);
    assert!(fits_within(&parent, &timed("c", 120, 180)));
    assert!(fits_within(&parent, &timed("c", 0, 600)));
    assert!(!fits_within(&parent, &timed("c", 540, 660)));
}

#[test]
fn timing_conflict_messages_name_both_blocks() {
    let cfg = CanvasConfig::default();
    let c = check_timing_conflict(&timed("a", 0, 120), &timed("b", 60, 180), &cfg);
    assert_eq!(c.kind, ConflictKind::Overlap);
    assert_eq!(c.conflicting_blocks, vec!["a", "b"]);
    assert_eq!(c.message, "a overlaps with b");

    let none = check_timing_conflict(&timed("a", 0, 60), &timed("b", 300, 360), &cfg);
    assert_eq!(none.kind, ConflictKind::None);
    assert!(none.conflicting_blocks.is_empty());
}

#[test]
fn snap_group_membership_checks_every_member() {
    let cfg = CanvasConfig::default();
    let m1 = timed("m1", 0, 60);
    let m2 = timed("m2", 300, 360);
    let group = [&m1, &m2];
    let ok = can_add_to_snap_group(&timed("n", 120, 180), &group, &cfg);
    assert_eq!(ok.kind, ConflictKind::None);
    let bad = can_add_to_snap_group(&timed("n", 330, 420), &group, &cfg);
    assert_eq!(bad.kind, ConflictKind::Overlap);
    assert_eq!(bad.conflicting_blocks, vec!["n", "m2"]);
}

#[test]
fn snap_positions_follow_start_order() {
    let m1 = timed("m1", 0, 60);
    let m2 = timed("m2", 300, 360);
    let group = [&m1, &m2];
    assert_eq!(snap_position(&timed("n", 120, 180), &group), SnapPosition::Center);
    assert_eq!(snap_position(&timed("n", -120, -60), &group), SnapPosition::Left);
    assert_eq!(snap_position(&timed("n", 600, 660), &group), SnapPosition::Right);
    assert_eq!(snap_position(&timed("n", 600, 660), &[]), SnapPosition::Center);
}

#[test]
fn group_metrics_span_all_members() {
    let mut m1 = timed("m1", 0, 60);
    m1.height = 40.0;
    let m2 = timed("m2", 300, 360);
    let m = snap_group_metrics(&[&m1, &m2, &untimed("u")]);
    assert_eq!(m.start, Some(at_minutes(0)));
    assert_eq!(m.end, Some(at_minutes(360)));
    assert_eq!(m.total_hours, 6.0);
    assert_eq!(m.height, 40.0);

    let empty = snap_group_metrics(&[]);
    assert_eq!(empty.start, None);
    assert_eq!(empty.total_hours, 0.0);
}

proptest! {
    #[test]
    fn classification_is_symmetric(
        a_start in -2000i64..2000, a_len in 0i64..600,
        b_start in -2000i64..2000, b_len in 0i64..600,
    ) {
        let a = timed("a", a_start, a_start + a_len);
        let b = timed("b", b_start, b_start + b_len);
        prop_assert_eq!(classify(&a, &b), classify(&b, &a));
    }
}
