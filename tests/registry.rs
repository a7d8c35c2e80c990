use chrono::{DateTime, Duration, TimeZone, Utc};
use tripcanvas::config::{CanvasConfig, PlacementPolicy};
use tripcanvas::model::*;
use tripcanvas::registry::*;
use tripcanvas::snap::SnapResult;
use tripcanvas::time::{DateRange, TripTimeline};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 15, 0, 0, 0).unwrap()
}

fn span(start_h: i64, end_h: i64) -> DateRange {
    DateRange::new(t0() + Duration::hours(start_h), t0() + Duration::hours(end_h)).unwrap()
}

fn timeline() -> TripTimeline {
    TripTimeline::new(t0(), t0() + Duration::days(7)).unwrap()
}

fn flight(id: &str, x: f64, y: f64) -> Block {
    let kind = BlockKind::Flight(FlightData {
        segments: Vec::new(),
        departure_airport: "JFK".into(),
        arrival_airport: "LAX".into(),
        context_bar_height: 24.0,
        segment_height: 80.0,
    });
    // Width is derived from the 10h duration once the block is registered.
    Block::with_id(id, kind, "Flight", x, y, 1.0, 280.0).timed(span(0, 10), t0())
}

fn activity(id: &str, x: f64, y: f64, start_h: i64, end_h: i64) -> Block {
    let kind = BlockKind::Activity(ActivityData {
        category: ActivityCategory::Sightseeing,
        location: "Pier".into(),
    });
    Block::with_id(id, kind, id, x, y, 50.0, 50.0).timed(span(start_h, end_h), t0())
}

fn generic(id: &str, x: f64, y: f64, w: f64, h: f64) -> Block {
    Block::with_id(id, BlockKind::Generic, id, x, y, w, h)
}

fn registry(blocks: Vec<Block>) -> BlockRegistry {
    BlockRegistry::with_blocks(timeline(), CanvasConfig::default(), blocks).unwrap()
}

#[test]
fn add_derives_width_and_rejects_duplicates() {
    let mut reg = BlockRegistry::new(timeline(), CanvasConfig::default());
    assert!(reg.is_empty());
    reg.add_block(flight("f", 100.0, 0.0)).unwrap();
    assert_eq!(reg.get("f").unwrap().width, 500.0);

    let rels = reg.add_block(activity("a", 200.0, 214.0, 2, 3)).unwrap();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].parent.id, "f");

    let err = reg.add_block(generic("a", 0.0, 0.0, 1.0, 1.0)).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateId("a".into()));
    assert_eq!(reg.len(), 2);
}

#[test]
fn with_blocks_rejects_duplicates() {
    let res = BlockRegistry::with_blocks(
        timeline(),
        CanvasConfig::default(),
        vec![generic("x", 0.0, 0.0, 1.0, 1.0), generic("x", 5.0, 5.0, 1.0, 1.0)],
    );
    assert!(matches!(res, Err(RegistryError::DuplicateId(id)) if id == "x"));
}

#[test]
fn update_merges_fields() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 900.0, 900.0, 2, 3)]);

    reg.update_block(
        "a",
        BlockPatch {
            title: Some("Museum".into()),
            width: Some(80.0),
            ..Default::default()
        },
    )
    .unwrap();
    let a = reg.get("a").unwrap();
    assert_eq!((a.title.as_str(), a.x, a.width), ("Museum", 900.0, 80.0));

    reg.update_block(
        "f",
        BlockPatch {
            width: Some(42.0),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(reg.get("f").unwrap().width, 500.0, "flight width follows its duration");

    reg.update_block(
        "f",
        BlockPatch {
            date_range: Some(span(24, 36)),
            ..Default::default()
        },
    )
    .unwrap();
    let f = reg.get("f").unwrap();
    assert_eq!(f.width, 600.0);
    assert_eq!(f.timing.unwrap().start_hour, 24.0);

    assert_eq!(
        reg.update_block("nope", BlockPatch::position(1.0, 1.0)).unwrap_err(),
        RegistryError::NotFound("nope".into())
    );
}

#[test]
fn update_recomputes_relationships() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 900.0, 900.0, 2, 3)]);
    assert!(reg.relationships().is_empty());
    let rels = reg.update_block("a", BlockPatch::position(200.0, 214.0)).unwrap();
    assert_eq!(rels.len(), 1);
    assert_eq!(reg.relationship_for_block("a").map(|r| r.parent.id.as_str()), Some("f"));
}

#[test]
fn removing_a_group_member_releases_the_rest() {
    let mut blocks = vec![
        generic("x", 0.0, 0.0, 10.0, 10.0),
        generic("y", 100.0, 0.0, 10.0, 10.0),
        generic("z", 200.0, 0.0, 10.0, 10.0),
    ];
    for b in &mut blocks {
        b.snap = SnapMeta {
            snap_group_id: Some("g1".into()),
            is_snapped: true,
            snap_position: Some(SnapPosition::Center),
        };
    }
    let mut reg = registry(blocks);
    assert_eq!(reg.snap_group("g1").len(), 3);

    reg.remove_block("y").unwrap();
    assert!(reg.get("y").is_none());
    assert!(reg.snap_group("g1").is_empty());
    for id in ["x", "z"] {
        let b = reg.get(id).unwrap();
        assert_eq!(b.snap, SnapMeta::default());
    }
    assert_eq!(reg.blocks().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec!["x", "z"]);
    assert_eq!(reg.remove_block("y").unwrap_err(), RegistryError::NotFound("y".into()));
}

#[test]
fn removing_a_parent_drops_its_relationship() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 200.0, 214.0, 2, 3)]);
    assert_eq!(reg.relationships().len(), 1);
    let rels = reg.remove_block("f").unwrap();
    assert!(rels.is_empty());
}

#[test]
fn moving_a_parent_carries_children() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 200.0, 214.0, 2, 3)]);
    let rels = reg.move_block("f", 0.0, 40.0).unwrap().to_vec();
    let a = reg.get("a").unwrap();
    assert_eq!((a.x, a.y), (100.0, 254.0));
    assert_eq!(rels.len(), 1, "relationship survives the move");
}

#[test]
fn snapped_drop_joins_a_group() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 800.0, 600.0, 2, 3)]);
    let snap = reg.find_snap_target("a", 350.0, 140.0).unwrap();
    let outcome = reg.commit_drop("a", 350.0, 140.0, &snap).unwrap();

    let DropOutcome::Snapped { target_id, group_id } = outcome else {
        panic!("expected a snap");
    };
    assert_eq!(target_id, "f");
    assert!(group_id.starts_with("group-"));

    let a = reg.get("a").unwrap();
    assert_eq!((a.x, a.y), (200.0, 214.0));
    assert!(a.snap.is_snapped);
    assert_eq!(a.snap.snap_position, Some(SnapPosition::Right));
    assert_eq!(reg.get("f").unwrap().snap.snap_position, Some(SnapPosition::Left));
    assert_eq!(reg.snap_group(&group_id).len(), 2);
    assert!(reg.relationships()[0].has_child("a"));

    // Dropping it somewhere free dissolves the two-member group.
    let free = SnapResult::free(1500.0, 1500.0);
    let outcome = reg.commit_drop("a", 1500.0, 1500.0, &free).unwrap();
    assert_eq!(outcome, DropOutcome::Free { advisory: None });
    assert!(reg.snap_group(&group_id).is_empty());
    assert_eq!(reg.get("f").unwrap().snap, SnapMeta::default());
    assert!(reg.relationships().is_empty());
}

#[test]
fn dropping_a_parent_moves_the_group() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 200.0, 214.0, 2, 3)]);
    let snap = reg.find_snap_target("f", 300.0, 50.0).unwrap();
    let outcome = reg.commit_drop("f", 300.0, 50.0, &snap).unwrap();
    assert_eq!(outcome, DropOutcome::GroupMoved { child_ids: vec!["a".into()] });
    let a = reg.get("a").unwrap();
    assert_eq!((a.x, a.y), (400.0, 264.0));
}

#[test]
fn rejected_snap_stays_at_the_drop_point() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("late", 800.0, 600.0, 11, 12)]);
    let snap = reg.find_snap_target("late", 350.0, 140.0).unwrap();
    let outcome = reg.commit_drop("late", 350.0, 140.0, &snap).unwrap();
    assert!(matches!(outcome, DropOutcome::Rejected { .. }));
    let b = reg.get("late").unwrap();
    assert_eq!((b.x, b.y), (350.0, 140.0));
}

#[test]
fn free_drop_of_untimed_block_uses_the_grid() {
    let mut reg = registry(vec![generic("g", 0.0, 0.0, 40.0, 40.0)]);
    let outcome = reg.commit_drop("g", 333.0, 347.0, &SnapResult::free(333.0, 347.0)).unwrap();
    assert_eq!(outcome, DropOutcome::Free { advisory: None });
    let g = reg.get("g").unwrap();
    assert_eq!((g.x, g.y), (340.0, 340.0));

    let mut reg = registry(vec![activity("t", 0.0, 0.0, 1, 2)]);
    reg.commit_drop("t", 333.0, 347.0, &SnapResult::free(333.0, 347.0)).unwrap();
    let t = reg.get("t").unwrap();
    assert_eq!((t.x, t.y), (333.0, 347.0), "timed blocks are not grid-rounded");
}

#[test]
fn overlap_policy() {
    let blocks = vec![generic("a", 0.0, 0.0, 100.0, 100.0), generic("b", 200.0, 200.0, 50.0, 50.0)];

    let mut advisory = registry(blocks.clone());
    let outcome = advisory.commit_drop("b", 80.0, 80.0, &SnapResult::free(80.0, 80.0)).unwrap();
    assert!(matches!(outcome, DropOutcome::Free { advisory: Some(_) }));
    let b = advisory.get("b").unwrap();
    assert_eq!((b.x, b.y), (80.0, 80.0));

    let config = CanvasConfig {
        placement_policy: PlacementPolicy::Blocking,
        ..CanvasConfig::default()
    };
    let mut blocking = BlockRegistry::with_blocks(timeline(), config, blocks).unwrap();
    let outcome = blocking.commit_drop("b", 80.0, 80.0, &SnapResult::free(80.0, 80.0)).unwrap();
    assert!(matches!(outcome, DropOutcome::Blocked { .. }));
    let b = blocking.get("b").unwrap();
    assert_eq!((b.x, b.y), (200.0, 200.0));
}

#[test]
fn commit_drop_unknown_block() {
    let mut reg = registry(Vec::new());
    let err = reg.commit_drop("ghost", 0.0, 0.0, &SnapResult::free(0.0, 0.0)).unwrap_err();
    assert_eq!(err, RegistryError::NotFound("ghost".into()));
    assert!(reg.find_snap_target("ghost", 0.0, 0.0).is_err());
    assert!(reg.validate_placement("ghost", 0.0, 0.0).is_err());
}

#[test]
fn scale_changes_resize_timed_flights() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 200.0, 214.0, 2, 3)]);
    reg.set_scale(100.0).unwrap();
    assert_eq!(reg.get("f").unwrap().width, 1000.0);
    assert_eq!(reg.get("a").unwrap().width, 50.0, "activity width is not derived");

    reg.reset_zoom();
    reg.zoom_in();
    assert!((reg.get("f").unwrap().width - 600.0).abs() < 1e-6);
    reg.zoom_out();
    assert!((reg.timeline().scale - 50.0).abs() < 1e-9);

    assert!(matches!(reg.set_scale(-1.0), Err(RegistryError::Time(_))));
}

fn hotel(id: &str, x: f64, y: f64, start_h: i64, end_h: i64) -> Block {
    let kind = BlockKind::Hotel(HotelData {
        hotel_name: "Grand".into(),
        location: "LA".into(),
        events: Vec::new(),
        context_bar_height: 20.0,
        event_height: 28.0,
    });
    Block::with_id(id, kind, "Hotel", x, y, 1.0, 110.0).timed(span(start_h, end_h), t0())
}

#[test]
fn zoom_keeps_nested_hotels_inside_their_flight() {
    // Hotel covers hours 7 to 10 of the flight, flush with its right edge.
    let mut reg = registry(vec![flight("f", 100.0, 0.0), hotel("h", 450.0, 104.0, 7, 10)]);
    assert_eq!(reg.get("h").unwrap().width, 150.0);
    assert_eq!(reg.relationships().len(), 1);

    let rels = reg.zoom_out();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].children[0].id, "h");
    let f = reg.get("f").unwrap();
    let h = reg.get("h").unwrap();
    assert!((f.width - 500.0 / 1.2).abs() < 1e-6);
    assert!((h.x - (100.0 + 0.7 * f.width)).abs() < 1e-6);
    assert!(f.rect().contains_rect(h.rect(), 0.5));

    reg.zoom_in();
    reg.zoom_in();
    assert_eq!(reg.relationships().len(), 1);
    assert!((reg.get("h").unwrap().x - (100.0 + 0.7 * 600.0)).abs() < 1e-6);

    reg.reset_zoom();
    assert_eq!(reg.relationships().len(), 1);
    assert!((reg.get("h").unwrap().x - 450.0).abs() < 1e-6);
}

#[test]
fn zoom_keeps_untimed_children_at_their_fraction() {
    let mut reg = registry(vec![flight("f", 100.0, 0.0), activity("a", 400.0, 214.0, 6, 7)]);
    reg.set_scale(100.0).unwrap();
    assert!((reg.get("a").unwrap().x - 700.0).abs() < 1e-6);
    assert_eq!(reg.relationships().len(), 1);
}
