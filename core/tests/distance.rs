//! Distance lookup and kilometre matrix.

use impact_core::{
    distance::DistanceIndex,
    matrix::IdIndex,
    model::DistanceRecord,
    types::UNREACHABLE,
};

fn record(market_id: i64, cell_id: i64, routed_m: f64, beeline_m: f64) -> DistanceRecord {
    DistanceRecord { market_id, cell_id, routed_m, beeline_m }
}

#[test]
fn missing_and_negative_distances_are_unreachable() {
    let index = DistanceIndex::new(&[record(1, 10, 1500.0, 1200.0), record(2, 10, -1.0, 800.0)]);

    assert_eq!(index.distance(1, 10), (1500.0, 1200.0));
    assert_eq!(index.distance(2, 10).0, UNREACHABLE);
    assert_eq!(index.distance(3, 10).0, UNREACHABLE);
    assert!(index.is_reachable(1, 10));
    assert!(!index.is_reachable(2, 10));
}

#[test]
fn km_matrix_adds_normalised_beeline_before_converting() {
    let index = DistanceIndex::new(&[
        record(1, 10, 2000.0, 500.0),
        record(2, 10, 2000.0, 1000.0),
        record(1, 11, -1.0, 300.0),
    ]);
    let markets = IdIndex::new([1, 2]);
    let cells = IdIndex::new([10, 11]);

    let km = index.km_matrix(&markets, &cells);

    // max beeline over reachable pairs is 1000 m
    let a = km.get(0, 0).expect("reachable");
    let b = km.get(1, 0).expect("reachable");
    assert!((a - 2.0005).abs() < 1e-12, "got {a}");
    assert!((b - 2.001).abs() < 1e-12, "got {b}");
    assert!(a < b, "equal routed distances must rank by beeline");

    assert!(km.get(0, 1).is_none());
    assert!(km.get(1, 1).is_none(), "absent pair must be unreachable");
}

#[test]
fn zero_beeline_leaves_routed_distance_untouched() {
    let index = DistanceIndex::new(&[record(1, 10, 2000.0, 0.0)]);
    let km = index.km_matrix(&IdIndex::new([1]), &IdIndex::new([10]));
    assert_eq!(*km.get(0, 0), Some(2.0));
}
