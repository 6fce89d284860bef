//! Allocation properties: normalisation, unreachable cells, flow totals.

use impact_core::{
    config::ImpactConfig,
    distance::DistanceIndex,
    gravity::probabilities,
    matrix::Grid,
    model::{Cell, DistanceRecord, Market, ModelInputs, Scenario},
    scenario::{ScenarioOutcome, ScenarioRunner},
};

fn market(id: i64, chain_id: i64, outlet_type: i64) -> Market {
    Market {
        id,
        name: format!("Markt {id}"),
        ags: "01002000".into(),
        chain_id,
        outlet_status_quo: outlet_type,
        outlet_planned: outlet_type,
        sales_area: 1000.0,
    }
}

fn cell(id: i64, purchasing_power: f64) -> Cell {
    Cell { id, purchasing_power, planned_area_id: None, ags: "01002000".into(), inhabitants: 0.0 }
}

fn dist(market_id: i64, cell_id: i64, routed_m: f64, beeline_m: f64) -> DistanceRecord {
    DistanceRecord { market_id, cell_id, routed_m, beeline_m }
}

fn run(inputs: &ModelInputs) -> ScenarioOutcome {
    let config = ImpactConfig::default_test();
    ScenarioRunner::new(&config.model, &config.basedata)
        .run_scenario(Scenario::Planned, inputs, &DistanceIndex::new(&inputs.distances))
        .expect("scenario run")
}

fn sample_inputs() -> ModelInputs {
    ModelInputs {
        markets: vec![
            market(1, 5, 3),
            market(2, 5, 3),
            market(3, 0, 2),
            market(4, 0, 1),
            market(5, 9, 4),
        ],
        cells: vec![cell(10, 500_000.0), cell(11, 250_000.0), cell(12, 80_000.0)],
        distances: vec![
            dist(1, 10, 1200.0, 900.0),
            dist(2, 10, 1800.0, 1500.0),
            dist(3, 10, 2500.0, 2100.0),
            dist(4, 10, 400.0, 350.0),
            dist(5, 10, 5200.0, 4000.0),
            dist(1, 11, 3100.0, 2600.0),
            dist(2, 11, 900.0, 700.0),
            dist(3, 11, -1.0, 1200.0),
            dist(5, 11, 2200.0, 2000.0),
            // cell 12: every market unreachable or missing
            dist(1, 12, -1.0, 9000.0),
            dist(2, 12, -1.0, 9100.0),
        ],
    }
}

#[test]
fn probabilities_sum_to_one_for_reachable_cells() {
    let outcome = run(&sample_inputs());
    let probs = &outcome.matrix.probabilities;
    for cell_id in [10, 11] {
        let col = outcome.matrix.cells.position(cell_id).unwrap();
        let sum: f64 = probs.column(col).sum();
        assert!((sum - 1.0).abs() < 1e-9, "cell {cell_id}: probabilities sum to {sum}");
    }
}

#[test]
fn cell_without_reachable_market_keeps_its_purchasing_power() {
    let outcome = run(&sample_inputs());
    for market_id in 1..=5 {
        assert_eq!(outcome.matrix.flow(market_id, 12), 0.0);
        assert_eq!(outcome.matrix.binding_share(market_id, 12), 0.0);
    }
    let total = outcome.matrix.total();
    assert!((total - 750_000.0).abs() < 1e-6, "allocated {total}");
}

#[test]
fn flows_are_probability_times_purchasing_power() {
    let outcome = run(&sample_inputs());
    let p = outcome.matrix.probability(1, 10);
    assert!(p > 0.0);
    assert!((outcome.matrix.flow(1, 10) - p * 500_000.0).abs() < 1e-6);
    assert_eq!(outcome.matrix.flow(3, 11), 0.0, "unreachable pair must not draw flow");
}

#[test]
fn binding_shares_per_cell_add_up_to_one() {
    let outcome = run(&sample_inputs());
    let sum: f64 = (1..=5).map(|m| outcome.matrix.binding_share(m, 10)).sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn market_totals_add_up_to_the_allocated_total() {
    let outcome = run(&sample_inputs());
    let by_market: f64 = (1..=5).map(|m| outcome.matrix.market_total(m)).sum();
    assert!((by_market - outcome.matrix.total()).abs() < 1e-6);

    let expected = outcome.matrix.flow(3, 10);
    assert!((outcome.matrix.market_total(3) - expected).abs() < 1e-9, "market 3 only reaches cell 10");
    assert_eq!(outcome.matrix.market_total(99), 0.0, "unknown market draws nothing");
}

#[test]
fn nearer_market_of_same_profile_draws_more() {
    let inputs = ModelInputs {
        markets:   vec![market(1, 0, 3), market(2, 0, 3)],
        cells:     vec![cell(10, 100_000.0)],
        distances: vec![dist(1, 10, 1000.0, 0.0), dist(2, 10, 3000.0, 0.0)],
    };
    let outcome = run(&inputs);
    assert!(outcome.matrix.flow(1, 10) > outcome.matrix.flow(2, 10));

    // exp(-0.45 * 1) / (exp(-0.45) + exp(-0.45 * 3)) for size class 2
    let a = (-0.45_f64).exp();
    let b = (-1.35_f64).exp();
    let expected = a / (a + b) * 100_000.0;
    assert!((outcome.matrix.flow(1, 10) - expected).abs() < 1e-6);
}

#[test]
fn zero_and_non_finite_columns_normalise_to_zero() {
    let mut attraction = Grid::zeros(2, 3);
    attraction.set(0, 0, 2.0);
    attraction.set(1, 0, 6.0);
    attraction.set(0, 2, f64::NAN);

    let probs = probabilities(&attraction);
    assert_eq!(*probs.get(0, 0), 0.25);
    assert_eq!(*probs.get(1, 0), 0.75);
    assert!(probs.column(1).all(|p| *p == 0.0));
    assert!(probs.column(2).all(|p| *p == 0.0));
}
