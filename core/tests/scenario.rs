//! Scenario filtering, input validation and the full two-scenario run.

use impact_core::{
    config::{
        AttractionFactor, AttractivityFactor, BaseData, Community, CommunitySizes,
        ImpactConfig, ModelConfig, SizeClassBand,
    },
    distance::DistanceIndex,
    error::ImpactError,
    model::{Cell, DistanceRecord, Market, ModelInputs, Scenario},
    progress::{CancelFlag, RecordingProgress},
    scenario::{validate_inputs, ScenarioRunner},
};

fn market(id: i64, chain_id: i64, outlet_status_quo: i64, outlet_planned: i64) -> Market {
    Market {
        id,
        name: format!("Markt {id}"),
        ags: "01003000".into(),
        chain_id,
        outlet_status_quo,
        outlet_planned,
        sales_area: 1200.0,
    }
}

fn cell(id: i64, purchasing_power: f64, planned_area_id: Option<i64>) -> Cell {
    Cell { id, purchasing_power, planned_area_id, ags: "01003000".into(), inhabitants: 0.0 }
}

fn inputs() -> ModelInputs {
    let markets = vec![
        market(1, 5, 3, 3),
        market(2, 5, 3, 0), // closed by the plan
        market(3, 8, 0, 4), // new
        market(4, 0, 1, 1),
        market(5, 0, 2, 2),
    ];
    let cells = vec![
        cell(10, 400_000.0, None),
        cell(11, 300_000.0, None),
        cell(12, 200_000.0, Some(1)),
    ];
    let mut distances = Vec::new();
    for m in &markets {
        for c in &cells {
            distances.push(DistanceRecord {
                market_id: m.id,
                cell_id:   c.id,
                routed_m:  500.0 * m.id as f64 + 300.0 * (c.id - 9) as f64,
                beeline_m: 400.0 * m.id as f64 + 200.0 * (c.id - 9) as f64,
            });
        }
    }
    ModelInputs { markets, cells, distances }
}

#[test]
fn planned_market_without_chain_is_rejected_by_name() {
    let mut markets = inputs().markets;
    markets.push(Market {
        id: 9,
        name: "Neuer Discounter".into(),
        ags: "01003000".into(),
        chain_id: 0,
        outlet_status_quo: 0,
        outlet_planned: 3,
        sales_area: 800.0,
    });

    match validate_inputs(&markets) {
        Err(ImpactError::Validation { markets }) => {
            assert_eq!(markets, vec!["Neuer Discounter".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn existing_markets_without_chain_are_valid() {
    assert!(validate_inputs(&inputs().markets).is_ok());
}

#[test]
fn validation_failure_stops_the_run() {
    let mut data = inputs();
    data.markets[2].chain_id = 0;
    let config = ImpactConfig::default_test();
    let mut progress = RecordingProgress::default();

    let err = ScenarioRunner::new(&config.model, &config.basedata)
        .run(&data, &mut progress, &CancelFlag::new())
        .unwrap_err();

    assert!(err.is_user_correctable());
    assert!(progress.values.is_empty(), "nothing may be computed after a validation failure");
}

#[test]
fn scenarios_only_contain_their_markets_and_cells() {
    let config = ImpactConfig::default_test();
    let outcome = ScenarioRunner::new(&config.model, &config.basedata)
        .run(&inputs(), &mut RecordingProgress::default(), &CancelFlag::new())
        .unwrap();

    let sq = &outcome.status_quo.matrix;
    assert_eq!(sq.markets.ids(), &[1, 2, 4, 5]);
    assert_eq!(sq.cells.ids(), &[10, 11], "planned-area cells belong to the planned scenario only");

    let planned = &outcome.planned.matrix;
    assert_eq!(planned.markets.ids(), &[1, 3, 4, 5]);
    assert_eq!(planned.cells.ids(), &[10, 11, 12]);

    assert!(!planned.contains_market(2));
    assert!(!sq.contains_market(3));
}

#[test]
fn negative_planned_area_id_marks_an_existing_cell() {
    let inputs = ModelInputs {
        markets:   vec![market(1, 5, 3, 3)],
        cells:     vec![cell(20, 1000.0, Some(-1)), cell(21, 500.0, Some(0))],
        distances: vec![
            DistanceRecord { market_id: 1, cell_id: 20, routed_m: 800.0, beeline_m: 600.0 },
            DistanceRecord { market_id: 1, cell_id: 21, routed_m: 900.0, beeline_m: 700.0 },
        ],
    };
    assert!(!inputs.cells[0].is_in_planned_area());
    assert!(inputs.cells[1].is_in_planned_area());

    let config = ImpactConfig::default_test();
    let outcome = ScenarioRunner::new(&config.model, &config.basedata)
        .run_scenario(Scenario::StatusQuo, &inputs, &DistanceIndex::new(&inputs.distances))
        .unwrap();

    assert_eq!(outcome.matrix.cells.ids(), &[20]);
    assert!((outcome.matrix.flow(1, 20) - 1000.0).abs() < 1e-9);
    assert!((outcome.matrix.total() - 1000.0).abs() < 1e-9);
}

#[test]
fn closing_a_sibling_reshapes_clustering() {
    let config = ImpactConfig::default_test();
    let outcome = ScenarioRunner::new(&config.model, &config.basedata)
        .run(&inputs(), &mut RecordingProgress::default(), &CancelFlag::new())
        .unwrap();

    // Status quo: markets 1 and 2 (chain 5) are 0.5 km apart -> two near.
    let sq = &outcome.status_quo;
    let row = sq.matrix.markets.position(1).unwrap();
    assert_eq!(*sq.discounts.get(row, 0), 0.8);

    // Planned: market 2 is closed, market 1 competes with no sibling.
    let planned = &outcome.planned;
    let row = planned.matrix.markets.position(1).unwrap();
    assert_eq!(*planned.discounts.get(row, 0), 1.0);
}

#[test]
fn combined_rows_carry_both_scenarios() {
    let config = ImpactConfig::default_test();
    let outcome = ScenarioRunner::new(&config.model, &config.basedata)
        .run(&inputs(), &mut RecordingProgress::default(), &CancelFlag::new())
        .unwrap();

    let closed = outcome.flows.iter().find(|r| r.market_id == 2 && r.cell_id == 10).unwrap();
    assert!(closed.flow_status_quo > 0.0);
    assert_eq!(closed.flow_planned, 0.0);
    assert_eq!(closed.share_planned, 0.0);

    let new_market = outcome.flows.iter().find(|r| r.market_id == 3 && r.cell_id == 12).unwrap();
    assert_eq!(new_market.flow_status_quo, 0.0);
    assert!(new_market.flow_planned > 0.0);

    let planned_total: f64 = outcome.flows.iter().map(|r| r.flow_planned).sum();
    assert!((planned_total - 900_000.0).abs() < 1e-6);
    let sq_total: f64 = outcome.flows.iter().map(|r| r.flow_status_quo).sum();
    assert!((sq_total - 700_000.0).abs() < 1e-6);

    let mut sorted = outcome.flows.clone();
    sorted.sort_by_key(|r| (r.market_id, r.cell_id));
    assert_eq!(sorted, outcome.flows);
}

#[test]
fn repeated_runs_are_identical() {
    let config = ImpactConfig::default_test();
    let runner = ScenarioRunner::new(&config.model, &config.basedata);
    let data = inputs();

    let a = runner.run(&data, &mut RecordingProgress::default(), &CancelFlag::new()).unwrap();
    let b = runner.run(&data, &mut RecordingProgress::default(), &CancelFlag::new()).unwrap();

    assert_eq!(a.flows, b.flows);
}

#[test]
fn input_order_does_not_change_results() {
    let config = ImpactConfig::default_test();
    let runner = ScenarioRunner::new(&config.model, &config.basedata);
    let data = inputs();
    let mut shuffled = data.clone();
    shuffled.markets.reverse();
    shuffled.cells.reverse();
    shuffled.distances.reverse();

    let a = runner.run(&data, &mut RecordingProgress::default(), &CancelFlag::new()).unwrap();
    let b = runner.run(&shuffled, &mut RecordingProgress::default(), &CancelFlag::new()).unwrap();

    assert_eq!(a.flows, b.flows);
}

#[test]
fn progress_is_monotonic_and_completes() {
    let config = ImpactConfig::default_test();
    let mut progress = RecordingProgress::default();
    ScenarioRunner::new(&config.model, &config.basedata)
        .run(&inputs(), &mut progress, &CancelFlag::new())
        .unwrap();

    assert!(progress.values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.values.last().copied(), Some(100.0));
    assert!(progress.values.iter().all(|v| (0.0..=100.0).contains(v)));
    assert!(!progress.messages.is_empty());
}

#[test]
fn cancelled_run_stops_before_the_first_phase() {
    let config = ImpactConfig::default_test();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = ScenarioRunner::new(&config.model, &config.basedata)
        .run(&inputs(), &mut RecordingProgress::default(), &cancel)
        .unwrap_err();
    assert!(matches!(err, ImpactError::Cancelled { .. }), "got {err:?}");
}

#[test]
fn missing_reference_row_is_fatal() {
    let basedata = BaseData::new(
        vec![AttractionFactor { size_class: 1, chain_id: 0, outlet_type: 3, exp_factor: 1.0, exponent: -0.5 }],
        vec![AttractivityFactor {
            chain_id: 0,
            outlet_type: 3,
            one_near: 1.0,
            two_near: 0.8,
            three_near: 0.6,
            second_with_gap: 0.9,
            third_with_gap_to_first: 0.7,
            third_with_gap_to_first_and_second: 0.5,
        }],
        CommunitySizes {
            classes: vec![SizeClassBand { id: 1, min_inhabitants: 0 }],
            communities: vec![Community { ags: "01003000".into(), inhabitants: 80_000 }],
        },
    );
    let model = ModelConfig::default();

    // market 4 is a local provider (type 1), which has no row here
    let err = ScenarioRunner::new(&model, &basedata)
        .run(&inputs(), &mut RecordingProgress::default(), &CancelFlag::new())
        .unwrap_err();
    assert!(matches!(err, ImpactError::AttractionFactorMissing { outlet_type: 1, .. }), "got {err:?}");
}
