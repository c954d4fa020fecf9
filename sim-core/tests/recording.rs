//! Event logging through `tracing` into instrument tables.
#![cfg(feature = "instrument")]

use minwage_sim::{
    Metric, ScenarioConfig, Sector, ShockConfig, ShockKind, SimConfig, SimEvent, TracingSink,
    build_controller, instrument,
};
use polars::prelude::*;

fn config() -> SimConfig {
    SimConfig::default().with_seed(3).with_shock(ShockConfig {
        step: 4,
        kind: ShockKind::SectorOverride {
            target_wage: 40.0,
            sector: Sector::FastFood,
        },
    })
}

fn scenario() -> ScenarioConfig {
    ScenarioConfig {
        budget: 400.0,
        ..ScenarioConfig::default()
    }
}

fn count(events: &[SimEvent], pred: impl Fn(&SimEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn recording_has_one_row_per_event() {
    let mut reference = build_controller(config(), &scenario()).unwrap();
    let mut events = Vec::new();
    reference.run_with(&mut events);

    instrument::clear();
    let mut traced = build_controller(config(), &scenario()).unwrap();
    tracing::subscriber::with_default(instrument::EventLogSubscriber, || {
        traced.run_with(&mut TracingSink);
    });
    let log = instrument::drain();

    let rows = |target: &str| log.table(target).map_or(0, |t| t.rows());
    assert_eq!(rows("step"), 20);
    assert_eq!(
        rows("shock"),
        count(&events, |e| matches!(e, SimEvent::ShockApplied { .. }))
    );
    assert_eq!(rows("layoff"), count(&events, |e| matches!(e, SimEvent::Layoff { .. })));
    assert_eq!(
        rows("automation"),
        count(&events, |e| matches!(e, SimEvent::Automation { .. }))
    );
    assert_eq!(rows("hire"), count(&events, |e| matches!(e, SimEvent::Hire { .. })));
    assert_eq!(
        rows("exit"),
        count(&events, |e| matches!(e, SimEvent::ExitedLaborForce { .. }))
    );
    assert!(rows("shock") > 0, "the sector override should hit some zone firm");
}

#[test]
fn recording_step_table_matches_metrics() {
    instrument::clear();
    let mut controller = build_controller(config(), &scenario()).unwrap();
    tracing::subscriber::with_default(instrument::EventLogSubscriber, || {
        controller.run();
    });

    let steps = instrument::drain()
        .table("step")
        .unwrap()
        .to_dataframe()
        .unwrap();
    assert_eq!(steps.height(), 20);

    let employed: Vec<u64> = steps
        .column("employed")
        .unwrap()
        .as_materialized_series()
        .u64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    let expected: Vec<u64> = controller
        .metrics()
        .metric(Metric::TotalEmployment)
        .iter()
        .map(|&v| v as u64)
        .collect();
    assert_eq!(employed, expected);
}

#[test]
fn recording_metrics_frame_has_every_series() {
    let mut controller = build_controller(config(), &scenario()).unwrap();
    controller.run();

    let df = controller.metrics().to_dataframe().unwrap();
    assert_eq!(df.height(), 20);
    assert_eq!(df.width(), Metric::ALL.len() + 1);
    assert!(df.column("step").is_ok());
    assert!(df.column("treated_mean_employment").is_ok());
}

#[test]
fn recording_run_recorder_writes_csv() {
    let parent = std::env::temp_dir().join(format!("minwage-recording-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&parent);

    {
        let mut rec = instrument::RunRecorder::new(&parent, "sector_shock");
        let mut controller = build_controller(config(), &scenario()).unwrap();
        controller.run();
        rec.add_frame("metrics", controller.metrics().to_dataframe().unwrap());
    }

    let run_dir = parent.join("sector_shock");
    assert!(run_dir.join("metrics.csv").exists());
    assert!(run_dir.join("step.csv").exists());
    let _ = std::fs::remove_dir_all(&parent);
}
