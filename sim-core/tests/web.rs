//! Browser-side checks for the `Simulation` handle.
#![cfg(target_arch = "wasm32")]

use minwage_sim::{ScenarioConfig, SimConfig, Simulation, StepWindow};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn simulation_runs_in_browser() {
    let config = SimConfig::default().with_steps(8);
    let Ok(mut sim) = Simulation::new(config, ScenarioConfig::default()) else {
        panic!("default scenario should be valid");
    };
    sim.run();

    assert_eq!(sim.get_step(), 8);
    assert_eq!(sim.get_grid_snapshot().firms.len(), 100);
    assert_eq!(sim.metric_series("unemployed").unwrap().len(), 8);

    let estimate = sim.did(
        "treated_employment",
        "control_employment",
        StepWindow::new(0, 3),
        StepWindow::new(4, 7),
    );
    assert!(matches!(estimate, Ok(v) if v.is_finite()));
}
