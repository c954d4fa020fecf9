use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

pub mod agents;
pub mod config;
pub mod did;
pub mod error;
pub mod events;
pub mod geography;
pub mod metrics;
pub mod scenario;
pub mod shock;
pub mod tick;
pub mod types;

#[cfg(feature = "instrument")]
pub use instrument;

pub use agents::{
    Firm, Fiscal, Opening, SearchOutcome, Separation, SeparationKind, WAGE_FLOOR, Worker,
    WorkerPool, WorkerState,
};
pub use config::{FiscalRegime, ScenarioConfig, ShockConfig, ShockKind, SimConfig};
pub use did::{StepWindow, did, did_from_metrics, event_study};
pub use error::{ConfigError, DidError, HireError};
pub use events::{DefaultSink, EventSink, NullSink, SimEvent};
#[cfg(feature = "instrument")]
pub use events::TracingSink;
pub use geography::Grid;
pub use metrics::{Metric, MetricsSeries, StepSnapshot};
pub use scenario::{assign_workers, build_controller, build_grid, build_workers};
pub use shock::apply_shock;
pub use tick::StepController;
pub use types::{FirmCoord, Price, Sector, Step, WorkerId, Zone};

// ============================================================================
// WASM API - Simulation
// ============================================================================

/// Per-firm view for rendering the grid.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct FirmSnapshot {
    pub coord: FirmCoord,
    pub wage: Price,
    pub capacity: u32,
    pub employed: u32,
    pub automated_roles: u32,
    pub sector: Sector,
    pub is_shock_zone: bool,
    pub stressed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct GridSnapshot {
    pub step: Step,
    pub width: u32,
    pub height: u32,
    pub firms: Vec<FirmSnapshot>,
}

impl GridSnapshot {
    pub fn capture(step: Step, grid: &Grid) -> Self {
        GridSnapshot {
            step,
            width: grid.width(),
            height: grid.height(),
            firms: grid
                .iter()
                .map(|f| FirmSnapshot {
                    coord: f.coord,
                    wage: f.wage(),
                    capacity: f.capacity(),
                    employed: f.employed_count() as u32,
                    automated_roles: f.automated_roles(),
                    sector: f.sector,
                    is_shock_zone: f.is_shock_zone,
                    stressed: f.is_stressed(),
                })
                .collect(),
        }
    }
}

#[wasm_bindgen]
pub struct Simulation {
    controller: StepController,
}

#[wasm_bindgen]
impl Simulation {
    #[wasm_bindgen(constructor)]
    pub fn new(config: SimConfig, scenario: ScenarioConfig) -> Result<Simulation, JsError> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        let controller = build_controller(config, &scenario)?;
        Ok(Self { controller })
    }

    /// Advance the simulation by one step. Returns false once the run is over.
    #[wasm_bindgen]
    pub fn advance_step(&mut self) -> bool {
        self.controller.advance().is_some()
    }

    /// Run every remaining step.
    #[wasm_bindgen]
    pub fn run(&mut self) {
        self.controller.run();
    }

    /// Number of completed steps
    #[wasm_bindgen]
    pub fn get_step(&self) -> Step {
        self.controller.step()
    }

    #[wasm_bindgen]
    pub fn is_finished(&self) -> bool {
        self.controller.is_finished()
    }

    /// Get a snapshot of the grid for rendering
    #[wasm_bindgen]
    pub fn get_grid_snapshot(&self) -> GridSnapshot {
        GridSnapshot::capture(self.controller.step(), self.controller.grid())
    }

    #[wasm_bindgen]
    pub fn metric_names(&self) -> Vec<String> {
        self.controller
            .metrics()
            .names()
            .map(str::to_string)
            .collect()
    }

    /// One metric's per-step values, or undefined for an unknown name.
    #[wasm_bindgen]
    pub fn metric_series(&self, name: &str) -> Option<Vec<f64>> {
        self.controller.metrics().get(name).map(<[f64]>::to_vec)
    }

    /// All series as a `{ name: number[] }` object.
    #[wasm_bindgen]
    pub fn all_metrics(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(self.controller.metrics())?)
    }

    /// Difference-in-differences between two recorded series.
    #[wasm_bindgen]
    pub fn did(
        &self,
        treated: &str,
        control: &str,
        pre: StepWindow,
        post: StepWindow,
    ) -> Result<f64, JsError> {
        Ok(did_from_metrics(
            self.controller.metrics(),
            treated,
            control,
            pre,
            post,
        )?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn simulation(config: SimConfig, scenario: ScenarioConfig) -> Simulation {
        match Simulation::new(config, scenario) {
            Ok(sim) => sim,
            Err(_) => panic!("scenario should be valid"),
        }
    }

    fn small_scenario() -> ScenarioConfig {
        ScenarioConfig {
            width: 4,
            height: 4,
            workers: 20,
            capacity: 3,
            shock_zone: Zone::new(0..2, 0..4),
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn test_simulation_runs_to_completion() {
        let config = SimConfig::default().with_steps(6);
        let mut sim = simulation(config, small_scenario());

        assert!(sim.advance_step());
        assert_eq!(sim.get_step(), 1);
        sim.run();
        assert!(sim.is_finished());
        assert!(!sim.advance_step());
        assert_eq!(sim.get_step(), 6);

        let employment = sim.metric_series("total_employment").unwrap();
        assert_eq!(employment.len(), 6);
        assert!(sim.metric_series("nope").is_none());
        assert_eq!(sim.metric_names().len(), Metric::ALL.len());
    }

    #[test]
    fn test_grid_snapshot_matches_grid() {
        let sim = simulation(SimConfig::default(), small_scenario());
        let snapshot = sim.get_grid_snapshot();

        assert_eq!(snapshot.firms.len(), 16);
        let employed: u32 = snapshot.firms.iter().map(|f| f.employed).sum();
        assert_eq!(employed, 20);
        assert_eq!(snapshot.firms.iter().filter(|f| f.is_shock_zone).count(), 8);
    }

    #[test]
    fn test_did_over_run() {
        let config = SimConfig::default().with_steps(6);
        let mut sim = simulation(config, small_scenario());
        sim.run();

        let estimate = sim.did(
            "treated_mean_employment",
            "control_mean_employment",
            StepWindow::new(0, 2),
            StepWindow::new(3, 5),
        );
        assert!(matches!(estimate, Ok(v) if v.is_finite()));
    }
}
