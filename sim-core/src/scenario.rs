//! Grid and worker-pool construction.
//!
//! Builds the initial world a [`StepController`] runs on: a lattice of
//! identical firms, the shock zone marked at creation, sectors drawn per
//! firm, and workers placed at random cells with room.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::agents::{Firm, Fiscal, WorkerPool};
use crate::config::{ScenarioConfig, SimConfig};
use crate::error::ConfigError;
use crate::geography::Grid;
use crate::tick::StepController;
use crate::types::{Sector, WorkerId};

/// Build the firm lattice. Consumes one sector draw per firm in scan order.
pub fn build_grid<R: Rng>(scenario: &ScenarioConfig, rng: &mut R) -> Grid {
    let fiscal = Fiscal::new(scenario.fiscal_regime, scenario.budget, scenario.revenue_per_step);

    Grid::from_fn(scenario.width, scenario.height, |coord| {
        let roll: f64 = rng.random();
        let sector = if roll < scenario.fast_food_share {
            Sector::FastFood
        } else {
            Sector::Other
        };
        Firm::new(coord, scenario.wage, scenario.capacity, fiscal)
            .with_sector(sector)
            .with_shock_zone(scenario.shock_zone.contains(coord))
            .with_automation_prob(scenario.automation_prob)
    })
}

/// Workers with ids `0..scenario.workers`, none yet placed.
pub fn build_workers(scenario: &ScenarioConfig) -> WorkerPool {
    WorkerPool::new(scenario.workers)
}

/// Place every worker at a uniformly random firm, redrawing while the
/// drawn firm is full.
pub fn assign_workers<R: Rng>(
    grid: &mut Grid,
    workers: &mut WorkerPool,
    rng: &mut R,
) -> Result<(), ConfigError> {
    let open_slots: u64 = grid.iter().map(|f| f.vacancies() as u64).sum();
    if workers.len() as u64 > open_slots {
        return Err(ConfigError::InsufficientCapacity {
            workers: workers.len(),
            capacity: open_slots,
        });
    }

    let ids: Vec<WorkerId> = workers.ids().collect();
    for id in ids {
        loop {
            let coord = grid.random_coord(rng);
            if grid[coord].hire(id).is_ok() {
                workers[id].accept_offer(coord);
                break;
            }
        }
    }
    Ok(())
}

/// A validated world ready to run, sharing one random stream from
/// construction through the last step.
pub fn build_controller(
    config: SimConfig,
    scenario: &ScenarioConfig,
) -> Result<StepController, ConfigError> {
    config.validate()?;
    scenario.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut grid = build_grid(scenario, &mut rng);
    let mut workers = build_workers(scenario);
    assign_workers(&mut grid, &mut workers, &mut rng)?;

    StepController::with_rng(config, grid, workers, rng)
}
