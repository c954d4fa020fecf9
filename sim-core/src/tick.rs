use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::agents::{Opening, SearchOutcome, SeparationKind, WorkerPool};
use crate::config::{SimConfig, check_probability, check_resource, check_wage};
use crate::error::ConfigError;
use crate::events::{DefaultSink, EventSink, SimEvent};
use crate::geography::Grid;
use crate::metrics::{self, MetricsSeries, StepSnapshot};
use crate::shock::apply_shock;
use crate::types::{Step, WorkerId};

// === STEP CONTROLLER ===

/*
Step order
- (a) policy shock, if this is the shock step
- (b) every firm: adjust_workforce, then pay_workers
- (c) every unemployed, non-exited worker not separated this step: mobility
- (d) snapshot metrics

(b) before (c): workers search against firms that have already resolved
insolvency at this step's wages.
*/

/// Drives firms and workers through a fixed number of steps.
///
/// All randomness comes from the one stream owned here, consumed in grid
/// scan order for firms and id order for workers.
#[derive(Debug, Clone)]
pub struct StepController {
    config: SimConfig,
    grid: Grid,
    workers: WorkerPool,
    rng: StdRng,
    step: Step,
    metrics: MetricsSeries,
}

impl StepController {
    /// Seeds the random stream from `config.seed`.
    pub fn new(config: SimConfig, grid: Grid, workers: WorkerPool) -> Result<Self, ConfigError> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, grid, workers, rng)
    }

    /// Continue an existing random stream, e.g. the one that built the grid.
    pub fn with_rng(
        config: SimConfig,
        grid: Grid,
        mut workers: WorkerPool,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_world(&grid, &workers)?;

        for worker in workers.iter_mut() {
            worker.job_search_success_prob = config.job_search_success_prob;
            worker.max_failed_attempts = config.max_failed_attempts;
        }

        Ok(Self {
            config,
            grid,
            workers,
            rng,
            step: 0,
            metrics: MetricsSeries::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn workers(&self) -> &WorkerPool {
        &self.workers
    }

    pub fn metrics(&self) -> &MetricsSeries {
        &self.metrics
    }

    /// Number of completed steps.
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.config.steps
    }

    /// Run one step, reporting to the default sink.
    pub fn advance(&mut self) -> Option<StepSnapshot> {
        self.advance_with(&mut DefaultSink::default())
    }

    /// Run one step. Returns `None` once the configured step count is reached.
    pub fn advance_with(&mut self, sink: &mut impl EventSink) -> Option<StepSnapshot> {
        if self.is_finished() {
            return None;
        }
        let step = self.step;

        // (a) Policy shock
        if let Some(shock) = self.config.shock {
            if shock.step == step {
                apply_shock(&mut self.grid, &shock.kind, step, sink);
            }
        }

        // (b) Fiscal adjustment, then payroll
        let separated = self.settle_firms(step, sink);

        // (c) Mobility
        self.run_mobility(step, &separated, sink);

        // (d) Metrics
        let snapshot = metrics::snapshot(step, &self.grid, &self.workers);
        self.metrics.push(&snapshot);
        sink.record(&SimEvent::StepCompleted {
            step,
            employed: snapshot.total_employment,
            unemployed: snapshot.unemployed,
            exited: snapshot.exited,
        });

        self.step += 1;
        Some(snapshot)
    }

    /// Run every remaining step.
    pub fn run(&mut self) -> &MetricsSeries {
        self.run_with(&mut DefaultSink::default())
    }

    pub fn run_with(&mut self, sink: &mut impl EventSink) -> &MetricsSeries {
        while self.advance_with(sink).is_some() {}
        &self.metrics
    }

    // === PHASES ===

    fn settle_firms(&mut self, step: Step, sink: &mut impl EventSink) -> HashSet<WorkerId> {
        let mut separated = HashSet::new();

        for firm in self.grid.iter_mut() {
            for separation in firm.adjust_workforce(&mut self.workers, &mut self.rng) {
                separated.insert(separation.worker);
                let event = match separation.kind {
                    SeparationKind::Layoff => SimEvent::Layoff {
                        step,
                        worker: separation.worker,
                        firm: firm.coord,
                    },
                    SeparationKind::Automation => SimEvent::Automation {
                        step,
                        worker: separation.worker,
                        firm: firm.coord,
                        capacity_after: firm.capacity(),
                    },
                };
                sink.record(&event);
            }
            firm.pay_workers();
        }

        separated
    }

    fn run_mobility(
        &mut self,
        step: Step,
        separated: &HashSet<WorkerId>,
        sink: &mut impl EventSink,
    ) {
        let radius = self.config.neighbor_radius;
        let ids: Vec<WorkerId> = self.workers.ids().collect();

        for id in ids {
            let worker = &self.workers[id];
            if worker.has_exited() || !worker.is_unemployed() || separated.contains(&id) {
                continue;
            }

            let current = worker.current_firm();
            let current_wage = current.map_or(0.0, |c| self.grid[c].wage());
            let reference = match current {
                Some(c) => c,
                None => self.grid.random_coord(&mut self.rng),
            };
            let openings: Vec<Opening> = self
                .grid
                .neighbors(reference, radius)
                .into_iter()
                .map(|c| {
                    let firm = &self.grid[c];
                    Opening {
                        firm: c,
                        wage: firm.wage(),
                        has_vacancy: firm.has_vacancy(),
                    }
                })
                .collect();

            let outcome = self.workers[id].consider_move(&openings, current_wage, &mut self.rng);
            match outcome {
                SearchOutcome::Move(to) => {
                    if let Some(from) = current {
                        self.grid[from].remove_member(id);
                    }
                    let hired = self.grid[to].hire(id);
                    assert!(hired.is_ok(), "chosen firm {to} had no vacancy: {hired:?}");
                    self.workers[id].accept_offer(to);
                    sink.record(&SimEvent::Hire {
                        step,
                        worker: id,
                        from: current,
                        to,
                        wage: self.grid[to].wage(),
                    });
                }
                SearchOutcome::Exited { failed_moves } => {
                    if let Some(from) = current {
                        self.grid[from].remove_member(id);
                    }
                    sink.record(&SimEvent::ExitedLaborForce {
                        step,
                        worker: id,
                        failed_moves,
                    });
                }
                SearchOutcome::CoolingDown | SearchOutcome::Failed { .. } => {}
            }
        }
    }
}

/// Every firm carries a usable wage, automation probability and resource
/// limit. Every worker sits in exactly the firm it names, and no firm is over
/// capacity.
fn validate_world(grid: &Grid, workers: &WorkerPool) -> Result<(), ConfigError> {
    if grid.is_empty() {
        return Err(ConfigError::EmptyGrid {
            width: grid.width(),
            height: grid.height(),
        });
    }
    let mut member_of = vec![None; workers.len()];

    for firm in grid.iter() {
        check_wage(&format!("firm {}", firm.coord), firm.wage())?;
        check_probability("automation_prob", firm.automation_prob)?;
        check_resource(
            &format!("firm {} resource limit", firm.coord),
            firm.fiscal.resource_limit(),
        )?;
        if firm.employed_count() > firm.capacity() as usize {
            return Err(ConfigError::OverCapacity {
                firm: firm.coord,
                employed: firm.employed_count(),
                capacity: firm.capacity(),
            });
        }
        for &id in firm.workers() {
            let inconsistent =
                |reason: String| ConfigError::InconsistentAssignment { worker: id, reason };
            let slot = member_of
                .get_mut(id.index())
                .ok_or_else(|| inconsistent(format!("not in pool of {}", workers.len())))?;
            if let Some(other) = slot.replace(firm.coord) {
                return Err(inconsistent(format!("member of both {other} and {}", firm.coord)));
            }
        }
    }

    for worker in workers.iter() {
        let member = member_of[worker.id.index()];
        if worker.has_exited() {
            if member.is_some() || worker.is_unemployed() {
                return Err(ConfigError::InconsistentAssignment {
                    worker: worker.id,
                    reason: "exited worker still attached".to_string(),
                });
            }
            continue;
        }
        if worker.current_firm() != member {
            return Err(ConfigError::InconsistentAssignment {
                worker: worker.id,
                reason: format!(
                    "names firm {:?} but is a member of {:?}",
                    worker.current_firm(),
                    member
                ),
            });
        }
        if member.is_none() && !worker.is_unemployed() {
            return Err(ConfigError::InconsistentAssignment {
                worker: worker.id,
                reason: "unassigned".to_string(),
            });
        }
    }
    Ok(())
}
