use rand::Rng;

use crate::config::{DEFAULT_JOB_SEARCH_SUCCESS_PROB, DEFAULT_MAX_FAILED_ATTEMPTS};
use crate::types::{FirmCoord, Price, WorkerId};

// === STATE ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Built but never assigned to a firm. A run rejects workers in this state.
    Unplaced,
    Employed,
    UnemployedSearching,
    UnemployedCooldown,
    /// Terminal.
    ExitedLaborForce,
}

/// A firm as seen by a searching worker at decision time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opening {
    pub firm: FirmCoord,
    pub wage: Price,
    pub has_vacancy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome {
    /// Still waiting out the post-layoff cooldown.
    CoolingDown,
    /// Chose this firm. The caller performs the hire and then `accept_offer`.
    Move(FirmCoord),
    Failed { failed_moves: u32 },
    Exited { failed_moves: u32 },
}

// === WORKER ===

#[derive(Debug, Clone)]
pub struct Worker {
    pub id: WorkerId,
    current_firm: Option<FirmCoord>,
    unemployed: bool,
    exited_labor_force: bool,
    failed_moves: u32,
    search_cooldown: u32,
    pub max_failed_attempts: u32,
    pub job_search_success_prob: f64,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            current_firm: None,
            unemployed: false,
            exited_labor_force: false,
            failed_moves: 0,
            search_cooldown: 0,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            job_search_success_prob: DEFAULT_JOB_SEARCH_SUCCESS_PROB,
        }
    }

    pub fn with_search_params(mut self, success_prob: f64, max_failed_attempts: u32) -> Self {
        self.job_search_success_prob = success_prob;
        self.max_failed_attempts = max_failed_attempts;
        self
    }

    pub fn current_firm(&self) -> Option<FirmCoord> {
        self.current_firm
    }

    pub fn is_unemployed(&self) -> bool {
        self.unemployed
    }

    pub fn has_exited(&self) -> bool {
        self.exited_labor_force
    }

    pub fn failed_moves(&self) -> u32 {
        self.failed_moves
    }

    pub fn search_cooldown(&self) -> u32 {
        self.search_cooldown
    }

    pub fn is_employed(&self) -> bool {
        self.current_firm.is_some()
    }

    pub fn state(&self) -> WorkerState {
        if self.exited_labor_force {
            WorkerState::ExitedLaborForce
        } else if self.is_employed() {
            WorkerState::Employed
        } else if !self.unemployed {
            WorkerState::Unplaced
        } else if self.search_cooldown > 0 {
            WorkerState::UnemployedCooldown
        } else {
            WorkerState::UnemployedSearching
        }
    }

    // === TRANSITIONS ===

    /// Called by a firm when it separates this worker.
    /// The worker waits one full step before it may search again.
    pub fn layoff(&mut self) {
        debug_assert!(!self.exited_labor_force, "exited worker {:?} laid off", self.id);
        self.current_firm = None;
        self.unemployed = true;
        self.search_cooldown = 1;
    }

    /// Record a successful hire at `firm`.
    pub fn accept_offer(&mut self, firm: FirmCoord) {
        debug_assert!(!self.exited_labor_force, "exited worker {:?} hired", self.id);
        self.current_firm = Some(firm);
        self.unemployed = false;
        self.failed_moves = 0;
        self.search_cooldown = 0;
    }

    pub fn exit_labor_force(&mut self) {
        self.exited_labor_force = true;
        self.unemployed = false;
        self.current_firm = None;
    }

    /// One mobility evaluation.
    ///
    /// A worker in cooldown only counts it down; once it reaches zero the same
    /// call goes on to search. Candidates must pay strictly more than
    /// `current_wage` and have a vacancy. The success draw is only taken when
    /// at least one candidate exists. Ties on wage go to the first opening in
    /// neighbor order.
    pub fn consider_move<R: Rng>(
        &mut self,
        openings: &[Opening],
        current_wage: Price,
        rng: &mut R,
    ) -> SearchOutcome {
        debug_assert!(!self.exited_labor_force);

        if self.search_cooldown > 0 {
            self.search_cooldown -= 1;
            if self.search_cooldown > 0 {
                return SearchOutcome::CoolingDown;
            }
        }

        let best = openings
            .iter()
            .filter(|o| o.wage > current_wage && o.has_vacancy)
            .fold(None::<&Opening>, |best, o| match best {
                Some(b) if b.wage >= o.wage => Some(b),
                _ => Some(o),
            });

        if let Some(best) = best {
            let roll: f64 = rng.random();
            if roll < self.job_search_success_prob {
                return SearchOutcome::Move(best.firm);
            }
        }

        self.failed_moves += 1;
        if self.failed_moves >= self.max_failed_attempts {
            self.exit_labor_force();
            SearchOutcome::Exited {
                failed_moves: self.failed_moves,
            }
        } else {
            SearchOutcome::Failed {
                failed_moves: self.failed_moves,
            }
        }
    }
}

// === POOL ===

/// All workers, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Creates `count` workers with ids `0..count`.
    pub fn new(count: usize) -> Self {
        Self {
            workers: (0..count as u32).map(|i| Worker::new(WorkerId::new(i))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.get(id.index())
    }

    pub fn get_mut(&mut self, id: WorkerId) -> Option<&mut Worker> {
        self.workers.get_mut(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Worker> {
        self.workers.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.workers.iter().map(|w| w.id)
    }

    pub fn unemployed_count(&self) -> u64 {
        self.workers.iter().filter(|w| w.unemployed).count() as u64
    }

    pub fn exited_count(&self) -> u64 {
        self.workers.iter().filter(|w| w.exited_labor_force).count() as u64
    }
}

impl std::ops::Index<WorkerId> for WorkerPool {
    type Output = Worker;

    fn index(&self, id: WorkerId) -> &Worker {
        &self.workers[id.index()]
    }
}

impl std::ops::IndexMut<WorkerId> for WorkerPool {
    fn index_mut(&mut self, id: WorkerId) -> &mut Worker {
        &mut self.workers[id.index()]
    }
}
