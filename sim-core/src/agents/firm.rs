use rand::Rng;

use crate::agents::worker::WorkerPool;
use crate::config::FiscalRegime;
use crate::error::HireError;
use crate::types::{FirmCoord, Price, Sector, WorkerId};

/// Wages at or below this never trigger separations. Guards the division in
/// the separations formula.
pub const WAGE_FLOOR: Price = 0.0;

// === FISCAL STATE ===

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fiscal {
    /// Budget stock, drawn down by `pay_workers`.
    StockBudget { budget: f64 },
    /// Revenue available every step; never depleted.
    RevenueFlow { revenue_per_step: f64 },
}

impl Fiscal {
    pub fn new(regime: FiscalRegime, budget: f64, revenue_per_step: f64) -> Self {
        match regime {
            FiscalRegime::StockBudget => Fiscal::StockBudget { budget },
            FiscalRegime::RevenueFlow => Fiscal::RevenueFlow { revenue_per_step },
        }
    }

    /// What payroll may not exceed this step.
    pub fn resource_limit(&self) -> f64 {
        match *self {
            Fiscal::StockBudget { budget } => budget,
            Fiscal::RevenueFlow { revenue_per_step } => revenue_per_step,
        }
    }
}

// === SEPARATIONS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparationKind {
    Layoff,
    /// The role was eliminated along with the worker.
    Automation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separation {
    pub worker: WorkerId,
    pub kind: SeparationKind,
}

// === FIRM ===

#[derive(Debug, Clone)]
pub struct Firm {
    pub coord: FirmCoord,
    wage: Price,
    capacity: u32,
    pub sector: Sector,
    pub is_shock_zone: bool,
    pub automation_prob: f64,
    automated_roles: u32,
    pub fiscal: Fiscal,
    /// Resource limit in force when separations were last decided. The stock
    /// budget is drawn down after that, so stress is measured against this.
    step_limit: f64,
    /// Employed workers in hire order; the last entry is the most recent hire.
    workers: Vec<WorkerId>,
}

impl Firm {
    pub fn new(coord: FirmCoord, wage: Price, capacity: u32, fiscal: Fiscal) -> Self {
        Self {
            coord,
            wage,
            capacity,
            sector: Sector::Other,
            is_shock_zone: false,
            automation_prob: 0.0,
            automated_roles: 0,
            fiscal,
            step_limit: fiscal.resource_limit(),
            workers: Vec::new(),
        }
    }

    pub fn with_sector(mut self, sector: Sector) -> Self {
        self.sector = sector;
        self
    }

    pub fn with_shock_zone(mut self, is_shock_zone: bool) -> Self {
        self.is_shock_zone = is_shock_zone;
        self
    }

    pub fn with_automation_prob(mut self, automation_prob: f64) -> Self {
        self.automation_prob = automation_prob;
        self
    }

    pub fn wage(&self) -> Price {
        self.wage
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn automated_roles(&self) -> u32 {
        self.automated_roles
    }

    pub fn workers(&self) -> &[WorkerId] {
        &self.workers
    }

    pub fn employed_count(&self) -> usize {
        self.workers.len()
    }

    pub fn has_vacancy(&self) -> bool {
        self.workers.len() < self.capacity as usize
    }

    pub fn vacancies(&self) -> u32 {
        (self.capacity as usize).saturating_sub(self.workers.len()) as u32
    }

    pub fn payroll(&self) -> f64 {
        self.wage * self.workers.len() as f64
    }

    /// Payroll exceeds the resource limit of the current step, as recorded by
    /// the last `adjust_workforce`.
    pub fn is_stressed(&self) -> bool {
        self.payroll() > self.step_limit
    }

    // === OPERATIONS ===

    /// Add a worker to the employed set if there is room.
    pub fn hire(&mut self, worker: WorkerId) -> Result<(), HireError> {
        if !self.has_vacancy() {
            return Err(HireError::CapacityExceeded {
                firm: self.coord,
                capacity: self.capacity,
            });
        }
        debug_assert!(!self.workers.contains(&worker), "double hire of {worker:?}");
        self.workers.push(worker);
        Ok(())
    }

    /// Overwrite the wage. Only policy shocks call this.
    pub fn set_wage(&mut self, new_wage: Price) {
        self.wage = new_wage;
    }

    /// Remove a worker who left voluntarily. Returns whether it was a member.
    pub fn remove_member(&mut self, worker: WorkerId) -> bool {
        match self.workers.iter().position(|&w| w == worker) {
            Some(pos) => {
                self.workers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Separate the most recent hire and notify the worker.
    ///
    /// This is the only path by which a firm ends an employment.
    fn release_worker(&mut self, pool: &mut WorkerPool) -> Option<WorkerId> {
        let worker = self.workers.pop()?;
        pool[worker].layoff();
        Some(worker)
    }

    /// Number of separations needed to bring payroll within the resource limit.
    pub fn required_separations(&self) -> usize {
        let employed = self.workers.len();
        if employed == 0 || self.wage <= WAGE_FLOOR {
            return 0;
        }
        let excess = self.payroll() - self.fiscal.resource_limit();
        if excess <= 0.0 {
            return 0;
        }
        let k = (excess / self.wage).ceil();
        (k as usize).min(employed)
    }

    /// Resolve insolvency for the current wage and resource limit.
    ///
    /// Separations run most-recent-hire first. Each one draws against
    /// `automation_prob`; a hit with capacity left also eliminates the role.
    pub fn adjust_workforce<R: Rng>(
        &mut self,
        pool: &mut WorkerPool,
        rng: &mut R,
    ) -> Vec<Separation> {
        self.step_limit = self.fiscal.resource_limit();
        let k = self.required_separations();
        let mut separations = Vec::with_capacity(k);

        for _ in 0..k {
            let roll: f64 = rng.random();
            let automate = roll < self.automation_prob && self.capacity > 0;

            let Some(worker) = self.release_worker(pool) else {
                break;
            };

            let kind = if automate {
                self.automated_roles += 1;
                self.capacity -= 1;
                SeparationKind::Automation
            } else {
                SeparationKind::Layoff
            };
            separations.push(Separation { worker, kind });
        }

        assert!(
            self.workers.len() <= self.capacity as usize,
            "firm {} employs {} over capacity {}",
            self.coord,
            self.workers.len(),
            self.capacity
        );
        separations
    }

    /// Settle payroll. Only the stock regime keeps a balance.
    pub fn pay_workers(&mut self) -> f64 {
        let total_pay = self.payroll();
        if let Fiscal::StockBudget { budget } = &mut self.fiscal {
            *budget -= total_pay;
        }
        total_pay
    }
}
