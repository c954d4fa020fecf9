//! Run configuration.
//!
//! Everything the step controller needs is carried by an immutable
//! [`SimConfig`]; grid and worker-pool construction is described separately
//! by [`ScenarioConfig`]. Both are validated before the first step.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::ConfigError;
use crate::types::{Price, Sector, Step, Zone};

// === DEFAULTS ===

pub const DEFAULT_STEPS: Step = 20;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_NEIGHBOR_RADIUS: u32 = 1;
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 3;
pub const DEFAULT_JOB_SEARCH_SUCCESS_PROB: f64 = 0.5;

pub const DEFAULT_GRID_SIZE: u32 = 10;
pub const DEFAULT_WORKERS: usize = 80;
pub const DEFAULT_WAGE: Price = 15.0;
pub const DEFAULT_BUDGET: f64 = 1000.0;
pub const DEFAULT_REVENUE_PER_STEP: f64 = 14.0;
pub const DEFAULT_CAPACITY: u32 = 10;
pub const DEFAULT_AUTOMATION_PROB: f64 = 0.2;

// === SHOCKS ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum ShockKind {
    /// Overwrite the wage of shock-zone firms in `sector` with `target_wage`.
    SectorOverride { target_wage: Price, sector: Sector },
    /// Add `delta` to the wage of every shock-zone firm.
    BroadAdditive { delta: Price },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ShockConfig {
    /// Zero-based step at whose start the shock is applied.
    pub step: Step,
    pub kind: ShockKind,
}

// === FISCAL REGIME ===

/// Which resource constraint gates a firm's payroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum FiscalRegime {
    /// A budget stock, drawn down by each step's payroll.
    StockBudget,
    /// A fixed revenue flow compared against payroll every step.
    RevenueFlow,
}

// === SIMULATION CONFIG ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct SimConfig {
    pub steps: Step,
    pub seed: u64,
    pub neighbor_radius: u32,
    pub max_failed_attempts: u32,
    pub job_search_success_prob: f64,
    pub shock: Option<ShockConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            seed: DEFAULT_SEED,
            neighbor_radius: DEFAULT_NEIGHBOR_RADIUS,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            job_search_success_prob: DEFAULT_JOB_SEARCH_SUCCESS_PROB,
            shock: None,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_steps(mut self, steps: Step) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shock(mut self, shock: ShockConfig) -> Self {
        self.shock = Some(shock);
        self
    }

    pub fn with_job_search_success_prob(mut self, prob: f64) -> Self {
        self.job_search_success_prob = prob;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if self.neighbor_radius == 0 {
            return Err(ConfigError::ZeroRadius);
        }
        if self.max_failed_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        check_probability("job_search_success_prob", self.job_search_success_prob)?;

        if let Some(shock) = &self.shock {
            if shock.step >= self.steps {
                return Err(ConfigError::ShockStepOutOfRange {
                    step: shock.step,
                    steps: self.steps,
                });
            }
            match shock.kind {
                ShockKind::SectorOverride { target_wage, .. } => {
                    check_wage("shock target wage", target_wage)?;
                }
                ShockKind::BroadAdditive { delta } => {
                    if !delta.is_finite() {
                        return Err(ConfigError::NonPositiveWage {
                            context: "shock wage delta".to_string(),
                            wage: delta,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

// === SCENARIO CONFIG ===

/// How the grid of firms and pool of workers are built before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct ScenarioConfig {
    pub width: u32,
    pub height: u32,
    pub workers: usize,
    pub wage: Price,
    pub capacity: u32,
    pub automation_prob: f64,
    pub fiscal_regime: FiscalRegime,
    pub budget: f64,
    pub revenue_per_step: f64,
    pub shock_zone: Zone,
    /// Probability that a firm is drawn into the fast-food sector.
    pub fast_food_share: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_SIZE,
            height: DEFAULT_GRID_SIZE,
            workers: DEFAULT_WORKERS,
            wage: DEFAULT_WAGE,
            capacity: DEFAULT_CAPACITY,
            automation_prob: DEFAULT_AUTOMATION_PROB,
            fiscal_regime: FiscalRegime::StockBudget,
            budget: DEFAULT_BUDGET,
            revenue_per_step: DEFAULT_REVENUE_PER_STEP,
            shock_zone: Zone::new(0..5, 0..5),
            fast_food_share: 1.0,
        }
    }
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ScenarioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn total_capacity(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.capacity as u64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        check_wage("scenario default wage", self.wage)?;
        check_probability("automation_prob", self.automation_prob)?;
        check_probability("fast_food_share", self.fast_food_share)?;
        check_resource("scenario budget", self.budget)?;
        check_resource("scenario revenue_per_step", self.revenue_per_step)?;
        if self.workers as u64 > self.total_capacity() {
            return Err(ConfigError::InsufficientCapacity {
                workers: self.workers,
                capacity: self.total_capacity(),
            });
        }
        Ok(())
    }
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

pub(crate) fn check_resource(context: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteResource {
            context: context.to_string(),
            value,
        })
    }
}

pub(crate) fn check_wage(context: &str, wage: Price) -> Result<(), ConfigError> {
    if wage.is_finite() && wage >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveWage {
            context: context.to_string(),
            wage,
        })
    }
}
