//! Per-step aggregates.
//!
//! Everything here is a read-only reduction over the grid and worker pool.
//! The series store is append-only: one value per metric per completed step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agents::{Firm, WorkerPool};
use crate::geography::Grid;
use crate::types::Step;

// === METRIC NAMES ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Unemployed,
    Exited,
    AutomatedJobs,
    TotalEmployment,
    StressShare,
    Vacancies,
    WageBill,
    TreatedEmployment,
    ControlEmployment,
    TreatedMeanEmployment,
    ControlMeanEmployment,
    TreatedMeanWage,
    ControlMeanWage,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::Unemployed,
        Metric::Exited,
        Metric::AutomatedJobs,
        Metric::TotalEmployment,
        Metric::StressShare,
        Metric::Vacancies,
        Metric::WageBill,
        Metric::TreatedEmployment,
        Metric::ControlEmployment,
        Metric::TreatedMeanEmployment,
        Metric::ControlMeanEmployment,
        Metric::TreatedMeanWage,
        Metric::ControlMeanWage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Unemployed => "unemployed",
            Metric::Exited => "exited",
            Metric::AutomatedJobs => "automated_jobs",
            Metric::TotalEmployment => "total_employment",
            Metric::StressShare => "stress_share",
            Metric::Vacancies => "vacancies",
            Metric::WageBill => "wage_bill",
            Metric::TreatedEmployment => "treated_employment",
            Metric::ControlEmployment => "control_employment",
            Metric::TreatedMeanEmployment => "treated_mean_employment",
            Metric::ControlMeanEmployment => "control_mean_employment",
            Metric::TreatedMeanWage => "treated_mean_wage",
            Metric::ControlMeanWage => "control_mean_wage",
        }
    }
}

// === SNAPSHOT ===

/// Aggregates observed at the end of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StepSnapshot {
    pub step: Step,
    pub unemployed: u64,
    pub exited: u64,
    pub automated_jobs: u64,
    pub total_employment: u64,
    /// Fraction of firms whose payroll exceeds their resource limit.
    pub stress_share: f64,
    pub vacancies: u64,
    pub wage_bill: f64,
    pub treated_employment: u64,
    pub control_employment: u64,
    pub treated_mean_employment: f64,
    pub control_mean_employment: f64,
    pub treated_mean_wage: f64,
    pub control_mean_wage: f64,
}

impl StepSnapshot {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Unemployed => self.unemployed as f64,
            Metric::Exited => self.exited as f64,
            Metric::AutomatedJobs => self.automated_jobs as f64,
            Metric::TotalEmployment => self.total_employment as f64,
            Metric::StressShare => self.stress_share,
            Metric::Vacancies => self.vacancies as f64,
            Metric::WageBill => self.wage_bill,
            Metric::TreatedEmployment => self.treated_employment as f64,
            Metric::ControlEmployment => self.control_employment as f64,
            Metric::TreatedMeanEmployment => self.treated_mean_employment,
            Metric::ControlMeanEmployment => self.control_mean_employment,
            Metric::TreatedMeanWage => self.treated_mean_wage,
            Metric::ControlMeanWage => self.control_mean_wage,
        }
    }
}

// === REDUCTIONS ===

pub fn stress_share(grid: &Grid) -> f64 {
    if grid.is_empty() {
        return 0.0;
    }
    grid.iter().filter(|f| f.is_stressed()).count() as f64 / grid.len() as f64
}

pub fn vacancies(grid: &Grid) -> u64 {
    grid.iter().map(|f| f.vacancies() as u64).sum()
}

pub fn wage_bill(grid: &Grid) -> f64 {
    grid.iter().map(Firm::payroll).sum()
}

#[derive(Debug, Default, Clone, Copy)]
struct Partition {
    firms: u64,
    employed: u64,
    wage_sum: f64,
}

impl Partition {
    fn add(&mut self, firm: &Firm) {
        self.firms += 1;
        self.employed += firm.employed_count() as u64;
        self.wage_sum += firm.wage();
    }

    fn mean_employment(&self) -> f64 {
        if self.firms == 0 {
            0.0
        } else {
            self.employed as f64 / self.firms as f64
        }
    }

    fn mean_wage(&self) -> f64 {
        if self.firms == 0 {
            0.0
        } else {
            self.wage_sum / self.firms as f64
        }
    }
}

/// Observe the grid and pool at the end of `step`.
pub fn snapshot(step: Step, grid: &Grid, workers: &WorkerPool) -> StepSnapshot {
    let mut treated = Partition::default();
    let mut control = Partition::default();
    let mut automated_jobs = 0u64;

    for firm in grid.iter() {
        automated_jobs += firm.automated_roles() as u64;
        if firm.is_shock_zone {
            treated.add(firm);
        } else {
            control.add(firm);
        }
    }

    StepSnapshot {
        step,
        unemployed: workers.unemployed_count(),
        exited: workers.exited_count(),
        automated_jobs,
        total_employment: treated.employed + control.employed,
        stress_share: stress_share(grid),
        vacancies: vacancies(grid),
        wage_bill: wage_bill(grid),
        treated_employment: treated.employed,
        control_employment: control.employed,
        treated_mean_employment: treated.mean_employment(),
        control_mean_employment: control.mean_employment(),
        treated_mean_wage: treated.mean_wage(),
        control_mean_wage: control.mean_wage(),
    }
}

// === SERIES ===

/// Named per-step series, aligned by step index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSeries {
    steps: Vec<Step>,
    series: BTreeMap<String, Vec<f64>>,
}

impl MetricsSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: &StepSnapshot) {
        self.steps.push(snapshot.step);
        for metric in Metric::ALL {
            self.series
                .entry(metric.as_str().to_string())
                .or_default()
                .push(snapshot.value(metric));
        }
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn metric(&self, metric: Metric) -> &[f64] {
        self.get(metric.as_str()).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All series as one polars frame with a leading `step` column.
    #[cfg(feature = "instrument")]
    pub fn to_dataframe(&self) -> instrument::PolarsResult<instrument::DataFrame> {
        instrument::series_frame(&self.steps, self.iter())
    }
}
