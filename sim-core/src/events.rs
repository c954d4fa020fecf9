//! Simulation events and the sinks that observe them.
//!
//! The step controller reports what happened through an [`EventSink`]
//! instead of logging inline. [`TracingSink`] turns each event into a
//! `tracing` event whose target names the table it lands in when the
//! `instrument` subscriber is installed.

use crate::types::{FirmCoord, Price, Step, WorkerId};

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ShockApplied {
        step: Step,
        firm: FirmCoord,
        old_wage: Price,
        new_wage: Price,
    },
    Layoff {
        step: Step,
        worker: WorkerId,
        firm: FirmCoord,
    },
    /// A separation that also eliminated the role permanently.
    Automation {
        step: Step,
        worker: WorkerId,
        firm: FirmCoord,
        capacity_after: u32,
    },
    Hire {
        step: Step,
        worker: WorkerId,
        from: Option<FirmCoord>,
        to: FirmCoord,
        wage: Price,
    },
    ExitedLaborForce {
        step: Step,
        worker: WorkerId,
        failed_moves: u32,
    },
    StepCompleted {
        step: Step,
        employed: u64,
        unemployed: u64,
        exited: u64,
    },
}

impl SimEvent {
    pub fn step(&self) -> Step {
        match self {
            SimEvent::ShockApplied { step, .. }
            | SimEvent::Layoff { step, .. }
            | SimEvent::Automation { step, .. }
            | SimEvent::Hire { step, .. }
            | SimEvent::ExitedLaborForce { step, .. }
            | SimEvent::StepCompleted { step, .. } => *step,
        }
    }
}

/// Receives events from the step controller.
pub trait EventSink {
    fn record(&mut self, event: &SimEvent);
}

impl EventSink for Vec<SimEvent> {
    fn record(&mut self, event: &SimEvent) {
        self.push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &SimEvent) {
        (**self).record(event);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &SimEvent) {}
}

/// Forwards events to `tracing`, one target per event kind.
#[cfg(feature = "instrument")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[cfg(feature = "instrument")]
impl EventSink for TracingSink {
    fn record(&mut self, event: &SimEvent) {
        match *event {
            SimEvent::ShockApplied {
                step,
                firm,
                old_wage,
                new_wage,
            } => tracing::info!(
                target: "shock",
                step = step,
                x = firm.x,
                y = firm.y,
                old_wage = old_wage,
                new_wage = new_wage,
            ),
            SimEvent::Layoff { step, worker, firm } => tracing::info!(
                target: "layoff",
                step = step,
                worker_id = worker.0,
                x = firm.x,
                y = firm.y,
            ),
            SimEvent::Automation {
                step,
                worker,
                firm,
                capacity_after,
            } => tracing::info!(
                target: "automation",
                step = step,
                worker_id = worker.0,
                x = firm.x,
                y = firm.y,
                capacity_after = capacity_after,
            ),
            SimEvent::Hire {
                step,
                worker,
                from,
                to,
                wage,
            } => tracing::info!(
                target: "hire",
                step = step,
                worker_id = worker.0,
                was_employed = from.is_some(),
                x = to.x,
                y = to.y,
                wage = wage,
            ),
            SimEvent::ExitedLaborForce {
                step,
                worker,
                failed_moves,
            } => tracing::info!(
                target: "exit",
                step = step,
                worker_id = worker.0,
                failed_moves = failed_moves,
            ),
            SimEvent::StepCompleted {
                step,
                employed,
                unemployed,
                exited,
            } => tracing::info!(
                target: "step",
                step = step,
                employed = employed,
                unemployed = unemployed,
                exited = exited,
            ),
        }
    }
}

/// The sink used when the caller does not supply one.
#[cfg(feature = "instrument")]
pub type DefaultSink = TracingSink;

#[cfg(not(feature = "instrument"))]
pub type DefaultSink = NullSink;
