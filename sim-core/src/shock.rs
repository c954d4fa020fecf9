//! Policy shocks: wage changes applied to the shock zone at a configured step.

use crate::agents::Firm;
use crate::config::ShockKind;
use crate::events::{EventSink, SimEvent};
use crate::geography::Grid;
use crate::types::{Price, Step};

/// The wage `kind` assigns to a firm, or `None` if the firm is not targeted.
///
/// Only shock-zone firms are ever targeted. Additive shocks never push a wage
/// below zero.
pub fn shocked_wage(kind: &ShockKind, firm: &Firm) -> Option<Price> {
    if !firm.is_shock_zone {
        return None;
    }
    match *kind {
        ShockKind::SectorOverride {
            target_wage,
            sector,
        } => (firm.sector == sector).then_some(target_wage),
        ShockKind::BroadAdditive { delta } => Some((firm.wage() + delta).max(0.0)),
    }
}

/// Apply a shock to every targeted firm. Returns the number of firms changed.
pub fn apply_shock(
    grid: &mut Grid,
    kind: &ShockKind,
    step: Step,
    sink: &mut impl EventSink,
) -> usize {
    let mut changed = 0;
    for firm in grid.iter_mut() {
        let Some(new_wage) = shocked_wage(kind, firm) else {
            continue;
        };
        let old_wage = firm.wage();
        firm.set_wage(new_wage);
        changed += 1;

        sink.record(&SimEvent::ShockApplied {
            step,
            firm: firm.coord,
            old_wage,
            new_wage,
        });
    }
    changed
}
