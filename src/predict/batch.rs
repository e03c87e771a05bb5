use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::predict::observer::ObserverLocation;
use crate::predict::propagator::Propagator;
use crate::predict::sequencer::PassSequencer;
use crate::predict::types::{CompletionReason, OrbitalElements, PredictionWindow, Trajectory};

/// An observer together with how far ahead to predict for it.
#[derive(Debug, Clone)]
pub struct ObserverPlan {
    pub location: ObserverLocation,
    pub window_hours: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub norad_id: u32,
    pub observer: String,
    pub reason: CompletionReason,
    pub skipped: usize,
    pub trajectories: Vec<Trajectory>,
}

/// Runs one independent prediction per (satellite, observer) pair. Pairs
/// rejected as invalid input are logged and left out of the report.
pub fn predict_catalog<'a, P: Propagator + ?Sized>(
    sequencer: &PassSequencer,
    propagator: &P,
    satellites: impl IntoIterator<Item = &'a OrbitalElements>,
    observers: &[ObserverPlan],
    start: DateTime<Utc>,
) -> Vec<PairReport> {
    let mut reports = Vec::new();

    for elements in satellites {
        log::info!("update trajectories: NORAD {}", elements.norad_id);
        for plan in observers {
            let window = PredictionWindow::from_hours(start, plan.window_hours);
            match sequencer.compute_passes(propagator, elements, &plan.location, &window) {
                Ok(prediction) => reports.push(PairReport {
                    norad_id: elements.norad_id,
                    observer: plan.location.name.clone(),
                    reason: prediction.reason,
                    skipped: prediction.skipped,
                    trajectories: prediction.trajectories,
                }),
                Err(e) => log::warn!(
                    "skipping NORAD {} over {}: {}",
                    elements.norad_id,
                    plan.location.name,
                    e
                ),
            }
        }
    }

    reports
}
