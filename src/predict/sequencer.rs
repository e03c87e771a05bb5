use chrono::{DateTime, Duration, Utc};

use crate::predict::error::{PredictError, PropagationError};
use crate::predict::observer::ObserverLocation;
use crate::predict::propagator::Propagator;
use crate::predict::types::{
    CompletionReason, OrbitalElements, PassPrediction, PredictionWindow, RawPass, Trajectory,
};

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MIN_ADVANCE_SECONDS: i64 = 1;

#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// chrono format string used when labelling trajectories in logs
    pub time_format: String,
    /// Smallest step the cursor takes when a candidate would not move it forward.
    pub min_advance: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            min_advance: Duration::seconds(MIN_ADVANCE_SECONDS),
        }
    }
}

/// Result of evaluating one propagator answer against the run state.
#[derive(Debug)]
enum Outcome {
    Accepted(RawPass, Trajectory),
    OutOfOrder(DateTime<Utc>),
    Stalled(RawPass),
    Failed(PropagationError),
}

/// Drives a propagator across a prediction window, producing the ordered
/// list of passes and the reason the search stopped.
pub struct PassSequencer {
    config: SequencerConfig,
}

impl Default for PassSequencer {
    fn default() -> Self {
        Self::new(SequencerConfig::default())
    }
}

impl PassSequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self { config }
    }

    /// Computes every pass found while the search cursor is inside `window`.
    ///
    /// Only invalid input fails the call. Propagation failures, malformed
    /// candidates and stalls end or skip within the run and are reported
    /// through [`PassPrediction::reason`] and [`PassPrediction::skipped`].
    pub fn compute_passes<P: Propagator + ?Sized>(
        &self,
        propagator: &P,
        elements: &OrbitalElements,
        observer: &ObserverLocation,
        window: &PredictionWindow,
    ) -> Result<PassPrediction, PredictError> {
        if elements.is_empty() {
            return Err(PredictError::InvalidInput(format!(
                "missing orbital elements for NORAD {}",
                elements.norad_id
            )));
        }
        observer.validate()?;
        window.validate()?;

        let end = window.end();
        let min_advance = self.config.min_advance.max(Duration::nanoseconds(1));
        let mut cursor = window.start;
        let mut last_accepted: Option<RawPass> = None;
        let mut trajectories = Vec::new();
        let mut skipped = 0;
        let mut iterations = 0;

        log::info!(
            "computing passes: NORAD {} over {} from {} to {}",
            elements.norad_id,
            observer.name,
            window.start,
            end
        );

        let reason = loop {
            if cursor >= end {
                break CompletionReason::WindowExhausted;
            }
            iterations += 1;

            let candidate = propagator.next_pass(elements, observer, cursor);
            match self.evaluate(elements, observer, candidate, last_accepted.as_ref()) {
                Outcome::Accepted(raw, trajectory) => {
                    cursor = advance(cursor, trajectory.set_time, min_advance);
                    last_accepted = Some(raw);
                    if window.contains(trajectory.rise_time) {
                        log::debug!(
                            "accepted pass {}",
                            trajectory.label(&self.config.time_format)
                        );
                        trajectories.push(trajectory);
                    } else {
                        log::debug!(
                            "pass {} rises outside the window",
                            trajectory.label(&self.config.time_format)
                        );
                    }
                }
                Outcome::OutOfOrder(latest) => {
                    log::warn!(
                        "NORAD {} over {}: pass times out of order after {}, skipping to {}",
                        elements.norad_id,
                        observer.name,
                        cursor,
                        latest
                    );
                    skipped += 1;
                    cursor = advance(cursor, latest, min_advance);
                }
                Outcome::Stalled(raw) => {
                    log::error!(
                        "NORAD {} over {}: repeated trajectory, discarding {:?} and bailing",
                        elements.norad_id,
                        observer.name,
                        raw
                    );
                    break CompletionReason::Stalled;
                }
                Outcome::Failed(err) => {
                    log::warn!(
                        "NORAD {} over {}: no further passes after {}: {}",
                        elements.norad_id,
                        observer.name,
                        cursor,
                        err
                    );
                    break CompletionReason::PropagationFailed;
                }
            }
        };

        log::info!(
            "NORAD {} over {}: {} passes, {} skipped, {}",
            elements.norad_id,
            observer.name,
            trajectories.len(),
            skipped,
            reason
        );

        Ok(PassPrediction {
            trajectories,
            reason,
            skipped,
            iterations,
        })
    }

    fn evaluate(
        &self,
        elements: &OrbitalElements,
        observer: &ObserverLocation,
        candidate: Result<RawPass, PropagationError>,
        last_accepted: Option<&RawPass>,
    ) -> Outcome {
        let raw = match candidate {
            Ok(raw) => raw,
            Err(err) => return Outcome::Failed(err),
        };

        let Some(latest) = raw.latest_time() else {
            return Outcome::Failed(PropagationError::NoEvents);
        };

        let Some(trajectory) = Trajectory::from_raw(elements.norad_id, &observer.name, &raw)
        else {
            return Outcome::OutOfOrder(latest);
        };

        if last_accepted.is_some_and(|last| last.is_identical(&raw)) {
            return Outcome::Stalled(raw);
        }

        Outcome::Accepted(raw, trajectory)
    }
}

/// Next cursor position: `target`, or `min_advance` past `cursor` if
/// `target` would not move it forward.
fn advance(cursor: DateTime<Utc>, target: DateTime<Utc>, min_advance: Duration) -> DateTime<Utc> {
    if target > cursor {
        target
    } else {
        cursor
            .checked_add_signed(min_advance)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
