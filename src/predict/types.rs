use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::predict::error::{PredictError, PropagationError};

/// Orbital elements of one satellite as a two-line element set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitalElements {
    pub norad_id: u32,
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl OrbitalElements {
    pub fn new(norad_id: u32, name: Option<String>, line1: &str, line2: &str) -> Self {
        Self {
            norad_id,
            name,
            line1: line1.trim().to_string(),
            line2: line2.trim().to_string(),
        }
    }

    /// Builds elements from TLE text, taking the catalog number from line 1.
    pub fn from_tle(
        name: Option<String>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, PropagationError> {
        let mut elements = Self::new(0, name, line1, line2);
        elements.norad_id = elements.to_sgp4()?.norad_id as u32;
        Ok(elements)
    }

    pub fn to_sgp4(&self) -> Result<sgp4::Elements, PropagationError> {
        Ok(sgp4::Elements::from_tle(
            self.name.clone(),
            self.line1.as_bytes(),
            self.line2.as_bytes(),
        )?)
    }

    pub fn is_empty(&self) -> bool {
        self.line1.is_empty() || self.line2.is_empty()
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.norad_id))
    }
}

/// Half-open search interval `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionWindow {
    pub start: DateTime<Utc>,
    pub duration: Duration,
}

impl PredictionWindow {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn from_hours(start: DateTime<Utc>, hours: u32) -> Self {
        Self::new(start, Duration::hours(i64::from(hours)))
    }

    /// End of the window. Saturates at the latest representable instant;
    /// [`PredictionWindow::validate`] rejects windows that would overflow.
    pub fn end(&self) -> DateTime<Utc> {
        self.start
            .checked_add_signed(self.duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end()
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        if self.duration <= Duration::zero() {
            return Err(PredictError::InvalidInput(format!(
                "prediction window must end after it starts (duration {}s)",
                self.duration.num_seconds()
            )));
        }
        if self.start.checked_add_signed(self.duration).is_none() {
            return Err(PredictError::InvalidInput(format!(
                "prediction window of {} h from {} ends out of range",
                self.duration.num_hours(),
                self.start
            )));
        }
        Ok(())
    }
}

/// One next-pass answer from a propagator. Any field may be absent when the
/// propagator found no such event. Angles are in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawPass {
    pub rise_time: Option<DateTime<Utc>>,
    pub rise_azimuth: Option<f64>,
    pub culmination_time: Option<DateTime<Utc>>,
    pub culmination_altitude: Option<f64>,
    pub set_time: Option<DateTime<Utc>>,
    pub set_azimuth: Option<f64>,
}

impl RawPass {
    pub fn times(&self) -> [Option<DateTime<Utc>>; 3] {
        [self.rise_time, self.culmination_time, self.set_time]
    }

    /// Latest of the event times that are present.
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.times().into_iter().flatten().max()
    }

    /// True when every field is present and `rise < culmination < set`.
    pub fn is_ordered(&self) -> bool {
        if self.rise_azimuth.is_none()
            || self.culmination_altitude.is_none()
            || self.set_azimuth.is_none()
        {
            return false;
        }
        match self.times() {
            [Some(rise), Some(culmination), Some(set)] => rise < culmination && culmination < set,
            _ => false,
        }
    }

    /// Exact equality, with angles compared bit for bit.
    pub fn is_identical(&self, other: &RawPass) -> bool {
        let bits = |a: Option<f64>| a.map(f64::to_bits);
        self.times() == other.times()
            && bits(self.rise_azimuth) == bits(other.rise_azimuth)
            && bits(self.culmination_altitude) == bits(other.culmination_altitude)
            && bits(self.set_azimuth) == bits(other.set_azimuth)
    }
}

/// An accepted pass of a satellite over an observer. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub norad_id: u32,
    pub observer: String,
    pub rise_time: DateTime<Utc>,
    pub rise_azimuth_deg: f64,
    pub culmination_time: DateTime<Utc>,
    pub culmination_altitude_deg: f64,
    pub set_time: DateTime<Utc>,
    pub set_azimuth_deg: f64,
}

impl Trajectory {
    /// Converts an ordered candidate, returning `None` if it is not ordered.
    pub fn from_raw(norad_id: u32, observer: &str, raw: &RawPass) -> Option<Self> {
        if !raw.is_ordered() {
            return None;
        }
        Some(Self {
            norad_id,
            observer: observer.to_string(),
            rise_time: raw.rise_time?,
            rise_azimuth_deg: raw.rise_azimuth?.to_degrees(),
            culmination_time: raw.culmination_time?,
            culmination_altitude_deg: raw.culmination_altitude?.to_degrees(),
            set_time: raw.set_time?,
            set_azimuth_deg: raw.set_azimuth?.to_degrees(),
        })
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.set_time - self.rise_time).num_seconds()
    }

    pub fn label(&self, time_format: &str) -> String {
        format!(
            "{} {} {}",
            self.norad_id,
            self.observer,
            self.rise_time.format(time_format)
        )
    }
}

/// Why a sequencer run stopped. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompletionReason {
    WindowExhausted,
    PropagationFailed,
    Stalled,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassPrediction {
    pub trajectories: Vec<Trajectory>,
    pub reason: CompletionReason,
    /// Candidates discarded as out of order.
    pub skipped: usize,
    pub iterations: usize,
}
