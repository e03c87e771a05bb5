use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PropagationError;
use crate::predict::geometry::{look_angles, LookAngles};
use crate::predict::observer::ObserverLocation;
use crate::predict::types::{OrbitalElements, RawPass};

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement
const SEARCH_HORIZON_HOURS: i64 = 48;

/// Source of next-pass answers for a satellite over an observer.
///
/// Implementations report the first rise, culmination and set events after
/// `after`, leaving out any event they could not find. They must not apply
/// atmospheric refraction, and must use the observer's horizon angle.
pub trait Propagator {
    fn next_pass(
        &self,
        elements: &OrbitalElements,
        observer: &ObserverLocation,
        after: DateTime<Utc>,
    ) -> Result<RawPass, PropagationError>;
}

impl<P: Propagator + ?Sized> Propagator for &P {
    fn next_pass(
        &self,
        elements: &OrbitalElements,
        observer: &ObserverLocation,
        after: DateTime<Utc>,
    ) -> Result<RawPass, PropagationError> {
        (**self).next_pass(elements, observer, after)
    }
}

/// Finds passes by scanning SGP4 look angles and refining horizon crossings.
#[derive(Debug, Clone, Copy)]
pub struct Sgp4Propagator {
    pub coarse_step: Duration,
    pub fine_step: Duration,
    pub search_horizon: Duration,
}

impl Default for Sgp4Propagator {
    fn default() -> Self {
        Self {
            coarse_step: Duration::seconds(COARSE_STEP_SECONDS),
            fine_step: Duration::seconds(FINE_STEP_SECONDS),
            search_horizon: Duration::hours(SEARCH_HORIZON_HOURS),
        }
    }
}

struct Scan<'a> {
    observer: &'a ObserverLocation,
    elements: Elements,
    constants: Constants,
    horizon: f64,
    fine_step: Duration,
}

impl Scan<'_> {
    fn sample(&self, t: DateTime<Utc>) -> Result<LookAngles, PropagationError> {
        look_angles(self.observer, &self.elements, &self.constants, t)
    }

    fn visible(&self, angles: &LookAngles) -> bool {
        angles.elevation >= self.horizon
    }

    /// Binary search for the horizon crossing between `before` and `after`
    fn refine_crossing(
        &self,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        rising: bool,
    ) -> Result<(DateTime<Utc>, f64), PropagationError> {
        let mut low = before;
        let mut high = after;

        while high - low > self.fine_step {
            let mid = low + (high - low) / 2;
            let above = self.visible(&self.sample(mid)?);
            if above == rising {
                high = mid;
            } else {
                low = mid;
            }
        }

        let final_sample = self.sample(high)?;
        Ok((high, final_sample.azimuth))
    }

    /// Ternary search for maximum elevation between `low` and `high`
    fn refine_culmination(
        &self,
        mut low: DateTime<Utc>,
        mut high: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, f64), PropagationError> {
        while high - low > self.fine_step {
            let third = (high - low) / 3;
            let m1 = low + third;
            let m2 = high - third;
            if self.sample(m1)?.elevation < self.sample(m2)?.elevation {
                low = m1;
            } else {
                high = m2;
            }
        }

        let mid = low + (high - low) / 2;
        Ok((mid, self.sample(mid)?.elevation))
    }
}

impl Propagator for Sgp4Propagator {
    fn next_pass(
        &self,
        elements: &OrbitalElements,
        observer: &ObserverLocation,
        after: DateTime<Utc>,
    ) -> Result<RawPass, PropagationError> {
        let sgp4_elements = elements.to_sgp4()?;
        let constants = Constants::from_elements(&sgp4_elements)?;
        let scan = Scan {
            observer,
            elements: sgp4_elements,
            constants,
            horizon: observer.horizon_rad(),
            fine_step: self.fine_step,
        };

        let end = after
            .checked_add_signed(self.search_horizon)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut raw = RawPass::default();
        let mut cursor = after;
        let first = scan.sample(cursor)?;
        let mut up = scan.visible(&first);
        // Earliest instant the current pass is known to be up.
        let mut pass_floor = after;
        let mut max_el = (cursor, first.elevation);

        while cursor < end {
            let next = cursor
                .checked_add_signed(self.coarse_step)
                .map_or(end, |t| t.min(end));
            let sample = scan.sample(next)?;
            let visible = scan.visible(&sample);

            if visible && !up {
                let (time, azimuth) = scan.refine_crossing(cursor, next, true)?;
                raw.rise_time = Some(time);
                raw.rise_azimuth = Some(azimuth);
                pass_floor = time;
                max_el = (next, sample.elevation);
            } else if visible {
                if sample.elevation > max_el.1 {
                    max_el = (next, sample.elevation);
                }
            } else if up {
                let (time, azimuth) = scan.refine_crossing(cursor, next, false)?;
                let low = (max_el.0 - self.coarse_step).max(pass_floor);
                let high = (max_el.0 + self.coarse_step).min(time);
                let (peak_time, peak_el) = scan.refine_culmination(low, high)?;

                raw.culmination_time = Some(peak_time);
                raw.culmination_altitude = Some(peak_el);
                raw.set_time = Some(time);
                raw.set_azimuth = Some(azimuth);
                return Ok(raw);
            }

            up = visible;
            cursor = next;
        }

        let hours = self.search_horizon.num_hours();
        match (raw.rise_time, up) {
            (Some(_), _) => {
                log::debug!(
                    "NORAD {} rises but does not set within {} h",
                    elements.norad_id,
                    hours
                );
                Ok(raw)
            }
            (None, true) => Err(PropagationError::AlwaysUp { hours }),
            (None, false) => Err(PropagationError::NeverRises { hours }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ISS (ZARYA), epoch 2008-09-20
    const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn iss() -> OrbitalElements {
        OrbitalElements::from_tle(Some("ISS (ZARYA)".into()), ISS_LINE1, ISS_LINE2).unwrap()
    }

    // Geostationary slot near 0 deg longitude, epoch 2008-09-20 12:00
    const GEO_LINE1: &str = "1 28884U 05041A   08264.50000000 -.00000296  00000-0  00000+0 0  9992";
    const GEO_LINE2: &str = "2 28884   0.0171   0.0000 0001000   0.0000 179.7475  1.00270000 11116";

    fn geo() -> OrbitalElements {
        OrbitalElements::from_tle(None, GEO_LINE1, GEO_LINE2).unwrap()
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn reads_catalog_number_from_tle() {
        assert_eq!(iss().norad_id, 25544);
    }

    #[test]
    fn finds_first_pass_over_mid_latitude_observer() {
        let observer = ObserverLocation::new("mid-latitude", 40.0, -75.0, 0.0);
        let raw = Sgp4Propagator::default()
            .next_pass(&iss(), &observer, epoch())
            .unwrap();

        assert!(raw.is_ordered(), "{raw:?}");
        let hms = |t: Option<DateTime<Utc>>| t.unwrap().format("%Y-%m-%d %H:%M:%S").to_string();
        assert_eq!(hms(raw.rise_time), "2008-09-20 22:49:14");
        assert_eq!(hms(raw.culmination_time), "2008-09-20 22:53:31");
        assert_eq!(hms(raw.set_time), "2008-09-20 22:57:50");
        assert!((raw.culmination_altitude.unwrap() - 0.2465).abs() < 1e-4);
    }

    #[test]
    fn geostationary_overhead_never_sets() {
        let observer = ObserverLocation::new("gulf of guinea", 0.0, 0.0, 0.0);
        let err = Sgp4Propagator::default()
            .next_pass(&geo(), &observer, epoch())
            .unwrap_err();
        assert_eq!(err, PropagationError::AlwaysUp { hours: 48 });
    }

    #[test]
    fn polar_observer_never_sees_low_inclination_orbit() {
        // ISS inclination is 51.6 deg; from the south pole it stays below the horizon.
        let observer = ObserverLocation::new("pole", -90.0, 0.0, 0.0);
        let propagator = Sgp4Propagator {
            search_horizon: Duration::hours(6),
            ..Sgp4Propagator::default()
        };
        let err = propagator.next_pass(&iss(), &observer, epoch()).unwrap_err();
        assert_eq!(err, PropagationError::NeverRises { hours: 6 });
    }

    #[test]
    fn garbage_tle_is_a_propagation_error() {
        let elements = OrbitalElements::new(1, None, "1 garbage", "2 garbage");
        let observer = ObserverLocation::new("x", 0.0, 0.0, 0.0);
        assert!(matches!(
            Sgp4Propagator::default().next_pass(&elements, &observer, epoch()),
            Err(PropagationError::Elements(_))
        ));
    }
}
