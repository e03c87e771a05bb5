use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PropagationError;
use crate::predict::observer::ObserverLocation;

/// Topocentric direction of a satellite, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth: f64,
    pub elevation: f64,
    pub range_km: f64,
}

pub fn look_angles(
    observer: &ObserverLocation,
    elements: &Elements,
    constants: &Constants,
    timestamp: DateTime<Utc>,
) -> Result<LookAngles, PropagationError> {
    let minutes = elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PropagationError::Sgp4(e.to_string()))?;

    let prediction = constants.propagate(minutes)?;

    let sidereal =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));

    let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
    let sta_ecef = observer.position_ecef_km();

    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
    if !range_km.is_finite() {
        return Err(PropagationError::Sgp4(format!(
            "non-finite range at {}",
            timestamp
        )));
    }

    let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let elevation = if range_km > 0.0 {
        (up / range_km).asin()
    } else {
        0.0
    };

    Ok(LookAngles {
        azimuth: east.atan2(north).rem_euclid(std::f64::consts::TAU),
        elevation,
        range_km,
    })
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sidereal_angle_is_identity() {
        let p = teme_to_ecef_position([7000.0, 10.0, -3.0], 0.0);
        assert_eq!(p, [7000.0, 10.0, -3.0]);
    }

    #[test]
    fn enu_axes_at_equator() {
        // Straight up from (0, 0) is +x in ECEF.
        let (e, n, u) = ecef_to_enu([1.0, 0.0, 0.0], 0.0, 0.0);
        assert!(e.abs() < 1e-12 && n.abs() < 1e-12);
        assert!((u - 1.0).abs() < 1e-12);

        let (e, n, _) = ecef_to_enu([0.0, 0.0, 1.0], 0.0, 0.0);
        assert!(e.abs() < 1e-12);
        assert!((n - 1.0).abs() < 1e-12);
    }
}
