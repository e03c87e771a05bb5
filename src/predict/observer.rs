use serde::Serialize;

use crate::predict::error::PredictError;

/// A ground observer. Refraction is off by default so that rise and set
/// times depend on geometry alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObserverLocation {
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub elevation_m: f64,
    pub refraction: bool,
    pub horizon_deg: f64,
}

impl Default for ObserverLocation {
    fn default() -> Self {
        Self {
            name: String::new(),
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            elevation_m: 0.0,
            refraction: false,
            horizon_deg: 0.0,
        }
    }
}

impl ObserverLocation {
    pub fn new(name: &str, latitude_deg: f64, longitude_deg: f64, elevation_m: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude_deg,
            longitude_deg,
            elevation_m,
            ..Self::default()
        }
    }

    /// Parses `"lat, lon"` in decimal degrees.
    pub fn from_coordinates(name: &str, coordinates: &str, elevation_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Some(Self::new(name, lat, lon, elevation_m.unwrap_or(0.0)))
    }

    pub fn with_horizon(mut self, horizon_deg: f64) -> Self {
        self.horizon_deg = horizon_deg;
        self
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        let invalid = |msg: String| Err(PredictError::InvalidInput(msg));
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return invalid(format!("latitude {} out of range", self.latitude_deg));
        }
        if !(-180.0..=180.0).contains(&self.longitude_deg) {
            return invalid(format!("longitude {} out of range", self.longitude_deg));
        }
        if !self.elevation_m.is_finite() || !self.horizon_deg.is_finite() {
            return invalid(format!("observer {} has non-finite elevation or horizon", self.name));
        }
        if self.refraction {
            return invalid(format!(
                "observer {} has atmospheric refraction enabled",
                self.name
            ));
        }
        Ok(())
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn horizon_rad(&self) -> f64 {
        self.horizon_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.elevation_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - e2) + alt_km) * sin_lat,
        ]
    }
}
