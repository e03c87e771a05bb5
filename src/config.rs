use chrono::Duration;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use thiserror::Error;

use crate::predict::batch::ObserverPlan;
use crate::predict::{ObserverLocation, SequencerConfig, Sgp4Propagator, DEFAULT_TIME_FORMAT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("observer {name}: invalid coordinates {coordinates:?}")]
    Coordinates { name: String, coordinates: String },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tle_folder: PathBuf,
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default)]
    pub propagator: PropagatorConfig,
    #[serde(default)]
    pub sequencer: SequencerSection,
    pub observers: Vec<ObserverConfig>,
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropagatorConfig {
    #[serde(default = "default_coarse_step", deserialize_with = "human_duration")]
    pub coarse_step: Duration,
    #[serde(default = "default_fine_step", deserialize_with = "human_duration")]
    pub fine_step: Duration,
    #[serde(default = "default_search_horizon", deserialize_with = "human_duration")]
    pub search_horizon: Duration,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            coarse_step: default_coarse_step(),
            fine_step: default_fine_step(),
            search_horizon: default_search_horizon(),
        }
    }
}

fn default_coarse_step() -> Duration {
    Sgp4Propagator::default().coarse_step
}

fn default_fine_step() -> Duration {
    Sgp4Propagator::default().fine_step
}

fn default_search_horizon() -> Duration {
    Sgp4Propagator::default().search_horizon
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequencerSection {
    #[serde(default = "default_min_advance", deserialize_with = "human_duration")]
    pub min_advance: Duration,
}

impl Default for SequencerSection {
    fn default() -> Self {
        Self {
            min_advance: default_min_advance(),
        }
    }
}

fn default_min_advance() -> Duration {
    SequencerConfig::default().min_advance
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    pub name: String,
    /// `"lat, lon"` in decimal degrees
    pub coordinates: String,
    #[serde(default)]
    pub elevation_m: f64,
    #[serde(default)]
    pub horizon_deg: f64,
    #[serde(default)]
    pub refraction: bool,
    #[serde(default = "default_trajectory_window")]
    pub trajectory_window_hours: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_trajectory_window() -> u32 {
    24
}

fn default_active() -> bool {
    true
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim())
        .map_err(serde::de::Error::custom)
        .and_then(|d| Duration::from_std(d).map_err(serde::de::Error::custom))
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.check_durations()?;
        Ok(config)
    }

    fn check_durations(&self) -> Result<(), ConfigError> {
        let durations = [
            ("propagator.coarse_step", self.propagator.coarse_step),
            ("propagator.fine_step", self.propagator.fine_step),
            ("propagator.search_horizon", self.propagator.search_horizon),
            ("sequencer.min_advance", self.sequencer.min_advance),
        ];
        match durations.iter().find(|(_, d)| *d <= Duration::zero()) {
            Some((field, _)) => Err(ConfigError::NotPositive(*field)),
            None => Ok(()),
        }
    }

    pub fn propagator(&self) -> Sgp4Propagator {
        Sgp4Propagator {
            coarse_step: self.propagator.coarse_step,
            fine_step: self.propagator.fine_step,
            search_horizon: self.propagator.search_horizon,
        }
    }

    pub fn sequencer(&self) -> SequencerConfig {
        SequencerConfig {
            time_format: self.time_format.clone(),
            min_advance: self.sequencer.min_advance,
        }
    }

    /// Active observers with their prediction windows.
    pub fn observer_plans(&self) -> Result<Vec<ObserverPlan>, ConfigError> {
        self.observers
            .iter()
            .filter(|o| o.active)
            .map(|o| {
                let location =
                    ObserverLocation::from_coordinates(&o.name, &o.coordinates, Some(o.elevation_m))
                        .ok_or_else(|| ConfigError::Coordinates {
                            name: o.name.clone(),
                            coordinates: o.coordinates.clone(),
                        })?;
                Ok(ObserverPlan {
                    location: ObserverLocation {
                        refraction: o.refraction,
                        ..location.with_horizon(o.horizon_deg)
                    },
                    window_hours: o.trajectory_window_hours,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
tle_folder: ./tle
propagator:
  coarse_step: 30s
  search_horizon: 2days
sequencer:
  min_advance: 5s
observers:
  - name: london
    coordinates: "51.5074, -0.1278"
    elevation_m: 35
  - name: canberra
    coordinates: "-35.28, 149.13"
    horizon_deg: 10
    trajectory_window_hours: 48
  - name: retired
    coordinates: "0, 0"
    active: false
"#;

    #[test]
    fn parses_with_defaults() {
        let config = Config::from_str(YAML).unwrap();
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(config.propagator.coarse_step, Duration::seconds(30));
        assert_eq!(config.propagator.fine_step, Duration::seconds(1));
        assert_eq!(config.propagator.search_horizon, Duration::hours(48));
        assert_eq!(config.sequencer().min_advance, Duration::seconds(5));

        let plans = config.observer_plans().unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].window_hours, 24);
        assert_eq!(plans[0].location.elevation_m, 35.0);
        assert!(!plans[0].location.refraction);
        assert_eq!(plans[1].location.horizon_deg, 10.0);
        assert_eq!(plans[1].window_hours, 48);
    }

    #[test]
    fn bad_coordinates_are_reported() {
        let config = Config::from_str(
            "tle_folder: x\nobservers:\n  - name: nowhere\n    coordinates: \"north\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.observer_plans(),
            Err(ConfigError::Coordinates { .. })
        ));
    }

    #[test]
    fn bad_duration_is_a_parse_error() {
        let result = Config::from_str(
            "tle_folder: x\nsequencer:\n  min_advance: soon\nobservers: []\n",
        );
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let result = Config::from_str(
            "tle_folder: x\nsequencer:\n  min_advance: 0s\nobservers: []\n",
        );
        assert!(matches!(
            result,
            Err(ConfigError::NotPositive("sequencer.min_advance"))
        ));

        let result = Config::from_str(
            "tle_folder: x\npropagator:\n  fine_step: 0s\nobservers: []\n",
        );
        assert!(matches!(
            result,
            Err(ConfigError::NotPositive("propagator.fine_step"))
        ));
    }
}
