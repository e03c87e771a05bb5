mod error;
mod geometry;
mod observer;
mod propagator;
mod sequencer;
mod tle_loader;
mod types;

pub mod batch;

pub use error::{PredictError, PropagationError};
pub use geometry::{look_angles, LookAngles};
pub use observer::ObserverLocation;
pub use propagator::{Propagator, Sgp4Propagator};
pub use sequencer::{PassSequencer, SequencerConfig, DEFAULT_TIME_FORMAT};
pub use tle_loader::{parse_multi_tle, parse_tle, TleLoader};
pub use types::{
    CompletionReason, OrbitalElements, PassPrediction, PredictionWindow, RawPass, Trajectory,
};
