pub mod calibrator;
pub mod weights;

pub use calibrator::{calibrate, CalibrationConfig, CalibrationResult};
pub use weights::{
    fit_weights, TargetMetric, WeightFitConfig, WeightFitResult, WeightObservation,
};
