use super::simulate::MonteCarloSimulation;
use crate::core::detectors::DetectorKind;
use crate::core::optics::properties::{OpticalProperties, OpticalPropertiesError};
use crate::engine::config::{ConfigError, SimulationInput};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use thiserror::Error;

/// Seed used by [`MonteCarloReflectanceModel`] when the base input does not fix one, so that
/// every evaluation shares the same random numbers.
const DEFAULT_MODEL_SEED: u64 = 0x5eed;

#[derive(Debug, Error)]
pub enum ForwardModelError {
    #[error("Expected {expected} parameters, got {found}")]
    ParameterCount { expected: usize, found: usize },

    #[error("Model predicted {found} values for {expected} measurements")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Invalid measured data: {0}")]
    InvalidMeasurement(String),

    #[error("Parameters do not describe valid optical properties: {0}")]
    InvalidParameters(#[from] OpticalPropertiesError),

    #[error("Region {0} is not a tissue layer")]
    InvalidLayer(usize),

    #[error("No radial reflectance detector named '{0}' in the base input")]
    MissingDetector(String),

    #[error("Simulation configuration rejected: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Simulation failed: {0}")]
    Simulation(#[from] EngineError),
}

/// Maps a parameter vector to predicted observables, as consumed by an external optimizer.
pub trait ForwardModel {
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, ForwardModelError>;
}

impl<F> ForwardModel for F
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, ForwardModelError> {
        Ok(self(parameters))
    }
}

/// Radial diffuse reflectance of a layered tissue as a function of one layer's
/// `[mua, musp]`, computed by Monte Carlo.
#[derive(Debug, Clone)]
pub struct MonteCarloReflectanceModel {
    base: SimulationInput,
    layer: usize,
    detector_name: String,
}

impl MonteCarloReflectanceModel {
    pub fn new(
        mut base: SimulationInput,
        layer: usize,
        detector_name: impl Into<String>,
    ) -> Result<Self, ForwardModelError> {
        let detector_name = detector_name.into();
        let has_detector = base.detectors.iter().any(|d| {
            d.name == detector_name && matches!(d.kind, DetectorKind::ROfRho { .. })
        });
        if !has_detector {
            return Err(ForwardModelError::MissingDetector(detector_name));
        }
        if layer == 0 || layer + 1 >= base.tissue.len() {
            return Err(ForwardModelError::InvalidLayer(layer));
        }
        base.options.seed.get_or_insert(DEFAULT_MODEL_SEED);
        MonteCarloSimulation::new(base.clone())?;
        Ok(Self {
            base,
            layer,
            detector_name,
        })
    }
}

impl ForwardModel for MonteCarloReflectanceModel {
    fn evaluate(&self, parameters: &[f64]) -> Result<Vec<f64>, ForwardModelError> {
        let [mua, musp] = parameters else {
            return Err(ForwardModelError::ParameterCount {
                expected: 2,
                found: parameters.len(),
            });
        };
        let mut input = self.base.clone();
        let current = input.tissue[self.layer].optical_properties;
        input.tissue[self.layer].optical_properties =
            OpticalProperties::new(*mua, *musp, current.g(), current.n())?;

        let output = MonteCarloSimulation::new(input)?.run(&ProgressReporter::new())?;
        output
            .result(&self.detector_name)
            .map(|result| result.mean.clone())
            .ok_or_else(|| ForwardModelError::MissingDetector(self.detector_name.clone()))
    }
}

/// Measured observables and the weight of each one in the fit, typically `1 / sigma`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredData {
    values: Vec<f64>,
    weights: Vec<f64>,
}

impl MeasuredData {
    pub fn new(values: Vec<f64>, weights: Vec<f64>) -> Result<Self, ForwardModelError> {
        if values.len() != weights.len() {
            return Err(ForwardModelError::InvalidMeasurement(format!(
                "{} values but {} weights",
                values.len(),
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ForwardModelError::InvalidMeasurement(format!(
                "weights must be finite and non-negative, got {w}"
            )));
        }
        Ok(Self { values, weights })
    }

    pub fn unweighted(values: Vec<f64>) -> Self {
        let weights = vec![1.0; values.len()];
        Self { values, weights }
    }

    /// Weights each value by the inverse of its standard deviation; zero deviations give
    /// zero weight.
    pub fn from_standard_deviations(
        values: Vec<f64>,
        std_devs: &[f64],
    ) -> Result<Self, ForwardModelError> {
        let weights = std_devs
            .iter()
            .map(|&sd| if sd > 0.0 { 1.0 / sd } else { 0.0 })
            .collect();
        Self::new(values, weights)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A weighted least-squares objective over the free subset of a model's parameters.
pub struct FitObjective<M: ForwardModel> {
    model: M,
    measured: MeasuredData,
    initial_guess: Vec<f64>,
    parameters_to_fit: Vec<bool>,
}

impl<M: ForwardModel> FitObjective<M> {
    pub fn new(
        model: M,
        measured: MeasuredData,
        initial_guess: Vec<f64>,
        parameters_to_fit: Vec<bool>,
    ) -> Result<Self, ForwardModelError> {
        if initial_guess.len() != parameters_to_fit.len() {
            return Err(ForwardModelError::ParameterCount {
                expected: initial_guess.len(),
                found: parameters_to_fit.len(),
            });
        }
        Ok(Self {
            model,
            measured,
            initial_guess,
            parameters_to_fit,
        })
    }

    pub fn measured(&self) -> &MeasuredData {
        &self.measured
    }

    pub fn free_parameter_count(&self) -> usize {
        self.parameters_to_fit.iter().filter(|fit| **fit).count()
    }

    /// The starting point of the free parameters.
    pub fn initial_free(&self) -> Vec<f64> {
        self.initial_guess
            .iter()
            .zip(&self.parameters_to_fit)
            .filter(|(_, fit)| **fit)
            .map(|(value, _)| *value)
            .collect()
    }

    /// Inserts `free` into the fitted slots of the initial guess.
    pub fn expand(&self, free: &[f64]) -> Result<Vec<f64>, ForwardModelError> {
        if free.len() != self.free_parameter_count() {
            return Err(ForwardModelError::ParameterCount {
                expected: self.free_parameter_count(),
                found: free.len(),
            });
        }
        let mut free = free.iter().copied();
        Ok(self
            .initial_guess
            .iter()
            .zip(&self.parameters_to_fit)
            .map(|(&fixed, &fit)| {
                if fit {
                    free.next().unwrap_or(fixed)
                } else {
                    fixed
                }
            })
            .collect())
    }

    /// `weight_i * (measured_i - predicted_i)` for every measurement.
    pub fn residuals(&self, free: &[f64]) -> Result<Vec<f64>, ForwardModelError> {
        let parameters = self.expand(free)?;
        let predicted = self.model.evaluate(&parameters)?;
        if predicted.len() != self.measured.len() {
            return Err(ForwardModelError::LengthMismatch {
                expected: self.measured.len(),
                found: predicted.len(),
            });
        }
        Ok(self
            .measured
            .values
            .iter()
            .zip(&self.measured.weights)
            .zip(&predicted)
            .map(|((measured, weight), predicted)| weight * (measured - predicted))
            .collect())
    }

    pub fn chi_square(&self, free: &[f64]) -> Result<f64, ForwardModelError> {
        Ok(self.residuals(free)?.iter().map(|r| r * r).sum())
    }
}
