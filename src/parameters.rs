//! Construction-time configuration of a model.
//!
//! Parameters are plain data: they can be built in code, starting from
//! `Parameters::default()`, or read from a JSON file with [`Parameters::load`]. Any field
//! missing from the file keeps its default. They are validated once, before the first tick,
//! and never change afterwards.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::SirvError;
use crate::grid::{Neighborhood, Topology};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Total number of agents, N.
    pub population: usize,
    /// Number of agents that start vaccinated, V. Agents `0..V` are vaccinated.
    pub vaccinated: usize,
    pub width: usize,
    pub height: usize,
    /// Effective-contact and transmission probability, beta.
    pub beta: f64,
    /// Per-tick recovery probability of unvaccinated infections, gamma.
    pub gamma: f64,
    /// Multiplier applied to gamma for vaccinated infections, delta.
    pub delta: f64,
    /// Contact reduction against vaccinated targets, eta.
    pub eta: f64,
    /// Vaccine effectiveness factor against vaccinated targets, epsilon.
    pub effectiveness: f64,
    /// Probability that a vaccinated agent starts infected.
    pub initial_infection_vaccinated: f64,
    /// Probability that a susceptible agent starts infected.
    pub initial_infection_susceptible: f64,
    pub topology: Topology,
    pub neighborhood: Neighborhood,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population: 10,
            vaccinated: 5,
            width: 10,
            height: 10,
            beta: 0.833,
            gamma: 1.0 / 3.0,
            delta: 3.0,
            eta: 0.3,
            effectiveness: 0.5,
            initial_infection_vaccinated: 0.01,
            initial_infection_susceptible: 0.03,
            topology: Topology::Torus,
            neighborhood: Neighborhood::Moore,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), SirvError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SirvError::ConfigurationError(format!(
            "{name} must be a probability in [0, 1], got {value}"
        )))
    }
}

impl Parameters {
    /// Reads parameters from a JSON file and validates them.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::IoError` if the file can't be read, `SirvError::JsonError` if it
    /// isn't a valid parameters object, or `SirvError::ConfigurationError` if validation fails.
    pub fn load(path: &Path) -> Result<Self, SirvError> {
        trace!("loading parameters from {}", path.display());
        let file = File::open(path)?;
        let parameters: Parameters = serde_json::from_reader(BufReader::new(file))?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks every field against its domain.
    ///
    /// # Errors
    ///
    /// Returns `SirvError::ConfigurationError` naming the first invalid field.
    pub fn validate(&self) -> Result<(), SirvError> {
        if self.population == 0 {
            return Err(SirvError::ConfigurationError(
                "population must be positive".to_string(),
            ));
        }
        if self.vaccinated > self.population {
            return Err(SirvError::ConfigurationError(format!(
                "vaccinated ({}) exceeds population ({})",
                self.vaccinated, self.population
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(SirvError::ConfigurationError(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        check_probability("beta", self.beta)?;
        check_probability("gamma", self.gamma)?;
        check_probability("eta", self.eta)?;
        check_probability("effectiveness", self.effectiveness)?;
        check_probability(
            "initial_infection_vaccinated",
            self.initial_infection_vaccinated,
        )?;
        check_probability(
            "initial_infection_susceptible",
            self.initial_infection_susceptible,
        )?;
        if !self.delta.is_finite() || self.delta < 0.0 {
            return Err(SirvError::ConfigurationError(format!(
                "delta must be a finite non-negative multiplier, got {}",
                self.delta
            )));
        }
        Ok(())
    }

    /// Per-tick recovery probability of a vaccinated infection, `gamma * delta` capped at 1.
    #[must_use]
    pub fn vaccinated_recovery_probability(&self) -> f64 {
        (self.gamma * self.delta).min(1.0)
    }

    /// Transmission probability against a vaccinated target, `beta * (1 - eta) * effectiveness`.
    #[must_use]
    pub fn vaccinated_transmission_probability(&self) -> f64 {
        self.beta * (1.0 - self.eta) * self.effectiveness
    }
}
