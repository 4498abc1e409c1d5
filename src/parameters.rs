//! Run configuration.
//!
//! [`Parameters`] is read-only for the lifetime of a run. It is loaded from JSON (or built in
//! code), validated once, and stored in the [`Context`] through [`ContextParametersExt`].
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::ContagionError;

/// The smallest population that can be clustered into households meaningfully.
pub const MIN_POPULATION_SIZE: usize = 10;

/// A coarse household size preset, as offered by the parameter form of the desktop front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HouseholdDensity {
    Low,
    Medium,
    High,
}

impl HouseholdDensity {
    #[must_use]
    pub fn household_size(self) -> usize {
        match self {
            HouseholdDensity::Low => 2,
            HouseholdDensity::Medium => 4,
            HouseholdDensity::High => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub population_size: usize,
    /// Individuals moved to Incubating on day 0.
    pub initial_infected: usize,
    /// Chance that one infectious neighbor infects a healthy individual on one day.
    pub infection_probability: f64,
    /// Days spent Incubating before becoming Infected.
    pub incubation_days: u32,
    /// Days spent Infected before recovering or dying.
    pub recovery_days: u32,
    /// Chance that an Infected individual dies rather than recovers.
    pub death_probability: f64,
    pub household_size: usize,
    /// Target number of ambient contacts per individual per day, before isolation.
    pub contact_degree: f64,
    /// Fraction by which isolation reduces the ambient contact target.
    pub isolation_factor: f64,
    /// Hard cap on the ambient contacts one individual seeks per day.
    pub max_ambient_degree: usize,
    /// When set, Infected individuals drop out of ambient mixing. Household edges are kept.
    pub isolate_infected: bool,
    pub max_days: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population_size: 500,
            initial_infected: 5,
            infection_probability: 0.3,
            incubation_days: 5,
            recovery_days: 7,
            death_probability: 0.02,
            household_size: HouseholdDensity::Low.household_size(),
            contact_degree: 5.0,
            isolation_factor: 0.0,
            max_ambient_degree: 10,
            isolate_infected: false,
            max_days: 100,
        }
    }
}

fn invalid(message: String) -> ContagionError {
    ContagionError::InvalidConfiguration(message)
}

fn check_probability(name: &str, value: f64) -> Result<(), ContagionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

impl Parameters {
    /// Checks every field against its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ContagionError> {
        if self.population_size < MIN_POPULATION_SIZE {
            return Err(invalid(format!(
                "population_size must be at least {MIN_POPULATION_SIZE}, got {}",
                self.population_size
            )));
        }
        if self.initial_infected > self.population_size {
            return Err(invalid(format!(
                "initial_infected ({}) cannot exceed population_size ({})",
                self.initial_infected, self.population_size
            )));
        }
        check_probability("infection_probability", self.infection_probability)?;
        check_probability("death_probability", self.death_probability)?;
        check_probability("isolation_factor", self.isolation_factor)?;
        if self.recovery_days < 1 {
            return Err(invalid("recovery_days must be at least 1".to_string()));
        }
        if self.household_size < 1 {
            return Err(invalid("household_size must be at least 1".to_string()));
        }
        // Written so that NaN fails too.
        if !(self.contact_degree >= 0.0 && self.contact_degree.is_finite()) {
            return Err(invalid(format!(
                "contact_degree must be a finite non-negative number, got {}",
                self.contact_degree
            )));
        }
        if self.effective_contact_degree() == 0.0 || self.max_ambient_degree == 0 {
            warn!("ambient contact is disabled; only household edges will carry infection");
        }
        Ok(())
    }

    /// The ambient degree target after applying the isolation factor.
    #[must_use]
    pub fn effective_contact_degree(&self) -> f64 {
        self.contact_degree * (1.0 - self.isolation_factor)
    }

    /// Parses and validates parameters from a JSON string. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::JsonError`] for malformed input and
    /// [`ContagionError::InvalidConfiguration`] for out-of-bounds values.
    pub fn from_json_str(json: &str) -> Result<Self, ContagionError> {
        let parameters: Parameters = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Reads, parses and validates parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails as [`Parameters::from_json_str`] does, or with [`ContagionError::IoError`] when
    /// the file cannot be read.
    pub fn from_json_file(file_path: &Path) -> Result<Self, ContagionError> {
        trace!("loading parameters from {}", file_path.display());
        let json = fs::read_to_string(file_path)?;
        Self::from_json_str(&json)
    }
}

define_data_plugin!(ParametersPlugin, Option<Parameters>, None);

pub trait ContextParametersExt {
    /// Validates `parameters` and stores them for the rest of the run.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] if validation fails; nothing is stored.
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), ContagionError>;

    /// Loads parameters from a JSON file and stores them.
    ///
    /// # Errors
    ///
    /// See [`Parameters::from_json_file`].
    fn init_parameters(&mut self, file_path: &Path) -> Result<(), ContagionError>;

    /// # Errors
    ///
    /// Returns [`ContagionError::PluginNotInitialized`] if no parameters were set.
    fn get_parameters(&self) -> Result<&Parameters, ContagionError>;
}

impl ContextParametersExt for Context {
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), ContagionError> {
        parameters.validate()?;
        *self.get_data_mut(ParametersPlugin) = Some(parameters);
        Ok(())
    }

    fn init_parameters(&mut self, file_path: &Path) -> Result<(), ContagionError> {
        let parameters = Parameters::from_json_file(file_path)?;
        self.set_parameters(parameters)
    }

    fn get_parameters(&self) -> Result<&Parameters, ContagionError> {
        self.get_data(ParametersPlugin)
            .and_then(Option::as_ref)
            .ok_or(ContagionError::PluginNotInitialized("parameters"))
    }
}
