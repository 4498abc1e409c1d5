use std::path::PathBuf;

use clap::{ArgAction, Args, Command, FromArgMatches as _};
use log::{info, LevelFilter};
use rayon::prelude::*;

use crate::error::ContagionError;
use crate::log::{apply_log_directive, set_log_level, LogDirective};
use crate::parameters::{HouseholdDensity, Parameters};
use crate::simulation::{run_batch, RunSummary};

/// Default cli arguments for the contagion runner
#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    /// Random seed. Replicate `i` uses `random_seed + i`
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Household density; overrides `household_size` from the config file
    #[arg(long, value_enum)]
    pub house_density: Option<HouseholdDensity>,

    /// Overrides `population_size` from the config file
    #[arg(short, long)]
    pub population_size: Option<usize>,

    /// Overrides `max_days` from the config file
    #[arg(short, long)]
    pub max_days: Option<u32>,

    /// Number of independent runs
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub replicates: u32,

    /// Log level and module filters, e.g. `info,contagion::network=warn`
    #[arg(long)]
    pub log_level: Option<LogDirective>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). Ignored with --log-level
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl BaseArgs {
    /// Builds the run parameters: the config file (or the defaults), then any command line
    /// overrides, then validation.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError`] if the config file cannot be read or parsed, or if the
    /// resulting parameters are invalid.
    pub fn parameters(&self) -> Result<Parameters, ContagionError> {
        let mut parameters = match &self.config {
            Some(path) => {
                info!("loading parameters from {}", path.display());
                Parameters::from_json_file(path)?
            }
            None => Parameters::default(),
        };

        if let Some(density) = self.house_density {
            parameters.household_size = density.household_size();
        }
        if let Some(population_size) = self.population_size {
            parameters.population_size = population_size;
        }
        if let Some(max_days) = self.max_days {
            parameters.max_days = max_days;
        }
        parameters.validate()?;
        Ok(parameters)
    }

    /// The seed of every replicate, produced lazily.
    pub fn seeds(&self) -> impl ParallelIterator<Item = u64> {
        let base_seed = self.random_seed;
        (0..u64::from(self.replicates))
            .into_par_iter()
            .map(move |replicate| base_seed.wrapping_add(replicate))
    }

    fn configure_logging(&self) {
        if let Some(directive) = &self.log_level {
            apply_log_directive(directive);
            return;
        }
        let level = match self.verbose {
            0 => return,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        set_log_level(level);
    }
}

fn create_contagion_cli() -> Command {
    let cli = Command::new("contagion")
        .about("Simulates an epidemic on a household-clustered contact network");
    BaseArgs::augment_args(cli)
}

/// Runs the simulation with the process's command line arguments and returns one summary per
/// replicate, in seed order.
///
/// # Errors
///
/// Returns an error if argument parsing, parameter loading or any replicate fails.
pub fn run_with_args() -> Result<Vec<RunSummary>, ContagionError> {
    let matches = create_contagion_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)
        .map_err(|e| ContagionError::InvalidConfiguration(e.to_string()))?;
    run_with_args_internal(&args)
}

fn run_with_args_internal(args: &BaseArgs) -> Result<Vec<RunSummary>, ContagionError> {
    args.configure_logging();
    let parameters = args.parameters()?;
    info!(
        "running {} replicate(s) starting at seed {}",
        args.replicates, args.random_seed
    );
    run_batch(&parameters, args.seeds())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::simulation::{Simulation, Termination};
    use crate::snapshot::NoopObserver;

    fn base_args() -> BaseArgs {
        BaseArgs {
            random_seed: 42,
            config: None,
            house_density: None,
            population_size: Some(50),
            max_days: Some(10),
            replicates: 1,
            log_level: None,
            verbose: 0,
        }
    }

    fn parse(args: &[&str]) -> Result<BaseArgs, clap::Error> {
        let matches = create_contagion_cli().try_get_matches_from(args)?;
        BaseArgs::from_arg_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["contagion"]).unwrap();
        assert_eq!(args.random_seed, 0);
        assert_eq!(args.replicates, 1);
        assert!(args.config.is_none());
        assert_eq!(args.parameters().unwrap(), Parameters::default());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "contagion",
            "--house-density",
            "high",
            "--population-size",
            "200",
            "--max-days",
            "30",
            "-vv",
            "--log-level",
            "warn,contagion::network=error",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        let directive = args.log_level.clone().unwrap();
        assert_eq!(directive.level, Some(LevelFilter::Warn));

        let parameters = args.parameters().unwrap();
        assert_eq!(parameters.household_size, 6);
        assert_eq!(parameters.population_size, 200);
        assert_eq!(parameters.max_days, 30);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["contagion", "--house-density", "crowded"]).is_err());
        assert!(parse(&["contagion", "--replicates", "0"]).is_err());
        assert!(parse(&["contagion", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_run_with_config_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "population_size": 40, "initial_infected": 2, "household_size": 4 }}"#
        )
        .unwrap();
        let args = BaseArgs {
            config: Some(file.path().to_path_buf()),
            population_size: None,
            ..base_args()
        };
        let parameters = args.parameters().unwrap();
        assert_eq!(parameters.population_size, 40);
        assert_eq!(parameters.initial_infected, 2);
        assert_eq!(parameters.max_days, 10);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = BaseArgs {
            population_size: Some(4),
            ..base_args()
        };
        assert!(matches!(
            run_with_args_internal(&args),
            Err(ContagionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_run_with_random_seed() {
        let args = base_args();
        let summaries = run_with_args_internal(&args).unwrap();
        assert_eq!(summaries.len(), 1);

        let expected = Simulation::new(args.parameters().unwrap(), 42)
            .unwrap()
            .run(&mut NoopObserver)
            .unwrap();
        assert_eq!(summaries[0], expected);
        assert!(summaries[0].days_elapsed <= 10);
        assert_ne!(summaries[0].termination, Termination::Cancelled);
    }

    #[test]
    fn test_replicates_use_consecutive_seeds() {
        let args = BaseArgs {
            replicates: 3,
            random_seed: u64::MAX,
            ..base_args()
        };
        assert_eq!(args.seeds().collect::<Vec<_>>(), vec![u64::MAX, 0, 1]);
        assert_eq!(run_with_args_internal(&args).unwrap().len(), 3);
    }

    #[test]
    fn test_cli_invocation() {
        // Note this target is defined in the bin section of Cargo.toml
        // and the entry point is in src/bin/contagion.rs
        let output = assert_cmd::Command::cargo_bin("contagion")
            .unwrap()
            .args(["--population-size", "30", "--max-days", "5", "-r", "7"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert!(summary["days_elapsed"].as_u64().unwrap() <= 5);
    }
}
