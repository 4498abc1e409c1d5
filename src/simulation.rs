//! The day-by-day driver.
//!
//! A [`Simulation`] owns one [`Context`] and everything in it. Construction performs day 0:
//! parameters are validated, the population is created and partitioned into households, and
//! the initial infections are seeded. Each later day then runs, strictly in this order:
//! 1. ambient rewiring, which drops yesterday's ambient edges and samples today's;
//! 2. the disease state machine, which reads the states and edges as of step 1;
//! 3. a [`Snapshot`] of the finished day.
//!
//! Stopping conditions are checked after every snapshot, day 0 included.
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::context::{Context, Day};
use crate::disease::ContextDiseaseExt;
use crate::error::ContagionError;
use crate::household::ContextHouseholdExt;
use crate::network::{AmbientEdges, ContextNetworkExt};
use crate::parameters::{ContextParametersExt, Parameters};
use crate::population::{ContextPopulationExt, StatusCounts};
use crate::random::ContextRandomExt;
use crate::snapshot::{NoopObserver, Snapshot, SnapshotObserver};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Nobody is Incubating or Infected any more.
    BurnedOut,
    MaxDaysReached,
    /// Stopped early through a [`StopHandle`] or by an observer.
    Cancelled,
}

/// Requests early termination of a running simulation from anywhere, including another
/// thread. The request takes effect once the current day's snapshot has been produced.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The final report of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Everyone who ever left Healthy: Recovered, Dead, Incubating and Infected.
    pub total_ever_infected: usize,
    pub total_dead: usize,
    /// Largest number of simultaneously Infected individuals seen in any snapshot.
    pub peak_infected: usize,
    /// First day on which `peak_infected` was reached.
    pub peak_day: Day,
    pub days_elapsed: Day,
    pub termination: Termination,
    pub final_counts: StatusCounts,
}

impl RunSummary {
    /// # Errors
    ///
    /// Returns [`ContagionError::JsonError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ContagionError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Day 0 is set up but its snapshot has not been handed out yet.
    NotStarted,
    Running,
    Finished(Termination),
    /// A day failed; the state is not trustworthy any more.
    Aborted,
}

pub struct Simulation {
    context: Context,
    ambient_edges: AmbientEdges,
    stop_handle: StopHandle,
    state: RunState,
    max_days: Day,
    peak_infected: usize,
    peak_day: Day,
}

impl Simulation {
    /// Validates `parameters` and performs day 0: population, households and initial
    /// infections. All randomness derives from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] for invalid parameters. No partial run
    /// is created.
    pub fn new(parameters: Parameters, seed: u64) -> Result<Self, ContagionError> {
        let mut context = Context::new();
        let population_size = parameters.population_size;
        let initial_infected = parameters.initial_infected;
        let max_days = parameters.max_days;
        context.set_parameters(parameters)?;
        context.init_random(seed);
        context.init_population(population_size)?;
        context.init_network()?;
        let households = context.init_households()?;
        context.seed_infections(initial_infected)?;

        info!(
            "starting simulation: {population_size} individuals in {} households, {initial_infected} initially infected, seed {seed}",
            households.len()
        );

        Ok(Simulation {
            context,
            ambient_edges: AmbientEdges::new(),
            stop_handle: StopHandle::default(),
            state: RunState::NotStarted,
            max_days,
            peak_infected: 0,
            peak_day: 0,
        })
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// # Errors
    ///
    /// Fails only if a plugin is missing, which cannot happen after [`Simulation::new`].
    pub fn parameters(&self) -> Result<&Parameters, ContagionError> {
        self.context.get_parameters()
    }

    #[must_use]
    pub fn current_day(&self) -> Day {
        self.context.get_current_day()
    }

    /// The ambient edges of the current day.
    #[must_use]
    pub fn ambient_edges(&self) -> &AmbientEdges {
        &self.ambient_edges
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    /// Stops the run once the current day's snapshot has been delivered, exactly as a
    /// [`StopHandle`] would. Before the first `step` that is the day 0 snapshot.
    pub fn cancel(&mut self) {
        if !self.is_finished() {
            info!("simulation cancel requested on day {}", self.current_day());
            self.context.shutdown();
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop_handle.is_stopped() || self.context.is_shutdown_requested()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, RunState::Finished(_) | RunState::Aborted)
    }

    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        match self.state {
            RunState::Finished(termination) => Some(termination),
            _ => None,
        }
    }

    /// A snapshot of the current state.
    ///
    /// # Errors
    ///
    /// Fails only if a plugin is missing, which cannot happen after [`Simulation::new`].
    pub fn snapshot(&self) -> Result<Snapshot, ContagionError> {
        Ok(Snapshot::capture(
            self.current_day(),
            self.context.get_population()?,
            self.context.get_network()?,
        ))
    }

    /// Produces the next snapshot: day 0 on the first call, then one new day per call.
    /// Returns `Ok(None)` once the run has stopped.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the day (for example
    /// [`ContagionError::ExhaustedCandidates`]). The simulation is then aborted and every
    /// later call returns `Ok(None)`.
    pub fn step(&mut self) -> Result<Option<Snapshot>, ContagionError> {
        match self.state {
            RunState::Finished(_) | RunState::Aborted => return Ok(None),
            RunState::NotStarted => {}
            RunState::Running => {
                // The last delivered snapshot already completed the day being stopped.
                if self.stop_requested() {
                    let termination = Termination::Cancelled;
                    info!("simulation stopped on day {}: {termination}", self.current_day());
                    self.state = RunState::Finished(termination);
                    return Ok(None);
                }
                if let Err(e) = self.advance_day() {
                    error!("day {} aborted: {e}", self.current_day());
                    self.state = RunState::Aborted;
                    return Err(e);
                }
            }
        }

        let snapshot = self.snapshot()?;
        if snapshot.counts.infected > self.peak_infected {
            self.peak_infected = snapshot.counts.infected;
            self.peak_day = snapshot.day;
        }

        self.state = match self.check_termination(&snapshot.counts) {
            Some(termination) => {
                info!("simulation stopped on day {}: {termination}", snapshot.day);
                self.context.shutdown();
                RunState::Finished(termination)
            }
            None => RunState::Running,
        };
        Ok(Some(snapshot))
    }

    fn advance_day(&mut self) -> Result<(), ContagionError> {
        self.context.advance_day();
        let previous = std::mem::take(&mut self.ambient_edges);
        self.ambient_edges = self.context.rewire_ambient_edges(previous)?;
        self.context.advance_disease()?;
        Ok(())
    }

    fn check_termination(&self, counts: &StatusCounts) -> Option<Termination> {
        if counts.active() == 0 {
            Some(Termination::BurnedOut)
        } else if self.current_day() >= self.max_days {
            Some(Termination::MaxDaysReached)
        } else if self.stop_requested() {
            Some(Termination::Cancelled)
        } else {
            None
        }
    }

    /// Runs to completion, handing every snapshot to `observer`. An observer returning
    /// [`ControlFlow::Break`] cancels the run after that day.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted a day, if any.
    pub fn run<O: SnapshotObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<RunSummary, ContagionError> {
        while let Some(snapshot) = self.step()? {
            if let ControlFlow::Break(()) = observer.on_snapshot(&snapshot) {
                self.cancel();
            }
        }
        let summary = self
            .summary()
            .ok_or_else(|| ContagionError::from("simulation stopped without a summary"))?;
        info!(
            "run summary: {} ever infected, {} dead, peak {} infected on day {}",
            summary.total_ever_infected, summary.total_dead, summary.peak_infected, summary.peak_day
        );
        Ok(summary)
    }

    /// The final report, once the run has stopped.
    #[must_use]
    pub fn summary(&self) -> Option<RunSummary> {
        let termination = self.termination()?;
        let final_counts = self.context.get_status_counts().ok()?;
        Some(RunSummary {
            total_ever_infected: final_counts.ever_infected(),
            total_dead: final_counts.dead,
            peak_infected: self.peak_infected,
            peak_day: self.peak_day,
            days_elapsed: self.current_day(),
            termination,
            final_counts,
        })
    }
}

/// Runs one independent simulation per seed and returns the summaries in seed order. Each
/// simulation owns its own random streams, population and network. Replicates share the
/// rayon thread pool, so any number of seeds runs on a bounded number of threads.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or any replicate fails. A replicate that
/// panics propagates its panic to the caller.
pub fn run_batch<I>(parameters: &Parameters, seeds: I) -> Result<Vec<RunSummary>, ContagionError>
where
    I: IntoParallelIterator<Item = u64>,
{
    parameters.validate()?;
    seeds
        .into_par_iter()
        .map(|seed| Simulation::new(parameters.clone(), seed)?.run(&mut NoopObserver))
        .collect()
}
