//! Step sequencer
//!
//! Runs the computation steps of an analysis against one measure repository.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    StepSequencer                     │
//! ├──────────────────────────────────────────────────────┤
//! │  sequential: steps run in list order                 │
//! │  parallel:   steps are grouped in waves; a wave only │
//! │              holds steps whose dependencies ran.     │
//! │              Each step of a wave writes to its own   │
//! │              layer over the shared repository, the   │
//! │              layers are merged when the wave ends.   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Both modes produce the same measures. A dependency on a step that is not
//! scheduled is ignored.

use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{ComputeError, Result};
use crate::measure::{AddedMeasure, LayeredMeasureRepository, MapBasedMeasureRepository};
use crate::steps::{default_steps, AnalysisContext, ComputationStep};

/// Execution record of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepTiming {
    pub name: &'static str,
    pub duration_ms: u64,
    pub measures_added: usize,
}

/// Summary of a sequencer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    /// Steps in the order they completed
    pub steps: Vec<StepTiming>,
    pub measures_added: usize,
    /// Sum of step durations in milliseconds
    pub total_duration_ms: u64,
}

impl ExecutionSummary {
    /// Update summary with a step result
    pub fn add_result(&mut self, timing: StepTiming) {
        self.measures_added += timing.measures_added;
        self.total_duration_ms += timing.duration_ms;
        self.steps.push(timing);
    }

    pub fn steps_run(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, name: &str) -> Option<&StepTiming> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Orchestrates the computation steps of an analysis
pub struct StepSequencer {
    steps: Vec<Box<dyn ComputationStep>>,
    parallel: bool,
    /// Number of worker threads for parallel execution
    workers: usize,
}

impl StepSequencer {
    /// Sequential sequencer over `steps`, in the given order
    pub fn new(steps: Vec<Box<dyn ComputationStep>>) -> Self {
        Self {
            steps,
            parallel: false,
            workers: resolve_workers(0),
        }
    }

    /// Sequencer over the default steps minus the disabled ones
    ///
    /// Fails when a disabled step name matches no default step.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let steps = default_steps();
        if let Some(unknown) = config
            .steps
            .disabled
            .iter()
            .find(|name| !steps.iter().any(|s| s.name() == name.as_str()))
        {
            return Err(ComputeError::UnknownStep(unknown.clone()));
        }
        let steps = steps
            .into_iter()
            .filter(|s| config.steps.is_enabled(s.name()))
            .collect();
        Ok(Self::new(steps)
            .parallel(config.engine.parallel)
            .with_workers(config.engine.workers))
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the worker count of parallel mode (0 = auto-detect)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = resolve_workers(workers);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Group step indexes so that every step runs after the scheduled steps
    /// it depends on
    pub fn waves(&self) -> Result<Vec<Vec<usize>>> {
        let names = self.step_names();
        let mut done = vec![false; self.steps.len()];
        let mut waves = Vec::new();

        while done.iter().any(|d| !d) {
            let wave: Vec<usize> = (0..self.steps.len())
                .filter(|&i| !done[i])
                .filter(|&i| {
                    self.steps[i].depends_on().iter().all(|dependency| {
                        names
                            .iter()
                            .zip(&done)
                            .all(|(name, finished)| name != dependency || *finished)
                    })
                })
                .collect();
            if wave.is_empty() {
                let stuck = (0..self.steps.len()).filter(|&i| !done[i]).map(|i| names[i]).collect();
                return Err(ComputeError::StepDependencyCycle(stuck));
            }
            for &i in &wave {
                done[i] = true;
            }
            waves.push(wave);
        }
        Ok(waves)
    }

    /// Run every step against `measures`
    ///
    /// The first failing step aborts the run. In parallel mode the measures
    /// of the other steps of its wave are discarded.
    pub fn run(&self, context: &AnalysisContext, measures: &mut MapBasedMeasureRepository) -> Result<ExecutionSummary> {
        let start = Instant::now();
        info!(
            "Running {} computation steps ({})",
            self.steps.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let summary = if self.parallel {
            self.run_parallel(context, measures)?
        } else {
            self.run_sequential(context, measures)?
        };

        info!(
            "Computation complete: {} measures added by {} steps in {:?}",
            summary.measures_added,
            summary.steps_run(),
            start.elapsed()
        );
        Ok(summary)
    }

    fn run_sequential(
        &self,
        context: &AnalysisContext,
        measures: &mut MapBasedMeasureRepository,
    ) -> Result<ExecutionSummary> {
        let mut summary = ExecutionSummary::default();
        for step in &self.steps {
            debug!("Running step {}: {}", step.name(), step.description());
            let before = measures.added_count();
            let start = Instant::now();
            step.execute(context, measures)?;
            summary.add_result(StepTiming {
                name: step.name(),
                duration_ms: start.elapsed().as_millis() as u64,
                measures_added: measures.added_count() - before,
            });
        }
        Ok(summary)
    }

    fn run_parallel(
        &self,
        context: &AnalysisContext,
        measures: &mut MapBasedMeasureRepository,
    ) -> Result<ExecutionSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let mut summary = ExecutionSummary::default();
        for wave in self.waves()? {
            let names: Vec<_> = wave.iter().map(|&i| self.steps[i].name()).collect();
            debug!("Running wave {:?} on {} workers", names, self.workers);

            let base: &MapBasedMeasureRepository = measures;
            let results: Vec<(usize, Vec<AddedMeasure>, u64)> = pool.install(|| {
                wave.par_iter()
                    .map(|&i| {
                        let step = &self.steps[i];
                        let start = Instant::now();
                        let mut layer = LayeredMeasureRepository::new(base);
                        step.execute(context, &mut layer)?;
                        Ok((i, layer.into_added(), start.elapsed().as_millis() as u64))
                    })
                    .collect::<Result<Vec<_>>>()
            })?;

            for (i, added, duration_ms) in results {
                let measures_added = added.len();
                measures.merge_added(added)?;
                summary.add_result(StepTiming {
                    name: self.steps[i].name(),
                    duration_ms,
                    measures_added,
                });
            }
        }
        Ok(summary)
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new(default_steps())
    }
}

fn resolve_workers(workers: usize) -> usize {
    if workers == 0 {
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
            .min(16) // Cap at 16 threads
    } else {
        workers
    }
}

#[cfg(test)]
mod tests;
