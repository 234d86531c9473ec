//! Orchestration loop: prepare, submit, wait, collect, propose, advance.
//!
//! One batch is in flight at a time. A cycle that fails leaves the step
//! counter and points untouched, so calling `run()` again repeats the same
//! step in the same directories.

use std::fmt;
use std::sync::Arc;

use crate::collector::ResultCollector;
use crate::config::{CollectionScope, ExperimentConfig};
use crate::domain::{BatchReport, DataPoint, ResultDataset, Step};
use crate::error::{Result, SweeprError};
use crate::jobs::build_specs;
use crate::journal::{StepJournal, StepRecord};
use crate::scheduler::{JobSubmitter, Scheduler};

use super::generator::{PointGenerator, Proposal};

/// Where the loop is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Submitting,
    Waiting,
    Collecting,
    Proposing,
    Advancing,
    Terminated,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Waiting => "waiting",
            Self::Collecting => "collecting",
            Self::Proposing => "proposing",
            Self::Advancing => "advancing",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    pub batch: BatchReport,
    pub dataset: ResultDataset,
    pub proposal: Proposal,
}

/// Result of `run_to_completion`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Cycles executed by this call
    pub steps_run: u32,
    pub final_step: Step,
    pub state: LoopState,
    /// Points the next cycle would submit (the last batch once terminated)
    pub points: Vec<DataPoint>,
    pub batches: Vec<BatchReport>,
}

impl RunSummary {
    pub fn terminated(&self) -> bool {
        self.state == LoopState::Terminated
    }
}

/// Drives steps until the point generator asks to stop.
pub struct OrchestrationLoop<S, G>
where
    S: Scheduler,
    G: PointGenerator,
{
    config: Arc<ExperimentConfig>,
    submitter: JobSubmitter<S>,
    generator: Arc<G>,
    collector: ResultCollector,
    journal: Option<StepJournal>,
    /// Completed cycle whose journal record could not be written yet
    unrecorded: Option<StepReport>,
    step: Step,
    points: Vec<DataPoint>,
    state: LoopState,
}

impl<S, G> OrchestrationLoop<S, G>
where
    S: Scheduler,
    G: PointGenerator,
{
    /// Loop at step 0 with `points` as the first batch.
    pub fn new(config: Arc<ExperimentConfig>, scheduler: Arc<S>, generator: Arc<G>, points: Vec<DataPoint>) -> Self {
        Self {
            config,
            submitter: JobSubmitter::new(scheduler),
            generator,
            collector: ResultCollector::default(),
            journal: None,
            unrecorded: None,
            step: 0,
            points,
            state: LoopState::Idle,
        }
    }

    pub fn with_collector(mut self, collector: ResultCollector) -> Self {
        self.collector = collector;
        self
    }

    /// Append a record to `journal` after every completed cycle.
    pub fn with_journal(mut self, journal: StepJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Start from `step` instead of 0.
    pub fn starting_at(mut self, step: Step) -> Self {
        self.step = step;
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn scheduler(&self) -> &Arc<S> {
        self.submitter.scheduler()
    }

    /// Pick up where the journal left off.
    ///
    /// Returns false when the journal is empty and the loop keeps its
    /// initial step and points.
    pub fn resume(&mut self) -> Result<bool> {
        let journal = self
            .journal
            .as_ref()
            .ok_or_else(|| SweeprError::InvalidState("resume requires a journal".into()))?;

        let Some(record) = journal.last()? else {
            return Ok(false);
        };
        journal.check_fingerprint(&record)?;
        self.unrecorded = None;

        match record.next() {
            Some((step, points)) => {
                tracing::info!(step, points = points.len(), "Resuming from journal");
                self.step = step;
                self.points = points;
                self.state = LoopState::Idle;
            }
            None => {
                tracing::info!(step = record.step, "Journal shows the loop already terminated");
                self.step = record.step;
                self.points = record.points;
                self.state = LoopState::Terminated;
            }
        }
        Ok(true)
    }

    fn transition(&mut self, to: LoopState) {
        tracing::debug!(step = self.step, from = %self.state, to = %to, "Loop state");
        self.state = to;
    }

    /// Run one full cycle for the current step.
    ///
    /// When only the journal write failed, the next call retries that write
    /// with the same batch, dataset and proposal instead of rerunning the
    /// jobs and asking the generator again.
    pub async fn run(&mut self) -> Result<StepReport> {
        if self.state == LoopState::Terminated {
            return Err(SweeprError::InvalidState("loop already terminated".into()));
        }
        if self.points.is_empty() {
            return Err(SweeprError::InvalidState(format!("step {} has no points", self.step)));
        }

        let pending = self.unrecorded.take().filter(|report| report.step == self.step);
        let report = match pending {
            Some(report) => {
                tracing::info!(step = self.step, "Retrying journal write for completed step");
                report
            }
            None => {
                tracing::info!(step = self.step, jobs = self.points.len(), "Starting step");
                match self.cycle().await {
                    Ok(report) => report,
                    Err(e) => return Err(self.abort(e)),
                }
            }
        };

        if let Err(e) = self.record(&report) {
            self.unrecorded = Some(report);
            return Err(self.abort(e));
        }

        match &report.proposal {
            Proposal::Points(next) if !next.is_empty() => {
                self.transition(LoopState::Advancing);
                self.step += 1;
                self.points = next.clone();
                self.transition(LoopState::Idle);
            }
            _ => {
                tracing::info!(step = self.step, "Point generator terminated the loop");
                self.transition(LoopState::Terminated);
            }
        }
        Ok(report)
    }

    fn abort(&mut self, error: SweeprError) -> SweeprError {
        tracing::warn!(step = self.step, state = %self.state, error = %error, "Step aborted");
        self.transition(LoopState::Idle);
        error
    }

    async fn cycle(&mut self) -> Result<StepReport> {
        let step = self.step;

        self.transition(LoopState::Submitting);
        let specs = build_specs(&self.config, step, &self.points)?;

        self.transition(LoopState::Waiting);
        let batch = self.submitter.run_batch(&specs).await?;

        self.transition(LoopState::Collecting);
        let dataset = match self.config.collection {
            CollectionScope::SourceDir => self
                .collector
                .collect(&self.config.source_dir, &self.config.output_extension)?,
            CollectionScope::JobDirs => self.collector.collect_job_dirs(&self.config, step, specs.len())?,
        };
        tracing::info!(
            step,
            files = dataset.len(),
            parse_failures = dataset.error_count(),
            "Collected results"
        );

        self.transition(LoopState::Proposing);
        let proposal = self.generator.propose(&dataset).await?;

        Ok(StepReport {
            step,
            batch,
            dataset,
            proposal,
        })
    }

    fn record(&self, report: &StepReport) -> Result<()> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let record = StepRecord::new(
            report.step,
            journal.fingerprint(),
            self.points.clone(),
            report.batch.outcomes.clone(),
            &report.dataset,
            report.proposal.points().map(<[DataPoint]>::to_vec),
        );
        journal.append(&record)
    }

    /// Run cycles until the loop terminates or `max_steps` cycles ran.
    pub async fn run_to_completion(&mut self, max_steps: Option<u32>) -> Result<RunSummary> {
        let mut steps_run = 0;
        let mut batches = Vec::new();

        while self.state != LoopState::Terminated {
            if max_steps.is_some_and(|max| steps_run >= max) {
                tracing::info!(step = self.step, steps_run, "Step limit reached");
                break;
            }
            let report = self.run().await?;
            batches.push(report.batch);
            steps_run += 1;
        }

        Ok(RunSummary {
            steps_run,
            final_step: self.step,
            state: self.state,
            points: self.points.clone(),
            batches,
        })
    }
}
