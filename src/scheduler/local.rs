//! Local process scheduler.
//!
//! Runs each job as a child process in its working directory, with stdout
//! redirected to the spec's stdout file. Parallelism is bounded by a
//! semaphore shared by the session's jobs.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::SchedulerConfig;
use crate::domain::{JobOutcome, JobSpec};
use crate::error::{Result, SweeprError};
use crate::id::{generate_handle_id, generate_session_id};

use super::traits::{Completion, JobHandle, Scheduler, SchedulerSession};

/// Scheduler backed by local child processes.
#[derive(Debug, Clone)]
pub struct LocalScheduler {
    max_parallel: usize,
    job_timeout: Option<Duration>,
}

impl Default for LocalScheduler {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

impl LocalScheduler {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            job_timeout: None,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            max_parallel: config.max_parallel.max(1),
            job_timeout: config.job_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Kill and report `TimedOut` for jobs running longer than `timeout`.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

#[async_trait]
impl Scheduler for LocalScheduler {
    async fn open_session(&self) -> Result<Box<dyn SchedulerSession>> {
        Ok(Box::new(LocalSession {
            id: generate_session_id(),
            slots: Arc::new(Semaphore::new(self.max_parallel)),
            job_timeout: self.job_timeout,
            running: HashMap::new(),
        }))
    }

    fn name(&self) -> &str {
        "local"
    }
}

struct LocalSession {
    id: String,
    slots: Arc<Semaphore>,
    job_timeout: Option<Duration>,
    running: HashMap<String, JoinHandle<JobOutcome>>,
}

#[async_trait]
impl SchedulerSession for LocalSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(&mut self, jobs: &[JobSpec]) -> Result<Vec<JobHandle>> {
        let mut handles = Vec::with_capacity(jobs.len());
        for (index, spec) in jobs.iter().enumerate() {
            let handle = JobHandle {
                id: generate_handle_id(&self.id, &spec.name),
                name: spec.name.clone(),
                index,
            };
            if self.running.contains_key(&handle.id) {
                return Err(SweeprError::Scheduler(format!("duplicate job name {}", spec.name)));
            }
            let task = tokio::spawn(run_job(spec.clone(), self.slots.clone(), self.job_timeout));
            self.running.insert(handle.id.clone(), task);
            handles.push(handle);
        }
        Ok(handles)
    }

    async fn wait_all(&mut self, handles: &[JobHandle]) -> Result<Vec<Completion>> {
        let mut tasks = Vec::with_capacity(handles.len());
        for handle in handles {
            let task = self
                .running
                .remove(&handle.id)
                .ok_or_else(|| SweeprError::Scheduler(format!("unknown handle {}", handle.id)))?;
            tasks.push(task);
        }

        let results = futures::future::join_all(tasks).await;
        Ok(handles
            .iter()
            .zip(results)
            .map(|(handle, joined)| {
                let outcome = joined.unwrap_or_else(|e| JobOutcome::Failed(format!("job task aborted: {}", e)));
                Completion::new(handle.clone(), outcome)
            })
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        // Jobs submitted but never waited on do not outlive the session.
        for (id, task) in self.running.drain() {
            tracing::warn!(session = %self.id, job = %id, "Aborting job still running at session close");
            task.abort();
        }
        self.slots.close();
        Ok(())
    }
}

/// Argument vector for a spec: the executable is prepended unless it is already the program.
fn argv(spec: &JobSpec) -> Vec<String> {
    match spec.args.first() {
        Some(program) if *program == spec.executable => spec.args.clone(),
        _ => std::iter::once(spec.executable.clone())
            .chain(spec.args.iter().cloned())
            .collect(),
    }
}

/// `<stdout_path>.err`
fn stderr_path(stdout_path: &Path) -> PathBuf {
    let mut path = stdout_path.as_os_str().to_owned();
    path.push(".err");
    PathBuf::from(path)
}

async fn run_job(spec: JobSpec, slots: Arc<Semaphore>, timeout: Option<Duration>) -> JobOutcome {
    let _permit = match slots.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return JobOutcome::Failed("session closed before job started".into()),
    };

    let argv = argv(&spec);
    let stdout = match File::create(&spec.stdout_path) {
        Ok(f) => f,
        Err(e) => {
            return JobOutcome::Failed(format!("cannot create {}: {}", spec.stdout_path.display(), e));
        }
    };
    let stderr_path = stderr_path(&spec.stdout_path);
    let stderr = match File::create(&stderr_path) {
        Ok(f) => f,
        Err(e) => return JobOutcome::Failed(format!("cannot create {}: {}", stderr_path.display(), e)),
    };

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..])
        .current_dir(&spec.working_dir)
        .envs(spec.environment())
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return JobOutcome::Failed(format!("failed to spawn {}: {}", argv[0], e)),
    };
    tracing::debug!(job = %spec.name, pid = ?child.id(), "Job started");

    let status = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(job = %spec.name, error = %e, "Failed to kill timed out job");
                }
                tracing::warn!(job = %spec.name, timeout_ms = limit.as_millis() as u64, "Job timed out");
                return JobOutcome::TimedOut;
            }
        },
        None => child.wait().await,
    };

    match status {
        Ok(status) if status.success() => JobOutcome::Succeeded,
        Ok(status) => match status.code() {
            Some(code) => JobOutcome::Failed(format!("exit code {}", code)),
            None => JobOutcome::Failed("terminated by signal".into()),
        },
        Err(e) => JobOutcome::Failed(format!("wait failed: {}", e)),
    }
}
