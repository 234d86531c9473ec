//! Point generation.
//!
//! The loop only sees `PointGenerator::propose`: a dataset goes in, the next
//! batch of points (or a request to stop) comes out.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::{DataPoint, ResultDataset};
use crate::error::{Result, SweeprError};

/// What the generator wants to happen next.
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    /// Run another step with these points
    Points(Vec<DataPoint>),
    /// Stop the loop
    Terminate,
}

impl Proposal {
    /// Terminate, or a batch with nothing in it.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Points(points) => points.is_empty(),
            Self::Terminate => true,
        }
    }

    pub fn points(&self) -> Option<&[DataPoint]> {
        match self {
            Self::Points(points) => Some(points),
            Self::Terminate => None,
        }
    }
}

/// Proposes the next batch of points from a step's dataset.
#[async_trait]
pub trait PointGenerator: Send + Sync {
    async fn propose(&self, dataset: &ResultDataset) -> Result<Proposal>;
}

/// Replays a scripted sequence of batches, then terminates.
#[derive(Debug, Default)]
pub struct FixedPoints {
    batches: Mutex<VecDeque<Vec<DataPoint>>>,
    calls: AtomicUsize,
}

impl FixedPoints {
    pub fn new(batches: Vec<Vec<DataPoint>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Terminates on the first call.
    pub fn terminate() -> Self {
        Self::default()
    }

    /// Number of times `propose` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointGenerator for FixedPoints {
    async fn propose(&self, _dataset: &ResultDataset) -> Result<Proposal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .batches
            .lock()
            .map_err(|e| SweeprError::PointGeneration(e.to_string()))?
            .pop_front();
        Ok(next.map(Proposal::Points).unwrap_or(Proposal::Terminate))
    }
}

/// Runs an external optimizer once per step.
///
/// The dataset is written to the command's stdin as JSON; the command
/// prints a JSON array of points (arrays of numbers) on stdout. `[]` or
/// `null` ends the loop.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: String,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn execute(&self, input: Vec<u8>) -> std::io::Result<std::process::Output> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A generator that ignores its input may close stdin early.
                match stdin.write_all(&input).await {
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok::<(), std::io::Error>(())
        };
        let exchange = async move {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            fed?;
            output
        };

        // Dropping the exchange on timeout drops the child, which kills it.
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("generator timed out after {}ms", self.timeout.as_millis()),
            )),
        }
    }
}

/// Parse generator stdout: `null`/`[]` -> Terminate, `[[..], ..]` -> Points.
fn parse_proposal(stdout: &str) -> Result<Proposal> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(SweeprError::PointGeneration("generator printed nothing".into()));
    }
    let points: Option<Vec<DataPoint>> = serde_json::from_str(trimmed)
        .map_err(|e| SweeprError::PointGeneration(format!("invalid generator output: {}", e)))?;
    Ok(match points {
        Some(points) if !points.is_empty() => Proposal::Points(points),
        _ => Proposal::Terminate,
    })
}

#[async_trait]
impl PointGenerator for CommandGenerator {
    async fn propose(&self, dataset: &ResultDataset) -> Result<Proposal> {
        let input = serde_json::to_vec(&dataset.to_json())?;
        let output = self
            .execute(input)
            .await
            .map_err(|e| SweeprError::PointGeneration(format!("'{}': {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SweeprError::PointGeneration(format!(
                "'{}' exited with {:?}: {}",
                self.command,
                output.status.code(),
                stderr.trim()
            )));
        }

        let proposal = parse_proposal(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            command = %self.command,
            points = proposal.points().map_or(0, <[DataPoint]>::len),
            "Generator proposed"
        );
        Ok(proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetEntry, RowSet};
    use std::path::PathBuf;

    fn dataset() -> ResultDataset {
        ResultDataset::new(vec![DatasetEntry {
            path: PathBuf::from("out0.csv"),
            job_index: Some(0),
            rows: Ok(RowSet::new(vec!["loss".into()], vec![vec!["0.5".into()]])),
        }])
    }

    #[test]
    fn test_proposal_is_terminal() {
        assert!(Proposal::Terminate.is_terminal());
        assert!(Proposal::Points(vec![]).is_terminal());
        assert!(!Proposal::Points(vec![DataPoint::new(vec![1.0])]).is_terminal());
    }

    #[test]
    fn test_parse_proposal() {
        assert_eq!(
            parse_proposal("[[1, 2], [3.5, 4]]\n").unwrap(),
            Proposal::Points(vec![DataPoint::new(vec![1.0, 2.0]), DataPoint::new(vec![3.5, 4.0])])
        );
        assert_eq!(parse_proposal("[]").unwrap(), Proposal::Terminate);
        assert_eq!(parse_proposal("null").unwrap(), Proposal::Terminate);
        assert!(parse_proposal("").is_err());
        assert!(parse_proposal("{\"x\": 1}").is_err());
    }

    #[tokio::test]
    async fn test_fixed_points_then_terminate() {
        let generator = FixedPoints::new(vec![vec![DataPoint::new(vec![5.0, 5.0, 5.0])]]);
        let ds = ResultDataset::default();

        let first = generator.propose(&ds).await.unwrap();
        assert_eq!(first, Proposal::Points(vec![DataPoint::new(vec![5.0, 5.0, 5.0])]));
        assert_eq!(generator.propose(&ds).await.unwrap(), Proposal::Terminate);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_command_generator_reads_stdout() {
        let generator = CommandGenerator::new("cat > /dev/null; echo '[[1, 2]]'");
        let proposal = generator.propose(&dataset()).await.unwrap();
        assert_eq!(proposal, Proposal::Points(vec![DataPoint::new(vec![1.0, 2.0])]));
    }

    #[tokio::test]
    async fn test_command_generator_receives_dataset() {
        // Echo the job count back as a single one-dimensional point.
        let generator = CommandGenerator::new("n=$(grep -o 'job_index' | wc -l); echo \"[[$n]]\"");
        let proposal = generator.propose(&dataset()).await.unwrap();
        assert_eq!(proposal, Proposal::Points(vec![DataPoint::new(vec![1.0])]));
    }

    #[tokio::test]
    async fn test_command_generator_terminate() {
        let generator = CommandGenerator::new("echo '[]'");
        assert_eq!(generator.propose(&dataset()).await.unwrap(), Proposal::Terminate);
    }

    #[tokio::test]
    async fn test_command_generator_failure() {
        let generator = CommandGenerator::new("echo broken >&2; exit 4");
        let err = generator.propose(&dataset()).await.unwrap_err();
        assert!(matches!(err, SweeprError::PointGeneration(_)));
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_command_generator_timeout_with_undrained_stdin() {
        let rows = (0..20_000).map(|i| vec![format!("{}.123456789", i)]).collect();
        let large = ResultDataset::new(vec![DatasetEntry {
            path: PathBuf::from("big.csv"),
            job_index: Some(0),
            rows: Ok(RowSet::new(vec!["x".into()], rows)),
        }]);
        assert!(serde_json::to_vec(&large.to_json()).unwrap().len() > 128 * 1024);

        let generator = CommandGenerator::new("sleep 3; echo '[]'").with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = generator.propose(&large).await.unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_command_generator_timeout() {
        let generator = CommandGenerator::new("sleep 5").with_timeout(Duration::from_millis(100));
        let err = generator.propose(&dataset()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
