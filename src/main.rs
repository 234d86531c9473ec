use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sweepr::collector::ResultCollector;
use sweepr::config::{ExperimentConfig, GlobalConfig, load_config};
use sweepr::domain::{DataPoint, ResultDataset};
use sweepr::jobs::build_specs;
use sweepr::journal::StepJournal;
use sweepr::runner::{CommandGenerator, FixedPoints, LoopState, OrchestrationLoop, PointGenerator, RunSummary};
use sweepr::scheduler::LocalScheduler;

mod cli;

use cli::Cli;
use cli::commands::Commands;

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sweepr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("sweepr.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Points from an inline JSON array or a file containing one.
fn parse_points(arg: &str) -> Result<Vec<DataPoint>> {
    let path = Path::new(arg);
    let json = if path.is_file() {
        fs::read_to_string(path).context(format!("Failed to read points from {}", path.display()))?
    } else {
        arg.to_string()
    };
    let points: Vec<DataPoint> = serde_json::from_str(&json).context("Points must be a JSON array of number arrays")?;
    if points.is_empty() {
        eyre::bail!("At least one point is required");
    }
    Ok(points)
}

fn load_experiment(path: &Path) -> Result<Arc<ExperimentConfig>> {
    let config = ExperimentConfig::load_from_file(path).context(format!("Failed to load experiment {}", path.display()))?;
    Ok(Arc::new(config))
}

async fn run_application(cli: &Cli, config: &GlobalConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            experiment,
            points,
            generator,
            max_steps,
            resume,
        } => {
            let experiment = load_experiment(experiment)?;
            let points = parse_points(points)?;
            let max_steps = max_steps.or(config.run.max_steps);
            match generator {
                Some(command) => {
                    let generator = Arc::new(CommandGenerator::new(command));
                    handle_run_command(experiment, points, generator, max_steps, *resume, config).await
                }
                None => {
                    let generator = Arc::new(FixedPoints::terminate());
                    handle_run_command(experiment, points, generator, max_steps, *resume, config).await
                }
            }
        }
        Commands::Plan {
            experiment,
            points,
            step,
        } => {
            let experiment = load_experiment(experiment)?;
            handle_plan_command(&experiment, &parse_points(points)?, *step)
        }
        Commands::Collect { dir, extension } => handle_collect_command(dir, extension),
    }
}

async fn handle_run_command<G: PointGenerator>(
    experiment: Arc<ExperimentConfig>,
    points: Vec<DataPoint>,
    generator: Arc<G>,
    max_steps: Option<u32>,
    resume: bool,
    config: &GlobalConfig,
) -> Result<()> {
    info!("Running experiment {} with {} initial points", experiment.name, points.len());
    let scheduler = Arc::new(LocalScheduler::from_config(&config.scheduler));
    let mut sweep = OrchestrationLoop::new(experiment.clone(), scheduler, generator, points);

    if config.run.journal || resume {
        sweep = sweep.with_journal(StepJournal::open(&experiment)?);
    }
    if resume && sweep.resume()? {
        println!("{} step {}", "Resuming:".green(), sweep.step());
    }
    if sweep.state() == LoopState::Terminated {
        println!("{}", "Experiment already terminated; nothing to run".yellow());
        return Ok(());
    }

    println!(
        "{} {} ({} points, {})",
        "Running:".green(),
        experiment.name,
        sweep.points().len(),
        experiment.output_root().display()
    );
    let summary = sweep.run_to_completion(max_steps).await.context("Sweep failed")?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for batch in &summary.batches {
        let line = format!(
            "  {} succeeded, {} failed, {} timed out",
            batch.succeeded(),
            batch.failed(),
            batch.timed_out()
        );
        if batch.all_succeeded() {
            println!("{}", line);
        } else {
            println!("{}", line.yellow());
        }
    }
    if summary.terminated() {
        println!("{} after {} step(s), final step {}", "Terminated".green(), summary.steps_run, summary.final_step);
    } else {
        println!(
            "{} after {} step(s); next step {} has {} point(s)",
            "Stopped".yellow(),
            summary.steps_run,
            summary.final_step,
            summary.points.len()
        );
    }
}

fn handle_plan_command(experiment: &ExperimentConfig, points: &[DataPoint], step: u32) -> Result<()> {
    info!("Planning step {} of {}", step, experiment.name);
    let specs = build_specs(experiment, step, points)?;
    println!("{} step {} ({} jobs)", "Planned:".green(), step, specs.len());
    for spec in &specs {
        println!("  {} [{}]", spec.name.cyan(), spec.point);
        println!("    cwd:    {}", spec.working_dir.display());
        println!("    stdout: {}", spec.stdout_path.display());
        println!("    argv:   {} {}", spec.executable, spec.args.join(" "));
    }
    Ok(())
}

fn handle_collect_command(dir: &Path, extension: &str) -> Result<()> {
    info!("Collecting *.{} from {}", extension, dir.display());
    let dataset = ResultCollector::default().collect(dir, extension)?;
    print_dataset(&dataset);
    Ok(())
}

fn print_dataset(dataset: &ResultDataset) {
    if dataset.is_empty() {
        println!("{}", "No result files found".yellow());
        return;
    }
    for entry in dataset.iter() {
        match &entry.rows {
            Ok(rows) => println!(
                "{} {} ({} rows: {})",
                "ok".green(),
                entry.path.display(),
                rows.len(),
                rows.headers.join(", ")
            ),
            Err(e) => println!("{} {}: {}", "error".red(), entry.path.display(), e.message),
        }
    }
    println!("{} file(s), {} parse failure(s)", dataset.len(), dataset.error_count());
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_points_inline_and_file() {
        let points = parse_points("[[1, 2], [3, 4]]").unwrap();
        assert_eq!(points, vec![DataPoint::new(vec![1.0, 2.0]), DataPoint::new(vec![3.0, 4.0])]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("points.json");
        fs::write(&path, "[[0.5]]").unwrap();
        assert_eq!(parse_points(path.to_str().unwrap()).unwrap(), vec![DataPoint::new(vec![0.5])]);

        assert!(parse_points("[]").is_err());
    }

    #[test]
    fn test_plan_prepares_job_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exp.yml");
        fs::write(
            &path,
            "name: job\nprogram-name: python3\narguments:\n  --x: 1\nsource-dir: .\noutput-dir: runs\n",
        )
        .unwrap();

        let experiment = load_experiment(&path).unwrap();
        handle_plan_command(&experiment, &parse_points("[[1], [2]]").unwrap(), 0).unwrap();

        assert!(dir.path().join("runs/step0/job0").is_dir());
        assert!(dir.path().join("runs/step0/job1").is_dir());
    }
}
