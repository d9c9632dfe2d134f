mod artifact;
mod logging;
mod network;

use clap::{Parser, Subcommand, ValueEnum};
use fba_core::{BoundSource, MichaelisMentenUptake, ObjectiveStyle, UptakeKinetics};
use fba_highs::HighsBackend;
use fba_microlp::MicrolpBackend;
use fba_scheduler::{CellPool, CellReport, CellTask, SchedulerConfig};
use fba_solver::{LpBackend, SolveMethod, SolverConfig, SolverRuntime};
use fba_tools::MemoryProbe;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use artifact::{BenchRecord, SCHEMA_VERSION};
use network::UPTAKE_REACTION;

#[derive(Parser, Debug)]
#[command(author, version, about = "FBA engine benchmark runner and reporting interface")]
struct Cli {
    /// Log filter, overriding FBA_TRACE
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulated grid of cells and save JSONL artifacts
    Run(RunArgs),
    /// Render benchmark artifact summaries
    Report(ReportArgs),
    /// Compare two benchmark artifacts and optionally enforce thresholds
    Compare(CompareArgs),
    /// Print the compiled-in solver backends
    Info,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// LP backend
    #[arg(long, value_enum, default_value = "highs")]
    backend: Backend,

    /// Numerical method requested from the backend
    #[arg(long, value_enum, default_value = "simplex")]
    method: Method,

    /// Objective style, e.g. MAX_OBJECTIVE_MIN_TOTAL
    #[arg(long, default_value = "MAXIMIZE_OBJECTIVE_FLUX")]
    style: ObjectiveStyle,

    /// Number of grid cells
    #[arg(long, default_value_t = 256)]
    cells: usize,

    /// Number of distinct models living in every cell
    #[arg(long, default_value_t = 4)]
    models: usize,

    /// Internal metabolites along each pathway
    #[arg(long, default_value_t = 20)]
    metabolites: usize,

    /// Upper limit on random shortcut reactions per model
    #[arg(long, default_value_t = 10)]
    bypasses: usize,

    /// Worker threads (defaults to the CPU count)
    #[arg(long)]
    workers: Option<usize>,

    /// Simulation steps
    #[arg(long, default_value_t = 5)]
    steps: u32,

    /// Fraction of the uptake flux removed from the medium per step
    #[arg(long, default_value_t = 0.1)]
    time_step: f64,

    /// Seed for model generation, initial media and dispatch order
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSONL output artifact path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Input JSONL benchmark artifact
    #[arg(long)]
    input: PathBuf,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct CompareArgs {
    /// Baseline JSONL benchmark artifact
    #[arg(long)]
    baseline: PathBuf,

    /// Candidate JSONL benchmark artifact
    #[arg(long)]
    candidate: PathBuf,

    /// Stage filter for comparison (for example, total)
    #[arg(long, default_value = "total")]
    stage: String,

    /// Fail if duration regression exceeds this percentage
    #[arg(long)]
    duration_threshold_pct: Option<f64>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum Backend {
    Highs,
    Microlp,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum Method {
    Simplex,
    Interior,
}

impl From<Method> for SolveMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Simplex => SolveMethod::Simplex,
            Method::Interior => SolveMethod::Interior,
        }
    }
}

/// Labels shared by every record of one run.
struct RunContext<'a> {
    run_id: &'a str,
    backend: &'static str,
    method: &'static str,
    style: ObjectiveStyle,
    cells: usize,
    models: usize,
    workers: usize,
}

impl RunContext<'_> {
    fn record(&self, stage: &str, step: Option<u32>, duration_ms: f64) -> BenchRecord {
        BenchRecord {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id.to_string(),
            backend: self.backend.to_string(),
            method: self.method.to_string(),
            style: self.style.as_str().to_string(),
            cells: self.cells,
            models: self.models,
            workers: self.workers,
            stage: stage.to_string(),
            step,
            duration_ms,
            solves: 0,
            failures: 0,
            mean_objective: None,
            rss_after_bytes: None,
            rss_delta_bytes: None,
            peak_rss_bytes: None,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.log.as_deref())?;
    match cli.command {
        Command::Run(args) => run_command(args),
        Command::Report(args) => report_command(args),
        Command::Compare(args) => compare_command(args),
        Command::Info => {
            println!("{}", serde_json::to_string_pretty(&logging::solver_info())?);
            Ok(())
        }
    }
}

fn run_command(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.cells == 0 || args.models == 0 {
        return Err(boxed_input_error("cells and models must be greater than zero"));
    }
    if args.metabolites < 2 {
        return Err(boxed_input_error("metabolites must be at least 2"));
    }
    if !(args.time_step > 0.0 && args.time_step <= 1.0) {
        return Err(boxed_input_error("time-step must be in (0, 1]"));
    }

    let run_id = build_run_id()?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("artifacts/bench/{}.jsonl", run_id.as_str())));

    let records = match args.backend {
        Backend::Highs => execute::<HighsBackend>(&args, &run_id)?,
        Backend::Microlp => execute::<MicrolpBackend>(&args, &run_id)?,
    };

    artifact::write_jsonl(&output_path, &records)?;
    render_records(args.format, &records)?;
    println!("artifact: {}", output_path.display());

    Ok(())
}

fn report_command(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let records: Vec<BenchRecord> = artifact::read_jsonl(&args.input)?;
    render_records(args.format, &records)?;
    Ok(())
}

fn compare_command(args: CompareArgs) -> Result<(), Box<dyn std::error::Error>> {
    let baseline: Vec<BenchRecord> = artifact::read_jsonl(&args.baseline)?;
    let candidate: Vec<BenchRecord> = artifact::read_jsonl(&args.candidate)?;
    let rows = artifact::compare(
        &artifact::summarize(&baseline),
        &artifact::summarize(&candidate),
        &args.stage,
    );

    if rows.is_empty() {
        return Err(boxed_input_error(
            "no overlapping backend/style/stage rows to compare",
        ));
    }

    render(args.format, &rows, artifact::print_compare_table)?;
    if artifact::regressed(&rows, args.duration_threshold_pct) {
        return Err(boxed_input_error(
            "regression threshold violated (see compare output)",
        ));
    }

    Ok(())
}

/// Run the whole simulation on backend `B` and collect one record per stage.
fn execute<B: LpBackend + 'static>(
    args: &RunArgs,
    run_id: &str,
) -> Result<Vec<BenchRecord>, Box<dyn std::error::Error>> {
    let total_started = Instant::now();
    let mut probe = MemoryProbe::new();
    let mut rng = ChaCha12Rng::seed_from_u64(args.seed);
    let solver_config = SolverConfig::new().with_method(args.method.into());

    let runtime = SolverRuntime::<B>::init(solver_config.clone())?;

    let started = Instant::now();
    let models = network::build_models::<B>(
        args.models,
        args.metabolites,
        args.bypasses,
        &solver_config,
        &mut rng,
    )?;
    let build_ms = elapsed_ms(started);

    let source: Arc<dyn BoundSource> = Arc::new(MichaelisMentenUptake::new().with_reaction(
        UPTAKE_REACTION,
        UptakeKinetics {
            metabolite: 0,
            km: 0.5,
            vmax: 10.0,
        },
    ));
    let mut scheduler = SchedulerConfig::new()
        .with_style(args.style)
        .with_seed(args.seed);
    if let Some(workers) = args.workers {
        scheduler = scheduler.with_workers(workers);
    }

    let started = Instant::now();
    let mut pool = CellPool::start(&runtime, &models, source, scheduler)?;
    let start_ms = elapsed_ms(started);

    let context = RunContext {
        run_id,
        backend: B::name(),
        method: args.method_name(),
        style: args.style,
        cells: args.cells,
        models: args.models,
        workers: pool.num_workers(),
    };
    let mut records = Vec::new();

    let mut record = context.record("build", None, build_ms);
    sample_memory(&mut probe, &mut record);
    records.push(record);
    let mut record = context.record("start", None, start_ms);
    sample_memory(&mut probe, &mut record);
    records.push(record);

    let residents: Vec<usize> = (0..args.models).collect();
    let mut media: Vec<f64> = (0..args.cells).map(|_| rng.gen_range(0.0..10.0)).collect();
    let mut total_solves = 0;
    let mut total_failures = 0;

    for step in 0..args.steps {
        let time = f64::from(step) * args.time_step;
        let tasks: Vec<CellTask> = media
            .iter()
            .enumerate()
            .map(|(cell, &concentration)| {
                CellTask::new(cell, vec![concentration], residents.clone()).with_time(time)
            })
            .collect();

        let started = Instant::now();
        let reports = pool.run_step(tasks)?;
        let step_ms = elapsed_ms(started);

        let stats = StepStats::collect(&reports);
        deplete_media(&mut media, &reports, args.time_step);
        total_solves += stats.solves;
        total_failures += stats.failures;

        info!(
            component = "bench",
            operation = "step",
            status = "success",
            step,
            duration_ms = step_ms,
            solves = stats.solves,
            failures = stats.failures,
            "Finished simulation step"
        );

        let mut record = context.record(&format!("step-{step}"), Some(step), step_ms);
        record.solves = stats.solves;
        record.failures = stats.failures;
        record.mean_objective = stats.mean_objective();
        sample_memory(&mut probe, &mut record);
        records.push(record);
    }

    let summary = pool.finish()?;
    runtime.teardown();

    let faults: usize = summary.workers.iter().map(|worker| worker.faults).sum();
    if faults > 0 {
        warn!(
            component = "bench",
            operation = "finish",
            status = "degraded",
            faults,
            "Some solves ended with an error"
        );
    }

    let mut record = context.record("total", None, elapsed_ms(total_started));
    record.solves = total_solves;
    record.failures = total_failures;
    sample_memory(&mut probe, &mut record);
    record.peak_rss_bytes = probe.peak_rss();
    records.push(record);

    Ok(records)
}

impl RunArgs {
    fn method_name(&self) -> &'static str {
        SolveMethod::from(self.method).as_str()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct StepStats {
    solves: usize,
    failures: usize,
    objective_sum: f64,
}

impl StepStats {
    fn collect(reports: &[CellReport]) -> Self {
        let mut stats = StepStats::default();
        for outcome in reports.iter().flat_map(|report| &report.outcomes) {
            stats.solves += 1;
            if outcome.result.success {
                stats.objective_sum += outcome.result.objective_value;
            } else {
                stats.failures += 1;
            }
        }
        stats
    }

    fn mean_objective(&self) -> Option<f64> {
        let succeeded = self.solves - self.failures;
        if succeeded == 0 {
            None
        } else {
            Some(self.objective_sum / succeeded as f64)
        }
    }
}

/// Remove what the residents of each cell took up.
///
/// Uptake is negative flux on the uptake exchange; failed solves take nothing.
fn deplete_media(media: &mut [f64], reports: &[CellReport], time_step: f64) {
    for report in reports {
        let Some(concentration) = media.get_mut(report.cell) else {
            continue;
        };
        let uptake: f64 = report
            .outcomes
            .iter()
            .filter(|outcome| outcome.result.success)
            .filter_map(|outcome| outcome.result.flux(UPTAKE_REACTION))
            .map(|flux| (-flux).max(0.0))
            .sum();
        *concentration = (*concentration - uptake * time_step).max(0.0);
    }
}

fn sample_memory(probe: &mut MemoryProbe, record: &mut BenchRecord) {
    match probe.record(&record.stage) {
        Ok(()) => {
            record.rss_after_bytes = probe.snapshots().last().map(|s| s.rss_bytes);
            record.rss_delta_bytes = probe.last_diff();
        }
        Err(err) => {
            warn!(
                component = "bench",
                operation = "memory_snapshot",
                status = "error",
                stage = record.stage.as_str(),
                error = %err,
                "Skipping memory sample"
            );
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Print rows in the requested format; `table` handles the human view.
fn render<T: Serialize>(
    format: OutputFormat,
    rows: &[T],
    table: impl FnOnce(&[T]),
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => table(rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Ndjson => {
            for row in rows {
                println!("{}", serde_json::to_string(row)?);
            }
        }
    }
    Ok(())
}

fn render_records(
    format: OutputFormat,
    records: &[BenchRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    render(format, records, |records| {
        artifact::print_summary_table(&artifact::summarize(records))
    })
}

fn build_run_id() -> Result<String, Box<dyn std::error::Error>> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| std::io::Error::other(err.to_string()))?
        .as_millis();
    Ok(format!("bench_{}", millis))
}

fn boxed_input_error(message: &str) -> Box<dyn std::error::Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}
