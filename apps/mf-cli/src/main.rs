use clap::{Parser, Subcommand};
use mf_config::{CaseDef, ConfigResult};
use mf_core::timing::{self, step_timing};
use mf_sim::{CellSample, SimProgress, run_sim_with_progress};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "mf-cli")]
#[command(about = "multiflow CLI - compressible multiphase shock tube runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate case file syntax and build the model
    Validate {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Run a case to its final time
    Run {
        /// Path to the case YAML file
        case_path: PathBuf,
        /// Output CSV file for the final profile (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the case's step limit
        #[arg(long)]
        max_steps: Option<usize>,
        /// Print per-stage timings at the end
        #[arg(long)]
        timing: bool,
    },
}

fn main() -> ConfigResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Run {
            case_path,
            output,
            max_steps,
            timing,
        } => cmd_run(&case_path, output.as_deref(), max_steps, timing),
    }
}

fn cmd_validate(case_path: &Path) -> ConfigResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = mf_config::load_yaml(case_path)?;
    let model = case.into_model()?;
    let mesh = case.into_mesh(&model)?;
    println!("✓ Case is valid");
    println!(
        "  {} model, {} phase(s), {} transport(s), {} cells",
        model.closure(),
        model.n_phases(),
        model.n_transports(),
        mesh.n_cells()
    );
    Ok(())
}

fn cmd_run(case_path: &Path, output: Option<&Path>, max_steps: Option<usize>, timing: bool) -> ConfigResult<()> {
    let case = mf_config::load_yaml(case_path)?;
    println!("Running case: {}", case.name);
    if timing {
        timing::enable_timing();
        step_timing::reset_all();
    }

    let (stepper, mut mesh) = case.prepare()?;
    let mut opts = case.sim_options();
    if let Some(max_steps) = max_steps {
        opts.max_steps = max_steps;
    }

    let started = Instant::now();
    let mut last_emit = Instant::now();
    let record = run_sim_with_progress(&stepper, &mut mesh, &opts, |p| {
        if last_emit.elapsed().as_millis() >= 100 {
            render_progress(&p);
            last_emit = Instant::now();
        }
    })?;
    clear_progress_line();

    let t = record.t.last().copied().unwrap_or(0.0);
    println!("✓ Simulation completed: t = {t:.6e} s in {} steps", record.steps);
    info!(elapsed_s = started.elapsed().as_secs_f64(), "run finished");
    if timing {
        for line in step_timing::summary() {
            println!("  {line}");
        }
    }

    let csv = profile_csv(&case, record.snapshots.last().map(Vec::as_slice).unwrap_or(&[]));
    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Profile written to {}", path.display());
    } else {
        print!("{csv}");
    }
    Ok(())
}

fn profile_csv(case: &CaseDef, cells: &[CellSample]) -> String {
    let mut csv = String::from("x_m,density,pressure,velocity,temperature");
    for phase in &case.phases {
        let _ = write!(csv, ",alpha_{}", phase.name);
    }
    for i in 0..case.transports {
        let _ = write!(csv, ",transport_{i}");
    }
    csv.push('\n');
    for c in cells {
        let _ = write!(
            csv,
            "{},{},{},{},{}",
            c.position.x, c.density, c.pressure, c.velocity.x, c.temperature
        );
        for a in c.alphas.iter().chain(&c.transports) {
            let _ = write!(csv, ",{a}");
        }
        csv.push('\n');
    }
    csv
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(p: &SimProgress) {
    let fraction = if p.t_end > 0.0 { (p.t / p.t_end).min(1.0) } else { 1.0 };
    let width = 28usize;
    let filled = ((fraction * width as f64).round() as usize).min(width);
    print!(
        "\r[{}{}] {:>6.2}%  t={:.3e}/{:.3e}s  dt={:.2e}s  step={}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        fraction * 100.0,
        p.t,
        p.t_end,
        p.dt,
        p.step
    );
    let _ = io::stdout().flush();
}
