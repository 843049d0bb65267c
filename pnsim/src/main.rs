use pnsim::{bench_forces, bench_rk45_tolerances, run_viewer};
use pnsim::{Scenario, ScenarioConfig, SimState, G};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Post-Newtonian two-body simulator")]
struct Args {
    /// Scenario file, looked up under scenarios/ unless it is an existing path
    #[arg(short, long, default_value = "sun_earth.yaml")]
    file: String,

    /// Integrate this many years without a window and print a summary
    #[arg(long)]
    headless: Option<f64>,

    /// Run the benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

fn scenario_path(file: &str) -> PathBuf {
    let direct = PathBuf::from(file);
    if direct.exists() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file)
}

// load here to keep main clean
fn load_scenario(file: &str) -> Result<Scenario> {
    let path = scenario_path(file);
    let cfg = ScenarioConfig::from_yaml_file(&path).with_context(|| format!("failed to load scenario {}", path.display()))?;
    let scenario = Scenario::build_scenario(cfg).with_context(|| format!("invalid scenario {}", path.display()))?;
    Ok(scenario)
}

fn print_summary(label: &str, s: &SimState) {
    println!(
        "{label:>6}: t = {:.6} yr  r = {:.9} AU  E = {:.9e}  |L| = {:.9e}",
        s.physics_time,
        (s.pos2() - s.pos1()).norm(),
        s.orbital_energy(G),
        s.angular_momentum().norm()
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.bench {
        bench_forces()?;
        bench_rk45_tolerances()?;
        return Ok(());
    }

    let scenario = load_scenario(&args.file)?;
    let headless = args.headless.or(scenario.headless_years);
    let mut engine = scenario.build_engine()?;
    let buffers = engine.buffers();

    if let Some(years) = headless {
        info!(years, "running headless");
        let start = buffers.read_back_buffer();
        let stats = engine.run_for(years).context("integration failed")?;
        let end = buffers.read_back_buffer();

        print_summary("start", &start);
        print_summary("end", &end);
        println!(
            "ticks {}  attempts {}  accepted {}  rejected {}  mean step {:.3e} yr",
            stats.ticks, stats.attempts, stats.accepted, stats.rejected, stats.last_mean_step
        );
        return Ok(());
    }

    let controller = engine.controller();
    let physics = engine.spawn()?;
    run_viewer(buffers, controller.clone());

    controller.request_shutdown();
    let stats = physics.join().map_err(|_| anyhow::anyhow!("physics thread panicked"))?;
    info!(
        ticks = stats.ticks,
        accept_ratio = stats.accept_ratio(),
        "session finished"
    );

    Ok(())
}
