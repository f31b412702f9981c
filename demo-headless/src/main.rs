use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use water_sim_core::{Dispatch, FlowParams, GridPos, Model, SimulationConfig, WaterSimulation};

/// Starting layouts for the water
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layout {
    /// Left half full, wall down the middle with a gap at the bottom
    DamBreak,
    /// Every cell full
    Full,
    /// Top half full, resting on a floor with a hole in the middle
    Drain,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    Falling,
    Pressure,
    PressureVelocity,
}

impl From<ModelArg> for Model {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Falling => Model::Falling,
            ModelArg::Pressure => Model::Pressure,
            ModelArg::PressureVelocity => Model::PressureVelocity,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DispatchArg {
    WorkerPool,
    ForkJoin,
}

impl From<DispatchArg> for Dispatch {
    fn from(arg: DispatchArg) -> Self {
        match arg {
            DispatchArg::WorkerPool => Dispatch::WorkerPool,
            DispatchArg::ForkJoin => Dispatch::ForkJoin,
        }
    }
}

/// Headless water simulation runner
#[derive(Parser, Debug)]
#[command(name = "water-sim-demo")]
#[command(about = "Cellular water simulation without a window", long_about = None)]
struct Args {
    /// Starting layout
    #[arg(short, long, value_enum, default_value_t = Layout::DamBreak)]
    layout: Layout,

    /// Grid width in cells
    #[arg(long, default_value_t = 100)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 100)]
    height: usize,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1000)]
    steps: u64,

    /// Water model
    #[arg(short, long, value_enum, default_value_t = ModelArg::PressureVelocity)]
    model: ModelArg,

    /// How band work reaches threads
    #[arg(short, long, value_enum, default_value_t = DispatchArg::WorkerPool)]
    dispatch: DispatchArg,

    /// Worker threads (defaults to the hardware concurrency)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Random seed
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// JSON file with flow parameters; missing fields keep their defaults
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Report interval in ticks
    #[arg(short, long, default_value_t = 100)]
    report_interval: u64,
}

fn load_params(path: Option<&Path>) -> Result<FlowParams, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(FlowParams::default());
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let params = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
    info!("Loaded flow parameters from {}", path.display());
    Ok(params)
}

fn paint(sim: &mut WaterSimulation, layout: Layout) {
    let size = sim.size();
    let (width, height) = (size.width as i32, size.height as i32);

    for x in 0..width {
        for y in 0..height {
            let pos = GridPos::new(x, y);
            match layout {
                Layout::Full => sim.set_water(pos, true),
                Layout::DamBreak => {
                    if x < width / 2 {
                        sim.set_water(pos, true);
                    } else if x == width / 2 && y > 3 {
                        sim.set_boundary(pos, true);
                    }
                }
                Layout::Drain => {
                    if y > height / 2 {
                        sim.set_water(pos, true);
                    } else if y == height / 2 && (x < width / 2 - 2 || x > width / 2 + 2) {
                        sim.set_boundary(pos, true);
                    }
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    println!("=== Water Simulation Demo ===\n");

    let config = SimulationConfig {
        model: args.model.into(),
        dispatch: args.dispatch.into(),
        threads: args.threads,
        seed: args.seed,
        params: load_params(args.params.as_deref())?,
    };
    let mut sim = WaterSimulation::with_config(args.width, args.height, config)?;
    paint(&mut sim, args.layout);

    let initial = sim.total_pressure();
    println!(
        "{}x{} grid, {:?} layout, {} worker(s), initial mass {initial:.2}\n",
        args.width,
        args.height,
        args.layout,
        sim.worker_count(),
    );
    println!("   Tick |      Mass | Drift      | Last(ms) | Avg(ms)");
    println!("--------|-----------|------------|----------|--------");

    let interval = args.report_interval.max(1);
    for tick in 1..=args.steps {
        sim.step();
        if tick % interval == 0 || tick == args.steps {
            let mass = sim.total_pressure();
            println!(
                "{tick:7} | {mass:9.3} | {:+10.2e} | {:8.3} | {:7.3}",
                mass - initial,
                sim.last_tick_ms(),
                sim.average_tick_ms()
            );
        }
    }

    let walls = sim.boundary_field().count_set();
    sim.shutdown();

    println!("\n=== Simulation Complete ===");
    println!("Ticks: {}", sim.tick_count());
    println!("Final mass: {:.3} (started at {initial:.3})", sim.total_pressure());
    println!("Boundary cells: {walls}");
    println!("Average tick: {:.3} ms", sim.average_tick_ms());

    Ok(())
}
