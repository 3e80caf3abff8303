/// Denser vapor with faster freezing at plate edges: 800x800x256 grid, stopped
/// at tick 20000 and exported to snowflake8.stl. Pass `--small` for 96x96x64.
use colored::Colorize;
use snowfake_rust::measurement::{ProgressReporter, StopAtTick};
use snowfake_rust::medium::Medium;
use snowfake_rust::params::SimulationParameters;
use snowfake_rust::seed_crystal::SeedCrystal;
use snowfake_rust::sim::Simulation;

fn main() -> snowfake_rust::Result<()> {
    env_logger::init();
    let small = std::env::args().any(|arg| arg == "--small");

    let medium = Medium::preset("snowflake8").unwrap_or_default();
    let (x, y, z) = if small { (96, 96, 64) } else { (800, 800, 256) };
    let stop_time = if small { 2_000 } else { 20_000 };
    let params = SimulationParameters::new(medium, SeedCrystal::new(2, 1), x, y, z);
    println!("{}", params.to_json_string()?);

    let mut sim = Simulation::new();
    sim.measurement(ProgressReporter::console_handle(500))?;
    sim.measurement(StopAtTick::new(stop_time).with_export("snowflake8.stl").handle())?;

    println!("{} growing snowflake8 on {}x{}x{}", "❄".cyan(), x, y, z);
    let summary = sim.run(params)?;
    println!(
        "{} stopped at tick {} with {} ice cells",
        "✅".green(),
        summary.ticks,
        summary.occupied_cells
    );
    sim.print_timing_report();
    Ok(())
}
