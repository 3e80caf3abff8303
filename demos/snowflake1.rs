/// Canonical-air snowflake on a 320x320x256 grid, stopped at tick 45000 and
/// exported to snowflake1.stl. Pass `--small` for a quick 64x64x64 run.
use colored::Colorize;
use snowfake_rust::measurement::{CallbackMeasurement, Control, ProgressReporter};
use snowfake_rust::medium::Medium;
use snowfake_rust::params::SimulationParameters;
use snowfake_rust::seed_crystal::SeedCrystal;
use snowfake_rust::sim::Simulation;
use std::io::Write;

struct MeasurementData {
    stop_time: u64,
    output: &'static str,
}

fn main() -> snowfake_rust::Result<()> {
    env_logger::init();
    let small = std::env::args().any(|arg| arg == "--small");

    let medium = Medium::default()
        .with_rho(0.1)
        .with_phi(0.0)
        .with_kappa(0.1)
        .with_mu(0.001)
        .with_beta_ab(0, 1, 2.5)
        .with_beta_ab(1, 0, 2.0)
        .with_beta_ab(1, 1, 2.0)
        .with_beta_ab(2, 0, 2.0)
        .with_beta_ab(2, 1, 1.0)
        .with_beta_ab(3, 0, 1.0)
        .with_beta_ab(3, 1, 1.0);
    let seed = SeedCrystal::new(2, 1);
    let (x, y, z) = if small { (64, 64, 64) } else { (320, 320, 256) };
    let params = SimulationParameters::new(medium, seed, x, y, z);

    let data = MeasurementData {
        stop_time: if small { 2_000 } else { 45_000 },
        output: "snowflake1.stl",
    };

    let mut sim = Simulation::new();
    sim.measurement(ProgressReporter::handle(1_000))?;
    sim.measurement(CallbackMeasurement::handle("snowflake1", data, |state, time, data| {
        if state.time() % 100 == 0 {
            print!("{}... ", time as u64);
            std::io::stdout().flush().ok();
        }
        if time >= data.stop_time as f64 {
            println!();
            match state.export_stl(data.output) {
                Ok(()) => println!("{} wrote {}", "✅".green(), data.output.bold()),
                Err(err) => eprintln!("{} export failed: {}", "❌".red(), err),
            }
            return Control::Stop;
        }
        Control::Continue
    }))?;

    println!("{} growing snowflake1 on {}x{}x{}", "❄".cyan(), x, y, z);
    let summary = sim.run(params)?;
    println!(
        "stopped at tick {} with {} ice cells ({} seed) in {:.1}s",
        summary.ticks,
        summary.occupied_cells,
        summary.seed_cells,
        summary.elapsed.as_secs_f64()
    );
    sim.print_timing_report();
    Ok(())
}
