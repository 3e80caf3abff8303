/// Run a simulation described by a JSON file.
///
/// Usage: from_json <params.json> [stop_tick] [output.stl]
/// Without a stop tick the run relies on `tick_limit` from the file.
use colored::Colorize;
use snowfake_rust::measurement::{ProgressReporter, StopAtTick};
use snowfake_rust::params::SimulationParameters;
use snowfake_rust::sim::Simulation;

fn main() -> snowfake_rust::Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = args
        .first()
        .map(String::as_str)
        .unwrap_or("demos/configs/small_plate.json");

    let params = SimulationParameters::load_json(config)?;
    let mut sim = Simulation::new();
    sim.measurement(ProgressReporter::console_handle(250))?;

    if let Some(stop) = args.get(1) {
        let stop_time: u64 = stop.parse().map_err(|_| {
            snowfake_rust::SimError::validation(format!("stop tick '{}' is not a number", stop))
        })?;
        let mut stop_at = StopAtTick::new(stop_time);
        if let Some(output) = args.get(2) {
            stop_at = stop_at.with_export(output);
        }
        sim.measurement(stop_at.handle())?;
    }

    println!("{} running {}", "❄".cyan(), config.bold());
    let summary = sim.run(params)?;
    println!("stopped ({:?}) at tick {}", summary.stop_reason, summary.ticks);

    if args.get(1).is_none() {
        if let Some(state) = sim.state() {
            state.export_stl("from_json.stl")?;
        }
    }
    sim.print_timing_report();
    Ok(())
}
