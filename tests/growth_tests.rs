// Growth behaviour observed through the driver: seeding, conservation,
// monotonic occupancy and determinism

use approx::assert_relative_eq;
use more_asserts::assert_gt;
use snowfake_rust::measurement::{CallbackMeasurement, Control, Measurement, MeasurementHandle};
use snowfake_rust::medium::Medium;
use snowfake_rust::params::{EdgePolicy, SimulationParameters};
use snowfake_rust::seed_crystal::SeedCrystal;
use snowfake_rust::sim::Simulation;
use std::cell::RefCell;
use std::rc::Rc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn growing_params() -> SimulationParameters {
    SimulationParameters::new(Medium::uniform(0.5, 0.1, 0.05, 1.0), SeedCrystal::new(2, 1), 24, 24, 12)
}

struct SeedCheck {
    seed: SeedCrystal,
    mismatches: Rc<RefCell<Option<usize>>>,
}

impl Measurement for SeedCheck {
    fn name(&self) -> &str {
        "seed_check"
    }

    fn init_sim(&mut self, sim: &mut Simulation) -> snowfake_rust::Result<()> {
        let state = sim.state().expect("field exists before the first tick");
        assert_eq!(state.time(), 0);
        let dims = state.dims();
        let (cx, cy, cz) = dims.centre();
        let mut mismatches = 0;
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let expected = self.seed.contains_offset(
                        x as i64 - cx as i64,
                        y as i64 - cy as i64,
                        z as i64 - cz as i64,
                    );
                    if state.occupancy(x, y, z)? != expected {
                        mismatches += 1;
                    }
                }
            }
        }
        *self.mismatches.borrow_mut() = Some(mismatches);
        Ok(())
    }
}

#[test]
fn test_seed_fidelity_at_tick_zero() {
    init_logging();
    println!("🌱 Testing seed placement before the first tick");

    for seed in [SeedCrystal::new(2, 1), SeedCrystal::new(3, 2), SeedCrystal::new(1, 3)] {
        let mismatches = Rc::new(RefCell::new(None));
        let mut sim = Simulation::new();
        sim.measurement(MeasurementHandle::new(Box::new(SeedCheck {
            seed,
            mismatches: mismatches.clone(),
        })))
        .unwrap();

        let mut params = growing_params().with_tick_limit(1);
        params.seed = seed;
        let summary = sim.run(params).unwrap();

        println!(
            "   radius {} thickness {}: {} seed cells",
            seed.radius, seed.thickness, summary.seed_cells
        );
        assert_eq!(*mismatches.borrow(), Some(0));
        assert_eq!(summary.seed_cells, seed.cell_count());
    }
    println!("   ✅ Exactly the seed cells are ice at tick 0");
}

/// Checks each tick's report against the change in total field mass.
struct Balance {
    previous: Option<f64>,
    counter: Rc<RefCell<usize>>,
}

impl Measurement for Balance {
    fn name(&self) -> &str {
        "balance"
    }

    fn init_sim(&mut self, sim: &mut Simulation) -> snowfake_rust::Result<()> {
        let state = sim.state().expect("field exists before the first tick");
        let seed_cells = state.occupied_count();
        let free_cells = state.dims().cell_count() - seed_cells;
        let expected = free_cells as f64 * state.params().medium.rho + seed_cells as f64;
        assert_relative_eq!(state.total_mass(), expected, max_relative = 1e-6);
        self.previous = Some(state.total_mass());
        Ok(())
    }

    fn measure(&mut self, sim: &mut Simulation) -> snowfake_rust::Result<()> {
        let report = sim.last_step_report().expect("a tick has run");
        let total = sim.state().expect("field exists").total_mass();
        if let Some(previous) = self.previous {
            let expected = previous - report.edge_outflow - report.discarded_mass;
            assert_relative_eq!(total, expected, max_relative = 1e-5);
        }
        self.previous = Some(total);
        *self.counter.borrow_mut() += 1;
        Ok(())
    }
}

#[test]
fn test_step_reports_balance_each_tick() {
    init_logging();
    println!("📒 Testing per-tick mass bookkeeping for every edge policy");

    for policy in [EdgePolicy::Reflective, EdgePolicy::Absorbing, EdgePolicy::Reservoir] {
        let checks = Rc::new(RefCell::new(0usize));
        let mut sim = Simulation::new();
        let counter = checks.clone();

        sim.measurement(MeasurementHandle::new(Box::new(Balance {
            previous: None,
            counter,
        })))
        .unwrap();
        sim.run(growing_params().with_edge_policy(policy).with_tick_limit(60)).unwrap();

        println!("   {:?}: {} ticks balanced", policy, checks.borrow());
        assert_eq!(*checks.borrow(), 60);
    }
    println!("   ✅ Mass after each tick = before - edge outflow - discarded");
}

#[test]
fn test_occupancy_is_monotonic_and_crystal_grows() {
    init_logging();
    println!("❄️ Testing that ice never melts while the crystal grows");

    let mut sim = Simulation::new();
    let violations = Rc::new(RefCell::new(0usize));
    let seen = violations.clone();

    sim.measurement(CallbackMeasurement::handle(
        "monotonic",
        Vec::<bool>::new(),
        move |state, _time, previous| {
            let current = state.field().occupancy();
            if !previous.is_empty() {
                let melted = previous.iter().zip(current).filter(|&(&was, &is)| was && !is).count();
                *seen.borrow_mut() += melted;
            }
            previous.clear();
            previous.extend_from_slice(current);
            Control::Continue
        },
    ))
    .unwrap();

    let summary = sim.run(growing_params().with_tick_limit(400)).unwrap();
    println!(
        "   {} seed cells grew to {} after {} ticks",
        summary.seed_cells, summary.occupied_cells, summary.ticks
    );

    assert_eq!(*violations.borrow(), 0);
    assert_gt!(summary.occupied_cells, summary.seed_cells);
    println!("   ✅ Occupancy only ever turns on");
}

#[test]
fn test_identical_runs_are_identical() {
    init_logging();
    println!("🔁 Testing determinism of two identical runs");

    let params = SimulationParameters::new(
        Medium::preset("snowflake8").unwrap().with_rho(0.5),
        SeedCrystal::new(2, 1),
        20,
        20,
        10,
    )
    .with_tick_limit(80);

    let mut first = Simulation::new();
    let mut second = Simulation::new();
    first.run(params.clone()).unwrap();
    second.run(params).unwrap();

    let a = first.state().unwrap();
    let b = second.state().unwrap();
    assert_eq!(a.time(), b.time());
    assert_eq!(a.field().occupancy(), b.field().occupancy());
    assert_eq!(a.field().diffusive_mass(), b.field().diffusive_mass());
    assert_eq!(a.field().boundary_mass(), b.field().boundary_mass());
    assert_eq!(a.field().crystal_mass(), b.field().crystal_mass());
    println!("   ✅ Fields are bit-identical");
}
