// Surface extraction and STL export of grown and hand-built crystals

use approx::assert_relative_eq;
use more_asserts::assert_gt;
use snowfake_rust::constants::CELL_VOLUME;
use snowfake_rust::field::{Dimensions, VoxelField};
use snowfake_rust::medium::Medium;
use snowfake_rust::mesh::{load_stl, StlFormat};
use snowfake_rust::params::SimulationParameters;
use snowfake_rust::seed_crystal::SeedCrystal;
use snowfake_rust::sim::{Simulation, SimulationState};
use std::path::PathBuf;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_stl(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("snowfake_mesh_{}_{}.stl", name, std::process::id()))
}

fn grown_simulation(ticks: u64) -> Simulation {
    let params = SimulationParameters::new(Medium::uniform(0.5, 0.1, 0.05, 1.0), SeedCrystal::new(2, 1), 24, 24, 12)
        .with_tick_limit(ticks);
    let mut sim = Simulation::new();
    sim.run(params).unwrap();
    sim
}

#[test]
fn test_seed_mesh_shape() {
    init_logging();
    println!("🔷 Testing the mesh of a bare radius-2 seed");

    let params = SimulationParameters::new(Medium::default(), SeedCrystal::new(2, 1), 16, 16, 8);
    let dims = params.validate().unwrap();
    let mut field = VoxelField::new(dims, params.medium.rho as f32);
    params.seed.plant(&mut field).unwrap();
    let state = SimulationState::new(&field, &params, 0);

    let mesh = state.mesh();
    // 19 caps top and bottom (4 triangles each) plus 30 exposed side quads
    assert_eq!(mesh.triangle_count(), 19 * 2 * 4 + 30 * 2);
    assert!(mesh.is_closed());
    assert_relative_eq!(mesh.volume(), 19.0 * CELL_VOLUME, max_relative = 1e-5);

    let (lo, hi) = mesh.bounds().unwrap();
    assert_relative_eq!(lo.z, -0.5);
    assert_relative_eq!(hi.z, 0.5);
    assert_relative_eq!(lo.x, -hi.x, epsilon = 1e-5);
    assert_relative_eq!(lo.y, -hi.y, epsilon = 1e-5);
    println!("   ✅ {} triangles, volume {:.4}", mesh.triangle_count(), mesh.volume());
}

#[test]
fn test_grown_crystal_mesh_is_closed_with_cell_volume() {
    init_logging();
    println!("❄️ Testing the mesh of a grown crystal");

    let sim = grown_simulation(300);
    let state = sim.state().unwrap();
    let mesh = state.mesh();
    let occupied = state.occupied_count();

    println!(
        "   {} ice cells -> {} vertices, {} triangles",
        occupied,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    assert_gt!(occupied, 19);
    assert!(mesh.is_closed());
    assert_relative_eq!(mesh.volume(), occupied as f64 * CELL_VOLUME, max_relative = 1e-4);
    assert_gt!(mesh.surface_area(), 0.0);
    println!("   ✅ Volume matches {} prisms", occupied);
}

#[test]
fn test_binary_export_round_trips() {
    init_logging();
    println!("💾 Testing binary STL export and reload");

    let sim = grown_simulation(150);
    let state = sim.state().unwrap();
    let path = temp_stl("binary");
    state.export_stl(&path).unwrap();

    let original = state.mesh();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 84 + 50 * original.triangle_count());

    let reloaded = load_stl(&path).unwrap();
    assert_eq!(reloaded.triangle_count(), original.triangle_count());
    assert_eq!(reloaded.vertex_count(), original.vertex_count());
    assert!(reloaded.is_closed());
    assert_relative_eq!(reloaded.volume(), original.volume(), max_relative = 1e-9);
    std::fs::remove_file(&path).ok();
    println!("   ✅ {} facets survived the round trip", reloaded.triangle_count());
}

#[test]
fn test_ascii_export_round_trips() {
    init_logging();
    println!("📝 Testing ASCII STL export and reload");

    let sim = grown_simulation(60);
    let state = sim.state().unwrap();
    let path = temp_stl("ascii");
    state.export_ascii_stl(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("solid"));

    let original = state.mesh();
    let reloaded = load_stl(&path).unwrap();
    assert_eq!(reloaded.triangle_count(), original.triangle_count());
    assert!(reloaded.is_closed());
    assert_relative_eq!(reloaded.volume(), original.volume(), max_relative = 1e-6);
    std::fs::remove_file(&path).ok();
    println!("   ✅ ASCII facets reload into the same closed surface");
}

#[test]
fn test_mesh_can_be_taken_at_any_tick() {
    init_logging();
    println!("⏱️ Testing export from inside a running simulation");

    use snowfake_rust::measurement::{CallbackMeasurement, Control};

    let params = SimulationParameters::new(Medium::uniform(0.5, 0.1, 0.05, 1.0), SeedCrystal::new(2, 1), 20, 20, 10)
        .with_tick_limit(120);
    let mut sim = Simulation::new();
    sim.measurement(
        CallbackMeasurement::handle("volume_probe", Vec::<(usize, f64)>::new(), |state, _time, samples| {
            let mesh = state.mesh();
            assert!(mesh.is_closed());
            samples.push((state.occupied_count(), mesh.volume()));
            for &(cells, volume) in samples.iter() {
                assert!((volume - cells as f64 * CELL_VOLUME).abs() < 1e-3 * cells as f64);
            }
            Control::Continue
        })
        .every(30),
    )
    .unwrap();
    let summary = sim.run(params).unwrap();
    assert_eq!(summary.ticks, 120);
    println!("   ✅ Every snapshot gave a closed mesh");
}

#[test]
fn test_format_selection() {
    init_logging();
    let dims = Dimensions::new(5, 5, 5).unwrap();
    let mut field = VoxelField::new(dims, 0.1);
    SeedCrystal::new(1, 1).plant(&mut field).unwrap();
    let params = SimulationParameters::new(Medium::default(), SeedCrystal::new(1, 1), 5, 5, 5);
    let mesh = SimulationState::new(&field, &params, 0).mesh();

    let mut binary = Vec::new();
    let mut ascii = Vec::new();
    mesh.write_stl(&mut binary, StlFormat::Binary).unwrap();
    mesh.write_stl(&mut ascii, StlFormat::Ascii).unwrap();
    assert_eq!(StlFormat::default(), StlFormat::Binary);
    assert!(!binary.starts_with(b"solid"));
    assert!(ascii.starts_with(b"solid"));
}
