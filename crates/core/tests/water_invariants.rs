//! Invariants of the pressure + velocity model through the public facade
use approx::assert_abs_diff_eq;
use ctor::ctor;
use water_sim_core::{GridPos, SimulationConfig, Vec2, WaterSimulation};

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn simulation(width: usize, height: usize, threads: usize) -> WaterSimulation {
    let config = SimulationConfig {
        threads: Some(threads),
        ..Default::default()
    };
    WaterSimulation::with_config(width, height, config).expect("valid grid")
}

/// Left half full of water behind a wall with a gap at the bottom
fn dam_with_gap(sim: &mut WaterSimulation) {
    let size = sim.size();
    let (width, height) = (size.width as i32, size.height as i32);
    for x in 0..width {
        for y in 0..height {
            if x < width / 2 {
                sim.set_water(GridPos::new(x, y), true);
            } else if x == width / 2 && y > 3 {
                sim.set_boundary(GridPos::new(x, y), true);
            }
        }
    }
}

fn assert_boundaries_dry(sim: &WaterSimulation) {
    let pressure = sim.pressure_field();
    for (x, y, wall) in sim.boundary_field().cells() {
        if wall {
            assert_eq!(pressure.get(x, y), 0.0, "wall at ({x}, {y}) holds water");
            let cell = sim.cell(GridPos::from_cell(x, y)).expect("on grid");
            assert_eq!(cell.velocity, Vec2::zeros());
        }
    }
}

#[test]
fn test_water_leaks_through_gap() {
    let mut sim = simulation(10, 10, 3);
    dam_with_gap(&mut sim);
    let initial = sim.total_pressure();
    assert_abs_diff_eq!(initial, 50.0, epsilon = 1e-4);

    for _ in 0..4000 {
        sim.step();
        assert_boundaries_dry(&sim);
    }

    let field = sim.pressure_field();
    let right: f32 = field
        .cells()
        .filter(|&(x, _, _)| x > 5)
        .map(|(_, _, p)| p)
        .sum();
    assert!(right > 1.0, "only {right} made it past the wall");

    let near_gap: f32 = (6..10).map(|x| field.get(x, 0)).sum();
    assert!(near_gap > 0.5, "bottom rows past the wall hold {near_gap}");
    assert!(field.as_slice().iter().all(|&p| p >= 0.0 && p.is_finite()));
    assert_abs_diff_eq!(sim.total_pressure(), initial, epsilon = 0.05);
}

#[test]
fn test_mass_never_grows() {
    let mut sim = simulation(16, 12, 4);
    dam_with_gap(&mut sim);
    sim.set_cell_velocity(GridPos::new(2, 2), Vec2::new(3.0, 1.0));

    let mut previous = sim.total_pressure();
    for _ in 0..500 {
        sim.step();
        let total = sim.total_pressure();
        assert!(
            total <= previous + 1e-3,
            "mass grew from {previous} to {total}"
        );
        previous = total;
    }
}

#[test]
fn test_empty_grid_stays_still() {
    let mut sim = simulation(12, 9, 2);
    for _ in 0..50 {
        sim.step();
    }
    assert!(sim.pressure_field().as_slice().iter().all(|&p| p.abs() <= 1e-6));
    let cell = sim.cell(GridPos::new(6, 4)).expect("on grid");
    assert!(cell.velocity.norm() <= 1e-6);
}

#[test]
fn test_out_of_range_edits_are_ignored() {
    let mut sim = simulation(8, 6, 2);
    dam_with_gap(&mut sim);
    let pressure = sim.pressure_field();
    let walls = sim.boundary_field();

    for pos in [
        GridPos::new(-1, 0),
        GridPos::new(0, -1),
        GridPos::new(8, 2),
        GridPos::new(3, 6),
        GridPos::new(i32::MIN, i32::MAX),
    ] {
        sim.set_water(pos, true);
        sim.set_water(pos, false);
        sim.set_boundary(pos, true);
        sim.set_cell_pressure(pos, 5.0);
        sim.set_cell_velocity(pos, Vec2::new(1.0, 1.0));
        assert!(sim.cell(pos).is_none());
    }

    assert_eq!(sim.pressure_field(), pressure);
    assert_eq!(sim.boundary_field(), walls);
}

#[test]
fn test_painting_semantics() {
    let mut sim = simulation(6, 6, 2);
    let pos = GridPos::new(2, 3);

    sim.set_boundary(pos, true);
    sim.set_water(pos, true);
    assert!(!sim.boundary_field().get(2, 3));
    assert_eq!(sim.pressure_field().get(2, 3), 1.0);

    sim.set_cell_velocity(pos, Vec2::new(0.5, -0.5));
    sim.set_water(pos, false);
    let cell = sim.cell(pos).expect("on grid");
    assert_eq!(cell.pressure, 0.0);
    assert_eq!(cell.velocity, Vec2::zeros());

    sim.set_cell_pressure(pos, 2.0);
    sim.set_boundary(pos, true);
    assert_eq!(sim.pressure_field().get(2, 3), 0.0);
    sim.set_cell_pressure(pos, -3.0);
    assert_eq!(sim.pressure_field().get(2, 3), 0.0);
}

#[test]
fn test_snapshots_are_decoupled() {
    let mut sim = simulation(6, 6, 2);
    sim.set_water(GridPos::new(1, 1), true);
    let snapshot = sim.pressure_field();
    sim.set_water(GridPos::new(1, 1), false);
    sim.step();
    assert_eq!(snapshot.get(1, 1), 1.0);
}
