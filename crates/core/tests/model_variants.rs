//! The pressure-only and falling-water models behind the same facade
use approx::assert_abs_diff_eq;
use ctor::ctor;
use water_sim_core::{
    FlowParams, GridPos, Model, SimError, SimulationConfig, WaterSimulation,
};

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn basin(model: Model) -> WaterSimulation {
    let config = SimulationConfig {
        model,
        ..Default::default()
    };
    let mut sim = WaterSimulation::with_config(12, 10, config).expect("valid grid");
    // A cup with a ledge, and water poured above it
    for y in 0..5 {
        sim.set_boundary(GridPos::new(2, y), true);
        sim.set_boundary(GridPos::new(9, y), true);
    }
    for x in 4..8 {
        sim.set_boundary(GridPos::new(x, 2), true);
    }
    for x in 3..9 {
        for y in 6..9 {
            sim.set_water(GridPos::new(x, y), true);
        }
    }
    sim
}

fn check_model(model: Model, ticks: usize) {
    let mut sim = basin(model);
    let initial = sim.total_pressure();
    assert_abs_diff_eq!(initial, 18.0, epsilon = 1e-5);

    for _ in 0..ticks {
        sim.step();
        let pressure = sim.pressure_field();
        for (x, y, wall) in sim.boundary_field().cells() {
            if wall {
                assert_eq!(pressure.get(x, y), 0.0, "{model:?}: wet wall at ({x}, {y})");
            }
        }
    }

    assert_abs_diff_eq!(sim.total_pressure(), initial, epsilon = 1e-3);
    assert!(sim.pressure_field().as_slice().iter().all(|&p| p >= 0.0));
    assert_eq!(sim.worker_count(), 1);
}

#[test]
fn test_pressure_model_conserves_mass() {
    check_model(Model::Pressure, 600);
}

#[test]
fn test_falling_model_conserves_mass() {
    check_model(Model::Falling, 200);
}

#[test]
fn test_falling_water_comes_to_rest_on_the_floor() {
    let mut sim = basin(Model::Falling);
    for _ in 0..300 {
        sim.step();
    }
    let field = sim.pressure_field();
    // Nothing floats: every water cell is supported from below
    for (x, y, p) in field.cells() {
        if p > 0.0 && y > 0 {
            let below = field.get(x, y - 1) > 0.0 || sim.boundary_field().get(x, y - 1);
            assert!(below, "water hanging in the air at ({x}, {y})");
        }
    }
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = SimulationConfig {
        params: FlowParams {
            drag: 2.0,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(
        WaterSimulation::with_config(10, 10, config),
        Err(SimError::InvalidParameter { name: "drag", .. })
    ));

    let config = SimulationConfig {
        threads: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        WaterSimulation::with_config(10, 10, config),
        Err(SimError::InvalidThreadCount)
    ));

    assert!(matches!(
        WaterSimulation::new(10, 0),
        Err(SimError::InvalidDimensions { .. })
    ));
}
