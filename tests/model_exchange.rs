//! Model-exchange runs of the bouncing ball, integrated by the host.

use fmi_import::logging::MemoryLogger;
use fmi_import::{Callbacks, Fmu, FmuKind, ImportConfig, InProcessLoader, LifecycleState, LogLevel, ModelDescription, Status};
use fmi_import_dummy as ball;
use is_close::is_close;
use std::sync::Arc;

const MODULE_PATH: &str = "bouncing_ball.so";

fn load(kind: FmuKind, logger: &Arc<MemoryLogger>) -> Fmu {
    let description = ModelDescription::from_toml_str(ball::MODEL_DESCRIPTION).unwrap();
    let loader = InProcessLoader::new().with_module(MODULE_PATH, ball::entry_points());
    let callbacks = Callbacks::new(logger.clone(), LogLevel::Info);
    Fmu::load(description, &loader, MODULE_PATH, kind, callbacks, &ImportConfig::default()).unwrap()
}

fn initialise(fmu: &mut Fmu, kind: FmuKind) {
    fmu.instantiate("ball", kind, "", false).unwrap();
    fmu.setup_experiment(Some(1e-6), 0.0, None).unwrap();
    fmu.enter_initialization_mode().unwrap();
    fmu.exit_initialization_mode().unwrap();
}

/// Explicit Euler with a fixed step, handling ground contact as a state event.
fn integrate(fmu: &mut Fmu, step: f64, steps: usize) -> usize {
    let (status, event_info) = fmu.new_discrete_states().unwrap();
    assert_eq!(status, Status::Ok);
    assert!(!event_info.terminate_simulation);
    assert_eq!(fmu.enter_continuous_time_mode().unwrap(), Status::Ok);

    let mut events = 0;
    let mut states = [0.0; ball::N_STATES];
    let mut derivatives = [0.0; ball::N_STATES];
    for n in 1..=steps {
        fmu.get_continuous_states(&mut states).unwrap();
        fmu.get_derivatives(&mut derivatives).unwrap();
        for (state, derivative) in states.iter_mut().zip(derivatives) {
            *state += step * derivative;
        }
        assert_eq!(fmu.set_time(n as f64 * step).unwrap(), Status::Ok);
        assert_eq!(fmu.set_continuous_states(&states).unwrap(), Status::Ok);

        let (status, result) = fmu.completed_integrator_step(true).unwrap();
        assert_eq!(status, Status::Ok);
        assert!(!result.terminate_simulation);
        if result.enter_event_mode {
            events += 1;
            fmu.enter_event_mode().unwrap();
            assert_eq!(fmu.state(), LifecycleState::EventMode);
            let (_, event_info) = fmu.new_discrete_states().unwrap();
            assert!(event_info.values_of_continuous_states_changed);
            fmu.enter_continuous_time_mode().unwrap();
        }
    }
    events
}

#[test]
fn host_integration_matches_co_simulation() {
    let logger = Arc::new(MemoryLogger::new());

    let mut me = load(FmuKind::ModelExchange, &logger);
    initialise(&mut me, FmuKind::ModelExchange);
    assert_eq!(me.state(), LifecycleState::EventMode);
    let events = integrate(&mut me, ball::SUBSTEP, 150);
    assert_eq!(events, 2);
    let mut me_states = [0.0; ball::N_STATES];
    me.get_continuous_states(&mut me_states).unwrap();

    let mut cs = load(FmuKind::CoSimulation, &logger);
    initialise(&mut cs, FmuKind::CoSimulation);
    for n in 0..15 {
        cs.do_step(n as f64 * 0.1, 0.1, true).unwrap();
    }
    let mut cs_states = [0.0; ball::N_STATES];
    cs.get_float64(&[0, 1], &mut cs_states).unwrap();

    assert!((me_states[0] - cs_states[0]).abs() < 1e-9);
    assert!((me_states[1] - cs_states[1]).abs() < 1e-9);

    let mut bounces = [0];
    me.get_int32(&[0], &mut bounces).unwrap();
    assert_eq!(bounces[0], 2);
}

#[test]
fn event_indicator_tracks_height() {
    let logger = Arc::new(MemoryLogger::new());
    let mut fmu = load(FmuKind::ModelExchange, &logger);
    initialise(&mut fmu, FmuKind::ModelExchange);

    let mut indicators = [0.0; ball::N_EVENT_INDICATORS];
    assert_eq!(fmu.get_event_indicators(&mut indicators).unwrap(), Status::Ok);
    assert!(is_close!(indicators[0], ball::INITIAL_HEIGHT));

    let mut nominals = [0.0; ball::N_STATES];
    assert_eq!(fmu.get_nominals_of_continuous_states(&mut nominals).unwrap(), Status::Ok);
    assert_eq!(nominals, [1.0, 1.0]);

    // Arrays of the wrong length are rejected by the module, not by the handle.
    let mut short = [0.0; 1];
    assert_eq!(fmu.get_derivatives(&mut short).unwrap(), Status::Error);
    assert_eq!(fmu.state(), LifecycleState::EventMode);
}

#[test]
fn model_exchange_calls_are_checked() {
    let logger = Arc::new(MemoryLogger::new());
    let mut fmu = load(FmuKind::ModelExchange, &logger);
    initialise(&mut fmu, FmuKind::ModelExchange);

    assert!(fmu.do_step(0.0, 0.1, true).is_err());
    assert!(fmu.set_continuous_states(&[1.0, 0.0]).is_err());
    assert!(fmu.completed_integrator_step(true).is_err());
    assert_eq!(fmu.state(), LifecycleState::EventMode);

    fmu.enter_continuous_time_mode().unwrap();
    assert_eq!(fmu.terminate().unwrap(), Status::Ok);
    let mut states = [0.0; ball::N_STATES];
    assert_eq!(fmu.get_continuous_states(&mut states).unwrap(), Status::Ok);
    assert!(is_close!(states[0], ball::INITIAL_HEIGHT));
    fmu.free_instance().unwrap();
    assert!(fmu.get_version().is_err());
}
