//! Co-simulation runs of the bouncing ball through the import handle.

use fmi_import::logging::{LogRecord, MemoryLogger};
use fmi_import::{
    BaseType, Callbacks, Fmu, FmuKind, ImportConfig, ImportError, InProcessLoader, LifecycleState, LogLevel,
    ModelDescription, Status,
};
use fmi_import_dummy as ball;
use is_close::is_close;
use std::sync::Arc;

const MODULE_PATH: &str = "bouncing_ball.so";

fn load(logger: &Arc<MemoryLogger>, config: &ImportConfig) -> Fmu {
    let description = ModelDescription::from_toml_str(ball::MODEL_DESCRIPTION).unwrap();
    let loader = InProcessLoader::new().with_module(MODULE_PATH, ball::entry_points());
    let callbacks = Callbacks::new(logger.clone(), LogLevel::All);
    Fmu::load(description, &loader, MODULE_PATH, FmuKind::CoSimulation, callbacks, config).unwrap()
}

fn initialise(fmu: &mut Fmu) {
    fmu.instantiate("ball", FmuKind::CoSimulation, "", false).unwrap();
    assert_eq!(fmu.setup_experiment(None, 0.0, Some(2.0)).unwrap(), Status::Ok);
    assert_eq!(fmu.enter_initialization_mode().unwrap(), Status::Ok);
    assert_eq!(fmu.exit_initialization_mode().unwrap(), Status::Ok);
    assert_eq!(fmu.state(), LifecycleState::StepMode);
}

fn events(records: &[LogRecord]) -> Vec<&LogRecord> {
    records
        .iter()
        .filter(|record| record.message.starts_with("[logEvents]"))
        .collect()
}

#[test]
fn bounce_for_two_seconds() {
    let logger = Arc::new(MemoryLogger::new());
    let mut fmu = load(&logger, &ImportConfig::default());
    assert_eq!(fmu.get_version().unwrap(), "3.0-alpha");
    assert_eq!(fmu.get_types_platform().unwrap(), "default");
    initialise(&mut fmu);

    let step = 0.1;
    let mut time = 0.0;
    let mut heights = vec![];
    while time < 2.0 - 1e-9 {
        assert_eq!(fmu.do_step(time, step, true).unwrap(), Status::Ok);
        time += step;

        let mut values = [0.0; 2];
        fmu.get_float64(&[0, 4], &mut values).unwrap();
        assert!(is_close!(values[1], time));
        heights.push(values[0]);
    }
    assert_eq!(heights.len(), 20);
    assert!(heights.iter().all(|height| (0.0..=ball::INITIAL_HEIGHT).contains(height)));

    let mut bounces = [0];
    fmu.get_int32(&[0], &mut bounces).unwrap();
    assert!(bounces[0] >= 2);

    let records = logger.records();
    let bounced = events(&records);
    assert_eq!(bounced.len(), bounces[0] as usize);
    for (count, record) in bounced.iter().enumerate() {
        assert_eq!(record.module, "ball");
        assert_eq!(record.level, LogLevel::Info);
        assert!(record.message.starts_with("[logEvents][FMU status:OK] Ball bounced at t = "));
        assert!(record.message.ends_with(&format!("bounces is now {}", count + 1)));
    }

    assert_eq!(fmu.terminate().unwrap(), Status::Ok);
    fmu.free_instance().unwrap();
    assert_eq!(fmu.state(), LifecycleState::Freed);
    let terminated = format!("Terminated after {} bounces", bounces[0]);
    assert!(logger.messages().iter().any(|message| message.ends_with(&terminated)));
}

#[test]
fn step_sizes_agree() {
    let run = |step: f64| {
        let logger = Arc::new(MemoryLogger::new());
        let mut fmu = load(&logger, &ImportConfig::default());
        initialise(&mut fmu);
        let steps = (1.0 / step).round() as usize;
        for n in 0..steps {
            fmu.do_step(n as f64 * step, step, true).unwrap();
        }
        let mut values = [0.0; 2];
        fmu.get_float64(&[0, 1], &mut values).unwrap();
        values
    };

    // Both step sizes integrate with the same substep.
    let coarse = run(0.1);
    let fine = run(0.05);
    assert!((coarse[0] - fine[0]).abs() < 1e-9);
    assert!((coarse[1] - fine[1]).abs() < 1e-9);
}

#[test]
fn parameters_and_accessors() {
    let logger = Arc::new(MemoryLogger::new());
    let mut fmu = load(&logger, &ImportConfig::default());
    fmu.instantiate("ball", FmuKind::CoSimulation, "", false).unwrap();

    assert_eq!(fmu.set_float64(&[3], &[0.5]).unwrap(), Status::Ok);
    assert_eq!(fmu.set_string(&[0], &["rubber"]).unwrap(), Status::Ok);
    let mut label = vec![String::new()];
    assert_eq!(fmu.get_string(&[0], &mut label).unwrap(), Status::Ok);
    assert_eq!(label, vec!["rubber".to_string()]);

    let mut single = [0.0f32];
    fmu.get_float32(&[0], &mut single).unwrap();
    assert!(is_close!(single[0] as f64, ball::INITIAL_HEIGHT));
    let mut falling = [true];
    fmu.get_boolean(&[0], &mut falling).unwrap();
    assert!(!falling[0]);

    // Outputs are computed by the module and reject writes.
    assert_eq!(fmu.set_int32(&[0], &[7]).unwrap(), Status::Error);
    assert_eq!(fmu.set_boolean(&[0], &[true]).unwrap(), Status::Error);
    assert_eq!(fmu.state(), LifecycleState::Instantiated);
    assert!(!fmu.is_poisoned());

    let rejected = logger
        .records()
        .into_iter()
        .filter(|record| record.level == LogLevel::Error && record.module == "ball")
        .count();
    assert_eq!(rejected, 2);

    let mut restitution = [0.0];
    fmu.get_float64(&[3], &mut restitution).unwrap();
    assert!(is_close!(restitution[0], 0.5));
    assert_eq!(fmu.reset().unwrap(), Status::Ok);
    fmu.get_float64(&[3], &mut restitution).unwrap();
    assert!(is_close!(restitution[0], ball::RESTITUTION));
}

#[test]
fn module_errors_reach_the_host() {
    let logger = Arc::new(MemoryLogger::new());
    let mut fmu = load(&logger, &ImportConfig::default());
    fmu.instantiate("ball", FmuKind::CoSimulation, "", false).unwrap();
    fmu.setup_experiment(None, 0.0, None).unwrap();
    fmu.enter_initialization_mode().unwrap();
    fmu.set_float64(&[2], &[-1.0]).unwrap();

    assert_eq!(fmu.exit_initialization_mode().unwrap(), Status::Error);
    assert_eq!(fmu.state(), LifecycleState::InitializationMode);
    let records = logger.records();
    let last = records.iter().filter(|record| record.module == "ball").last().unwrap();
    assert_eq!(last.level, LogLevel::Error);
    assert_eq!(last.message, "[logStatusError][FMU status:Error] Gravity must be positive, got -1");
}

#[test]
fn steps_out_of_order_are_discarded() {
    let logger = Arc::new(MemoryLogger::new());
    let mut fmu = load(&logger, &ImportConfig::default());
    initialise(&mut fmu);

    assert_eq!(fmu.do_step(0.0, 0.1, true).unwrap(), Status::Ok);
    assert_eq!(fmu.do_step(0.0, 0.1, true).unwrap(), Status::Discard);
    assert_eq!(fmu.state(), LifecycleState::StepMode);
    assert_eq!(fmu.do_step(0.1, 0.1, true).unwrap(), Status::Ok);
}

#[test]
fn lifecycle_is_enforced() {
    let logger = Arc::new(MemoryLogger::new());
    let mut fmu = load(&logger, &ImportConfig::default());

    assert!(matches!(
        fmu.do_step(0.0, 0.1, true),
        Err(ImportError::InvalidCallSequence { .. })
    ));
    fmu.instantiate("ball", FmuKind::CoSimulation, "", false).unwrap();
    assert!(matches!(fmu.terminate(), Err(ImportError::InvalidCallSequence { .. })));
    assert!(matches!(fmu.free_instance(), Err(ImportError::InvalidCallSequence { .. })));
    assert!(matches!(
        fmu.enter_event_mode(),
        Err(ImportError::InvalidCallSequence { .. })
    ));
    assert_eq!(fmu.state(), LifecycleState::Instantiated);
}

#[test]
fn silenced_instance_logs_nothing() {
    let logger = Arc::new(MemoryLogger::new());
    let config = ImportConfig::from_toml_str("[instance]\nlogging_on = false\n").unwrap();
    let mut fmu = load(&logger, &config);
    initialise(&mut fmu);
    for n in 0..10 {
        fmu.do_step(n as f64 * 0.1, 0.1, true).unwrap();
    }
    assert!(logger.records().iter().all(|record| record.module != "ball"));

    assert_eq!(fmu.set_debug_logging(true, &["logEvents"]).unwrap(), Status::Ok);
    for n in 10..20 {
        fmu.do_step(n as f64 * 0.1, 0.1, true).unwrap();
    }
    assert!(!events(&logger.records()).is_empty());
}

#[test]
fn description_queries() {
    let logger = Arc::new(MemoryLogger::new());
    let fmu = load(&logger, &ImportConfig::default());

    assert_eq!(fmu.get_instantiation_token(), ball::INSTANTIATION_TOKEN);
    let counts = fmu.model_counts();
    assert_eq!(counts.num_float64_vars, 5);
    assert_eq!(counts.num_parameters, 3);
    assert_eq!(counts.variability_total(), 9);
    assert_eq!(counts.causality_total(), 9);
    assert_eq!(counts.base_type_total(), 9);
    assert_eq!(fmu.variable_by_vr(BaseType::Float64, 3).unwrap().name, "e");
    assert!(fmu.variable_by_vr(BaseType::Float64, 9).is_none());
    assert_eq!(
        fmu.expand_variable_references("#i0# so far, #b0# now", 64),
        "bounces so far, falling now"
    );
    assert_eq!(fmu.expand_variable_references("#i0# so far", 8), "bounces");
    // Float references are not expanded.
    assert_eq!(fmu.expand_variable_references("#r0# is the height", 64), "#r0# is the height");
}

#[test]
fn dropping_an_active_handle_terminates_and_frees() {
    let logger = Arc::new(MemoryLogger::new());
    {
        let mut fmu = load(&logger, &ImportConfig::default());
        initialise(&mut fmu);
        fmu.do_step(0.0, 0.5, true).unwrap();
    }
    let messages = logger.messages();
    assert!(messages.iter().any(|message| message.contains("Terminated after 1 bounces")));
    assert!(!messages.iter().any(|message| message.contains("is not freed")));
}
