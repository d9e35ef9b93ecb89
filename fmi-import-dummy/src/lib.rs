#![allow(non_snake_case)]
//! Bouncing ball implementing the FMI 3 draft native interface.
//!
//! The ball starts at rest one metre above the ground and falls under gravity. When it
//! hits the ground its speed is reversed and damped by the coefficient of restitution:
//!
//! - der(h) = v
//! - der(v) = -g
//! - on h < 0: h = -h, v = -e * v
//!
//! Both kinds are implemented. As a model-exchange module the host integrates `h` and
//! `v` and handles the ground contact as a state event. As a co-simulation module
//! [`fmi3DoStep`] integrates with explicit Euler in substeps of [`SUBSTEP`] seconds.
//!
//! The crate builds as a `cdylib` that hosts load at run time, and as an `rlib` whose
//! [`entry_points`] can be registered with an in-process loader.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;

/// Model description matching this module.
pub const MODEL_DESCRIPTION: &str = include_str!("../modelDescription.toml");

pub const INSTANTIATION_TOKEN: &str = "{8c4e810f-3df3-4a00-8276-176fa3c9f003}";

/// Largest integration step used inside `fmi3DoStep`.
pub const SUBSTEP: f64 = 0.01;

pub const INITIAL_HEIGHT: f64 = 1.0;
pub const GRAVITY: f64 = 9.81;
pub const RESTITUTION: f64 = 0.7;

pub const N_STATES: usize = 2;
pub const N_EVENT_INDICATORS: usize = 1;

const OK: c_int = 0;
const DISCARD: c_int = 2;
const ERROR: c_int = 3;
const FATAL: c_int = 4;

const CO_SIMULATION: c_int = 1;

type Instance = *mut c_void;

type Logger = unsafe extern "C" fn(*mut c_void, *const c_char, c_int, *const c_char, *const c_char);
type AllocateMemory = unsafe extern "C" fn(*mut c_void, usize, usize) -> *mut c_void;
type FreeMemory = unsafe extern "C" fn(*mut c_void, *mut c_void);

#[repr(C)]
pub struct CallbackFunctions {
    logger: Option<Logger>,
    allocate_memory: Option<AllocateMemory>,
    free_memory: Option<FreeMemory>,
    component_environment: *mut c_void,
}

#[repr(C)]
pub struct EventInfo {
    new_discrete_states_needed: bool,
    terminate_simulation: bool,
    nominals_of_continuous_states_changed: bool,
    values_of_continuous_states_changed: bool,
    next_event_time_defined: bool,
    next_event_time: f64,
}

struct Ball {
    name: CString,
    co_simulation: bool,
    functions: *const CallbackFunctions,
    logging_on: bool,
    time: f64,
    /// Height and speed.
    states: [f64; N_STATES],
    gravity: f64,
    restitution: f64,
    bounces: i32,
    label: CString,
}

impl Ball {
    fn reset(&mut self) {
        self.time = 0.0;
        self.states = [INITIAL_HEIGHT, 0.0];
        self.gravity = GRAVITY;
        self.restitution = RESTITUTION;
        self.bounces = 0;
        self.label = CString::default();
    }

    fn derivatives(&self) -> [f64; N_STATES] {
        [self.states[1], -self.gravity]
    }

    fn event_indicators(&self) -> [f64; N_EVENT_INDICATORS] {
        [self.states[0]]
    }

    fn euler_step(&mut self, step: f64) {
        let derivatives = self.derivatives();
        for (state, derivative) in self.states.iter_mut().zip(derivatives) {
            *state += step * derivative;
        }
        self.time += step;
    }

    /// Handle ground contact. Returns whether the ball bounced.
    fn update_discrete_states(&mut self) -> bool {
        if self.states[0] >= 0.0 {
            return false;
        }
        self.states[0] = -self.states[0];
        self.states[1] = -self.restitution * self.states[1];
        self.bounces += 1;
        self.log(
            OK,
            "logEvents",
            &format!("Ball bounced at t = {:.2}, #i0# is now {}", self.time, self.bounces),
        );
        true
    }

    fn float64(&self, value_reference: u32) -> Option<f64> {
        match value_reference {
            0 => Some(self.states[0]),
            1 => Some(self.states[1]),
            2 => Some(self.gravity),
            3 => Some(self.restitution),
            4 => Some(self.time),
            _ => None,
        }
    }

    fn set_float64(&mut self, value_reference: u32, value: f64) -> bool {
        match value_reference {
            0 => self.states[0] = value,
            1 => self.states[1] = value,
            2 => self.gravity = value,
            3 => self.restitution = value,
            _ => return false,
        }
        true
    }

    fn float32(&self, value_reference: u32) -> Option<f32> {
        (value_reference == 0).then_some(self.states[0] as f32)
    }

    fn int32(&self, value_reference: u32) -> Option<i32> {
        (value_reference == 0).then_some(self.bounces)
    }

    fn boolean(&self, value_reference: u32) -> Option<bool> {
        (value_reference == 0).then_some(self.states[1] < 0.0)
    }

    fn log(&self, status: c_int, category: &str, message: &str) {
        if !self.logging_on {
            return;
        }
        // Messages come from this crate and never contain NUL bytes.
        let (Ok(category), Ok(message)) = (CString::new(category), CString::new(message)) else {
            return;
        };
        unsafe {
            let functions = &*self.functions;
            if let Some(logger) = functions.logger {
                logger(
                    functions.component_environment,
                    self.name.as_ptr(),
                    status,
                    category.as_ptr(),
                    message.as_ptr(),
                );
            }
        }
    }
}

unsafe fn ball<'a>(instance: Instance) -> Option<&'a mut Ball> {
    (instance as *mut Ball).as_mut()
}

unsafe fn slice<'a, T>(data: *const T, len: usize) -> &'a [T] {
    if len == 0 || data.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(data, len)
    }
}

unsafe fn slice_mut<'a, T>(data: *mut T, len: usize) -> &'a mut [T] {
    if len == 0 || data.is_null() {
        &mut []
    } else {
        std::slice::from_raw_parts_mut(data, len)
    }
}

unsafe fn get_values<T>(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *mut T,
    n_values: usize,
    get: fn(&Ball, u32) -> Option<T>,
) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    if n_value_references != n_values {
        ball.log(
            ERROR,
            "logStatusError",
            &format!("Expected one value per value reference, got {n_values} for {n_value_references}"),
        );
        return ERROR;
    }
    let value_references = slice(value_references, n_value_references);
    let values = slice_mut(values, n_values);
    for (value_reference, value) in value_references.iter().zip(values) {
        match get(ball, *value_reference) {
            Some(found) => *value = found,
            None => {
                ball.log(
                    ERROR,
                    "logStatusError",
                    &format!("Unknown value reference {value_reference}"),
                );
                return ERROR;
            }
        }
    }
    OK
}

unsafe fn set_values<T: Copy>(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *const T,
    n_values: usize,
    set: fn(&mut Ball, u32, T) -> bool,
) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    if n_value_references != n_values {
        ball.log(
            ERROR,
            "logStatusError",
            &format!("Expected one value per value reference, got {n_values} for {n_value_references}"),
        );
        return ERROR;
    }
    let value_references = slice(value_references, n_value_references);
    let values = slice(values, n_values);
    for (value_reference, value) in value_references.iter().zip(values) {
        if !set(ball, *value_reference, *value) {
            ball.log(
                ERROR,
                "logStatusError",
                &format!("Value reference {value_reference} cannot be set"),
            );
            return ERROR;
        }
    }
    OK
}

fn read_only<T>(_: &mut Ball, _: u32, _: T) -> bool {
    false
}

#[no_mangle]
pub extern "C" fn fmi3GetVersion() -> *const c_char {
    c"3.0-alpha".as_ptr()
}

#[no_mangle]
pub extern "C" fn fmi3GetTypesPlatform() -> *const c_char {
    c"default".as_ptr()
}

/// # Safety
///
/// The string arguments must be valid C strings and `functions` must stay valid until
/// the instance is freed.
#[no_mangle]
pub unsafe extern "C" fn fmi3Instantiate(
    instance_name: *const c_char,
    fmu_type: c_int,
    instantiation_token: *const c_char,
    _resource_location: *const c_char,
    functions: *const CallbackFunctions,
    _visible: bool,
    logging_on: bool,
) -> Instance {
    let Some(callbacks) = functions.as_ref() else {
        return ptr::null_mut();
    };
    if instance_name.is_null() || instantiation_token.is_null() {
        return ptr::null_mut();
    }
    let (Some(allocate_memory), Some(_)) = (callbacks.allocate_memory, callbacks.free_memory) else {
        return ptr::null_mut();
    };

    let mut ball = Ball {
        name: CStr::from_ptr(instance_name).to_owned(),
        co_simulation: fmu_type == CO_SIMULATION,
        functions,
        logging_on,
        time: 0.0,
        states: [0.0; N_STATES],
        gravity: 0.0,
        restitution: 0.0,
        bounces: 0,
        label: CString::default(),
    };
    ball.reset();

    if CStr::from_ptr(instantiation_token).to_bytes() != INSTANTIATION_TOKEN.as_bytes() {
        ball.log(
            ERROR,
            "logStatusError",
            "Instantiation token does not match the model description",
        );
        return ptr::null_mut();
    }

    let memory = allocate_memory(callbacks.component_environment, 1, std::mem::size_of::<Ball>()) as *mut Ball;
    if memory.is_null() {
        return ptr::null_mut();
    }
    ptr::write(memory, ball);
    (*memory).log(OK, "logStatusOK", "Instantiated");
    memory as Instance
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`] and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn fmi3FreeInstance(instance: Instance) {
    let Some(ball) = ball(instance) else {
        return;
    };
    let functions = ball.functions;
    ptr::drop_in_place(ball as *mut Ball);
    if let Some(free_memory) = (*functions).free_memory {
        free_memory((*functions).component_environment, instance);
    }
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3SetDebugLogging(
    instance: Instance,
    logging_on: bool,
    _n_categories: usize,
    _categories: *const *const c_char,
) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    ball.logging_on = logging_on;
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3SetupExperiment(
    instance: Instance,
    _tolerance_defined: bool,
    _tolerance: f64,
    start_time: f64,
    _stop_time_defined: bool,
    _stop_time: f64,
) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    ball.time = start_time;
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3EnterInitializationMode(instance: Instance) -> c_int {
    if ball(instance).is_none() {
        return FATAL;
    }
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3ExitInitializationMode(instance: Instance) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    if ball.gravity <= 0.0 {
        ball.log(ERROR, "logStatusError", &format!("Gravity must be positive, got {}", ball.gravity));
        return ERROR;
    }
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3Terminate(instance: Instance) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    ball.log(OK, "logStatusOK", &format!("Terminated after {} bounces", ball.bounces));
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3Reset(instance: Instance) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    ball.reset();
    OK
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetFloat64(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *mut f64,
    n_values: usize,
) -> c_int {
    get_values(instance, value_references, n_value_references, values, n_values, Ball::float64)
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3SetFloat64(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *const f64,
    n_values: usize,
) -> c_int {
    set_values(instance, value_references, n_value_references, values, n_values, Ball::set_float64)
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetFloat32(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *mut f32,
    n_values: usize,
) -> c_int {
    get_values(instance, value_references, n_value_references, values, n_values, Ball::float32)
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3SetFloat32(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *const f32,
    n_values: usize,
) -> c_int {
    set_values(instance, value_references, n_value_references, values, n_values, read_only)
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetInt32(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *mut i32,
    n_values: usize,
) -> c_int {
    get_values(instance, value_references, n_value_references, values, n_values, Ball::int32)
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3SetInt32(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *const i32,
    n_values: usize,
) -> c_int {
    set_values(instance, value_references, n_value_references, values, n_values, read_only)
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetBoolean(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *mut bool,
    n_values: usize,
) -> c_int {
    get_values(instance, value_references, n_value_references, values, n_values, Ball::boolean)
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3SetBoolean(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *const bool,
    n_values: usize,
) -> c_int {
    set_values(instance, value_references, n_value_references, values, n_values, read_only)
}

/// The returned strings stay valid until the label is set again.
///
/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetString(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *mut *const c_char,
    n_values: usize,
) -> c_int {
    get_values(instance, value_references, n_value_references, values, n_values, |ball, value_reference| {
        (value_reference == 0).then(|| ball.label.as_ptr())
    })
}

/// # Safety
///
/// The arrays must hold `n_value_references` and `n_values` elements, each value a
/// valid C string.
#[no_mangle]
pub unsafe extern "C" fn fmi3SetString(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *const *const c_char,
    n_values: usize,
) -> c_int {
    set_values(instance, value_references, n_value_references, values, n_values, |ball, value_reference, value| {
        if value_reference != 0 || value.is_null() {
            return false;
        }
        ball.label = unsafe { CStr::from_ptr(value) }.to_owned();
        true
    })
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3DoStep(
    instance: Instance,
    current_communication_point: f64,
    communication_step_size: f64,
    _no_set_fmu_state_prior_to_current_point: bool,
) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    if !ball.co_simulation {
        ball.log(ERROR, "logStatusError", "fmi3DoStep called on a model-exchange instance");
        return ERROR;
    }
    if communication_step_size <= 0.0 {
        ball.log(
            ERROR,
            "logStatusError",
            &format!("Communication step size must be positive, got {communication_step_size}"),
        );
        return ERROR;
    }
    if (current_communication_point - ball.time).abs() > SUBSTEP * 1e-6 {
        ball.log(
            DISCARD,
            "logStatusDiscard",
            &format!(
                "Step starts at {current_communication_point} but the ball is at {}",
                ball.time
            ),
        );
        return DISCARD;
    }

    let substeps = (communication_step_size / SUBSTEP).round().max(1.0) as usize;
    let step = communication_step_size / substeps as f64;
    for _ in 0..substeps {
        ball.euler_step(step);
        ball.update_discrete_states();
    }
    ball.time = current_communication_point + communication_step_size;
    OK
}

/// Steps run to completion, so there is never anything to cancel.
///
/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3CancelStep(instance: Instance) -> c_int {
    if ball(instance).is_none() {
        return FATAL;
    }
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3EnterEventMode(instance: Instance) -> c_int {
    if ball(instance).is_none() {
        return FATAL;
    }
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`], `event_info` must be writable.
#[no_mangle]
pub unsafe extern "C" fn fmi3NewDiscreteStates(instance: Instance, event_info: *mut EventInfo) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    let bounced = ball.update_discrete_states();
    if let Some(event_info) = event_info.as_mut() {
        *event_info = EventInfo {
            new_discrete_states_needed: false,
            terminate_simulation: false,
            nominals_of_continuous_states_changed: false,
            values_of_continuous_states_changed: bounced,
            next_event_time_defined: false,
            next_event_time: 0.0,
        };
    }
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3EnterContinuousTimeMode(instance: Instance) -> c_int {
    if ball(instance).is_none() {
        return FATAL;
    }
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`].
#[no_mangle]
pub unsafe extern "C" fn fmi3SetTime(instance: Instance, time: f64) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    ball.time = time;
    OK
}

/// # Safety
///
/// `states` must hold `n_states` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3SetContinuousStates(instance: Instance, states: *const f64, n_states: usize) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    if n_states != N_STATES || states.is_null() {
        ball.log(ERROR, "logStatusError", &format!("Expected {N_STATES} states, got {n_states}"));
        return ERROR;
    }
    ball.states.copy_from_slice(slice(states, n_states));
    OK
}

/// # Safety
///
/// `instance` must come from [`fmi3Instantiate`] and both flags must be writable.
#[no_mangle]
pub unsafe extern "C" fn fmi3CompletedIntegratorStep(
    instance: Instance,
    _no_set_fmu_state_prior_to_current_point: bool,
    enter_event_mode: *mut bool,
    terminate_simulation: *mut bool,
) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    if let Some(enter_event_mode) = enter_event_mode.as_mut() {
        *enter_event_mode = ball.event_indicators()[0] < 0.0;
    }
    if let Some(terminate_simulation) = terminate_simulation.as_mut() {
        *terminate_simulation = false;
    }
    OK
}

unsafe fn copy_reals(instance: Instance, target: *mut f64, n_target: usize, read: fn(&Ball) -> Vec<f64>) -> c_int {
    let Some(ball) = ball(instance) else {
        return FATAL;
    };
    let source = read(ball);
    if n_target != source.len() || target.is_null() {
        ball.log(
            ERROR,
            "logStatusError",
            &format!("Expected an array of {} values, got {n_target}", source.len()),
        );
        return ERROR;
    }
    slice_mut(target, n_target).copy_from_slice(&source);
    OK
}

/// # Safety
///
/// `derivatives` must hold `n_derivatives` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetDerivatives(instance: Instance, derivatives: *mut f64, n_derivatives: usize) -> c_int {
    copy_reals(instance, derivatives, n_derivatives, |ball| ball.derivatives().to_vec())
}

/// # Safety
///
/// `indicators` must hold `n_indicators` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetEventIndicators(instance: Instance, indicators: *mut f64, n_indicators: usize) -> c_int {
    copy_reals(instance, indicators, n_indicators, |ball| ball.event_indicators().to_vec())
}

/// # Safety
///
/// `states` must hold `n_states` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetContinuousStates(instance: Instance, states: *mut f64, n_states: usize) -> c_int {
    copy_reals(instance, states, n_states, |ball| ball.states.to_vec())
}

/// # Safety
///
/// `nominals` must hold `n_nominals` elements.
#[no_mangle]
pub unsafe extern "C" fn fmi3GetNominalsOfContinuousStates(
    instance: Instance,
    nominals: *mut f64,
    n_nominals: usize,
) -> c_int {
    copy_reals(instance, nominals, n_nominals, |_| vec![1.0; N_STATES])
}

/// Exported symbols with their addresses, for registration with an in-process loader.
pub fn entry_points() -> Vec<(&'static str, *const c_void)> {
    vec![
        ("fmi3GetVersion", fmi3GetVersion as *const c_void),
        ("fmi3GetTypesPlatform", fmi3GetTypesPlatform as *const c_void),
        ("fmi3Instantiate", fmi3Instantiate as *const c_void),
        ("fmi3FreeInstance", fmi3FreeInstance as *const c_void),
        ("fmi3SetDebugLogging", fmi3SetDebugLogging as *const c_void),
        ("fmi3SetupExperiment", fmi3SetupExperiment as *const c_void),
        ("fmi3EnterInitializationMode", fmi3EnterInitializationMode as *const c_void),
        ("fmi3ExitInitializationMode", fmi3ExitInitializationMode as *const c_void),
        ("fmi3Terminate", fmi3Terminate as *const c_void),
        ("fmi3Reset", fmi3Reset as *const c_void),
        ("fmi3GetFloat64", fmi3GetFloat64 as *const c_void),
        ("fmi3SetFloat64", fmi3SetFloat64 as *const c_void),
        ("fmi3GetFloat32", fmi3GetFloat32 as *const c_void),
        ("fmi3SetFloat32", fmi3SetFloat32 as *const c_void),
        ("fmi3GetInt32", fmi3GetInt32 as *const c_void),
        ("fmi3SetInt32", fmi3SetInt32 as *const c_void),
        ("fmi3GetBoolean", fmi3GetBoolean as *const c_void),
        ("fmi3SetBoolean", fmi3SetBoolean as *const c_void),
        ("fmi3GetString", fmi3GetString as *const c_void),
        ("fmi3SetString", fmi3SetString as *const c_void),
        ("fmi3DoStep", fmi3DoStep as *const c_void),
        ("fmi3CancelStep", fmi3CancelStep as *const c_void),
        ("fmi3EnterEventMode", fmi3EnterEventMode as *const c_void),
        ("fmi3NewDiscreteStates", fmi3NewDiscreteStates as *const c_void),
        ("fmi3EnterContinuousTimeMode", fmi3EnterContinuousTimeMode as *const c_void),
        ("fmi3SetTime", fmi3SetTime as *const c_void),
        ("fmi3SetContinuousStates", fmi3SetContinuousStates as *const c_void),
        ("fmi3CompletedIntegratorStep", fmi3CompletedIntegratorStep as *const c_void),
        ("fmi3GetDerivatives", fmi3GetDerivatives as *const c_void),
        ("fmi3GetEventIndicators", fmi3GetEventIndicators as *const c_void),
        ("fmi3GetContinuousStates", fmi3GetContinuousStates as *const c_void),
        ("fmi3GetNominalsOfContinuousStates", fmi3GetNominalsOfContinuousStates as *const c_void),
    ]
}
