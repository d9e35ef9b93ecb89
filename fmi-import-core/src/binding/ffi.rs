//! Raw types of the native interface.
//!
//! These mirror the declarations of the FMI 3 draft headers. `fmi3Boolean` is a C99
//! `bool` and maps onto Rust's `bool`; `fmi3Status` and `fmi3InterfaceType` are plain
//! C enums passed as `int`.
//!
//! The logger callback of the headers is variadic. Variadic functions cannot be defined
//! in stable Rust, so modules hand over fully rendered messages instead of a format
//! string and arguments.

use crate::logging::{forward, LogMessage, LogSink};
use crate::status::RawStatus;
use std::borrow::Cow;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Opaque instance pointer returned by `fmi3Instantiate`.
pub type Instance = *mut c_void;

/// Opaque pointer handed back to the host in every callback.
pub type ComponentEnvironment = *mut c_void;

pub type LoggerCallback = unsafe extern "C" fn(
    environment: ComponentEnvironment,
    instance_name: *const c_char,
    status: RawStatus,
    category: *const c_char,
    message: *const c_char,
);

pub type AllocateMemoryCallback =
    unsafe extern "C" fn(environment: ComponentEnvironment, n_obj: usize, size: usize) -> *mut c_void;

pub type FreeMemoryCallback = unsafe extern "C" fn(environment: ComponentEnvironment, obj: *mut c_void);

/// Callback set passed to `fmi3Instantiate`.
///
/// The module keeps the pointer to this struct for the lifetime of the instance.
#[repr(C)]
#[derive(Debug)]
pub struct CallbackFunctions {
    pub logger: Option<LoggerCallback>,
    pub allocate_memory: Option<AllocateMemoryCallback>,
    pub free_memory: Option<FreeMemoryCallback>,
    pub component_environment: ComponentEnvironment,
}

/// Event information filled in by `fmi3NewDiscreteStates`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventInfo {
    pub new_discrete_states_needed: bool,
    pub terminate_simulation: bool,
    pub nominals_of_continuous_states_changed: bool,
    pub values_of_continuous_states_changed: bool,
    pub next_event_time_defined: bool,
    pub next_event_time: f64,
}

pub type GetVersionFn = unsafe extern "C" fn() -> *const c_char;
pub type GetTypesPlatformFn = unsafe extern "C" fn() -> *const c_char;
pub type InstantiateFn = unsafe extern "C" fn(
    instance_name: *const c_char,
    fmu_type: c_int,
    instantiation_token: *const c_char,
    resource_location: *const c_char,
    functions: *const CallbackFunctions,
    visible: bool,
    logging_on: bool,
) -> Instance;
pub type FreeInstanceFn = unsafe extern "C" fn(instance: Instance);
pub type SetDebugLoggingFn = unsafe extern "C" fn(
    instance: Instance,
    logging_on: bool,
    n_categories: usize,
    categories: *const *const c_char,
) -> RawStatus;
pub type SetupExperimentFn = unsafe extern "C" fn(
    instance: Instance,
    tolerance_defined: bool,
    tolerance: f64,
    start_time: f64,
    stop_time_defined: bool,
    stop_time: f64,
) -> RawStatus;
/// Entry points taking nothing but the instance.
pub type InstanceFn = unsafe extern "C" fn(instance: Instance) -> RawStatus;

pub type GetFn<T> = unsafe extern "C" fn(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *mut T,
    n_values: usize,
) -> RawStatus;
pub type SetFn<T> = unsafe extern "C" fn(
    instance: Instance,
    value_references: *const u32,
    n_value_references: usize,
    values: *const T,
    n_values: usize,
) -> RawStatus;
pub type GetStringFn = GetFn<*const c_char>;
pub type SetStringFn = SetFn<*const c_char>;

pub type DoStepFn = unsafe extern "C" fn(
    instance: Instance,
    current_communication_point: f64,
    communication_step_size: f64,
    no_set_fmu_state_prior_to_current_point: bool,
) -> RawStatus;

pub type NewDiscreteStatesFn = unsafe extern "C" fn(instance: Instance, event_info: *mut EventInfo) -> RawStatus;
pub type SetTimeFn = unsafe extern "C" fn(instance: Instance, time: f64) -> RawStatus;
pub type SetRealsFn = unsafe extern "C" fn(instance: Instance, values: *const f64, n_values: usize) -> RawStatus;
pub type GetRealsFn = unsafe extern "C" fn(instance: Instance, values: *mut f64, n_values: usize) -> RawStatus;
pub type CompletedIntegratorStepFn = unsafe extern "C" fn(
    instance: Instance,
    no_set_fmu_state_prior_to_current_point: bool,
    enter_event_mode: *mut bool,
    terminate_simulation: *mut bool,
) -> RawStatus;

/// Zero-initialised allocation through the C allocator.
///
/// # Safety
///
/// The returned pointer must be released with [`default_free_memory`].
pub unsafe extern "C" fn default_allocate_memory(
    _environment: ComponentEnvironment,
    n_obj: usize,
    size: usize,
) -> *mut c_void {
    libc::calloc(n_obj, size)
}

/// # Safety
///
/// `obj` must be null or come from [`default_allocate_memory`].
pub unsafe extern "C" fn default_free_memory(_environment: ComponentEnvironment, obj: *mut c_void) {
    libc::free(obj)
}

/// Logger callback given to every instance.
///
/// `environment` is either null or points at the [`LogSink`] of the handle that
/// instantiated the module. Panics raised while forwarding are swallowed, they must not
/// unwind into native code.
///
/// # Safety
///
/// The string arguments must be null or valid NUL-terminated strings, and a non-null
/// `environment` must point at a live [`LogSink`].
pub unsafe extern "C" fn log_forwarding(
    environment: ComponentEnvironment,
    instance_name: *const c_char,
    status: RawStatus,
    category: *const c_char,
    message: *const c_char,
) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let sink = (environment as *const LogSink).as_ref();
        let instance_name = lossy(instance_name).unwrap_or(Cow::Borrowed(""));
        let category = lossy(category);
        let message = lossy(message).unwrap_or(Cow::Borrowed(""));
        forward(
            sink,
            &instance_name,
            status,
            category.as_deref(),
            LogMessage::Rendered(&message),
        );
    }));
}

/// Borrow a C string, replacing invalid UTF-8. Returns `None` for null pointers.
///
/// # Safety
///
/// `ptr` must be null or point at a NUL-terminated string that outlives the result.
pub(crate) unsafe fn lossy<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferConfig;
    use crate::description::{BaseType, Causality, FmuKind, ModelDescription, ModelVariable, Variability};
    use crate::logging::{Callbacks, LogLevel, MemoryLogger};
    use crate::variables::VariableIndex;
    use std::ffi::CString;
    use std::ptr;
    use std::sync::Arc;

    #[test]
    fn default_allocator_zeroes() {
        unsafe {
            let ptr = default_allocate_memory(ptr::null_mut(), 4, std::mem::size_of::<u64>()) as *mut u64;
            assert!(!ptr.is_null());
            assert_eq!(std::slice::from_raw_parts(ptr, 4), &[0, 0, 0, 0]);
            default_free_memory(ptr::null_mut(), ptr as *mut c_void);
        }
    }

    #[test]
    fn trampoline_forwards_to_sink() {
        let description = ModelDescription::new("Ball", "3.0", "", vec![FmuKind::CoSimulation]).with_variable(
            ModelVariable::new("bounces", 0, BaseType::Int, Causality::Output, Variability::Discrete),
        );
        let index = Arc::new(VariableIndex::new(Arc::new(description)).unwrap());
        let logger = Arc::new(MemoryLogger::new());
        let sink = LogSink::new(
            Callbacks::new(logger.clone(), LogLevel::All),
            index,
            &BufferConfig::default(),
        );

        let name = CString::new("ball").unwrap();
        let category = CString::new("logEvents").unwrap();
        let message = CString::new("#i0# increased").unwrap();
        unsafe {
            log_forwarding(
                &sink as *const LogSink as *mut c_void,
                name.as_ptr(),
                1,
                category.as_ptr(),
                message.as_ptr(),
            );
            log_forwarding(
                &sink as *const LogSink as *mut c_void,
                ptr::null(),
                0,
                ptr::null(),
                ptr::null(),
            );
        }

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].module, "ball");
        assert_eq!(records[0].level, LogLevel::Warning);
        assert_eq!(
            records[0].message,
            "[logEvents][FMU status:Warning] bounces increased"
        );
        assert_eq!(records[1].message, "[FMU status:OK] ");
    }
}
