//! Operations of the native interface and the table of their resolved entry points.

use super::ffi;
use super::loader::{LoadedModule, RawEntry};
use crate::description::FmuKind;
use crate::errors::{ImportError, ImportResult};
use std::ffi::c_void;
use std::fmt;

/// Logical operation of the native interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetVersion,
    GetTypesPlatform,
    Instantiate,
    FreeInstance,
    SetDebugLogging,
    SetupExperiment,
    EnterInitializationMode,
    ExitInitializationMode,
    Terminate,
    Reset,
    GetFloat64,
    SetFloat64,
    GetFloat32,
    SetFloat32,
    GetInt32,
    SetInt32,
    GetBoolean,
    SetBoolean,
    GetString,
    SetString,
    // Co-simulation
    DoStep,
    CancelStep,
    // Model exchange
    EnterEventMode,
    NewDiscreteStates,
    EnterContinuousTimeMode,
    SetTime,
    SetContinuousStates,
    CompletedIntegratorStep,
    GetDerivatives,
    GetEventIndicators,
    GetContinuousStates,
    GetNominalsOfContinuousStates,
}

impl Operation {
    pub const COUNT: usize = 32;

    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::GetVersion,
        Operation::GetTypesPlatform,
        Operation::Instantiate,
        Operation::FreeInstance,
        Operation::SetDebugLogging,
        Operation::SetupExperiment,
        Operation::EnterInitializationMode,
        Operation::ExitInitializationMode,
        Operation::Terminate,
        Operation::Reset,
        Operation::GetFloat64,
        Operation::SetFloat64,
        Operation::GetFloat32,
        Operation::SetFloat32,
        Operation::GetInt32,
        Operation::SetInt32,
        Operation::GetBoolean,
        Operation::SetBoolean,
        Operation::GetString,
        Operation::SetString,
        Operation::DoStep,
        Operation::CancelStep,
        Operation::EnterEventMode,
        Operation::NewDiscreteStates,
        Operation::EnterContinuousTimeMode,
        Operation::SetTime,
        Operation::SetContinuousStates,
        Operation::CompletedIntegratorStep,
        Operation::GetDerivatives,
        Operation::GetEventIndicators,
        Operation::GetContinuousStates,
        Operation::GetNominalsOfContinuousStates,
    ];

    /// Name of the exported function.
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::GetVersion => "fmi3GetVersion",
            Operation::GetTypesPlatform => "fmi3GetTypesPlatform",
            Operation::Instantiate => "fmi3Instantiate",
            Operation::FreeInstance => "fmi3FreeInstance",
            Operation::SetDebugLogging => "fmi3SetDebugLogging",
            Operation::SetupExperiment => "fmi3SetupExperiment",
            Operation::EnterInitializationMode => "fmi3EnterInitializationMode",
            Operation::ExitInitializationMode => "fmi3ExitInitializationMode",
            Operation::Terminate => "fmi3Terminate",
            Operation::Reset => "fmi3Reset",
            Operation::GetFloat64 => "fmi3GetFloat64",
            Operation::SetFloat64 => "fmi3SetFloat64",
            Operation::GetFloat32 => "fmi3GetFloat32",
            Operation::SetFloat32 => "fmi3SetFloat32",
            Operation::GetInt32 => "fmi3GetInt32",
            Operation::SetInt32 => "fmi3SetInt32",
            Operation::GetBoolean => "fmi3GetBoolean",
            Operation::SetBoolean => "fmi3SetBoolean",
            Operation::GetString => "fmi3GetString",
            Operation::SetString => "fmi3SetString",
            Operation::DoStep => "fmi3DoStep",
            Operation::CancelStep => "fmi3CancelStep",
            Operation::EnterEventMode => "fmi3EnterEventMode",
            Operation::NewDiscreteStates => "fmi3NewDiscreteStates",
            Operation::EnterContinuousTimeMode => "fmi3EnterContinuousTimeMode",
            Operation::SetTime => "fmi3SetTime",
            Operation::SetContinuousStates => "fmi3SetContinuousStates",
            Operation::CompletedIntegratorStep => "fmi3CompletedIntegratorStep",
            Operation::GetDerivatives => "fmi3GetDerivatives",
            Operation::GetEventIndicators => "fmi3GetEventIndicators",
            Operation::GetContinuousStates => "fmi3GetContinuousStates",
            Operation::GetNominalsOfContinuousStates => "fmi3GetNominalsOfContinuousStates",
        }
    }

    /// Kind the operation belongs to, `None` for operations common to both kinds.
    pub fn kind(self) -> Option<FmuKind> {
        match self {
            Operation::DoStep | Operation::CancelStep => Some(FmuKind::CoSimulation),
            Operation::EnterEventMode
            | Operation::NewDiscreteStates
            | Operation::EnterContinuousTimeMode
            | Operation::SetTime
            | Operation::SetContinuousStates
            | Operation::CompletedIntegratorStep
            | Operation::GetDerivatives
            | Operation::GetEventIndicators
            | Operation::GetContinuousStates
            | Operation::GetNominalsOfContinuousStates => Some(FmuKind::ModelExchange),
            _ => None,
        }
    }

    /// Whether a module may leave the operation out.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            Operation::SetDebugLogging
                | Operation::Reset
                | Operation::CancelStep
                | Operation::GetEventIndicators
                | Operation::GetNominalsOfContinuousStates
        )
    }

    pub fn applies_to(self, kind: FmuKind) -> bool {
        self.kind().map_or(true, |own| own == kind)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Resolved entry points of one module, fixed at load time.
#[derive(Debug, Clone)]
pub struct CallTable {
    kind: FmuKind,
    entries: [Option<RawEntry>; Operation::COUNT],
}

impl CallTable {
    /// Resolve every operation that applies to `kind`.
    ///
    /// Fails on the first missing entry that is not optional.
    pub fn resolve(module: &dyn LoadedModule, kind: FmuKind) -> ImportResult<Self> {
        let mut entries = [None; Operation::COUNT];
        for operation in Operation::ALL.into_iter().filter(|op| op.applies_to(kind)) {
            let entry = module.resolve(operation.symbol());
            if entry.is_none() && !operation.is_optional() {
                return Err(ImportError::MissingEntryPoint {
                    symbol: operation.symbol(),
                });
            }
            entries[operation as usize] = entry;
        }
        Ok(Self { kind, entries })
    }

    /// A table without entries.
    pub fn empty(kind: FmuKind) -> Self {
        Self {
            kind,
            entries: [None; Operation::COUNT],
        }
    }

    pub fn kind(&self) -> FmuKind {
        self.kind
    }

    pub fn get(&self, operation: Operation) -> Option<RawEntry> {
        self.entries[operation as usize]
    }

    pub fn is_present(&self, operation: Operation) -> bool {
        self.get(operation).is_some()
    }

    /// Operations that were looked up but are absent.
    pub fn absent(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| op.applies_to(self.kind) && !self.is_present(*op))
            .collect()
    }

    fn require(&self, operation: Operation) -> ImportResult<*const c_void> {
        self.get(operation)
            .map(RawEntry::as_ptr)
            .ok_or(ImportError::MissingEntryPoint {
                symbol: operation.symbol(),
            })
    }
}

/// Typed accessors, one per operation.
///
/// Each entry was resolved under the symbol of its operation, whose signature is the
/// function type given here.
macro_rules! typed_entries {
    ($($name:ident: $operation:ident => $signature:ty;)*) => {
        impl CallTable {
            $(
                pub(crate) fn $name(&self) -> ImportResult<$signature> {
                    let address = self.require(Operation::$operation)?;
                    Ok(unsafe { std::mem::transmute::<*const c_void, $signature>(address) })
                }
            )*
        }
    };
}

typed_entries! {
    get_version: GetVersion => ffi::GetVersionFn;
    get_types_platform: GetTypesPlatform => ffi::GetTypesPlatformFn;
    instantiate: Instantiate => ffi::InstantiateFn;
    free_instance: FreeInstance => ffi::FreeInstanceFn;
    set_debug_logging: SetDebugLogging => ffi::SetDebugLoggingFn;
    setup_experiment: SetupExperiment => ffi::SetupExperimentFn;
    enter_initialization_mode: EnterInitializationMode => ffi::InstanceFn;
    exit_initialization_mode: ExitInitializationMode => ffi::InstanceFn;
    terminate: Terminate => ffi::InstanceFn;
    reset: Reset => ffi::InstanceFn;
    get_float64: GetFloat64 => ffi::GetFn<f64>;
    set_float64: SetFloat64 => ffi::SetFn<f64>;
    get_float32: GetFloat32 => ffi::GetFn<f32>;
    set_float32: SetFloat32 => ffi::SetFn<f32>;
    get_int32: GetInt32 => ffi::GetFn<i32>;
    set_int32: SetInt32 => ffi::SetFn<i32>;
    get_boolean: GetBoolean => ffi::GetFn<bool>;
    set_boolean: SetBoolean => ffi::SetFn<bool>;
    get_string: GetString => ffi::GetStringFn;
    set_string: SetString => ffi::SetStringFn;
    do_step: DoStep => ffi::DoStepFn;
    cancel_step: CancelStep => ffi::InstanceFn;
    enter_event_mode: EnterEventMode => ffi::InstanceFn;
    new_discrete_states: NewDiscreteStates => ffi::NewDiscreteStatesFn;
    enter_continuous_time_mode: EnterContinuousTimeMode => ffi::InstanceFn;
    set_time: SetTime => ffi::SetTimeFn;
    set_continuous_states: SetContinuousStates => ffi::SetRealsFn;
    completed_integrator_step: CompletedIntegratorStep => ffi::CompletedIntegratorStepFn;
    get_derivatives: GetDerivatives => ffi::GetRealsFn;
    get_event_indicators: GetEventIndicators => ffi::GetRealsFn;
    get_continuous_states: GetContinuousStates => ffi::GetRealsFn;
    get_nominals_of_continuous_states: GetNominalsOfContinuousStates => ffi::GetRealsFn;
}
