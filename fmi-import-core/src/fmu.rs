//! Import handle.
//!
//! An [`Fmu`] ties a model description to a loaded native module and drives one
//! instance of it. Every call is checked against the lifecycle rules before anything is
//! sent to the module; illegal calls are rejected with
//! [`ImportError::InvalidCallSequence`] and leave the handle untouched.
//!
//! Statuses returned by the module are handed back verbatim. The lifecycle only advances
//! on [`Status::Ok`] and [`Status::Warning`], and a [`Status::Fatal`] makes the handle
//! refuse every further call.

use crate::binding::ffi::{self, CallbackFunctions, EventInfo, Instance};
use crate::binding::{self, ModuleLoader, NativeBinding, Operation};
use crate::config::{ImportConfig, InstanceConfig};
use crate::description::{major_version, BaseType, FmuKind, ModelDescription, ModelVariable, ValueReference};
use crate::errors::{ImportError, ImportResult};
use crate::lifecycle::{self, next_state, LifecycleState};
use crate::logging::{Callbacks, LogLevel, LogSink};
use crate::status::{RawStatus, Status};
use crate::variables::{ModelCounts, VariableIndex};
use std::ffi::{c_char, c_void, CString};
use std::fmt;
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;

/// Flags reported by `completed_integrator_step`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegratorStepResult {
    pub enter_event_mode: bool,
    pub terminate_simulation: bool,
}

pub struct Fmu {
    description: Arc<ModelDescription>,
    index: Arc<VariableIndex>,
    /// Shared with the module through `functions`.
    sink: Arc<LogSink>,
    binding: NativeBinding,
    /// Handed to the module on instantiation; its address must not change.
    functions: Box<CallbackFunctions>,
    instance: Option<NonNull<c_void>>,
    instance_name: String,
    instance_config: InstanceConfig,
    state: LifecycleState,
    poisoned: bool,
}

// The instance is only reached through `&mut self`, and the sink is internally locked.
unsafe impl Send for Fmu {}

impl fmt::Debug for Fmu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fmu")
            .field("model_name", &self.description.model_name)
            .field("binding", &self.binding)
            .field("instance_name", &self.instance_name)
            .field("state", &self.state)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}

fn fail(sink: &LogSink, module: &str, err: ImportError) -> ImportError {
    sink.emit(module, LogLevel::Error, &err.to_string());
    err
}

impl Fmu {
    /// Load the module at `path` and bind it for `kind`.
    ///
    /// Fails if the description does not support `kind`, if the description declares a
    /// value reference twice, if a mandatory entry point is missing or if the module
    /// reports a different major interface version than the description.
    pub fn load(
        description: impl Into<Arc<ModelDescription>>,
        loader: &dyn ModuleLoader,
        path: impl AsRef<Path>,
        kind: FmuKind,
        callbacks: Callbacks,
        config: &ImportConfig,
    ) -> ImportResult<Self> {
        let description = description.into();
        if !description.supports(kind) {
            let err = ImportError::UnsupportedKind(kind);
            callbacks.emit(lifecycle::MODULE, LogLevel::Error, &err.to_string());
            return Err(err);
        }
        let index = match VariableIndex::new(description.clone()) {
            Ok(index) => Arc::new(index),
            Err(err) => {
                callbacks.emit(lifecycle::MODULE, LogLevel::Error, &err.to_string());
                return Err(err);
            }
        };

        let allocate_memory = callbacks.allocate_memory;
        let free_memory = callbacks.free_memory;
        let sink = Arc::new(LogSink::new(callbacks, index.clone(), &config.buffer));

        let path = path.as_ref();
        let native = NativeBinding::load(loader, path, kind).map_err(|err| fail(&sink, binding::MODULE, err))?;

        let found = native.get_version().map_err(|err| fail(&sink, binding::MODULE, err))?;
        if major_version(&found) != major_version(&description.fmi_version) {
            return Err(fail(
                &sink,
                binding::MODULE,
                ImportError::VersionMismatch {
                    expected: description.fmi_version.clone(),
                    found,
                },
            ));
        }
        sink.emit(
            lifecycle::MODULE,
            LogLevel::Verbose,
            &format!("Loaded '{}' as {kind}, interface version {found}", path.display()),
        );

        let functions = Box::new(CallbackFunctions {
            logger: Some(ffi::log_forwarding),
            allocate_memory: Some(allocate_memory),
            free_memory: Some(free_memory),
            component_environment: Arc::as_ptr(&sink) as *mut c_void,
        });

        Ok(Self {
            description,
            index,
            sink,
            binding: native,
            functions,
            instance: None,
            instance_name: String::new(),
            instance_config: config.instance,
            state: LifecycleState::Unloaded,
            poisoned: false,
        })
    }

    pub fn description(&self) -> &ModelDescription {
        &self.description
    }

    pub fn index(&self) -> &VariableIndex {
        &self.index
    }

    pub fn kind(&self) -> FmuKind {
        self.binding.kind()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Whether the module reported a fatal error.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Most recent error reported by the import library for this handle.
    pub fn last_error(&self) -> Option<String> {
        self.sink.last_error()
    }

    pub fn model_counts(&self) -> ModelCounts {
        self.index.counts()
    }

    pub fn variable_by_vr(&self, base_type: BaseType, value_reference: ValueReference) -> Option<&ModelVariable> {
        self.index.lookup(base_type, value_reference)
    }

    pub fn get_instantiation_token(&self) -> &str {
        &self.description.instantiation_token
    }

    /// Replace variable references in `message` by variable names.
    ///
    /// The result is cut to at most `max_len - 1` bytes, on a character boundary.
    pub fn expand_variable_references(&self, message: &str, max_len: usize) -> String {
        let mut expanded = self.sink.expand(message);
        let mut len = max_len.saturating_sub(1).min(expanded.len());
        while !expanded.is_char_boundary(len) {
            len -= 1;
        }
        expanded.truncate(len);
        expanded
    }

    pub fn get_version(&self) -> ImportResult<String> {
        self.begin(Operation::GetVersion)?;
        self.binding
            .get_version()
            .map_err(|err| fail(&self.sink, binding::MODULE, err))
    }

    pub fn get_types_platform(&self) -> ImportResult<String> {
        self.begin(Operation::GetTypesPlatform)?;
        self.binding
            .get_types_platform()
            .map_err(|err| fail(&self.sink, binding::MODULE, err))
    }

    /// Create the instance.
    ///
    /// `kind` has to match the kind the module was loaded for. `visible` allows the module
    /// to show its own user interface; whether it logs comes from the configuration given
    /// to [`Fmu::load`].
    pub fn instantiate(
        &mut self,
        instance_name: &str,
        kind: FmuKind,
        resource_location: &str,
        visible: bool,
    ) -> ImportResult<()> {
        let next = self.begin(Operation::Instantiate)?;
        if kind != self.kind() {
            return Err(self.fail(
                lifecycle::MODULE,
                ImportError::KindMismatch {
                    bound: self.kind(),
                    requested: kind,
                },
            ));
        }
        let name = self.c_string("instance_name", instance_name)?;
        let token = self.c_string("instantiation_token", &self.description.instantiation_token)?;
        let resources = self.c_string("resource_location", resource_location)?;

        self.trace(Operation::Instantiate);
        let functions: *const CallbackFunctions = &*self.functions;
        let instance = unsafe {
            self.binding.instantiate(
                &name,
                &token,
                &resources,
                functions,
                visible,
                self.instance_config.logging_on,
            )
        }
        .map_err(|err| self.fail(binding::MODULE, err))?;

        match NonNull::new(instance) {
            Some(instance) => {
                self.instance = Some(instance);
                self.instance_name = instance_name.to_string();
                self.state = next;
                Ok(())
            }
            None => Err(self.fail(
                binding::MODULE,
                ImportError::InstantiationFailed(instance_name.to_string()),
            )),
        }
    }

    pub fn setup_experiment(
        &mut self,
        tolerance: Option<f64>,
        start_time: f64,
        stop_time: Option<f64>,
    ) -> ImportResult<Status> {
        self.call(Operation::SetupExperiment, |binding, instance| unsafe {
            binding.setup_experiment(instance, tolerance, start_time, stop_time)
        })
    }

    pub fn enter_initialization_mode(&mut self) -> ImportResult<Status> {
        self.call(Operation::EnterInitializationMode, |binding, instance| unsafe {
            binding.enter_initialization_mode(instance)
        })
    }

    pub fn exit_initialization_mode(&mut self) -> ImportResult<Status> {
        self.call(Operation::ExitInitializationMode, |binding, instance| unsafe {
            binding.exit_initialization_mode(instance)
        })
    }

    pub fn do_step(
        &mut self,
        current_communication_point: f64,
        communication_step_size: f64,
        no_set_fmu_state_prior: bool,
    ) -> ImportResult<Status> {
        self.call(Operation::DoStep, |binding, instance| unsafe {
            binding.do_step(
                instance,
                current_communication_point,
                communication_step_size,
                no_set_fmu_state_prior,
            )
        })
    }

    pub fn cancel_step(&mut self) -> ImportResult<Status> {
        self.call(Operation::CancelStep, |binding, instance| unsafe {
            binding.cancel_step(instance)
        })
    }

    pub fn enter_event_mode(&mut self) -> ImportResult<Status> {
        self.call(Operation::EnterEventMode, |binding, instance| unsafe {
            binding.enter_event_mode(instance)
        })
    }

    pub fn new_discrete_states(&mut self) -> ImportResult<(Status, EventInfo)> {
        let mut event_info = EventInfo::default();
        let status = self.call(Operation::NewDiscreteStates, |binding, instance| unsafe {
            binding.new_discrete_states(instance, &mut event_info)
        })?;
        Ok((status, event_info))
    }

    pub fn enter_continuous_time_mode(&mut self) -> ImportResult<Status> {
        self.call(Operation::EnterContinuousTimeMode, |binding, instance| unsafe {
            binding.enter_continuous_time_mode(instance)
        })
    }

    pub fn set_time(&mut self, time: f64) -> ImportResult<Status> {
        self.call(Operation::SetTime, |binding, instance| unsafe {
            binding.set_time(instance, time)
        })
    }

    pub fn set_continuous_states(&mut self, states: &[f64]) -> ImportResult<Status> {
        self.call(Operation::SetContinuousStates, |binding, instance| unsafe {
            binding.set_continuous_states(instance, states)
        })
    }

    pub fn completed_integrator_step(
        &mut self,
        no_set_fmu_state_prior: bool,
    ) -> ImportResult<(Status, IntegratorStepResult)> {
        let mut result = IntegratorStepResult::default();
        let status = self.call(Operation::CompletedIntegratorStep, |binding, instance| {
            let (status, enter_event_mode, terminate_simulation) =
                unsafe { binding.completed_integrator_step(instance, no_set_fmu_state_prior)? };
            result = IntegratorStepResult {
                enter_event_mode,
                terminate_simulation,
            };
            Ok(status)
        })?;
        Ok((status, result))
    }

    pub fn get_derivatives(&mut self, derivatives: &mut [f64]) -> ImportResult<Status> {
        self.call(Operation::GetDerivatives, |binding, instance| unsafe {
            binding.get_derivatives(instance, derivatives)
        })
    }

    pub fn get_event_indicators(&mut self, indicators: &mut [f64]) -> ImportResult<Status> {
        self.call(Operation::GetEventIndicators, |binding, instance| unsafe {
            binding.get_event_indicators(instance, indicators)
        })
    }

    pub fn get_continuous_states(&mut self, states: &mut [f64]) -> ImportResult<Status> {
        self.call(Operation::GetContinuousStates, |binding, instance| unsafe {
            binding.get_continuous_states(instance, states)
        })
    }

    pub fn get_nominals_of_continuous_states(&mut self, nominals: &mut [f64]) -> ImportResult<Status> {
        self.call(Operation::GetNominalsOfContinuousStates, |binding, instance| unsafe {
            binding.get_nominals_of_continuous_states(instance, nominals)
        })
    }

    pub fn get_float64(&mut self, value_references: &[ValueReference], values: &mut [f64]) -> ImportResult<Status> {
        self.call(Operation::GetFloat64, |binding, instance| unsafe {
            binding.get_float64(instance, value_references, values)
        })
    }

    pub fn set_float64(&mut self, value_references: &[ValueReference], values: &[f64]) -> ImportResult<Status> {
        self.call(Operation::SetFloat64, |binding, instance| unsafe {
            binding.set_float64(instance, value_references, values)
        })
    }

    pub fn get_float32(&mut self, value_references: &[ValueReference], values: &mut [f32]) -> ImportResult<Status> {
        self.call(Operation::GetFloat32, |binding, instance| unsafe {
            binding.get_float32(instance, value_references, values)
        })
    }

    pub fn set_float32(&mut self, value_references: &[ValueReference], values: &[f32]) -> ImportResult<Status> {
        self.call(Operation::SetFloat32, |binding, instance| unsafe {
            binding.set_float32(instance, value_references, values)
        })
    }

    pub fn get_int32(&mut self, value_references: &[ValueReference], values: &mut [i32]) -> ImportResult<Status> {
        self.call(Operation::GetInt32, |binding, instance| unsafe {
            binding.get_int32(instance, value_references, values)
        })
    }

    pub fn set_int32(&mut self, value_references: &[ValueReference], values: &[i32]) -> ImportResult<Status> {
        self.call(Operation::SetInt32, |binding, instance| unsafe {
            binding.set_int32(instance, value_references, values)
        })
    }

    pub fn get_boolean(&mut self, value_references: &[ValueReference], values: &mut [bool]) -> ImportResult<Status> {
        self.call(Operation::GetBoolean, |binding, instance| unsafe {
            binding.get_boolean(instance, value_references, values)
        })
    }

    pub fn set_boolean(&mut self, value_references: &[ValueReference], values: &[bool]) -> ImportResult<Status> {
        self.call(Operation::SetBoolean, |binding, instance| unsafe {
            binding.set_boolean(instance, value_references, values)
        })
    }

    /// Strings are copied out of the module before returning. Entries of `values` are
    /// only overwritten when the module reports success.
    pub fn get_string(&mut self, value_references: &[ValueReference], values: &mut [String]) -> ImportResult<Status> {
        let mut raw: Vec<*const c_char> = vec![ptr::null(); values.len()];
        let status = self.call(Operation::GetString, |binding, instance| unsafe {
            binding.get_string(instance, value_references, &mut raw)
        })?;
        if status.is_success() {
            for (value, text) in values.iter_mut().zip(&raw) {
                if let Some(text) = unsafe { ffi::lossy(*text) } {
                    *value = text.into_owned();
                }
            }
        }
        Ok(status)
    }

    pub fn set_string(&mut self, value_references: &[ValueReference], values: &[&str]) -> ImportResult<Status> {
        let owned = values
            .iter()
            .map(|value| self.c_string("values", value))
            .collect::<ImportResult<Vec<_>>>()?;
        let pointers: Vec<*const c_char> = owned.iter().map(|value| value.as_ptr()).collect();
        self.call(Operation::SetString, |binding, instance| unsafe {
            binding.set_string(instance, value_references, &pointers)
        })
    }

    /// Enable or disable module logging, optionally restricted to `categories`.
    pub fn set_debug_logging(&mut self, logging_on: bool, categories: &[&str]) -> ImportResult<Status> {
        let owned = categories
            .iter()
            .map(|category| self.c_string("categories", category))
            .collect::<ImportResult<Vec<_>>>()?;
        let pointers: Vec<*const c_char> = owned.iter().map(|category| category.as_ptr()).collect();
        self.call(Operation::SetDebugLogging, |binding, instance| unsafe {
            binding.set_debug_logging(instance, logging_on, &pointers)
        })
    }

    pub fn terminate(&mut self) -> ImportResult<Status> {
        self.call(Operation::Terminate, |binding, instance| unsafe {
            binding.terminate(instance)
        })
    }

    /// Bring the instance back to the state right after instantiation.
    pub fn reset(&mut self) -> ImportResult<Status> {
        self.call(Operation::Reset, |binding, instance| unsafe {
            binding.reset(instance)
        })
    }

    /// Release the instance, its call table and the message buffers.
    ///
    /// Only allowed once the instance is terminated.
    pub fn free_instance(&mut self) -> ImportResult<()> {
        let next = self.begin(Operation::FreeInstance)?;
        self.release_instance()?;
        self.state = next;
        Ok(())
    }

    fn release_instance(&mut self) -> ImportResult<()> {
        self.trace(Operation::FreeInstance);
        let freed = unsafe { self.binding.free_instance(self.raw_instance()) };
        freed.map_err(|err| self.fail(binding::MODULE, err))?;
        self.instance = None;
        self.binding.release();
        self.sink.release_buffers();
        Ok(())
    }

    /// Check that `operation` may be called now, returning the state it leads to.
    fn begin(&self, operation: Operation) -> ImportResult<LifecycleState> {
        if self.poisoned {
            return Err(self.fail(
                lifecycle::MODULE,
                ImportError::Poisoned {
                    operation: operation.symbol(),
                },
            ));
        }
        next_state(self.state, operation, self.kind()).ok_or_else(|| {
            self.fail(
                lifecycle::MODULE,
                ImportError::InvalidCallSequence {
                    operation: operation.symbol(),
                    state: self.state,
                },
            )
        })
    }

    fn call<F>(&mut self, operation: Operation, invoke: F) -> ImportResult<Status>
    where
        F: FnOnce(&NativeBinding, Instance) -> ImportResult<RawStatus>,
    {
        let next = self.begin(operation)?;
        self.trace(operation);
        let raw = invoke(&self.binding, self.raw_instance()).map_err(|err| self.fail(binding::MODULE, err))?;
        let status = self.interpret(operation, raw);
        if status.is_success() {
            self.state = next;
        } else if status == Status::Fatal {
            self.poisoned = true;
            self.sink.emit(
                lifecycle::MODULE,
                LogLevel::Error,
                &format!("{operation} returned a fatal status, the instance can no longer be used"),
            );
        }
        Ok(status)
    }

    fn interpret(&self, operation: Operation, raw: RawStatus) -> Status {
        Status::from_raw(raw).unwrap_or_else(|| {
            self.sink.emit(
                binding::MODULE,
                LogLevel::Error,
                &format!("{operation} returned the unknown status {raw}, treating it as fatal"),
            );
            Status::Fatal
        })
    }

    fn trace(&self, operation: Operation) {
        self.sink
            .emit(binding::MODULE, LogLevel::Verbose, &format!("Calling {operation}"));
    }

    fn fail(&self, module: &str, err: ImportError) -> ImportError {
        fail(&self.sink, module, err)
    }

    fn c_string(&self, argument: &str, value: &str) -> ImportResult<CString> {
        CString::new(value).map_err(|_| {
            self.fail(
                lifecycle::MODULE,
                ImportError::InvalidString {
                    argument: argument.to_string(),
                },
            )
        })
    }

    fn raw_instance(&self) -> Instance {
        self.instance.map_or(ptr::null_mut(), NonNull::as_ptr)
    }
}

impl Drop for Fmu {
    fn drop(&mut self) {
        if self.poisoned || !self.state.has_instance() {
            return;
        }
        if self.state.is_active() {
            match self.terminate() {
                Ok(status) if status.is_success() => {}
                _ => {
                    self.sink.emit(
                        lifecycle::MODULE,
                        LogLevel::Warning,
                        &format!("Instance '{}' could not be terminated and is not freed", self.instance_name),
                    );
                    return;
                }
            }
        }
        if self.release_instance().is_ok() {
            self.state = LifecycleState::Freed;
        }
    }
}
