//! Binding to the entry points of a native module.
//!
//! [`NativeBinding`] owns the opened module together with its [`CallTable`]. The
//! wrappers marshal slices as pointer and length pairs and hand the raw status back
//! unchanged; interpreting it is left to the caller.
//!
//! Wrappers taking an [`Instance`](ffi::Instance) are unsafe: the instance must have
//! been created by the same binding and not freed yet.

pub mod ffi;
mod loader;
mod table;

pub use loader::{InProcessLoader, LoadedModule, ModuleLoader, RawEntry, SharedLibraryLoader};
pub use table::{CallTable, Operation};

use crate::description::FmuKind;
use crate::errors::ImportResult;
use crate::status::RawStatus;
use ffi::{CallbackFunctions, EventInfo, GetFn, Instance, SetFn};
use std::ffi::{c_char, CStr};
use std::fmt;
use std::path::Path;

/// Module tag for binding diagnostics.
pub const MODULE: &str = "FMICAPI";

pub struct NativeBinding {
    table: CallTable,
    // Declared after the table so the module is closed last.
    module: Box<dyn LoadedModule>,
    path: String,
}

impl fmt::Debug for NativeBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBinding")
            .field("path", &self.path)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl NativeBinding {
    /// Open the module at `path` and resolve the entry points needed for `kind`.
    ///
    /// The module is closed again if any mandatory entry point is missing.
    pub fn load(loader: &dyn ModuleLoader, path: &Path, kind: FmuKind) -> ImportResult<Self> {
        let module = loader.open(path)?;
        let table = CallTable::resolve(&*module, kind)?;
        Ok(Self {
            table,
            module,
            path: path.display().to_string(),
        })
    }

    pub fn kind(&self) -> FmuKind {
        self.table.kind()
    }

    pub fn table(&self) -> &CallTable {
        &self.table
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Look up a symbol that is not part of the call table.
    pub fn resolve(&self, symbol: &str) -> Option<RawEntry> {
        self.module.resolve(symbol)
    }

    /// Forget all entry points. The module itself stays open until the binding is dropped.
    pub fn release(&mut self) {
        self.table = CallTable::empty(self.table.kind());
    }

    /// Version string reported by the module.
    pub fn get_version(&self) -> ImportResult<String> {
        let function = self.table.get_version()?;
        Ok(unsafe { owned_string(function()) })
    }

    /// Platform of the module's type definitions, "default" for the standard types.
    pub fn get_types_platform(&self) -> ImportResult<String> {
        let function = self.table.get_types_platform()?;
        Ok(unsafe { owned_string(function()) })
    }

    /// Returns a null instance when the module refuses to instantiate.
    ///
    /// `functions` must stay valid until the instance is freed.
    pub(crate) unsafe fn instantiate(
        &self,
        instance_name: &CStr,
        instantiation_token: &CStr,
        resource_location: &CStr,
        functions: *const CallbackFunctions,
        visible: bool,
        logging_on: bool,
    ) -> ImportResult<Instance> {
        let function = self.table.instantiate()?;
        Ok(function(
            instance_name.as_ptr(),
            self.kind().as_raw(),
            instantiation_token.as_ptr(),
            resource_location.as_ptr(),
            functions,
            visible,
            logging_on,
        ))
    }

    pub(crate) unsafe fn free_instance(&self, instance: Instance) -> ImportResult<()> {
        let function = self.table.free_instance()?;
        function(instance);
        Ok(())
    }

    pub(crate) unsafe fn set_debug_logging(
        &self,
        instance: Instance,
        logging_on: bool,
        categories: &[*const c_char],
    ) -> ImportResult<RawStatus> {
        let function = self.table.set_debug_logging()?;
        Ok(function(instance, logging_on, categories.len(), categories.as_ptr()))
    }

    pub(crate) unsafe fn setup_experiment(
        &self,
        instance: Instance,
        tolerance: Option<f64>,
        start_time: f64,
        stop_time: Option<f64>,
    ) -> ImportResult<RawStatus> {
        let function = self.table.setup_experiment()?;
        Ok(function(
            instance,
            tolerance.is_some(),
            tolerance.unwrap_or_default(),
            start_time,
            stop_time.is_some(),
            stop_time.unwrap_or_default(),
        ))
    }

    pub(crate) unsafe fn enter_initialization_mode(&self, instance: Instance) -> ImportResult<RawStatus> {
        let function = self.table.enter_initialization_mode()?;
        Ok(function(instance))
    }

    pub(crate) unsafe fn exit_initialization_mode(&self, instance: Instance) -> ImportResult<RawStatus> {
        let function = self.table.exit_initialization_mode()?;
        Ok(function(instance))
    }

    pub(crate) unsafe fn terminate(&self, instance: Instance) -> ImportResult<RawStatus> {
        let function = self.table.terminate()?;
        Ok(function(instance))
    }

    pub(crate) unsafe fn reset(&self, instance: Instance) -> ImportResult<RawStatus> {
        let function = self.table.reset()?;
        Ok(function(instance))
    }

    pub(crate) unsafe fn get_float64(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &mut [f64],
    ) -> ImportResult<RawStatus> {
        Ok(get_values(self.table.get_float64()?, instance, value_references, values))
    }

    pub(crate) unsafe fn set_float64(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &[f64],
    ) -> ImportResult<RawStatus> {
        Ok(set_values(self.table.set_float64()?, instance, value_references, values))
    }

    pub(crate) unsafe fn get_float32(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &mut [f32],
    ) -> ImportResult<RawStatus> {
        Ok(get_values(self.table.get_float32()?, instance, value_references, values))
    }

    pub(crate) unsafe fn set_float32(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &[f32],
    ) -> ImportResult<RawStatus> {
        Ok(set_values(self.table.set_float32()?, instance, value_references, values))
    }

    pub(crate) unsafe fn get_int32(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &mut [i32],
    ) -> ImportResult<RawStatus> {
        Ok(get_values(self.table.get_int32()?, instance, value_references, values))
    }

    pub(crate) unsafe fn set_int32(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &[i32],
    ) -> ImportResult<RawStatus> {
        Ok(set_values(self.table.set_int32()?, instance, value_references, values))
    }

    pub(crate) unsafe fn get_boolean(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &mut [bool],
    ) -> ImportResult<RawStatus> {
        Ok(get_values(self.table.get_boolean()?, instance, value_references, values))
    }

    pub(crate) unsafe fn set_boolean(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &[bool],
    ) -> ImportResult<RawStatus> {
        Ok(set_values(self.table.set_boolean()?, instance, value_references, values))
    }

    /// The returned strings are owned by the module and only valid until its next call.
    pub(crate) unsafe fn get_string(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &mut [*const c_char],
    ) -> ImportResult<RawStatus> {
        Ok(get_values(self.table.get_string()?, instance, value_references, values))
    }

    pub(crate) unsafe fn set_string(
        &self,
        instance: Instance,
        value_references: &[u32],
        values: &[*const c_char],
    ) -> ImportResult<RawStatus> {
        Ok(set_values(self.table.set_string()?, instance, value_references, values))
    }

    pub(crate) unsafe fn do_step(
        &self,
        instance: Instance,
        current_communication_point: f64,
        communication_step_size: f64,
        no_set_fmu_state_prior: bool,
    ) -> ImportResult<RawStatus> {
        let function = self.table.do_step()?;
        Ok(function(
            instance,
            current_communication_point,
            communication_step_size,
            no_set_fmu_state_prior,
        ))
    }

    pub(crate) unsafe fn cancel_step(&self, instance: Instance) -> ImportResult<RawStatus> {
        let function = self.table.cancel_step()?;
        Ok(function(instance))
    }

    pub(crate) unsafe fn enter_event_mode(&self, instance: Instance) -> ImportResult<RawStatus> {
        let function = self.table.enter_event_mode()?;
        Ok(function(instance))
    }

    pub(crate) unsafe fn new_discrete_states(
        &self,
        instance: Instance,
        event_info: &mut EventInfo,
    ) -> ImportResult<RawStatus> {
        let function = self.table.new_discrete_states()?;
        Ok(function(instance, event_info))
    }

    pub(crate) unsafe fn enter_continuous_time_mode(&self, instance: Instance) -> ImportResult<RawStatus> {
        let function = self.table.enter_continuous_time_mode()?;
        Ok(function(instance))
    }

    pub(crate) unsafe fn set_time(&self, instance: Instance, time: f64) -> ImportResult<RawStatus> {
        let function = self.table.set_time()?;
        Ok(function(instance, time))
    }

    pub(crate) unsafe fn set_continuous_states(&self, instance: Instance, states: &[f64]) -> ImportResult<RawStatus> {
        let function = self.table.set_continuous_states()?;
        Ok(function(instance, states.as_ptr(), states.len()))
    }

    /// Returns the status followed by the enter-event-mode and terminate-simulation flags.
    pub(crate) unsafe fn completed_integrator_step(
        &self,
        instance: Instance,
        no_set_fmu_state_prior: bool,
    ) -> ImportResult<(RawStatus, bool, bool)> {
        let function = self.table.completed_integrator_step()?;
        let mut enter_event_mode = false;
        let mut terminate_simulation = false;
        let status = function(
            instance,
            no_set_fmu_state_prior,
            &mut enter_event_mode,
            &mut terminate_simulation,
        );
        Ok((status, enter_event_mode, terminate_simulation))
    }

    pub(crate) unsafe fn get_derivatives(&self, instance: Instance, derivatives: &mut [f64]) -> ImportResult<RawStatus> {
        let function = self.table.get_derivatives()?;
        Ok(function(instance, derivatives.as_mut_ptr(), derivatives.len()))
    }

    pub(crate) unsafe fn get_event_indicators(&self, instance: Instance, indicators: &mut [f64]) -> ImportResult<RawStatus> {
        let function = self.table.get_event_indicators()?;
        Ok(function(instance, indicators.as_mut_ptr(), indicators.len()))
    }

    pub(crate) unsafe fn get_continuous_states(&self, instance: Instance, states: &mut [f64]) -> ImportResult<RawStatus> {
        let function = self.table.get_continuous_states()?;
        Ok(function(instance, states.as_mut_ptr(), states.len()))
    }

    pub(crate) unsafe fn get_nominals_of_continuous_states(
        &self,
        instance: Instance,
        nominals: &mut [f64],
    ) -> ImportResult<RawStatus> {
        let function = self.table.get_nominals_of_continuous_states()?;
        Ok(function(instance, nominals.as_mut_ptr(), nominals.len()))
    }
}

unsafe fn get_values<T>(function: GetFn<T>, instance: Instance, value_references: &[u32], values: &mut [T]) -> RawStatus {
    function(
        instance,
        value_references.as_ptr(),
        value_references.len(),
        values.as_mut_ptr(),
        values.len(),
    )
}

unsafe fn set_values<T>(function: SetFn<T>, instance: Instance, value_references: &[u32], values: &[T]) -> RawStatus {
    function(
        instance,
        value_references.as_ptr(),
        value_references.len(),
        values.as_ptr(),
        values.len(),
    )
}

/// Copy a string returned by the module. Null becomes the empty string.
unsafe fn owned_string(ptr: *const c_char) -> String {
    ffi::lossy(ptr).map(|text| text.into_owned()).unwrap_or_default()
}
