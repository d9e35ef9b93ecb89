//! Call-order rules of the native interface.
//!
//! A handle moves through the states below. Each operation is legal in a fixed set of
//! states; [`next_state`] is the single place that encodes these rules.
//!
//! ```text
//! Unloaded -> Instantiated -> ExperimentConfigured -> InitializationMode
//!     -> StepMode                          (co-simulation)
//!     -> EventMode <-> ContinuousTimeMode  (model exchange)
//!     -> Terminated -> Freed
//! ```

use crate::binding::Operation;
use crate::description::FmuKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Module tag for lifecycle diagnostics.
pub const MODULE: &str = "FMILIB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Module loaded, no instance yet.
    Unloaded,
    Instantiated,
    ExperimentConfigured,
    InitializationMode,
    EventMode,
    ContinuousTimeMode,
    StepMode,
    Terminated,
    /// Instance released. Nothing can be called anymore.
    Freed,
}

impl LifecycleState {
    /// Whether an instance exists that has not been freed.
    pub fn has_instance(self) -> bool {
        !matches!(self, LifecycleState::Unloaded | LifecycleState::Freed)
    }

    /// States in which the instance has to be terminated before it is freed.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            LifecycleState::EventMode | LifecycleState::ContinuousTimeMode | LifecycleState::StepMode
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// State reached when `operation` succeeds in `state`, or `None` if the operation is not
/// allowed there.
pub fn next_state(state: LifecycleState, operation: Operation, kind: FmuKind) -> Option<LifecycleState> {
    use LifecycleState as S;

    let allowed = |legal: bool, next: LifecycleState| legal.then_some(next);
    match operation {
        Operation::GetVersion | Operation::GetTypesPlatform => allowed(state != S::Freed, state),
        Operation::Instantiate => allowed(state == S::Unloaded, S::Instantiated),
        Operation::SetupExperiment => allowed(state == S::Instantiated, S::ExperimentConfigured),
        Operation::EnterInitializationMode => allowed(state == S::ExperimentConfigured, S::InitializationMode),
        Operation::ExitInitializationMode => {
            let next = match kind {
                FmuKind::CoSimulation => S::StepMode,
                FmuKind::ModelExchange => S::EventMode,
            };
            allowed(state == S::InitializationMode, next)
        }
        Operation::DoStep | Operation::CancelStep => allowed(state == S::StepMode, S::StepMode),
        Operation::EnterEventMode => allowed(
            matches!(state, S::EventMode | S::ContinuousTimeMode),
            S::EventMode,
        ),
        Operation::NewDiscreteStates => allowed(state == S::EventMode, S::EventMode),
        Operation::EnterContinuousTimeMode => allowed(state == S::EventMode, S::ContinuousTimeMode),
        Operation::SetTime => allowed(matches!(state, S::EventMode | S::ContinuousTimeMode), state),
        Operation::SetContinuousStates | Operation::CompletedIntegratorStep => {
            allowed(state == S::ContinuousTimeMode, state)
        }
        Operation::GetDerivatives
        | Operation::GetEventIndicators
        | Operation::GetContinuousStates
        | Operation::GetNominalsOfContinuousStates => allowed(
            matches!(
                state,
                S::InitializationMode | S::EventMode | S::ContinuousTimeMode | S::Terminated
            ),
            state,
        ),
        Operation::Terminate => allowed(state.is_active(), S::Terminated),
        Operation::FreeInstance => allowed(state == S::Terminated, S::Freed),
        Operation::Reset => allowed(state.has_instance(), S::Instantiated),
        Operation::SetDebugLogging
        | Operation::GetFloat64
        | Operation::SetFloat64
        | Operation::GetFloat32
        | Operation::SetFloat32
        | Operation::GetInt32
        | Operation::SetInt32
        | Operation::GetBoolean
        | Operation::SetBoolean
        | Operation::GetString
        | Operation::SetString => allowed(state.has_instance(), state),
    }
}
