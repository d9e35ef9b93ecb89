use crate::description::{BaseType, FmuKind, ValueReference};
use crate::lifecycle::LifecycleState;
use thiserror::Error;

/// Error type for failed import operations.
///
/// Native status codes returned by a module are not errors at this level: they are
/// handed back to the caller verbatim as a [`Status`](crate::status::Status).
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Could not load the native module '{path}': {details}")]
    ModuleLoad { path: String, details: String },
    #[error("Could not find the function '{symbol}' in the native module")]
    MissingEntryPoint { symbol: &'static str },
    #[error("Interface version mismatch. Model description declares {expected}, module reports {found}")]
    VersionMismatch { expected: String, found: String },
    #[error("The model description does not support the {0} kind")]
    UnsupportedKind(FmuKind),
    #[error("The module was loaded for {bound}, it cannot be instantiated as {requested}")]
    KindMismatch { bound: FmuKind, requested: FmuKind },
    #[error("Value reference {value_reference} is declared twice for type {base_type}")]
    DuplicateValueReference {
        base_type: BaseType,
        value_reference: ValueReference,
    },
    #[error("Invalid call sequence: {operation} is not allowed in state {state}")]
    InvalidCallSequence {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("The instance reported a fatal error, {operation} is not allowed anymore")]
    Poisoned { operation: &'static str },
    #[error("The module failed to instantiate '{0}'")]
    InstantiationFailed(String),
    #[error("Argument '{argument}' contains an interior NUL byte")]
    InvalidString { argument: String },
    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, ImportError>`.
pub type ImportResult<T> = Result<T, ImportError>;
