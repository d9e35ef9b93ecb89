pub mod binding;
pub mod config;
pub mod description;
pub mod expand;
pub mod fmu;
pub mod lifecycle;
pub mod logging;
pub mod status;
pub mod variables;

pub mod errors;

pub use binding::{InProcessLoader, ModuleLoader, Operation, SharedLibraryLoader};
pub use config::ImportConfig;
pub use description::{BaseType, Causality, FmuKind, ModelDescription, ModelVariable, Variability};
pub use errors::{ImportError, ImportResult};
pub use fmu::Fmu;
pub use lifecycle::LifecycleState;
pub use logging::{Callbacks, LogLevel};
pub use status::Status;
