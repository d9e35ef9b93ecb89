//! Import runtime for FMI 3 modules.
//!
//! A module is a native shared library exporting the `fmi3*` entry points together with
//! a model description listing its variables. Loading one produces an [`Fmu`] handle
//! that checks every call against the lifecycle of the instance, forwards statuses
//! verbatim and routes the module's log messages to the host with variable references
//! such as `#i3#` replaced by variable names.
//!
//! A typical co-simulation run loads the description, opens the library with a
//! [`SharedLibraryLoader`], instantiates, initialises, calls [`Fmu::do_step`] until the
//! stop time, terminates and finally frees the instance. Modules linked into the host
//! can be registered with an [`InProcessLoader`] instead.
//!
//! Everything lives in `fmi-import-core` and is re-exported here.

pub use fmi_import_core::*;
