//! Opening native modules and resolving their symbols.

use crate::errors::{ImportError, ImportResult};
use libloading::Library;
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

/// Address of a resolved entry point, not yet given a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry(NonNull<c_void>);

// Entry points are code addresses, they are never written through.
unsafe impl Send for RawEntry {}
unsafe impl Sync for RawEntry {}

impl RawEntry {
    /// Returns `None` for null addresses.
    pub fn new(address: *const c_void) -> Option<Self> {
        NonNull::new(address as *mut c_void).map(RawEntry)
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }
}

/// A module that has been opened. Dropping it closes the module.
pub trait LoadedModule: Send {
    fn resolve(&self, symbol: &str) -> Option<RawEntry>;
}

/// Strategy for opening modules.
pub trait ModuleLoader {
    fn open(&self, path: &Path) -> ImportResult<Box<dyn LoadedModule>>;
}

/// Loads modules as shared libraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SharedLibraryLoader;

struct SharedLibrary {
    library: Library,
}

impl ModuleLoader for SharedLibraryLoader {
    fn open(&self, path: &Path) -> ImportResult<Box<dyn LoadedModule>> {
        // Opening a library runs its initialisers; the module is trusted at this point.
        let library = unsafe { Library::new(path) }.map_err(|err| ImportError::ModuleLoad {
            path: path.display().to_string(),
            details: err.to_string(),
        })?;
        Ok(Box::new(SharedLibrary { library }))
    }
}

impl LoadedModule for SharedLibrary {
    fn resolve(&self, symbol: &str) -> Option<RawEntry> {
        let entry = unsafe { self.library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) }.ok()?;
        RawEntry::new(*entry as *const c_void)
    }
}

/// Serves modules whose entry points are linked into the host process.
///
/// Each module is registered under a path and described by its symbol table.
#[derive(Default, Clone)]
pub struct InProcessLoader {
    modules: HashMap<PathBuf, Arc<HashMap<String, RawEntry>>>,
}

impl InProcessLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Null addresses are treated as missing symbols.
    pub fn with_module<'a, I>(mut self, path: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, *const c_void)>,
    {
        let symbols = entries
            .into_iter()
            .filter_map(|(name, address)| RawEntry::new(address).map(|entry| (name.to_string(), entry)))
            .collect();
        self.modules.insert(path.into(), Arc::new(symbols));
        self
    }
}

impl fmt::Debug for InProcessLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessLoader")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct InProcessModule {
    symbols: Arc<HashMap<String, RawEntry>>,
}

impl ModuleLoader for InProcessLoader {
    fn open(&self, path: &Path) -> ImportResult<Box<dyn LoadedModule>> {
        let symbols = self.modules.get(path).ok_or_else(|| ImportError::ModuleLoad {
            path: path.display().to_string(),
            details: "no in-process module is registered under this path".to_string(),
        })?;
        Ok(Box::new(InProcessModule {
            symbols: symbols.clone(),
        }))
    }
}

impl LoadedModule for InProcessModule {
    fn resolve(&self, symbol: &str) -> Option<RawEntry> {
        self.symbols.get(symbol).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn answer() -> i32 {
        42
    }

    #[test]
    fn in_process_resolution() {
        let loader = InProcessLoader::new().with_module(
            "answer",
            [
                ("answer", answer as *const c_void),
                ("missing", std::ptr::null()),
            ],
        );
        let module = loader.open(Path::new("answer")).unwrap();

        let entry = module.resolve("answer").unwrap();
        let function: extern "C" fn() -> i32 = unsafe { std::mem::transmute(entry.as_ptr()) };
        assert_eq!(function(), 42);
        assert!(module.resolve("missing").is_none());
        assert!(module.resolve("other").is_none());
    }

    #[test]
    fn unknown_in_process_module() {
        let result = InProcessLoader::new().open(Path::new("nowhere"));
        assert!(matches!(result, Err(ImportError::ModuleLoad { path, .. }) if path == "nowhere"));
    }

    #[test]
    fn missing_shared_library() {
        let result = SharedLibraryLoader.open(Path::new("/does/not/exist/libmodel.so"));
        assert!(matches!(result, Err(ImportError::ModuleLoad { .. })));
    }
}
