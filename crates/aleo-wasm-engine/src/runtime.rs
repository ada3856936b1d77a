//! Runtime environment: compiles the guest binary once and manufactures
//! isolated sessions from the compiled module.

use crate::error::{Error, Result};
use crate::host::{HostFunctions, HostState};
use crate::session::Session;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use wasmtime::{Engine, Linker, Module, Store};

/// Owner of the compiled guest module and the sandbox configuration.
///
/// The guest binary is compiled exactly once; the compiled module is
/// read-only and shared by every session. Closing the runtime is permanent:
/// no new sessions can be created, and sessions already handed out fail
/// their next operation with [`Error::ModuleClosed`].
pub struct AleoRuntime {
    engine: Engine,
    module: Module,
    linker: Linker<HostState>,
    active: Arc<AtomicBool>,
}

impl fmt::Debug for AleoRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AleoRuntime")
            .field("active", &self.active.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl AleoRuntime {
    /// Compile a guest binary and set up the sandbox around it.
    ///
    /// Registers the `env.host_log_string` diagnostic hook and WASI (which
    /// carries the entropy source the guest draws from). Any compilation or
    /// registration failure is returned as a typed error with no partial
    /// state retained.
    pub fn from_binary(guest: impl AsRef<[u8]>) -> Result<Self> {
        let engine = Engine::default();

        let mut linker = Linker::new(&engine);
        HostFunctions::register(&mut linker)?;

        let module =
            Module::new(&engine, guest.as_ref()).map_err(|e| Error::Wasm(e.to_string()))?;
        debug!("compiled guest WASM module");

        Ok(Self {
            engine,
            module,
            linker,
            active: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Compile a guest binary read from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_binary(bytes)
    }

    /// Instantiate a fresh, independent guest instance.
    ///
    /// Each session gets its own linear memory and globals; nothing is
    /// shared between sessions except the compiled module.
    pub fn new_session(&self) -> Result<Session> {
        if !self.active.load(Ordering::Acquire) {
            return Err(Error::NoRuntime);
        }

        let mut store = Store::new(&self.engine, HostState::new());
        let instance = self
            .linker
            .instantiate(&mut store, &self.module)
            .map_err(|e| Error::Wasm(format!("failed to instantiate guest session: {e}")))?;

        Session::from_instance(store, instance, Arc::clone(&self.active))
    }

    /// Tear down the runtime. Permanent: later [`AleoRuntime::new_session`]
    /// calls fail, as does every operation on sessions created earlier.
    pub fn close(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Whether the runtime can still produce sessions.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
