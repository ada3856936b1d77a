//! Host functions and per-session state for the guest sandbox.

use crate::error::{Error, Result};
use tracing::debug;
use wasmtime::{Caller, Linker, Memory};
use wasmtime_wasi::preview1::WasiP1Ctx;
use wasmtime_wasi::WasiCtxBuilder;

/// State owned by each session's store.
pub struct HostState {
    /// WASI context providing stdio and the sandbox entropy source.
    pub(crate) wasi: WasiP1Ctx,
}

impl HostState {
    /// Create host state with inherited stdio and an OS-level entropy
    /// source for the guest's key generation and signing nonces.
    pub(crate) fn new() -> Self {
        let wasi = WasiCtxBuilder::new()
            .inherit_stdio()
            .secure_random(rand::rngs::OsRng)
            .build_p1();

        Self { wasi }
    }
}

/// Host functions exposed to the guest module.
pub struct HostFunctions;

impl HostFunctions {
    /// Register WASI and the diagnostic log hook with the linker.
    pub(crate) fn register(linker: &mut Linker<HostState>) -> Result<()> {
        wasmtime_wasi::preview1::add_to_linker_sync(linker, |state: &mut HostState| {
            &mut state.wasi
        })
        .map_err(|e| Error::Wasm(e.to_string()))?;

        linker
            .func_wrap(
                "env",
                "host_log_string",
                |mut caller: Caller<'_, HostState>, ptr: u32, len: u32| {
                    Self::log_string(&mut caller, ptr, len);
                },
            )
            .map_err(|e| Error::Wasm(e.to_string()))?;

        Ok(())
    }

    /// One-way log hook: reads a guest string and emits it as a diagnostic.
    /// Never reports failure back into the guest.
    fn log_string(caller: &mut Caller<'_, HostState>, ptr: u32, len: u32) {
        let Some(memory) = Self::get_memory(caller) else {
            return;
        };

        let mut buf = vec![0u8; len as usize];
        if memory.read(&mut *caller, ptr as usize, &mut buf).is_ok() {
            debug!("guest log: {}", String::from_utf8_lossy(&buf));
        }
    }

    /// Helper: get the memory export from the calling instance.
    fn get_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
        caller.get_export("memory").and_then(|ext| ext.into_memory())
    }
}
