//! Guest sessions: one isolated guest instantiation per session, exposing
//! the signer operations over the marshaling protocol.

use crate::error::{Error, Result};
use crate::host::HostState;
use crate::{
    ADDRESS_SIZE, MAX_FORMAT_MESSAGE_CHUNKS, MESSAGE_FORMAT_BLOCK_SIZE, PRIVATE_KEY_SIZE,
    SIGNATURE_SIZE,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wasmtime::{Instance, Memory, Store, TypedFunc, WasmParams, WasmResults};

/// Typed handles to the guest export surface.
pub(crate) struct GuestFunctions {
    pub(crate) allocate: TypedFunc<u32, u32>,
    pub(crate) deallocate: TypedFunc<(u32, u32), ()>,
    new_private_key: TypedFunc<(), u32>,
    get_address: TypedFunc<(u32, u32), u32>,
    sign: TypedFunc<(u32, u32, u32, u32), u32>,
    hash_message: TypedFunc<(u32, u32), u64>,
    hash_message_bytes: TypedFunc<(u32, u32), u64>,
    format_message: TypedFunc<(u32, u32, u32), u64>,
    recover_message: TypedFunc<(u32, u32), u64>,
}

impl GuestFunctions {
    fn bind(store: &mut Store<HostState>, instance: &Instance) -> Result<Self> {
        Ok(Self {
            allocate: typed(store, instance, "allocate")?,
            deallocate: typed(store, instance, "deallocate")?,
            new_private_key: typed(store, instance, "new_private_key")?,
            get_address: typed(store, instance, "get_address")?,
            sign: typed(store, instance, "sign")?,
            hash_message: typed(store, instance, "hash_message")?,
            hash_message_bytes: typed(store, instance, "hash_message_bytes")?,
            format_message: typed(store, instance, "format_message")?,
            recover_message: typed(store, instance, "formatted_message_to_bytes")?,
        })
    }
}

fn typed<P, R>(
    store: &mut Store<HostState>,
    instance: &Instance,
    name: &str,
) -> Result<TypedFunc<P, R>>
where
    P: WasmParams,
    R: WasmResults,
{
    instance
        .get_typed_func(&mut *store, name)
        .map_err(|e| Error::Wasm(format!("guest export {name}: {e}")))
}

/// One live guest instantiation.
///
/// A session is not safe for concurrent invocation; every operation takes
/// `&mut self`. Callers needing parallelism create one session per
/// concurrent task, since sessions have fully independent linear memories.
pub struct Session {
    pub(crate) store: Store<HostState>,
    pub(crate) memory: Memory,
    pub(crate) funcs: GuestFunctions,
    runtime_active: Arc<AtomicBool>,
    closed: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("closed", &self.closed)
            .field("runtime_active", &self.runtime_active.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Bind the export surface of a freshly instantiated guest module.
    pub(crate) fn from_instance(
        mut store: Store<HostState>,
        instance: Instance,
        runtime_active: Arc<AtomicBool>,
    ) -> Result<Self> {
        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| Error::Wasm("guest module does not export memory".to_string()))?;

        let funcs = GuestFunctions::bind(&mut store, &instance)?;

        Ok(Self {
            store,
            memory,
            funcs,
            runtime_active,
            closed: false,
        })
    }

    /// Generate a new private key, returning its string representation and
    /// the address derived from it.
    pub fn new_private_key(&mut self) -> Result<(String, String)> {
        self.ensure_open()?;

        let key_ptr = self
            .funcs
            .new_private_key
            .call(&mut self.store, ())
            .map_err(|e| Error::InternalFault(e.to_string()))?;

        if key_ptr == 0 {
            return Err(Error::GuestRejected(
                "failed to create new private key".to_string(),
            ));
        }

        // The key buffer stays alive until the address has been derived
        // from it, then both buffers are released in reverse order.
        let result = self.derive_address(key_ptr);
        self.guest_dealloc(key_ptr, PRIVATE_KEY_SIZE as u32);
        result
    }

    fn derive_address(&mut self, key_ptr: u32) -> Result<(String, String)> {
        let key_bytes = self.read_guest(key_ptr, PRIVATE_KEY_SIZE as u32)?;
        let key = into_string(key_bytes)?;

        // Reuse the guest's own key buffer, no re-allocation needed.
        let addr_ptr = self
            .funcs
            .get_address
            .call(&mut self.store, (key_ptr, PRIVATE_KEY_SIZE as u32))
            .map_err(|e| Error::InternalFault(e.to_string()))?;

        let addr_bytes = self.copy_fixed_out(
            addr_ptr,
            ADDRESS_SIZE as u32,
            "internal error when getting address from the generated private key",
        )?;
        let address = into_string(addr_bytes)?;

        Ok((key, address))
    }

    /// Format a byte message as a struct literal of `target_chunks` chunks
    /// of 32 u128 numbers. The message is zero-padded to
    /// `target_chunks * 512` bytes; the returned value is the string
    /// representation of that struct, as bytes.
    pub fn format_message(&mut self, message: &[u8], target_chunks: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;

        if !(1..=MAX_FORMAT_MESSAGE_CHUNKS).contains(&target_chunks) {
            return Err(Error::InvalidInput(
                "target number of chunks must be between 1 and 32".to_string(),
            ));
        }

        let max_len = target_chunks * MESSAGE_FORMAT_BLOCK_SIZE;
        if message.len() > max_len {
            return Err(Error::InvalidInput(format!(
                "message length must be at most {max_len} ({target_chunks} chunks)"
            )));
        }

        let mut formatted = self.with_input_buffer(message, |s, ptr, len| {
            let raw = s
                .funcs
                .format_message
                .call(&mut s.store, (ptr, len, target_chunks as u32))
                .map_err(|e| Error::InternalFault(e.to_string()))?;

            s.copy_packed_out(raw, "invalid message")
        })?;

        // The guest pretty-printer inserts newlines into the literal.
        formatted.retain(|b| *b != b'\n');

        Ok(formatted)
    }

    /// Recover the original byte message from a formatted message created
    /// by [`Session::format_message`]. The result carries the zero padding
    /// of the formatted encoding.
    pub fn recover_message(&mut self, formatted_message: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open()?;

        self.with_input_buffer(formatted_message, |s, ptr, len| {
            let raw = s
                .funcs
                .recover_message
                .call(&mut s.store, (ptr, len))
                .map_err(|e| Error::InternalFault(e.to_string()))?;

            s.copy_packed_out(raw, "invalid message")
        })
    }

    /// Hash a formatted message, returning the little-endian byte
    /// representation of the resulting field element.
    pub fn hash_message(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open()?;

        self.with_input_buffer(message, |s, ptr, len| {
            let raw = s
                .funcs
                .hash_message_bytes
                .call(&mut s.store, (ptr, len))
                .map_err(|e| Error::InternalFault(e.to_string()))?;

            s.copy_packed_out(raw, "invalid message")
        })
    }

    /// Hash a formatted message, returning the base-10 literal
    /// representation of the resulting field element.
    ///
    /// Use this variant when the hash is needed as a literal, for example
    /// inside a contract.
    pub fn hash_message_to_string(&mut self, message: &[u8]) -> Result<String> {
        self.ensure_open()?;

        let bytes = self.with_input_buffer(message, |s, ptr, len| {
            let raw = s
                .funcs
                .hash_message
                .call(&mut s.store, (ptr, len))
                .map_err(|e| Error::InternalFault(e.to_string()))?;

            s.copy_packed_out(raw, "invalid message")
        })?;

        into_string(bytes)
    }

    /// Create a Schnorr signature over `message` with `key`, returning the
    /// signature's string representation.
    ///
    /// The key must be exactly [`PRIVATE_KEY_SIZE`] bytes. The message is
    /// passed to the guest as-is; it is expected to be the little-endian
    /// byte representation of a hashed message.
    pub fn sign(&mut self, key: &str, message: &[u8]) -> Result<String> {
        self.ensure_open()?;

        if key.len() != PRIVATE_KEY_SIZE {
            return Err(Error::InvalidInput(
                "invalid private key size".to_string(),
            ));
        }

        let signature = self.with_input_buffer(message, |s, msg_ptr, msg_len| {
            s.with_input_buffer(key.as_bytes(), |s, key_ptr, key_len| {
                let sig_ptr = s
                    .funcs
                    .sign
                    .call(&mut s.store, (key_ptr, key_len, msg_ptr, msg_len))
                    .map_err(|e| Error::InternalFault(e.to_string()))?;

                s.copy_fixed_out(
                    sig_ptr,
                    SIGNATURE_SIZE as u32,
                    "internal error when signing message",
                )
            })
        })?;

        into_string(signature)
    }

    /// Close the session. Every subsequent operation fails with
    /// [`Error::ModuleClosed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Guard run at the top of every operation: the session must be open
    /// and its runtime still active before guest memory is touched.
    fn ensure_open(&self) -> Result<()> {
        if self.closed || !self.runtime_active.load(Ordering::Acquire) {
            return Err(Error::ModuleClosed);
        }

        Ok(())
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|_| Error::InternalFault("guest returned a non-UTF-8 string".to_string()))
}
