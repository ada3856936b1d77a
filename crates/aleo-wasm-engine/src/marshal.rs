//! Memory marshaling protocol between the host and the guest.
//!
//! Every byte crossing the boundary goes through the helpers in this module.
//! Guest allocations are scoped to the operation that created them and
//! released on every exit path, and packed pointer+length results are
//! decoded into [`PackedResult`] immediately at the boundary; the raw
//! integer never travels further.

use crate::error::{Error, Result};
use crate::session::Session;
use tracing::warn;

/// A decoded pointer+length result returned by data-producing guest exports.
///
/// The guest packs the byte length into the high 32 bits and the guest
/// memory offset into the low 32 bits of one 64-bit value. A raw `0` is the
/// rejection marker and decodes to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedResult {
    /// Offset of the result in guest linear memory.
    pub ptr: u32,
    /// Length of the result in bytes.
    pub len: u32,
}

impl PackedResult {
    /// Decode a raw packed value, `None` for the rejection marker.
    pub fn decode(raw: u64) -> Option<Self> {
        if raw == 0 {
            return None;
        }

        Some(Self {
            ptr: raw as u32,
            len: (raw >> 32) as u32,
        })
    }
}

impl Session {
    /// Allocate `size` bytes in guest memory.
    pub(crate) fn guest_alloc(&mut self, size: u32) -> Result<u32> {
        let ptr = self
            .funcs
            .allocate
            .call(&mut self.store, size)
            .map_err(|e| Error::Allocation(e.to_string()))?;

        if ptr == 0 {
            return Err(Error::Allocation(format!(
                "guest allocator returned null for {size} bytes"
            )));
        }

        Ok(ptr)
    }

    /// Release a guest buffer. Best-effort: a deallocate that faults is
    /// logged and swallowed so the operation's own outcome wins.
    pub(crate) fn guest_dealloc(&mut self, ptr: u32, size: u32) {
        if let Err(e) = self.funcs.deallocate.call(&mut self.store, (ptr, size)) {
            warn!("guest deallocate({ptr}, {size}) failed: {e}");
        }
    }

    /// Write host bytes into guest memory at `ptr`.
    pub(crate) fn write_guest(&mut self, ptr: u32, bytes: &[u8]) -> Result<()> {
        self.memory
            .write(&mut self.store, ptr as usize, bytes)
            .map_err(|e| Error::MemoryAccess(e.to_string()))
    }

    /// Copy `len` bytes out of guest memory into a host-owned buffer.
    ///
    /// Guest memory contents are not stable after release or the next guest
    /// call, so callers must copy before releasing.
    pub(crate) fn read_guest(&mut self, ptr: u32, len: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len as usize];
        self.memory
            .read(&self.store, ptr as usize, &mut buf)
            .map_err(|e| Error::MemoryAccess(e.to_string()))?;

        Ok(buf)
    }

    /// Scoped input buffer: allocate, write `bytes`, run `f`, and release
    /// the buffer on every exit path, including faults raised inside `f`.
    pub(crate) fn with_input_buffer<T>(
        &mut self,
        bytes: &[u8],
        f: impl FnOnce(&mut Self, u32, u32) -> Result<T>,
    ) -> Result<T> {
        let len = bytes.len() as u32;
        let ptr = self.guest_alloc(len)?;

        let result = match self.write_guest(ptr, bytes) {
            Ok(()) => f(&mut *self, ptr, len),
            Err(e) => Err(e),
        };

        self.guest_dealloc(ptr, len);
        result
    }

    /// Decode a raw packed result, copy the region out, and release it on
    /// every path. The rejection marker maps to [`Error::GuestRejected`]
    /// with the message `reject`.
    pub(crate) fn copy_packed_out(&mut self, raw: u64, reject: &str) -> Result<Vec<u8>> {
        let packed = PackedResult::decode(raw)
            .ok_or_else(|| Error::GuestRejected(reject.to_string()))?;

        let result = self.read_guest(packed.ptr, packed.len);
        self.guest_dealloc(packed.ptr, packed.len);
        result
    }

    /// Copy a fixed-size guest result out and release it on every path. A
    /// null pointer maps to [`Error::GuestRejected`] with the message
    /// `reject`.
    pub(crate) fn copy_fixed_out(&mut self, ptr: u32, size: u32, reject: &str) -> Result<Vec<u8>> {
        if ptr == 0 {
            return Err(Error::GuestRejected(reject.to_string()));
        }

        let result = self.read_guest(ptr, size);
        self.guest_dealloc(ptr, size);
        result
    }
}
