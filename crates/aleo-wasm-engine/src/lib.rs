//! # aleo-wasm-engine
//!
//! Host binding for the Aleo signer WASM guest module.
//!
//! This crate uses [wasmtime](https://wasmtime.dev/) to run the guest binary
//! that implements Aleo-compatible key generation, message formatting,
//! Poseidon hashing, and Schnorr signing. The crate owns the host side of
//! the boundary:
//!
//! - Compiling the guest binary once and instantiating isolated sessions
//! - Marshaling bytes in and out of guest linear memory
//! - Decoding the guest's packed pointer+length results
//! - Converting guest traps into typed errors
//!
//! The cryptography itself lives entirely inside the guest binary; the host
//! never inspects or reimplements it.
//!
//! ## Example
//!
//! ```ignore
//! use aleo_wasm_engine::AleoRuntime;
//!
//! let runtime = AleoRuntime::from_file("aleo_guest.wasm")?;
//! let mut session = runtime.new_session()?;
//!
//! let (key, address) = session.new_private_key()?;
//! let message = session.format_message(b"btc/usd = 1.0", 1)?;
//! let hash = session.hash_message(&message)?;
//! let signature = session.sign(&key, &hash)?;
//! ```
//!
//! Sessions are not safe for concurrent use; create one session per
//! concurrent task. Sessions have independent linear memories and may run
//! in parallel without any cross-session locking.

pub mod error;
pub mod host;
pub mod marshal;
pub mod runtime;
pub mod session;

pub use error::{Error, Result};
pub use host::HostState;
pub use marshal::PackedResult;
pub use runtime::AleoRuntime;
pub use session::Session;

/// Length in bytes of a private key string returned by the guest.
pub const PRIVATE_KEY_SIZE: usize = 59;

/// Length in bytes of an address string returned by the guest.
pub const ADDRESS_SIZE: usize = 63;

/// Length in bytes of a signature string returned by the guest.
pub const SIGNATURE_SIZE: usize = 216;

/// Size in bytes of one message-format block (32 elements of 16 bytes).
pub const MESSAGE_FORMAT_BLOCK_SIZE: usize = 16 * 32;

/// Maximum number of blocks in one formatted message.
pub const MAX_FORMAT_MESSAGE_CHUNKS: usize = 32;
