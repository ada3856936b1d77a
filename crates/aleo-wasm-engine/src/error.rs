use thiserror::Error;

/// Errors from the Aleo guest binding.
#[derive(Error, Debug)]
pub enum Error {
    /// The session's guest module is closed, or its runtime was torn down.
    #[error("session module is closed")]
    ModuleClosed,

    /// The runtime was closed and can no longer produce sessions.
    #[error("no runtime, create a new runtime")]
    NoRuntime,

    /// The guest allocator failed or trapped.
    #[error("guest allocation failed: {0}")]
    Allocation(String),

    /// A read or write crossed guest memory bounds.
    #[error("guest memory access failed: {0}")]
    MemoryAccess(String),

    /// Host-side validation rejected the call before crossing the boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The guest returned a zero result, rejecting the input.
    #[error("guest rejected input: {0}")]
    GuestRejected(String),

    /// A guest-side trap or abort was intercepted during a call.
    #[error("guest fault: {0}")]
    InternalFault(String),

    /// WASM compilation, linking, or instantiation error.
    #[error("WASM error: {0}")]
    Wasm(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for aleo-wasm-engine operations.
pub type Result<T> = std::result::Result<T, Error>;
