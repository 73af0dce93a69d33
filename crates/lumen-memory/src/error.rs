//! Error types for the memory model.

use thiserror::Error;

use crate::ResidencyKind;

/// Errors raised by owning containers and copy primitives.
///
/// The raw allocation primitives never return this; they report failure
/// as a null pointer.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// The allocator could not satisfy a request.
    #[error("out of {residency} memory allocating {bytes} bytes")]
    OutOfMemory {
        /// Requested size.
        bytes: usize,
        /// Where the allocation was attempted.
        residency: ResidencyKind,
    },

    /// A copy touched a null pointer.
    #[error("null {0} pointer")]
    NullPointer(ResidencyKind),

    /// Source and destination disagree on element count.
    #[error("length mismatch: destination holds {dst} elements, source holds {src}")]
    LengthMismatch {
        /// Destination element count.
        dst: usize,
        /// Source element count.
        src: usize,
    },

    /// An accelerator transfer was not 4-byte aligned.
    #[error("misaligned accelerator transfer: offset {offset}, size {bytes}")]
    Misaligned {
        /// Byte offset into the allocation.
        offset: u64,
        /// Transfer size.
        bytes: usize,
    },

    /// An accelerator pointer refers to a freed allocation, or runs past its end.
    #[error("dangling accelerator handle")]
    DanglingHandle,

    /// The device reported a failure during a transfer.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// Accelerator context error.
    #[cfg(feature = "gpu")]
    #[error(transparent)]
    Gpu(#[from] lumen_gpu::GpuError),
}

/// Result type for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
