#![warn(missing_docs)]

//! Residency-tagged memory for lumen.
//!
//! The same pointer and container types address both host memory and
//! accelerator (GPU) memory. Residency is a type parameter, fixed at
//! compile time; data only crosses between residencies through explicit
//! copies.
//!
//! # Architecture
//!
//! - [`Residency`] - backend interface, implemented by [`Host`] and
//!   (with the `gpu` feature) `Accelerator`
//! - [`Ptr`] - typed, non-owning handle plus the raw `allocate_*`,
//!   [`free`] and `copy_*` primitives
//! - [`Array`] - owning sequence, the unit of upload and readback
//! - [`UniquePtr`] - owning single value constructed in place
//!
//! # Example
//!
//! ```
//! use lumen_memory::{Array, Host};
//!
//! let mut staging = Array::<u32, Host>::from_slice(&[1, 2, 3])?;
//! staging.reserve(1)?;
//! assert_eq!(&staging[..], &[1, 2, 3, 0]);
//!
//! let mirror: Array<u32, Host> = staging.to_residency()?;
//! assert_eq!(mirror.to_vec()?, vec![1, 2, 3, 0]);
//! # Ok::<(), lumen_memory::MemoryError>(())
//! ```

mod array;
mod error;
mod host;
mod ptr;
mod residency;
mod unique;

#[cfg(feature = "gpu")]
mod accelerator;

pub use array::Array;
pub use error::{MemoryError, Result};
pub use host::{Host, HostAddr, HOST_ALIGN};
pub use ptr::{
    allocate_count, allocate_single, allocate_size, copy_count, copy_single, copy_size, free, Ptr,
};
pub use residency::{CopyBytes, Place, Residency, ResidencyKind};
pub use unique::UniquePtr;

#[cfg(feature = "gpu")]
pub use accelerator::{Accelerator, BufferKey, DeviceAddr, MIN_ALLOCATION};
