//! Residency tags and the backend interface each residency implements.

use std::fmt;

use crate::error::Result;

/// Which memory space an allocation lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidencyKind {
    /// Host-addressable system memory.
    Host,
    /// Accelerator-addressable device memory.
    Accelerator,
}

impl fmt::Display for ResidencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Accelerator => f.write_str("accelerator"),
        }
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// A memory space, used as a type-level tag on pointers and containers.
///
/// Each residency supplies the raw byte-level primitives; typed
/// operations in this crate are built on top of them. Transfers that
/// involve the host take plain host pointers, so every residency can be
/// filled from and drained to host memory without knowing about the
/// other residencies.
pub trait Residency:
    sealed::Sealed + Copy + Default + fmt::Debug + Send + Sync + 'static
{
    /// Runtime value of this tag.
    const KIND: ResidencyKind;

    /// Raw address of a byte within an allocation on this residency.
    type Addr: Copy + Eq + fmt::Debug + Send + Sync;

    /// The null address.
    fn null() -> Self::Addr;

    /// Whether `addr` is null.
    fn is_null(addr: Self::Addr) -> bool;

    /// Address `bytes` past `addr`.
    fn offset(addr: Self::Addr, bytes: usize) -> Self::Addr;

    /// Allocate `bytes` of uninitialized storage, or return null.
    fn allocate(bytes: usize) -> Self::Addr;

    /// Release an allocation. Null is a no-op.
    ///
    /// # Safety
    ///
    /// `addr` must be null or a value returned by [`Residency::allocate`]
    /// that has not been freed yet.
    unsafe fn free(addr: Self::Addr);

    /// Zero `bytes` starting at `addr`.
    ///
    /// # Safety
    ///
    /// The range must lie inside a live allocation.
    unsafe fn fill_zero(addr: Self::Addr, bytes: usize) -> Result<()>;

    /// Copy `bytes` from host memory at `src` to `dst`.
    ///
    /// # Safety
    ///
    /// `src` must be valid for `bytes` reads and the destination range must
    /// lie inside a live allocation.
    unsafe fn upload(dst: Self::Addr, src: *const u8, bytes: usize) -> Result<()>;

    /// Copy `bytes` from `src` to host memory at `dst`.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for `bytes` writes and the source range must lie
    /// inside a live allocation.
    unsafe fn download(dst: *mut u8, src: Self::Addr, bytes: usize) -> Result<()>;

    /// Copy `bytes` between two addresses on this residency.
    ///
    /// # Safety
    ///
    /// Both ranges must lie inside live allocations.
    unsafe fn copy_within(dst: Self::Addr, src: Self::Addr, bytes: usize) -> Result<()>;
}

/// Byte copies into `Self` from residency `S`.
///
/// Implemented for all four host/accelerator pairings.
pub trait CopyBytes<S: Residency>: Residency {
    /// Copy `bytes` from `src` to `dst`.
    ///
    /// # Safety
    ///
    /// Both ranges must lie inside live allocations on their residencies.
    unsafe fn copy_bytes(dst: Self::Addr, src: S::Addr, bytes: usize) -> Result<()>;
}

/// In-place construction and destruction of a `T` on a residency.
pub trait Place<T>: Residency {
    /// Move `value` into the storage at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must point at uninitialized storage sized and aligned for `T`.
    unsafe fn construct(addr: Self::Addr, value: T) -> Result<()>;

    /// Run `T`'s destructor on the value at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must hold a value previously constructed with
    /// [`Place::construct`] and not yet destructed.
    unsafe fn destruct(addr: Self::Addr);
}
