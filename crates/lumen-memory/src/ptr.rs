//! Typed, non-owning pointers and the raw allocation/copy primitives.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use crate::error::Result;
use crate::host::Host;
use crate::residency::{CopyBytes, Residency};

/// A non-owning handle to a contiguous run of `T` on residency `R`.
///
/// Host pointers can be turned into raw `*mut T`; accelerator pointers
/// are opaque and only usable through copies and GPU bindings.
pub struct Ptr<T, R: Residency> {
    addr: R::Addr,
    _marker: PhantomData<fn() -> T>,
}

impl<T, R: Residency> Ptr<T, R> {
    /// The null pointer.
    pub fn null() -> Self {
        Self::from_addr(R::null())
    }

    /// Wrap a raw address.
    pub fn from_addr(addr: R::Addr) -> Self {
        Self {
            addr,
            _marker: PhantomData,
        }
    }

    /// The raw address.
    pub fn addr(self) -> R::Addr {
        self.addr
    }

    /// Whether this is the null pointer.
    pub fn is_null(self) -> bool {
        R::is_null(self.addr)
    }

    /// Pointer `count` elements further on.
    pub fn add(self, count: usize) -> Self {
        Self::from_addr(R::offset(self.addr, count * mem::size_of::<T>()))
    }
}

impl<T> Ptr<T, Host> {
    /// The raw host pointer.
    pub fn as_raw(self) -> *mut T {
        self.addr.as_ptr().cast()
    }
}

#[cfg(feature = "gpu")]
impl<T> Ptr<T, crate::Accelerator> {
    /// The wgpu buffer this pointer lives in, if still allocated.
    pub fn buffer(self) -> Option<std::sync::Arc<wgpu::Buffer>> {
        self.addr.buffer()
    }

    /// Byte offset of this pointer within its buffer.
    pub fn byte_offset(self) -> u64 {
        self.addr.offset()
    }
}

impl<T, R: Residency> Clone for Ptr<T, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R: Residency> Copy for Ptr<T, R> {}

impl<T, R: Residency> PartialEq for Ptr<T, R> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<T, R: Residency> Eq for Ptr<T, R> {}

impl<T, R: Residency> fmt::Debug for Ptr<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ptr")
            .field("residency", &R::KIND)
            .field("addr", &self.addr)
            .finish()
    }
}

/// Allocate `bytes` of uninitialized storage on `R`.
///
/// Returns null if the allocator cannot satisfy the request. The memory
/// is not zeroed.
pub fn allocate_size<T, R: Residency>(bytes: usize) -> Ptr<T, R> {
    if mem::align_of::<T>() > crate::host::HOST_ALIGN {
        return Ptr::null();
    }
    Ptr::from_addr(R::allocate(bytes))
}

/// Allocate room for `count` values of `T` on `R`, or return null.
pub fn allocate_count<T, R: Residency>(count: usize) -> Ptr<T, R> {
    match count.checked_mul(mem::size_of::<T>()) {
        Some(bytes) => allocate_size(bytes),
        None => Ptr::null(),
    }
}

/// Allocate room for one `T` on `R`, or return null.
pub fn allocate_single<T, R: Residency>() -> Ptr<T, R> {
    allocate_count(1)
}

/// Release memory obtained from one of the `allocate_*` functions.
///
/// Freeing null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or the exact pointer returned by an allocation on
/// the same residency, and must not be used afterwards.
pub unsafe fn free<T, R: Residency>(ptr: Ptr<T, R>) {
    R::free(ptr.addr);
}

/// Copy `bytes` raw bytes from `src` to `dst`.
///
/// Works for every residency pairing. Both pointers must share the
/// element type `T`.
///
/// # Safety
///
/// Both ranges must lie inside live allocations.
pub unsafe fn copy_size<T, D, S>(dst: Ptr<T, D>, src: Ptr<T, S>, bytes: usize) -> Result<()>
where
    S: Residency,
    D: CopyBytes<S>,
{
    D::copy_bytes(dst.addr, src.addr, bytes)
}

/// Copy `count` values of `T` from `src` to `dst`.
///
/// # Safety
///
/// Both ranges must lie inside live allocations.
pub unsafe fn copy_count<T, D, S>(dst: Ptr<T, D>, src: Ptr<T, S>, count: usize) -> Result<()>
where
    S: Residency,
    D: CopyBytes<S>,
{
    copy_size(dst, src, count * mem::size_of::<T>())
}

/// Copy a single `T` from `src` to `dst`.
///
/// # Safety
///
/// Both pointers must refer to live storage for at least one `T`.
pub unsafe fn copy_single<T, D, S>(dst: Ptr<T, D>, src: Ptr<T, S>) -> Result<()>
where
    S: Residency,
    D: CopyBytes<S>,
{
    copy_count(dst, src, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryError;

    #[test]
    fn test_allocate_copy_free() {
        let src = allocate_count::<u32, Host>(4);
        let dst = allocate_count::<u32, Host>(4);
        assert!(!src.is_null() && !dst.is_null());
        unsafe {
            for i in 0..4 {
                src.as_raw().add(i).write(i as u32 * 10);
            }
            copy_count(dst, src, 4).unwrap();
            let copied = std::slice::from_raw_parts(dst.as_raw(), 4);
            assert_eq!(copied, &[0, 10, 20, 30]);
            free(src);
            free(dst);
        }
    }

    #[test]
    fn test_pointer_arithmetic() {
        let base = allocate_count::<u64, Host>(3);
        let third = base.add(2);
        assert_eq!(third.as_raw() as usize - base.as_raw() as usize, 16);
        unsafe {
            third.as_raw().write(99);
            let single = allocate_single::<u64, Host>();
            copy_single(single, third).unwrap();
            assert_eq!(single.as_raw().read(), 99);
            free(single);
            free(base);
        }
    }

    #[test]
    fn test_overflowing_count_is_null() {
        let ptr = allocate_count::<u64, Host>(usize::MAX);
        assert!(ptr.is_null());
        unsafe { free(ptr) };
    }

    #[test]
    fn test_over_aligned_type_is_null() {
        #[repr(align(64))]
        struct Wide(#[allow(dead_code)] u8);
        assert!(allocate_single::<Wide, Host>().is_null());
    }

    #[test]
    fn test_copy_to_null_fails() {
        let src = allocate_single::<u32, Host>();
        let err = unsafe { copy_single(Ptr::<u32, Host>::null(), src) };
        assert!(matches!(err, Err(MemoryError::NullPointer(_))));
        unsafe { free(src) };
    }
}
