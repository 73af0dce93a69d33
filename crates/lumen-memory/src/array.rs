//! Owning arrays on a residency.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::slice;

use bytemuck::Pod;
use tracing::trace;

use crate::error::{MemoryError, Result};
use crate::host::Host;
use crate::ptr::{self, Ptr};
use crate::residency::{CopyBytes, Residency};

/// An owning sequence of `T` on residency `R`.
///
/// Owns exactly one allocation, released when the array is dropped.
/// Moving the array transfers ownership; duplicating it (possibly onto
/// another residency) is an explicit call to [`Array::to_residency`].
/// Host arrays dereference to slices.
pub struct Array<T: Pod, R: Residency> {
    ptr: Ptr<T, R>,
    len: usize,
    _owns: PhantomData<T>,
}

impl<T: Pod, R: Residency> Array<T, R> {
    /// An empty array holding no allocation.
    pub fn new() -> Self {
        Self {
            ptr: Ptr::null(),
            len: 0,
            _owns: PhantomData,
        }
    }

    fn allocate(len: usize) -> Result<Self> {
        let out_of_memory = |bytes| MemoryError::OutOfMemory {
            bytes,
            residency: R::KIND,
        };
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or(out_of_memory(usize::MAX))?;
        let ptr = ptr::allocate_size::<T, R>(bytes);
        if ptr.is_null() {
            return Err(out_of_memory(bytes));
        }
        trace!(residency = %R::KIND, bytes, "array allocated");
        Ok(Self {
            ptr,
            len,
            _owns: PhantomData,
        })
    }

    /// Allocate `len` zeroed elements.
    pub fn zeroed(len: usize) -> Result<Self> {
        let array = Self::allocate(len)?;
        // SAFETY: the range is exactly the fresh allocation.
        unsafe { R::fill_zero(array.ptr.addr(), array.size_bytes())? };
        Ok(array)
    }

    /// Allocate on `R` and fill with a copy of host data.
    pub fn from_host(data: &[T]) -> Result<Self> {
        let array = Self::allocate(data.len())?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        // SAFETY: `bytes` is a live host slice of exactly the allocation size.
        unsafe { R::upload(array.ptr.addr(), bytes.as_ptr(), bytes.len())? };
        Ok(array)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the contents in bytes.
    pub fn size_bytes(&self) -> usize {
        self.len * mem::size_of::<T>()
    }

    /// Pointer to the first element.
    pub fn as_ptr(&self) -> Ptr<T, R> {
        self.ptr
    }

    /// Copy the contents into a host slice of the same length.
    pub fn download_into(&self, dst: &mut [T]) -> Result<()> {
        if dst.len() != self.len {
            return Err(MemoryError::LengthMismatch {
                dst: dst.len(),
                src: self.len,
            });
        }
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(dst);
        // SAFETY: both ranges are `size_bytes` long and live.
        unsafe { R::download(bytes.as_mut_ptr(), self.ptr.addr(), bytes.len()) }
    }

    /// Copy the contents into a new `Vec`.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mut out = vec![T::zeroed(); self.len];
        self.download_into(&mut out)?;
        Ok(out)
    }

    /// Overwrite the contents with those of `src`, which may live elsewhere.
    pub fn copy_from<S>(&mut self, src: &Array<T, S>) -> Result<()>
    where
        S: Residency,
        R: CopyBytes<S>,
    {
        if src.len != self.len {
            return Err(MemoryError::LengthMismatch {
                dst: self.len,
                src: src.len,
            });
        }
        // SAFETY: both arrays own `size_bytes` of live storage.
        unsafe { ptr::copy_count(self.ptr, src.ptr, self.len) }
    }

    /// Duplicate the contents into a new array on residency `D`.
    pub fn to_residency<D>(&self) -> Result<Array<T, D>>
    where
        D: CopyBytes<R>,
    {
        let mut copy = Array::<T, D>::allocate(self.len)?;
        copy.copy_from(self)?;
        Ok(copy)
    }

    /// Grow by `extra` elements.
    ///
    /// A new region of `len + extra` elements replaces the old one: the
    /// existing contents are copied over, the added tail is zeroed and the
    /// old region is freed. Pointers into the old region are invalidated.
    pub fn reserve(&mut self, extra: usize) -> Result<()> {
        if extra == 0 {
            return Ok(());
        }
        let len = self.len.checked_add(extra).ok_or(MemoryError::OutOfMemory {
            bytes: usize::MAX,
            residency: R::KIND,
        })?;
        let grown = Self::zeroed(len)?;
        if self.len > 0 {
            // SAFETY: the old contents fit in the front of the new region.
            unsafe { R::copy_within(grown.ptr.addr(), self.ptr.addr(), self.size_bytes())? };
        }
        *self = grown;
        Ok(())
    }

    /// Move the contents out, leaving an empty array behind.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }
}

impl<T: Pod, R: Residency> Default for Array<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod, R: Residency> Drop for Array<T, R> {
    fn drop(&mut self) {
        // SAFETY: `ptr` is null or our own allocation, freed only here.
        unsafe { ptr::free(self.ptr) };
    }
}

impl<T: Pod, R: Residency> fmt::Debug for Array<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("residency", &R::KIND)
            .field("len", &self.len)
            .finish()
    }
}

impl<T: Pod> Array<T, Host> {
    /// Allocate a host array holding a copy of `data`.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        Self::from_host(data)
    }
}

impl<T: Pod> Deref for Array<T, Host> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: a non-empty host array owns `len` initialized, aligned elements.
        unsafe { slice::from_raw_parts(self.ptr.as_raw(), self.len) }
    }
}

impl<T: Pod> DerefMut for Array<T, Host> {
    fn deref_mut(&mut self) -> &mut [T] {
        if self.len == 0 {
            return &mut [];
        }
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_raw(), self.len) }
    }
}
