//! Single-owner boxes on a residency.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};

use bytemuck::Pod;

use crate::error::{MemoryError, Result};
use crate::host::Host;
use crate::ptr::{self, Ptr};
use crate::residency::Place;

/// Owns one `T` constructed in place on residency `R`.
///
/// Dropping runs `T`'s destructor on the residency and then frees the
/// storage.
pub struct UniquePtr<T, R: Place<T>> {
    ptr: Ptr<T, R>,
    _owns: PhantomData<T>,
}

impl<T, R: Place<T>> UniquePtr<T, R> {
    /// Allocate storage on `R` and move `value` into it.
    pub fn new(value: T) -> Result<Self> {
        let ptr = ptr::allocate_single::<T, R>();
        if ptr.is_null() {
            return Err(MemoryError::OutOfMemory {
                bytes: mem::size_of::<T>(),
                residency: R::KIND,
            });
        }
        // SAFETY: fresh storage sized and aligned for one `T`.
        if let Err(err) = unsafe { R::construct(ptr.addr(), value) } {
            unsafe { ptr::free(ptr) };
            return Err(err);
        }
        Ok(Self {
            ptr,
            _owns: PhantomData,
        })
    }

    /// Pointer to the payload.
    pub fn as_ptr(&self) -> Ptr<T, R> {
        self.ptr
    }
}

impl<T: Pod, R: Place<T>> UniquePtr<T, R> {
    /// Copy the payload back to the host.
    pub fn read(&self) -> Result<T> {
        let mut value = T::zeroed();
        // SAFETY: the payload is one live, initialized `T`.
        unsafe {
            R::download(
                bytemuck::bytes_of_mut(&mut value).as_mut_ptr(),
                self.ptr.addr(),
                mem::size_of::<T>(),
            )?
        };
        Ok(value)
    }
}

impl<T, R: Place<T>> Drop for UniquePtr<T, R> {
    fn drop(&mut self) {
        // SAFETY: the payload was constructed in `new` and is destroyed once, here.
        unsafe {
            R::destruct(self.ptr.addr());
            ptr::free(self.ptr);
        }
    }
}

impl<T> Deref for UniquePtr<T, Host> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: non-null and initialized for the lifetime of `self`.
        unsafe { &*self.ptr.as_raw() }
    }
}

impl<T> DerefMut for UniquePtr<T, Host> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, with exclusive access through `&mut self`.
        unsafe { &mut *self.ptr.as_raw() }
    }
}

impl<T, R: Place<T>> fmt::Debug for UniquePtr<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniquePtr")
            .field("residency", &R::KIND)
            .field("ptr", &self.ptr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_host_value() {
        let mut b = UniquePtr::<[u32; 3], Host>::new([1, 2, 3]).unwrap();
        b[2] = 7;
        assert_eq!(*b, [1, 2, 7]);
        assert_eq!(b.read().unwrap(), [1, 2, 7]);
    }

    #[test]
    fn test_drop_runs_destructor() {
        let tracker = Rc::new(());
        let b = UniquePtr::<Rc<()>, Host>::new(Rc::clone(&tracker)).unwrap();
        assert_eq!(Rc::strong_count(&tracker), 2);
        drop(b);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_non_pod_payload() {
        let b = UniquePtr::<String, Host>::new("lumen".to_string()).unwrap();
        assert_eq!(b.len(), 5);
    }
}
