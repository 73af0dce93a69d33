//! Host residency backed by the global allocator.

use std::alloc::{self, Layout};
use std::ptr;

use tracing::trace;

use crate::error::{MemoryError, Result};
use crate::residency::{sealed, CopyBytes, Place, Residency, ResidencyKind};

/// Alignment of every host allocation.
pub const HOST_ALIGN: usize = 16;

/// Bytes reserved in front of each allocation to remember its size.
const HEADER: usize = HOST_ALIGN;

/// Host memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Host;

/// Raw host address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostAddr(pub(crate) *mut u8);

// A host address is only an integer until something dereferences it, and
// every dereference in this crate is behind an `unsafe` contract.
unsafe impl Send for HostAddr {}
unsafe impl Sync for HostAddr {}

impl HostAddr {
    /// The underlying pointer.
    pub fn as_ptr(self) -> *mut u8 {
        self.0
    }
}

impl sealed::Sealed for Host {}

impl Residency for Host {
    const KIND: ResidencyKind = ResidencyKind::Host;

    type Addr = HostAddr;

    fn null() -> HostAddr {
        HostAddr(ptr::null_mut())
    }

    fn is_null(addr: HostAddr) -> bool {
        addr.0.is_null()
    }

    fn offset(addr: HostAddr, bytes: usize) -> HostAddr {
        HostAddr(addr.0.wrapping_add(bytes))
    }

    fn allocate(bytes: usize) -> HostAddr {
        let Some(total) = bytes.checked_add(HEADER) else {
            return Self::null();
        };
        let Ok(layout) = Layout::from_size_align(total, HOST_ALIGN) else {
            return Self::null();
        };
        // SAFETY: layout has non-zero size (HEADER > 0).
        let base = unsafe { alloc::alloc(layout) };
        if base.is_null() {
            trace!(bytes, "host allocation refused");
            return Self::null();
        }
        // SAFETY: base is aligned for usize and at least HEADER bytes long.
        unsafe {
            base.cast::<usize>().write(total);
            HostAddr(base.add(HEADER))
        }
    }

    unsafe fn free(addr: HostAddr) {
        if addr.0.is_null() {
            return;
        }
        let base = addr.0.sub(HEADER);
        let total = base.cast::<usize>().read();
        alloc::dealloc(base, Layout::from_size_align_unchecked(total, HOST_ALIGN));
    }

    unsafe fn fill_zero(addr: HostAddr, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }
        non_null(addr)?;
        ptr::write_bytes(addr.0, 0, bytes);
        Ok(())
    }

    unsafe fn upload(dst: HostAddr, src: *const u8, bytes: usize) -> Result<()> {
        Self::copy_within(dst, HostAddr(src.cast_mut()), bytes)
    }

    unsafe fn download(dst: *mut u8, src: HostAddr, bytes: usize) -> Result<()> {
        Self::copy_within(HostAddr(dst), src, bytes)
    }

    unsafe fn copy_within(dst: HostAddr, src: HostAddr, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }
        non_null(dst)?;
        non_null(src)?;
        ptr::copy(src.0, dst.0, bytes);
        Ok(())
    }
}

fn non_null(addr: HostAddr) -> Result<()> {
    if addr.0.is_null() {
        Err(MemoryError::NullPointer(ResidencyKind::Host))
    } else {
        Ok(())
    }
}

impl CopyBytes<Host> for Host {
    unsafe fn copy_bytes(dst: HostAddr, src: HostAddr, bytes: usize) -> Result<()> {
        Host::copy_within(dst, src, bytes)
    }
}

impl<T> Place<T> for Host {
    unsafe fn construct(addr: HostAddr, value: T) -> Result<()> {
        non_null(addr)?;
        addr.0.cast::<T>().write(value);
        Ok(())
    }

    unsafe fn destruct(addr: HostAddr) {
        if !addr.0.is_null() {
            ptr::drop_in_place(addr.0.cast::<T>());
        }
    }
}
