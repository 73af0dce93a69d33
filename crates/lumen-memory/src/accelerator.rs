//! Accelerator residency backed by wgpu storage buffers.
//!
//! Device memory is not addressable from the host, so an accelerator
//! address is a handle: a key into a process-wide table of live buffers
//! plus a byte offset into that buffer. Every transfer goes through the
//! shared [`GpuContext`] queue.

use std::sync::{mpsc, Arc, OnceLock};

use bytemuck::Pod;
use lumen_gpu::{GpuContext, GpuError};
use parking_lot::Mutex;
use slotmap::{new_key_type, Key, SlotMap};
use tracing::{debug, warn};

use crate::error::{MemoryError, Result};
use crate::host::{Host, HostAddr};
use crate::residency::{sealed, CopyBytes, Place, Residency, ResidencyKind};

/// Smallest buffer handed out, so that even empty arrays can be bound.
pub const MIN_ALLOCATION: u64 = 256;

new_key_type! {
    /// Key of a live accelerator buffer.
    pub struct BufferKey;
}

/// Accelerator memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accelerator;

/// Raw accelerator address: buffer handle plus byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAddr {
    key: BufferKey,
    offset: u64,
}

impl DeviceAddr {
    /// Byte offset into the backing buffer.
    pub fn offset(self) -> u64 {
        self.offset
    }

    /// The backing buffer, if the allocation is still live.
    pub fn buffer(self) -> Option<Arc<wgpu::Buffer>> {
        buffers().lock().get(self.key).cloned()
    }
}

type BufferTable = Mutex<SlotMap<BufferKey, Arc<wgpu::Buffer>>>;

fn buffers() -> &'static BufferTable {
    static BUFFERS: OnceLock<BufferTable> = OnceLock::new();
    BUFFERS.get_or_init(|| Mutex::new(SlotMap::with_key()))
}

fn resolve(addr: DeviceAddr, bytes: usize) -> Result<Arc<wgpu::Buffer>> {
    if addr.key.is_null() {
        return Err(MemoryError::NullPointer(ResidencyKind::Accelerator));
    }
    let buffer = addr.buffer().ok_or(MemoryError::DanglingHandle)?;
    if addr.offset + padded(bytes) > buffer.size() {
        return Err(MemoryError::DanglingHandle);
    }
    Ok(buffer)
}

fn mapping_failed(error: wgpu::BufferAsyncError) -> MemoryError {
    GpuError::BufferMapping(error.to_string()).into()
}

fn padded(bytes: usize) -> u64 {
    (bytes as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

fn check_aligned(offset: u64, bytes: usize) -> Result<()> {
    if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0
        || bytes as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0
    {
        return Err(MemoryError::Misaligned { offset, bytes });
    }
    Ok(())
}

impl sealed::Sealed for Accelerator {}

impl Residency for Accelerator {
    const KIND: ResidencyKind = ResidencyKind::Accelerator;

    type Addr = DeviceAddr;

    fn null() -> DeviceAddr {
        DeviceAddr {
            key: BufferKey::null(),
            offset: 0,
        }
    }

    fn is_null(addr: DeviceAddr) -> bool {
        addr.key.is_null()
    }

    fn offset(addr: DeviceAddr, bytes: usize) -> DeviceAddr {
        DeviceAddr {
            key: addr.key,
            offset: addr.offset + bytes as u64,
        }
    }

    fn allocate(bytes: usize) -> DeviceAddr {
        let Some(ctx) = GpuContext::get() else {
            debug!(bytes, "no accelerator context, allocation fails");
            return Self::null();
        };
        let size = padded(bytes).max(MIN_ALLOCATION);
        if size > ctx.device.limits().max_buffer_size {
            debug!(bytes, "accelerator allocation exceeds device buffer limit");
            return Self::null();
        }

        let (buffer, error) = ctx.scoped(wgpu::ErrorFilter::OutOfMemory, |device, _| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lumen accelerator allocation"),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        if let Some(error) = error {
            warn!(bytes, %error, "accelerator allocation failed");
            buffer.destroy();
            return Self::null();
        }

        let key = buffers().lock().insert(Arc::new(buffer));
        DeviceAddr { key, offset: 0 }
    }

    unsafe fn free(addr: DeviceAddr) {
        if addr.key.is_null() {
            return;
        }
        if let Some(buffer) = buffers().lock().remove(addr.key) {
            buffer.destroy();
        }
    }

    unsafe fn fill_zero(addr: DeviceAddr, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }
        check_aligned(addr.offset, bytes)?;
        let buffer = resolve(addr, bytes)?;
        let ctx = GpuContext::require()?;
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen zero fill"),
            });
        encoder.clear_buffer(&buffer, addr.offset, Some(bytes as u64));
        ctx.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    unsafe fn upload(dst: DeviceAddr, src: *const u8, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }
        check_aligned(dst.offset, bytes)?;
        let buffer = resolve(dst, bytes)?;
        let ctx = GpuContext::require()?;
        let data = std::slice::from_raw_parts(src, bytes);
        ctx.queue.write_buffer(&buffer, dst.offset, data);
        ctx.queue.submit(std::iter::empty());
        Ok(())
    }

    unsafe fn download(dst: *mut u8, src: DeviceAddr, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }
        if src.offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(MemoryError::Misaligned {
                offset: src.offset,
                bytes,
            });
        }
        let buffer = resolve(src, bytes)?;
        let ctx = GpuContext::require()?;
        let size = padded(bytes);

        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen readback encoder"),
            });
        encoder.copy_buffer_to_buffer(&buffer, src.offset, &staging, 0, size);
        ctx.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.wait_idle();
        rx.recv()
            .map_err(|e| MemoryError::Transfer(e.to_string()))?
            .map_err(mapping_failed)?;

        {
            let mapped = slice.get_mapped_range();
            std::ptr::copy_nonoverlapping(mapped.as_ptr(), dst, bytes);
        }
        staging.unmap();
        Ok(())
    }

    unsafe fn copy_within(dst: DeviceAddr, src: DeviceAddr, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }
        check_aligned(dst.offset, bytes)?;
        check_aligned(src.offset, bytes)?;
        let dst_buffer = resolve(dst, bytes)?;
        let src_buffer = resolve(src, bytes)?;
        let ctx = GpuContext::require()?;
        let size = bytes as u64;

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen device copy"),
            });
        if dst.key == src.key {
            // wgpu rejects copies whose source and destination are the same buffer.
            let scratch = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lumen copy scratch"),
                size,
                usage: wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            encoder.copy_buffer_to_buffer(&src_buffer, src.offset, &scratch, 0, size);
            encoder.copy_buffer_to_buffer(&scratch, 0, &dst_buffer, dst.offset, size);
        } else {
            encoder.copy_buffer_to_buffer(&src_buffer, src.offset, &dst_buffer, dst.offset, size);
        }
        ctx.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

impl CopyBytes<Host> for Accelerator {
    unsafe fn copy_bytes(dst: DeviceAddr, src: HostAddr, bytes: usize) -> Result<()> {
        if src.as_ptr().is_null() && bytes > 0 {
            return Err(MemoryError::NullPointer(ResidencyKind::Host));
        }
        Accelerator::upload(dst, src.as_ptr(), bytes)
    }
}

impl CopyBytes<Accelerator> for Host {
    unsafe fn copy_bytes(dst: HostAddr, src: DeviceAddr, bytes: usize) -> Result<()> {
        if dst.as_ptr().is_null() && bytes > 0 {
            return Err(MemoryError::NullPointer(ResidencyKind::Host));
        }
        Accelerator::download(dst.as_ptr(), src, bytes)
    }
}

impl CopyBytes<Accelerator> for Accelerator {
    unsafe fn copy_bytes(dst: DeviceAddr, src: DeviceAddr, bytes: usize) -> Result<()> {
        Accelerator::copy_within(dst, src, bytes)
    }
}

// Device memory never runs host constructors or destructors, so only
// plain-old-data payloads can live there.
impl<T: Pod> Place<T> for Accelerator {
    unsafe fn construct(addr: DeviceAddr, value: T) -> Result<()> {
        let bytes = bytemuck::bytes_of(&value);
        Accelerator::upload(addr, bytes.as_ptr(), bytes.len())
    }

    unsafe fn destruct(_addr: DeviceAddr) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_without_context_is_null() {
        if GpuContext::get().is_none() {
            assert!(Accelerator::is_null(Accelerator::allocate(64)));
        }
    }

    #[test]
    fn test_readback_mapping_failure_reported() {
        let err = mapping_failed(wgpu::BufferAsyncError);
        assert!(matches!(err, MemoryError::Gpu(GpuError::BufferMapping(_))));
    }

    #[test]
    fn test_null_address() {
        let addr = Accelerator::null();
        assert!(Accelerator::is_null(addr));
        assert!(addr.buffer().is_none());
        unsafe { Accelerator::free(addr) };
    }

    #[test]
    fn test_alignment_check() {
        assert!(check_aligned(0, 16).is_ok());
        assert!(matches!(check_aligned(2, 16), Err(MemoryError::Misaligned { .. })));
        assert!(matches!(check_aligned(0, 6), Err(MemoryError::Misaligned { .. })));
    }

    #[test]
    #[ignore = "requires GPU"]
    fn test_upload_download_roundtrip() {
        GpuContext::init_blocking().unwrap();
        let data: Vec<u32> = (0..64).collect();
        let bytes = bytemuck::cast_slice::<u32, u8>(&data);
        let addr = Accelerator::allocate(bytes.len());
        assert!(!Accelerator::is_null(addr));
        assert_eq!(addr.buffer().unwrap().size(), MIN_ALLOCATION);

        let mut back = vec![0u32; 64];
        unsafe {
            Accelerator::upload(addr, bytes.as_ptr(), bytes.len()).unwrap();
            Accelerator::download(back.as_mut_ptr().cast(), addr, bytes.len()).unwrap();
            Accelerator::free(addr);
        }
        assert_eq!(back, data);
        assert!(addr.buffer().is_none());
    }

    #[test]
    #[ignore = "requires GPU"]
    fn test_copy_within_same_buffer() {
        GpuContext::init_blocking().unwrap();
        let data: Vec<u32> = vec![7, 8, 9, 10];
        let addr = Accelerator::allocate(32);
        let mut back = vec![0u32; 4];
        unsafe {
            Accelerator::upload(addr, data.as_ptr().cast(), 16).unwrap();
            Accelerator::copy_within(Accelerator::offset(addr, 16), addr, 16).unwrap();
            Accelerator::download(back.as_mut_ptr().cast(), Accelerator::offset(addr, 16), 16)
                .unwrap();
            Accelerator::free(addr);
        }
        assert_eq!(back, data);
    }
}
