//! Marshaling between managed memory handles and raw OS buffers.
//!
//! A [`NativePointer`] is the payload of a managed pointer value: an address and, when the
//! runtime knows it, the size of the region behind it. The binding never owns that region.
//! To touch it, a call path acquires a [`MemoryView`], which borrows the pointer out of the
//! argument slice of the current call and therefore cannot outlive it.

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

/// Alignment of buffers handed out by [`NativeBuffer`]; enough for any libc struct.
const BUFFER_ALIGN: usize = 16;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("null pointer")]
    Null,

    #[error("access of {needed} bytes exceeds region of {len} bytes")]
    OutOfBounds { needed: usize, len: usize },

    #[error("unsupported integer width {width}")]
    Width { width: usize },
}

/// A native memory handle owned by the managed runtime.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativePointer {
    addr: usize,
    len: Option<usize>,
}

impl NativePointer {
    pub const NULL: NativePointer = NativePointer { addr: 0, len: None };

    pub fn new(addr: usize, len: Option<usize>) -> Self {
        Self { addr, len }
    }

    pub fn from_raw<T>(ptr: *const T, len: Option<usize>) -> Self {
        Self { addr: ptr as usize, len }
    }

    pub fn address(&self) -> usize {
        self.addr
    }

    pub fn len(&self) -> Option<usize> {
        self.len
    }

    pub fn is_null(&self) -> bool {
        self.addr == 0
    }
}

impl fmt::Debug for NativePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for NativePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.len {
            Some(len) => write!(f, "ptr(0x{:X}, len={len})", self.addr),
            None => write!(f, "ptr(0x{:X})", self.addr),
        }
    }
}

/// A borrowed view of a native region, valid for the duration of one call.
#[derive(Debug)]
pub struct MemoryView<'a> {
    base: NonNull<u8>,
    len: Option<usize>,
    _call: PhantomData<&'a NativePointer>,
}

impl<'a> MemoryView<'a> {
    /// Acquire a view through `handle`. Null handles are rejected here so that no native
    /// call ever sees one where a populated region is required.
    pub fn acquire(handle: &'a NativePointer) -> Result<Self, MemoryError> {
        let base = NonNull::new(handle.addr as *mut u8).ok_or(MemoryError::Null)?;
        Ok(Self {
            base,
            len: handle.len,
            _call: PhantomData,
        })
    }

    pub fn len(&self) -> Option<usize> {
        self.len
    }

    /// Check that `size` bytes starting at `offset` lie inside the known region.
    /// Regions of unknown length are trusted.
    pub fn check(&self, offset: usize, size: usize) -> Result<(), MemoryError> {
        let needed = offset.checked_add(size).ok_or(MemoryError::OutOfBounds {
            needed: usize::MAX,
            len: self.len.unwrap_or(0),
        })?;
        match self.len {
            Some(len) if needed > len => Err(MemoryError::OutOfBounds { needed, len }),
            _ => Ok(()),
        }
    }

    /// Raw pointer to the start of the region, typed for the native call.
    pub fn as_mut_ptr<T>(&self) -> *mut T {
        self.base.as_ptr().cast()
    }

    /// Raw pointer to the region after checking it can hold a `T`.
    pub fn require<T>(&self) -> Result<*mut T, MemoryError> {
        self.check(0, mem::size_of::<T>())?;
        Ok(self.as_mut_ptr())
    }

    /// Fill the first `len` bytes with `byte`.
    pub fn fill(&self, byte: u8, len: usize) -> Result<(), MemoryError> {
        self.check(0, len)?;
        // SAFETY: the region is valid for `len` bytes per the handle precondition and the
        // bounds check above.
        unsafe { ptr::write_bytes(self.base.as_ptr(), byte, len) };
        Ok(())
    }

    /// Write `value` as a native-endian integer of `width` bytes at `offset`.
    pub fn write_uint(&self, offset: usize, width: usize, value: u64) -> Result<(), MemoryError> {
        self.check(offset, width)?;
        let dst = self.base.as_ptr().wrapping_add(offset);
        // SAFETY: bounds checked above; unaligned writes avoid assuming the runtime's alignment.
        unsafe {
            match width {
                1 => ptr::write_unaligned(dst, value as u8),
                2 => ptr::write_unaligned(dst.cast::<u16>(), value as u16),
                4 => ptr::write_unaligned(dst.cast::<u32>(), value as u32),
                8 => ptr::write_unaligned(dst.cast::<u64>(), value),
                _ => return Err(MemoryError::Width { width }),
            }
        }
        Ok(())
    }

    /// Read a native-endian integer of `width` bytes at `offset`, zero-extended.
    pub fn read_uint(&self, offset: usize, width: usize) -> Result<u64, MemoryError> {
        self.check(offset, width)?;
        let src = self.base.as_ptr().wrapping_add(offset);
        // SAFETY: see `write_uint`.
        let value = unsafe {
            match width {
                1 => ptr::read_unaligned(src) as u64,
                2 => ptr::read_unaligned(src.cast::<u16>()) as u64,
                4 => ptr::read_unaligned(src.cast::<u32>()) as u64,
                8 => ptr::read_unaligned(src.cast::<u64>()),
                _ => return Err(MemoryError::Width { width }),
            }
        };
        Ok(value)
    }

    /// Write at most `max` ids as consecutive `size_of::<T>()`-wide integers.
    /// Returns how many were written.
    pub fn write_ids<T>(&self, ids: &[T], max: usize) -> Result<usize, MemoryError>
    where
        T: Copy + Into<u64>,
    {
        let width = mem::size_of::<T>();
        let count = ids.len().min(max);
        self.check(0, count * width)?;
        for (n, id) in ids.iter().take(count).enumerate() {
            self.write_uint(n * width, width, (*id).into())?;
        }
        Ok(count)
    }
}

/// An owned, address-stable native allocation.
///
/// Plays the part of the managed runtime's native allocator: the runtime keeps the buffer
/// alive and passes [`NativeBuffer::pointer`] into calls.
pub struct NativeBuffer {
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

impl NativeBuffer {
    /// Allocate `len` zeroed bytes.
    pub fn new(len: usize) -> Self {
        let layout = Layout::from_size_align(len.max(1), BUFFER_ALIGN)
            .unwrap_or_else(|_| panic!("native buffer of {len} bytes is too large"));
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Self { ptr, len, layout }
    }

    /// A buffer holding one `T`.
    pub fn from_value<T: Copy>(value: T) -> Self {
        let buf = Self::new(mem::size_of::<T>());
        buf.write(0, value);
        buf
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn pointer(&self) -> NativePointer {
        NativePointer::new(self.ptr.as_ptr() as usize, Some(self.len))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        // SAFETY: the allocation is `len` bytes and initialised (zeroed on creation).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }.to_vec()
    }

    /// Contents up to the first NUL, lossily decoded.
    pub fn read_cstr(&self) -> String {
        let bytes = self.to_vec();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }

    pub fn read<T: Copy>(&self, offset: usize) -> T {
        assert!(offset + mem::size_of::<T>() <= self.len, "read past end of native buffer");
        // SAFETY: bounds asserted above.
        unsafe { ptr::read_unaligned(self.ptr.as_ptr().add(offset).cast()) }
    }

    pub fn write<T: Copy>(&self, offset: usize, value: T) {
        assert!(offset + mem::size_of::<T>() <= self.len, "write past end of native buffer");
        // SAFETY: bounds asserted above.
        unsafe { ptr::write_unaligned(self.ptr.as_ptr().add(offset).cast(), value) }
    }
}

impl Drop for NativeBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with the same layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBuffer").field("pointer", &self.pointer()).finish()
    }
}
