//! The device capability contract the tensor memory manager (C7) compiles
//! against.
//!
//! Modeled after the teacher crate's `Framework`/`Context` split: a backend
//! is a flat record of operations a device can perform, not a base class to
//! inherit from. `TensorMemoryManager<B>` is generic over `B: Backend` and
//! never matches on a closed enum of known backends the way the teacher's
//! `Context`/`Memory` enums do, so adding a new device never touches this
//! crate.

use crate::error::Result;

/// An opaque, backend-owned allocation. The core never looks inside one;
/// it only ever holds a `B::Buffer` handed back from `alloc`.
pub trait Backend {
    type Buffer;

    fn alloc(&mut self, size_bytes: usize) -> Result<Self::Buffer>;
    fn dealloc(&mut self, buffer: &Self::Buffer) -> Result<()>;

    /// Host-to-device transfer starting at a byte offset into `buffer`.
    fn write(&mut self, buffer: &mut Self::Buffer, offset: usize, data: &[u8]) -> Result<()>;
    /// Device-to-host transfer starting at a byte offset into `buffer`.
    fn read(&mut self, buffer: &Self::Buffer, offset: usize, len: usize) -> Result<Vec<u8>>;
}

/// A plain host-memory backend: every "device" buffer is just a `Vec<u8>`
/// living in process memory. Used by the crate's own integration tests and
/// as a reference implementation for anyone wiring up a real device.
#[derive(Debug, Default)]
pub struct HostBackend;

impl Backend for HostBackend {
    type Buffer = Vec<u8>;

    fn alloc(&mut self, size_bytes: usize) -> Result<Self::Buffer> {
        Ok(vec![0u8; size_bytes])
    }

    fn dealloc(&mut self, _buffer: &Self::Buffer) -> Result<()> {
        Ok(())
    }

    fn write(&mut self, buffer: &mut Self::Buffer, offset: usize, data: &[u8]) -> Result<()> {
        buffer[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read(&mut self, buffer: &Self::Buffer, offset: usize, len: usize) -> Result<Vec<u8>> {
        Ok(buffer[offset..offset + len].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_backend_round_trips_a_write() {
        let mut backend = HostBackend;
        let mut buf = backend.alloc(4).unwrap();
        backend.write(&mut buf, 0, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.read(&buf, 0, 4).unwrap(), vec![1, 2, 3, 4]);
    }
}
