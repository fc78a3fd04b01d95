//! Tensor-shaped allocations on top of the byte-oriented buffer pool (C7).

use crate::backend::Backend;
use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::pool::{BufferId, BufferPool, PoolStats};

const ELEMENT_SIZE_BYTES: u64 = 4;

/// A tensor-shaped handle into a pooled buffer. Holds no data itself; all
/// transfers go through the backend the manager was built with.
#[derive(Clone, Debug)]
pub struct LogicalTensor {
    pub buffer: BufferId,
    pub shape: Vec<u64>,
    pub dtype: DataType,
    pub read_only: bool,
}

impl LogicalTensor {
    pub fn element_count(&self) -> u64 {
        self.shape.iter().product()
    }

    pub fn size_bytes(&self) -> u64 {
        self.element_count() * ELEMENT_SIZE_BYTES
    }
}

pub struct TensorMemoryManager<B: Backend> {
    pool: BufferPool,
    backend: B,
    buffers: std::collections::HashMap<BufferId, B::Buffer>,
    pub readbacks: u64,
    pub writebacks: u64,
}

impl<B: Backend> TensorMemoryManager<B> {
    pub fn new(backend: B, aging_threshold: u32, size_class_factor: u64) -> Self {
        TensorMemoryManager {
            pool: BufferPool::new(aging_threshold, size_class_factor),
            backend,
            buffers: std::collections::HashMap::new(),
            readbacks: 0,
            writebacks: 0,
        }
    }

    pub fn allocate(&mut self, shape: Vec<u64>, dtype: DataType, read_only: bool) -> Result<LogicalTensor> {
        if shape.iter().any(|&d| d == 0) {
            return Err(Error::ZeroSize);
        }
        let element_count: u64 = shape.iter().product();
        let size_bytes = element_count * ELEMENT_SIZE_BYTES;
        let buffer_id = self.pool.try_allocate(size_bytes);
        if let std::collections::hash_map::Entry::Vacant(entry) = self.buffers.entry(buffer_id) {
            entry.insert(self.backend.alloc(size_bytes as usize)?);
        }
        Ok(LogicalTensor {
            buffer: buffer_id,
            shape,
            dtype,
            read_only,
        })
    }

    pub fn allocate_with_data(
        &mut self,
        shape: Vec<u64>,
        data: &[u8],
        dtype: DataType,
        read_only: bool,
    ) -> Result<LogicalTensor> {
        let tensor = self.allocate(shape, dtype, read_only)?;
        self.writeback(&tensor, 0, data)?;
        Ok(tensor)
    }

    pub fn free(&mut self, tensor: &LogicalTensor) {
        self.pool.deallocate(tensor.buffer);
    }

    pub fn writeback(&mut self, tensor: &LogicalTensor, offset: usize, data: &[u8]) -> Result<()> {
        let buffer = self
            .buffers
            .get_mut(&tensor.buffer)
            .expect("allocate always inserts a backing buffer");
        self.backend.write(buffer, offset, data)?;
        self.writebacks += 1;
        Ok(())
    }

    pub fn readback(&mut self, tensor: &LogicalTensor) -> Result<Vec<u8>> {
        let buffer = self
            .buffers
            .get(&tensor.buffer)
            .expect("allocate always inserts a backing buffer");
        let bytes = self.backend.read(buffer, 0, tensor.size_bytes() as usize)?;
        self.readbacks += 1;
        Ok(bytes)
    }

    /// Convenience for scalar round trips: write one element at `index`.
    pub fn writeback_value(&mut self, tensor: &LogicalTensor, index: usize, value: [u8; 4]) -> Result<()> {
        self.writeback(tensor, index * ELEMENT_SIZE_BYTES as usize, &value)
    }

    pub fn readback_value(&mut self, tensor: &LogicalTensor, index: usize) -> Result<[u8; 4]> {
        let buffer = self
            .buffers
            .get(&tensor.buffer)
            .expect("allocate always inserts a backing buffer");
        let bytes = self
            .backend
            .read(buffer, index * ELEMENT_SIZE_BYTES as usize, ELEMENT_SIZE_BYTES as usize)?;
        self.readbacks += 1;
        let mut out = [0u8; 4];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostBackend;

    #[test]
    fn allocate_with_a_zero_dimension_fails() {
        let mut mgr = TensorMemoryManager::new(HostBackend, 512, 8);
        assert!(mgr.allocate(vec![4, 0], DataType::Float, false).is_err());
    }

    #[test]
    fn writeback_then_readback_round_trips() {
        let mut mgr = TensorMemoryManager::new(HostBackend, 512, 8);
        let tensor = mgr.allocate(vec![1], DataType::Float, false).unwrap();
        let bits = DataType::encode_f32(3.5);
        mgr.writeback_value(&tensor, 0, bits).unwrap();
        assert_eq!(mgr.readback_value(&tensor, 0).unwrap(), bits);
        assert_eq!(mgr.readbacks, 1);
        assert_eq!(mgr.writebacks, 1);
    }

    #[test]
    fn free_returns_the_buffer_to_the_pool_for_reuse() {
        let mut mgr = TensorMemoryManager::new(HostBackend, 512, 8);
        let a = mgr.allocate(vec![4], DataType::Float, false).unwrap();
        mgr.free(&a);
        let b = mgr.allocate(vec![2], DataType::Float, false).unwrap();
        assert_eq!(a.buffer, b.buffer);
    }
}
