use tensorc::backend::HostBackend;
use tensorc::dtype::DataType;
use tensorc::memory_manager::TensorMemoryManager;

#[test]
fn allocating_and_freeing_lets_a_later_request_reuse_the_buffer() {
    let mut mgr = TensorMemoryManager::new(HostBackend, 512, 8);
    let a = mgr.allocate(vec![4, 4], DataType::Float, false).unwrap();
    let buffer = a.buffer;
    mgr.free(&a);
    let b = mgr.allocate(vec![4, 4], DataType::Float, false).unwrap();
    assert_eq!(buffer, b.buffer);
}

#[test]
fn zero_sized_dimension_is_rejected() {
    let mut mgr = TensorMemoryManager::new(HostBackend, 512, 8);
    assert!(mgr.allocate(vec![0, 4], DataType::Float, false).is_err());
}

#[test]
fn allocate_with_data_round_trips_through_the_backend() {
    let mut mgr = TensorMemoryManager::new(HostBackend, 512, 8);
    let bits = DataType::encode_f32(7.0);
    let tensor = mgr
        .allocate_with_data(vec![1], &bits, DataType::Float, false)
        .unwrap();
    assert_eq!(mgr.readback_value(&tensor, 0).unwrap(), bits);
}
