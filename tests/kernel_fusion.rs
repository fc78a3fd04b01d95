use tensorc::arg::ArgRole;
use tensorc::dtype::DataType;
use tensorc::ir::MemoryType;
use tensorc::options::CompileOptions;
use tensorc::shape::ShapeInfo;
use tensorc::transform;
use tensorc::Ir;

#[test]
fn adjacent_compatible_ops_are_fused_into_one_kernel() {
    let mut ir = Ir::new();
    let mem_a = ir
        .add_node("memory", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    ir.set_memory_type(mem_a, MemoryType::Input);
    let mem_b = ir
        .add_node("memory", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    ir.set_memory_type(mem_b, MemoryType::Input);

    let a = ir
        .add_node("load", Some(DataType::Float), ShapeInfo::scalar(), &[(ArgRole::Memory, mem_a)])
        .unwrap();
    let b = ir
        .add_node("load", Some(DataType::Float), ShapeInfo::scalar(), &[(ArgRole::Memory, mem_b)])
        .unwrap();
    let sum = ir
        .add_node(
            "add",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, a), (ArgRole::Input, b)],
        )
        .unwrap();
    let doubled = ir
        .add_node(
            "mul",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, sum), (ArgRole::Input, sum)],
        )
        .unwrap();
    ir.set_memory_type(doubled, MemoryType::Output);

    ir.update_graph();
    let options = CompileOptions::default();
    transform::compile(&mut ir, &options).unwrap();

    assert!(!ir.nodes_of_op("kernel").is_empty());
}
