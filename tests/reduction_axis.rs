use tensorc::dtype::DataType;
use tensorc::ir::NodeId;
use tensorc::shape::ShapeInfo;
use tensorc::Ir;

fn dim(ir: &mut Ir, value: i32) -> NodeId {
    let d = ir
        .add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[])
        .unwrap();
    ir.set_constant_payload(d, DataType::encode_i32(value));
    d
}

fn tensor(ir: &mut Ir, dims: &[i32]) -> NodeId {
    let dim_nodes: Vec<NodeId> = dims.iter().map(|&v| dim(ir, v)).collect();
    ir.add_node("memory", Some(DataType::Float), ShapeInfo::new(dim_nodes), &[])
        .unwrap()
}

#[test]
fn dim_sum_with_a_negative_axis_drops_the_corresponding_dimension() {
    let mut ir = Ir::new();
    let x = tensor(&mut ir, &[2, 3, 4]);
    let summed = ir.add_dim_sum(x, -1, false).unwrap();

    let shape = ir.node(summed).shape.clone();
    assert_eq!(shape.rank(), 2);
    assert_eq!(
        tensorc::shape::resolve_constant_dim(&ir, shape.dim(0).unwrap()),
        Some(2)
    );
    assert_eq!(
        tensorc::shape::resolve_constant_dim(&ir, shape.dim(1).unwrap()),
        Some(3)
    );
    assert_eq!(ir.node(summed).special_index, Some(-1));
}

#[test]
fn dim_sum_with_keep_dims_retains_a_size_one_axis() {
    let mut ir = Ir::new();
    let x = tensor(&mut ir, &[2, 3, 4]);
    let summed = ir.add_dim_sum(x, -1, true).unwrap();

    let shape = ir.node(summed).shape.clone();
    assert_eq!(shape.rank(), 3);
    assert_eq!(
        tensorc::shape::resolve_constant_dim(&ir, shape.dim(2).unwrap()),
        Some(1)
    );
}

#[test]
fn dim_sum_axis_out_of_range_is_rejected() {
    let mut ir = Ir::new();
    let x = tensor(&mut ir, &[2, 3, 4]);
    assert!(ir.add_dim_sum(x, 3, false).is_err());
    assert!(ir.add_dim_sum(x, -4, false).is_err());
}
