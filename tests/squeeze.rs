use tensorc::dtype::DataType;
use tensorc::error::Error;
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
fn squeeze_drops_a_constant_one_axis() {
    let mut ir = Ir::new();
    let x = tensor(&mut ir, &[2, 1, 4]);
    let squeezed = ir.add_squeeze(x, 1).unwrap();
    let shape = ir.node(squeezed).shape.clone();
    assert_eq!(shape.rank(), 2);
    assert_eq!(
        tensorc::shape::resolve_constant_dim(&ir, shape.dim(0).unwrap()),
        Some(2)
    );
    assert_eq!(
        tensorc::shape::resolve_constant_dim(&ir, shape.dim(1).unwrap()),
        Some(4)
    );
}

#[test]
fn squeeze_accepts_a_negative_axis() {
    let mut ir = Ir::new();
    let x = tensor(&mut ir, &[2, 4, 1]);
    let squeezed = ir.add_squeeze(x, -1).unwrap();
    assert_eq!(ir.node(squeezed).shape.rank(), 2);
}

#[test]
fn squeezing_a_non_unit_axis_fails() {
    let mut ir = Ir::new();
    let x = tensor(&mut ir, &[2, 3, 4]);
    let err = ir.add_squeeze(x, 1);
    assert!(matches!(err, Err(Error::SqueezeNonUnit { axis: 1, size: 3 })));
}
