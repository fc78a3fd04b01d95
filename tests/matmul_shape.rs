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
fn matmul_broadcasts_batch_dims_and_yields_the_expected_shape() {
    let mut ir = Ir::new();
    let a = tensor(&mut ir, &[2, 3, 4]);
    let b = tensor(&mut ir, &[4, 5]);
    let c = ir.add_matmul(a, b).unwrap();

    let expected = [2, 3, 5];
    let shape = ir.node(c).shape.clone();
    assert_eq!(shape.rank(), expected.len());
    for (i, &want) in expected.iter().enumerate() {
        let got = tensorc::shape::resolve_constant_dim(&ir, shape.dim(i).unwrap());
        assert_eq!(got, Some(want as i64));
    }
}

#[test]
fn matmul_broadcasts_a_size_one_batch_dim_against_a_larger_one() {
    let mut ir = Ir::new();
    let a = tensor(&mut ir, &[3, 4]);
    let b = tensor(&mut ir, &[2, 1, 4, 5]);
    let c = ir.add_matmul(a, b).unwrap();

    let expected = [2, 1, 3, 5];
    let shape = ir.node(c).shape.clone();
    assert_eq!(shape.rank(), expected.len());
    for (i, &want) in expected.iter().enumerate() {
        let got = tensorc::shape::resolve_constant_dim(&ir, shape.dim(i).unwrap());
        assert_eq!(got, Some(want as i64));
    }
}

#[test]
fn matmul_rejects_a_mismatched_inner_dimension() {
    let mut ir = Ir::new();
    let a = tensor(&mut ir, &[3, 4]);
    let b = tensor(&mut ir, &[5, 5]);
    let err = ir.add_matmul(a, b);
    assert!(matches!(err, Err(Error::InnerDimensionMismatch { .. })));
}
