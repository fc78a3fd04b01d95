use tensorc::ir::NodeId;
use tensorc::shape::{compare, ShapeInfo};
use tensorc::Ir;

#[test]
fn scalars_are_compatible_with_anything_by_broadcast() {
    let ir = Ir::new();
    let scalar = ShapeInfo::scalar();
    let vector = ShapeInfo::new(vec![NodeId::from_raw(1)]);
    let result = compare(&ir, &scalar, &vector, false);
    assert!(result.compatible);
    assert!(result.broadcast);
}

#[test]
fn expand_dimensions_is_a_no_op_at_current_rank() {
    let shape = ShapeInfo::new(vec![NodeId::from_raw(1), NodeId::from_raw(2)]);
    let expanded = shape.expand_dimensions(shape.rank(), NodeId::from_raw(0));
    assert_eq!(expanded, shape);
}
