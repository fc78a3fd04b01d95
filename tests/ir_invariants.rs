use tensorc::arg::ArgRole;
use tensorc::dtype::DataType;
use tensorc::shape::ShapeInfo;
use tensorc::Ir;

#[test]
fn every_input_edge_has_the_producer_before_the_consumer_after_update_graph() {
    let mut ir = Ir::new();
    let a = ir
        .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    let b = ir
        .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    let sum = ir
        .add_node(
            "add",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, a), (ArgRole::Input, b)],
        )
        .unwrap();
    ir.update_graph();

    assert!(ir.assert_topological(a, sum).is_ok());
    assert!(ir.assert_topological(b, sum).is_ok());
}

#[test]
fn update_graph_is_idempotent() {
    let mut ir = Ir::new();
    let a = ir
        .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    ir.update_graph();
    let first_index = ir.node(a).index;
    ir.update_graph();
    assert_eq!(ir.node(a).index, first_index);
}

#[test]
fn removing_a_node_requires_it_to_not_be_root() {
    let mut ir = Ir::new();
    assert!(ir.remove_node(ir.root()).is_err());
}

#[test]
fn ending_a_scope_more_times_than_it_was_begun_is_an_error() {
    let mut ir = Ir::new();
    let loop_node = ir.add_node("loop_", None, ShapeInfo::scalar(), &[]).unwrap();
    ir.begin_scope(loop_node);
    ir.end_scope().unwrap();
    assert!(ir.end_scope().is_err());
}
