use tensorc::arg::ArgRole;
use tensorc::dtype::DataType;
use tensorc::error::Error;
use tensorc::shape::ShapeInfo;
use tensorc::transform;
use tensorc::Ir;

#[test]
fn gradient_request_is_resolved_and_removed_from_the_graph() {
    let mut ir = Ir::new();
    let x = ir
        .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    ir.set_constant_payload(x, DataType::encode_f32(3.0));

    let y = ir
        .add_node(
            "mul",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, x), (ArgRole::Input, x)],
        )
        .unwrap();

    let grad = ir
        .add_node(
            "backwards_grad",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, y), (ArgRole::Input, x)],
        )
        .unwrap();

    ir.update_graph();
    transform::compute_autodiff(&mut ir).unwrap();

    assert!(!ir.node(grad).is_live());
}

#[test]
fn differentiating_through_a_nondifferentiable_op_is_an_error() {
    let mut ir = Ir::new();
    let x = ir
        .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    let reduced = ir
        .add_node("dim_max", None, ShapeInfo::scalar(), &[(ArgRole::Input, x)])
        .unwrap();
    let _grad = ir
        .add_node(
            "backwards_grad",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, reduced), (ArgRole::Input, x)],
        )
        .unwrap();

    ir.update_graph();
    let err = transform::compute_autodiff(&mut ir);
    assert!(matches!(err, Err(Error::NonDifferentiableOp(_))));
}

#[test]
fn sum_of_squares_gradient_produces_two_mul_contributions_summed_once() {
    let mut ir = Ir::new();
    let x = ir
        .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
        .unwrap();
    ir.set_constant_payload(x, DataType::encode_f32(3.0));

    let squared = ir
        .add_node(
            "mul",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, x), (ArgRole::Input, x)],
        )
        .unwrap();
    let y = ir
        .add_node("dim_sum", None, ShapeInfo::scalar(), &[(ArgRole::Input, squared)])
        .unwrap();
    let grad = ir
        .add_node(
            "backwards_grad",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, y), (ArgRole::Input, x)],
        )
        .unwrap();

    ir.update_graph();
    transform::compute_autodiff(&mut ir).unwrap();
    assert!(!ir.node(grad).is_live());

    // The backward rule through `dim_sum` broadcasts the seed cotangent
    // back across x's pre-reduction shape, then `mul`'s backward rule
    // scatters it into one contribution per operand slot, summed by a
    // single `add` node -- the structure `2*x` takes before constant
    // folding collapses it.
    let new_muls: Vec<_> = ir
        .iter()
        .filter(|&id| id != squared && ir.node(id).is_live() && ir.node(id).op.name == "mul")
        .collect();
    assert_eq!(new_muls.len(), 2);
    for &m in &new_muls {
        let operands: Vec<_> = ir.node(m).args.arguments_of(ArgRole::Input).map(|(_, n)| n).collect();
        assert!(operands.contains(&x));
    }

    let sums: Vec<_> = ir
        .iter()
        .filter(|&id| ir.node(id).is_live() && ir.node(id).op.name == "add")
        .collect();
    assert_eq!(sums.len(), 1);
    let sum_operands: Vec<_> = ir.node(sums[0]).args.arguments_of(ArgRole::Input).map(|(_, n)| n).collect();
    assert!(new_muls.iter().all(|m| sum_operands.contains(m)));
}
