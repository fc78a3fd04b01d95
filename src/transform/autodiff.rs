//! Pass 7: reverse-mode automatic differentiation.
//!
//! Each `backwards_grad(y, x)` node requests d y / d x. The pass seeds a
//! cotangent of `1` at `y`, walks `y`'s ancestry in descending `index` order
//! (so every consumer's cotangent is fully accumulated before its
//! producers are visited), and applies a local backward rule per operation.
//! `Nondiff`-classed operations encountered with a live cotangent abort the
//! whole compile with `Error::NonDifferentiableOp`; `detach_grad` stops
//! propagation deliberately, the same way it would in a hand-written
//! autodiff rule.

use crate::arg::ArgRole;
use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::ir::{Ir, NodeId};
use crate::op::OpClass;
use crate::shape::ShapeInfo;

pub fn compute_autodiff(ir: &mut Ir) -> Result<()> {
    let requests = ir.nodes_of_op("backwards_grad");
    for request in requests {
        differentiate(ir, request)?;
    }
    Ok(())
}

fn differentiate(ir: &mut Ir, request: NodeId) -> Result<()> {
    let y = ir.node(request).args.get((ArgRole::Input, 0))?;
    let x = ir.node(request).args.get((ArgRole::Input, 1))?;
    let dtype = ir.node(y).dtype;

    let mut cotangents: std::collections::HashMap<NodeId, NodeId> = std::collections::HashMap::new();
    let one = ir.add_node("const_", Some(dtype), ShapeInfo::scalar(), &[])?;
    ir.set_constant_payload(one, one_bits(dtype));
    cotangents.insert(y, one);

    let mut order: Vec<NodeId> = ancestors_including(ir, y);
    order.sort_by_key(|id| std::cmp::Reverse(ir.node(*id).index));

    for n in order {
        let cot_n = match cotangents.get(&n).copied() {
            Some(c) => c,
            None => continue,
        };
        propagate(ir, n, cot_n, &mut cotangents)?;
    }

    let result = match cotangents.get(&x).copied() {
        Some(g) => g,
        None => {
            log::warn!("no path from {y} to {x}; gradient is zero");
            let zero = ir.add_node("const_", Some(dtype), ShapeInfo::scalar(), &[])?;
            ir.set_constant_payload(zero, zero_bits(dtype));
            zero
        }
    };

    redirect_consumers(ir, request, result)?;
    ir.remove_node(request)?;
    Ok(())
}

fn propagate(
    ir: &mut Ir,
    n: NodeId,
    cot: NodeId,
    cotangents: &mut std::collections::HashMap<NodeId, NodeId>,
) -> Result<()> {
    let name = ir.node(n).op.name.to_string();
    let a = ir.node(n).args.get_opt((ArgRole::Input, 0));
    let b = ir.node(n).args.get_opt((ArgRole::Input, 1));

    match name.as_str() {
        "add" => {
            accumulate(ir, cotangents, a, cot)?;
            accumulate(ir, cotangents, b, cot)?;
        }
        "sub" => {
            accumulate(ir, cotangents, a, cot)?;
            if let Some(b) = b {
                let neg_cot = ir.add_node("neg", None, ShapeInfo::scalar(), &[(ArgRole::Input, cot)])?;
                accumulate(ir, cotangents, Some(b), neg_cot)?;
            }
        }
        "mul" => {
            if let (Some(a), Some(b)) = (a, b) {
                let grad_a = ir.add_node(
                    "mul",
                    None,
                    ShapeInfo::scalar(),
                    &[(ArgRole::Input, cot), (ArgRole::Input, b)],
                )?;
                let grad_b = ir.add_node(
                    "mul",
                    None,
                    ShapeInfo::scalar(),
                    &[(ArgRole::Input, cot), (ArgRole::Input, a)],
                )?;
                accumulate(ir, cotangents, Some(a), grad_a)?;
                accumulate(ir, cotangents, Some(b), grad_b)?;
            }
        }
        "div" => {
            if let (Some(a), Some(b)) = (a, b) {
                let grad_a = ir.add_node(
                    "div",
                    None,
                    ShapeInfo::scalar(),
                    &[(ArgRole::Input, cot), (ArgRole::Input, b)],
                )?;
                let a_over_b2 = ir.add_node(
                    "div",
                    None,
                    ShapeInfo::scalar(),
                    &[(ArgRole::Input, a), (ArgRole::Input, b)],
                )?;
                let a_over_b2 = ir.add_node(
                    "div",
                    None,
                    ShapeInfo::scalar(),
                    &[(ArgRole::Input, a_over_b2), (ArgRole::Input, b)],
                )?;
                let scaled = ir.add_node(
                    "mul",
                    None,
                    ShapeInfo::scalar(),
                    &[(ArgRole::Input, cot), (ArgRole::Input, a_over_b2)],
                )?;
                let grad_b = ir.add_node("neg", None, ShapeInfo::scalar(), &[(ArgRole::Input, scaled)])?;
                accumulate(ir, cotangents, Some(a), grad_a)?;
                accumulate(ir, cotangents, Some(b), grad_b)?;
            }
        }
        "neg" => {
            if let Some(a) = a {
                let negated = ir.add_node("neg", None, ShapeInfo::scalar(), &[(ArgRole::Input, cot)])?;
                accumulate(ir, cotangents, Some(a), negated)?;
            }
        }
        "reshape" | "transpose" | "squeeze" | "unsqueeze" | "pass_grad" => {
            accumulate(ir, cotangents, a, cot)?;
        }
        "dim_sum" => {
            if let Some(a) = a {
                let pre_shape = ir.node(a).shape.clone();
                let grad = ir.add_node("broadcast", None, pre_shape, &[(ArgRole::Input, cot)])?;
                accumulate(ir, cotangents, Some(a), grad)?;
            }
        }
        "detach_grad" => {}
        _ => {
            if ir.node(n).op.is(OpClass::NONDIFF) && a.is_some() {
                return Err(Error::NonDifferentiableOp(name));
            }
            log::warn!("no backward rule for `{name}`; gradient stops here");
        }
    }
    Ok(())
}

fn accumulate(
    ir: &mut Ir,
    cotangents: &mut std::collections::HashMap<NodeId, NodeId>,
    target: Option<NodeId>,
    contribution: NodeId,
) -> Result<()> {
    let target = match target {
        Some(t) => t,
        None => return Ok(()),
    };
    match cotangents.get(&target).copied() {
        Some(existing) => {
            let summed = ir.add_node(
                "add",
                None,
                ShapeInfo::scalar(),
                &[(ArgRole::Input, existing), (ArgRole::Input, contribution)],
            )?;
            cotangents.insert(target, summed);
        }
        None => {
            cotangents.insert(target, contribution);
        }
    }
    Ok(())
}

fn ancestors_including(ir: &Ir, y: NodeId) -> Vec<NodeId> {
    let mut seen = std::collections::HashSet::new();
    let mut stack = vec![y];
    let mut order = Vec::new();
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        order.push(n);
        for (_, input) in ir.node(n).args.arguments_of(ArgRole::Input) {
            stack.push(input);
        }
    }
    order
}

fn one_bits(dtype: DataType) -> [u8; 4] {
    match dtype {
        DataType::Float => DataType::encode_f32(1.0),
        DataType::Bool => DataType::encode_bool(true),
        DataType::Int => DataType::encode_i32(1),
        DataType::Uint | DataType::None => DataType::encode_u32(1),
    }
}

fn zero_bits(dtype: DataType) -> [u8; 4] {
    match dtype {
        DataType::Float => DataType::encode_f32(0.0),
        DataType::Bool => DataType::encode_bool(false),
        DataType::Int => DataType::encode_i32(0),
        DataType::Uint | DataType::None => DataType::encode_u32(0),
    }
}

fn redirect_consumers(ir: &mut Ir, old: NodeId, new: NodeId) -> Result<()> {
    let consumers: Vec<(NodeId, ArgRole, u32)> = ir
        .node(old)
        .args
        .outputs()
        .flat_map(|(consumer, ids)| ids.iter().map(move |id| (consumer, id.0, id.1)))
        .collect();
    for (consumer, role, slot) in consumers {
        ir.node_mut(consumer).args.update((role, slot), new);
        ir.node_mut(new).args.record_output((role, slot), consumer);
    }
    Ok(())
}
