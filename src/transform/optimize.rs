//! Pass 3: algebraic simplification and constant folding.
//!
//! Only the handful of laws that are unconditionally safe regardless of
//! floating-point rounding are applied: identity add/mul, double negation,
//! and folding two `const_` operands of a binary arithmetic op into one new
//! `const_`. Anything riskier (e.g. reassociation) is left to a future pass.

use crate::arg::ArgRole;
use crate::dtype::DataType;
use crate::error::Result;
use crate::ir::{Ir, NodeId, Payload};
use crate::shape::ShapeInfo;

pub fn optimize_operations(ir: &mut Ir) -> Result<()> {
    loop {
        let candidates: Vec<NodeId> = ir.iter().filter(|id| ir.node(*id).is_live()).collect();
        let mut changed = false;
        for id in candidates {
            if fold_constant(ir, id)? || simplify_identity(ir, id)? {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    Ok(())
}

fn operand(ir: &Ir, id: NodeId, slot: u32) -> Option<NodeId> {
    ir.node(id).args.get_opt((ArgRole::Input, slot))
}

fn const_value(ir: &Ir, id: NodeId) -> Option<(DataType, [u8; 4])> {
    let node = ir.node(id);
    match &node.payload {
        Payload::Constant(bits) if node.op.name == "const_" => Some((node.dtype, *bits)),
        _ => None,
    }
}

fn fold_constant(ir: &mut Ir, id: NodeId) -> Result<bool> {
    let name = ir.node(id).op.name;
    if !matches!(name, "add" | "sub" | "mul" | "div") {
        return Ok(false);
    }
    let (a, b) = match (operand(ir, id, 0), operand(ir, id, 1)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(false),
    };
    let (dtype, a_bits) = match const_value(ir, a) {
        Some(v) => v,
        None => return Ok(false),
    };
    let (_, b_bits) = match const_value(ir, b) {
        Some(v) => v,
        None => return Ok(false),
    };
    if dtype != DataType::Float {
        // Only float folding is implemented; int/uint folding would need
        // explicit overflow/div-by-zero policy the original does not fix.
        return Ok(false);
    }
    let (x, y) = (DataType::decode_f32(a_bits), DataType::decode_f32(b_bits));
    let folded = match name {
        "add" => x + y,
        "sub" => x - y,
        "mul" => x * y,
        "div" => x / y,
        _ => unreachable!(),
    };

    let replacement = ir.add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])?;
    ir.set_constant_payload(replacement, DataType::encode_f32(folded));
    replace_consumers(ir, id, replacement)?;
    ir.remove_node(id)?;
    Ok(true)
}

fn simplify_identity(ir: &mut Ir, id: NodeId) -> Result<bool> {
    let name = ir.node(id).op.name;
    match name {
        "mul" => {
            if let (Some(a), Some(b)) = (operand(ir, id, 0), operand(ir, id, 1)) {
                if is_const_f32(ir, b, 1.0) {
                    replace_consumers(ir, id, a)?;
                    ir.remove_node(id)?;
                    return Ok(true);
                }
                if is_const_f32(ir, a, 1.0) {
                    replace_consumers(ir, id, b)?;
                    ir.remove_node(id)?;
                    return Ok(true);
                }
            }
        }
        "add" => {
            if let (Some(a), Some(b)) = (operand(ir, id, 0), operand(ir, id, 1)) {
                if is_const_f32(ir, b, 0.0) {
                    replace_consumers(ir, id, a)?;
                    ir.remove_node(id)?;
                    return Ok(true);
                }
                if is_const_f32(ir, a, 0.0) {
                    replace_consumers(ir, id, b)?;
                    ir.remove_node(id)?;
                    return Ok(true);
                }
            }
        }
        "neg" => {
            if let Some(a) = operand(ir, id, 0) {
                if ir.node(a).op.name == "neg" {
                    if let Some(inner) = operand(ir, a, 0) {
                        replace_consumers(ir, id, inner)?;
                        ir.remove_node(id)?;
                        return Ok(true);
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

fn is_const_f32(ir: &Ir, id: NodeId, value: f32) -> bool {
    const_value(ir, id).map_or(false, |(dtype, bits)| {
        dtype == DataType::Float && DataType::decode_f32(bits) == value
    })
}

/// Redirect every recorded consumer of `old` to read `new` instead.
fn replace_consumers(ir: &mut Ir, old: NodeId, new: NodeId) -> Result<()> {
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
