//! Pass 4: lower high-level reductions into an explicit loop with a
//! memory-backed accumulator.
//!
//! `matmul`/`dot`/`transpose`/`squeeze`/`unsqueeze` are left as kernel-native
//! ops for the kernel-scope selector (C5's `separate_operations_into_kernels`)
//! to place directly into a kernel body; only `dim_sum` needs an explicit
//! loop skeleton, since it is the only reduction this crate's autodiff pass
//! (C5 step 7) knows a gradient rule for.

use crate::arg::ArgRole;
use crate::dtype::DataType;
use crate::error::Result;
use crate::ir::{MemoryType, NodeId, Payload};
use crate::ir::Ir;
use crate::shape::ShapeInfo;

pub fn insert_algorithmic_primitives(ir: &mut Ir) -> Result<()> {
    let sums = ir.nodes_of_op("dim_sum");
    for sum in sums {
        lower_dim_sum(ir, sum)?;
    }
    Ok(())
}

fn lower_dim_sum(ir: &mut Ir, sum: NodeId) -> Result<()> {
    let x = match ir.node(sum).args.get_opt((ArgRole::Input, 0)) {
        Some(x) => x,
        None => return Ok(()),
    };
    let dtype = ir.node(x).dtype;
    let x_shape = ir.node(x).shape.clone();
    let axis = resolve_reduction_axis(ir, sum, &x_shape);
    let reduced_axis = axis.and_then(|a| x_shape.dim(a));

    ir.execute_before(sum);

    let staging = ir.add_node("memory", Some(dtype), ir.node(x).shape.clone(), &[])?;
    set_temp(ir, staging);
    ir.add_node(
        "store",
        None,
        ShapeInfo::scalar(),
        &[(ArgRole::Memory, staging), (ArgRole::Input, x)],
    )?;

    let acc = ir.add_node("memory", Some(dtype), ShapeInfo::scalar(), &[])?;
    set_temp(ir, acc);
    let zero = ir.add_node("const_", Some(dtype), ShapeInfo::scalar(), &[])?;
    ir.set_constant_payload(zero, zero_bits(dtype));
    ir.add_node(
        "set",
        None,
        ShapeInfo::scalar(),
        &[(ArgRole::Memory, acc), (ArgRole::Input, zero)],
    )?;

    if let Some(extent) = reduced_axis {
        let loop_node = ir.add_node("loop_", None, ShapeInfo::scalar(), &[(ArgRole::Shape, extent)])?;
        ir.begin_scope(loop_node);
        let idx = ir.add_node("dim_id", None, ShapeInfo::scalar(), &[])?;
        let loaded = ir.add_node(
            "load",
            Some(dtype),
            ShapeInfo::scalar(),
            &[(ArgRole::Memory, staging), (ArgRole::Index, idx)],
        )?;
        ir.add_node(
            "atomic_add",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Memory, acc), (ArgRole::Input, loaded)],
        )?;
        ir.end_scope()?;
    }

    let result = ir.add_node("load", Some(dtype), ShapeInfo::scalar(), &[(ArgRole::Memory, acc)])?;
    redirect_consumers(ir, sum, result)?;
    ir.remove_node(sum)?;
    Ok(())
}

/// The axis `dim_sum` reduces over, resolved against `x_shape`'s rank.
/// Nodes built through [`Ir::add_dim_sum`] carry a resolved
/// [`Payload::Axis`]; anything else (e.g. hand-built in tests) falls back
/// to the last axis, the pre-axis-plumbing behavior.
fn resolve_reduction_axis(ir: &Ir, sum: NodeId, x_shape: &ShapeInfo) -> Option<usize> {
    match &ir.node(sum).payload {
        Payload::Axis(axis) => {
            let rank = x_shape.rank() as i64;
            let resolved = if *axis < 0 { *axis + rank } else { *axis };
            if resolved >= 0 && resolved < rank {
                Some(resolved as usize)
            } else {
                log::warn!("dim_sum node {sum} has an out-of-range axis {axis}; defaulting to the last axis");
                x_shape.rank().checked_sub(1)
            }
        }
        _ => {
            log::warn!("dim_sum node {sum} has no recorded axis; defaulting to the last axis");
            x_shape.rank().checked_sub(1)
        }
    }
}

fn set_temp(ir: &mut Ir, id: NodeId) {
    ir.set_memory_type(id, MemoryType::Temp);
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
