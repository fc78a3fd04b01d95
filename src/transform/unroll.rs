//! Pass 5: unroll loops whose trip count is a compile-time constant under
//! `options.unroll_threshold`.

use crate::arg::ArgRole;
use crate::dtype::DataType;
use crate::error::Result;
use crate::ir::{Ir, NodeId, Payload};
use crate::options::CompileOptions;
use crate::shape::ShapeInfo;

pub fn unroll_loops(ir: &mut Ir, options: &CompileOptions) -> Result<()> {
    let loops = ir.nodes_of_op("loop_");
    for loop_node in loops {
        if let Some(trip_count) = constant_trip_count(ir, loop_node) {
            if trip_count <= options.unroll_threshold {
                unroll_one(ir, loop_node, trip_count)?;
            }
        }
    }
    Ok(())
}

fn constant_trip_count(ir: &Ir, loop_node: NodeId) -> Option<u32> {
    let extent = ir.node(loop_node).args.get_opt((ArgRole::Shape, 0))?;
    let node = ir.node(extent);
    match (node.op.name, &node.payload) {
        ("const_", Payload::Constant(bits)) if node.dtype == DataType::Int => {
            let value = DataType::decode_i32(*bits);
            (value >= 0).then_some(value as u32)
        }
        _ => None,
    }
}

/// Replace the loop with `trip_count` copies of its body, each with its own
/// fresh `dim_id` constant substituted in. Copies do not share any node ids
/// with the original body, so later passes see a flat, loop-free sequence.
fn unroll_one(ir: &mut Ir, loop_node: NodeId, trip_count: u32) -> Result<()> {
    let parent = ir.node(loop_node).parent.unwrap_or_else(|| ir.root());
    let body = ir.children(loop_node);
    if body.is_empty() {
        ir.remove_node(loop_node)?;
        return Ok(());
    }

    let _ = parent;
    ir.execute_before(loop_node);
    for iteration in 0..trip_count {
        let index_const = ir.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[])?;
        ir.set_constant_payload(index_const, DataType::encode_i32(iteration as i32));
        copy_body(ir, &body, index_const)?;
    }
    ir.remove_node(loop_node)?;
    Ok(())
}

/// Copy every node in `body`, redirecting `dim_id` reads to `index_const`.
/// `Memory`-role edges are redirected, never duplicated: copying the memory
/// they alias would silently change the program's aliasing behavior.
fn copy_body(ir: &mut Ir, body: &[NodeId], index_const: NodeId) -> Result<()> {
    let mut remap: std::collections::HashMap<NodeId, NodeId> = std::collections::HashMap::new();

    for &old in body {
        let node_op = ir.node(old).op.name.to_string();
        if node_op == "dim_id" {
            remap.insert(old, index_const);
            continue;
        }

        let dtype_hint = Some(ir.node(old).dtype);
        let shape = ir.node(old).shape.clone();
        let args: Vec<(ArgRole, NodeId)> = ir
            .node(old)
            .args
            .arguments()
            .map(|(id, target)| (id.0, *remap.get(&target).unwrap_or(&target)))
            .collect();

        let new_id = ir.add_node(&node_op, dtype_hint, shape, &args)?;
        if let Payload::Constant(bits) = &ir.node(old).payload {
            let bits = *bits;
            ir.set_constant_payload(new_id, bits);
        }
        remap.insert(old, new_id);
    }

    Ok(())
}
