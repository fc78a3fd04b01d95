//! Pass 2: hoist pure shape-producing nodes above the kernel that would
//! otherwise recompute them once per thread.
//!
//! A node qualifies when it is `STATIC`-classed (no runtime-varying input)
//! and none of its `Input`-role operands are themselves defined inside the
//! kernel being hoisted out of — moving it further out can never change
//! what it computes, only when.

use crate::error::Result;
use crate::ir::{Ir, NodeId};
use crate::op::OpClass;

pub fn move_shape_outside_kernels(ir: &mut Ir) -> Result<()> {
    let kernels = ir.nodes_of_op("kernel");
    for kernel in kernels {
        hoist_from(ir, kernel)?;
    }
    Ok(())
}

fn hoist_from(ir: &mut Ir, kernel: NodeId) -> Result<()> {
    let parent = match ir.node(kernel).parent {
        Some(p) => p,
        None => return Ok(()),
    };

    loop {
        let descendants: Vec<NodeId> = ir.iter_from(kernel).skip(1).collect();
        let body: std::collections::HashSet<NodeId> = descendants.iter().copied().collect();

        let candidate = descendants.iter().copied().find(|&id| {
            let node = ir.node(id);
            node.is_live()
                && node.op.is(OpClass::STATIC)
                && node
                    .args
                    .arguments()
                    .all(|(_, input)| !body.contains(&input))
        });

        match candidate {
            Some(id) => ir.move_node_to(id, parent, Some(kernel))?,
            None => break,
        }
    }
    Ok(())
}
