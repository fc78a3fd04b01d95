//! Pass 13: dead code elimination.
//!
//! A node is removable when it has no recorded consumers, is not the root,
//! and has no side effect of its own (`Modifier`-classed ops — stores,
//! atomics, deallocation — are kept even with no value consumers, since
//! their entire purpose is the side effect). Runs to a fixpoint because
//! removing one dead node can make its own operands dead in turn.

use crate::error::Result;
use crate::ir::{Ir, MemoryType, NodeId};
use crate::op::OpClass;

pub fn remove_unused_operations(ir: &mut Ir) -> Result<()> {
    loop {
        let live: Vec<NodeId> = ir.iter().filter(|id| ir.node(*id).is_live()).collect();
        let mut removed_any = false;
        for id in live {
            if id == ir.root() {
                continue;
            }
            if is_removable(ir, id) {
                ir.remove_node(id)?;
                removed_any = true;
            }
        }
        if !removed_any {
            break;
        }
    }
    remove_empty_kernels(ir)?;
    Ok(())
}

fn is_removable(ir: &Ir, id: NodeId) -> bool {
    let node = ir.node(id);
    if node.has_children() {
        return false;
    }
    if node.op.is(OpClass::MODIFIER) {
        return false;
    }
    if node.memory_type == MemoryType::Output {
        return false;
    }
    node.args.outputs().next().is_none()
}

fn remove_empty_kernels(ir: &mut Ir) -> Result<()> {
    for kernel in ir.nodes_of_op("kernel") {
        if ir.node(kernel).is_live() && !ir.node(kernel).has_children() {
            ir.remove_node(kernel)?;
        }
    }
    Ok(())
}
