//! Pass 6: convert destructive updates to single-assignment values where it
//! is provably safe.
//!
//! The conservative rule adopted here: a `memory` node with exactly one
//! `store`/`set` writer and no writer inside a loop (no loop-carried
//! dependency, no aliasing from a second writer) can have its readers
//! short-circuited straight to the stored value, bypassing the memory
//! indirection entirely. Any memory with more than one writer, or whose
//! single writer sits inside a loop, is left untouched — versioning it
//! would require proving the loop runs exactly once.

use crate::arg::ArgRole;
use crate::error::Result;
use crate::ir::{Ir, NodeId};
use crate::op::OpClass;

pub fn try_replace_modifications_with_versions(ir: &mut Ir) -> Result<()> {
    let memories = ir.nodes_of_op("memory");
    for mem in memories {
        try_version(ir, mem)?;
    }
    Ok(())
}

fn try_version(ir: &mut Ir, mem: NodeId) -> Result<()> {
    let writers = writers_of(ir, mem);
    let (writer, value) = match writers.as_slice() {
        [single] => *single,
        _ => return Ok(()),
    };
    if ir.node(writer).parent != ir.node(mem).parent {
        // The writer sits in a nested scope (possibly a loop body): not
        // provably single-assignment relative to the memory's own scope.
        return Ok(());
    }

    let readers: Vec<(NodeId, ArgRole, u32)> = ir
        .node(mem)
        .args
        .outputs()
        .flat_map(|(consumer, ids)| ids.iter().map(move |id| (consumer, id.0, id.1)))
        .filter(|(_, role, _)| *role == ArgRole::Memory)
        .filter(|(consumer, _, _)| ir.node(*consumer).op.name == "load")
        .collect();

    for (load_node, _, _) in &readers {
        redirect_value_consumers(ir, *load_node, value)?;
        ir.remove_node(*load_node)?;
    }
    Ok(())
}

fn writers_of(ir: &Ir, mem: NodeId) -> Vec<(NodeId, NodeId)> {
    ir.node(mem)
        .args
        .outputs()
        .flat_map(|(consumer, ids)| ids.iter().map(move |id| (consumer, *id)))
        .filter(|(consumer, (role, _))| {
            *role == ArgRole::Memory && ir.node(*consumer).op.is(OpClass::MODIFIER)
        })
        .filter_map(|(consumer, _)| {
            ir.node(consumer)
                .args
                .get_opt((ArgRole::Input, 0))
                .map(|value| (consumer, value))
        })
        .collect()
}

fn redirect_value_consumers(ir: &mut Ir, load_node: NodeId, value: NodeId) -> Result<()> {
    let consumers: Vec<(NodeId, ArgRole, u32)> = ir
        .node(load_node)
        .args
        .outputs()
        .flat_map(|(consumer, ids)| ids.iter().map(move |id| (consumer, id.0, id.1)))
        .collect();
    for (consumer, role, slot) in consumers {
        ir.node_mut(consumer).args.update((role, slot), value);
        ir.node_mut(value).args.record_output((role, slot), consumer);
    }
    Ok(())
}
