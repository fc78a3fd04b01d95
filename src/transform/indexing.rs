//! Pass 9 (`add_kernel_global_load_store_operations`) and pass 10
//! (`add_memory_op_indices`).
//!
//! Boundary materialization: any value flowing into a kernel from outside,
//! or out of a kernel to an outside consumer, is made an explicit
//! `memory`/`load`/`store` triple instead of a direct edge crossing the
//! kernel's scope — the same "no implicit cross-kernel references" rule the
//! runtime ABI (C8) depends on to schedule kernels independently.

use crate::arg::ArgRole;
use crate::error::Result;
use crate::ir::{Ir, MemoryType, NodeId};

pub fn add_kernel_global_load_store_operations(ir: &mut Ir) -> Result<()> {
    for kernel in ir.nodes_of_op("kernel") {
        materialize_inbound(ir, kernel)?;
        materialize_outbound(ir, kernel)?;
    }
    Ok(())
}

fn descendants(ir: &Ir, root: NodeId) -> std::collections::HashSet<NodeId> {
    ir.iter_from(root).collect()
}

fn materialize_inbound(ir: &mut Ir, kernel: NodeId) -> Result<()> {
    let inside = descendants(ir, kernel);
    let mut already_wrapped: std::collections::HashMap<NodeId, NodeId> = std::collections::HashMap::new();

    let crossing_edges: Vec<(NodeId, ArgRole, u32, NodeId)> = inside
        .iter()
        .flat_map(|&consumer| {
            ir.node(consumer)
                .args
                .arguments()
                .filter(|(id, _)| id.0 == ArgRole::Input)
                .map(move |(id, producer)| (consumer, id.0, id.1, producer))
                .collect::<Vec<_>>()
        })
        .filter(|(_, _, _, producer)| !inside.contains(producer))
        .collect();

    for (consumer, role, slot, producer) in crossing_edges {
        let load = match already_wrapped.get(&producer) {
            Some(&cached) => cached,
            None => {
                let dtype = ir.node(producer).dtype;
                let shape = ir.node(producer).shape.clone();
                let staging = ir.add_node("memory", Some(dtype), shape.clone(), &[])?;
                ir.set_memory_type(staging, MemoryType::Temp);
                ir.execute_before(kernel);
                ir.add_node(
                    "store",
                    None,
                    shape.clone(),
                    &[(ArgRole::Memory, staging), (ArgRole::Input, producer)],
                )?;
                ir.execute_before(*ir.children(kernel).first().unwrap_or(&kernel));
                let load = ir.add_node("load", Some(dtype), shape, &[(ArgRole::Memory, staging)])?;
                already_wrapped.insert(producer, load);
                load
            }
        };
        ir.node_mut(consumer).args.update((role, slot), load);
        ir.node_mut(load).args.record_output((role, slot), consumer);
    }
    Ok(())
}

fn materialize_outbound(ir: &mut Ir, kernel: NodeId) -> Result<()> {
    let inside = descendants(ir, kernel);
    let mut already_wrapped: std::collections::HashMap<NodeId, NodeId> = std::collections::HashMap::new();

    let crossing_edges: Vec<(NodeId, ArgRole, u32, NodeId)> = inside
        .iter()
        .flat_map(|&producer| {
            ir.node(producer)
                .args
                .outputs()
                .flat_map(|(consumer, ids)| ids.iter().map(move |id| (consumer, id.0, id.1, producer)))
                .collect::<Vec<_>>()
        })
        .filter(|(consumer, ..)| !inside.contains(consumer))
        .collect();

    for (consumer, role, slot, producer) in crossing_edges {
        let load = match already_wrapped.get(&producer) {
            Some(&cached) => cached,
            None => {
                let dtype = ir.node(producer).dtype;
                let shape = ir.node(producer).shape.clone();
                let staging = ir.add_node("memory", Some(dtype), shape.clone(), &[])?;
                ir.set_memory_type(staging, MemoryType::Temp);
                ir.execute_after(producer);
                ir.add_node(
                    "store",
                    None,
                    shape.clone(),
                    &[(ArgRole::Memory, staging), (ArgRole::Input, producer)],
                )?;
                ir.execute_after(kernel);
                let load = ir.add_node("load", Some(dtype), shape, &[(ArgRole::Memory, staging)])?;
                already_wrapped.insert(producer, load);
                load
            }
        };
        ir.node_mut(consumer).args.update((role, slot), load);
        ir.node_mut(load).args.record_output((role, slot), consumer);
    }
    Ok(())
}

/// Every `load`/`store`/`set`/`atomic_*` inside a kernel that does not
/// already carry an `Index`-role operand gets one: a shared `thread_id`
/// node created once per kernel and reused by every memory op in it.
pub fn add_memory_op_indices(ir: &mut Ir) -> Result<()> {
    for kernel in ir.nodes_of_op("kernel") {
        let mut thread_index: Option<NodeId> = None;
        let targets: Vec<NodeId> = ir
            .iter_from(kernel)
            .skip(1)
            .filter(|id| {
                matches!(
                    ir.node(*id).op.name,
                    "load" | "store" | "set" | "atomic_add" | "atomic_max" | "atomic_min"
                ) && !ir.node(*id).args.has((ArgRole::Index, 0))
            })
            .collect();
        for target in targets {
            let idx = match thread_index {
                Some(idx) => idx,
                None => {
                    match ir.children(kernel).first() {
                        Some(&first_child) => ir.execute_before(first_child),
                        None => ir.execute_at_end(kernel),
                    }
                    let idx = ir.add_node("thread_id", None, crate::shape::ShapeInfo::scalar(), &[])?;
                    thread_index = Some(idx);
                    idx
                }
            };
            let idx_dtype = ir.node(idx).dtype;
            ir.node_mut(target).args.add((ArgRole::Index, 0), idx, idx_dtype);
            ir.node_mut(idx).args.record_output((ArgRole::Index, 0), target);
        }
    }
    Ok(())
}
