//! Pass 12: insert `deallocate` nodes at the earliest safe point after a
//! temp memory's last read.
//!
//! "Earliest safe" here means: immediately after the consumer with the
//! highest `index` among the memory's readers, inserted as a sibling of
//! that consumer so it executes once, right after the last read, and never
//! inside a loop the memory's own declaration sits outside of.

use crate::arg::ArgRole;
use crate::error::Result;
use crate::ir::{Ir, MemoryType, NodeId};

pub fn add_memory_deallocation(ir: &mut Ir) -> Result<()> {
    let temps = ir.nodes_of_op("memory");
    for mem in temps {
        if ir.node(mem).memory_type != MemoryType::Temp {
            continue;
        }
        if let Some(last_reader) = last_reader_of(ir, mem) {
            ir.execute_after(last_reader);
            ir.add_node(
                "deallocate",
                None,
                ir.node(mem).shape.clone(),
                &[(ArgRole::Memory, mem)],
            )?;
        }
    }
    Ok(())
}

fn last_reader_of(ir: &Ir, mem: NodeId) -> Option<NodeId> {
    ir.node(mem)
        .args
        .outputs()
        .flat_map(|(consumer, ids)| ids.iter().map(move |id| (consumer, id.0)))
        .filter(|(_, role)| *role == ArgRole::Memory)
        .map(|(consumer, _)| consumer)
        .max_by_key(|id| ir.node(*id).index)
}
