//! Pass 14: diagnostics. Populates each live node's `cost` and returns a
//! summary the caller can log or assert on in tests.

use crate::ir::{Ir, MemoryType};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CompileStats {
    pub node_count: usize,
    pub kernel_count: usize,
    pub input_memory_count: usize,
    pub output_memory_count: usize,
    pub temp_memory_count: usize,
}

pub fn compute_statistics(ir: &mut Ir) -> CompileStats {
    let live: Vec<_> = ir.iter().filter(|id| ir.node(*id).is_live()).collect();
    for &id in &live {
        let cost = 1.0 + ir.node(id).args.arguments().count() as f64;
        ir.node_mut(id).cost = cost;
    }

    let kernel_count = live.iter().filter(|id| ir.node(**id).op.name == "kernel").count();
    let input_memory_count = live
        .iter()
        .filter(|id| ir.node(**id).memory_type == MemoryType::Input)
        .count();
    let output_memory_count = live
        .iter()
        .filter(|id| ir.node(**id).memory_type == MemoryType::Output)
        .count();
    let temp_memory_count = live
        .iter()
        .filter(|id| ir.node(**id).memory_type == MemoryType::Temp)
        .count();

    CompileStats {
        node_count: live.len(),
        kernel_count,
        input_memory_count,
        output_memory_count,
        temp_memory_count,
    }
}
