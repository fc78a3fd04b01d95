//! Graph transforms (C5): the fixed pipeline `Ir::compile` runs a freshly
//! built graph through before it is handed to kernel dispatch.
//!
//! Every pass ends with [`Ir::update_graph`] so the next pass always sees
//! fresh `index`/`true_next` bookkeeping, and logs its name and the node
//! count delta at `debug` level — the ambient logging convention used
//! throughout this crate.

mod autodiff;
mod dce;
mod dealloc;
mod hoist_shapes;
mod indexing;
mod kernelize;
mod lower;
mod optimize;
mod reorder;
mod stats;
mod unroll;
mod versioning;

pub use autodiff::compute_autodiff;
pub use dce::remove_unused_operations;
pub use dealloc::add_memory_deallocation;
pub use hoist_shapes::move_shape_outside_kernels;
pub use indexing::{add_kernel_global_load_store_operations, add_memory_op_indices};
pub use kernelize::{check_kernel_shapes, separate_operations_into_kernels};
pub use lower::insert_algorithmic_primitives;
pub use optimize::optimize_operations;
pub use reorder::reorder_operations;
pub use stats::CompileStats;
pub use unroll::unroll_loops;
pub use versioning::try_replace_modifications_with_versions;

use crate::error::Result;
use crate::ir::Ir;
use crate::options::CompileOptions;

/// Run every pass in the fixed order the specification names them in.
pub fn compile(ir: &mut Ir, options: &CompileOptions) -> Result<CompileStats> {
    run_pass(ir, "reorder_operations", |ir| reorder::reorder_operations(ir))?;
    run_pass(ir, "move_shape_outside_kernels", |ir| {
        hoist_shapes::move_shape_outside_kernels(ir)
    })?;
    run_pass(ir, "optimize_operations", |ir| optimize::optimize_operations(ir))?;
    run_pass(ir, "insert_algorithmic_primitives", |ir| {
        lower::insert_algorithmic_primitives(ir)
    })?;
    run_pass(ir, "unroll_loops", |ir| unroll::unroll_loops(ir, options))?;
    run_pass(ir, "try_replace_modifications_with_versions", |ir| {
        versioning::try_replace_modifications_with_versions(ir)
    })?;
    run_pass(ir, "compute_autodiff", |ir| autodiff::compute_autodiff(ir))?;
    run_pass(ir, "separate_operations_into_kernels", |ir| {
        kernelize::separate_operations_into_kernels(ir, options)
    })?;
    run_pass(ir, "add_kernel_global_load_store_operations", |ir| {
        indexing::add_kernel_global_load_store_operations(ir)
    })?;
    run_pass(ir, "add_memory_op_indices", |ir| {
        indexing::add_memory_op_indices(ir)
    })?;
    run_pass(ir, "check_kernel_shapes", |ir| kernelize::check_kernel_shapes(ir))?;
    run_pass(ir, "add_memory_deallocation", |ir| {
        dealloc::add_memory_deallocation(ir)
    })?;
    run_pass(ir, "remove_unused_operations", |ir| dce::remove_unused_operations(ir))?;

    let before = ir.len();
    let compile_stats = stats::compute_statistics(ir);
    log::debug!("compute_statistics: {} nodes examined", before);
    Ok(compile_stats)
}

fn run_pass(ir: &mut Ir, name: &str, f: impl FnOnce(&mut Ir) -> Result<()>) -> Result<()> {
    let before = ir.len();
    f(ir)?;
    ir.update_graph();
    log::debug!("{name}: {} -> {} nodes", before, ir.len());
    Ok(())
}
