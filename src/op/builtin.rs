//! The builtin operation list.
//!
//! Grouped the way the component that supplements this module later (kernel
//! lowering, C5) expects to find them: arithmetic, comparisons, boolean
//! logic, casts, reductions, memory, structured control, constants, memory
//! declaration, indexing, shape ops, the gradient request marker, region
//! markers, and the synthetic root op.

use super::catalog::OpCatalog;
use super::signature::*;
use super::{Operation, OpClass};

const NONE: OpClass = OpClass::empty();

pub(super) fn register_all(catalog: &mut OpCatalog) {
    register_arithmetic(catalog);
    register_comparisons(catalog);
    register_boolean(catalog);
    register_casts(catalog);
    register_reductions(catalog);
    register_memory_ops(catalog);
    register_control(catalog);
    register_constant(catalog);
    register_memory_decl(catalog);
    register_indexing(catalog);
    register_shape_ops(catalog);
    register_gradient(catalog);
    register_regions(catalog);
    register_root(catalog);
}

fn register_arithmetic(catalog: &mut OpCatalog) {
    catalog.register(Operation::new(
        "add",
        NONE,
        accepts_binary_numeric_same,
        output_same_as_first,
    ));
    catalog.register(Operation::new(
        "sub",
        NONE,
        accepts_binary_numeric_same,
        output_same_as_first,
    ));
    catalog.register(Operation::new(
        "mul",
        NONE,
        accepts_binary_numeric_same,
        output_same_as_first,
    ));
    catalog.register(Operation::new(
        "div",
        NONE,
        accepts_binary_numeric_same,
        output_same_as_first,
    ));
    catalog.register(Operation::new(
        "mod_",
        NONE,
        accepts_binary_numeric_same,
        output_same_as_first,
    ));
    catalog.register(Operation::new(
        "neg",
        NONE,
        accepts_unary_numeric,
        output_same_as_first,
    ));
}

fn register_comparisons(catalog: &mut OpCatalog) {
    for name in ["eq", "neq", "lt", "lte", "gt", "gte"] {
        catalog.register(Operation::new(name, NONE, accepts_binary_same, output_bool));
    }
}

fn register_boolean(catalog: &mut OpCatalog) {
    catalog.register(Operation::new("and", NONE, accepts_binary_bool, output_bool_always));
    catalog.register(Operation::new("or", NONE, accepts_binary_bool, output_bool_always));
    catalog.register(Operation::new("not", NONE, accepts_unary_bool, output_bool_always));
}

fn register_casts(catalog: &mut OpCatalog) {
    catalog.register(Operation::new("cast_float", NONE, accepts_unary_any, output_float));
    catalog.register(Operation::new("cast_int", NONE, accepts_unary_any, output_int));
    catalog.register(Operation::new("cast_uint", NONE, accepts_unary_any, output_uint));
    catalog.register(Operation::new(
        "cast_bool",
        NONE,
        accepts_unary_any,
        output_bool_always,
    ));
}

fn register_reductions(catalog: &mut OpCatalog) {
    // Only `dim_sum` has a broadcast backward rule implemented by autodiff;
    // the others are structurally valid but not yet differentiable.
    catalog.register(Operation::new(
        "dim_sum",
        NONE,
        accepts_unary_numeric,
        output_same_as_first,
    ));
    for name in ["dim_max", "dim_min", "dim_prod"] {
        catalog.register(Operation::new(
            name,
            OpClass::NONDIFF,
            accepts_unary_numeric,
            output_same_as_first,
        ));
    }
}

fn register_memory_ops(catalog: &mut OpCatalog) {
    catalog.register(Operation::new(
        "load",
        OpClass::MEMORY_OP,
        accepts_none,
        output_none,
    ));
    catalog.register(Operation::new(
        "store",
        OpClass::MEMORY_OP.union(OpClass::MODIFIER),
        accepts_unary_any,
        output_none,
    ));
    catalog.register(Operation::new(
        "set",
        OpClass::MEMORY_OP.union(OpClass::MODIFIER),
        accepts_unary_any,
        output_none,
    ));
    catalog.register(Operation::new(
        "deallocate",
        OpClass::MEMORY_OP
            .union(OpClass::MODIFIER)
            .union(OpClass::NONDIFF),
        accepts_none,
        output_none,
    ));
    for name in ["atomic_add", "atomic_max", "atomic_min"] {
        catalog.register(Operation::new(
            name,
            OpClass::MEMORY_OP.union(OpClass::MODIFIER),
            accepts_unary_numeric,
            output_none,
        ));
    }
}

fn register_control(catalog: &mut OpCatalog) {
    for name in ["loop_", "if_", "kernel"] {
        catalog.register(Operation::new(name, NONE, accepts_variadic, output_none));
    }
    for name in ["break_", "continue_"] {
        catalog.register(Operation::new(
            name,
            OpClass::NONDIFF,
            accepts_none,
            output_none,
        ));
    }
}

fn register_constant(catalog: &mut OpCatalog) {
    catalog.register(Operation::new(
        "const_",
        OpClass::CONSTANT.union(OpClass::STATIC),
        accepts_none,
        output_none,
    ));
}

fn register_memory_decl(catalog: &mut OpCatalog) {
    catalog.register(Operation::new(
        "memory",
        OpClass::MEMORY_OP,
        accepts_none,
        output_none,
    ));
    catalog.register(Operation::new(
        "input_shape",
        OpClass::MEMORY_OP.union(OpClass::STATIC),
        accepts_none,
        output_int,
    ));
}

fn register_indexing(catalog: &mut OpCatalog) {
    for name in ["dim_id", "thread_id", "block_id", "block_thread_id"] {
        catalog.register(Operation::new(
            name,
            OpClass::STATIC.union(OpClass::NONDIFF),
            accepts_none,
            output_int,
        ));
    }
}

fn register_shape_ops(catalog: &mut OpCatalog) {
    for name in ["reshape", "transpose", "squeeze", "unsqueeze"] {
        catalog.register(Operation::new(
            name,
            NONE,
            accepts_unary_any,
            output_same_as_first,
        ));
    }
    for name in ["matmul", "dot"] {
        catalog.register(Operation::new(
            name,
            NONE,
            accepts_binary_numeric_same,
            output_same_as_first,
        ));
    }
    // Re-expands a reduced-shape cotangent back across the axis `dim_sum`
    // collapsed, for the autodiff backward rule; not exposed to the DSL
    // front-end directly.
    catalog.register(Operation::new(
        "broadcast",
        NONE,
        accepts_unary_any,
        output_same_as_first,
    ));
}

fn register_gradient(catalog: &mut OpCatalog) {
    // Input slot 0 is the scalar being differentiated (the "loss"); slot 1
    // is the leaf to differentiate with respect to. Replaced by the
    // computed cotangent once `compute_autodiff` runs.
    catalog.register(Operation::new(
        "backwards_grad",
        OpClass::NONDIFF,
        accepts_binary_same,
        output_same_as_first,
    ));
    // Marks a subgraph boundary the reverse-mode pass must not cross.
    catalog.register(Operation::new(
        "detach_grad",
        NONE,
        accepts_unary_any,
        output_same_as_first,
    ));
    // Forwards the upstream cotangent unchanged, for ops whose local
    // derivative is the identity (e.g. a relabeling reshape).
    catalog.register(Operation::new(
        "pass_grad",
        NONE,
        accepts_unary_any,
        output_same_as_first,
    ));
}

fn register_regions(catalog: &mut OpCatalog) {
    for name in ["begin_region", "end_region"] {
        catalog.register(Operation::new(
            name,
            OpClass::STATIC.union(OpClass::NONDIFF),
            accepts_none,
            output_none,
        ));
    }
}

fn register_root(catalog: &mut OpCatalog) {
    catalog.register(Operation::new(
        "host",
        OpClass::STATIC,
        accepts_none,
        output_none,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DataType;

    #[test]
    fn add_requires_matching_numeric_operands() {
        let mut catalog = OpCatalog::new();
        register_all(&mut catalog);
        let add = catalog.get("add").unwrap();
        assert!(add.accepts(&[DataType::Float, DataType::Float]));
        assert!(!add.accepts(&[DataType::Float, DataType::Int]));
    }

    #[test]
    fn comparisons_output_bool() {
        let mut catalog = OpCatalog::new();
        register_all(&mut catalog);
        let lt = catalog.get("lt").unwrap();
        assert_eq!(
            lt.infer_output_type(&[DataType::Int, DataType::Int]).unwrap(),
            DataType::Bool
        );
    }

    #[test]
    fn dim_max_is_nondifferentiable_but_dim_sum_is_not() {
        let mut catalog = OpCatalog::new();
        register_all(&mut catalog);
        assert!(catalog.get("dim_max").unwrap().is(OpClass::NONDIFF));
        assert!(!catalog.get("dim_sum").unwrap().is(OpClass::NONDIFF));
    }
}
