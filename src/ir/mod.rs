//! The intermediate representation arena (C4).
//!
//! Nodes live in a single `Vec` indexed by [`NodeId`] rather than behind
//! `Rc<RefCell<_>>` pointers: a freed node's slot is never reclaimed, so a
//! stale id is just inert data instead of a dangling pointer, and the whole
//! graph can be walked, snapshotted, or rolled back without fighting the
//! borrow checker over shared mutable ownership.

mod cursor;
mod graph;
mod iter;
mod node;

pub use cursor::Cursor;
pub use graph::Ir;
pub use iter::NodeIterator;
pub use node::{IndexingMode, MemoryType, Node, NodeId, NodeState, Payload};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::ArgRole;
    use crate::dtype::DataType;
    use crate::shape::ShapeInfo;

    #[test]
    fn add_node_links_under_root_and_infers_dtype() {
        let mut ir = Ir::new();
        let a = ir
            .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
            .unwrap();
        let b = ir
            .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
            .unwrap();
        let sum = ir
            .add_node(
                "add",
                None,
                ShapeInfo::scalar(),
                &[(ArgRole::Input, a), (ArgRole::Input, b)],
            )
            .unwrap();
        assert_eq!(ir.node(sum).dtype, DataType::Float);
        assert_eq!(ir.children(ir.root()), vec![a, b, sum]);
    }

    #[test]
    fn mismatched_operand_types_are_rejected() {
        let mut ir = Ir::new();
        let a = ir
            .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
            .unwrap();
        let b = ir
            .add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[])
            .unwrap();
        let err = ir.add_node(
            "add",
            None,
            ShapeInfo::scalar(),
            &[(ArgRole::Input, a), (ArgRole::Input, b)],
        );
        assert!(err.is_err());
    }

    #[test]
    fn update_graph_assigns_increasing_indices_in_execution_order() {
        let mut ir = Ir::new();
        let a = ir
            .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
            .unwrap();
        let b = ir
            .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
            .unwrap();
        ir.update_graph();
        assert!(ir.node(a).index < ir.node(b).index);
        assert_eq!(ir.node(a).true_next, Some(b));
    }

    #[test]
    fn scopes_nest_children_under_the_scope_node_and_resume_after() {
        let mut ir = Ir::new();
        let loop_node = ir.add_node("loop_", None, ShapeInfo::scalar(), &[]).unwrap();
        ir.begin_scope(loop_node);
        let body = ir.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[]).unwrap();
        ir.end_scope().unwrap();
        let after = ir.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[]).unwrap();

        assert_eq!(ir.children(loop_node), vec![body]);
        assert_eq!(ir.children(ir.root()), vec![loop_node, after]);
    }

    #[test]
    fn move_node_to_relocates_into_a_different_parent() {
        let mut ir = Ir::new();
        let loop_node = ir.add_node("loop_", None, ShapeInfo::scalar(), &[]).unwrap();
        let invariant = ir
            .add_node("const_", Some(DataType::Float), ShapeInfo::scalar(), &[])
            .unwrap();
        ir.move_node_to(invariant, ir.root(), Some(loop_node)).unwrap();
        assert_eq!(ir.children(ir.root()), vec![invariant, loop_node]);
    }

    #[test]
    fn end_scope_without_begin_scope_is_an_error() {
        let mut ir = Ir::new();
        assert!(ir.end_scope().is_err());
    }
}
