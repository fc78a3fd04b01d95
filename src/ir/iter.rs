//! Depth-first, child-before-sibling traversal over the arena.

use super::{Ir, NodeId};

/// Visits `root` and its descendants in the order the runtime ABI (C8) will
/// eventually execute them: a node before any of its children, a child
/// before its next sibling.
pub struct NodeIterator<'a> {
    ir: &'a Ir,
    stack: Vec<NodeId>,
}

impl<'a> NodeIterator<'a> {
    pub fn new(ir: &'a Ir, root: NodeId) -> Self {
        NodeIterator {
            ir,
            stack: vec![root],
        }
    }
}

impl<'a> Iterator for NodeIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        let node = self.ir.node(current);
        if let Some(next) = node.next_sibling {
            self.stack.push(next);
        }
        if let Some(child) = node.first_child {
            self.stack.push(child);
        }
        Some(current)
    }
}
