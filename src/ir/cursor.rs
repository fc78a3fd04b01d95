//! Where the next node built by [`super::Ir::add_node`] gets linked in.

use super::NodeId;

/// New nodes are always inserted as children of `parent`, immediately before
/// `before` (or appended as the last child when `before` is `None`).
///
/// This is deliberately decoupled from the scope stack: [`super::Ir::execute_before`]
/// and [`super::Ir::execute_after`] can retarget the cursor to splice nodes
/// into the middle of an already-built region (used by constant folding and
/// dead store elimination) without opening a new scope.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub parent: NodeId,
    pub before: Option<NodeId>,
}

impl Cursor {
    pub fn at_end_of(parent: NodeId) -> Self {
        Cursor { parent, before: None }
    }

    pub fn before(parent: NodeId, before: NodeId) -> Self {
        Cursor {
            parent,
            before: Some(before),
        }
    }
}
