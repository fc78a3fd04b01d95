//! The node type stored in the [`super::Ir`] arena, and its small satellite
//! enums.

use crate::arg::ArgumentManager;
use crate::dtype::DataType;
use crate::op::Operation;
use crate::shape::ShapeInfo;

/// An index into the arena. Stable for the lifetime of the node: removal
/// marks a node [`NodeState::Freed`] rather than compacting the arena, so an
/// id is never reused for an unrelated node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Lifecycle of a single node, mirroring the stages the graph transforms
/// (C5) drive a node through.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeState {
    /// Reserved a slot (e.g. a loop body's induction variable) before its
    /// operation and arguments are known.
    Placeholder,
    /// Fully constructed and live in the graph.
    Initialized,
    /// Initialized, then rewritten in place by a later pass (e.g. operand
    /// replacement during constant folding) without changing identity.
    Modified,
    /// Unlinked from its parent/siblings but its id is still valid and
    /// referenced by argument edges pending cleanup.
    Detached,
    /// Fully removed; the id must never be dereferenced again.
    Freed,
}

/// Where a node's value lives at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemoryType {
    /// Not a memory node.
    None,
    /// Supplied by the caller of the compiled kernel.
    Input,
    /// Read back by the caller after execution.
    Output,
    /// Scratch space allocated and freed within one run, candidate for the
    /// buffer pool (C6).
    Temp,
    /// Holds a shape dimension value.
    Shape,
    /// Holds an inline constant payload.
    Constant,
}

/// Out-of-bounds behavior for indexed memory access within a kernel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexingMode {
    Unsafe,
    Clamp,
    Repeat,
    Zero,
}

impl Default for IndexingMode {
    fn default() -> Self {
        IndexingMode::Unsafe
    }
}

/// The inline value a node carries, when it carries one directly instead of
/// through a memory edge.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Payload {
    None,
    /// The 4-byte little-endian encoding of a `const_` node's value; decode
    /// with [`DataType::decode_f32`] and friends according to `dtype`.
    Constant([u8; 4]),
    /// An opaque handle into the tensor memory manager (C7), assigned during
    /// memory indexing (one of the C5 passes) and consumed by the runtime
    /// ABI (C8).
    Buffer(u64),
    /// A resolved (non-negative) reduction or squeeze axis.
    Axis(i64),
    /// A kernel's per-dimension dispatch tile size.
    GroupSize(Vec<usize>),
}

#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub op: Operation,
    pub dtype: DataType,
    pub shape: ShapeInfo,
    pub args: ArgumentManager,
    pub payload: Payload,
    pub state: NodeState,
    pub memory_type: MemoryType,
    pub indexing_mode: IndexingMode,
    pub name: Option<String>,

    /// Per-dimension dispatch tile size, set on kernel nodes during
    /// kernelization (C5). Empty until then.
    pub group_size: Vec<usize>,
    /// Whether every value this node depends on is known at compile time.
    /// Distinct from [`crate::op::OpClass::STATIC`], which tags an
    /// operation regardless of its actual inputs; this flag reflects the
    /// specific instance's inputs.
    pub is_static: bool,
    /// The original, possibly-negative axis the caller supplied before it
    /// was canonicalized into `Payload::Axis`; kept for error messages and
    /// debug listing.
    pub special_index: Option<i64>,
    /// Whether a reduction kept its reduced axis as a size-1 dimension
    /// rather than dropping it.
    pub keep_dims: bool,

    /// Assigned by [`super::Ir::update_graph`]; the node's position in
    /// depth-first (child-before-sibling) order. `-1` until first assigned.
    pub index: i64,

    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,

    /// Depth-first predecessor/successor across the *entire* graph,
    /// irrespective of scope nesting — the order the runtime ABI (C8)
    /// actually executes nodes in. Rebuilt by `update_graph`.
    pub true_prev: Option<NodeId>,
    pub true_next: Option<NodeId>,

    /// A rough per-node cost estimate populated by the diagnostics pass,
    /// in made-up "work units" (1 plus the argument count, scaled by any
    /// known loop trip count). Used only for `print_listing`/`stats`
    /// output, never by a correctness-affecting decision.
    pub cost: f64,
}

impl Node {
    pub(super) fn new(id: NodeId, op: Operation, dtype: DataType, shape: ShapeInfo) -> Self {
        Node {
            id,
            op,
            dtype,
            shape,
            args: ArgumentManager::new(),
            payload: Payload::None,
            state: NodeState::Placeholder,
            memory_type: MemoryType::None,
            indexing_mode: IndexingMode::default(),
            name: None,
            group_size: Vec::new(),
            is_static: op.is(crate::op::OpClass::STATIC),
            special_index: None,
            keep_dims: false,
            index: -1,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            true_prev: None,
            true_next: None,
            cost: 0.0,
        }
    }

    pub fn is_live(&self) -> bool {
        !matches!(self.state, NodeState::Detached | NodeState::Freed)
    }

    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}
