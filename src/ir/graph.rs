//! The IR arena (C4): owns every [`Node`], the insertion cursor, and the
//! scope stack used while building structured regions (loop/if/kernel
//! bodies).

use super::cursor::Cursor;
use super::iter::NodeIterator;
use super::node::{IndexingMode, MemoryType, Node, NodeState, Payload};
use super::NodeId;
use crate::arg::ArgRole;
use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::op::{default_catalog, OpCatalog, OpClass};
use crate::shape::{self, ShapeInfo};

pub struct Ir {
    nodes: Vec<Node>,
    root: NodeId,
    cursor: Cursor,
    scope_stack: Vec<NodeId>,
    catalog: OpCatalog,

    pub(crate) memory_inputs: Vec<NodeId>,
    pub(crate) memory_outputs: Vec<NodeId>,
    pub(crate) temp_memory_count: u32,
}

impl Ir {
    pub fn new() -> Self {
        Self::with_catalog(default_catalog().clone())
    }

    pub fn with_catalog(catalog: OpCatalog) -> Self {
        let host = catalog.get("host").expect("default catalog has `host`");
        let mut root_node = Node::new(NodeId::from_raw(0), host, DataType::None, ShapeInfo::scalar());
        root_node.state = NodeState::Initialized;
        root_node.index = 0;
        let root = root_node.id;
        Ir {
            nodes: vec![root_node],
            root,
            cursor: Cursor::at_end_of(root),
            scope_stack: Vec::new(),
            catalog,
            memory_inputs: Vec::new(),
            memory_outputs: Vec::new(),
            temp_memory_count: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn catalog(&self) -> &OpCatalog {
        &self.catalog
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.raw() as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.raw() as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter_from(&self, root: NodeId) -> NodeIterator<'_> {
        NodeIterator::new(self, root)
    }

    pub fn iter(&self) -> NodeIterator<'_> {
        self.iter_from(self.root)
    }

    // -- construction ----------------------------------------------------

    /// Build and link a new node.
    ///
    /// `inputs` are given in the order they should receive ascending slots
    /// within their role. `dtype_hint` is consulted only for `CONSTANT` and
    /// `MEMORY_OP`-class operations, whose output type cannot be derived
    /// from `Input`-role operand dtypes alone; every other operation's dtype
    /// is inferred from the catalog.
    pub fn add_node(
        &mut self,
        op_name: &str,
        dtype_hint: Option<DataType>,
        shape: ShapeInfo,
        inputs: &[(ArgRole, NodeId)],
    ) -> Result<NodeId> {
        let op = self.catalog.get(op_name)?;

        for &(_, target) in inputs {
            if !self.node(target).is_live() {
                return Err(Error::NullArgument);
            }
        }

        let dtype = if op.is(crate::op::OpClass::CONSTANT) || op.is(crate::op::OpClass::MEMORY_OP) {
            dtype_hint.unwrap_or(DataType::None)
        } else {
            let input_dtypes: Vec<DataType> = inputs
                .iter()
                .filter(|(role, _)| *role == ArgRole::Input)
                .map(|(_, n)| self.node(*n).dtype)
                .collect();
            op.infer_output_type(&input_dtypes)?
        };

        let id = NodeId::from_raw(self.nodes.len() as u32);
        let mut node = Node::new(id, op, dtype, shape);
        node.state = NodeState::Initialized;

        let input_targets: Vec<NodeId> = inputs
            .iter()
            .filter(|(role, _)| *role == ArgRole::Input)
            .map(|(_, n)| *n)
            .collect();
        node.is_static = if op.is(OpClass::STATIC) || op.is(OpClass::CONSTANT) {
            true
        } else if op.is(OpClass::MEMORY_OP) || op.is(OpClass::MODIFIER) || input_targets.is_empty() {
            false
        } else {
            input_targets.iter().all(|n| self.node(*n).is_static)
        };

        let mut slots: linear_map::LinearMap<ArgRole, u32> = linear_map::LinearMap::new();
        let mut assigned: Vec<(ArgRole, u32, NodeId)> = Vec::with_capacity(inputs.len());
        for &(role, target) in inputs {
            let slot = *slots.entry(role).or_insert(0);
            slots.insert(role, slot + 1);
            node.args.add((role, slot), target, self.node(target).dtype);
            assigned.push((role, slot, target));
        }

        self.nodes.push(node);

        for (role, slot, target) in assigned {
            self.node_mut(target).args.record_output((role, slot), id);
        }

        self.link_at_cursor(id);
        Ok(id)
    }

    /// A placeholder node reserved before its operation is known (e.g. a
    /// loop induction variable referenced by the loop body before the loop
    /// node itself is finished).
    pub fn add_placeholder(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        let host = self.catalog.get("host").expect("default catalog has `host`");
        let node = Node::new(id, host, DataType::None, ShapeInfo::scalar());
        self.nodes.push(node);
        id
    }

    fn link_at_cursor(&mut self, id: NodeId) {
        let Cursor { parent, before } = self.cursor;
        self.node_mut(id).parent = Some(parent);
        match before {
            Some(before_id) => {
                let prev = self.node(before_id).prev_sibling;
                self.node_mut(id).prev_sibling = prev;
                self.node_mut(id).next_sibling = Some(before_id);
                match prev {
                    Some(p) => self.node_mut(p).next_sibling = Some(id),
                    None => self.node_mut(parent).first_child = Some(id),
                }
                self.node_mut(before_id).prev_sibling = Some(id);
            }
            None => {
                let last = self.node(parent).last_child;
                self.node_mut(id).prev_sibling = last;
                match last {
                    Some(l) => self.node_mut(l).next_sibling = Some(id),
                    None => self.node_mut(parent).first_child = Some(id),
                }
                self.node_mut(parent).last_child = Some(id);
            }
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).first_child = next;
                }
            }
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => {
                if let Some(par) = parent {
                    self.node_mut(par).last_child = prev;
                }
            }
        }
        self.node_mut(id).parent = None;
        self.node_mut(id).prev_sibling = None;
        self.node_mut(id).next_sibling = None;
    }

    /// Relocate `id` to become a child of `new_parent`, immediately before
    /// `before` (or appended last when `None`). Used by hoisting passes that
    /// move loop-invariant shape computations up to an enclosing scope.
    pub fn move_node_to(&mut self, id: NodeId, new_parent: NodeId, before: Option<NodeId>) -> Result<()> {
        if !self.node(id).is_live() || !self.node(new_parent).is_live() {
            return Err(Error::NullArgument);
        }
        self.unlink(id);
        let saved = self.cursor;
        self.cursor = match before {
            Some(b) => Cursor::before(new_parent, b),
            None => Cursor::at_end_of(new_parent),
        };
        self.link_at_cursor(id);
        self.cursor = saved;
        Ok(())
    }

    /// Detach and free a node. The caller is responsible for having already
    /// rewritten any remaining consumers (dead code elimination, C5, only
    /// calls this once a node's output list is empty).
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(Error::NullArgument);
        }
        self.unlink(id);
        self.node_mut(id).state = NodeState::Freed;
        Ok(())
    }

    // -- cursor / scopes ---------------------------------------------------

    pub fn execute_before(&mut self, target: NodeId) {
        let parent = self.node(target).parent.unwrap_or(self.root);
        self.cursor = Cursor::before(parent, target);
    }

    pub fn execute_after(&mut self, target: NodeId) {
        let parent = self.node(target).parent.unwrap_or(self.root);
        match self.node(target).next_sibling {
            Some(next) => self.cursor = Cursor::before(parent, next),
            None => self.cursor = Cursor::at_end_of(parent),
        }
    }

    pub fn execute_at_end(&mut self, parent: NodeId) {
        self.cursor = Cursor::at_end_of(parent);
    }

    /// Open a structured scope (loop/if/kernel body): subsequent nodes are
    /// appended as children of `scope_node` until [`Self::end_scope`].
    pub fn begin_scope(&mut self, scope_node: NodeId) {
        self.scope_stack.push(scope_node);
        self.cursor = Cursor::at_end_of(scope_node);
    }

    pub fn end_scope(&mut self) -> Result<()> {
        let scope_node = self.scope_stack.pop().ok_or(Error::ScopeUnderflow)?;
        self.execute_after(scope_node);
        Ok(())
    }

    pub fn current_scope(&self) -> Option<NodeId> {
        self.scope_stack.last().copied()
    }

    // -- queries -----------------------------------------------------------

    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.node(parent).first_child;
        while let Some(id) = cur {
            out.push(id);
            cur = self.node(id).next_sibling;
        }
        out
    }

    pub fn nodes_of_op(&self, op_name: &str) -> Vec<NodeId> {
        self.iter()
            .filter(|id| self.node(*id).is_live() && self.node(*id).op.name == op_name)
            .collect()
    }

    /// The deepest common ancestor of two nodes, or an error if they belong
    /// to disjoint trees (should not happen for nodes reachable from the
    /// same root).
    pub fn common_parent(&self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let mut ancestors_a = std::collections::HashSet::new();
        let mut cur = Some(a);
        while let Some(n) = cur {
            ancestors_a.insert(n);
            cur = self.node(n).parent;
        }
        let mut cur = Some(b);
        while let Some(n) = cur {
            if ancestors_a.contains(&n) {
                return Ok(n);
            }
            cur = self.node(n).parent;
        }
        Err(Error::NoCommonParent)
    }

    /// Recompute each live node's depth-first `index` and the flat
    /// `true_prev`/`true_next` execution chain. Graph transforms (C5) call
    /// this after any structural edit whose result other passes depend on
    /// seeing in topological order.
    pub fn update_graph(&mut self) {
        let order: Vec<NodeId> = self.iter().filter(|id| self.node(*id).is_live()).collect();
        let mut prev: Option<NodeId> = None;
        for (i, &id) in order.iter().enumerate() {
            self.node_mut(id).index = i as i64;
            self.node_mut(id).true_prev = prev;
            if let Some(p) = prev {
                self.node_mut(p).true_next = Some(id);
            }
            prev = Some(id);
        }
        if let Some(last) = order.last() {
            self.node_mut(*last).true_next = None;
        }
    }

    pub fn assert_topological(&self, input: NodeId, consumer: NodeId) -> Result<()> {
        let (i, c) = (self.node(input).index, self.node(consumer).index);
        if i < c {
            Ok(())
        } else {
            Err(Error::TopologicalViolation { input: i, consumer: c })
        }
    }

    pub fn print_listing(&self) -> String {
        let mut out = String::new();
        for id in self.iter() {
            let node = self.node(id);
            if !node.is_live() {
                continue;
            }
            let depth = self.depth(id);
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format!("{} = {}(", id, node.op.name));
            let args: Vec<String> = node
                .args
                .arguments()
                .map(|(arg_id, n)| format!("{:?}{}={}", arg_id.0, arg_id.1, n))
                .collect();
            out.push_str(&args.join(", "));
            out.push_str(") : ");
            out.push_str(&node.dtype.to_string());
            out.push('\n');
        }
        out
    }

    fn depth(&self, id: NodeId) -> usize {
        let mut d = 0;
        let mut cur = self.node(id).parent;
        while let Some(p) = cur {
            d += 1;
            cur = self.node(p).parent;
        }
        d
    }

    pub fn set_memory_type(&mut self, id: NodeId, memory_type: MemoryType) {
        self.node_mut(id).memory_type = memory_type;
        match memory_type {
            MemoryType::Input => self.memory_inputs.push(id),
            MemoryType::Output => self.memory_outputs.push(id),
            MemoryType::Temp => self.temp_memory_count += 1,
            _ => {}
        }
    }

    pub fn set_constant_payload(&mut self, id: NodeId, bits: [u8; 4]) {
        self.node_mut(id).payload = Payload::Constant(bits);
    }

    pub fn set_buffer_payload(&mut self, id: NodeId, handle: u64) {
        self.node_mut(id).payload = Payload::Buffer(handle);
    }

    pub fn set_indexing_mode(&mut self, id: NodeId, mode: IndexingMode) {
        self.node_mut(id).indexing_mode = mode;
    }

    pub fn set_axis_payload(&mut self, id: NodeId, axis: i64) {
        self.node_mut(id).payload = Payload::Axis(axis);
    }

    pub fn set_group_size(&mut self, id: NodeId, group_size: Vec<usize>) {
        self.node_mut(id).group_size = group_size;
    }

    /// Resolve a possibly-negative axis against `rank`, erroring if it is
    /// out of range either way.
    fn resolve_axis(&self, shape: &ShapeInfo, axis: i64) -> Result<usize> {
        let rank = shape.rank() as i64;
        let resolved = if axis < 0 { axis + rank } else { axis };
        if resolved < 0 || resolved >= rank {
            return Err(Error::ShapeMismatch {
                a: vec![format!("axis {axis}")],
                b: vec![format!("rank {rank}")],
            });
        }
        Ok(resolved as usize)
    }

    /// Build a `dim_sum` reduction over `axis` (negative axes count from the
    /// end), recording the resolved axis as [`Payload::Axis`] so later
    /// passes (lowering, autodiff) know which dimension was reduced instead
    /// of assuming the last one.
    pub fn add_dim_sum(&mut self, x: NodeId, axis: i64, keep_dims: bool) -> Result<NodeId> {
        let shape = self.node(x).shape.clone();
        let resolved = self.resolve_axis(&shape, axis)?;

        let mut out_dims = Vec::with_capacity(shape.rank());
        for (i, &d) in shape.dims().iter().enumerate() {
            if i == resolved {
                if keep_dims {
                    let one = self.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[])?;
                    self.set_constant_payload(one, DataType::encode_i32(1));
                    out_dims.push(one);
                }
                continue;
            }
            out_dims.push(d);
        }

        let id = self.add_node("dim_sum", None, ShapeInfo::new(out_dims), &[(ArgRole::Input, x)])?;
        self.set_axis_payload(id, resolved as i64);
        self.node_mut(id).special_index = Some(axis);
        self.node_mut(id).keep_dims = keep_dims;
        Ok(id)
    }

    /// Build a `squeeze` that drops `axis` (negative axes count from the
    /// end), rejecting it with [`Error::SqueezeNonUnit`] unless that axis's
    /// dimension resolves to the constant `1`.
    pub fn add_squeeze(&mut self, x: NodeId, axis: i64) -> Result<NodeId> {
        let shape = self.node(x).shape.clone();
        let resolved = self.resolve_axis(&shape, axis)?;
        let dim = shape.dim(resolved).expect("resolve_axis returned an in-range index");

        match shape::resolve_constant_dim(self, dim) {
            Some(1) => {}
            Some(size) => {
                return Err(Error::SqueezeNonUnit {
                    axis,
                    size: size as usize,
                })
            }
            None => {
                return Err(Error::ShapeMismatch {
                    a: vec![format!("axis {axis} dim {dim}")],
                    b: vec!["constant 1".to_string()],
                });
            }
        }

        let out_dims: Vec<NodeId> = shape
            .dims()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != resolved)
            .map(|(_, &d)| d)
            .collect();

        let id = self.add_node("squeeze", None, ShapeInfo::new(out_dims), &[(ArgRole::Input, x)])?;
        self.set_axis_payload(id, resolved as i64);
        self.node_mut(id).special_index = Some(axis);
        Ok(id)
    }

    /// Build a `matmul` of `a @ b`, validating batch-dimension broadcast
    /// compatibility and the shared inner dimension the way the rest of the
    /// shape algebra (C2) validates broadcasting, rather than trusting the
    /// catalog's bare type-acceptance check.
    pub fn add_matmul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let shape_a = self.node(a).shape.clone();
        let shape_b = self.node(b).shape.clone();
        if shape_a.rank() < 2 || shape_b.rank() < 2 {
            return Err(Error::ShapeMismatch {
                a: vec![format!("{shape_a:?}")],
                b: vec![format!("{shape_b:?}")],
            });
        }

        let (m, k_a) = (shape_a.dim(shape_a.rank() - 2).unwrap(), shape_a.dim(shape_a.rank() - 1).unwrap());
        let (k_b, n) = (shape_b.dim(shape_b.rank() - 2).unwrap(), shape_b.dim(shape_b.rank() - 1).unwrap());

        let inner_ok = match (shape::resolve_constant_dim(self, k_a), shape::resolve_constant_dim(self, k_b)) {
            (Some(x), Some(y)) => x == y,
            _ => k_a == k_b,
        };
        if !inner_ok {
            let (ka, kb) = (
                shape::resolve_constant_dim(self, k_a).unwrap_or(-1),
                shape::resolve_constant_dim(self, k_b).unwrap_or(-1),
            );
            return Err(Error::InnerDimensionMismatch {
                a: ka.max(0) as usize,
                b: kb.max(0) as usize,
            });
        }

        let batch_a = ShapeInfo::new(shape_a.dims()[..shape_a.rank() - 2].to_vec());
        let batch_b = ShapeInfo::new(shape_b.dims()[..shape_b.rank() - 2].to_vec());
        let batch_cmp = shape::compare(self, &batch_a, &batch_b, false);
        if !batch_cmp.compatible {
            return Err(Error::ShapeMismatch {
                a: vec![format!("{batch_a:?}")],
                b: vec![format!("{batch_b:?}")],
            });
        }

        let batch_rank = batch_a.rank().max(batch_b.rank());
        let mut out_dims: Vec<NodeId> = Vec::with_capacity(batch_rank + 2);
        for i in 0..batch_rank {
            let da = (i >= batch_rank - batch_a.rank()).then(|| batch_a.dim(i - (batch_rank - batch_a.rank()))).flatten();
            let db = (i >= batch_rank - batch_b.rank()).then(|| batch_b.dim(i - (batch_rank - batch_b.rank()))).flatten();
            let dim = match (da, db) {
                (Some(x), None) => x,
                (None, Some(y)) => y,
                (Some(x), Some(y)) => {
                    if x == y || shape::resolve_constant_dim(self, y) == Some(1) {
                        x
                    } else {
                        y
                    }
                }
                (None, None) => unreachable!("i < batch_rank guarantees at least one side present"),
            };
            out_dims.push(dim);
        }
        out_dims.push(m);
        out_dims.push(n);

        self.add_node(
            "matmul",
            None,
            ShapeInfo::new(out_dims),
            &[(ArgRole::Input, a), (ArgRole::Input, b)],
        )
    }
}

impl Default for Ir {
    fn default() -> Self {
        Self::new()
    }
}
