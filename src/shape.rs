//! Shape algebra (C2).
//!
//! A tensor's shape is not a `Vec<usize>` here: each dimension is itself
//! produced by a node in the graph (a constant, an `input_shape` read, or an
//! arithmetic expression over other shape nodes), so that shapes can depend
//! on runtime-supplied sizes. `ShapeInfo` only ever holds the node ids that
//! produce each dimension; resolving them to concrete sizes happens later,
//! during kernel shape checking (C5).

use crate::dtype::DataType;
use crate::ir::{Ir, NodeId, Payload};
use crate::op::OpClass;

/// The shape of one tensor, as an ordered list of dimension-producing nodes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ShapeInfo {
    dims: Vec<NodeId>,
}

impl ShapeInfo {
    pub fn new(dims: Vec<NodeId>) -> Self {
        ShapeInfo { dims }
    }

    pub fn scalar() -> Self {
        ShapeInfo { dims: Vec::new() }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    pub fn dims(&self) -> &[NodeId] {
        &self.dims
    }

    pub fn dim(&self, axis: usize) -> Option<NodeId> {
        self.dims.get(axis).copied()
    }

    /// Right-aligned broadcasting: pad the lower-rank shape with leading
    /// size-1 (implicit) dimensions out to `new_rank`.
    pub fn expand_dimensions(&self, new_rank: usize, fill: NodeId) -> ShapeInfo {
        if new_rank <= self.dims.len() {
            return self.clone();
        }
        let mut dims = vec![fill; new_rank - self.dims.len()];
        dims.extend(self.dims.iter().copied());
        ShapeInfo::new(dims)
    }

    /// A rough, pass-time size estimate used to decide loop unrolling and
    /// kernel scope thresholds, before any dimension is actually resolved to
    /// a number. `default_dim` stands in for a dimension size that can only
    /// be known at runtime.
    pub fn get_shape(&self, default_dim: usize) -> Vec<usize> {
        self.dims.iter().map(|_| default_dim).collect()
    }
}

/// Per-axis outcome of comparing two shapes, right-aligned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DimCompare {
    /// Both sides agree on this axis (same producing node, or one/both
    /// missing because the shapes differ in rank and this axis is implicit).
    Equal,
    /// One side is an implicit size-1 dimension broadcast against the other.
    Broadcast { from: NodeId, to: NodeId },
    /// Neither side is missing nor equal: only allowed when `exact` is false
    /// and resolved at kernel shape-check time.
    Unknown { a: NodeId, b: NodeId },
}

/// The result of comparing two shapes for broadcast-compatibility.
#[derive(Clone, Debug)]
pub struct ShapeCompareResult {
    pub compatible: bool,
    pub broadcast: bool,
    pub per_axis: Vec<DimCompare>,
    /// The rank of the resulting broadcast shape (`max(rank_a, rank_b)`).
    pub result_rank: usize,
}

/// Resolve a shape dimension node to a concrete integer, when it is backed
/// by a live `const_` node. Shape dims are always `Int`-typed (invariant 5),
/// so only that dtype is decoded.
pub fn resolve_constant_dim(ir: &Ir, node: NodeId) -> Option<i64> {
    let n = ir.node(node);
    if !n.is_live() || !n.op.is(OpClass::CONSTANT) {
        return None;
    }
    match &n.payload {
        Payload::Constant(bits) if n.dtype == DataType::Int => Some(DataType::decode_i32(*bits) as i64),
        _ => None,
    }
}

/// Compare two shapes right-aligned, the way NumPy-style broadcasting does.
///
/// Per-axis, a pair of dimensions is compatible iff they are backed by the
/// identical node, resolve to equal constants, or at least one side
/// resolves to the constant `1` (which broadcasts against the other).
/// Anything else is `Unknown`, resolved later at kernel shape-check time
/// unless `exact` is `true`, in which case it is rejected outright — used
/// for memory ops and in-place modifiers (C3's `ArgRole::Memory`/`Input`)
/// where aliasing requires provably identical shapes.
pub fn compare(ir: &Ir, a: &ShapeInfo, b: &ShapeInfo, exact: bool) -> ShapeCompareResult {
    let result_rank = a.rank().max(b.rank());
    let mut per_axis = Vec::with_capacity(result_rank);
    let mut compatible = true;
    let mut broadcast = false;

    for i in 0..result_rank {
        let da = axis_from_end(a, result_rank, i);
        let db = axis_from_end(b, result_rank, i);
        let cmp = match (da, db) {
            (Some(x), None) => {
                broadcast = true;
                DimCompare::Broadcast { from: x, to: x }
            }
            (None, Some(y)) => {
                broadcast = true;
                DimCompare::Broadcast { from: y, to: y }
            }
            (Some(x), Some(y)) if x == y => DimCompare::Equal,
            (Some(x), Some(y)) => {
                let cx = resolve_constant_dim(ir, x);
                let cy = resolve_constant_dim(ir, y);
                match (cx, cy) {
                    (Some(vx), Some(vy)) if vx == vy => DimCompare::Equal,
                    (Some(1), _) if !exact => {
                        broadcast = true;
                        DimCompare::Broadcast { from: x, to: y }
                    }
                    (_, Some(1)) if !exact => {
                        broadcast = true;
                        DimCompare::Broadcast { from: y, to: x }
                    }
                    _ => {
                        if exact {
                            compatible = false;
                        }
                        DimCompare::Unknown { a: x, b: y }
                    }
                }
            }
            (None, None) => DimCompare::Equal,
        };
        per_axis.push(cmp);
    }

    ShapeCompareResult {
        compatible,
        broadcast,
        per_axis,
        result_rank,
    }
}

fn axis_from_end(shape: &ShapeInfo, result_rank: usize, i: usize) -> Option<NodeId> {
    let offset = result_rank - shape.rank();
    if i < offset {
        None
    } else {
        shape.dim(i - offset)
    }
}

/// Ratio between the product of two shapes' dimension counts, used by the
/// buffer pool (C6) to decide whether a retired buffer is worth reusing for
/// a request of a different size rather than always allocating fresh.
pub fn size_ratio(requested: usize, available: usize) -> f64 {
    if available == 0 {
        f64::INFINITY
    } else {
        requested as f64 / available as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_rank_equal_dims_is_compatible_without_broadcast() {
        let ir = Ir::new();
        let a = ShapeInfo::new(vec![NodeId::from_raw(1), NodeId::from_raw(2)]);
        let b = a.clone();
        let result = compare(&ir, &a, &b, false);
        assert!(result.compatible);
        assert!(!result.broadcast);
    }

    #[test]
    fn lower_rank_broadcasts_against_higher_rank() {
        let ir = Ir::new();
        let a = ShapeInfo::new(vec![NodeId::from_raw(1), NodeId::from_raw(2)]);
        let b = ShapeInfo::new(vec![NodeId::from_raw(2)]);
        let result = compare(&ir, &a, &b, false);
        assert!(result.compatible);
        assert!(result.broadcast);
        assert_eq!(result.result_rank, 2);
    }

    #[test]
    fn exact_mode_rejects_differing_dims_of_equal_rank() {
        let ir = Ir::new();
        let a = ShapeInfo::new(vec![NodeId::from_raw(1)]);
        let b = ShapeInfo::new(vec![NodeId::from_raw(2)]);
        let result = compare(&ir, &a, &b, true);
        assert!(!result.compatible);
    }

    #[test]
    fn exact_mode_accepts_distinct_nodes_with_equal_constant_value() {
        use crate::dtype::DataType;

        let mut ir = Ir::new();
        let c1 = ir.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[]).unwrap();
        ir.set_constant_payload(c1, DataType::encode_i32(3));
        let c2 = ir.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[]).unwrap();
        ir.set_constant_payload(c2, DataType::encode_i32(3));

        let a = ShapeInfo::new(vec![c1]);
        let b = ShapeInfo::new(vec![c2]);
        let result = compare(&ir, &a, &b, true);
        assert!(result.compatible);
    }

    #[test]
    fn non_exact_mode_broadcasts_a_constant_one_against_another_constant() {
        use crate::dtype::DataType;

        let mut ir = Ir::new();
        let one = ir.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[]).unwrap();
        ir.set_constant_payload(one, DataType::encode_i32(1));
        let four = ir.add_node("const_", Some(DataType::Int), ShapeInfo::scalar(), &[]).unwrap();
        ir.set_constant_payload(four, DataType::encode_i32(4));

        let a = ShapeInfo::new(vec![one]);
        let b = ShapeInfo::new(vec![four]);
        let result = compare(&ir, &a, &b, false);
        assert!(result.compatible);
        assert!(result.broadcast);
    }

    #[test]
    fn expand_dimensions_pads_on_the_left() {
        let a = ShapeInfo::new(vec![NodeId::from_raw(5)]);
        let fill = NodeId::from_raw(0);
        let expanded = a.expand_dimensions(3, fill);
        assert_eq!(expanded.rank(), 3);
        assert_eq!(expanded.dim(2), Some(NodeId::from_raw(5)));
        assert_eq!(expanded.dim(0), Some(fill));
    }
}
