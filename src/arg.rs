//! Per-node typed edge bookkeeping (C3).
//!
//! Each [`Node`](crate::ir::Node) owns an `ArgumentManager` that records its
//! inputs keyed by `(ArgRole, slot)`, plus a cache of which consumers read it
//! back (`outputs`). The maps are small for any single node (a handful of
//! entries), so — mirroring the teacher crate's choice of `linear-map` for
//! small associative data — they are backed by a linear-scan map rather than
//! a hash table.

use crate::dtype::DataType;
use crate::ir::NodeId;
use linear_map::LinearMap;

/// The role an input edge plays for the consuming node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ArgRole {
    Input,
    Index,
    Shape,
    Memory,
    None,
}

/// `(role, slot)` uniquely identifies one input edge of a node.
pub type ArgId = (ArgRole, u32);

#[derive(Clone, Debug, Default)]
pub struct ArgumentManager {
    pub(crate) inputs: LinearMap<ArgId, NodeId>,
    pub(crate) outputs: LinearMap<NodeId, Vec<ArgId>>,
    argument_types: LinearMap<ArgId, DataType>,
    argument_counts: LinearMap<ArgRole, u32>,
    names: LinearMap<ArgId, String>,
    requires_parenthesis: LinearMap<ArgId, bool>,
    add_parenthesis: bool,
}

impl ArgumentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parenthesis(&mut self, add: bool) {
        self.add_parenthesis = add;
    }

    /// Insert a new input edge, recording its type for later lookup.
    ///
    /// `n` being a genuine node id is the caller's responsibility to
    /// guarantee (the arena has no null/placeholder concept reachable from
    /// here); callers that might pass a not-yet-initialized node should
    /// check first and raise [`crate::error::Error::NullArgument`].
    pub fn add(&mut self, id: ArgId, n: NodeId, ty: DataType) {
        self.inputs.insert(id, n);
        self.argument_types.insert(id, ty);
        *self.argument_counts.entry(id.0).or_insert(0) += 1;
    }

    /// Replace an existing input edge in place, for in-place graph rewrites.
    pub fn update(&mut self, id: ArgId, n: NodeId) {
        self.inputs.insert(id, n);
    }

    pub fn has(&self, id: ArgId) -> bool {
        self.inputs.contains_key(&id)
    }

    pub fn get(&self, id: ArgId) -> crate::error::Result<NodeId> {
        self.inputs
            .get(&id)
            .copied()
            .ok_or(crate::error::Error::ArgumentNotFound(id.0, id.1))
    }

    pub fn get_opt(&self, id: ArgId) -> Option<NodeId> {
        self.inputs.get(&id).copied()
    }

    pub fn ty(&self, id: ArgId) -> Option<DataType> {
        self.argument_types.get(&id).copied()
    }

    pub fn count(&self, role: ArgRole) -> u32 {
        self.argument_counts.get(&role).copied().unwrap_or(0)
    }

    pub fn set_name(&mut self, id: ArgId, name: impl Into<String>, requires_parenthesis: bool) {
        self.names.insert(id, name.into());
        self.requires_parenthesis.insert(id, requires_parenthesis);
    }

    pub fn name(&self, id: ArgId) -> Option<&str> {
        self.names.get(&id).map(|s| s.as_str())
    }

    /// All input edges.
    pub fn arguments(&self) -> impl Iterator<Item = (ArgId, NodeId)> + '_ {
        self.inputs.iter().map(|(id, n)| (*id, *n))
    }

    /// Input edges for one role, in unspecified order.
    pub fn arguments_of(&self, role: ArgRole) -> impl Iterator<Item = (ArgId, NodeId)> + '_ {
        self.inputs
            .iter()
            .filter(move |(id, _)| id.0 == role)
            .map(|(id, n)| (*id, *n))
    }

    /// Remove every input edge with the given role.
    pub fn remove_arguments(&mut self, role: ArgRole) {
        let to_remove: Vec<ArgId> = self
            .inputs
            .keys()
            .filter(|id| id.0 == role)
            .copied()
            .collect();
        for id in to_remove {
            self.inputs.remove(&id);
            self.argument_types.remove(&id);
        }
        self.argument_counts.remove(&role);
    }

    /// Record that `consumer` reads this node through `id`. Called by
    /// [`crate::ir::Ir`] while rebuilding the reverse index — the manager
    /// itself has no way to reach other nodes' managers, so the arena
    /// orchestrates this instead of the manager doing it for itself as the
    /// original pointer-based design could.
    pub fn record_output(&mut self, id: ArgId, consumer: NodeId) {
        self.outputs.entry(consumer).or_insert_with(Vec::new).push(id);
    }

    pub fn clear_outputs(&mut self) {
        self.outputs.clear();
    }

    pub fn outputs(&self) -> impl Iterator<Item = (NodeId, &[ArgId])> {
        self.outputs.iter().map(|(n, ids)| (*n, ids.as_slice()))
    }

    /// Memory-role edges denote aliasing, not value production: they must
    /// never be cloned blindly by a copying rewrite.
    pub fn cannot_copy_argument(&self, id: ArgId) -> bool {
        id.0 == ArgRole::Memory
    }

    /// Same edges that cannot be copied also cannot be silently moved to a
    /// different consumer without updating the aliasing relationship.
    pub fn cannot_move_argument(&self, id: ArgId) -> bool {
        id.0 == ArgRole::Memory
    }

    pub fn is_changing_input(&self, id: ArgId) -> bool {
        matches!(id.0, ArgRole::Input | ArgRole::Memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::NodeId;

    #[test]
    fn add_then_get_round_trips() {
        let mut args = ArgumentManager::new();
        let n = NodeId::from_raw(3);
        args.add((ArgRole::Input, 0), n, DataType::Float);
        assert!(args.has((ArgRole::Input, 0)));
        assert_eq!(args.get((ArgRole::Input, 0)).unwrap(), n);
        assert_eq!(args.count(ArgRole::Input), 1);
    }

    #[test]
    fn get_missing_argument_is_an_error() {
        let args = ArgumentManager::new();
        assert!(args.get((ArgRole::Shape, 0)).is_err());
    }

    #[test]
    fn remove_arguments_drops_only_that_role() {
        let mut args = ArgumentManager::new();
        let n = NodeId::from_raw(1);
        args.add((ArgRole::Input, 0), n, DataType::Float);
        args.add((ArgRole::Shape, 0), n, DataType::Int);
        args.remove_arguments(ArgRole::Input);
        assert!(!args.has((ArgRole::Input, 0)));
        assert!(args.has((ArgRole::Shape, 0)));
    }
}
